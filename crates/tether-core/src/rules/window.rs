/// Selects the longest trailing run of `lines` whose newline-joined length
/// fits in `max_len` bytes.
///
/// Returns the join of `lines[m..]` for the smallest `m` that fits. When
/// even the last line alone is over budget the last line is returned anyway:
/// the result may exceed `max_len` but is never empty for non-empty input.
/// A leading blank line left over from the cut is stripped.
///
/// The binary search relies on joined length being non-increasing in `m`,
/// which holds because every probe is a suffix of the same list. Callers
/// must not generalize this to arbitrary sublists.
pub fn window(lines: &[String], max_len: usize) -> String {
    if lines.is_empty() {
        return String::new();
    }

    let mut lo = 0;
    let mut hi = lines.len() - 1;
    while lo < hi {
        let mid = (lo + hi) / 2;
        if joined_len(&lines[mid..]) > max_len {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }

    let mut text = lines[lo..].join("\n");
    if text.starts_with('\n') {
        text.remove(0);
    }
    text
}

fn joined_len(lines: &[String]) -> usize {
    lines.iter().map(String::len).sum::<usize>() + lines.len().saturating_sub(1)
}
