use std::collections::HashMap;

pub const DEFAULT_MATCH_CUTOFF: f64 = 0.6;
pub const DEFAULT_MATCH_LIMIT: usize = 3;

/// A candidate name that cleared the similarity cutoff.
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    pub name: String,
    pub score: f64,
}

/// Finds the candidates most similar to `query`, case-insensitively.
///
/// Candidates scoring below [`DEFAULT_MATCH_CUTOFF`] are dropped; the rest
/// are returned best-first, at most `limit` of them, ties keeping candidate
/// order. Total over its inputs: an empty candidate list or a hopeless query
/// yields an empty vec, never an error.
pub fn resolve(query: &str, candidates: &[String], limit: usize) -> Vec<NameMatch> {
    let query_lower = query.to_lowercase();
    let mut matches: Vec<NameMatch> = candidates
        .iter()
        .map(|candidate| NameMatch {
            name: candidate.clone(),
            score: similarity(&query_lower, &candidate.to_lowercase()),
        })
        .filter(|m| m.score >= DEFAULT_MATCH_CUTOFF)
        .collect();
    // Stable sort keeps candidate order for equal scores.
    matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    matches.truncate(limit);
    matches
}

/// Ratcliff/Obershelp ratio: twice the total length of matching blocks over
/// the combined length of both strings. 1.0 for identical inputs (including
/// two empty strings), 0.0 when nothing matches.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let matched = matching_total(&a, &b);
    2.0 * matched as f64 / (a.len() + b.len()) as f64
}

fn matching_total(a: &[char], b: &[char]) -> usize {
    let mut total = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, alo, ahi, blo, bhi);
        if size > 0 {
            total += size;
            pending.push((alo, i, blo, j));
            pending.push((i + size, ahi, j + size, bhi));
        }
    }
    total
}

/// Longest block such that `a[i..i+size] == b[j..j+size]` within the given
/// bounds, preferring the leftmost occurrence in `a`, then in `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let mut best = (alo, blo, 0);
    // run_lengths[j] = length of the match ending at a[i], b[j].
    let mut run_lengths: HashMap<usize, usize> = HashMap::new();
    for i in alo..ahi {
        let mut next_runs: HashMap<usize, usize> = HashMap::new();
        for j in blo..bhi {
            if a[i] != b[j] {
                continue;
            }
            let run = if j > blo {
                run_lengths.get(&(j - 1)).copied().unwrap_or(0) + 1
            } else {
                1
            };
            next_runs.insert(j, run);
            if run > best.2 {
                best = (i + 1 - run, j + 1 - run, run);
            }
        }
        run_lengths = next_runs;
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{resolve, similarity, DEFAULT_MATCH_CUTOFF};

    #[test]
    fn identical_strings_score_one() {
        assert_eq!(similarity("ann", "ann"), 1.0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn disjoint_strings_score_zero() {
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn ratio_counts_all_matching_blocks() {
        // blocks "ab" and "cd" match: 2 * 4 / (5 + 5)
        let score = similarity("ab_cd", "abxcd");
        assert!((score - 0.8).abs() < 1e-9);
    }

    #[test]
    fn exact_candidate_always_resolves() {
        let candidates = vec!["Ann".to_string()];
        let matches = resolve("Ann", &candidates, 3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "Ann");
        assert_eq!(matches[0].score, 1.0);
    }

    #[test]
    fn matching_is_case_insensitive() {
        let candidates = vec!["ANN".to_string()];
        let matches = resolve("ann", &candidates, 3);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].score, 1.0);
    }

    #[test]
    fn results_are_sorted_capped_and_above_cutoff() {
        let candidates = vec![
            "Annette".to_string(),
            "Ann".to_string(),
            "Anna".to_string(),
            "Bob".to_string(),
        ];
        let matches = resolve("ann", &candidates, 2);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name, "Ann");
        assert_eq!(matches[1].name, "Anna");
        for m in &matches {
            assert!(m.score >= DEFAULT_MATCH_CUTOFF);
            assert!(candidates.contains(&m.name));
        }
    }

    #[test]
    fn ties_keep_candidate_order() {
        let candidates = vec!["anna".to_string(), "annb".to_string()];
        let matches = resolve("ann", &candidates, 3);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].score, matches[1].score);
        assert_eq!(matches[0].name, "anna");
        assert_eq!(matches[1].name, "annb");
    }

    #[test]
    fn hopeless_query_returns_empty() {
        let candidates = vec!["Ann".to_string(), "Bob".to_string()];
        assert!(resolve("zzzzzz", &candidates, 3).is_empty());
        assert!(resolve("Ann", &[], 3).is_empty());
    }
}
