/// Characters MarkdownV2 treats as syntax anywhere in message text.
const SPECIALS: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if SPECIALS.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Hidden until tapped.
pub fn spoiler(text: &str) -> String {
    format!("||{text}||")
}

/// True for text that renders as nothing: empty, or an empty spoiler.
pub fn is_blank_log(text: &str) -> bool {
    text.is_empty() || text == "||||"
}
