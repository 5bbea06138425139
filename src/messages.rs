//! User-facing message templates, rendered as Telegram HTML.

pub const START: &str = include_str!("../data/messages/start.txt");
pub const PROCESSING: &str = include_str!("../data/messages/processing.txt");
pub const NO_IMAGE: &str = include_str!("../data/messages/no_image.txt");
pub const COST_CAPTION: &str = include_str!("../data/messages/cost_caption.txt");
pub const UNKNOWN_COST: &str = include_str!("../data/messages/unknown_cost.txt");
pub const GENERATION_ERROR: &str = include_str!("../data/messages/generation_error.txt");

/// Longest text Telegram accepts in one `sendMessage`.
pub const MAX_MESSAGE_CHARS: usize = 4096;

const TRUNCATION_MARK: char = '…';

/// Replace `{{key}}` placeholders in a template string.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        result = result.replace(&format!("{{{{{}}}}}", key), value);
    }
    result
}

fn escaped_char(c: char) -> Option<&'static str> {
    match c {
        '&' => Some("&amp;"),
        '<' => Some("&lt;"),
        '>' => Some("&gt;"),
        '"' => Some("&quot;"),
        _ => None,
    }
}

/// Escape text for inclusion in an HTML-mode message.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match escaped_char(c) {
            Some(entity) => escaped.push_str(entity),
            None => escaped.push(c),
        }
    }
    escaped
}

/// Like [`escape_html`], but the result is at most `max_chars` characters.
///
/// Cut text ends with `…`; entities are never split.
pub fn escape_html_truncated(text: &str, max_chars: usize) -> String {
    let escaped = escape_html(text);
    if escaped.chars().count() <= max_chars {
        return escaped;
    }

    let budget = max_chars.saturating_sub(1);
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let width = escaped_char(c).map_or(1, str::len);
        if used + width > budget {
            break;
        }
        match escaped_char(c) {
            Some(entity) => out.push_str(entity),
            None => out.push(c),
        }
        used += width;
    }
    if max_chars > 0 {
        out.push(TRUNCATION_MARK);
    }
    out
}
