const FENCE: &str = "```";

/// Return the content of the first fenced code block in `text`.
///
/// Falls back to the trimmed input when no complete fence pair exists.
/// An info string on the opening line (e.g. ` ```sql `) is dropped.
pub(crate) fn extract_fenced(text: &str) -> String {
    let Some(open) = text.find(FENCE) else {
        return text.trim().to_string();
    };
    let after_open = &text[open + FENCE.len()..];
    let Some(close) = after_open.find(FENCE) else {
        return text.trim().to_string();
    };
    let inner = &after_open[..close];

    let body = match inner.split_once('\n') {
        Some((first, rest)) if is_info_string(first) => rest,
        _ => inner,
    };

    let body = body.trim();
    if body.is_empty() {
        text.replace(FENCE, "").trim().to_string()
    } else {
        body.to_string()
    }
}

fn is_info_string(line: &str) -> bool {
    let line = line.trim();
    line.is_empty()
        || (line.len() <= 16
            && line
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+'))
}

/// Collapse newlines so multi-line model output fits on one console row.
pub(crate) fn single_line(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
