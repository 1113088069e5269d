//! Text cleanup applied to posting bodies before they are sent out.

/// Flattens whitespace inside paragraphs while keeping paragraph boundaries.
///
/// A paragraph ends at a blank line (a line containing only whitespace).
/// Inside a paragraph, a whitespace run that spans a line break becomes a
/// single `\n` and any other run becomes a single space. Paragraphs are
/// trimmed, empty ones dropped, and the rest joined with one `\n`.
pub fn normalize(text: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        if line.trim().is_empty() {
            flush_paragraph(&mut current, &mut paragraphs);
        } else {
            current.push(line);
        }
    }
    flush_paragraph(&mut current, &mut paragraphs);

    paragraphs.join("\n")
}

fn flush_paragraph(lines: &mut Vec<&str>, paragraphs: &mut Vec<String>) {
    if lines.is_empty() {
        return;
    }
    let collapsed = collapse_whitespace(&lines.join("\n"));
    if !collapsed.is_empty() {
        paragraphs.push(collapsed);
    }
    lines.clear();
}

fn collapse_whitespace(paragraph: &str) -> String {
    let mut out = String::with_capacity(paragraph.len());
    let mut pending: Option<char> = None;

    for c in paragraph.trim().chars() {
        if c.is_whitespace() {
            if c == '\n' {
                pending = Some('\n');
            } else if pending.is_none() {
                pending = Some(' ');
            }
        } else {
            if let Some(sep) = pending.take() {
                out.push(sep);
            }
            out.push(c);
        }
    }
    out
}

/// Lowercased hashtag-safe form of `text`, words joined by `_`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut gap = false;

    for c in text.chars() {
        if c.is_alphanumeric() {
            if gap && !slug.is_empty() {
                slug.push('_');
            }
            gap = false;
            slug.extend(c.to_lowercase());
        } else {
            gap = true;
        }
    }
    slug
}
