//! Lexical sanitizer
//!
//! Line-continuation removal, comment-aware splitting of comma lists and
//! cleanup of documentation comments.

use std::collections::HashMap;

/// Remove backslash-newline continuations.
///
/// A newline preceded by an even number of backslashes is an escaped
/// backslash followed by a real line break and is kept as is.
pub fn collapse_line_continuations(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\n' {
            let backslashes = out.chars().rev().take_while(|&b| b == '\\').count();
            if backslashes % 2 == 1 {
                out.pop();
                continue;
            }
        }
        out.push(c);
    }
    out
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Lexical {
    Code,
    LineComment,
    BlockComment,
}

/// Split on `separator` while treating separators inside `//` and `/* */`
/// comments as literal text.
///
/// Pieces are trimmed. A trailing empty piece (from a trailing separator)
/// is dropped, interior empty pieces are kept.
pub fn safe_split(text: &str, separator: char) -> Vec<String> {
    let text = collapse_line_continuations(text);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut state = Lexical::Code;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            Lexical::Code => {
                if c == '/' && chars.peek() == Some(&'/') {
                    state = Lexical::LineComment;
                } else if c == '/' && chars.peek() == Some(&'*') {
                    current.push(c);
                    current.extend(chars.next());
                    state = Lexical::BlockComment;
                    continue;
                } else if c == separator {
                    pieces.push(current.trim().to_string());
                    current.clear();
                    continue;
                }
            }
            Lexical::LineComment => {
                if c == '\n' {
                    state = Lexical::Code;
                }
            }
            Lexical::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    current.push(c);
                    current.extend(chars.next());
                    state = Lexical::Code;
                    continue;
                }
            }
        }
        current.push(c);
    }
    pieces.push(current.trim().to_string());

    if pieces.last().is_some_and(|p| p.is_empty()) {
        pieces.pop();
    }
    pieces
}

/// Split on `separator` outside of any bracket pair, keeping at most
/// `limit` pieces (the last piece holds the remainder). Pieces are trimmed.
pub fn split_top_level(text: &str, separator: char, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if pieces.len() + 1 == limit {
            break;
        }
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ if c == separator && depth == 0 => {
                pieces.push(text[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    pieces.push(text[start..].trim());
    pieces
}

/// Find the delimiter closing the one at byte offset `open`.
///
/// Supports `{}`, `()` and `[]`; delimiters inside comments are ignored.
/// Returns the byte offset of the closing delimiter.
pub fn matching_delimiter(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let opening = *bytes.get(open)?;
    let closing = match opening {
        b'{' => b'}',
        b'(' => b')',
        b'[' => b']',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i + 1 < bytes.len() && !(bytes[i] == b'*' && bytes[i + 1] == b'/') {
                    i += 1;
                }
                i += 2;
                continue;
            }
            b if b == opening => depth += 1,
            b if b == closing => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Remove all comments from a fragment
pub fn strip_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut state = Lexical::Code;
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match state {
            Lexical::Code => {
                if c == '/' && chars.peek() == Some(&'/') {
                    state = Lexical::LineComment;
                } else if c == '/' && chars.peek() == Some(&'*') {
                    chars.next();
                    state = Lexical::BlockComment;
                    out.push(' ');
                } else {
                    out.push(c);
                }
            }
            Lexical::LineComment => {
                if c == '\n' {
                    state = Lexical::Code;
                    out.push(c);
                }
            }
            Lexical::BlockComment => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = Lexical::Code;
                }
            }
        }
    }
    out
}

/// Trim whitespace and decorative leading asterisks from every line
pub fn cleanup_description(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix('*').map_or(line, str::trim)
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Text of a run of `///` lines, one line per comment line
pub fn doc_lines_text(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(|line| line.trim_start().trim_start_matches('/').trim())
        .collect();
    cleanup_description(&lines.join("\n"))
}

/// Text of a `/** ... */` block
pub fn doc_block_text(text: &str) -> String {
    let inner = text
        .strip_prefix("/**")
        .and_then(|t| t.strip_suffix("*/"))
        .unwrap_or(text);
    cleanup_description(inner)
}

/// Documentation comment at the very beginning of a fragment, if any
pub fn leading_description(fragment: &str) -> Option<String> {
    if fragment.starts_with("///") {
        let line = fragment.lines().next().unwrap_or_default();
        return Some(doc_lines_text(line));
    }
    if fragment.starts_with("/**") {
        let end = fragment[3..].find("*/")? + 3 + 2;
        return Some(doc_block_text(&fragment[..end]));
    }
    None
}

/// Split `@param name - text` annotations off a function description.
///
/// Returns the remaining description (other `@` sections are kept) and
/// the documentation of each named parameter.
pub fn extract_argument_descriptions(description: &str) -> (String, HashMap<String, String>) {
    let mut params = HashMap::new();
    let mut parts = description.split('@');
    let mut kept: Vec<&str> = parts.next().into_iter().collect();

    for part in parts {
        match parse_param_annotation(part) {
            Some((name, text)) => {
                params.insert(name.to_string(), text.to_string());
            }
            None => kept.push(part),
        }
    }
    (kept.join("@").trim().to_string(), params)
}

fn parse_param_annotation(part: &str) -> Option<(&str, &str)> {
    let rest = part.strip_prefix("param")?.trim_start();
    let name_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if name_len == 0 {
        return None;
    }
    let (name, rest) = rest.split_at(name_len);
    let rest = rest.trim_start();
    let rest = rest.strip_prefix('-').unwrap_or(rest);
    Some((name, rest.trim()))
}
