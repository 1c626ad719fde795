//! Single-pass tokenizer for spintext templates.
//!
//! The scanner walks the text left to right and emits three kinds of tokens:
//! literal runs, single-brace spin groups (`{a|b}`) and double-brace variable
//! tokens (`{{name}}`). Nesting is not supported: a group body never contains
//! `{` or `}`, so `{a {{b}}|c}` lexes as literals plus one variable token.

use std::ops::Range;

/// A lexical unit of a template, borrowing from the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Plain text copied through unchanged. Stray braces end up here.
    Literal(&'a str),
    /// `{opt1|opt2|...}`: body split on `|`, one or more choices.
    Spin {
        choices: Vec<&'a str>,
        span: Range<usize>,
    },
    /// `{{name}}`: the raw body between the doubled braces.
    Variable { name: &'a str, span: Range<usize> },
}

impl Token<'_> {
    /// Source text covered by the token.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            Token::Literal(_) => None,
            Token::Spin { span, .. } | Token::Variable { span, .. } => Some(span.clone()),
        }
    }
}

/// `\w` in the ASCII sense: letters, digits and underscore.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True when `name` is a non-empty run of word characters.
pub fn is_variable_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(is_word_char)
}

/// Tokenize `text` into literal, spin-group and variable tokens.
pub fn tokenize(text: &str) -> Vec<Token<'_>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        if bytes[pos] != b'{' {
            pos += 1;
            continue;
        }

        let token = if bytes.get(pos + 1) == Some(&b'{') {
            lex_variable(text, pos).or_else(|| lex_spin(text, pos))
        } else {
            lex_spin(text, pos)
        };

        match token {
            Some(token) => {
                let span = token.span().unwrap_or(pos..pos + 1);
                if literal_start < span.start {
                    tokens.push(Token::Literal(&text[literal_start..span.start]));
                }
                pos = span.end;
                literal_start = pos;
                tokens.push(token);
            }
            None => pos += 1,
        }
    }

    if literal_start < text.len() {
        tokens.push(Token::Literal(&text[literal_start..]));
    }

    tokens
}

/// Brace-free body starting at `start`, up to (not including) the next `}`.
/// Returns `None` if a `{` shows up first or the text ends.
fn brace_free_body(text: &str, start: usize) -> Option<Range<usize>> {
    let rest = text.get(start..)?;
    for (offset, c) in rest.char_indices() {
        match c {
            '}' => return Some(start..start + offset),
            '{' => return None,
            _ => {}
        }
    }
    None
}

/// `{{body}}` at `open`, where `open` and `open + 1` are both `{`.
fn lex_variable(text: &str, open: usize) -> Option<Token<'_>> {
    let body = brace_free_body(text, open + 2)?;
    if body.is_empty() || text.as_bytes().get(body.end + 1) != Some(&b'}') {
        return None;
    }
    Some(Token::Variable {
        name: &text[body.clone()],
        span: open..body.end + 2,
    })
}

/// `{body}` at `open`. The body must be non-empty.
fn lex_spin(text: &str, open: usize) -> Option<Token<'_>> {
    let body = brace_free_body(text, open + 1)?;
    if body.is_empty() {
        return None;
    }
    Some(Token::Spin {
        choices: text[body.clone()].split('|').collect(),
        span: open..body.end + 1,
    })
}
