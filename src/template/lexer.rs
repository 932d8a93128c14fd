//! Template source tokenizer.
//!
//! Recognised delimiters:
//! - `{{ expr }}` output
//! - `{% name args %}` tags
//! - `{# ... #}` comments (dropped)
//!
//! A `-` just inside a delimiter (`{%-`, `-%}`, `{{-`, `-}}`) trims the
//! whitespace of the neighbouring text. `{% verbatim %}...{% endverbatim %}`
//! produces its inner text as-is.

use crate::error::{LineIndex, Position, TemplateError};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text(String),
    Output { expr: String, position: Position },
    Tag { name: String, args: String, position: Position },
}

/// Delimited region found by the scanner, before trim markers are applied
struct Delimited<'a> {
    kind: DelimiterKind,
    inner: &'a str,
    start: usize,
    end: usize,
    trim_before: bool,
    trim_after: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DelimiterKind {
    Output,
    Tag,
    Comment,
}

pub struct Lexer<'a> {
    template: &'a str,
    source: &'a str,
    index: LineIndex,
}

impl<'a> Lexer<'a> {
    pub fn new(template: &'a str, source: &'a str) -> Self {
        Self {
            template,
            source,
            index: LineIndex::new(Arc::from(source)),
        }
    }

    /// Position just past the last byte of the source
    pub fn end_position(&self) -> Position {
        self.index.position(self.source.len())
    }

    pub fn tokenize(&self) -> Result<Vec<Token>, TemplateError> {
        let mut tokens = Vec::new();
        // trim flags of the previous delimiter, applied to the following text
        let mut trim_next_text = false;
        let mut pos = 0;

        while pos < self.source.len() {
            let Some(found) = self.next_delimited(pos)? else {
                push_text(&mut tokens, &self.source[pos..], trim_next_text);
                break;
            };

            push_text(&mut tokens, &self.source[pos..found.start], trim_next_text);
            if found.trim_before {
                trim_last_text(&mut tokens);
            }
            trim_next_text = found.trim_after;
            pos = found.end;

            let position = self.index.position(found.start);
            match found.kind {
                DelimiterKind::Comment => {}
                DelimiterKind::Output => tokens.push(Token::Output {
                    expr: found.inner.trim().to_string(),
                    position,
                }),
                DelimiterKind::Tag => {
                    let (name, args) = split_tag(found.inner);
                    if name.is_empty() {
                        return Err(TemplateError::syntax(self.template, position, "Tag name must be an identifier."));
                    }
                    if name == "verbatim" {
                        let (raw, end, trim_after) = self.verbatim_body(found.end, position)?;
                        push_text(&mut tokens, raw, trim_next_text);
                        trim_next_text = trim_after;
                        pos = end;
                        continue;
                    }
                    tokens.push(Token::Tag {
                        name: name.to_string(),
                        args: args.to_string(),
                        position,
                    });
                }
            }
        }

        Ok(tokens)
    }

    /// Find the next `{{`, `{%` or `{#` region at or after `from`
    fn next_delimited(&self, from: usize) -> Result<Option<Delimited<'a>>, TemplateError> {
        let source = self.source;
        let mut search = from;

        while let Some(offset) = source[search..].find('{') {
            let start = search + offset;
            let (kind, close) = match source.as_bytes().get(start + 1) {
                Some(b'{') => (DelimiterKind::Output, "}}"),
                Some(b'%') => (DelimiterKind::Tag, "%}"),
                Some(b'#') => (DelimiterKind::Comment, "#}"),
                _ => {
                    search = start + 1;
                    continue;
                }
            };

            let body_start = start + 2;
            let Some(close_at) = find_close(&source[body_start..], close, kind != DelimiterKind::Comment) else {
                let message = match kind {
                    DelimiterKind::Output => "Variable output not closed, expected '}}'.",
                    DelimiterKind::Tag => "Tag not closed, expected '%}'.",
                    DelimiterKind::Comment => "Comment not closed, expected '#}'.",
                };
                return Err(TemplateError::syntax(self.template, self.index.position(start), message));
            };

            let mut inner = &source[body_start..body_start + close_at];
            let mut trim_before = false;
            let mut trim_after = false;
            if kind != DelimiterKind::Comment {
                if let Some(rest) = inner.strip_prefix('-') {
                    inner = rest;
                    trim_before = true;
                }
                if let Some(rest) = inner.strip_suffix('-') {
                    inner = rest;
                    trim_after = true;
                }
            }

            return Ok(Some(Delimited {
                kind,
                inner,
                start,
                end: body_start + close_at + close.len(),
                trim_before,
                trim_after,
            }));
        }

        Ok(None)
    }

    /// Raw text up to the first `endverbatim` tag; returns it with the
    /// offset after that tag and its trailing trim flag
    fn verbatim_body(&self, from: usize, opened_at: Position) -> Result<(&'a str, usize, bool), TemplateError> {
        let mut search = from;
        while let Some(offset) = self.source[search..].find("{%") {
            let start = search + offset;
            let body_start = start + 2;
            let Some(close_at) = find_close(&self.source[body_start..], "%}", false) else {
                break;
            };
            let mut inner = &self.source[body_start..body_start + close_at];
            inner = inner.strip_prefix('-').unwrap_or(inner);
            let trim_after = inner.ends_with('-');
            inner = inner.strip_suffix('-').unwrap_or(inner);
            if inner.trim() == "endverbatim" {
                return Ok((&self.source[from..start], body_start + close_at + 2, trim_after));
            }
            search = body_start;
        }
        Err(TemplateError::syntax(
            self.template,
            opened_at,
            "verbatim tag not closed, expected 'endverbatim'.",
        ))
    }
}

/// Offset of `close` in `text`, skipping quoted strings when `quote_aware`
fn find_close(text: &str, close: &str, quote_aware: bool) -> Option<usize> {
    if !quote_aware {
        return text.find(close);
    }
    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => {
                i += 2;
                continue;
            }
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if bytes[i..].starts_with(close.as_bytes()) => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

/// `" if user.admin "` -> `("if", "user.admin")`
fn split_tag(inner: &str) -> (&str, &str) {
    let inner = inner.trim();
    let name_len = inner
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    (&inner[..name_len], inner[name_len..].trim())
}

fn push_text(tokens: &mut Vec<Token>, text: &str, trim_start: bool) {
    let text = if trim_start { text.trim_start() } else { text };
    if !text.is_empty() {
        tokens.push(Token::Text(text.to_string()));
    }
}

fn trim_last_text(tokens: &mut Vec<Token>) {
    if let Some(Token::Text(text)) = tokens.last_mut() {
        let trimmed_len = text.trim_end().len();
        text.truncate(trimmed_len);
        if text.is_empty() {
            tokens.pop();
        }
    }
}
