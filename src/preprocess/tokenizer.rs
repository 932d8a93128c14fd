//! Markup event tokenizer for custom component tags.
//!
//! Splits template text into plain text, verbatim regions and `<{prefix}...>`
//! component/slot tags. The tokenizer never fails: anything that does not
//! form a complete tag is returned as text.

pub const VERBATIM_START: &str = "{% verbatim %}";
pub const VERBATIM_END: &str = "{% endverbatim %}";

/// Tag name of named-slot declarations (`<x-slot name="...">`)
const SLOT_TAG: &str = "slot";

/// Markup events produced by the tokenizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    /// Text passed through unchanged
    Text(&'a str),
    /// `{% verbatim %}...{% endverbatim %}`, delimiters included
    Verbatim(&'a str),
    /// `<x-name attrs>`
    Open { name: &'a str, attrs: &'a str },
    /// `<x-name attrs />`
    SelfClosing { name: &'a str, attrs: &'a str },
    /// `</x-name>`
    Close { name: &'a str },
    /// `<x-slot attrs>`; `self_closing` for `<x-slot attrs />`
    SlotOpen { attrs: &'a str, self_closing: bool },
    /// `</x-slot>`
    SlotClose,
}

/// Streaming tokenizer over one template source
pub struct Tokenizer<'a> {
    source: &'a str,
    open_prefix: String,
    close_prefix: String,
}

impl<'a> Tokenizer<'a> {
    pub fn new(source: &'a str, tag_prefix: &str) -> Self {
        Self {
            source,
            open_prefix: format!("<{}", tag_prefix),
            close_prefix: format!("</{}", tag_prefix),
        }
    }

    /// Tokenize the entire source
    pub fn tokenize(&self) -> Vec<Event<'a>> {
        let source = self.source;
        let mut events = Vec::new();
        let mut text_start = 0;
        let mut pos = 0;

        while let Some(offset) = source[pos..].find(['<', '{']) {
            let at = pos + offset;
            match self.event_at(at) {
                Some((event, end)) => {
                    if text_start < at {
                        events.push(Event::Text(&source[text_start..at]));
                    }
                    events.push(event);
                    text_start = end;
                    pos = end;
                }
                None => pos = at + 1,
            }
        }

        if text_start < source.len() {
            events.push(Event::Text(&source[text_start..]));
        }
        events
    }

    /// Try to read one event starting at byte `at`; returns it with its end offset
    fn event_at(&self, at: usize) -> Option<(Event<'a>, usize)> {
        let rest = &self.source[at..];

        if rest.starts_with(VERBATIM_START) {
            let body = VERBATIM_START.len();
            let end = rest[body..].find(VERBATIM_END)? + body + VERBATIM_END.len();
            return Some((Event::Verbatim(&rest[..end]), at + end));
        }

        if let Some(after) = rest.strip_prefix(self.close_prefix.as_str()) {
            let name_len = name_length(after);
            if name_len == 0 || !after[name_len..].starts_with('>') {
                return None;
            }
            let name = &after[..name_len];
            let end = at + self.close_prefix.len() + name_len + 1;
            let event = if name == SLOT_TAG { Event::SlotClose } else { Event::Close { name } };
            return Some((event, end));
        }

        if let Some(after) = rest.strip_prefix(self.open_prefix.as_str()) {
            let name_len = name_length(after);
            if name_len == 0 {
                return None;
            }
            let name = &after[..name_len];
            let body_start = at + self.open_prefix.len() + name_len;
            let body_len = tag_body_length(&self.source[body_start..])?;
            let body = &self.source[body_start..body_start + body_len];
            let end = body_start + body_len + 1;

            let trimmed = body.trim_end();
            let (attrs, self_closing) = match trimmed.strip_suffix('/') {
                Some(attrs) => (attrs.trim(), true),
                None => (trimmed.trim(), false),
            };

            let event = if name == SLOT_TAG {
                Event::SlotOpen { attrs, self_closing }
            } else if self_closing {
                Event::SelfClosing { name, attrs }
            } else {
                Event::Open { name, attrs }
            };
            return Some((event, end));
        }

        None
    }
}

/// Length of the component name at the start of `text` (`[a-zA-Z0-9_.-]*`)
fn name_length(text: &str) -> usize {
    text.bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-'))
        .count()
}

/// Length of the tag body up to (not including) the closing `>`.
///
/// Double-quoted values may contain `>`. Any `<`, quoted or not, or the end of
/// input means this is not a tag.
fn tag_body_length(text: &str) -> Option<usize> {
    let mut in_quotes = false;
    for (i, b) in text.bytes().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'>' if !in_quotes => return Some(i),
            b'<' => return None,
            _ => {}
        }
    }
    None
}
