use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // name="value"; no escaped quotes, value stays on one line
    static ref ATTRIBUTE: Regex = Regex::new(r#"([a-zA-Z0-9_:.\-]+)\s*=\s*"(.*?)""#).unwrap();
}

/// One `name="value"` pair from a markup tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupAttribute {
    pub name: String,
    pub value: String,
}

/// Extract attributes from the raw text between a tag name and its `>`.
///
/// Source order is preserved. Anything that is not a quoted `name="value"`
/// pair (bare boolean attributes, single-quoted values) is skipped.
pub fn parse_attributes(text: &str) -> Vec<MarkupAttribute> {
    ATTRIBUTE
        .captures_iter(text)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str();
            let value = caps.get(2)?.as_str();
            Some(MarkupAttribute {
                name: name.to_string(),
                value: value.to_string(),
            })
        })
        .collect()
}

/// kebab-case -> camelCase (`slot-name` -> `slotName`)
pub fn to_camel_case(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut capitalize_next = false;
    for c in input.chars() {
        if c == '-' {
            capitalize_next = true;
        } else if capitalize_next {
            result.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }
    result
}
