//! Ordered HTML attribute set.
//!
//! Carries the fallthrough attributes of a component call into the component's
//! template. Every operation returns a new set; a constructed set is never
//! modified in place, so one instance can be shared freely between renders.

use std::collections::HashMap;
use std::fmt;

/// Insertion-ordered, string-keyed attribute map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    order: Vec<String>,
    values: HashMap<String, String>,
}

impl Attributes {
    /// Build from ordered pairs. A repeated key keeps the position of its first
    /// occurrence and the value of its last.
    pub fn new<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut order = Vec::new();
        let mut values = HashMap::new();
        for (key, value) in pairs {
            let key = key.into();
            if !values.contains_key(&key) {
                order.push(key.clone());
            }
            values.insert(key, value.into());
        }
        Self { order, values }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate `(key, value)` in stored order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order
            .iter()
            .map(|key| (key.as_str(), self.values[key].as_str()))
    }

    /// `key="value"` pairs joined by spaces, keys and values HTML-escaped.
    ///
    /// The result is already escaped and must be written to output raw.
    pub fn render(&self) -> String {
        self.iter()
            .map(|(key, value)| format!("{}=\"{}\"", escape_html(key), escape_html(value)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Keep only `keys`, in stored order.
    pub fn only(&self, keys: &[&str]) -> Self {
        self.filtered(|key| keys.contains(&key))
    }

    /// Drop `keys`, keeping the rest in stored order.
    pub fn without(&self, keys: &[&str]) -> Self {
        self.filtered(|key| !keys.contains(&key))
    }

    /// Value for `key`, or the empty string when absent
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Append `key` with `value` when absent.
    ///
    /// `class` accumulates instead: the default is always prepended to an
    /// existing value (`btn` + `active` -> `btn active`).
    pub fn default(&self, key: &str, value: &str) -> Self {
        let mut merged = self.clone();
        if let Some(existing) = merged.values.get_mut(key) {
            if key == "class" {
                *existing = format!("{} {}", value, existing);
            }
        } else {
            merged.order.push(key.to_string());
            merged.values.insert(key.to_string(), value.to_string());
        }
        merged
    }

    fn filtered(&self, keep: impl Fn(&str) -> bool) -> Self {
        let order: Vec<String> = self.order.iter().filter(|key| keep(key)).cloned().collect();
        let values = order
            .iter()
            .map(|key| (key.clone(), self.values[key].clone()))
            .collect();
        Self { order, values }
    }
}

impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Escape `& < > " '` for HTML text and attribute values.
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
