use crate::value::{Context, Value};
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

lazy_static! {
    static ref KEY_LIST: Regex =
        Regex::new(r"^([A-Za-z0-9_]+(:\s*[A-Za-z0-9_]+)?)(,\s*[A-Za-z0-9_]+(:\s*[A-Za-z0-9_]+)?)*$").unwrap();
    static ref KEY: Regex = Regex::new(r"([A-Za-z0-9_]+)(?::\s*([A-Za-z0-9_]+))?").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid format: contains invalid characters or structure")]
pub struct SlotDataError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotDataKey {
    pub name: String,
    pub alias: Option<String>,
}

impl SlotDataKey {
    /// Identifier the key is exposed under in the slot
    pub fn binding(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// How a component call exposes the component's data to its slots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SlotDataSpec {
    #[default]
    Empty,
    /// `slot-data="ctx"`: the whole data map under one name
    Named(String),
    /// `slot-data="{key, other: alias}"`: selected keys
    Destructured(Vec<SlotDataKey>),
}

impl SlotDataSpec {
    /// Variables to define in a slot's scope, taken from the component data
    pub fn bindings(&self, data: &Context) -> Vec<(String, Value)> {
        match self {
            SlotDataSpec::Empty => Vec::new(),
            SlotDataSpec::Named(name) => vec![(name.clone(), Value::Map(data.clone()))],
            SlotDataSpec::Destructured(keys) => keys
                .iter()
                .map(|key| {
                    let value = data.get(&key.name).cloned().unwrap_or_default();
                    (key.binding().to_string(), value)
                })
                .collect(),
        }
    }
}

/// Parse a `slotData` value: `name`, `{a, b: alias}` or empty.
pub fn parse_slot_data(expr: &str) -> Result<SlotDataSpec, SlotDataError> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Ok(SlotDataSpec::Empty);
    }
    if !(expr.starts_with('{') && expr.ends_with('}')) {
        return Ok(SlotDataSpec::Named(expr.to_string()));
    }

    let content = expr.trim_matches(|c: char| c == '{' || c == '}').trim();
    if content.is_empty() {
        return Ok(SlotDataSpec::Destructured(Vec::new()));
    }
    if !KEY_LIST.is_match(content) {
        return Err(SlotDataError);
    }

    let keys = KEY
        .captures_iter(content)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let alias = caps.get(2).map(|m| m.as_str().to_string());
            Some(SlotDataKey { name, alias })
        })
        .collect();
    Ok(SlotDataSpec::Destructured(keys))
}
