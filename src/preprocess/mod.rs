//! Source-to-source passes that run before a template is compiled.
//!
//! The main pass is [`ComponentTagPreprocessor`], which rewrites HTML-like
//! component markup into the template tag language:
//!
//! ```text
//! <x-alert type="info" :user="user">Hi</x-alert>
//! {% component "alert" withAttrs "type"="info" "user"=user %}Hi{% endcomponent %}
//! ```

mod attrs;
mod tokenizer;

pub use attrs::{parse_attributes, to_camel_case, MarkupAttribute};
pub use tokenizer::{Event, Tokenizer, VERBATIM_END, VERBATIM_START};

use log::debug;
use regex::Regex;
use serde::Serialize;

/// Default prefix marking component tags
pub const DEFAULT_TAG_PREFIX: &str = "x-";

/// Attribute holding the slot data binding of a component call
const SLOT_DATA_ATTRIBUTE: &str = "slot-data";

/// Prefix of attributes whose value is an expression
const DYNAMIC_MARKER: char = ':';

/// A text pass applied to template source before compilation.
pub trait PreProcessor: Send + Sync {
    fn process(&self, source: &str) -> String;
}

/// Result of rewriting one source with [`ComponentTagPreprocessor::rewrite`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct PreprocessResult {
    pub code: String,
    /// Component names in order of first use
    pub components: Vec<String>,
    /// Number of component and slot tags rewritten
    pub rewritten: usize,
}

/// Rewrites `<{prefix}name ...>` markup into `component`/`slot` tags.
///
/// Verbatim regions are copied unchanged. Closing tags are not matched against
/// their openers here; the template parser checks block balance at compile
/// time.
#[derive(Debug, Clone)]
pub struct ComponentTagPreprocessor {
    prefix: String,
}

impl Default for ComponentTagPreprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_TAG_PREFIX)
    }
}

impl ComponentTagPreprocessor {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn rewrite(&self, source: &str) -> PreprocessResult {
        let mut result = PreprocessResult {
            code: String::with_capacity(source.len() + source.len() / 4),
            ..PreprocessResult::default()
        };

        for event in Tokenizer::new(source, &self.prefix).tokenize() {
            let out = &mut result.code;
            match event {
                Event::Text(text) | Event::Verbatim(text) => {
                    out.push_str(text);
                    continue;
                }
                Event::Open { name, attrs } => {
                    out.push_str(&component_open(name, attrs));
                    remember(&mut result.components, name);
                }
                Event::SelfClosing { name, attrs } => {
                    out.push_str(&component_open(name, attrs));
                    out.push_str("{% endcomponent %}");
                    remember(&mut result.components, name);
                }
                Event::Close { .. } => out.push_str("{% endcomponent %}"),
                Event::SlotOpen { attrs, self_closing } => {
                    out.push_str(&slot_open(attrs));
                    if self_closing {
                        out.push_str("{% endslot %}");
                    }
                }
                Event::SlotClose => out.push_str("{% endslot %}"),
            }
            result.rewritten += 1;
        }

        if result.rewritten > 0 {
            debug!(
                "rewrote {} component tag(s) using {} distinct component(s)",
                result.rewritten,
                result.components.len()
            );
        }
        result
    }
}

impl PreProcessor for ComponentTagPreprocessor {
    fn process(&self, source: &str) -> String {
        self.rewrite(source).code
    }
}

fn remember(components: &mut Vec<String>, name: &str) {
    if !components.iter().any(|c| c == name) {
        components.push(name.to_string());
    }
}

/// `{% component "name" [slotData="..."] [withAttrs "k"="v" "k2"=expr ...] %}`
fn component_open(name: &str, attrs: &str) -> String {
    let mut slot_data = None;
    let mut with_attrs = String::new();

    for attr in parse_attributes(attrs) {
        if attr.name == SLOT_DATA_ATTRIBUTE {
            slot_data = Some(attr.value);
        } else if let Some(key) = attr.name.strip_prefix(DYNAMIC_MARKER) {
            with_attrs.push_str(&format!(" \"{}\"={}", key, attr.value));
        } else {
            with_attrs.push_str(&format!(" \"{}\"=\"{}\"", attr.name, attr.value));
        }
    }

    let mut tag = format!("{{% component \"{}\"", name);
    if let Some(value) = slot_data {
        tag.push_str(&format!(" slotData=\"{}\"", value));
    }
    if !with_attrs.is_empty() {
        tag.push_str(" withAttrs");
        tag.push_str(&with_attrs);
    }
    tag.push_str(" %}");
    tag
}

/// `{% slot "name" %}`, or `{% slot %}` without a usable name attribute
fn slot_open(attrs: &str) -> String {
    let name = parse_attributes(attrs)
        .into_iter()
        .find(|attr| to_camel_case(&attr.name) == "name")
        .map(|attr| attr.value)
        .unwrap_or_default();

    if name.is_empty() {
        "{% slot %}".to_string()
    } else {
        format!("{{% slot \"{}\" %}}", name)
    }
}

/// Removes every match of a list of patterns, applied in order.
#[derive(Debug, Clone)]
pub struct RegexRemove {
    patterns: Vec<Regex>,
}

impl RegexRemove {
    pub fn new<I, S>(patterns: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| Regex::new(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl PreProcessor for RegexRemove {
    fn process(&self, source: &str) -> String {
        let mut text = source.to_string();
        for pattern in &self.patterns {
            text = pattern.replace_all(&text, "").into_owned();
        }
        text
    }
}

/// Ordered list of preprocessors run as one pass
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn PreProcessor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, stage: impl PreProcessor + 'static) {
        self.stages.push(Box::new(stage));
    }

    pub fn push_boxed(&mut self, stage: Box<dyn PreProcessor>) {
        self.stages.push(stage);
    }

    pub fn insert(&mut self, index: usize, stage: Box<dyn PreProcessor>) {
        let index = index.min(self.stages.len());
        self.stages.insert(index, stage);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

impl PreProcessor for Pipeline {
    fn process(&self, source: &str) -> String {
        let mut text = source.to_string();
        for stage in &self.stages {
            text = stage.process(&text);
        }
        text
    }
}

/// Rewrite component markup with the given tag prefix.
pub fn preprocess(source: &str, prefix: &str) -> String {
    ComponentTagPreprocessor::new(prefix).process(source)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str) -> String {
        ComponentTagPreprocessor::default().process(input)
    }

    #[test]
    fn test_empty_component() {
        assert_eq!(run("<x-alert></x-alert>"), r#"{% component "alert" %}{% endcomponent %}"#);
    }

    #[test]
    fn test_static_and_dynamic_attributes() {
        assert_eq!(
            run(r#"<x-alert key="value" :key2="value2" />"#),
            r#"{% component "alert" withAttrs "key"="value" "key2"=value2 %}{% endcomponent %}"#
        );
    }

    #[test]
    fn test_slot_data_goes_first() {
        assert_eq!(
            run(r#"<x-alert key="value" slot-data="{aaa,bbb}"></x-alert>"#),
            r#"{% component "alert" slotData="{aaa,bbb}" withAttrs "key"="value" %}{% endcomponent %}"#
        );
    }

    #[test]
    fn test_slot_without_name() {
        assert_eq!(run("<x-slot>body</x-slot>"), "{% slot %}body{% endslot %}");
        assert_eq!(run(r#"<x-slot Name="t"/>"#), "{% slot %}{% endslot %}");
    }

    #[test]
    fn test_slot_name_attribute_is_camel_cased() {
        // `na-me` -> `naMe` is not `name`
        assert_eq!(run(r#"<x-slot na-me="t">"#), "{% slot %}");
        assert_eq!(run(r#"<x-slot class="c" name="t">"#), r#"{% slot "t" %}"#);
    }

    #[test]
    fn test_custom_prefix() {
        let p = ComponentTagPreprocessor::new("c-");
        assert_eq!(
            p.process("<c-card><x-alert /></c-card>"),
            r#"{% component "card" %}<x-alert />{% endcomponent %}"#
        );
    }

    #[test]
    fn test_rewrite_collects_components() {
        let result = ComponentTagPreprocessor::default()
            .rewrite(r#"<x-a><x-b /><x-slot name="s"></x-slot><x-b /></x-a>"#);
        assert_eq!(result.components, vec!["a", "b"]);
        assert_eq!(result.rewritten, 6);
    }

    #[test]
    fn test_regex_remove() {
        let remove = RegexRemove::new([r"<!--.*?-->", r"\s+$"]).unwrap();
        assert_eq!(remove.process("a<!-- x -->b<!--y-->  "), "ab");
        assert!(RegexRemove::new(["("]).is_err());
    }

    #[test]
    fn test_pipeline_runs_in_order() {
        let mut pipeline = Pipeline::new();
        pipeline.push(RegexRemove::new([r"\{#.*?#\}"]).unwrap());
        pipeline.push(ComponentTagPreprocessor::default());
        assert_eq!(pipeline.len(), 2);
        assert_eq!(
            pipeline.process("{# <x-gone /> #}<x-kept />"),
            r#"{% component "kept" %}{% endcomponent %}"#
        );
    }
}
