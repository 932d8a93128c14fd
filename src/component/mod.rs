//! Components: named sub-templates called with props, fallthrough
//! attributes and slots.
//!
//! ```text
//! {% component "alert" slotData="{kind}" withAttrs "kind"="info" "id"=id %}
//!   {% slot "title" %}Heads up{% endslot %}
//!   Body text becomes the default slot.
//! {% endcomponent %}
//! ```

pub mod context;
pub mod node;
pub mod registry;
pub mod slot_data;

pub use context::{ComponentContext, ContextError};
pub use registry::ComponentRegistry;
pub use slot_data::{parse_slot_data, SlotDataError, SlotDataKey, SlotDataSpec};

use crate::error::BoxError;
use crate::template::TagParser;
use std::fmt;
use std::sync::Arc;

/// Data key holding a component's fallthrough attributes
pub const ATTRIBUTES_KEY: &str = "attributes";

/// Template of headless components: the default slot, verbatim
pub const HEADLESS_TEMPLATE: &str = "{{ slot }}";

pub(crate) const TAGS: &[(&str, TagParser)] = &[("component", node::parse_component as TagParser)];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Template name resolved through the set's loader
    File(String),
    Inline(String),
}

/// What a setup hook decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupOutcome {
    Render,
    /// Render nothing for this component call; not an error
    NoContent,
}

type SetupFn = dyn Fn(&mut ComponentContext) -> Result<SetupOutcome, BoxError> + Send + Sync;

/// Hook run before a component renders. It may read and rewrite the
/// component's data or veto rendering with [`SetupOutcome::NoContent`].
#[derive(Clone)]
pub struct SetupHook(Arc<SetupFn>);

impl SetupHook {
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(&mut ComponentContext) -> Result<SetupOutcome, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub fn call(&self, context: &mut ComponentContext) -> Result<SetupOutcome, BoxError> {
        (self.0)(context)
    }
}

impl fmt::Debug for SetupHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SetupHook(..)")
    }
}

/// A registered component. Read-only once registered.
#[derive(Debug, Clone)]
pub struct ComponentDefinition {
    pub name: String,
    pub source: TemplateSource,
    /// Keys bound as props; every other attribute falls through
    pub props: Vec<String>,
    pub setup: Option<SetupHook>,
}

impl ComponentDefinition {
    pub fn file(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: TemplateSource::File(template.into()),
            props: Vec::new(),
            setup: None,
        }
    }

    pub fn inline(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: TemplateSource::Inline(template.into()),
            props: Vec::new(),
            setup: None,
        }
    }

    pub fn headless(name: impl Into<String>) -> Self {
        Self::inline(name, HEADLESS_TEMPLATE)
    }

    pub fn with_props<S: AsRef<str>>(mut self, props: &[S]) -> Self {
        self.props = props.iter().map(|p| p.as_ref().to_string()).collect();
        self
    }

    pub fn with_setup(mut self, setup: SetupHook) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn is_headless(&self) -> bool {
        matches!(&self.source, TemplateSource::Inline(source) if source == HEADLESS_TEMPLATE)
    }
}
