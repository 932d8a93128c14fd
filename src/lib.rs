//! Server-side template components.
//!
//! Templates may call components with HTML-like tags:
//!
//! ```html
//! <x-alert kind="warn" :count="items|length" class="mb-2">
//!   <x-slot name="title">Heads up</x-slot>
//!   Something happened.
//! </x-alert>
//! ```
//!
//! The [`preprocess`] pass rewrites that markup into `{% component %}` and
//! `{% slot %}` tags. [`TemplateSet`] compiles those against a
//! [`ComponentRegistry`]: arguments declared as props become template
//! variables, the rest reach the component as [`Attributes`], and slot bodies
//! are rendered in the caller's scope before the component template runs.
//!
//! ```
//! use viewkit::{MemoryLoader, Options, TemplateSet, Context};
//!
//! let loader = MemoryLoader::new()
//!     .with("alert.html", r#"{% props kind="info" %}<div class="{{ kind }}" {{ attributes }}>{{ slot }}</div>"#)
//!     .with("page.html", r#"<x-alert kind="warn" id="a">Hi</x-alert>"#);
//! let mut set = TemplateSet::new(loader, Options::default());
//! set.registry_mut().register_file("alert", "alert.html", &[], None);
//!
//! let html = set.render("page", Context::new()).unwrap();
//! assert_eq!(html, r#"<div class="warn" id="a">Hi</div>"#);
//! ```

pub mod attributes;
pub mod component;
pub mod config;
pub mod error;
pub mod logging;
pub mod preprocess;
pub mod template;
pub mod value;

pub use attributes::Attributes;
pub use component::{ComponentContext, ComponentDefinition, ComponentRegistry, SetupHook, SetupOutcome};
pub use config::{Config, ConfigError};
pub use error::TemplateError;
pub use preprocess::{preprocess, ComponentTagPreprocessor, PreProcessor};
pub use template::{FileSystemLoader, MemoryLoader, Options, Template, TemplateLoader, TemplateSet};
pub use value::{Context, Value};
