//! Template compilation and rendering.
//!
//! A [`TemplateSet`] owns everything templates are compiled against: the
//! loader, the component registry, the preprocessors and the tag table.
//! Compiled [`Template`]s are immutable and can be rendered concurrently.

pub mod expr;
pub mod lexer;
pub mod loader;
pub mod parser;
pub mod scope;
pub mod tags;

pub use loader::{FileSystemLoader, MemoryLoader, TemplateLoader};
pub use parser::{Node, Parser, TagNode, TagParser};
pub use scope::Scope;

use crate::component::registry::ComponentRegistry;
use crate::error::{Position, TemplateError};
use crate::preprocess::{ComponentTagPreprocessor, Pipeline, PreProcessor, DEFAULT_TAG_PREFIX};
use crate::value::Context;
use lexer::Lexer;
use log::debug;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

/// Name given to templates compiled from a string
pub const STRING_TEMPLATE_NAME: &str = "<string>";

/// Configuration for a [`TemplateSet`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Prefix of HTML-like component tags (default: "x-"). `None` turns the
    /// component tag preprocessor off.
    pub tag_prefix: Option<String>,
    /// Extension appended to template names that have none (default: ".html")
    pub default_extension: Option<String>,
    /// Keys copied from the caller's scope into every component's data
    pub shared_context_keys: Vec<String>,
    /// Maximum component nesting depth at compile time
    pub max_component_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            tag_prefix: Some(DEFAULT_TAG_PREFIX.to_string()),
            default_extension: Some(".html".to_string()),
            shared_context_keys: Vec::new(),
            max_component_depth: 64,
        }
    }
}

/// A compiled template.
#[derive(Debug)]
pub struct Template {
    name: String,
    source: Arc<str>,
    nodes: Vec<Node>,
    props: Vec<String>,
    fragments: HashMap<String, Arc<[Node]>>,
    shared_keys: Arc<[String]>,
}

impl Template {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source after preprocessing; error positions refer to this text
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Props declared with `{% props %}`
    pub fn props(&self) -> &[String] {
        &self.props
    }

    pub fn shared_context_keys(&self) -> &[String] {
        &self.shared_keys
    }

    pub fn render(&self, data: Context) -> Result<String, TemplateError> {
        let mut out = String::new();
        self.render_to(data, &mut out)?;
        Ok(out)
    }

    /// Render into `out`. On error, `out` is restored to its length before
    /// the call.
    pub fn render_to(&self, data: Context, out: &mut String) -> Result<(), TemplateError> {
        self.render_nodes_to(&self.nodes, data, out)
    }

    pub fn has_fragment(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    /// Render only the body of `{% fragment "name" %}`
    pub fn render_fragment(&self, name: &str, data: Context) -> Result<String, TemplateError> {
        let Some(nodes) = self.fragments.get(name) else {
            return Err(TemplateError::render_error(
                &self.name,
                Position::default(),
                format!("fragment '{}' not found.", name),
            ));
        };
        let mut out = String::new();
        self.render_nodes_to(nodes, data, &mut out)?;
        Ok(out)
    }

    fn render_nodes_to(&self, nodes: &[Node], data: Context, out: &mut String) -> Result<(), TemplateError> {
        let start = out.len();
        let mut scope = Scope::new(data);
        parser::render_nodes(nodes, self, &mut scope, out).inspect_err(|_| out.truncate(start))
    }
}

/// Loader, component registry, preprocessors and tags shared by a group of
/// templates.
pub struct TemplateSet {
    loader: Box<dyn TemplateLoader>,
    options: Options,
    registry: ComponentRegistry,
    preprocessors: Pipeline,
    component_tags: Option<ComponentTagPreprocessor>,
    tags: HashMap<String, TagParser>,
    shared_keys: Arc<[String]>,
    cache: RwLock<HashMap<String, Arc<Template>>>,
}

impl TemplateSet {
    pub fn new(loader: impl TemplateLoader + 'static, options: Options) -> Self {
        let mut tags = HashMap::new();
        for (name, parse) in tags::BUILTIN_TAGS.iter().chain(crate::component::TAGS) {
            tags.insert(name.to_string(), *parse);
        }

        Self {
            loader: Box::new(loader),
            component_tags: options.tag_prefix.clone().map(ComponentTagPreprocessor::new),
            shared_keys: Arc::from(options.shared_context_keys.clone()),
            options,
            registry: ComponentRegistry::new(),
            preprocessors: Pipeline::new(),
            tags,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Mutable registry access. Clears compiled templates, which may have
    /// resolved components that are about to change.
    pub fn registry_mut(&mut self) -> &mut ComponentRegistry {
        self.clear_cache();
        &mut self.registry
    }

    /// Register `name`, replacing any tag of the same name
    pub fn register_tag(&mut self, name: impl Into<String>, parse: TagParser) {
        self.tags.insert(name.into(), parse);
    }

    pub fn tag(&self, name: &str) -> Option<TagParser> {
        self.tags.get(name).copied()
    }

    /// Add a preprocessor. User preprocessors run in insertion order, before
    /// the component tag rewrite.
    pub fn add_preprocessor(&mut self, preprocessor: impl PreProcessor + 'static) {
        self.preprocessors.push(preprocessor);
        self.clear_cache();
    }

    /// Register every template below `dir` as a component named after its
    /// path (`components/ui/button.html` -> `{prefix}ui.button`).
    pub fn register_components_directory(&mut self, dir: &str, prefix: &str) -> io::Result<usize> {
        let extension = self.options.default_extension.clone();
        self.clear_cache();
        self.registry
            .register_directory(self.loader.as_ref(), dir, prefix, extension.as_deref())
    }

    pub fn clear_cache(&mut self) {
        self.cache.get_mut().unwrap_or_else(PoisonError::into_inner).clear();
    }

    /// Append the default extension to names without one
    pub fn resolve_name(&self, name: &str) -> String {
        match &self.options.default_extension {
            Some(ext) if !ext.trim_start_matches('.').is_empty() && Path::new(name).extension().is_none() => {
                format!("{}.{}", name, ext.trim_start_matches('.'))
            }
            _ => name.to_string(),
        }
    }

    /// Run the preprocessors over `source`
    pub fn preprocess(&self, source: &str) -> String {
        let source = self.preprocessors.process(source);
        match &self.component_tags {
            Some(component_tags) => component_tags.process(&source),
            None => source,
        }
    }

    /// Raw source of a named template, as the loader returns it
    pub fn load_source(&self, name: &str) -> Result<String, TemplateError> {
        let path = self.resolve_name(name);
        self.loader.load(&path).map_err(|source| TemplateError::Load { name: path, source })
    }

    /// Compile a named template, reusing an earlier compilation when cached
    pub fn from_file(&self, name: &str) -> Result<Arc<Template>, TemplateError> {
        self.compile_file(name, 0)
    }

    pub fn from_string(&self, source: &str) -> Result<Template, TemplateError> {
        self.compile(STRING_TEMPLATE_NAME, source, 0)
    }

    pub fn render(&self, name: &str, data: Context) -> Result<String, TemplateError> {
        self.from_file(name)?.render(data)
    }

    pub fn render_string(&self, source: &str, data: Context) -> Result<String, TemplateError> {
        self.from_string(source)?.render(data)
    }

    pub(crate) fn compile_file(&self, name: &str, depth: usize) -> Result<Arc<Template>, TemplateError> {
        let path = self.resolve_name(name);
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&path)
            .cloned();
        if let Some(template) = cached {
            return Ok(template);
        }

        let source = self.load_source(&path)?;
        let template = Arc::new(self.compile(&path, &source, depth)?);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path, Arc::clone(&template));
        Ok(template)
    }

    pub(crate) fn compile(&self, name: &str, source: &str, depth: usize) -> Result<Template, TemplateError> {
        debug!("compiling template '{}'", name);
        let source: Arc<str> = Arc::from(self.preprocess(source));
        let lexer = Lexer::new(name, &source);
        let tokens = lexer.tokenize()?;
        let mut parser = Parser::new(self, name, tokens, depth, lexer.end_position());
        let nodes = parser.parse_document()?;
        let (props, fragments) = parser.finish();

        Ok(Template {
            name: name.to_string(),
            source: Arc::clone(&source),
            nodes,
            props,
            fragments,
            shared_keys: Arc::clone(&self.shared_keys),
        })
    }
}
