use crate::component::{ComponentDefinition, SetupHook};
use crate::template::TemplateLoader;
use log::debug;
use std::collections::HashMap;
use std::io;
use std::path::Path;
use std::sync::Arc;

/// Component definitions by name. The last registration for a name wins.
#[derive(Debug, Clone, Default)]
pub struct ComponentRegistry {
    components: HashMap<String, Arc<ComponentDefinition>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, definition: ComponentDefinition) {
        let name = definition.name.clone();
        if self.components.insert(name.clone(), Arc::new(definition)).is_some() {
            debug!("component '{}' replaced by a later registration", name);
        } else {
            debug!("registered component '{}'", name);
        }
    }

    /// Component rendered from a template file
    pub fn register_file(&mut self, name: &str, template: &str, props: &[&str], setup: Option<SetupHook>) {
        let mut definition = ComponentDefinition::file(name, template).with_props(props);
        definition.setup = setup;
        self.register(definition);
    }

    /// Component rendered from a template string
    pub fn register_inline(&mut self, name: &str, template: &str, props: &[&str], setup: Option<SetupHook>) {
        let mut definition = ComponentDefinition::inline(name, template).with_props(props);
        definition.setup = setup;
        self.register(definition);
    }

    /// Component with no markup of its own; renders its default slot
    pub fn register_headless(&mut self, name: &str, props: &[&str], setup: Option<SetupHook>) {
        let mut definition = ComponentDefinition::headless(name).with_props(props);
        definition.setup = setup;
        self.register(definition);
    }

    /// Register every file below `dir` as a file component.
    ///
    /// Names are the path relative to `dir` with `default_extension` removed
    /// and `/` replaced by `.`, prefixed with `prefix`. Props come from each
    /// template's own `props` tag. Returns the number of components found.
    pub fn register_directory(
        &mut self,
        loader: &dyn TemplateLoader,
        dir: &str,
        prefix: &str,
        default_extension: Option<&str>,
    ) -> io::Result<usize> {
        let dir = dir.trim_matches('/');
        let files = loader.list(dir)?;
        let extension = default_extension
            .map(|ext| ext.trim_start_matches('.'))
            .filter(|ext| !ext.is_empty());

        for relative in &files {
            let template = if dir.is_empty() {
                relative.clone()
            } else {
                format!("{}/{}", dir, relative)
            };
            let stem = match extension {
                Some(ext) if Path::new(relative).extension().is_some_and(|x| x == ext) => {
                    &relative[..relative.len() - ext.len() - 1]
                }
                _ => relative.as_str(),
            };
            let name = format!("{}{}", prefix, stem.replace('/', "."));
            self.register(ComponentDefinition::file(name, template));
        }

        debug!("scanned '{}': {} component(s)", dir, files.len());
        Ok(files.len())
    }

    pub fn resolve(&self, name: &str) -> Option<Arc<ComponentDefinition>> {
        self.components.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.components.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
