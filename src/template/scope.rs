use crate::value::{Context, Value};

/// Lexical variable scope.
///
/// Lookups walk up the parent chain; writes always land in the innermost
/// scope, so a child never modifies the scope it was derived from.
#[derive(Debug)]
pub struct Scope<'a> {
    vars: Context,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'static> {
    pub fn new(vars: Context) -> Self {
        Self { vars, parent: None }
    }
}

impl<'a> Scope<'a> {
    pub fn child(&self) -> Scope<'_> {
        Scope {
            vars: Context::new(),
            parent: Some(self),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.vars.get(name) {
            Some(value) => Some(value),
            None => self.parent.and_then(|parent| parent.get(name)),
        }
    }

    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    /// Variables defined directly in this scope
    pub fn locals(&self) -> &Context {
        &self.vars
    }
}
