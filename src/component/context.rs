use crate::attributes::Attributes;
use crate::component::ATTRIBUTES_KEY;
use crate::value::{Context, Value};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("expected a map of values, got {0}")]
    NotAMap(&'static str),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Data of one component call, as seen by its setup hook.
///
/// Holds the evaluated props and the `attributes` set. Whatever the hook
/// leaves here is what the component template renders with.
#[derive(Debug, Clone, Default)]
pub struct ComponentContext {
    data: Context,
}

impl ComponentContext {
    pub fn new(data: Context) -> Self {
        Self { data }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn delete(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Set `key` only when it is absent
    pub fn default(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.entry(key.into()).or_insert_with(|| value.into());
    }

    /// [`default`](Self::default) for every field of a serializable map or struct
    pub fn defaults<T: Serialize>(&mut self, data: &T) -> Result<(), ContextError> {
        for (key, value) in to_context(data)? {
            self.data.entry(key).or_insert(value);
        }
        Ok(())
    }

    /// Overwrite keys with the fields of a serializable map or struct
    pub fn update<T: Serialize>(&mut self, data: &T) -> Result<(), ContextError> {
        self.data.extend(to_context(data)?);
        Ok(())
    }

    /// Decode the data into a typed value
    pub fn bind<T: DeserializeOwned>(&self) -> Result<T, ContextError> {
        let json = Value::Map(self.data.clone()).to_json();
        Ok(serde_json::from_value(json)?)
    }

    pub fn attributes(&self) -> Option<&Attributes> {
        match self.data.get(ATTRIBUTES_KEY) {
            Some(Value::Attributes(attrs)) => Some(attrs),
            _ => None,
        }
    }

    pub fn set_attributes(&mut self, attributes: Attributes) {
        self.data.insert(ATTRIBUTES_KEY.to_string(), Value::Attributes(attributes));
    }

    pub fn data(&self) -> &Context {
        &self.data
    }

    pub fn into_data(self) -> Context {
        self.data
    }
}

fn to_context<T: Serialize>(data: &T) -> Result<Context, ContextError> {
    match Value::from_json(serde_json::to_value(data)?) {
        Value::Map(map) => Ok(map),
        Value::Null => Ok(Context::new()),
        other => Err(ContextError::NotAMap(other.type_name())),
    }
}
