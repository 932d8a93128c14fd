use crate::attributes::{escape_html, Attributes};
use std::collections::BTreeMap;
use std::fmt;

/// Data map handed to templates and component setup hooks.
pub type Context = BTreeMap<String, Value>;

/// Evaluated expression result.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Pre-escaped markup; written to output as is
    Safe(String),
    List(Vec<Value>),
    Map(Context),
    Attributes(Attributes),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Safe(_) => "safe string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Attributes(_) => "attributes",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) | Value::Safe(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Attributes(attrs) => !attrs.is_empty(),
        }
    }

    /// Whether the value is written to output without escaping
    pub fn is_safe(&self) -> bool {
        matches!(self, Value::Safe(_) | Value::Attributes(_))
    }

    /// Output form: safe values raw, everything else HTML-escaped
    pub fn to_html(&self) -> String {
        if self.is_safe() {
            self.to_string()
        } else {
            escape_html(&self.to_string())
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Str(s) | Value::Safe(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            Value::Attributes(attrs) => Some(attrs.len()),
            _ => None,
        }
    }

    /// Member lookup used by dotted access (`user.name`, `attributes.class`)
    pub fn member(&self, key: &str) -> Value {
        match self {
            Value::Map(map) => map.get(key).cloned().unwrap_or_default(),
            Value::Attributes(attrs) if attrs.has(key) => Value::Str(attrs.get(key).to_string()),
            Value::List(items) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or_default(),
            _ => Value::Null,
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter().map(|(k, v)| (k, Value::from_json(v))).collect(),
            ),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Str(s) | Value::Safe(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::Attributes(attrs) => serde_json::Value::Object(
                attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                    .collect(),
            ),
        }
    }
}

/// Build a [`Context`] from a JSON object. Non-object input yields `None`.
pub fn context_from_json(json: serde_json::Value) -> Option<Context> {
    match Value::from_json(json) {
        Value::Map(map) => Some(map),
        Value::Null => Some(Context::new()),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Str(s) | Value::Safe(s) => f.write_str(s),
            Value::List(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            Value::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
            Value::Attributes(attrs) => f.write_str(&attrs.render()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<Attributes> for Value {
    fn from(attrs: Attributes) -> Self {
        Value::Attributes(attrs)
    }
}

impl From<Context> for Value {
    fn from(map: Context) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map(Into::into).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::from(vec!["a", "b"]).to_string(), "[a, b]");
    }

    #[test]
    fn test_to_html_escapes_unless_safe() {
        assert_eq!(Value::from("<b>").to_html(), "&lt;b&gt;");
        assert_eq!(Value::Safe("<b>".into()).to_html(), "<b>");
        let attrs = Attributes::new([("id", "<x>")]);
        assert_eq!(Value::Attributes(attrs).to_html(), "id=\"&lt;x&gt;\"");
    }

    #[test]
    fn test_json_conversion() {
        let json = serde_json::json!({"name": "Alice", "age": 20, "tags": ["a"], "ratio": 0.5});
        let ctx = context_from_json(json.clone()).unwrap();
        assert_eq!(ctx["name"], Value::from("Alice"));
        assert_eq!(ctx["age"], Value::Int(20));
        assert_eq!(ctx["ratio"], Value::Float(0.5));
        assert_eq!(Value::Map(ctx).to_json(), json);
        assert!(context_from_json(serde_json::json!([1, 2])).is_none());
    }

    #[test]
    fn test_member_lookup() {
        let mut map = Context::new();
        map.insert("name".into(), "Bob".into());
        let user = Value::Map(map);
        assert_eq!(user.member("name"), Value::from("Bob"));
        assert_eq!(user.member("missing"), Value::Null);
        let attrs = Value::Attributes(Attributes::new([("class", "btn")]));
        assert_eq!(attrs.member("class"), Value::from("btn"));
        assert_eq!(Value::Int(1).member("x"), Value::Null);
    }
}
