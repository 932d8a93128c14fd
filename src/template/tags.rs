//! Built-in tags.
//!
//! ```text
//! {% if cond %}…{% elif cond %}…{% else %}…{% endif %}
//! {% for item in list %}…{% empty %}…{% endfor %}
//! {% set name = expr %}
//! {% props title, kind="info" %}
//! {% slot "title" %}fallback{% endslot %}
//! {% fragment "name" %}…{% endfragment %}
//! ```

use crate::error::{Position, TemplateError};
use crate::template::expr::{Arguments, Expr};
use crate::template::parser::{render_nodes, Node, Parser, TagNode, TagParser};
use crate::template::scope::Scope;
use crate::template::Template;
use crate::value::{Context, Value};
use std::sync::Arc;

/// Key of the default slot
pub const DEFAULT_SLOT: &str = "slot";

pub(crate) const BUILTIN_TAGS: &[(&str, TagParser)] = &[
    ("if", parse_if as TagParser),
    ("for", parse_for as TagParser),
    ("set", parse_set as TagParser),
    ("props", parse_props as TagParser),
    ("slot", parse_slot as TagParser),
    ("fragment", parse_fragment as TagParser),
];

fn evaluate(
    expr: &Expr,
    template: &Template,
    position: Position,
    scope: &Scope<'_>,
) -> Result<Value, TemplateError> {
    expr.evaluate(scope)
        .map_err(|e| TemplateError::render_error(template.name(), position, e.to_string()))
}

fn no_arguments(args: &Arguments) -> Result<(), TemplateError> {
    if args.count() > 0 {
        return Err(args.error("Arguments not allowed here."));
    }
    Ok(())
}

fn expression_only(args: &mut Arguments, tag: &str) -> Result<Expr, TemplateError> {
    let expr = args.parse_expression()?;
    if args.remaining() > 0 {
        return Err(args.error(format!("Malformed '{}'-tag arguments.", tag)));
    }
    Ok(expr)
}

// if

#[derive(Debug)]
struct IfNode {
    position: Position,
    branches: Vec<(Expr, Vec<Node>)>,
    otherwise: Vec<Node>,
}

impl TagNode for IfNode {
    fn execute(&self, template: &Template, scope: &mut Scope<'_>, out: &mut String) -> Result<(), TemplateError> {
        for (condition, body) in &self.branches {
            if evaluate(condition, template, self.position, scope)?.is_truthy() {
                return render_nodes(body, template, scope, out);
            }
        }
        render_nodes(&self.otherwise, template, scope, out)
    }
}

fn parse_if(parser: &mut Parser<'_>, position: Position, mut args: Arguments) -> Result<Box<dyn TagNode>, TemplateError> {
    let mut condition = expression_only(&mut args, "if")?;
    let mut branches = Vec::new();
    let mut otherwise = Vec::new();

    loop {
        let mut wrapped = parser.wrap_until(&["elif", "else", "endif"])?;
        match wrapped.end_tag.as_str() {
            "elif" => {
                let next = expression_only(&mut wrapped.end_args, "elif")?;
                branches.push((condition, wrapped.nodes));
                condition = next;
            }
            "else" => {
                no_arguments(&wrapped.end_args)?;
                branches.push((condition, wrapped.nodes));
                let closing = parser.wrap_until(&["endif"])?;
                no_arguments(&closing.end_args)?;
                otherwise = closing.nodes;
                break;
            }
            _ => {
                no_arguments(&wrapped.end_args)?;
                branches.push((condition, wrapped.nodes));
                break;
            }
        }
    }

    Ok(Box::new(IfNode { position, branches, otherwise }))
}

// for

#[derive(Debug)]
struct ForNode {
    position: Position,
    key: String,
    value: Option<String>,
    iterable: Expr,
    body: Vec<Node>,
    empty: Vec<Node>,
}

impl ForNode {
    fn pairs(&self, iterable: Value) -> Result<Vec<(Value, Value)>, String> {
        Ok(match iterable {
            Value::Null => Vec::new(),
            Value::List(items) => items.into_iter().map(|item| (item, Value::Null)).collect(),
            Value::Map(map) => map.into_iter().map(|(k, v)| (Value::Str(k), v)).collect(),
            Value::Attributes(attrs) => attrs
                .iter()
                .map(|(k, v)| (Value::from(k), Value::from(v)))
                .collect(),
            other => return Err(format!("'{}' is not iterable", other.type_name())),
        })
    }
}

impl TagNode for ForNode {
    fn execute(&self, template: &Template, scope: &mut Scope<'_>, out: &mut String) -> Result<(), TemplateError> {
        let iterable = evaluate(&self.iterable, template, self.position, scope)?;
        let pairs = self
            .pairs(iterable)
            .map_err(|msg| TemplateError::render_error(template.name(), self.position, msg))?;

        if pairs.is_empty() {
            return render_nodes(&self.empty, template, scope, out);
        }

        let total = pairs.len();
        for (index, (key, value)) in pairs.into_iter().enumerate() {
            let mut child = scope.child();
            child.set(self.key.as_str(), key);
            if let Some(name) = &self.value {
                child.set(name.as_str(), value);
            }
            let mut forloop = Context::new();
            forloop.insert("counter".into(), Value::Int(index as i64 + 1));
            forloop.insert("counter0".into(), Value::Int(index as i64));
            forloop.insert("first".into(), Value::Bool(index == 0));
            forloop.insert("last".into(), Value::Bool(index + 1 == total));
            child.set("forloop", Value::Map(forloop));
            render_nodes(&self.body, template, &mut child, out)?;
        }
        Ok(())
    }
}

fn parse_for(parser: &mut Parser<'_>, position: Position, mut args: Arguments) -> Result<Box<dyn TagNode>, TemplateError> {
    let Some(key) = args.match_any_ident() else {
        return Err(args.error("Expected an identifier as loop variable."));
    };
    let value = if args.match_symbol(",") {
        let Some(name) = args.match_any_ident() else {
            return Err(args.error("Expected an identifier after ','."));
        };
        Some(name)
    } else {
        None
    };
    if !args.match_ident("in") {
        return Err(args.error("Expected keyword 'in'."));
    }
    let iterable = expression_only(&mut args, "for")?;

    let wrapped = parser.wrap_until(&["empty", "endfor"])?;
    no_arguments(&wrapped.end_args)?;
    let body = wrapped.nodes;
    let empty = if wrapped.end_tag == "empty" {
        let closing = parser.wrap_until(&["endfor"])?;
        no_arguments(&closing.end_args)?;
        closing.nodes
    } else {
        Vec::new()
    };

    Ok(Box::new(ForNode {
        position,
        key,
        value,
        iterable,
        body,
        empty,
    }))
}

// set

#[derive(Debug)]
struct SetNode {
    position: Position,
    name: String,
    expr: Expr,
}

impl TagNode for SetNode {
    fn execute(&self, template: &Template, scope: &mut Scope<'_>, _out: &mut String) -> Result<(), TemplateError> {
        let value = evaluate(&self.expr, template, self.position, scope)?;
        scope.set(self.name.as_str(), value);
        Ok(())
    }
}

fn parse_set(_parser: &mut Parser<'_>, position: Position, mut args: Arguments) -> Result<Box<dyn TagNode>, TemplateError> {
    let Some(name) = args.match_any_ident() else {
        return Err(args.error("Expected an identifier."));
    };
    if !args.match_symbol("=") {
        return Err(args.error("Expected '='."));
    }
    let expr = expression_only(&mut args, "set")?;
    Ok(Box::new(SetNode { position, name, expr }))
}

// props

#[derive(Debug)]
struct PropsNode {
    position: Position,
    defaults: Vec<(String, Expr)>,
}

impl TagNode for PropsNode {
    fn execute(&self, template: &Template, scope: &mut Scope<'_>, _out: &mut String) -> Result<(), TemplateError> {
        for (key, expr) in &self.defaults {
            // absent or none means the caller did not pass the prop
            if scope.get(key).is_none_or(Value::is_null) {
                let value = evaluate(expr, template, self.position, scope)?;
                scope.set(key.as_str(), value);
            }
        }
        Ok(())
    }
}

fn parse_props(parser: &mut Parser<'_>, position: Position, mut args: Arguments) -> Result<Box<dyn TagNode>, TemplateError> {
    let mut keys = Vec::new();
    let mut defaults = Vec::new();

    while args.remaining() > 0 {
        let Some(key) = args.match_any_ident() else {
            return Err(args.error("Expected a key (identifier)."));
        };
        if args.match_symbol("=") {
            defaults.push((key.clone(), args.parse_expression()?));
        }
        keys.push(key);
        args.match_symbol(",");
    }

    parser.set_props(keys);
    Ok(Box::new(PropsNode { position, defaults }))
}

// slot outlet

#[derive(Debug)]
struct SlotNode {
    name: String,
    fallback: Vec<Node>,
}

impl TagNode for SlotNode {
    fn execute(&self, template: &Template, scope: &mut Scope<'_>, out: &mut String) -> Result<(), TemplateError> {
        match scope.get(&self.name) {
            Some(content) if content.is_truthy() => {
                out.push_str(&content.to_html());
                Ok(())
            }
            _ => render_nodes(&self.fallback, template, scope, out),
        }
    }
}

fn parse_slot(parser: &mut Parser<'_>, _position: Position, mut args: Arguments) -> Result<Box<dyn TagNode>, TemplateError> {
    let name = args.match_string().unwrap_or_else(|| DEFAULT_SLOT.to_string());
    if args.remaining() > 0 {
        return Err(args.error("Malformed 'slot'-tag arguments."));
    }
    let wrapped = parser.wrap_until(&["endslot"])?;
    no_arguments(&wrapped.end_args)?;
    Ok(Box::new(SlotNode {
        name,
        fallback: wrapped.nodes,
    }))
}

// fragment

#[derive(Debug)]
struct FragmentNode {
    body: Arc<[Node]>,
}

impl TagNode for FragmentNode {
    fn execute(&self, template: &Template, scope: &mut Scope<'_>, out: &mut String) -> Result<(), TemplateError> {
        render_nodes(&self.body, template, scope, out)
    }
}

fn parse_fragment(parser: &mut Parser<'_>, _position: Position, mut args: Arguments) -> Result<Box<dyn TagNode>, TemplateError> {
    let Some(name) = args.match_string() else {
        return Err(args.error("fragment tag needs at least a string as name."));
    };
    let wrapped = parser.wrap_until(&["endfragment"])?;
    no_arguments(&wrapped.end_args)?;
    let body: Arc<[Node]> = Arc::from(wrapped.nodes);
    parser.add_fragment(name, Arc::clone(&body));
    Ok(Box::new(FragmentNode { body }))
}
