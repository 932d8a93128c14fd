//! The `component` tag.
//!
//! Compiles a component call once per occurrence and renders it on every
//! execution of the owning template.

use crate::attributes::Attributes;
use crate::component::slot_data::{parse_slot_data, SlotDataSpec};
use crate::component::{ComponentContext, ComponentDefinition, SetupOutcome, TemplateSource, ATTRIBUTES_KEY};
use crate::error::{Position, TemplateError};
use crate::template::expr::{Arguments, Expr};
use crate::template::parser::{render_nodes, Node, Parser, TagNode};
use crate::template::scope::Scope;
use crate::template::tags::DEFAULT_SLOT;
use crate::template::Template;
use crate::value::{Context, Value};
use log::{debug, trace};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug)]
struct Slot {
    name: String,
    body: Vec<Node>,
}

#[derive(Debug)]
struct ComponentNode {
    position: Position,
    definition: Arc<ComponentDefinition>,
    template: Arc<Template>,
    props: Vec<(String, Expr)>,
    attributes: Vec<(String, Expr)>,
    slots: Vec<Slot>,
    slot_data: SlotDataSpec,
}

impl ComponentNode {
    fn evaluate(&self, caller: &Template, expr: &Expr, scope: &Scope<'_>) -> Result<Value, TemplateError> {
        expr.evaluate(scope)
            .map_err(|e| TemplateError::render_error(caller.name(), self.position, e.to_string()))
    }
}

impl TagNode for ComponentNode {
    fn execute(&self, caller: &Template, scope: &mut Scope<'_>, out: &mut String) -> Result<(), TemplateError> {
        let name = &self.definition.name;
        trace!("rendering component '{}' from '{}'", name, caller.name());

        let mut data = Context::new();
        for (key, expr) in &self.props {
            data.insert(key.clone(), self.evaluate(caller, expr, scope)?);
        }

        let mut pairs = Vec::with_capacity(self.attributes.len());
        for (key, expr) in &self.attributes {
            pairs.push((key.as_str(), self.evaluate(caller, expr, scope)?.to_string()));
        }
        data.insert(ATTRIBUTES_KEY.to_string(), Value::Attributes(Attributes::new(pairs)));

        if let Some(setup) = &self.definition.setup {
            let mut context = ComponentContext::new(data);
            match setup.call(&mut context) {
                Ok(SetupOutcome::Render) => data = context.into_data(),
                Ok(SetupOutcome::NoContent) => {
                    debug!("setup of component '{}' vetoed rendering", name);
                    return Ok(());
                }
                Err(cause) => {
                    return Err(TemplateError::render_error(
                        caller.name(),
                        self.position,
                        format!("setup of component '{}' failed", name),
                    )
                    .with_source(cause));
                }
            }
        }

        for key in caller.shared_context_keys() {
            if let Some(value) = scope.get(key) {
                data.insert(key.clone(), value.clone());
            }
        }

        let exposed = self.slot_data.bindings(&data);
        for slot in &self.slots {
            let mut slot_scope = scope.child();
            for (binding, value) in &exposed {
                slot_scope.set(binding.as_str(), value.clone());
            }
            let mut content = String::new();
            render_nodes(&slot.body, caller, &mut slot_scope, &mut content)?;
            data.insert(slot.name.clone(), Value::Safe(content.trim().to_string()));
        }

        self.template.render_to(data, out)
    }
}

/// `{% component "name" [slotData="..."] [withAttrs "key"=expr ...] %}...{% endcomponent %}`
pub fn parse_component(
    parser: &mut Parser<'_>,
    position: Position,
    mut args: Arguments,
) -> Result<Box<dyn TagNode>, TemplateError> {
    let Some(name) = args.match_string() else {
        return Err(args.error("component tag needs a component name as first argument."));
    };
    let set = parser.set();
    let Some(definition) = set.registry().resolve(&name) else {
        return Err(args.error(format!("component '{}' can not be resolved.", name)));
    };

    let max_depth = set.options().max_component_depth;
    if parser.depth() >= max_depth {
        return Err(args.error(format!(
            "component '{}' exceeds the maximum nesting depth of {}.",
            name, max_depth
        )));
    }
    let depth = parser.depth() + 1;
    let template = match &definition.source {
        TemplateSource::File(file) if !file.is_empty() => set.compile_file(file, depth)?,
        TemplateSource::Inline(source) if !source.is_empty() => {
            Arc::new(set.compile(&format!("<component {}>", name), source, depth)?)
        }
        _ => return Err(args.error(format!("component '{}' has no template.", name))),
    };

    let declared: HashSet<&str> = if definition.props.is_empty() {
        template.props().iter().map(String::as_str).collect()
    } else {
        definition.props.iter().map(String::as_str).collect()
    };

    let mut slot_data = SlotDataSpec::Empty;
    if args.match_ident("slotData") {
        if !args.match_symbol("=") {
            return Err(args.error("Expected '='."));
        }
        let Some(value) = args.match_string() else {
            return Err(args.error("slotData (slot-data in with an HTML-like syntax) property needs value."));
        };
        slot_data = parse_slot_data(&value).map_err(|e| {
            args.error(format!(
                "slotData (slot-data in with an HTML-like syntax) value is invalid: {}",
                e
            ))
        })?;
    }

    let mut props = Vec::new();
    let mut attributes = Vec::new();
    if args.match_ident("withAttrs") {
        while args.remaining() > 0 {
            let Some(key) = args.match_string() else {
                return Err(args.error("Expected an identifier"));
            };
            if !args.match_symbol("=") {
                return Err(args.error("Expected '='."));
            }
            let expr = args.parse_expression()?;
            if declared.contains(key.as_str()) {
                props.push((key, expr));
            } else {
                attributes.push((key, expr));
            }
        }
    }

    if args.remaining() > 0 {
        return Err(args.error("Malformed 'component'-tag arguments."));
    }

    let mut slots = Vec::new();
    let mut default_content = Vec::new();
    loop {
        let wrapped = parser.wrap_until(&["slot", "endcomponent"])?;
        default_content.extend(wrapped.nodes);
        let mut end_args = wrapped.end_args;

        if wrapped.end_tag == "endcomponent" {
            if end_args.count() > 0 {
                return Err(end_args.error("Arguments not allowed here."));
            }
            break;
        }

        let Some(slot_name) = end_args.match_string() else {
            return Err(end_args.error("slot tag needs a slot name as first argument."));
        };
        let body = parser.wrap_until(&["endslot"])?;
        if body.end_args.count() > 0 {
            return Err(body.end_args.error("Arguments not allowed here."));
        }
        slots.push(Slot {
            name: slot_name,
            body: body.nodes,
        });
    }
    slots.push(Slot {
        name: DEFAULT_SLOT.to_string(),
        body: default_content,
    });

    Ok(Box::new(ComponentNode {
        position,
        definition,
        template,
        props,
        attributes,
        slots,
        slot_data,
    }))
}
