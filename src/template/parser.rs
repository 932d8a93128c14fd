use crate::error::{Position, TemplateError};
use crate::template::expr::{Arguments, Expr};
use crate::template::lexer::Token;
use crate::template::scope::Scope;
use crate::template::{Template, TemplateSet};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Compiles one `{% name ... %}` tag (and any body it wraps) into a node.
pub type TagParser = fn(&mut Parser<'_>, Position, Arguments) -> Result<Box<dyn TagNode>, TemplateError>;

/// A compiled tag. Nodes are immutable and shared by concurrent renders.
pub trait TagNode: fmt::Debug + Send + Sync {
    fn execute(&self, template: &Template, scope: &mut Scope<'_>, out: &mut String) -> Result<(), TemplateError>;
}

#[derive(Debug)]
pub enum Node {
    Text(String),
    Output { expr: Expr, position: Position },
    Tag(Box<dyn TagNode>),
}

/// Render a node range into `out`
pub fn render_nodes(
    nodes: &[Node],
    template: &Template,
    scope: &mut Scope<'_>,
    out: &mut String,
) -> Result<(), TemplateError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Output { expr, position } => {
                let value = expr
                    .evaluate(scope)
                    .map_err(|e| TemplateError::render_error(template.name(), *position, e.to_string()))?;
                out.push_str(&value.to_html());
            }
            Node::Tag(tag) => tag.execute(template, scope, out)?,
        }
    }
    Ok(())
}

/// Nodes wrapped by a block tag, plus the tag that ended the block
pub struct Wrapped {
    pub nodes: Vec<Node>,
    pub end_tag: String,
    pub end_args: Arguments,
}

/// Builds the node tree of one template from its tokens.
pub struct Parser<'s> {
    set: &'s TemplateSet,
    name: String,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    end_position: Position,
    props: Vec<String>,
    fragments: HashMap<String, Arc<[Node]>>,
}

impl<'s> Parser<'s> {
    pub fn new(set: &'s TemplateSet, name: &str, tokens: Vec<Token>, depth: usize, end_position: Position) -> Self {
        Self {
            set,
            name: name.to_string(),
            tokens,
            pos: 0,
            depth,
            end_position,
            props: Vec::new(),
            fragments: HashMap::new(),
        }
    }

    pub fn set(&self) -> &'s TemplateSet {
        self.set
    }

    /// Name of the template being compiled
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Component nesting depth of the template being compiled (0 for a page)
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Record the props declared by the template's `props` tag
    pub fn set_props(&mut self, props: Vec<String>) {
        self.props = props;
    }

    pub fn add_fragment(&mut self, name: String, nodes: Arc<[Node]>) {
        self.fragments.insert(name, nodes);
    }

    pub fn error(&self, position: Position, message: impl Into<String>) -> TemplateError {
        TemplateError::syntax(&self.name, position, message)
    }

    pub fn parse_document(&mut self) -> Result<Vec<Node>, TemplateError> {
        let (nodes, _) = self.parse_nodes(&[])?;
        Ok(nodes)
    }

    /// Parse nodes until one of `end_tags`; the end tag is consumed and
    /// returned with its arguments.
    pub fn wrap_until(&mut self, end_tags: &[&str]) -> Result<Wrapped, TemplateError> {
        match self.parse_nodes(end_tags)? {
            (nodes, Some((end_tag, end_args))) => Ok(Wrapped { nodes, end_tag, end_args }),
            (_, None) => Err(self.error(
                self.end_position,
                format!("Unexpected end of template, expected one of: {}.", end_tags.join(", ")),
            )),
        }
    }

    pub(crate) fn finish(self) -> (Vec<String>, HashMap<String, Arc<[Node]>>) {
        (self.props, self.fragments)
    }

    fn parse_nodes(&mut self, end_tags: &[&str]) -> Result<(Vec<Node>, Option<(String, Arguments)>), TemplateError> {
        let mut nodes = Vec::new();

        while let Some(token) = self.tokens.get(self.pos).cloned() {
            self.pos += 1;
            match token {
                Token::Text(text) => nodes.push(Node::Text(text)),
                Token::Output { expr, position } => {
                    let mut args = Arguments::new(&self.name, position, &expr)?;
                    let expr = args.parse_expression()?;
                    if args.remaining() > 0 {
                        return Err(args.error("Unexpected token in variable output."));
                    }
                    nodes.push(Node::Output { expr, position });
                }
                Token::Tag { name, args, position } => {
                    let arguments = Arguments::new(&self.name, position, &args)?;
                    if end_tags.contains(&name.as_str()) {
                        return Ok((nodes, Some((name, arguments))));
                    }
                    let Some(parse_tag) = self.set.tag(&name) else {
                        return Err(self.error(position, format!("Tag '{}' not found or not allowed here.", name)));
                    };
                    nodes.push(Node::Tag(parse_tag(self, position, arguments)?));
                }
            }
        }

        Ok((nodes, None))
    }
}
