//! Tag arguments and expressions.
//!
//! Tag parsers consume their arguments through [`Arguments`], a cursor over
//! expression tokens. Expressions compile to [`Expr`] and are evaluated
//! against a [`Scope`].

use crate::attributes::escape_html;
use crate::error::{Position, TemplateError};
use crate::template::scope::Scope;
use crate::value::Value;
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprToken {
    Ident(String),
    Str(String),
    Int(i64),
    Float(f64),
    Symbol(&'static str),
}

/// Longest first so `==` wins over `=`
const SYMBOLS: &[&str] = &[
    "==", "!=", "<=", ">=", "=", ",", "(", ")", ".", ":", "|", "<", ">", "[", "]", "-",
];

/// Split tag arguments or an output expression into tokens.
pub fn tokenize(source: &str) -> Result<Vec<ExprToken>, String> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
        } else if b == b'"' || b == b'\'' {
            let (value, end) = read_string(source, i)?;
            tokens.push(ExprToken::Str(value));
            i = end;
        } else if b.is_ascii_digit() {
            let start = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            let is_float = i + 1 < bytes.len() && bytes[i] == b'.' && bytes[i + 1].is_ascii_digit();
            if is_float {
                i += 1;
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let text = &source[start..i];
                let value = text.parse::<f64>().map_err(|_| format!("invalid number '{}'", text))?;
                tokens.push(ExprToken::Float(value));
            } else {
                let text = &source[start..i];
                let value = text.parse::<i64>().map_err(|_| format!("invalid number '{}'", text))?;
                tokens.push(ExprToken::Int(value));
            }
        } else if b.is_ascii_alphabetic() || b == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(ExprToken::Ident(source[start..i].to_string()));
        } else if let Some(symbol) = SYMBOLS.iter().copied().find(|s| source[i..].starts_with(*s)) {
            tokens.push(ExprToken::Symbol(symbol));
            i += symbol.len();
        } else {
            let c = source[i..].chars().next().unwrap_or('?');
            return Err(format!("unexpected character '{}'", c));
        }
    }

    Ok(tokens)
}

/// Read a quoted string starting at `start`; returns the unescaped value and
/// the offset after the closing quote
fn read_string(source: &str, start: usize) -> Result<(String, usize), String> {
    let mut chars = source[start..].char_indices();
    let quote = chars.next().map(|(_, c)| c).unwrap_or('"');
    let mut value = String::new();

    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => value.push('\n'),
                Some((_, 't')) => value.push('\t'),
                Some((_, other)) => value.push(other),
                None => break,
            },
            c if c == quote => return Ok((value, start + offset + c.len_utf8())),
            c => value.push(c),
        }
    }
    Err("string not closed".to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
}

impl CompareOp {
    fn from_token(token: &ExprToken) -> Option<Self> {
        match token {
            ExprToken::Symbol("==") => Some(CompareOp::Eq),
            ExprToken::Symbol("!=") => Some(CompareOp::Ne),
            ExprToken::Symbol("<") => Some(CompareOp::Lt),
            ExprToken::Symbol("<=") => Some(CompareOp::Le),
            ExprToken::Symbol(">") => Some(CompareOp::Gt),
            ExprToken::Symbol(">=") => Some(CompareOp::Ge),
            ExprToken::Ident(kw) if kw == "in" => Some(CompareOp::In),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "in",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Safe,
    Escape,
    Upper,
    Lower,
    Length,
    Default,
}

impl Filter {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "safe" => Some(Filter::Safe),
            "escape" | "e" => Some(Filter::Escape),
            "upper" => Some(Filter::Upper),
            "lower" => Some(Filter::Lower),
            "length" => Some(Filter::Length),
            "default" => Some(Filter::Default),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var(String),
    Member(Box<Expr>, String),
    Index(Box<Expr>, Box<Expr>),
    Call {
        target: Box<Expr>,
        method: String,
        args: Vec<Expr>,
    },
    List(Vec<Expr>),
    Neg(Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Compare {
        op: CompareOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Filter {
        expr: Box<Expr>,
        filter: Filter,
        arg: Option<Box<Expr>>,
    },
}

#[derive(Debug, Error)]
pub enum EvalError {
    #[error("'{type_name}' has no method '{method}'")]
    UnknownMethod { method: String, type_name: &'static str },

    #[error("method '{method}' expects {expected}")]
    MethodArguments { method: String, expected: &'static str },

    #[error("cannot compare {lhs} {op} {rhs}")]
    NotComparable {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("cannot negate {0}")]
    NotNumeric(&'static str),

    #[error("negating {0} overflows")]
    Overflow(i64),
}

impl Expr {
    pub fn evaluate(&self, scope: &Scope<'_>) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Var(name) => Ok(scope.get(name).cloned().unwrap_or_default()),
            Expr::Member(target, key) => Ok(target.evaluate(scope)?.member(key)),
            Expr::Index(target, index) => {
                let target = target.evaluate(scope)?;
                let key = index.evaluate(scope)?;
                Ok(target.member(&key.to_string()))
            }
            Expr::Call { target, method, args } => {
                let target = target.evaluate(scope)?;
                let args = args
                    .iter()
                    .map(|arg| arg.evaluate(scope).map(|v| v.to_string()))
                    .collect::<Result<Vec<_>, _>>()?;
                call_method(&target, method, &args)
            }
            Expr::List(items) => Ok(Value::List(
                items.iter().map(|item| item.evaluate(scope)).collect::<Result<_, _>>()?,
            )),
            Expr::Neg(expr) => match expr.evaluate(scope)? {
                Value::Int(i) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow(i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(EvalError::NotNumeric(other.type_name())),
            },
            Expr::Not(expr) => Ok(Value::Bool(!expr.evaluate(scope)?.is_truthy())),
            Expr::And(lhs, rhs) => {
                let lhs = lhs.evaluate(scope)?;
                if !lhs.is_truthy() {
                    return Ok(lhs);
                }
                rhs.evaluate(scope)
            }
            Expr::Or(lhs, rhs) => {
                let lhs = lhs.evaluate(scope)?;
                if lhs.is_truthy() {
                    return Ok(lhs);
                }
                rhs.evaluate(scope)
            }
            Expr::Compare { op, lhs, rhs } => {
                let lhs = lhs.evaluate(scope)?;
                let rhs = rhs.evaluate(scope)?;
                compare(*op, &lhs, &rhs).map(Value::Bool)
            }
            Expr::Filter { expr, filter, arg } => {
                let value = expr.evaluate(scope)?;
                let arg = match arg {
                    Some(arg) => Some(arg.evaluate(scope)?),
                    None => None,
                };
                Ok(apply_filter(*filter, value, arg))
            }
        }
    }
}

fn call_method(target: &Value, method: &str, args: &[String]) -> Result<Value, EvalError> {
    let Value::Attributes(attrs) = target else {
        return Err(EvalError::UnknownMethod {
            method: method.to_string(),
            type_name: target.type_name(),
        });
    };
    let keys: Vec<&str> = args.iter().map(String::as_str).collect();
    let one_arg = |expected: &'static str| match keys.as_slice() {
        [key] => Ok(*key),
        _ => Err(EvalError::MethodArguments {
            method: method.to_string(),
            expected,
        }),
    };

    match method {
        "only" => Ok(Value::Attributes(attrs.only(&keys))),
        "without" => Ok(Value::Attributes(attrs.without(&keys))),
        "get" => Ok(Value::Str(attrs.get(one_arg("one key")?).to_string())),
        "has" => Ok(Value::Bool(attrs.has(one_arg("one key")?))),
        "default" => match keys.as_slice() {
            [key, value] => Ok(Value::Attributes(attrs.default(key, value))),
            _ => Err(EvalError::MethodArguments {
                method: method.to_string(),
                expected: "a key and a value",
            }),
        },
        _ => Err(EvalError::UnknownMethod {
            method: method.to_string(),
            type_name: target.type_name(),
        }),
    }
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> Result<bool, EvalError> {
    match op {
        CompareOp::Eq => Ok(values_equal(lhs, rhs)),
        CompareOp::Ne => Ok(!values_equal(lhs, rhs)),
        CompareOp::In => Ok(contains(rhs, lhs)),
        _ => {
            let ordering = order(lhs, rhs).ok_or(EvalError::NotComparable {
                op: op.as_str(),
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
            })?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn as_text(value: &Value) -> Option<&str> {
    match value {
        Value::Str(s) | Value::Safe(s) => Some(s),
        _ => None,
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    if let (Some(a), Some(b)) = (as_number(lhs), as_number(rhs)) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (as_text(lhs), as_text(rhs)) {
        return a == b;
    }
    lhs == rhs
}

fn order(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    if let (Some(a), Some(b)) = (as_number(lhs), as_number(rhs)) {
        return a.partial_cmp(&b);
    }
    if let (Some(a), Some(b)) = (as_text(lhs), as_text(rhs)) {
        return Some(a.cmp(b));
    }
    None
}

fn contains(haystack: &Value, needle: &Value) -> bool {
    match haystack {
        Value::List(items) => items.iter().any(|item| values_equal(item, needle)),
        Value::Map(map) => map.contains_key(&needle.to_string()),
        Value::Attributes(attrs) => attrs.has(&needle.to_string()),
        Value::Str(s) | Value::Safe(s) => s.contains(&needle.to_string()),
        _ => false,
    }
}

fn apply_filter(filter: Filter, value: Value, arg: Option<Value>) -> Value {
    match filter {
        Filter::Safe => match value {
            Value::Safe(_) | Value::Attributes(_) => value,
            other => Value::Safe(other.to_string()),
        },
        Filter::Escape => Value::Safe(escape_html(&value.to_string())),
        Filter::Upper => Value::Str(value.to_string().to_uppercase()),
        Filter::Lower => Value::Str(value.to_string().to_lowercase()),
        Filter::Length => Value::Int(value.len().unwrap_or(0) as i64),
        Filter::Default => {
            if value.is_truthy() {
                value
            } else {
                arg.unwrap_or_default()
            }
        }
    }
}

/// Cursor over the tokens of one tag's arguments.
#[derive(Debug, Clone)]
pub struct Arguments {
    template: String,
    position: Position,
    tokens: Vec<ExprToken>,
    pos: usize,
}

impl Arguments {
    pub fn new(template: &str, position: Position, source: &str) -> Result<Self, TemplateError> {
        let tokens = tokenize(source).map_err(|msg| TemplateError::syntax(template, position, msg))?;
        Ok(Self {
            template: template.to_string(),
            position,
            tokens,
            pos: 0,
        })
    }

    /// Total number of tokens, consumed or not
    pub fn count(&self) -> usize {
        self.tokens.len()
    }

    pub fn remaining(&self) -> usize {
        self.tokens.len() - self.pos
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn peek(&self) -> Option<&ExprToken> {
        self.tokens.get(self.pos)
    }

    pub fn match_string(&mut self) -> Option<String> {
        match self.peek() {
            Some(ExprToken::Str(s)) => {
                let s = s.clone();
                self.pos += 1;
                Some(s)
            }
            _ => None,
        }
    }

    /// Consume the identifier `keyword` if it is next
    pub fn match_ident(&mut self, keyword: &str) -> bool {
        match self.peek() {
            Some(ExprToken::Ident(name)) if name == keyword => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    pub fn match_any_ident(&mut self) -> Option<String> {
        match self.peek() {
            Some(ExprToken::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Some(name)
            }
            _ => None,
        }
    }

    pub fn match_symbol(&mut self, symbol: &str) -> bool {
        match self.peek() {
            Some(ExprToken::Symbol(s)) if *s == symbol => {
                self.pos += 1;
                true
            }
            _ => false,
        }
    }

    /// Positional syntax error for the tag owning these arguments
    pub fn error(&self, message: impl Into<String>) -> TemplateError {
        TemplateError::syntax(&self.template, self.position, message)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, TemplateError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.parse_and()?;
        while self.match_ident("or") {
            let rhs = self.parse_and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.parse_not()?;
        while self.match_ident("and") {
            let rhs = self.parse_not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, TemplateError> {
        if self.match_ident("not") {
            return Ok(Expr::Not(Box::new(self.parse_not()?)));
        }
        self.parse_compare()
    }

    fn parse_compare(&mut self) -> Result<Expr, TemplateError> {
        let lhs = self.parse_filtered()?;
        let Some(op) = self.peek().and_then(CompareOp::from_token) else {
            return Ok(lhs);
        };
        self.pos += 1;
        let rhs = self.parse_filtered()?;
        Ok(Expr::Compare {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        })
    }

    fn parse_filtered(&mut self) -> Result<Expr, TemplateError> {
        let mut expr = self.parse_unary()?;
        while self.match_symbol("|") {
            let Some(name) = self.match_any_ident() else {
                return Err(self.error("Filter name must be an identifier."));
            };
            let filter = Filter::from_name(&name)
                .ok_or_else(|| self.error(format!("Filter '{}' does not exist.", name)))?;
            let arg = if self.match_symbol(":") {
                Some(Box::new(self.parse_postfix()?))
            } else {
                None
            };
            expr = Expr::Filter {
                expr: Box::new(expr),
                filter,
                arg,
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, TemplateError> {
        if self.match_symbol("-") {
            return Ok(Expr::Neg(Box::new(self.parse_postfix()?)));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, TemplateError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.match_symbol(".") {
                let key = match self.tokens.get(self.pos).cloned() {
                    Some(ExprToken::Ident(name)) => name,
                    Some(ExprToken::Int(i)) => i.to_string(),
                    _ => return Err(self.error("Expected an identifier after '.'.")),
                };
                self.pos += 1;
                if self.match_symbol("(") {
                    let args = self.parse_list_items(")")?;
                    expr = Expr::Call {
                        target: Box::new(expr),
                        method: key,
                        args,
                    };
                } else {
                    expr = Expr::Member(Box::new(expr), key);
                }
            } else if self.match_symbol("[") {
                let index = self.parse_expression()?;
                if !self.match_symbol("]") {
                    return Err(self.error("Expected ']'."));
                }
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, TemplateError> {
        let Some(token) = self.tokens.get(self.pos).cloned() else {
            return Err(self.error("Unexpected end of expression."));
        };
        self.pos += 1;
        match token {
            ExprToken::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            ExprToken::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            ExprToken::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            ExprToken::Ident(name) => Ok(match name.as_str() {
                "true" | "True" => Expr::Literal(Value::Bool(true)),
                "false" | "False" => Expr::Literal(Value::Bool(false)),
                "none" | "None" | "nil" => Expr::Literal(Value::Null),
                _ => Expr::Var(name),
            }),
            ExprToken::Symbol("(") => {
                let expr = self.parse_expression()?;
                if !self.match_symbol(")") {
                    return Err(self.error("Expected ')'."));
                }
                Ok(expr)
            }
            ExprToken::Symbol("[") => Ok(Expr::List(self.parse_list_items("]")?)),
            ExprToken::Symbol(symbol) => Err(self.error(format!("Unexpected symbol '{}'.", symbol))),
        }
    }

    /// Comma-separated expressions up to the closing `close` symbol
    fn parse_list_items(&mut self, close: &str) -> Result<Vec<Expr>, TemplateError> {
        let mut items = Vec::new();
        if self.match_symbol(close) {
            return Ok(items);
        }
        loop {
            items.push(self.parse_expression()?);
            if self.match_symbol(close) {
                return Ok(items);
            }
            if !self.match_symbol(",") {
                return Err(self.error(format!("Expected ',' or '{}'.", close)));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::Attributes;
    use crate::value::Context;

    fn args(source: &str) -> Arguments {
        Arguments::new("test", Position::default(), source).unwrap()
    }

    fn eval(source: &str, vars: Context) -> Value {
        let expr = args(source).parse_expression().unwrap();
        expr.evaluate(&Scope::new(vars)).unwrap()
    }

    fn vars(pairs: &[(&str, Value)]) -> Context {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize(r#""key"=value 'b' >= 1.5 x.y"#).unwrap(),
            vec![
                ExprToken::Str("key".into()),
                ExprToken::Symbol("="),
                ExprToken::Ident("value".into()),
                ExprToken::Str("b".into()),
                ExprToken::Symbol(">="),
                ExprToken::Float(1.5),
                ExprToken::Ident("x".into()),
                ExprToken::Symbol("."),
                ExprToken::Ident("y".into()),
            ]
        );
        assert!(tokenize("a @ b").is_err());
        assert!(tokenize("\"open").is_err());
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(tokenize(r#""a\"b""#).unwrap(), vec![ExprToken::Str("a\"b".into())]);
    }

    #[test]
    fn test_expression_stops_before_next_pair() {
        let mut a = args(r#""k"="v" "k2"=user.name"#);
        assert_eq!(a.match_string().as_deref(), Some("k"));
        assert!(a.match_symbol("="));
        assert_eq!(a.parse_expression().unwrap(), Expr::Literal(Value::from("v")));
        assert_eq!(a.match_string().as_deref(), Some("k2"));
        assert!(a.match_symbol("="));
        a.parse_expression().unwrap();
        assert_eq!(a.remaining(), 0);
    }

    #[test]
    fn test_undefined_is_null() {
        assert_eq!(eval("missing.deep", Context::new()), Value::Null);
    }

    #[test]
    fn test_logic_and_compare() {
        let v = vars(&[("n", Value::Int(3)), ("s", Value::from("abc"))]);
        assert_eq!(eval("n > 2 and s == 'abc'", v.clone()), Value::Bool(true));
        assert_eq!(eval("not n", v.clone()), Value::Bool(false));
        assert_eq!(eval("n == 3.0", v.clone()), Value::Bool(true));
        assert_eq!(eval("'b' in s", v.clone()), Value::Bool(true));
        assert_eq!(eval("missing or 'fallback'", v), Value::from("fallback"));
    }

    #[test]
    fn test_filters() {
        let v = vars(&[("name", Value::from("<Ann>")), ("items", Value::from(vec![1, 2, 3]))]);
        assert_eq!(eval("name|upper", v.clone()), Value::from("<ANN>"));
        assert_eq!(eval("name|safe", v.clone()), Value::Safe("<Ann>".into()));
        assert_eq!(eval("name|escape", v.clone()), Value::Safe("&lt;Ann&gt;".into()));
        assert_eq!(eval("items|length", v.clone()), Value::Int(3));
        assert_eq!(eval("missing|default:'x'", v), Value::from("x"));
        assert!(args("a|bogus").parse_expression().is_err());
    }

    #[test]
    fn test_attribute_methods() {
        let attrs = Attributes::new([("id", "a"), ("class", "c"), ("title", "t")]);
        let v = vars(&[("attributes", Value::Attributes(attrs))]);
        assert_eq!(
            eval("attributes.only('id', 'title')", v.clone()).to_string(),
            r#"id="a" title="t""#
        );
        assert_eq!(eval("attributes.without('id')", v.clone()).to_string(), r#"class="c" title="t""#);
        assert_eq!(
            eval("attributes.default('class', 'btn')", v.clone()).to_string(),
            r#"id="a" class="btn c" title="t""#
        );
        assert_eq!(eval("attributes.get('title')", v.clone()), Value::from("t"));
        assert_eq!(eval("attributes.has('nope')", v.clone()), Value::Bool(false));
        assert_eq!(eval("attributes.class", v.clone()), Value::from("c"));

        let expr = args("attributes.explode()").parse_expression().unwrap();
        assert!(expr.evaluate(&Scope::new(v)).is_err());
    }

    #[test]
    fn test_list_and_index() {
        let v = vars(&[("i", Value::Int(1))]);
        assert_eq!(eval("[1, 'two'][i]", v.clone()), Value::from("two"));
        assert_eq!(eval("-i", v), Value::Int(-1));
    }

    #[test]
    fn test_ordering_type_error() {
        let expr = args("a < 'x'").parse_expression().unwrap();
        let err = expr
            .evaluate(&Scope::new(vars(&[("a", Value::Int(1))])))
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot compare int < string");
    }

    #[test]
    fn test_negation_overflow() {
        let expr = args("-m").parse_expression().unwrap();
        let scope = Scope::new(vars(&[("m", Value::Int(i64::MIN))]));
        assert!(matches!(expr.evaluate(&scope), Err(EvalError::Overflow(i64::MIN))));

        assert_eq!(eval("-m", vars(&[("m", Value::Int(i64::MAX))])), Value::Int(-i64::MAX));
        assert!(matches!(
            args("-s").parse_expression().unwrap().evaluate(&Scope::new(vars(&[("s", Value::Str("x".into()))]))),
            Err(EvalError::NotNumeric("string"))
        ));
    }
}
