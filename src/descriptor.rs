//! Type descriptors: composable values that coerce (`parse`) and check
//! (`matches`) raw configuration values.
//!
//! A descriptor is a closed sum type. Composites own their children, so
//! `Optional[List[Int]]` is an `Optional` holding a boxed `List` holding an
//! `Int`. Nothing ever mutates a descriptor after construction.
//!
//! `parse` is the single source of truth. `matches` is defined as "parse
//! would succeed", with the one exception of the expression types, which
//! always match because they cannot be checked ahead of evaluation.

use std::fmt;
use std::str::FromStr;

use serde_json::{Number, Value};

use crate::error::{TypeError, TypefigError};
use crate::expr;

/// Describes how a raw value is validated and coerced into a typed value.
///
/// Two descriptors are interchangeable iff their canonical names are equal,
/// which for this structural type is the same as `==`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Int,
    Float,
    String,
    Bool,
    /// `None`, or the literal string `"None"`, or a value of the inner type.
    Optional(Box<TypeDesc>),
    /// A sequence, or a permissive comma-separated list literal.
    List(Box<TypeDesc>),
    /// Left-biased choice between two alternatives.
    Union(Box<TypeDesc>, Box<TypeDesc>),
    /// A jq expression evaluated at parse time. With `env`, `$env` is bound
    /// to the process environment.
    Expression { env: bool },
}

impl TypeDesc {
    pub fn optional(inner: TypeDesc) -> Self {
        TypeDesc::Optional(Box::new(inner))
    }

    pub fn list(inner: TypeDesc) -> Self {
        TypeDesc::List(Box::new(inner))
    }

    pub fn union(first: TypeDesc, second: TypeDesc) -> Self {
        TypeDesc::Union(Box::new(first), Box::new(second))
    }

    pub fn expression() -> Self {
        TypeDesc::Expression { env: false }
    }

    pub fn env_expression() -> Self {
        TypeDesc::Expression { env: true }
    }

    /// Canonical name, e.g. `Optional[List[Union[Int,Bool]]]`.
    ///
    /// Feeding it back through [`string_to_type`](crate::string_to_type)
    /// yields an equal descriptor.
    pub fn name(&self) -> String {
        self.to_string()
    }

    /// True iff [`parse`](Self::parse) would succeed. Never fails.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            TypeDesc::Expression { .. } => true,
            _ => self.parse(value).is_ok(),
        }
    }

    /// Coerce `value` into this type.
    pub fn parse(&self, value: &Value) -> Result<Value, TypeError> {
        match self {
            TypeDesc::Int => parse_int(value),
            TypeDesc::Float => parse_float(value),
            TypeDesc::String => Ok(Value::String(render(value))),
            TypeDesc::Bool => parse_bool(value),
            TypeDesc::Optional(inner) => match value {
                Value::Null => Ok(Value::Null),
                Value::String(s) if s == "None" => Ok(Value::Null),
                other => inner.parse(other),
            },
            TypeDesc::List(inner) => self.parse_list(inner, value),
            TypeDesc::Union(first, second) => self.parse_union(first, second, value),
            TypeDesc::Expression { env } => match value {
                Value::String(src) => expr::evaluate_expression(src, *env),
                other => Ok(other.clone()),
            },
        }
    }

    fn parse_list(&self, inner: &TypeDesc, value: &Value) -> Result<Value, TypeError> {
        let parsed = match value {
            Value::Array(items) => items
                .iter()
                .map(|item| inner.parse(item))
                .collect::<Result<Vec<_>, _>>()?,
            Value::String(text) => {
                let tokens = tokenize_list(text);
                if tokens.is_empty() {
                    return Err(TypeError::Malformed {
                        type_name: self.name(),
                        input: text.clone(),
                        reason: "no list elements found".into(),
                    });
                }
                tokens
                    .into_iter()
                    .map(|token| inner.parse(&Value::String(token.to_string())))
                    .collect::<Result<Vec<_>, _>>()?
            }
            other => {
                return Err(TypeError::conversion(
                    self.name(),
                    other,
                    "expected a sequence or a list literal",
                ));
            }
        };
        Ok(Value::Array(parsed))
    }

    fn parse_union(
        &self,
        first: &TypeDesc,
        second: &TypeDesc,
        value: &Value,
    ) -> Result<Value, TypeError> {
        match first.parse(value) {
            Ok(parsed) => return Ok(parsed),
            Err(e) if !e.is_conversion() => return Err(e),
            Err(_) => {}
        }
        match second.parse(value) {
            Ok(parsed) => Ok(parsed),
            Err(e) if !e.is_conversion() => Err(e),
            Err(_) => Err(TypeError::conversion(
                self.name(),
                value,
                "no alternative of the union accepts it",
            )),
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Int => write!(f, "Int"),
            TypeDesc::Float => write!(f, "Float"),
            TypeDesc::String => write!(f, "String"),
            TypeDesc::Bool => write!(f, "Bool"),
            TypeDesc::Optional(inner) => write!(f, "Optional[{inner}]"),
            TypeDesc::List(inner) => write!(f, "List[{inner}]"),
            TypeDesc::Union(first, second) => write!(f, "Union[{first},{second}]"),
            TypeDesc::Expression { env: true } => write!(f, "EnvExpression"),
            TypeDesc::Expression { env: false } => write!(f, "Expression"),
        }
    }
}

impl FromStr for TypeDesc {
    type Err = TypefigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::grammar::string_to_type(s)
    }
}

fn parse_int(value: &Value) -> Result<Value, TypeError> {
    let int = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if n.is_u64() {
                return Err(TypeError::conversion("Int", value, "out of range"));
            } else {
                float_to_int(n.as_f64().unwrap_or(f64::NAN))
                    .ok_or_else(|| TypeError::conversion("Int", value, "out of range"))?
            }
        }
        Value::Bool(b) => i64::from(*b),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| TypeError::conversion("Int", value, e.to_string()))?,
        other => return Err(TypeError::conversion("Int", other, "not a number")),
    };
    Ok(Value::from(int))
}

/// Truncate toward zero; `None` for NaN, infinities, and out-of-range values.
fn float_to_int(f: f64) -> Option<i64> {
    let truncated = f.trunc();
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(truncated as i64)
    } else {
        None
    }
}

fn parse_float(value: &Value) -> Result<Value, TypeError> {
    let float = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| TypeError::conversion("Float", value, "not representable"))?,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|e| TypeError::conversion("Float", value, e.to_string()))?,
        other => return Err(TypeError::conversion("Float", other, "not a number")),
    };
    Number::from_f64(float)
        .map(Value::Number)
        .ok_or_else(|| TypeError::conversion("Float", value, "NaN and infinities are not supported"))
}

fn parse_bool(value: &Value) -> Result<Value, TypeError> {
    match value {
        Value::Bool(b) => Ok(Value::Bool(*b)),
        Value::String(s) => match s.as_str() {
            "true" | "True" => Ok(Value::Bool(true)),
            "false" | "False" => Ok(Value::Bool(false)),
            _ => Err(TypeError::conversion(
                "Bool",
                value,
                "expected one of true, True, false, False",
            )),
        },
        other => Err(TypeError::conversion("Bool", other, "not a boolean")),
    }
}

/// Text form used by the `String` type. Strings are taken verbatim, null
/// renders as `None`, everything else as JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Split a permissive list literal: `[1, 2, 3]`, `(a,b)`, `1,2,3`.
fn tokenize_list(text: &str) -> Vec<&str> {
    text.split(',')
        .map(|token| {
            token
                .trim()
                .trim_matches(|c| matches!(c, '[' | ']' | '(' | ')'))
                .trim()
        })
        .filter(|token| !token.is_empty())
        .collect()
}
