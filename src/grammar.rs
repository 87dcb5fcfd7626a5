//! Type-name grammar: turns `Optional[List[Union[Int,Bool]]]` back into a
//! [`TypeDesc`].
//!
//! Resolution walks an ordered rule table. Each rule either builds a
//! descriptor, declines (`Ok(None)`) so the next rule gets a chance, or fails
//! when it recognised its own syntax but an inner name did not resolve.
//! Malformed brackets make a rule decline rather than fail.
//!
//! ```text
//! 1. Int | Float | String | Bool    (prefix match, in that order)
//! 2. Optional[<type>]
//! 3. List[<type>]
//! 4. Union[<type>,<type>]
//! 5. EnvExpression
//! 6. Expression
//! ```

use crate::descriptor::TypeDesc;
use crate::error::TypefigError;

type Rule = fn(&str) -> Result<Option<TypeDesc>, TypefigError>;

const RULES: &[Rule] = &[
    string_to_scalar,
    string_to_optional,
    string_to_list,
    string_to_union,
    string_to_env_expression,
    string_to_expression,
];

fn scalars() -> [(&'static str, TypeDesc); 4] {
    [
        ("Int", TypeDesc::Int),
        ("Float", TypeDesc::Float),
        ("String", TypeDesc::String),
        ("Bool", TypeDesc::Bool),
    ]
}

/// Resolve a type name into a descriptor.
///
/// Fails with [`TypefigError::UnknownType`] when no rule matches, naming the
/// innermost string that could not be resolved.
pub fn string_to_type(name: &str) -> Result<TypeDesc, TypefigError> {
    let name = name.trim();
    for rule in RULES {
        if let Some(ty) = rule(name)? {
            return Ok(ty);
        }
    }
    Err(TypefigError::UnknownType(name.to_string()))
}

pub fn string_to_scalar(name: &str) -> Result<Option<TypeDesc>, TypefigError> {
    Ok(scalars()
        .into_iter()
        .find(|(prefix, _)| name.starts_with(*prefix))
        .map(|(_, ty)| ty))
}

pub fn string_to_optional(name: &str) -> Result<Option<TypeDesc>, TypefigError> {
    match bracketed(name, "Optional") {
        Some(inner) => Ok(Some(TypeDesc::optional(string_to_type(inner)?))),
        None => Ok(None),
    }
}

pub fn string_to_list(name: &str) -> Result<Option<TypeDesc>, TypefigError> {
    match bracketed(name, "List") {
        Some(inner) => Ok(Some(TypeDesc::list(string_to_type(inner)?))),
        None => Ok(None),
    }
}

pub fn string_to_union(name: &str) -> Result<Option<TypeDesc>, TypefigError> {
    let Some(inner) = bracketed(name, "Union") else {
        return Ok(None);
    };
    let Some((first, second)) = split_pair(inner) else {
        return Ok(None);
    };
    Ok(Some(TypeDesc::union(
        string_to_type(first)?,
        string_to_type(second)?,
    )))
}

pub fn string_to_env_expression(name: &str) -> Result<Option<TypeDesc>, TypefigError> {
    Ok((name == "EnvExpression").then(TypeDesc::env_expression))
}

pub fn string_to_expression(name: &str) -> Result<Option<TypeDesc>, TypefigError> {
    Ok((name == "Expression").then(TypeDesc::expression))
}

/// Strip `Ctor[` ... `]` and return the inside, or `None` unless the whole
/// string is one well-nested bracket group.
fn bracketed<'a>(name: &'a str, ctor: &str) -> Option<&'a str> {
    let inner = name
        .strip_prefix(ctor)?
        .trim_start()
        .strip_prefix('[')?
        .strip_suffix(']')?;
    let mut depth = 0usize;
    for c in inner.chars() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.checked_sub(1)?,
            _ => {}
        }
    }
    (depth == 0).then_some(inner)
}

/// Split at the single comma that sits outside any brackets.
fn split_pair(inner: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    let mut split = None;
    for (i, c) in inner.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                if split.is_some() {
                    return None;
                }
                split = Some(i);
            }
            _ => {}
        }
    }
    let i = split?;
    Some((inner[..i].trim(), inner[i + 1..].trim()))
}
