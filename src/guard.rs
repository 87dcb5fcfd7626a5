//! Guards: business-rule predicates checked after a value has been coerced.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{TypeError, TypefigError};
use crate::expr;

/// A native guard predicate.
pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone)]
enum Check {
    Native { name: String, predicate: Predicate },
    Expression(String),
}

/// A predicate on a coerced value plus the message shown when it fails.
#[derive(Clone)]
pub struct Guard {
    message: String,
    check: Check,
}

impl Guard {
    /// A guard backed by a Rust closure.
    pub fn new<F>(message: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            check: Check::Native {
                name: "<closure>".into(),
                predicate: Arc::new(predicate),
            },
        }
    }

    /// A guard backed by a jq program over the coerced value (`.` or `$x`).
    ///
    /// The program is compiled here once so that a broken guard is reported
    /// when the schema loads, not when a value first reaches it.
    pub fn expression(message: impl Into<String>, src: &str) -> Result<Self, String> {
        expr::check_guard(src)?;
        Ok(Self {
            message: message.into(),
            check: Check::Expression(src.to_string()),
        })
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Evaluate the predicate. `Err` only for expression guards that fail to run.
    pub fn check(&self, value: &Value) -> Result<bool, TypeError> {
        match &self.check {
            Check::Native { predicate, .. } => Ok(predicate(value)),
            Check::Expression(src) => expr::evaluate_guard(src, value),
        }
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let check = match &self.check {
            Check::Native { name, .. } => name.as_str(),
            Check::Expression(src) => src.as_str(),
        };
        f.debug_struct("Guard")
            .field("message", &self.message)
            .field("check", &check)
            .finish()
    }
}

/// Named native predicates a schema document can refer to by `callable`.
#[derive(Clone, Default)]
pub struct GuardRegistry {
    predicates: HashMap<String, Predicate>,
}

impl GuardRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, name: &str, predicate: F)
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.predicates.insert(name.to_string(), Arc::new(predicate));
    }

    /// Build the guard for a schema entry: a registered name wins, anything
    /// else is compiled as an expression.
    pub fn resolve(
        &self,
        key: &str,
        message: &str,
        callable: &str,
    ) -> Result<Guard, TypefigError> {
        if let Some(predicate) = self.predicates.get(callable.trim()) {
            return Ok(Guard {
                message: message.to_string(),
                check: Check::Native {
                    name: callable.trim().to_string(),
                    predicate: Arc::clone(predicate),
                },
            });
        }
        Guard::expression(message, callable).map_err(|reason| TypefigError::InvalidGuard {
            key: key.to_string(),
            callable: callable.to_string(),
            reason,
        })
    }
}

impl fmt::Debug for GuardRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.predicates.keys().collect();
        names.sort();
        f.debug_struct("GuardRegistry").field("predicates", &names).finish()
    }
}

/// Run guards in order; the first one that fails is reported and the rest
/// are skipped.
pub fn check_guards(key: &str, value: &Value, guards: &[Guard]) -> Result<(), TypefigError> {
    for guard in guards {
        let passed = guard.check(value).map_err(|source| TypefigError::GuardError {
            key: key.to_string(),
            message: guard.message.clone(),
            source,
        })?;
        if !passed {
            return Err(TypefigError::GuardViolation {
                key: key.to_string(),
                section: None,
                message: guard.message.clone(),
                value: value.clone(),
            });
        }
    }
    Ok(())
}
