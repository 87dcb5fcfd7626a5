//! jq-language evaluation behind the expression types and textual guards.
//!
//! Programs are compiled against jaq's standard library. Expression types
//! run with `null` input (or, for `EnvExpression`, with `$env` bound to the
//! process environment). Guards run with the coerced value as `.` and `$x`.
//!
//! Without the `expr` feature every evaluation fails with an expression
//! error, so schemas that rely on it are rejected at load time.

use serde_json::Value;

use crate::error::TypeError;

/// Evaluate the string of an `Expression`/`EnvExpression` value.
/// Only the first output is computed; later outputs are never evaluated.
pub fn evaluate_expression(src: &str, with_env: bool) -> Result<Value, TypeError> {
    let output = if with_env {
        first_output(&format!(". as $env | ({src}\n)"), env_object())
    } else {
        first_output(src, Value::Null)
    }
    .map_err(|reason| TypeError::Expression {
        expr: src.to_string(),
        reason,
    })?;

    output.ok_or_else(|| TypeError::Expression {
        expr: src.to_string(),
        reason: "produced no value".into(),
    })
}

/// Check that a guard program compiles, without running it.
pub fn check_guard(src: &str) -> Result<(), String> {
    compile_only(&guard_program(src))
}

/// Run a guard program against a coerced value. The first output decides:
/// anything but `false` and `null` passes.
pub fn evaluate_guard(src: &str, value: &Value) -> Result<bool, TypeError> {
    let output = first_output(&guard_program(src), value.clone()).map_err(|reason| {
        TypeError::Expression {
            expr: src.to_string(),
            reason,
        }
    })?;
    Ok(matches!(
        output,
        Some(v) if !matches!(v, Value::Null | Value::Bool(false))
    ))
}

// The closing paren goes on its own line so a trailing `# comment` in
// `src` cannot swallow it.
fn guard_program(src: &str) -> String {
    format!(". as $x | ({src}\n)")
}

/// Process environment as a JSON object of strings. Non-UTF-8 entries are
/// left out.
pub fn env_object() -> Value {
    Value::Object(
        std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, Value::String(v.into_string().ok()?))))
            .collect(),
    )
}

#[cfg(feature = "expr")]
mod backend {
    use jaq_core::{Compiler, Ctx, RcIter, compile::Undefined, load};
    use jaq_json::Val;
    use serde_json::Value;

    /// Compile and run `filter_src`, pulling at most one output.
    pub fn first_output(filter_src: &str, input: Value) -> Result<Option<Value>, String> {
        let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
        let arena = load::Arena::default();
        let program = load::File {
            code: filter_src,
            path: (),
        };

        let modules = loader
            .load(&arena, program)
            .map_err(format_parse_errors)?;

        let filter = Compiler::default()
            .with_funs(jaq_std::funs().chain(jaq_json::funs()))
            .compile(modules)
            .map_err(format_undefined_errors)?;

        let inputs = RcIter::new(core::iter::empty());
        let mut it = filter.run((Ctx::new([], &inputs), Val::from(input)));

        match it.next() {
            Some(item) => {
                let v = item.map_err(|e| format!("{e:?}"))?;
                // Val displays as JSON text.
                serde_json::from_str(&v.to_string())
                    .map(Some)
                    .map_err(|e| e.to_string())
            }
            None => Ok(None),
        }
    }

    pub fn compile_only(filter_src: &str) -> Result<(), String> {
        let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
        let arena = load::Arena::default();
        let program = load::File {
            code: filter_src,
            path: (),
        };
        let modules = loader
            .load(&arena, program)
            .map_err(format_parse_errors)?;
        Compiler::default()
            .with_funs(jaq_std::funs().chain(jaq_json::funs()))
            .compile(modules)
            .map_err(format_undefined_errors)?;
        Ok(())
    }

    fn format_parse_errors(errs: Vec<(load::File<&str, ()>, load::Error<&str>)>) -> String {
        let mut s = String::new();
        for (file, err) in errs {
            s.push_str(&format!("parse error: {err:?} in `{}`\n", file.code));
        }
        s.trim_end().to_string()
    }

    fn format_undefined_errors(
        errs: Vec<(load::File<&str, ()>, Vec<(&str, Undefined)>)>,
    ) -> String {
        let mut s = String::new();
        for (file, list) in errs {
            for (name, undef) in list {
                s.push_str(&format!("undefined `{name}`: {undef:?} in `{}`\n", file.code));
            }
        }
        s.trim_end().to_string()
    }
}

#[cfg(feature = "expr")]
use backend::{compile_only, first_output};

#[cfg(not(feature = "expr"))]
fn first_output(_filter_src: &str, _input: Value) -> Result<Option<Value>, String> {
    Err("expression support is disabled (build with the `expr` feature)".into())
}

#[cfg(not(feature = "expr"))]
fn compile_only(_filter_src: &str) -> Result<(), String> {
    Err("expression support is disabled (build with the `expr` feature)".into())
}
