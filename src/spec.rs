//! Command and parameter specifications.
//!
//! A [`CommandSpec`] is the declarative description of one console command:
//! its name, help description, ordered typed parameters, and the handler
//! closure invoked when the command is selected. Specs are assembled with a
//! chained builder at startup and are immutable once registered.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::parser::ArgMap;
use crate::streaming::Output;

/// The closed set of parameter types a command may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Free-form text, passed through as-is.
    Text,
    /// Whole number, coerced with the engine's native integer parsing.
    Integer,
    /// Floating-point number, coerced with the engine's native float parsing.
    Float,
    /// Boolean, coerced from a truthy/falsy token (`true`/`false` in any
    /// letter case, plus `yes`/`no`, `1`/`0`, `on`/`off`).
    Bool,
}

impl ParamKind {
    /// Whether `value` is a valid instance of this kind. Used to vet
    /// declared defaults at registration time.
    pub(crate) fn admits(&self, value: &Value) -> bool {
        match self {
            ParamKind::Text => value.is_string(),
            ParamKind::Integer => value.is_i64(),
            // An integer default on a float parameter is fine.
            ParamKind::Float => value.is_number(),
            ParamKind::Bool => value.is_boolean(),
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamKind::Text => "text",
            ParamKind::Integer => "integer",
            ParamKind::Float => "float",
            ParamKind::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// One formal parameter of a command.
///
/// A parameter without a default is a required positional argument; one with
/// a default is an optional `--name` flag whose absence yields the default.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Handler closure invoked when a command is dispatched.
///
/// Receives the command's own argument scope and the shared context value
/// threaded from the main command into the subcommand. Handlers are not
/// required to be `Send`/`Sync`: dispatch is strictly sequential within a
/// single process invocation.
pub type Handler = Box<dyn Fn(&ArgMap, &mut Value) -> Result<Output>>;

/// Declarative description of one registrable command.
pub struct CommandSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    handler: Option<Handler>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
            handler: None,
        }
    }

    /// Help description shown by the engine at this command's level.
    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Declare a required positional parameter. Declaration order is
    /// positional order.
    pub fn required(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            default: None,
        });
        self
    }

    /// Declare an optional `--name` flag with a default used when the flag
    /// is absent from the console input.
    pub fn optional(
        mut self,
        name: impl Into<String>,
        kind: ParamKind,
        default: impl Into<Value>,
    ) -> Self {
        self.params.push(ParamSpec {
            name: name.into(),
            kind,
            default: Some(default.into()),
        });
        self
    }

    /// Attach the handler invoked when this command is dispatched.
    pub fn handler(
        mut self,
        handler: impl Fn(&ArgMap, &mut Value) -> Result<Output> + 'static,
    ) -> Self {
        self.handler = Some(Box::new(handler));
        self
    }

    /// Check the spec for programmer errors. Called by the registry before
    /// the spec is accepted; a failure here means the program must not start.
    pub(crate) fn validate(&self) -> Result<()> {
        valid_name(&self.name)?;
        for (idx, param) in self.params.iter().enumerate() {
            valid_name(&param.name)?;
            if self.params[..idx].iter().any(|p| p.name == param.name) {
                return Err(Error::DuplicateParam {
                    command: self.name.clone(),
                    param: param.name.clone(),
                });
            }
            if let Some(default) = &param.default {
                if !param.kind.admits(default) {
                    return Err(Error::DefaultTypeMismatch {
                        command: self.name.clone(),
                        param: param.name.clone(),
                        kind: param.kind,
                    });
                }
            }
        }
        if self.handler.is_none() {
            return Err(Error::MissingHandler(self.name.clone()));
        }
        Ok(())
    }

    pub(crate) fn invoke(&self, args: &ArgMap, context: &mut Value) -> Result<Output> {
        match &self.handler {
            Some(handler) => handler(args, context),
            None => Err(Error::MissingHandler(self.name.clone())),
        }
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

fn valid_name(name: &str) -> Result<()> {
    if name.is_empty() || name.starts_with('-') || name.contains(char::is_whitespace) {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}
