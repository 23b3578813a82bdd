//! Parser assembly and token parsing.
//!
//! This module turns registered [`CommandSpec`]s into a two-level clap
//! command tree (top-level flags and positionals for the main command, one
//! nested subcommand per registered spec) and parses console tokens into a
//! [`ParsedInvocation`]. The argument grammar, help rendering, and usage
//! errors all belong to clap; this module only declares the specs and lifts
//! the matches back into typed values.

use std::collections::BTreeMap;

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::spec::{CommandSpec, ParamKind, ParamSpec};

/// Typed arguments for one command scope, keyed by parameter name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArgMap(BTreeMap<String, Value>);

impl ArgMap {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn str(&self, name: &str) -> Result<&str> {
        self.fetch(name)?.as_str().ok_or(Error::TypeMismatch {
            param: name.to_string(),
            expected: "text",
        })
    }

    pub fn int(&self, name: &str) -> Result<i64> {
        self.fetch(name)?.as_i64().ok_or(Error::TypeMismatch {
            param: name.to_string(),
            expected: "an integer",
        })
    }

    pub fn float(&self, name: &str) -> Result<f64> {
        self.fetch(name)?.as_f64().ok_or(Error::TypeMismatch {
            param: name.to_string(),
            expected: "a number",
        })
    }

    pub fn flag(&self, name: &str) -> Result<bool> {
        self.fetch(name)?.as_bool().ok_or(Error::TypeMismatch {
            param: name.to_string(),
            expected: "a bool",
        })
    }

    fn fetch(&self, name: &str) -> Result<&Value> {
        self.0
            .get(name)
            .ok_or_else(|| Error::MissingArgument(name.to_string()))
    }
}

impl FromIterator<(String, Value)> for ArgMap {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        ArgMap(iter.into_iter().collect())
    }
}

/// Result of parsing one console invocation.
///
/// The main scope and the subcommand scope are fully independent: a
/// parameter name appearing in both commands never shares a value.
#[derive(Debug, Clone, Default)]
pub struct ParsedInvocation {
    /// Arguments for the main command (empty when no main is registered).
    pub main: ArgMap,
    /// The selected subcommand and its own argument scope, if any.
    pub subcommand: Option<SelectedCommand>,
}

/// A subcommand selected on the console, resolved against the registered
/// specs during parsing.
#[derive(Debug, Clone)]
pub struct SelectedCommand {
    pub name: String,
    pub args: ArgMap,
    /// Position of the matching spec in the registry's subcommand list.
    pub(crate) index: usize,
}

/// Assemble the two-level clap command tree for a program.
///
/// The top level carries the main command's parameters and description;
/// without a main command it still carries the subcommand selector, with an
/// empty description.
pub(crate) fn command_tree(
    program: &str,
    main: Option<&CommandSpec>,
    subcommands: &[CommandSpec],
) -> Command {
    let mut tree = Command::new(program.to_string())
        .no_binary_name(true)
        .disable_version_flag(true);

    if let Some(main) = main {
        if !main.description.is_empty() {
            tree = tree.about(main.description.clone());
        }
        tree = declare_params(tree, &main.params);
    }

    for sub in subcommands {
        let mut nested = Command::new(sub.name.clone());
        if !sub.description.is_empty() {
            nested = nested.about(sub.description.clone());
        }
        tree = tree.subcommand(declare_params(nested, &sub.params));
    }

    tree
}

/// Declare one command's parameters on a clap command.
///
/// A parameter without a default becomes a required positional (in
/// declaration order); one with a default becomes an optional `--name` flag
/// taking a single explicit value token. Boolean flags therefore require a
/// following token (`--verbose true`), they are not bare switches.
fn declare_params(mut command: Command, params: &[ParamSpec]) -> Command {
    for param in params {
        let mut arg = Arg::new(param.name.clone()).action(ArgAction::Set);

        arg = match param.kind {
            ParamKind::Text => arg.value_parser(value_parser!(String)),
            ParamKind::Integer => arg.value_parser(value_parser!(i64)),
            ParamKind::Float => arg.value_parser(value_parser!(f64)),
            ParamKind::Bool => arg.value_parser(parse_truthy),
        };

        arg = match &param.default {
            Some(default) => arg
                .long(param.name.clone())
                .required(false)
                .default_value(default_token(default)),
            None => arg.required(true),
        };

        command = command.arg(arg);
    }
    command
}

/// Parse console tokens against the registered specs.
///
/// Malformed input surfaces as [`Error::Usage`] carrying clap's own
/// usage-plus-error rendering; the run entry points let it terminate the
/// process, tests inspect it directly.
pub(crate) fn parse(
    program: &str,
    main: Option<&CommandSpec>,
    subcommands: &[CommandSpec],
    tokens: Vec<String>,
) -> Result<ParsedInvocation> {
    let tree = command_tree(program, main, subcommands);
    let matches = tree.try_get_matches_from(tokens)?;

    let main_scope = match main {
        Some(spec) => scope_args(&matches, &spec.params),
        None => ArgMap::default(),
    };

    let subcommand = match matches.subcommand() {
        Some((name, nested)) => {
            // clap only matches names it was handed, so the lookup can
            // fail only if the registry changed between build and parse.
            let index = subcommands
                .iter()
                .position(|s| s.name == name)
                .ok_or_else(|| Error::UnknownSubcommand(name.to_string()))?;
            trace!(subcommand = name, "selected subcommand");
            Some(SelectedCommand {
                name: name.to_string(),
                args: scope_args(nested, &subcommands[index].params),
                index,
            })
        }
        None => None,
    };

    Ok(ParsedInvocation {
        main: main_scope,
        subcommand,
    })
}

/// Lift one scope's matches back into typed values.
fn scope_args(matches: &ArgMatches, params: &[ParamSpec]) -> ArgMap {
    params
        .iter()
        .filter_map(|param| {
            let value = match param.kind {
                ParamKind::Text => matches
                    .get_one::<String>(&param.name)
                    .map(|s| Value::from(s.clone())),
                ParamKind::Integer => matches.get_one::<i64>(&param.name).map(|n| Value::from(*n)),
                ParamKind::Float => matches.get_one::<f64>(&param.name).map(|n| Value::from(*n)),
                ParamKind::Bool => matches.get_one::<bool>(&param.name).map(|b| Value::from(*b)),
            };
            value.map(|v| (param.name.clone(), v))
        })
        .collect()
}

/// Coerce a console token into a boolean.
///
/// Accepts `true`/`false` in any letter case, plus the conventional
/// `yes`/`no`, `1`/`0`, and `on`/`off` spellings. Anything else is a usage
/// error surfaced through clap.
fn parse_truthy(token: &str) -> std::result::Result<bool, String> {
    match token.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Ok(true),
        "false" | "no" | "0" | "off" => Ok(false),
        other => Err(format!("expected a boolean, got: {}", other)),
    }
}

/// Render a default value as the token clap feeds back through the
/// parameter's own value parser when the flag is absent.
fn default_token(default: &Value) -> String {
    match default {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn add_spec() -> CommandSpec {
        CommandSpec::new("add")
            .description("Add two numbers")
            .required("lhs", ParamKind::Integer)
            .required("rhs", ParamKind::Integer)
    }

    fn sub_spec() -> CommandSpec {
        CommandSpec::new("sub")
            .description("Subtract rhs from lhs")
            .required("lhs", ParamKind::Integer)
            .optional("rhs", ParamKind::Integer, 0)
    }

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn usage_kind(result: Result<ParsedInvocation>) -> ErrorKind {
        match result {
            Err(Error::Usage(err)) => err.kind(),
            other => panic!("expected usage error, got {:?}", other),
        }
    }

    #[test]
    fn positionals_bind_in_declaration_order() {
        let subs = [add_spec()];
        let parsed = parse("calc", None, &subs, tokens(&["add", "3", "4"])).unwrap();
        let selected = parsed.subcommand.unwrap();
        assert_eq!(selected.name, "add");
        assert_eq!(selected.index, 0);
        assert_eq!(selected.args.int("lhs").unwrap(), 3);
        assert_eq!(selected.args.int("rhs").unwrap(), 4);
    }

    #[test]
    fn omitted_flag_yields_declared_default() {
        let subs = [sub_spec()];
        let parsed = parse("calc", None, &subs, tokens(&["sub", "5"])).unwrap();
        let args = parsed.subcommand.unwrap().args;
        assert_eq!(args.int("lhs").unwrap(), 5);
        assert_eq!(args.int("rhs").unwrap(), 0);
    }

    #[test]
    fn supplied_flag_overrides_default() {
        let subs = [sub_spec()];
        let parsed = parse("calc", None, &subs, tokens(&["sub", "5", "--rhs", "2"])).unwrap();
        let args = parsed.subcommand.unwrap().args;
        assert_eq!(args.int("rhs").unwrap(), 2);
    }

    #[test]
    fn boolean_tokens_coerce_case_insensitively() {
        for token in ["True", "true", "TRUE", "yes", "on", "1"] {
            assert_eq!(parse_truthy(token), Ok(true), "token {token}");
        }
        for token in ["False", "false", "FALSE", "no", "off", "0"] {
            assert_eq!(parse_truthy(token), Ok(false), "token {token}");
        }
        assert!(parse_truthy("maybe").is_err());
    }

    #[test]
    fn malformed_boolean_is_a_usage_error() {
        let main = CommandSpec::new("tool").optional("verbose", ParamKind::Bool, false);
        let result = parse("tool", Some(&main), &[], tokens(&["--verbose", "maybe"]));
        assert_eq!(usage_kind(result), ErrorKind::ValueValidation);
    }

    #[test]
    fn boolean_flag_defaults_without_token() {
        let main = CommandSpec::new("tool").optional("verbose", ParamKind::Bool, false);
        let parsed = parse("tool", Some(&main), &[], tokens(&[])).unwrap();
        assert!(!parsed.main.flag("verbose").unwrap());

        let parsed = parse("tool", Some(&main), &[], tokens(&["--verbose", "TRUE"])).unwrap();
        assert!(parsed.main.flag("verbose").unwrap());
    }

    #[test]
    fn missing_required_positional_is_a_usage_error() {
        let subs = [add_spec()];
        let result = parse("calc", None, &subs, tokens(&["add"]));
        assert_eq!(usage_kind(result), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn non_numeric_token_for_integer_is_a_usage_error() {
        let subs = [add_spec()];
        let result = parse("calc", None, &subs, tokens(&["add", "three", "4"]));
        assert_eq!(usage_kind(result), ErrorKind::ValueValidation);
    }

    #[test]
    fn unknown_subcommand_is_the_engine_error() {
        let result = parse("calc", None, &[], tokens(&["add", "3", "4"]));
        assert!(matches!(result, Err(Error::Usage(_))));
    }

    #[test]
    fn shared_parameter_names_stay_scoped() {
        let main = CommandSpec::new("tool").optional("count", ParamKind::Integer, 1);
        let subs = [CommandSpec::new("emit").optional("count", ParamKind::Integer, 9)];
        let parsed = parse(
            "tool",
            Some(&main),
            &subs,
            tokens(&["emit", "--count", "3"]),
        )
        .unwrap();
        assert_eq!(parsed.main.int("count").unwrap(), 1);
        let args = parsed.subcommand.unwrap().args;
        assert_eq!(args.int("count").unwrap(), 3);
    }

    #[test]
    fn float_and_text_coercion() {
        let main = CommandSpec::new("tool")
            .required("label", ParamKind::Text)
            .optional("scale", ParamKind::Float, 1.5);
        let parsed = parse("tool", Some(&main), &[], tokens(&["run"])).unwrap();
        assert_eq!(parsed.main.str("label").unwrap(), "run");
        assert_eq!(parsed.main.float("scale").unwrap(), 1.5);
    }

    #[test]
    fn argmap_reports_missing_and_mistyped_lookups() {
        let args: ArgMap = [("n".to_string(), Value::from(3))].into_iter().collect();
        assert!(matches!(args.int("n"), Ok(3)));
        assert!(matches!(args.str("n"), Err(Error::TypeMismatch { .. })));
        assert!(matches!(args.int("m"), Err(Error::MissingArgument(_))));
    }
}
