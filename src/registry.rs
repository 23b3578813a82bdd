//! Program-level command registry and run entry points.

use std::io::{self, Write};

use tracing::debug;

use crate::dispatch;
use crate::error::{Error, Result};
use crate::parser;
use crate::spec::CommandSpec;

/// Registry of one program's commands: at most one main command plus any
/// number of uniquely named subcommands.
///
/// Populated during startup, consumed exactly once by one of the run entry
/// points, never mutated afterward.
pub struct ProgramRegistry {
    program: String,
    main: Option<CommandSpec>,
    subcommands: Vec<CommandSpec>,
}

impl ProgramRegistry {
    /// Create an empty registry. `program` names the top-level command in
    /// usage and help output.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            main: None,
            subcommands: Vec::new(),
        }
    }

    /// Register the always-invoked main command.
    ///
    /// Fails if the spec is malformed or a main command is already
    /// registered; both are programmer errors that must stop startup.
    pub fn register_main(&mut self, spec: CommandSpec) -> Result<()> {
        spec.validate()?;
        if self.main.is_some() {
            return Err(Error::DuplicateMain);
        }
        debug!(command = %spec.name, "registered main command");
        self.main = Some(spec);
        Ok(())
    }

    /// Register a subcommand under its own name.
    ///
    /// Fails if the spec is malformed or the name collides with an existing
    /// subcommand.
    pub fn register_subcommand(&mut self, spec: CommandSpec) -> Result<()> {
        spec.validate()?;
        if self.subcommands.iter().any(|s| s.name == spec.name) {
            return Err(Error::DuplicateSubcommand(spec.name));
        }
        debug!(command = %spec.name, "registered subcommand");
        self.subcommands.push(spec);
        Ok(())
    }

    /// Parse the process's own console arguments, dispatch, and stream
    /// output to stdout. See [`ProgramRegistry::run_from`].
    pub fn run(self) -> Result<()> {
        self.run_from(std::env::args().skip(1))
    }

    /// Parse the supplied tokens, dispatch, and stream output to stdout.
    ///
    /// On malformed input the argument engine prints its usage-plus-error
    /// message and terminates the process with its own exit status (2 for
    /// usage errors, 0 for `--help`). Handler failures propagate unchanged.
    pub fn run_from<I, T>(self, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let mut stdout = io::stdout();
        match self.dispatch_to(tokens, &mut stdout) {
            Err(Error::Usage(err)) => err.exit(),
            other => other,
        }
    }

    /// Like [`ProgramRegistry::run_from`], but usage errors are returned
    /// instead of terminating the process, and output goes to `writer`.
    pub fn try_run_from<I, T, W>(self, tokens: I, writer: &mut W) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        W: Write,
    {
        self.dispatch_to(tokens, writer)
    }

    fn dispatch_to<I, T, W>(self, tokens: I, writer: &mut W) -> Result<()>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
        W: Write,
    {
        let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
        let invocation = parser::parse(
            &self.program,
            self.main.as_ref(),
            &self.subcommands,
            tokens,
        )?;
        dispatch::dispatch(self.main.as_ref(), &self.subcommands, invocation, writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::ParamKind;
    use crate::streaming::Output;

    fn spec(name: &str) -> CommandSpec {
        CommandSpec::new(name)
            .required("lhs", ParamKind::Integer)
            .handler(|_, _| Ok(Output::None))
    }

    #[test]
    fn second_main_registration_fails() {
        let mut registry = ProgramRegistry::new("calc");
        registry.register_main(spec("calc")).unwrap();
        assert!(matches!(
            registry.register_main(spec("calc")),
            Err(Error::DuplicateMain)
        ));
    }

    #[test]
    fn colliding_subcommand_name_fails() {
        let mut registry = ProgramRegistry::new("calc");
        registry.register_subcommand(spec("add")).unwrap();
        assert!(matches!(
            registry.register_subcommand(spec("add")),
            Err(Error::DuplicateSubcommand(name)) if name == "add"
        ));
    }

    #[test]
    fn malformed_spec_is_rejected_at_registration() {
        let mut registry = ProgramRegistry::new("calc");
        let no_handler = CommandSpec::new("add").required("lhs", ParamKind::Integer);
        assert!(matches!(
            registry.register_subcommand(no_handler),
            Err(Error::MissingHandler(_))
        ));
    }

    #[test]
    fn empty_registry_runs_as_a_no_op() {
        let registry = ProgramRegistry::new("calc");
        let mut sink = Vec::new();
        registry
            .try_run_from(Vec::<String>::new(), &mut sink)
            .unwrap();
        assert!(sink.is_empty());
    }
}
