//! Error types for the argbind crate.

use thiserror::Error;
use std::io;

use crate::spec::ParamKind;

#[derive(Error, Debug)]
pub enum Error {
    /// A main command was registered twice on the same registry.
    #[error("a main command is already registered")]
    DuplicateMain,

    /// Two subcommands were registered under the same name.
    #[error("duplicate subcommand: {0}")]
    DuplicateSubcommand(String),

    /// A command declared the same parameter name twice.
    #[error("duplicate parameter `{param}` on command `{command}`")]
    DuplicateParam { command: String, param: String },

    /// A default value does not match the parameter's declared kind.
    #[error("default for `{param}` on command `{command}` does not match its declared {kind} type")]
    DefaultTypeMismatch {
        command: String,
        param: String,
        kind: ParamKind,
    },

    /// A command was registered without a handler.
    #[error("command `{0}` has no handler")]
    MissingHandler(String),

    /// A command or parameter name the argument engine cannot accept.
    #[error("invalid name: `{0}`")]
    InvalidName(String),

    /// A handler asked for an argument its command never declared.
    #[error("missing argument: {0}")]
    MissingArgument(String),

    /// A handler asked for an argument under the wrong type.
    #[error("argument `{param}` is not {expected}")]
    TypeMismatch {
        param: String,
        expected: &'static str,
    },

    /// A selected subcommand has no registered spec.
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    /// Malformed console input, as reported by the argument engine. The run
    /// entry points turn this into the engine's usage message and a non-zero
    /// process exit.
    #[error(transparent)]
    Usage(#[from] clap::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failure raised by a command handler's own body, passed through
    /// unchanged.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
