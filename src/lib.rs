//! Declarative command binding and dispatch for command-line programs.
//!
//! Commands are described once with [`CommandSpec`]'s chained builder (name,
//! description, ordered typed parameters, handler closure) and registered on
//! a [`ProgramRegistry`]. The registry derives a console argument parser
//! from the specs, parses the process's tokens, invokes the main command
//! first and then the selected subcommand, and streams whatever they produce
//! to the console one line at a time.
//!
//! The argument grammar, help rendering, and the exit-status-2 usage-error
//! UX are delegated to clap; this crate owns the spec model, type coercion
//! rules, dispatch ordering, and incremental output.

mod dispatch;
mod error;
mod parser;
mod registry;
mod spec;
mod streaming;

pub use error::{Error, Result};
pub use parser::{ArgMap, ParsedInvocation, SelectedCommand};
pub use registry::ProgramRegistry;
pub use spec::{CommandSpec, Handler, ParamKind, ParamSpec};
pub use streaming::{Output, StreamWriter};

/// Re-export of the typed-value currency used in argument maps, defaults,
/// and the shared context.
pub use serde_json::Value;

/// Prelude module for commonly used types
pub mod prelude {
    pub use crate::{
        ArgMap, CommandSpec, Error, Output, ParamKind, ProgramRegistry, Result, Value,
    };
}
