//! Dispatch of a parsed invocation to its handlers.
//!
//! Ordering contract: the main handler (when registered) always runs first
//! and its output is fully streamed before the selected subcommand handler
//! starts. The shared context value is created per invocation, handed to the
//! main handler first, then to the subcommand handler.

use std::io::Write;

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::parser::ParsedInvocation;
use crate::spec::CommandSpec;
use crate::streaming::StreamWriter;

pub(crate) fn dispatch<W: Write>(
    main: Option<&CommandSpec>,
    subcommands: &[CommandSpec],
    invocation: ParsedInvocation,
    writer: &mut W,
) -> Result<()> {
    let mut out = StreamWriter::new(writer);
    let mut context = Value::Null;

    if let Some(main) = main {
        debug!(command = %main.name, "invoking main command");
        let produced = main.invoke(&invocation.main, &mut context)?;
        // Drained completely before the subcommand runs.
        out.emit(produced)?;
    }

    if let Some(selected) = invocation.subcommand {
        // Resolved against the same spec list during parsing.
        let spec = &subcommands[selected.index];
        debug!(command = %spec.name, "invoking subcommand");
        let produced = spec.invoke(&selected.args, &mut context)?;
        out.emit(produced)?;
    }

    Ok(())
}
