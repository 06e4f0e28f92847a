//! Command handlers.

mod upload;

use miette::Result;

use crate::cli::Cli;

/// Route a parsed CLI invocation to its handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    upload::exec(cli)
}
