//! Command dispatch: bridges CLI args -> core operations -> output formatting.

pub mod components;
pub mod config_cmd;
pub mod dashboards;
pub mod extensions;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::context::Context;
use crate::error::CliError;

/// Dispatch a command that needs resolved configuration.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Components(args) => components::handle(ctx, args, global).await,
        Command::Dashboards(args) => dashboards::handle(ctx, args, global).await,
        Command::Extensions(args) => extensions::handle(ctx, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
