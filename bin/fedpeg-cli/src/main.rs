//! Command line tool for working with peg-in deposits and peg-out scripts.
//!
//! Every command is read-only: nothing here changes the claim registry.

mod args;
mod cmd;
mod util;

use args::resolve_context_and_subcommand;
use util::exec_subc;

fn main() {
    let args: args::Args = argh::from_env();
    let inner = || -> anyhow::Result<()> {
        let (ctx, subc) = resolve_context_and_subcommand(args)?;
        exec_subc(subc, &ctx)?;
        Ok(())
    };
    if let Err(e) = inner() {
        eprintln!("ERROR\n{e:?}");
    }
}
