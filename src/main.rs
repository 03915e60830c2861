//! apprun demo entrypoint.
//!
//! Echoes its positional arguments, one per line. `--fail` makes it fail on
//! purpose so every exit path of the runner can be exercised from a shell.
//! For programmatic use, see the library docs (`apprun::AppRunner`).

use apprun::{AppRunner, Error, Invocation};
use clap::{Args, ValueEnum};
use tracing::{debug, info, info_span};

const USAGE: &str = "
Echoes ARGS, one per line.

Usage: %s [flags] [ARGS...]";

#[derive(Args, Debug, Clone)]
struct DemoFlags {
    /// Fail on purpose with the given kind of error
    #[arg(long, value_enum)]
    fail: Option<FailWith>,

    /// Text printed in front of every echoed argument
    #[arg(long, default_value = "")]
    prefix: String,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum FailWith {
    App,
    Usage,
    Fault,
    Panic,
}

fn main() {
    AppRunner::new(run).usage(USAGE).execute()
}

fn run(inv: Invocation<DemoFlags>) -> apprun::Result<()> {
    info!("{} starting with {} argument(s)", inv.program, inv.args.len());

    match inv.flags.fail {
        Some(FailWith::App) => return Err(Error::app("boom")),
        Some(FailWith::Usage) => return Err(Error::usage("bad arg")),
        Some(FailWith::Fault) => {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire").into());
        }
        Some(FailWith::Panic) => panic!("demo panic"),
        None => {}
    }

    for (index, arg) in inv.args.iter().enumerate() {
        let _span = info_span!("echo", index).entered();
        debug!(%arg, "echoing");
        println!("{}{}", inv.flags.prefix, arg);
    }
    Ok(())
}
