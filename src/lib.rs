#![doc = r#"
apprun: a small application shell for Rust command line programs.

`apprun` owns the boring part of a binary's `main`: it parses the standard
flags every program supports, sets up logging from them, optionally profiles
the run, and turns the two expected failure kinds into exit codes and
`Error: ...` lines on stderr.

Standard flags
--------------
- `--logging_level=<spec>` (default `INFO`): comma-separated list of level
  names (`DEBUG`, `INFO`, `WARNING`, `ERROR`, `CRITICAL`) for the root logger,
  or `target:LEVEL` pairs for individual targets, e.g.
  `--logging_level=INFO,my_app.db:DEBUG`.
- `--logging_filename=<path>`: append log lines to a file instead of stderr.
- `--profile` (also `--profile=true|false`, `--noprofile`): time every span
  closed during main.
- `--profile_output=<path>`: write the profile as JSON instead of printing a
  table to stdout.

Options may appear anywhere among the positional arguments; `--` ends them.

Quick start
-----------
```rust,no_run
use apprun::{AppRunner, Error, Invocation};

fn main() {
    AppRunner::new(run)
        .usage("Greets people.\n\nUsage: %s [flags] NAME...")
        .execute()
}

fn run(inv: Invocation) -> apprun::Result<()> {
    if inv.args.is_empty() {
        return Err(Error::usage("at least one NAME is required"));
    }
    for name in &inv.args {
        tracing::info!(%name, "greeting");
        println!("Hello, {name}!");
    }
    Ok(())
}
```

Application flags
-----------------
Programs add flags of their own with any `clap::Args` type; they are parsed
alongside the standard flags and handed to main in [`Invocation::flags`].

```rust,no_run
use apprun::{AppRunner, Invocation};
use clap::Args;

#[derive(Args, Debug)]
struct Flags {
    /// Number of worker threads.
    #[arg(long, default_value_t = 4)]
    workers: usize,
}

fn main() {
    AppRunner::new(|inv: Invocation<Flags>| {
        tracing::info!(workers = inv.flags.workers, "starting");
        Ok(())
    })
    .execute()
}
```

Exit codes
----------
| result                                   | exit | stderr             | stdout      |
|------------------------------------------|------|--------------------|-------------|
| main returned `Ok(())`                   | 0    |                    |             |
| `Error::App`                             | 1    | `Error: <message>` |             |
| `Error::Usage`, unknown or bad flag      | 2    | `Error: <message>` | usage block |
| any other error                          | 1    | `Error: <debug>`   |             |

Panics inside main are not caught.

Testing without exiting
-----------------------
[`AppRunner::run_from`] returns an [`Outcome`] instead of exiting, and
[`Outcome::report`] writes to any pair of writers:

```rust
use apprun::{AppRunner, Error, Invocation};

let outcome = AppRunner::new(|_: Invocation| Err(Error::app("boom")))
    .run_from(["tool", "--logging_level=ERROR"]);

let (mut out, mut err) = (Vec::new(), Vec::new());
assert_eq!(outcome.report(&mut out, &mut err).unwrap(), 1);
assert_eq!(String::from_utf8(err).unwrap(), "Error: boom\n");
```

Useful modules
--------------
- [`runner`]: `AppRunner`, `RunConfig`, `Invocation`, `Outcome`.
- [`cli`]: standard flags and the usage block.
- [`logging`]: level specs and the log line format.
- [`profile`]: the span-timing profiler.
- [`error`]: crate-level `Error` and `Result`.
"#]

pub mod cli;
pub mod error;
pub mod logging;
pub mod profile;
pub mod runner;
pub mod types;

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cli::{CommandLine, NoFlags, StandardFlags};
pub use error::{EXIT_APP_ERROR, EXIT_SUCCESS, EXIT_USAGE_ERROR, Error, Result};
pub use logging::{LOG_FORMAT, LogFormat, LoggerLevels, LoggingError, LoggingGuard};
pub use profile::{ProfileEntry, ProfileError, ProfileReport, Profiler};
pub use runner::{AppRunner, Invocation, Outcome, RunConfig, configure, configure_logging};
pub use types::LogLevel;
