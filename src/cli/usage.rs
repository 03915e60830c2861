//! Usage block and error line helpers.
//!
//! The usage block is the program description with every `%s` replaced by
//! the program name, followed by `Flags:` and one entry per recognized flag.
use std::io::{self, Write};

use clap::Command;

/// Description used when the application supplies none.
pub const DEFAULT_USAGE: &str = "\nUsage: %s [flags]";

pub fn render_usage(doc: Option<&str>, program: &str, command: &Command) -> String {
    let mut usage = match doc {
        Some(doc) if !doc.trim().is_empty() => doc.replace("%s", program),
        _ => DEFAULT_USAGE.replace("%s", program),
    };
    usage.push_str("\nFlags:\n");
    usage.push_str(&render_flags(command));
    usage
}

/// One entry per long flag: the flag, its help text and its default.
pub fn render_flags(command: &Command) -> String {
    let mut out = String::new();
    for arg in command.get_arguments() {
        let Some(long) = arg.get_long() else { continue };
        match arg.get_help() {
            Some(help) => out.push_str(&format!("  --{}: {}\n", long, help)),
            None => out.push_str(&format!("  --{}\n", long)),
        }
        let defaults: Vec<String> = arg
            .get_default_values()
            .iter()
            .map(|v| v.to_string_lossy().into_owned())
            .collect();
        if !defaults.is_empty() {
            out.push_str(&format!("    (default: '{}')\n", defaults.join(",")));
        }
    }
    out
}

/// Writes `Error: <msg>` to `err` after flushing `out`, so the error line
/// never lands ahead of output already produced.
pub fn write_error<O: Write, E: Write>(out: &mut O, err: &mut E, msg: &str) -> io::Result<()> {
    out.flush()?;
    writeln!(err, "Error: {}", msg)?;
    err.flush()
}
