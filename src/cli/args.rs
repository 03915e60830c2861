use std::ffi::OsString;
use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser};
use serde::{Deserialize, Serialize};

/// Flags every application supports.
#[derive(Args, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardFlags {
    /// The logging level to use.
    #[arg(long = "logging_level", value_name = "SPEC", default_value = "INFO")]
    pub logging_level: String,

    /// Filename to write log output to.
    #[arg(long = "logging_filename", value_name = "PATH")]
    pub logging_filename: Option<PathBuf>,

    /// Profile the application.
    #[arg(
        long,
        num_args = 0..=1,
        require_equals = true,
        default_value_t = false,
        default_missing_value = "true",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        overrides_with = "noprofile"
    )]
    pub profile: bool,

    /// Do not profile the application.
    #[arg(long, default_value_t = false, overrides_with = "profile")]
    pub noprofile: bool,

    /// The file to save profiling stats to.
    #[arg(long = "profile_output", value_name = "PATH")]
    pub profile_output: Option<PathBuf>,
}

impl Default for StandardFlags {
    fn default() -> Self {
        Self {
            logging_level: "INFO".to_string(),
            logging_filename: None,
            profile: false,
            noprofile: false,
            profile_output: None,
        }
    }
}

impl StandardFlags {
    /// Whether main runs under the profiler; the last of `--profile` and
    /// `--noprofile` wins.
    pub fn profiling(&self) -> bool {
        self.profile && !self.noprofile
    }
}

/// Application flags for programs that define none of their own.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct NoFlags {}

/// Full command line: standard flags, the application's flags and the
/// positional arguments, which may be interspersed with options.
#[derive(Parser, Debug)]
#[command(disable_version_flag = true)]
pub struct CommandLine<A: Args> {
    #[command(flatten)]
    pub standard: StandardFlags,

    #[command(flatten)]
    pub app: A,

    /// Arguments passed through to main.
    #[arg(value_name = "ARGS")]
    pub args: Vec<String>,
}

impl<A: Args> CommandLine<A> {
    /// The clap command, named after the running program.
    pub fn command_for(program: &str) -> clap::Command {
        Self::command().bin_name(program.to_string())
    }

    /// Parses `argv`, whose first element is the program name.
    pub fn try_parse_argv<I, T>(program: &str, argv: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut matches = Self::command_for(program).try_get_matches_from(argv)?;
        Self::from_arg_matches_mut(&mut matches)
    }
}
