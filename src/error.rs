//! Crate-level error type and `Result` alias.
//! `App` and `Usage` are the two failures the runner translates into exit
//! codes; every other variant is reported as an untranslated fault.
use thiserror::Error;

use crate::logging::LoggingError;
use crate::profile::ProfileError;

pub type Result<T> = std::result::Result<T, Error>;

/// Exit code of a run that completed normally.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for application errors and untranslated faults.
pub const EXIT_APP_ERROR: i32 = 1;
/// Exit code for usage errors, including flag-parse failures.
pub const EXIT_USAGE_ERROR: i32 = 2;

#[derive(Debug, Error)]
pub enum Error {
    /// Application-level failure unrelated to how the program was invoked.
    #[error("{0}")]
    App(String),

    /// The end user supplied invalid arguments.
    #[error("{0}")]
    Usage(String),

    #[error("{}", flag_message(.0))]
    Flags(#[from] clap::Error),

    #[error("Logging configuration error: {0}")]
    Logging(#[from] LoggingError),

    #[error("Profiling error: {0}")]
    Profile(#[from] ProfileError),

    #[error("{0}")]
    Fault(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    pub fn app<M: std::fmt::Display>(msg: M) -> Self {
        Error::App(msg.to_string())
    }

    pub fn usage<M: std::fmt::Display>(msg: M) -> Self {
        Error::Usage(msg.to_string())
    }

    pub fn fault<E>(e: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Fault(e.into())
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Error::App(_) => EXIT_APP_ERROR,
            Error::Usage(_) => EXIT_USAGE_ERROR,
            Error::Flags(e) if is_informational(e) => EXIT_SUCCESS,
            Error::Flags(_) => EXIT_USAGE_ERROR,
            Error::Logging(_) | Error::Profile(_) | Error::Fault(_) => EXIT_APP_ERROR,
        }
    }

    /// True for the two kinds the runner reports with a plain message.
    pub fn is_translated(&self) -> bool {
        matches!(self, Error::App(_) | Error::Usage(_) | Error::Flags(_))
    }

    /// True when the usage block should follow the message.
    pub fn wants_usage(&self) -> bool {
        matches!(self, Error::Usage(_) | Error::Flags(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Fault(Box::new(e))
    }
}

/// `--help` and friends surface from clap as errors but are not failures.
pub(crate) fn is_informational(e: &clap::Error) -> bool {
    matches!(
        e.kind(),
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
    )
}

/// First line of clap's rendering without its `error: ` prefix; the usage
/// block is printed separately.
fn flag_message(e: &clap::Error) -> String {
    let rendered = e.to_string();
    let line = rendered.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    line.strip_prefix("error: ").unwrap_or(line).trim().to_string()
}
