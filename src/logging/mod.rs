//! Logging setup driven by `--logging_level` and `--logging_filename`.
//!
//! A level spec is a comma-separated list of tokens. A bare level name
//! (`DEBUG`) sets the root threshold; `target:LEVEL` sets the threshold of one
//! target and everything below it. Dotted targets (`my_app.db`) are accepted
//! and normalized to Rust module paths (`my_app::db`).
//!
//! The parsed spec lives in [`LoggerLevels`], which is turned into an
//! `EnvFilter` and installed together with [`LogFormat`] by [`install`].
pub mod format;

pub use format::{LOG_FORMAT, LogFormat};

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Dispatch;
use tracing::dispatcher::DefaultGuard;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry};

use crate::profile::Profiler;
use crate::types::LogLevel;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Unknown logging level: {name}")]
    UnknownLevel { name: String },

    #[error("Invalid logging target '{target}': {source}")]
    InvalidTarget {
        target: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("Cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Thresholds for the root logger and for named targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerLevels {
    pub root: LogLevel,
    pub targets: BTreeMap<String, LogLevel>,
}

impl Default for LoggerLevels {
    fn default() -> Self {
        Self {
            root: LogLevel::Warning,
            targets: BTreeMap::new(),
        }
    }
}

impl LoggerLevels {
    /// Parses a level spec such as `INFO,my_app.db:DEBUG`. Later tokens win
    /// over earlier ones for the same logger. Empty tokens are skipped, so
    /// `ERROR,,` and an empty spec are accepted.
    pub fn parse(spec: &str) -> Result<Self, LoggingError> {
        let mut levels = LoggerLevels::default();
        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.rsplit_once(':') {
                Some((target, level_name)) => {
                    let level = LogLevel::from_name(level_name)?;
                    levels.set(target, level);
                }
                None => levels.root = LogLevel::from_name(token)?,
            }
        }
        Ok(levels)
    }

    /// Sets the threshold of `target`; an empty target names the root logger.
    pub fn set(&mut self, target: &str, level: LogLevel) {
        let target = normalize_target(target);
        if target.is_empty() {
            self.root = level;
        } else {
            self.targets.insert(target, level);
        }
    }

    /// Effective threshold for `target`: the most specific configured
    /// ancestor, falling back to the root. The installed filter applies the
    /// same threshold, except that it matches targets by plain string prefix
    /// (`app` also covers `application`) and lets ERROR events through a
    /// CRITICAL threshold.
    pub fn level_for(&self, target: &str) -> LogLevel {
        let target = normalize_target(target);
        self.targets
            .iter()
            .filter(|(name, _)| is_within(&target, name))
            .max_by_key(|(name, _)| name.len())
            .map(|(_, level)| *level)
            .unwrap_or(self.root)
    }

    pub fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        let mut filter = EnvFilter::new("").add_directive(self.root.filter().into());
        for (target, level) in &self.targets {
            let directive: Directive = format!("{}={}", target, level.filter())
                .parse()
                .map_err(|source| LoggingError::InvalidTarget {
                    target: target.clone(),
                    source,
                })?;
            filter = filter.add_directive(directive);
        }
        Ok(filter)
    }
}

impl FromStr for LoggerLevels {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoggerLevels::parse(s)
    }
}

fn normalize_target(target: &str) -> String {
    target.trim().replace('.', "::")
}

fn is_within(target: &str, ancestor: &str) -> bool {
    target == ancestor
        || target
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with("::"))
}

/// Keeps a thread-scoped subscriber alive when a global one already existed;
/// the scoped one then applies to the installing thread only.
pub struct LoggingGuard {
    scoped: Option<DefaultGuard>,
}

impl LoggingGuard {
    /// True when the subscriber was installed process-wide.
    pub fn is_global(&self) -> bool {
        self.scoped.is_none()
    }
}

/// Installs the log subscriber: `levels` filter the formatted output, which
/// goes to `destination` (appending) or stderr. A profiler, when given, sees
/// every span regardless of the level filter.
pub fn install(
    levels: &LoggerLevels,
    destination: Option<&Path>,
    profiler: Option<Profiler>,
) -> Result<LoggingGuard, LoggingError> {
    let writer = match destination {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::LogFile {
                    path: path.to_path_buf(),
                    source,
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .event_format(LogFormat)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(levels.env_filter()?);

    let dispatch = Dispatch::new(Registry::default().with(fmt_layer).with(profiler));

    match tracing::dispatcher::set_global_default(dispatch.clone()) {
        Ok(()) => Ok(LoggingGuard { scoped: None }),
        Err(_) => Ok(LoggingGuard {
            scoped: Some(tracing::dispatcher::set_default(&dispatch)),
        }),
    }
}
