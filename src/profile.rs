//! Span-timing profiler used by `--profile`.
//!
//! [`Profiler`] is a `tracing_subscriber` layer: every span closed while it is
//! installed contributes one call, its busy time (cumulative) and its busy
//! time minus that of its child spans (own). A [`ProfileReport`] snapshot is
//! written as JSON to `--profile_output`, or rendered as a table on stdout.
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::span::Id;
use tracing::{Subscriber, info_span};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Profile serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone, Copy)]
struct SpanStats {
    calls: u64,
    cumulative: Duration,
    own: Duration,
}

/// Per-span timing kept in the registry's span extensions.
#[derive(Debug, Default)]
struct Timing {
    entered: Option<Instant>,
    busy: Duration,
    children: Duration,
}

type StatsKey = (String, String);

#[derive(Clone)]
pub struct Profiler {
    stats: Arc<Mutex<BTreeMap<StatsKey, SpanStats>>>,
    started: Instant,
    started_at: DateTime<Utc>,
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            stats: Arc::new(Mutex::new(BTreeMap::new())),
            started: Instant::now(),
            started_at: Utc::now(),
        }
    }

    /// Runs `f` inside a `main` span so the call itself is always measured.
    /// The span is only recorded if this profiler is part of the active
    /// subscriber.
    pub fn profile<T>(&self, f: impl FnOnce() -> T) -> T {
        let span = info_span!("main");
        span.in_scope(f)
    }

    pub fn report(&self) -> ProfileReport {
        let stats = match self.stats.lock() {
            Ok(stats) => stats.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        let mut entries: Vec<ProfileEntry> = stats
            .into_iter()
            .map(|((target, name), s)| ProfileEntry {
                target,
                name,
                calls: s.calls,
                cumulative_secs: s.cumulative.as_secs_f64(),
                own_secs: s.own.as_secs_f64(),
            })
            .collect();
        entries.sort_by(|a, b| b.cumulative_secs.total_cmp(&a.cumulative_secs));

        ProfileReport {
            started_at: self.started_at,
            wall_secs: self.started.elapsed().as_secs_f64(),
            entries,
        }
    }

    fn record(&self, key: StatsKey, timing: &Timing) {
        let mut stats = match self.stats.lock() {
            Ok(stats) => stats,
            Err(poisoned) => poisoned.into_inner(),
        };
        let entry = stats.entry(key).or_default();
        entry.calls += 1;
        entry.cumulative += timing.busy;
        entry.own += timing.busy.saturating_sub(timing.children);
    }
}

impl<S> Layer<S> for Profiler
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut extensions = span.extensions_mut();
        match extensions.get_mut::<Timing>() {
            Some(timing) => timing.entered = Some(Instant::now()),
            None => extensions.insert(Timing {
                entered: Some(Instant::now()),
                ..Timing::default()
            }),
        }
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let elapsed = {
            let mut extensions = span.extensions_mut();
            let Some(timing) = extensions.get_mut::<Timing>() else {
                return;
            };
            let Some(entered) = timing.entered.take() else {
                return;
            };
            let elapsed = entered.elapsed();
            timing.busy += elapsed;
            elapsed
        };
        if let Some(parent) = span.parent() {
            if let Some(timing) = parent.extensions_mut().get_mut::<Timing>() {
                timing.children += elapsed;
            }
        }
    }

    fn on_close(&self, id: Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(&id) else { return };
        let metadata = span.metadata();
        let key = (metadata.target().to_string(), metadata.name().to_string());
        if let Some(timing) = span.extensions_mut().remove::<Timing>() {
            self.record(key, &timing);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEntry {
    pub target: String,
    pub name: String,
    pub calls: u64,
    pub cumulative_secs: f64,
    pub own_secs: f64,
}

/// Statistics for one profiled run, sorted by cumulative time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    pub started_at: DateTime<Utc>,
    pub wall_secs: f64,
    pub entries: Vec<ProfileEntry>,
}

impl ProfileReport {
    pub fn entry(&self, name: &str) -> Option<&ProfileEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn total_calls(&self) -> u64 {
        self.entries.iter().map(|e| e.calls).sum()
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ProfileError> {
        let io_err = |source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush().map_err(io_err)?;
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, ProfileError> {
        let file = File::open(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(io::BufReader::new(file))?)
    }

    pub fn render<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(
            out,
            "{} calls in {:.3} seconds",
            self.total_calls(),
            self.wall_secs
        )?;
        writeln!(out)?;
        writeln!(out, "{:>9} {:>10} {:>10}  span", "ncalls", "cumtime", "owntime")?;
        for e in &self.entries {
            writeln!(
                out,
                "{:>9} {:>10.6} {:>10.6}  {}::{}",
                e.calls, e.cumulative_secs, e.own_secs, e.target, e.name
            )?;
        }
        out.flush()
    }
}
