//! The run lifecycle: parse flags, configure logging, dispatch to main and
//! map the result onto an exit code.
//!
//! [`AppRunner::run_from`] never exits the process; it returns an [`Outcome`]
//! which the outermost caller reports. [`AppRunner::execute`] does both and
//! is what a binary's `main` normally calls.
use std::ffi::OsString;
use std::io::{self, Write};
use std::marker::PhantomData;

use clap::Args;
use tracing::debug;

use crate::cli::args::{CommandLine, NoFlags, StandardFlags};
use crate::cli::usage::{render_usage, write_error};
use crate::error::{EXIT_APP_ERROR, EXIT_SUCCESS, Error, Result, is_informational};
use crate::logging::{self, LoggerLevels, LoggingGuard};
use crate::profile::Profiler;

/// Program name used when the argument vector is empty.
const FALLBACK_PROGRAM: &str = "app";

/// Everything parsed from the command line that configures a run.
#[derive(Debug, Clone)]
pub struct RunConfig<A = NoFlags> {
    pub program: String,
    pub flags: StandardFlags,
    pub loggers: LoggerLevels,
    pub app_flags: A,
}

impl<A> RunConfig<A> {
    pub fn new(program: String, flags: StandardFlags, app_flags: A) -> Result<Self> {
        let loggers = LoggerLevels::parse(&flags.logging_level)?;
        Ok(Self {
            program,
            flags,
            loggers,
            app_flags,
        })
    }
}

/// What main receives.
#[derive(Debug, Clone)]
pub struct Invocation<A = NoFlags> {
    pub program: String,
    /// Positional arguments, flags removed.
    pub args: Vec<String>,
    pub flags: A,
}

pub type ConfigureHook<A> = Box<dyn FnOnce(&RunConfig<A>) -> Result<()>>;

pub struct AppRunner<A, F>
where
    A: Args,
    F: FnOnce(Invocation<A>) -> Result<()>,
{
    main: F,
    usage: Option<String>,
    configure_hook: Option<ConfigureHook<A>>,
    _flags: PhantomData<fn() -> A>,
}

impl<A, F> AppRunner<A, F>
where
    A: Args,
    F: FnOnce(Invocation<A>) -> Result<()>,
{
    pub fn new(main: F) -> Self {
        Self {
            main,
            usage: None,
            configure_hook: None,
            _flags: PhantomData,
        }
    }

    /// Program description printed in the usage block; `%s` is replaced by
    /// the program name.
    pub fn usage(mut self, doc: impl Into<String>) -> Self {
        self.usage = Some(doc.into());
        self
    }

    /// Extra configuration run after logging is set up and before main.
    pub fn on_configure<H>(mut self, hook: H) -> Self
    where
        H: FnOnce(&RunConfig<A>) -> Result<()> + 'static,
    {
        self.configure_hook = Some(Box::new(hook));
        self
    }

    /// Runs against the process arguments.
    pub fn run(self) -> Outcome {
        self.run_from(std::env::args_os())
    }

    /// Runs against `argv`, whose first element is the program name.
    pub fn run_from<I, T>(self, argv: I) -> Outcome
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv: Vec<OsString> = argv.into_iter().map(Into::into).collect();
        let program = argv
            .first()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_else(|| FALLBACK_PROGRAM.to_string());
        let usage = render_usage(
            self.usage.as_deref(),
            &program,
            &CommandLine::<A>::command_for(&program),
        );
        let result = self.dispatch(program, argv);
        Outcome { result, usage }
    }

    /// Runs against the process arguments, reports the outcome on
    /// stdout/stderr and exits with its code.
    pub fn execute(self) -> ! {
        let outcome = self.run();
        let code = outcome
            .report(&mut io::stdout().lock(), &mut io::stderr().lock())
            .unwrap_or(EXIT_APP_ERROR);
        std::process::exit(code)
    }

    fn dispatch(self, program: String, argv: Vec<OsString>) -> Result<()> {
        let AppRunner {
            main,
            configure_hook,
            ..
        } = self;

        let CommandLine {
            standard,
            app,
            args,
        } = CommandLine::<A>::try_parse_argv(&program, argv)?;
        let config = RunConfig::new(program, standard, app)?;

        let profiler = config.flags.profiling().then(Profiler::new);
        let _logging = configure(configure_hook, &config, profiler.clone())?;

        let RunConfig {
            program,
            flags,
            app_flags,
            ..
        } = config;
        let invocation = Invocation {
            program,
            args,
            flags: app_flags,
        };

        let Some(profiler) = profiler else {
            debug!("dispatching to main");
            return main(invocation);
        };

        debug!(output = ?flags.profile_output, "dispatching to main under profiler");
        let result = profiler.profile(|| main(invocation));
        let report = profiler.report();
        match flags.profile_output {
            Some(path) => report.write_to(&path)?,
            None => report.render(&mut io::stdout().lock())?,
        }
        debug!(spans = report.entries.len(), "profile written");
        result
    }
}

/// Installs logging as described by `config`. The returned guard must be
/// held for as long as the configuration should stay active.
pub fn configure_logging<A>(
    config: &RunConfig<A>,
    profiler: Option<Profiler>,
) -> Result<LoggingGuard> {
    let guard = logging::install(
        &config.loggers,
        config.flags.logging_filename.as_deref(),
        profiler,
    )?;
    Ok(guard)
}

/// Logging first, then the application's own configuration.
pub fn configure<A>(
    hook: Option<ConfigureHook<A>>,
    config: &RunConfig<A>,
    profiler: Option<Profiler>,
) -> Result<LoggingGuard> {
    let guard = configure_logging(config, profiler)?;
    debug!(
        root = %config.loggers.root,
        targets = config.loggers.targets.len(),
        "logging configured"
    );
    if let Some(hook) = hook {
        hook(config)?;
    }
    Ok(guard)
}

/// Result of one run together with the usage block to print on usage errors.
#[derive(Debug)]
pub struct Outcome {
    result: Result<()>,
    usage: String,
}

impl Outcome {
    pub fn result(&self) -> &Result<()> {
        &self.result
    }

    pub fn into_result(self) -> Result<()> {
        self.result
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn exit_code(&self) -> i32 {
        match &self.result {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => e.exit_code(),
        }
    }

    /// Writes the user-facing report and returns the exit code.
    ///
    /// `App` errors print `Error: <message>`; `Usage` errors and flag-parse
    /// failures add the usage block on `out`. Any other error is reported the
    /// way Rust reports an `Err` returned from `main`.
    pub fn report<O: Write, E: Write>(&self, out: &mut O, err: &mut E) -> io::Result<i32> {
        let Err(error) = &self.result else {
            return Ok(EXIT_SUCCESS);
        };
        match error {
            Error::Flags(e) if is_informational(e) => {
                writeln!(out, "{}", self.usage)?;
                out.flush()?;
            }
            e if e.is_translated() => {
                write_error(out, err, &e.to_string())?;
                if e.wants_usage() {
                    writeln!(out, "{}", self.usage)?;
                    out.flush()?;
                }
            }
            e => {
                out.flush()?;
                writeln!(err, "Error: {:?}", e)?;
                err.flush()?;
            }
        }
        Ok(error.exit_code())
    }
}
