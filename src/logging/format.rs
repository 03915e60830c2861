use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

use crate::types::LogLevel;

/// Layout of every log line written by [`LogFormat`].
pub const LOG_FORMAT: &str = "<thread>:<timestamp>:<level>:<module>:<line> <message>";

/// Timestamp layout, millisecond precision in local time.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S,%3f";

/// Formats events as `thread:timestamp:level:module:line message`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogFormat;

impl<S, N> FormatEvent<S, N> for LogFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let metadata = event.metadata();
        let thread = std::thread::current();
        write!(
            writer,
            "{}:{}:{}:{}:{} ",
            thread.name().unwrap_or("<unnamed>"),
            chrono::Local::now().format(TIMESTAMP_FORMAT),
            LogLevel::label_for(metadata.level()),
            metadata.module_path().unwrap_or_else(|| metadata.target()),
            metadata.line().unwrap_or(0),
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture(f: impl FnOnce()) -> String {
        let out = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .event_format(LogFormat)
            .with_writer(out.clone())
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        let bytes = out.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn line_has_thread_level_module_and_message() {
        let output = std::thread::Builder::new()
            .name("worker-1".to_string())
            .spawn(|| capture(|| tracing::warn!("disk almost full")))
            .unwrap()
            .join()
            .unwrap();

        let line = output.lines().next().unwrap();
        assert!(line.starts_with("worker-1:"), "{line}");
        assert!(
            line.contains(":WARNING:apprun::logging::format::tests:"),
            "{line}"
        );
        assert!(line.ends_with(" disk almost full"), "{line}");
    }

    #[test]
    fn line_number_precedes_message() {
        let output = capture(|| tracing::info!(answer = 42, "computed"));
        let line = output.lines().next().unwrap();
        let (head, message) = line.split_once(" computed").unwrap();
        let line_no = head.rsplit(':').next().unwrap();
        assert!(line_no.parse::<u32>().unwrap() > 0);
        assert!(message.contains("answer=42"));
    }
}
