// SPDX-License-Identifier: MPL-2.0

//! Logging support.
//!
//! The logger formats each record and hands the line to a sink supplied by
//! the platform, usually an early serial console.
//!
//! Messages are printed in their entirety without being mixed with messages
//! generated concurrently on other cores. Handlers may log, so keep the
//! messages short.

use alloc::{format, string::String};

use log::{LevelFilter, Metadata, Record};
use spin::{Mutex, Once};

use crate::irq::disable_local;

/// A function that prints one formatted log line.
pub type LogSink = fn(&str);

static LOGGER: Logger = Logger { sink: Once::new() };

struct Logger {
    sink: Once<LogSink>,
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(sink) = self.sink.get() else {
            return;
        };

        emit(*sink, &format_record(record));
    }

    fn flush(&self) {}
}

/// Prints one line, holding off other cores and local interrupt handlers.
fn emit(sink: LogSink, line: &str) {
    // Use a global lock to prevent interleaving of log messages.
    static RECORD_LOCK: Mutex<()> = Mutex::new(());
    let _irq = disable_local();
    let _lock = RECORD_LOCK.lock();

    sink(line);
}

fn format_record(record: &Record) -> String {
    let level = format!("{:<5}", record.level());

    #[cfg(feature = "log_color")]
    let level = {
        use alloc::string::ToString;

        use owo_colors::OwoColorize;

        match record.level() {
            log::Level::Error => level.red().to_string(),
            log::Level::Warn => level.bright_yellow().to_string(),
            log::Level::Info => level.blue().to_string(),
            log::Level::Debug => level.bright_green().to_string(),
            log::Level::Trace => level.bright_black().to_string(),
        }
    };

    format!("{}: {}", level, record.args())
}

/// Initializes the logger.
///
/// Log macros used before this call are discarded. Calling it again only
/// updates the maximum level; the first sink stays in place.
pub fn init(level: LevelFilter, sink: LogSink) {
    LOGGER.sink.call_once(|| sink);
    log::set_max_level(level);
    // Another logger may already be installed when this layer is embedded
    // in a larger kernel. Its output is used instead.
    let _ = log::set_logger(&LOGGER);
}
