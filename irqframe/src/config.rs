// SPDX-License-Identifier: MPL-2.0

//! Boot-time configuration of the IRQ layer.
//!
//! The options are read from the kernel command line, which follows the
//! Linux rules: arguments are separated by spaces unless protected by double
//! quotes, and options of this layer are written as `irq.<option>=<value>`:
//!
//! ```text
//! console=ttyS0 irq.max_redispatch=4 irq.log_level=debug
//! ```

use log::{LevelFilter, warn};

/// The module name that prefixes options of this layer on the command line.
const MODULE: &str = "irq";

/// Tunables of the IRQ layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IrqConfig {
    /// How many times the dispatch core re-runs a chain for requests that
    /// arrived while it was running, before it declares the line stuck.
    pub max_redispatch: usize,
    /// Every this many unclaimed requests on a line, an error is logged.
    /// Zero disables the report.
    pub unhandled_report_interval: usize,
    /// The maximum level of log messages.
    pub log_level: LevelFilter,
}

impl Default for IrqConfig {
    fn default() -> Self {
        Self {
            max_redispatch: 8,
            unhandled_report_interval: 1000,
            log_level: LevelFilter::Warn,
        }
    }
}

impl IrqConfig {
    /// Parses the options of this layer out of a kernel command line.
    ///
    /// Options of other modules are skipped. Unknown options and malformed
    /// values are reported and leave the default in place.
    pub fn from_cmdline(cmdline: &str) -> Self {
        let mut config = Self::default();

        for arg in split_arg(cmdline).filter(|arg| !arg.is_empty()) {
            if arg == "--" {
                break;
            }
            let Some((entry, value)) = arg.split_once('=') else {
                continue;
            };
            let Some((module, option)) = entry.split_once('.') else {
                continue;
            };
            if module != MODULE {
                continue;
            }
            let value = value.trim_matches('"');

            let parsed = match option {
                "max_redispatch" => value.parse().map(|v| config.max_redispatch = v).is_ok(),
                "unhandled_report_interval" => value
                    .parse()
                    .map(|v| config.unhandled_report_interval = v)
                    .is_ok(),
                "log_level" => parse_level(value)
                    .map(|v| config.log_level = v)
                    .is_some(),
                _ => {
                    warn!("[IRQ]: unknown option {}.{}, skip", MODULE, option);
                    continue;
                }
            };
            if !parsed {
                warn!(
                    "[IRQ]: invalid value {:?} for {}.{}, keep the default",
                    value, MODULE, option
                );
            }
        }

        config
    }
}

// Splits the command line string by spaces but preserve
// ones that are protected by double quotes(`"`).
fn split_arg(input: &str) -> impl Iterator<Item = &str> {
    let mut inside_quotes = false;

    input.split(move |c: char| {
        if c == '"' {
            inside_quotes = !inside_quotes;
        }

        !inside_quotes && c.is_whitespace()
    })
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    Some(match value {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => return None,
    })
}
