//! Severity-prefixed terminal logging. Messages are written as
//! `[HH:MM:SS] [LEVEL] message` with a colored level prefix; warnings and
//! errors go to stderr, everything else to stdout. `debug!` output is only
//! emitted when the `DEBUG` environment variable is set.

use chrono::Local;
use colored::{ColoredString, Colorize};

/// Message severity. Ordering matters only for display, not filtering: every
/// level except [`Level::Debug`] is always emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    fn prefix(self) -> ColoredString {
        match self {
            Level::Debug => "[DEBUG]".dimmed(),
            Level::Info => "[INFO]".bright_blue().bold(),
            Level::Warn => "[WARN]".bright_yellow().bold(),
            Level::Error => "[ERROR]".bright_red().bold(),
        }
    }
}

/// Writes a single log line. Prefer the [`info!`], [`warn!`], [`error!`], and
/// [`debug!`] macros over calling this directly.
pub fn log(level: Level, message: &str) {
    if level == Level::Debug && std::env::var_os("DEBUG").is_none() {
        return;
    }
    let time = Local::now().format("%H:%M:%S");
    let line = format!("{} {} {}", format!("[{}]", time).dimmed(), level.prefix(), message);
    match level {
        Level::Warn | Level::Error => eprintln!("{}", line),
        _ => println!("{}", line),
    }
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Warn, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Error, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        $crate::logger::log($crate::logger::Level::Debug, &format!($($arg)*))
    };
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_prefixes_name_the_level() {
        assert!(Level::Info.prefix().to_string().contains("INFO"));
        assert!(Level::Warn.prefix().to_string().contains("WARN"));
        assert!(Level::Error.prefix().to_string().contains("ERROR"));
        assert!(Level::Debug.prefix().to_string().contains("DEBUG"));
    }
}
