//! Logging helpers shared by the voice modules.
//!
//! Everything goes through the `log` facade; the host installs the logger.
//! The `LogLevel` enum mirrors the numeric levels the host side uses so a
//! configured verbosity can be mapped onto a `log::LevelFilter`.

/// Log levels matching the host's numeric levels
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Nothing = 0,
    User = 1,
    Error = 2,
    Warning = 3,
    Info = 4,
    Debug = 5,
    All = 6,
}

impl LogLevel {
    /// Create a LogLevel from an integer
    pub fn from_i32(level: i32) -> Self {
        match level {
            0 => LogLevel::Nothing,
            1 => LogLevel::User,
            2 => LogLevel::Error,
            3 => LogLevel::Warning,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::All,
            _ => LogLevel::Info,
        }
    }

    /// Get the integer representation used by the host
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    /// Most verbose `log` level that should pass for this host level.
    ///
    /// `User` messages are fatal notices, so they share the error filter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Nothing => log::LevelFilter::Off,
            LogLevel::User | LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warning => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::All => log::LevelFilter::Trace,
        }
    }
}

/// Apply a host verbosity to the global `log` filter.
pub fn set_max_level(level: LogLevel) {
    log::set_max_level(level.to_level_filter());
}

/// Log a message at most once per call site for the lifetime of the process.
///
/// Expands to `true` when the message was emitted by this invocation.
#[macro_export]
macro_rules! log_once {
    ($lvl:expr, $($arg:tt)+) => {{
        static LOGGED: ::std::sync::atomic::AtomicBool =
            ::std::sync::atomic::AtomicBool::new(false);
        if !LOGGED.swap(true, ::std::sync::atomic::Ordering::Relaxed) {
            ::log::log!($lvl, $($arg)+);
            true
        } else {
            false
        }
    }};
}

/// Convenience macro for one-shot warnings
#[macro_export]
macro_rules! warn_once {
    ($($arg:tt)+) => {
        $crate::log_once!(::log::Level::Warn, $($arg)+)
    };
}

/// Convenience macro for one-shot errors
#[macro_export]
macro_rules! error_once {
    ($($arg:tt)+) => {
        $crate::log_once!(::log::Level::Error, $($arg)+)
    };
}
