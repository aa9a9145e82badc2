//! Structs, Strings and Enums to support trace logging of the scheduler.
//!
//! To enable logging support, compile the library with the `trace_log`
//! feature, i.e. `cargo build --features trace_log`.
//!
//! The consumer should also import the `env_logger` and `log` crates and
//! initialize `env_logger` through `env_logger::init()`.

use std::fmt::{Debug, Display};

/// Scheduling events worth tracing, keyed by whatever identifies the state
/// (usually a `StateId`).
pub enum Event<'a, T: 'a + Debug> {
    /// state picked by a leaf explorer
    Select(&'a T),
    /// state entered an explorer's storage
    Add(&'a T),
    /// state left an explorer's storage for good
    Remove(&'a T),
    /// state excluded from scheduling (merge wait or deepening budget)
    Pause(&'a T),
    /// paused state made selectable again
    Resume(&'a T),
    /// every paused state revived in one notification
    Revive(usize),
}

impl<'a, T: Debug> Display for Event<'a, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Event::Select(i) => write!(f, "sched_select|{i:?}"),
            Event::Add(i) => write!(f, "sched_add|{i:?}"),
            Event::Remove(i) => write!(f, "sched_remove|{i:?}"),
            Event::Pause(i) => write!(f, "sched_pause|{i:?}"),
            Event::Resume(i) => write!(f, "sched_resume|{i:?}"),
            Event::Revive(n) => write!(f, "sched_revive|{n}"),
        }
    }
}

#[macro_export]
macro_rules! rove_trace {
    ($t: expr) => ({
        if cfg!(feature = "trace_log") {
            #[cfg(feature="trace_log")]
            log::debug!("{}", $t.to_string());
        }
    });
    ($fmt:expr, $($arg:tt)*) => ({
        if cfg!(feature = "trace_log") {
            #[cfg(feature="trace_log")]
            log::debug!("{}", format_args!($fmt, $($arg)*));
        }
    });
}

#[macro_export]
macro_rules! rove_warn {
    ($t: expr) => ({
        if cfg!(feature = "trace_log") {
            #[cfg(feature="trace_log")]
            log::warn!("{}", $t.to_string());
        }
    });
    ($fmt:expr, $($arg:tt)*) => ({
        if cfg!(feature = "trace_log") {
            #[cfg(feature="trace_log")]
            log::warn!("{}", format_args!($fmt, $($arg)*));
        }
    });
}
