//! Transport-level handlers shared by every bot built on this crate.

mod logging;

pub use logging::LoggingHandler;
