//! Process-level initialization.
//!
//! Currently just the logger; the store opens its own connection.

mod logger;

// Re-export public API
pub use logger::init_logger_with;
