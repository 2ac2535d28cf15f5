//! Small helpers shared by the store, the driver and the reporters.

mod timing;

pub use timing::{duration_as_ms, format_duration};
