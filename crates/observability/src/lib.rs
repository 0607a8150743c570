//! Process-wide logging setup shared by the binaries.

pub mod subscriber;

pub use subscriber::{LogFormat, init, init_with};
