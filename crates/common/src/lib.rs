//! Ambient facilities shared by the fedpeg crates and binaries.

pub mod instrumentation;
pub mod logging;
