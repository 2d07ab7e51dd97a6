//! Shared helpers for filesystem, HTTP and process work.

pub mod fs;
pub mod http;
pub mod process;
