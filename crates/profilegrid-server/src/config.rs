/// Re-export `Config` from `profilegrid-core` for use within this crate.
///
/// Environment parsing lives in the core crate so integration tests can build
/// a `Config` without going through the process environment.
pub use profilegrid_core::config::Config;
