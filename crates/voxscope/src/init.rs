//! Process-wide setup for applications built on voxscope.

/// Installs the `env_logger` backend for the `log` macros used throughout
/// voxscope.
///
/// Filtering follows `RUST_LOG`. Calling this more than once, or after
/// another logger was installed, is a no-op.
///
/// # Example
///
/// ```no_run
/// voxscope::init_logging();
/// log::info!("logging ready");
/// ```
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::debug!("voxscope logging initialized");
    }
}
