use log::SetLoggerError;

/// The environment variable holding the log filter, e.g. `CLOSUREGEN_LOG=closuregen=trace`.
pub const LOG_FILTER_ENV: &str = "CLOSUREGEN_LOG";
/// The environment variable selecting colored output.
pub const LOG_STYLE_ENV: &str = "CLOSUREGEN_LOG_STYLE";

/// Attempt to init an env_logger for a generation run.
/// Does nothing if the "builtin_env_logger" feature is disabled, in which case the packaging
/// layer is free to install its own `log` backend.
pub fn try_init() -> Result<(), SetLoggerError> {
    cfg_if::cfg_if! {
        if #[cfg(feature = "builtin_env_logger")] {
            env_logger::try_init_from_env(
                // Per-run summaries are logged at info; plans and steps at debug/trace.
                env_logger::Env::new()
                    .filter_or(LOG_FILTER_ENV, "info")
                    .write_style(LOG_STYLE_ENV),
            )
        } else {
            Ok(())
        }
    }
}
