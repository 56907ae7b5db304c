//! Convenience macros.

/// Log an event with the given level, prefixed with the current module.
///
/// Optional `key => value` pairs are appended as metadata.
///
/// # Examples
///
/// ```
/// use warden_core::log_event;
/// use warden_core::utils::LogLevel;
///
/// log_event!(LogLevel::Info, "Session reset");
///
/// log_event!(LogLevel::Debug, "Privilege cache grown",
///     capacity => 32,
///     len => 17,
/// );
/// ```
#[macro_export]
macro_rules! log_event {
    ($level:expr, $message:expr) => {
        {
            use $crate::utils::LogLevel;
            match $level {
                LogLevel::Error => log::error!("[{}] {}", module_path!(), $message),
                LogLevel::Warning => log::warn!("[{}] {}", module_path!(), $message),
                LogLevel::Info => log::info!("[{}] {}", module_path!(), $message),
                LogLevel::Debug => log::debug!("[{}] {}", module_path!(), $message),
                LogLevel::Trace => log::trace!("[{}] {}", module_path!(), $message),
            }
        }
    };

    ($level:expr, $message:expr, $($key:ident => $value:expr),+ $(,)?) => {
        {
            use $crate::utils::LogLevel;
            let metadata = vec![$(format!("{}={}", stringify!($key), $value)),+].join(" ");
            match $level {
                LogLevel::Error => log::error!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Warning => log::warn!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Info => log::info!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Debug => log::debug!("[{}] {}: {}", module_path!(), $message, metadata),
                LogLevel::Trace => log::trace!("[{}] {}: {}", module_path!(), $message, metadata),
            }
        }
    };
}
