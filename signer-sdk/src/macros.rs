/// Cross-platform logging macro with explicit level selection.
///
/// Forwards to [`tracing`] on native builds and to the `log` crate on WASM.
/// Under `cfg(test)` it prints to `stdout` with the level as a prefix.
///
/// # Examples
/// ```
/// use signer_client::cross_log;
/// # fn main() {
/// cross_log!(info, "bound identity {}", "2vxsx-fae");
/// cross_log!(warn, "status endpoint answered {}", 503);
/// # }
/// ```
#[macro_export]
macro_rules! cross_log {
    ($level:ident, $($arg:tt)*) => {
        #[cfg(all(not(test), target_arch = "wasm32"))]
        log::$level!($($arg)*);
        #[cfg(all(not(test), not(target_arch = "wasm32")))]
        tracing::$level!($($arg)*);
        #[cfg(test)]
        println!("[{}] {}", stringify!($level), format_args!($($arg)*));
    };
}
