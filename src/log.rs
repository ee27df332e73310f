//! Browser console logging.
//!
//! On `wasm32` the message goes to `console.log`; elsewhere the arguments are
//! still type-checked but nothing is printed.

#[cfg(target_arch = "wasm32")]
macro_rules! console_log {
    ($($t:tt)*) => {
        web_sys::console::log_1(&format!($($t)*).into())
    };
}

#[cfg(not(target_arch = "wasm32"))]
macro_rules! console_log {
    ($($t:tt)*) => {
        let _ = format_args!($($t)*);
    };
}

pub(crate) use console_log;
