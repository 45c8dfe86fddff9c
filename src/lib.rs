use std::error::Error;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod handler;
pub mod kv;
pub mod model;
pub mod pins;

/// Flattens an error and its source chain into one `a: b: c` line.
pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(source) = current {
        let text = source.to_string();
        if !parts.iter().any(|p| p == &text) {
            parts.push(text);
        }
        current = source.source();
    }
    parts.join(": ")
}
