//! Static front-end assets, compiled into the binary.

/// The calculator page served at `/`.
pub const INDEX_HTML: &str = include_str!("../assets/index.html");

/// The front-end script served at `/static/script.js`.
pub const SCRIPT_JS: &str = include_str!("../assets/script.js");
