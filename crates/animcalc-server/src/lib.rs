//! # Animcalc Server
//!
//! HTTP surface for the Animation Calculator.
//!
//! | route | purpose |
//! |---|---|
//! | `GET /` | animated calculator page |
//! | `GET /static/script.js` | front-end script |
//! | `GET /health` | liveness probe |
//! | `POST /calculate` | run one calculation |
//! | `GET /api/status` | uptime and counters |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assets;
pub mod handlers;
pub mod readiness;
pub mod server;

pub use readiness::wait_until_ready;
pub use server::{shutdown_signal, AppState, BoundServer, RunningServer, Server, ServerConfig};
