//! Line-delimited JSON protocol spoken by the `attendd` sidecar.
//!
//! Each request is `{"id", "method", "params"}`; each reply is
//! `{"id", "ok": true, "result"}` or `{"id", "ok": false, "error": {"code", "message"}}`.

mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use error::{err, ok};
pub use router::handle_request;
pub use types::{AppState, Request};
