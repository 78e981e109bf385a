//! # Error Recovery Module
//!
//! Classifies failures raised while dispatching a request and converts them
//! into a single substitute response.
//!
//! ## Failure taxonomy
//!
//! Handlers and middleware return [`DispatchError`]:
//!
//! - `Client { status, message }`: the request itself is at fault. Logged at
//!   `warn` with scheme, host, path, status, message and remote address; the
//!   response keeps the status.
//! - `Internal(anyhow::Error)`: anything else, including handler panics caught
//!   by the dispatcher. Logged at `error`; the response is always a 500.
//!
//! ## Content negotiation
//!
//! | Condition                                   | Body                                   |
//! |---------------------------------------------|----------------------------------------|
//! | `Accept: application/json`                  | `{"status": code}`                     |
//! | ... and internal with `exposeErrors`        | `{"status": 500, "error": .., "request": ..}` |
//! | template configured for the status          | rendered template                      |
//! | internal with `exposeErrors`                | HTML diagnostic page                   |
//! | otherwise                                   | empty                                  |
//!
//! Recovery always ends by handing the response to the
//! [`ResponseEmitter`](crate::server::ResponseEmitter); it never returns
//! control to the normal dispatch path.

mod context;
mod core;
mod error;
mod snapshot;

pub use self::core::{ErrorRecovery, EMPTY_MESSAGE_PLACEHOLDER};
pub use context::{ForwardedFor, PeerAddr, RemoteAddr};
pub use error::{BootError, DispatchError};
pub use snapshot::Snapshot;
