//! # Endpoint Registry Module
//!
//! Maps normalized path prefixes to handlers. An application mounts whole
//! subtrees (e.g. `/forum`) on independent handler chains while the base path
//! stays with the dispatcher's fallback router.
//!
//! ## Normalization
//!
//! Registered and requested paths are lower-cased; an empty path becomes `/`
//! and a missing leading `/` is added. `/Forum` and `/forum` are the same
//! endpoint.
//!
//! ## Resolution order
//!
//! Exact match first, then the first registered prefix. Registration order
//! matters: longest-prefix matching is deliberately not applied.
//!
//! ## Catalog
//!
//! [`Catalog`] names handlers, middlewares and router classes so a
//! [`DispatcherConfig`](crate::config::DispatcherConfig) can refer to them.

mod catalog;
mod core;

pub use self::core::{normalize_path, EndpointRegistry, Resolved};
pub use catalog::{router_fn, Catalog, RouterFactory};
