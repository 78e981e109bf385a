//! # Dispatcher Module
//!
//! Top-level orchestration of one request: resolve the endpoint, wrap it in
//! the middleware pipeline, run it, and emit either its response or the
//! recovery unit's substitute.
//!
//! ## Lifecycle
//!
//! 1. **Boot**: endpoints are added with [`Dispatcher::add`].
//! 2. **Start**: [`Dispatcher::start`] mounts the fallback endpoint at the base
//!    path unless one is already registered, then freezes the registry. Later
//!    `add` calls fail with [`BootError::Frozen`](crate::recovery::BootError).
//!    `dispatch` starts the dispatcher on first use.
//! 3. **Dispatch**: the registry snapshot is read through `ArcSwap` without
//!    locking. The request reaches the pipeline with the `activePath`
//!    attribute set to the matched endpoint path.
//!
//! ## Failure handling
//!
//! | Failure                              | Recovered as                                  |
//! |--------------------------------------|-----------------------------------------------|
//! | no endpoint resolves                 | client failure, status 500                    |
//! | `Err(DispatchError)` from the chain  | as returned                                   |
//! | panic inside the chain               | internal failure                              |
//! | fallback construction fails on start | internal failure                              |
//!
//! Write errors while emitting are returned to the caller; they are never
//! retried.

mod core;

pub use self::core::Dispatcher;
