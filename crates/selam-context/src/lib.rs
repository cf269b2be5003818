//! Correlation id propagation for SelamAI request lifecycles.
#![forbid(unsafe_code)]
//!
//! `selam-context` makes an identifier available to any code running within
//! a logical unit of work (an HTTP request, a trade evaluation, a background
//! job) without threading it through every call.
//!
//! # Example
//!
//! ```rust
//! use selam_context::{self as correlation, CorrelationId};
//!
//! {
//!     let guard = correlation::scoped(Some(CorrelationId::from("trade-123-456")));
//!     assert_eq!(correlation::get().as_ref(), Some(guard.id()));
//! }
//!
//! // The previous (absent) binding is restored once the guard drops.
//! assert!(correlation::get().is_none());
//! ```
//!
//! Async code should prefer [`scope`], which binds the id task-locally so
//! concurrent requests never observe each other's id:
//!
//! ```rust
//! # async fn handle() {
//! use selam_context as correlation;
//!
//! correlation::scope(None, async {
//!     let id = correlation::ensure();
//!     tracing::info!(correlation_id = %id, "processing request");
//! })
//! .await;
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/selam-context/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod context;
pub mod id;

pub use context::{clear, ensure, get, scope, scoped, set, CorrelationGuard};
pub use id::CorrelationId;
