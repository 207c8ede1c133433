//! Collaborators of an edit session.
//!
//! This crate provides the seams between an edit session and the outside
//! world:
//!
//! - [`EventStore`] - Loads reminders and persists events
//! - [`UpdateDistributor`] - Sends invites, updates, cancellations and responses
//! - [`ProviderError`] - Error type shared by both
//! - [`RecordingStore`] / [`RecordingDistributor`] - In-memory implementations
//!   that log their calls
//!
//! # Architecture
//!
//! ```text
//!              ┌──────────────────┐
//!              │ EventEditSession │
//!              └────────┬─────────┘
//!          save/delete  │
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//! ┌─────────────────┐      ┌───────────────────┐
//! │   EventStore    │      │ UpdateDistributor │
//! └─────────────────┘      └───────────────────┘
//!   persist first            then notify guests
//! ```

pub mod distributor;
pub mod error;
pub mod recording;
pub mod store;

// Re-export main types at crate root
pub use distributor::UpdateDistributor;
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use recording::{
    DistributorCall, MessageKind, RecordingDistributor, RecordingStore, StoreCall, StoreOp,
};
pub use store::{BoxFuture, ErrorStore, EventStore};
