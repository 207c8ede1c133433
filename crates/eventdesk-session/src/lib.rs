//! Event edit session: draft state, save and delete orchestration.
//!
//! An [`EventEditSession`] holds the working copy of one event while the user
//! edits it. Saving validates the draft, persists it through the
//! [`EventStore`](eventdesk_providers::EventStore) and then tells guests
//! through the [`UpdateDistributor`](eventdesk_providers::UpdateDistributor).
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use chrono::Utc;
//! use eventdesk_core::{CalendarDescriptor, Viewer};
//! use eventdesk_providers::{RecordingDistributor, RecordingStore};
//! use eventdesk_session::{EventEditSession, SaveOutcome, SessionContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let ctx = SessionContext::new(
//!         Viewer::new(["me@example.com"]),
//!         vec![CalendarDescriptor::owned("own", "Private")],
//!         chrono_tz::Europe::Berlin,
//!         Arc::new(RecordingStore::new()),
//!         Arc::new(RecordingDistributor::new()),
//!     );
//!
//!     let mut session = EventEditSession::new_event(ctx, Utc::now())?;
//!     session.summary().set("Planning".to_string());
//!     session.add_attendee("guest@example.com");
//!
//!     if let SaveOutcome::AwaitingConfirmation(pending) = session.save().await? {
//!         pending.resume(true).await?;
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod delete;
mod draft;
mod error;
mod observable;
mod save;
mod session;


pub use config::{LoggingSettings, SessionConfig};
pub use delete::{DeleteOrchestrator, DeleteOutcome};
pub use draft::{EventDraft, EventSpan};
pub use error::{SessionError, SessionResult};
pub use observable::Observable;
pub use save::{
    ConfirmOutcome, PendingSave, PersistAction, Response, SaveOrchestrator, SaveOutcome, SavePlan,
    Validated,
};
pub use session::{EventEditSession, SessionContext};
