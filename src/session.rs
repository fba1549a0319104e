//! Chat session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;
pub mod upload;


pub use effect::{Effect, Notice};
pub use event::{Event, MessageStamp};
pub use state::{ChatMessage, ChatSession, SessionPhase, SessionState, Sender};
pub use transition::{transition, TransitionError};
pub use upload::{validate_upload, UploadRejection};
