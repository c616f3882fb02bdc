//! Browse and study screen state, driven through [`StudyViewController`]

pub mod controller;
pub mod events;
pub mod state;

pub use controller::StudyViewController;
pub use events::{StudyEvent, StudyEventReceiver};
pub use state::{StudyProgress, StudySession, ViewMode, ViewState};
