use tokio::sync::mpsc;

/// Capacity of the event channel handed to the host
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Requests the controller makes of the hosting UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudyEvent {
    /// The credential was rejected; the host should send the user to sign in
    RedirectToLogin,
}

pub type StudyEventReceiver = mpsc::Receiver<StudyEvent>;

pub(crate) fn channel() -> (mpsc::Sender<StudyEvent>, StudyEventReceiver) {
    mpsc::channel(EVENT_CHANNEL_CAPACITY)
}
