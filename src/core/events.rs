use std::path::PathBuf;
use tokio::sync::mpsc;

#[derive(Debug, Clone)]
pub enum Event {
    // Batch state
    ScanStarted { roots: Vec<PathBuf> },
    BatchCompleted { total_files: usize, unsafe_files: usize, duration_ms: u64 },

    // Per file
    FileScanned { path: PathBuf, is_safe: bool, threats: usize },
    ScanFailed { path: PathBuf, error: String },
}

pub type EventSender = mpsc::UnboundedSender<Event>;
pub type EventReceiver = mpsc::UnboundedReceiver<Event>;

pub fn create_event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}
