pub mod analyzer;
pub mod batch;
pub mod events;
pub mod filename;
pub mod progress;
pub mod scanner;
