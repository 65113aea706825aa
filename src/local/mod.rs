pub mod process_file;
pub mod signal_source;

pub use signal_source::{SignalSource, Tone};
