pub mod filter_bank;
pub mod processor;
pub mod shared;

pub use filter_bank::{ChannelState, FilterBank, Sample};
pub use processor::Processor;
pub use shared::SharedFilterBank;
