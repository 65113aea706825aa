//! Streaming multichannel Butterworth band-pass filter bank.
//!
//! [`filters::design`] turns band edges into a cascade of second-order
//! sections; [`processing::FilterBank`] applies that cascade to every channel
//! of each incoming buffer in place, carrying the delay state of each channel
//! from one buffer to the next so that buffer boundaries leave no trace.
//! [`processing::Processor`] wraps the bank with the host lifecycle
//! (settings changes, acquisition and recording notifications), and
//! [`bindings`] exposes it to C++ hosts and, with the `python` feature, to
//! Python.

pub mod bindings;
pub mod config;
pub mod error;
pub mod filters;
pub mod local;
pub mod processing;
pub mod utils;

pub use error::{ConfigError, FilterError, Result};
pub use filters::{design, Cascade, FilterSpec, SecondOrderSection};
pub use processing::{ChannelState, FilterBank, Processor, SharedFilterBank};

#[cfg(feature = "python")]
pub use bindings::python::neural_bandpass;
