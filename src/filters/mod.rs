pub mod butterworth;
pub mod sos;

pub use butterworth::{design, FilterSpec};
pub use sos::{Cascade, SecondOrderSection};
