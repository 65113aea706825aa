pub mod cpp;

#[cfg(feature = "python")]
pub mod python;
