//! Client of the detection server.
pub mod client;
#[cfg(feature = "camera")]
pub mod sensors;

/// Error type of camera access.
#[cfg(feature = "camera")]
pub type Error = Box<dyn std::error::Error + Send + Sync>;
