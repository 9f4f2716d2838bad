//! Common code shared between `detect_server` and `detect_client`.
pub mod protocol;
