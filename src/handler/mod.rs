//! Request handler module
//!
//! Dispatches requests to mounts, runs each mount's filter chain and serves
//! files once every filter has passed.

pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
