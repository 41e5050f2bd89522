//! HTTP protocol layer module
//!
//! Response builders, caching validators and content types, decoupled from
//! the filter and dispatch logic.

pub mod cache;
pub mod mime;
pub mod response;

// Re-export commonly used builders
pub use response::{
    apply_annotations, build_304_response, build_400_response, build_404_response,
    build_405_response, build_413_response, build_delegation_exhausted_response,
    build_file_response, build_options_response, build_terminal_response,
};
