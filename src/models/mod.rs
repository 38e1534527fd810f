//! Models Module
//!
//! Wire DTOs for the framed JSON request/response protocol.

mod requests;
mod responses;

// Re-export public types
pub use requests::CacheRequest;
pub use responses::CacheResponse;
