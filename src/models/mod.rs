//! Request and Response models for the remote cache protocol
//!
//! These DTOs are shared by the axum server and by
//! [`crate::remote::HttpRemoteStore`], so both ends agree on the wire format.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::PutRequest;
pub use responses::{ApiResponse, HealthResponse, StatsResponse};
