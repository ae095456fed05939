// Signage API Library
//
// HTTP surface for devices (heartbeat polling) and the operator console

pub mod http;

// Re-export commonly used types
pub use http::{create_router, AppState};
