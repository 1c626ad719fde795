// Utility functions
// Signing and request inspection helpers.

pub mod request_info;
pub mod signature;

pub use request_info::{extract_client_ip, extract_origin, is_local_origin};
pub use signature::{generate_signature, verify_signature, SignedRequest};
