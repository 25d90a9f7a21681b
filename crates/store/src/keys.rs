//! Fixed storage keys. Collections are persisted one JSON array per key;
//! the session marker is a single object.

pub const USERS: &str = "demo_users";
pub const SERVICE_REQUESTS: &str = "demo_service_requests";
pub const CURRENT_USER: &str = "current_user";
