//! Domain records for the marketplace: users, service requests, and the
//! booking status lifecycle. Records serialize to the schema-less JSON
//! shapes the collection store persists.

pub mod errors;
pub mod request;
pub mod user;

pub use errors::ModelError;
pub use request::{NewServiceRequest, RequestStatus, ServiceRequest};
pub use user::{id_for_email, NewUser, Specialty, UserRecord, UserRole};
