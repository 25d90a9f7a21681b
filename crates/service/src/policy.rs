//! Explicit authorization: one predicate over (actor, action, resource),
//! consulted before every mutating operation instead of scattering role
//! string checks through calling code.

use models::{ServiceRequest, UserRecord, UserRole};

use crate::errors::ServiceError;

#[derive(Debug)]
pub enum Action<'a> {
    BookService,
    CancelRequest(&'a ServiceRequest),
    AcceptRequest(&'a ServiceRequest),
    RequestPayment(&'a ServiceRequest),
    ConfirmPayment(&'a ServiceRequest),
    CompleteRequest(&'a ServiceRequest),
    EditProfile { owner_id: &'a str },
    ListUsers,
    DeleteUser,
}

pub fn is_allowed(actor: &UserRecord, action: &Action<'_>) -> bool {
    match action {
        Action::BookService => actor.user_type == UserRole::Customer,
        Action::CancelRequest(req) => {
            actor.user_type == UserRole::Customer && req.customer_id == actor.id
        }
        Action::AcceptRequest(req) => {
            actor.user_type == UserRole::Provider
                && actor.service_type == Some(req.service_type)
        }
        Action::RequestPayment(req)
        | Action::ConfirmPayment(req)
        | Action::CompleteRequest(req) => {
            actor.user_type == UserRole::Provider
                && req.provider_id.as_deref() == Some(actor.id.as_str())
        }
        Action::EditProfile { owner_id } => {
            actor.user_type == UserRole::Admin || actor.id == *owner_id
        }
        Action::ListUsers | Action::DeleteUser => actor.user_type == UserRole::Admin,
    }
}

/// Deny becomes `Forbidden`; services call this ahead of any store write.
pub fn ensure(actor: &UserRecord, action: &Action<'_>) -> Result<(), ServiceError> {
    if is_allowed(actor, action) {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}
