use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::ModelError;
use crate::user::Specialty;

/// Booking lifecycle. Transitions run forward only; cancellation is the
/// single escape hatch and closes early states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    PaymentPending,
    InProgress,
    Completed,
    Cancelled,
}

impl RequestStatus {
    /// Statuses a provider queue cares about.
    pub const OPEN: &'static [RequestStatus] = &[
        RequestStatus::Pending,
        RequestStatus::Accepted,
        RequestStatus::PaymentPending,
        RequestStatus::InProgress,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::PaymentPending => "payment_pending",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
            RequestStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Completed | RequestStatus::Cancelled)
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        use RequestStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Accepted, PaymentPending)
                | (PaymentPending, InProgress)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: String,
    pub customer_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    pub service_type: Specialty,
    pub problem_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub preferred_date: String,
    pub preferred_time: String,
    pub customer_address: String,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_received: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    pub created_at: String,
}

/// Booking input supplied by a customer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewServiceRequest {
    pub service_type: Specialty,
    pub problem_description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub preferred_date: String,
    pub preferred_time: String,
    pub customer_address: String,
}

impl NewServiceRequest {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.problem_description.trim().is_empty() {
            return Err(ModelError::Validation("problem description required".into()));
        }
        if self.customer_address.trim().is_empty() {
            return Err(ModelError::Validation("address required".into()));
        }
        if self.preferred_date.trim().is_empty() || self.preferred_time.trim().is_empty() {
            return Err(ModelError::Validation("preferred date and time required".into()));
        }
        Ok(())
    }
}

impl ServiceRequest {
    pub fn create(customer_id: &str, input: NewServiceRequest) -> Result<Self, ModelError> {
        input.validate()?;
        Ok(Self {
            id: format!("req-{}", Uuid::new_v4()),
            customer_id: customer_id.to_string(),
            provider_id: None,
            service_type: input.service_type,
            problem_description: input.problem_description,
            image_url: input.image_url,
            preferred_date: input.preferred_date,
            preferred_time: input.preferred_time,
            customer_address: input.customer_address,
            status: RequestStatus::Pending,
            payment_received: None,
            payment_date: None,
            created_at: Utc::now().to_rfc3339(),
        })
    }

    pub fn to_value(&self) -> Result<Value, ModelError> {
        serde_json::to_value(self).map_err(|e| ModelError::Serialization(e.to_string()))
    }

    pub fn from_value(value: Value) -> Result<Self, ModelError> {
        serde_json::from_value(value).map_err(|e| ModelError::Serialization(e.to_string()))
    }
}
