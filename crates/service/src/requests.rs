use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};

use models::{NewServiceRequest, RequestStatus, ServiceRequest, Specialty, UserRecord};
use store::{keys, CollectionStore, Order};

use crate::errors::ServiceError;
use crate::policy::{ensure, Action};

/// Customer contact attached to a provider-queue row by the store join.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CustomerContact {
    pub full_name: String,
    pub phone: String,
    pub email: String,
}

/// One provider-queue entry: the request plus its customer's contact data
/// (placeholder values when the customer record is gone).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QueueEntry {
    #[serde(flatten)]
    pub request: ServiceRequest,
    #[serde(rename = "users")]
    pub customer: CustomerContact,
}

/// Booking lifecycle over the service-requests collection. The store
/// applies patches blindly; every transition is validated here, after a
/// policy check and before any write.
pub struct RequestDesk {
    store: Arc<CollectionStore>,
}

impl RequestDesk {
    pub fn new(store: Arc<CollectionStore>) -> Self {
        Self { store }
    }

    /// Customer books a service; the request starts `pending`.
    #[instrument(skip(self, actor, input), fields(customer_id = %actor.id))]
    pub async fn book(
        &self,
        actor: &UserRecord,
        input: NewServiceRequest,
    ) -> Result<ServiceRequest, ServiceError> {
        ensure(actor, &Action::BookService)?;
        let request = ServiceRequest::create(&actor.id, input)?;
        self.store
            .from(keys::SERVICE_REQUESTS)
            .insert(request.to_value()?)
            .await?;
        info!(request_id = %request.id, service = %request.service_type.as_str(), "request_booked");
        Ok(request)
    }

    /// One request by id.
    pub async fn get(&self, request_id: &str) -> Result<ServiceRequest, ServiceError> {
        let record = self
            .store
            .from(keys::SERVICE_REQUESTS)
            .filter_eq("id", request_id)
            .fetch_one()
            .await
            .map_err(|_| ServiceError::not_found("service request"))?;
        Ok(ServiceRequest::from_value(Value::Object(record))?)
    }

    /// A customer's own requests, newest first.
    pub async fn for_customer(&self, customer_id: &str) -> Result<Vec<ServiceRequest>, ServiceError> {
        let rows = self
            .store
            .from(keys::SERVICE_REQUESTS)
            .filter_eq("customer_id", customer_id)
            .order_by("created_at", Order::Desc)
            .fetch_many()
            .await?;
        rows.into_iter()
            .map(|r| ServiceRequest::from_value(Value::Object(r)).map_err(Into::into))
            .collect()
    }

    /// Open work for one trade, customer contact joined in, newest first.
    pub async fn open_for_provider(&self, specialty: Specialty) -> Result<Vec<QueueEntry>, ServiceError> {
        let rows = self
            .store
            .from(keys::SERVICE_REQUESTS)
            .filter_eq("service_type", specialty.as_str())
            .filter_in("status", RequestStatus::OPEN.iter().map(|s| s.as_str()))
            .join("users", keys::USERS, "customer_id", &["full_name", "phone", "email"])
            .order_by("created_at", Order::Desc)
            .fetch_many()
            .await?;
        rows.into_iter()
            .map(|r| {
                serde_json::from_value(Value::Object(r))
                    .map_err(|e| ServiceError::Storage(e.to_string()))
            })
            .collect()
    }

    /// Provider claims a pending request.
    #[instrument(skip(self, actor), fields(provider_id = %actor.id, request_id = %request_id))]
    pub async fn accept(&self, actor: &UserRecord, request_id: &str) -> Result<ServiceRequest, ServiceError> {
        let request = self.get(request_id).await?;
        ensure(actor, &Action::AcceptRequest(&request))?;
        self.transition(
            &request,
            RequestStatus::Accepted,
            json!({"provider_id": actor.id}),
        )
        .await
    }

    /// Assigned provider asks the customer to pay.
    #[instrument(skip(self, actor), fields(provider_id = %actor.id, request_id = %request_id))]
    pub async fn request_payment(&self, actor: &UserRecord, request_id: &str) -> Result<ServiceRequest, ServiceError> {
        let request = self.get(request_id).await?;
        ensure(actor, &Action::RequestPayment(&request))?;
        self.transition(&request, RequestStatus::PaymentPending, json!({})).await
    }

    /// Assigned provider confirms payment arrived; work begins.
    #[instrument(skip(self, actor), fields(provider_id = %actor.id, request_id = %request_id))]
    pub async fn confirm_payment(&self, actor: &UserRecord, request_id: &str) -> Result<ServiceRequest, ServiceError> {
        let request = self.get(request_id).await?;
        ensure(actor, &Action::ConfirmPayment(&request))?;
        self.transition(
            &request,
            RequestStatus::InProgress,
            json!({"payment_received": true, "payment_date": Utc::now().to_rfc3339()}),
        )
        .await
    }

    /// Assigned provider marks the job done.
    #[instrument(skip(self, actor), fields(provider_id = %actor.id, request_id = %request_id))]
    pub async fn complete(&self, actor: &UserRecord, request_id: &str) -> Result<ServiceRequest, ServiceError> {
        let request = self.get(request_id).await?;
        ensure(actor, &Action::CompleteRequest(&request))?;
        self.transition(&request, RequestStatus::Completed, json!({})).await
    }

    /// Owning customer backs out while the request is still early.
    #[instrument(skip(self, actor), fields(customer_id = %actor.id, request_id = %request_id))]
    pub async fn cancel(&self, actor: &UserRecord, request_id: &str) -> Result<ServiceRequest, ServiceError> {
        let request = self.get(request_id).await?;
        ensure(actor, &Action::CancelRequest(&request))?;
        self.transition(&request, RequestStatus::Cancelled, json!({})).await
    }

    async fn transition(
        &self,
        request: &ServiceRequest,
        next: RequestStatus,
        extra: Value,
    ) -> Result<ServiceRequest, ServiceError> {
        if !request.status.can_transition_to(next) {
            return Err(ServiceError::Validation(format!(
                "cannot move request from {} to {}",
                request.status.as_str(),
                next.as_str()
            )));
        }

        let mut patch = match extra {
            Value::Object(map) => map,
            _ => return Err(ServiceError::Storage("patch must be a JSON object".into())),
        };
        patch.insert("status".into(), Value::String(next.as_str().into()));

        let touched = self
            .store
            .from(keys::SERVICE_REQUESTS)
            .filter_eq("id", request.id.as_str())
            .update(Value::Object(patch))
            .await?;
        if touched == 0 {
            return Err(ServiceError::not_found("service request"));
        }

        info!(
            request_id = %request.id,
            from = %request.status.as_str(),
            to = %next.as_str(),
            "request_transitioned"
        );
        self.get(&request.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::{NewUser, UserRole};

    struct Fixture {
        desk: RequestDesk,
        customer: UserRecord,
        plumber: UserRecord,
        electrician: UserRecord,
    }

    async fn fixture() -> Fixture {
        let store = CollectionStore::in_memory();
        let mk = |email: &str, role: UserRole, trade: Option<Specialty>| {
            UserRecord::create(
                NewUser {
                    email: email.into(),
                    full_name: format!("User {email}"),
                    user_type: role,
                    service_type: trade,
                    phone: Some("555".into()),
                    address: None,
                },
                None,
            )
            .expect("user")
        };
        let customer = mk("jane@x.com", UserRole::Customer, None);
        let plumber = mk("pipes@x.com", UserRole::Provider, Some(Specialty::Plumber));
        let electrician = mk("sparky@x.com", UserRole::Provider, Some(Specialty::Electrician));
        for u in [&customer, &plumber, &electrician] {
            store
                .from(keys::USERS)
                .insert(u.to_value().expect("value"))
                .await
                .expect("insert");
        }
        Fixture { desk: RequestDesk::new(store), customer, plumber, electrician }
    }

    fn booking() -> NewServiceRequest {
        NewServiceRequest {
            service_type: Specialty::Plumber,
            problem_description: "Leaking sink".into(),
            image_url: None,
            preferred_date: "2026-03-01".into(),
            preferred_time: "10:00 AM".into(),
            customer_address: "12 Main St".into(),
        }
    }

    #[tokio::test]
    async fn booking_requires_customer_role() {
        let f = fixture().await;
        let req = f.desk.book(&f.customer, booking()).await.expect("book");
        assert_eq!(req.status, RequestStatus::Pending);
        assert!(matches!(
            f.desk.book(&f.plumber, booking()).await,
            Err(ServiceError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn full_lifecycle_reaches_completed() {
        let f = fixture().await;
        let req = f.desk.book(&f.customer, booking()).await.expect("book");

        let req = f.desk.accept(&f.plumber, &req.id).await.expect("accept");
        assert_eq!(req.status, RequestStatus::Accepted);
        assert_eq!(req.provider_id.as_deref(), Some(f.plumber.id.as_str()));

        let req = f.desk.request_payment(&f.plumber, &req.id).await.expect("request payment");
        assert_eq!(req.status, RequestStatus::PaymentPending);

        let req = f.desk.confirm_payment(&f.plumber, &req.id).await.expect("confirm payment");
        assert_eq!(req.status, RequestStatus::InProgress);
        assert_eq!(req.payment_received, Some(true));
        assert!(req.payment_date.is_some());

        let req = f.desk.complete(&f.plumber, &req.id).await.expect("complete");
        assert_eq!(req.status, RequestStatus::Completed);
    }

    #[tokio::test]
    async fn wrong_trade_cannot_accept() {
        let f = fixture().await;
        let req = f.desk.book(&f.customer, booking()).await.expect("book");
        assert!(matches!(
            f.desk.accept(&f.electrician, &req.id).await,
            Err(ServiceError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn unassigned_provider_cannot_work_request() {
        let f = fixture().await;
        let req = f.desk.book(&f.customer, booking()).await.expect("book");
        f.desk.accept(&f.plumber, &req.id).await.expect("accept");

        // a second plumber, never assigned
        let rival = UserRecord {
            id: "user-rival".into(),
            email: "rival@x.com".into(),
            ..f.plumber.clone()
        };
        assert!(matches!(
            f.desk.request_payment(&rival, &req.id).await,
            Err(ServiceError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn illegal_transitions_are_rejected_without_write() {
        let f = fixture().await;
        let req = f.desk.book(&f.customer, booking()).await.expect("book");
        f.desk.accept(&f.plumber, &req.id).await.expect("accept");

        // pending -> in_progress is not reachable without payment
        assert!(matches!(
            f.desk.confirm_payment(&f.plumber, &req.id).await,
            Err(ServiceError::Validation(_))
        ));
        // completing from accepted skips the paid states
        assert!(matches!(
            f.desk.complete(&f.plumber, &req.id).await,
            Err(ServiceError::Validation(_))
        ));
        let unchanged = f.desk.get(&req.id).await.expect("get");
        assert_eq!(unchanged.status, RequestStatus::Accepted);
    }

    #[tokio::test]
    async fn cancel_is_owner_only_and_early_only() {
        let f = fixture().await;
        let req = f.desk.book(&f.customer, booking()).await.expect("book");

        let cancelled = f.desk.cancel(&f.customer, &req.id).await.expect("cancel");
        assert_eq!(cancelled.status, RequestStatus::Cancelled);

        let req = f.desk.book(&f.customer, booking()).await.expect("book again");
        f.desk.accept(&f.plumber, &req.id).await.expect("accept");
        f.desk.request_payment(&f.plumber, &req.id).await.expect("request payment");
        assert!(matches!(
            f.desk.cancel(&f.customer, &req.id).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn provider_queue_joins_customer_contact() {
        let f = fixture().await;
        f.desk.book(&f.customer, booking()).await.expect("book");
        let queue = f.desk.open_for_provider(Specialty::Plumber).await.expect("queue");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].customer.email, "jane@x.com");
        assert_eq!(queue[0].request.status, RequestStatus::Pending);

        assert!(f
            .desk
            .open_for_provider(Specialty::Electrician)
            .await
            .expect("queue")
            .is_empty());
    }

    #[tokio::test]
    async fn queue_excludes_closed_requests_and_orders_newest_first() {
        let f = fixture().await;
        let first = f.desk.book(&f.customer, booking()).await.expect("book");
        let second = f.desk.book(&f.customer, booking()).await.expect("book");
        f.desk.cancel(&f.customer, &first.id).await.expect("cancel");

        let queue = f.desk.open_for_provider(Specialty::Plumber).await.expect("queue");
        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].request.id, second.id);
    }

    #[tokio::test]
    async fn queue_shows_placeholder_for_missing_customer() {
        let store = CollectionStore::in_memory();
        let desk = RequestDesk::new(store.clone());
        store
            .from(keys::SERVICE_REQUESTS)
            .insert(
                ServiceRequest::create("user-ghost", booking())
                    .expect("request")
                    .to_value()
                    .expect("value"),
            )
            .await
            .expect("insert");

        let queue = desk.open_for_provider(Specialty::Plumber).await.expect("queue");
        assert_eq!(queue[0].customer.full_name, "Unknown");
        assert_eq!(queue[0].customer.phone, "Not provided");
    }
}
