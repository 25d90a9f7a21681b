//! Demo-data seeding. Idempotent: collections that already hold rows are
//! left alone, so restarts never duplicate accounts.

use chrono::{Duration, Utc};
use tracing::info;

use models::{
    NewServiceRequest, NewUser, RequestStatus, ServiceRequest, Specialty, UserRecord, UserRole,
};
use store::{keys, CollectionStore};

use crate::auth::hash_password;
use crate::errors::ServiceError;

/// Seed the demo accounts and a few bookings for the demo customer.
/// All seeded accounts share `demo_password`.
pub async fn ensure_demo_data(
    store: &CollectionStore,
    demo_password: &str,
) -> Result<(), ServiceError> {
    if !store.is_empty(keys::USERS).await {
        return Ok(());
    }

    let hash = hash_password(demo_password)?;
    let mk = |email: &str, name: &str, role: UserRole, trade: Option<Specialty>, phone: &str, addr: &str| {
        UserRecord::create(
            NewUser {
                email: email.into(),
                full_name: name.into(),
                user_type: role,
                service_type: trade,
                phone: Some(phone.into()),
                address: Some(addr.into()),
            },
            Some(hash.clone()),
        )
    };

    let customer = mk(
        "customer@demo.com",
        "Demo Customer",
        UserRole::Customer,
        None,
        "1234567890",
        "123 Demo Street, Demo City",
    )?;
    let electrician = mk(
        "electrician@demo.com",
        "Demo Electrician",
        UserRole::Provider,
        Some(Specialty::Electrician),
        "1234567891",
        "456 Service Ave, Demo City",
    )?;
    let plumber = mk(
        "plumber@demo.com",
        "Demo Plumber",
        UserRole::Provider,
        Some(Specialty::Plumber),
        "1234567892",
        "789 Repair Rd, Demo City",
    )?;
    let admin = UserRecord::create(
        NewUser {
            email: "admin@demo.com".into(),
            full_name: "Demo Admin".into(),
            user_type: UserRole::Admin,
            service_type: None,
            phone: None,
            address: None,
        },
        Some(hash),
    )?;

    for user in [&customer, &electrician, &plumber, &admin] {
        store.from(keys::USERS).insert(user.to_value()?).await?;
    }

    if store.is_empty(keys::SERVICE_REQUESTS).await {
        let now = Utc::now();
        let seeds = [
            (
                "Power outage in my apartment. Need urgent help!",
                "10:00 AM",
                RequestStatus::Pending,
            ),
            (
                "Need to install new ceiling fan in living room",
                "2:00 PM",
                RequestStatus::PaymentPending,
            ),
            (
                "Short circuit in kitchen, sparks coming from outlet",
                "11:30 AM",
                RequestStatus::InProgress,
            ),
        ];

        for (age, (description, time, status)) in seeds.into_iter().enumerate() {
            let preferred = now + Duration::days(age as i64 + 1);
            let mut request = ServiceRequest::create(
                &customer.id,
                NewServiceRequest {
                    service_type: Specialty::Electrician,
                    problem_description: description.into(),
                    image_url: None,
                    preferred_date: preferred.format("%Y-%m-%d").to_string(),
                    preferred_time: time.into(),
                    customer_address: "123 Demo Street, Apt 4B, Demo City".into(),
                },
            )?;
            request.created_at = (now - Duration::days(age as i64)).to_rfc3339();
            request.status = status;
            if status != RequestStatus::Pending {
                // accepted work always carries its provider
                request.provider_id = Some(electrician.id.clone());
            }
            if status == RequestStatus::InProgress {
                request.payment_received = Some(true);
                request.payment_date = Some(now.to_rfc3339());
            }
            store
                .from(keys::SERVICE_REQUESTS)
                .insert(request.to_value()?)
                .await?;
        }
    }

    info!("demo data seeded");
    Ok(())
}
