use serde_json::json;
use uuid::Uuid;

use configs::AppConfig;
use models::{NewServiceRequest, NewUser, RequestStatus, Specialty, UserRole};
use service::auth::SignUpInput;
use servicehub::ServiceHub;
use store::{keys, Order};

fn ephemeral_config() -> AppConfig {
    common::utils::logging::init_logging_default();
    let mut cfg = AppConfig::default();
    cfg.storage.ephemeral = true;
    cfg.demo.seed = false;
    cfg
}

fn booking(service_type: Specialty) -> NewServiceRequest {
    NewServiceRequest {
        service_type,
        problem_description: "Water heater makes a banging noise".into(),
        image_url: None,
        preferred_date: "2026-09-01".into(),
        preferred_time: "9:00 AM".into(),
        customer_address: "77 Canal Road".into(),
    }
}

#[tokio::test]
async fn raw_store_join_scenario() -> anyhow::Result<()> {
    // the storage-level scenario: one user, one request, joined fetch
    let hub = ServiceHub::open(&ephemeral_config()).await?;

    hub.store
        .from(keys::USERS)
        .insert(json!({"id": "u1", "email": "a@x.com", "user_type": "customer"}))
        .await?;
    hub.store
        .from(keys::SERVICE_REQUESTS)
        .insert(json!({
            "id": "r1",
            "customer_id": "u1",
            "service_type": "plumber",
            "status": "pending",
        }))
        .await?;

    let rows = hub
        .store
        .from(keys::SERVICE_REQUESTS)
        .join("users", keys::USERS, "customer_id", &["full_name", "phone", "email"])
        .fetch_many()
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["users"]["email"], "a@x.com");

    hub.store
        .from(keys::SERVICE_REQUESTS)
        .filter_eq("id", "r1")
        .update(json!({"status": "completed"}))
        .await?;
    let row = hub
        .store
        .from(keys::SERVICE_REQUESTS)
        .filter_eq("id", "r1")
        .fetch_one()
        .await?;
    assert_eq!(row["status"], "completed");
    Ok(())
}

#[tokio::test]
async fn marketplace_flow_from_signup_to_completion() -> anyhow::Result<()> {
    let hub = ServiceHub::open(&ephemeral_config()).await?;

    let customer = hub
        .auth
        .sign_up(SignUpInput {
            profile: NewUser {
                email: "kim@x.com".into(),
                full_name: "Kim Customer".into(),
                user_type: UserRole::Customer,
                service_type: None,
                phone: Some("0700123456".into()),
                address: Some("77 Canal Road".into()),
            },
            password: "hunter22".into(),
        })
        .await?;

    let plumber = hub
        .auth
        .sign_up(SignUpInput {
            profile: NewUser {
                email: "pat@x.com".into(),
                full_name: "Pat Plumber".into(),
                user_type: UserRole::Provider,
                service_type: Some(Specialty::Plumber),
                phone: Some("0700999888".into()),
                address: None,
            },
            password: "wrench99".into(),
        })
        .await?;

    let request = hub.requests.book(&customer, booking(Specialty::Plumber)).await?;

    // the provider sees the booking with the customer's contact details
    let queue = hub.requests.open_for_provider(Specialty::Plumber).await?;
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].customer.full_name, "Kim Customer");
    assert_eq!(queue[0].customer.phone, "0700123456");

    let accepted = hub.requests.accept(&plumber, &request.id).await?;
    assert_eq!(accepted.provider_id.as_deref(), Some(plumber.id.as_str()));

    hub.requests.request_payment(&plumber, &request.id).await?;
    hub.requests.confirm_payment(&plumber, &request.id).await?;
    let done = hub.requests.complete(&plumber, &request.id).await?;
    assert_eq!(done.status, RequestStatus::Completed);

    // the customer's own view reflects the terminal state
    let mine = hub.requests.for_customer(&customer.id).await?;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].status, RequestStatus::Completed);

    // completed work no longer shows in the provider queue
    assert!(hub.requests.open_for_provider(Specialty::Plumber).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn policy_denies_cross_role_mutations() -> anyhow::Result<()> {
    let hub = ServiceHub::open(&ephemeral_config()).await?;

    let customer = hub
        .auth
        .sign_up(SignUpInput {
            profile: NewUser {
                email: "kim@x.com".into(),
                full_name: "Kim Customer".into(),
                user_type: UserRole::Customer,
                service_type: None,
                phone: None,
                address: None,
            },
            password: "hunter22".into(),
        })
        .await?;
    let request = hub.requests.book(&customer, booking(Specialty::Electrician)).await?;

    // customers cannot accept their own request, and non-admins cannot list users
    assert!(hub.requests.accept(&customer, &request.id).await.is_err());
    assert!(hub.users.list(&customer).await.is_err());
    Ok(())
}

#[tokio::test]
async fn demo_seed_supports_the_provider_dashboard_queries() -> anyhow::Result<()> {
    let mut cfg = ephemeral_config();
    cfg.demo.seed = true;
    let hub = ServiceHub::open(&cfg).await?;

    // provider dashboard: open electrician work with customer join,
    // newest first
    let rows = hub
        .store
        .from(keys::SERVICE_REQUESTS)
        .filter_eq("service_type", "electrician")
        .filter_in("status", ["pending", "accepted", "payment_pending", "in_progress"])
        .join("users", keys::USERS, "customer_id", &["full_name", "phone", "email"])
        .order_by("created_at", Order::Desc)
        .fetch_many()
        .await?;
    assert_eq!(rows.len(), 3);
    assert!(rows
        .iter()
        .all(|r| r["users"]["email"] == "customer@demo.com"));
    let stamps: Vec<&str> = rows
        .iter()
        .map(|r| r["created_at"].as_str().expect("created_at"))
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] >= w[1]));

    // the seeded admin profile resolves, as does an unseeded admin- id
    let admin = hub.users.profile("admin-admin-demo-com").await?;
    assert_eq!(admin.user_type, UserRole::Admin);
    let ghost = hub.users.profile("admin-ghost").await?;
    assert_eq!(ghost.full_name, "Demo Admin");
    Ok(())
}

#[tokio::test]
async fn file_backed_hub_persists_across_reopen() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join(format!("servicehub_e2e_{}", Uuid::new_v4()));
    let mut cfg = AppConfig::default();
    cfg.storage.data_dir = dir.to_string_lossy().into_owned();
    cfg.demo.seed = false;

    {
        let hub = ServiceHub::open(&cfg).await?;
        hub.auth
            .sign_up(SignUpInput {
                profile: NewUser {
                    email: "kim@x.com".into(),
                    full_name: "Kim Customer".into(),
                    user_type: UserRole::Customer,
                    service_type: None,
                    phone: None,
                    address: None,
                },
                password: "hunter22".into(),
            })
            .await?;
    }

    let hub = ServiceHub::open(&cfg).await?;
    let session = hub.auth.sign_in("kim@x.com", "hunter22").await?;
    assert_eq!(session.user.id, "user-kim-x-com");

    // session marker landed on disk too and clears on sign-out
    assert!(hub.auth.current_user().await.is_some());
    hub.auth.sign_out().await;
    assert!(hub.auth.current_user().await.is_none());

    let _ = tokio::fs::remove_dir_all(&dir).await;
    Ok(())
}

#[tokio::test]
async fn admin_removes_user_and_joins_degrade_to_placeholder() -> anyhow::Result<()> {
    let mut cfg = ephemeral_config();
    cfg.demo.seed = true;
    let hub = ServiceHub::open(&cfg).await?;

    let admin = hub.users.profile("admin-admin-demo-com").await?;
    hub.users.delete(&admin, "user-customer-demo-com").await?;

    let queue = hub.requests.open_for_provider(Specialty::Electrician).await?;
    assert!(!queue.is_empty());
    assert!(queue.iter().all(|entry| entry.customer.full_name == "Unknown"));
    Ok(())
}
