//! Paystack adapter tests against a local stub server

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use core_kernel::{AdapterHealth, Currency, HealthCheckable};
use domain_payments::gateway::{InitializeTransaction, TransferRecipientRequest, TransferRequest};
use domain_payments::{GatewayError, PaymentGateway};
use infra_gateway::{PaystackConfig, PaystackGateway};

const SECRET: &str = "sk_test_stub";

/// Requests seen by the stub, as (path, authorization header, body)
type Seen = Arc<Mutex<Vec<(String, String, Value)>>>;

fn auth(headers: &HeaderMap) -> String {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

async fn start_stub() -> (String, Seen) {
    let seen: Seen = Arc::default();

    let app = Router::new()
        .route(
            "/transaction/initialize",
            post(|State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>| async move {
                let reference = body["reference"].clone();
                seen.lock().await.push(("/transaction/initialize".into(), auth(&headers), body));
                Json(json!({
                    "status": true,
                    "message": "Authorization URL created",
                    "data": {
                        "authorization_url": "https://checkout.paystack.com/abc",
                        "access_code": "abc",
                        "reference": reference
                    }
                }))
            }),
        )
        .route(
            "/transaction/verify/:reference",
            get(|Path(reference): Path<String>| async move {
                Json(json!({
                    "status": true,
                    "message": "Verification successful",
                    "data": {
                        "status": "success",
                        "reference": reference,
                        "amount": 50000,
                        "paid_at": "2024-06-01T10:15:00.000Z"
                    }
                }))
            }),
        )
        .route(
            "/transferrecipient",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"status": false, "message": "Account number is invalid"})),
                )
            }),
        )
        .route(
            "/transfer",
            post(|| async {
                (StatusCode::BAD_GATEWAY, "<html>upstream down</html>")
            }),
        )
        .route(
            "/refund",
            post(|| async {
                Json(json!({
                    "status": true,
                    "message": "Refund has been queued for processing",
                    "data": {"id": 3018284, "status": "pending", "transaction": {"reference": "MOV_1"}}
                }))
            }),
        )
        .route(
            "/refund/:reference",
            get(|| async { Json(json!({"status": true, "message": "ok", "data": "not an object"})) }),
        )
        .route("/bank", get(|| async { Json(json!({"status": true, "message": "ok", "data": []})) }))
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), seen)
}

fn gateway(base_url: String) -> PaystackGateway {
    PaystackGateway::new(PaystackConfig {
        base_url,
        secret_key: SECRET.to_string(),
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_initialize_sends_minor_units_with_bearer_key() {
    let (url, seen) = start_stub().await;
    let gateway = gateway(url);

    let session = gateway
        .initialize_transaction(InitializeTransaction {
            email: "ada@example.com".into(),
            amount_minor: 50000,
            currency: Currency::NGN,
            reference: "MOV_1".into(),
            callback_url: None,
            metadata: json!({"bookingId": "b-1"}),
        })
        .await
        .unwrap();

    assert_eq!(session.authorization_url, "https://checkout.paystack.com/abc");
    assert_eq!(session.reference, "MOV_1");

    let seen = seen.lock().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].1, format!("Bearer {SECRET}"));
    assert_eq!(seen[0].2["amount"], 50000);
    assert_eq!(seen[0].2["currency"], "NGN");
    assert_eq!(seen[0].2["metadata"]["bookingId"], "b-1");
    assert!(seen[0].2.get("callback_url").is_none());
}

#[tokio::test]
async fn test_verify_parses_status_and_paid_at() {
    let (url, _) = start_stub().await;

    let verification = gateway(url).verify_transaction("MOV_9").await.unwrap();

    assert!(verification.is_success());
    assert_eq!(verification.reference, "MOV_9");
    assert_eq!(verification.amount_minor, 50000);
    assert_eq!(
        verification.paid_at.map(|t| t.to_rfc3339()),
        Some("2024-06-01T10:15:00+00:00".to_string())
    );
}

#[tokio::test]
async fn test_client_error_is_rejection_with_message() {
    let (url, _) = start_stub().await;

    let err = gateway(url)
        .create_transfer_recipient(TransferRecipientRequest {
            account_name: "Haul Masters".into(),
            account_number: "0123456789".into(),
            bank_code: "058".into(),
            currency: Currency::NGN,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        GatewayError::Rejected { status: Some(400), ref message } if message == "Account number is invalid"
    ));
}

#[tokio::test]
async fn test_server_error_is_transport() {
    let (url, _) = start_stub().await;

    let err = gateway(url)
        .create_transfer(TransferRequest {
            amount_minor: 45000,
            currency: Currency::NGN,
            recipient_code: "RCP_1".into(),
            reference: "PAYOUT-1".into(),
            reason: "Payout for booking 1".into(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Transport(ref m) if m.contains("502")));
}

#[tokio::test]
async fn test_refund_reference_comes_from_numeric_id() {
    let (url, _) = start_stub().await;

    let receipt = gateway(url).create_refund("MOV_1").await.unwrap();

    assert_eq!(receipt.reference, "3018284");
    assert_eq!(receipt.status, "pending");
}

#[tokio::test]
async fn test_unexpected_data_shape_is_decode_error() {
    let (url, _) = start_stub().await;

    let err = gateway(url).fetch_refund("3018284").await.unwrap_err();

    assert!(matches!(err, GatewayError::Decode(_)));
}

#[tokio::test]
async fn test_unreachable_gateway() {
    let (url, _) = start_stub().await;
    assert_eq!(gateway(url).health_check().await.status, AdapterHealth::Healthy);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway = gateway(format!("http://{addr}"));
    let err = gateway.verify_transaction("MOV_1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
    assert_eq!(gateway.health_check().await.status, AdapterHealth::Unhealthy);
}
