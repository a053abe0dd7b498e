//! Batch sync behaviour against a wiremock server.

use std::time::Duration;

use fbsync_core::{ConfigError, ProductSyncRecord, ProtocolVariant, SyncCredentials};
use fbsync_sellercenter::{ClientSettings, SellerCenterClient, SyncError, SyncOutcome};
use rust_decimal::Decimal;
use tokio::sync::watch;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn settings(base_url: &str) -> ClientSettings {
    ClientSettings {
        base_url: base_url.to_owned(),
        protocol: ProtocolVariant::Xml,
        inter_request_delay_ms: 0,
        max_retries: 0,
        retry_backoff_base_ms: 0,
        ..ClientSettings::default()
    }
}

fn test_client(base_url: &str) -> SellerCenterClient {
    SellerCenterClient::new(settings(base_url)).expect("client construction should not fail")
}

fn creds() -> SyncCredentials {
    SyncCredentials::new("seller@example.com", "topsecret")
}

fn record(sku: &str) -> ProductSyncRecord {
    ProductSyncRecord {
        sku: sku.to_owned(),
        name: format!("Producto {sku}"),
        price: Decimal::new(1990, 2),
        quantity: 3,
        last_synced_at: None,
    }
}

#[tokio::test]
async fn one_failing_product_does_not_stop_the_batch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<SellerSku>BAD-1</SellerSku>"))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = vec![record("OK-1"), record("BAD-1"), record("OK-2")];
    let results = client
        .sync_many(&records, &creds())
        .await
        .expect("credentials are present");

    assert_eq!(results.len(), 3);
    let skus: Vec<&str> = results.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["OK-1", "BAD-1", "OK-2"]);
    assert!(results[0].is_success());
    assert!(results[2].is_success());
    assert_eq!(
        results[1].outcome,
        SyncOutcome::HttpError {
            status: 500,
            body: "internal error".to_owned()
        }
    );
}

#[tokio::test]
async fn empty_batch_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let results = client.sync_many(&[], &creds()).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn missing_credentials_abort_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = vec![record("OK-1"), record("OK-2")];

    let err = client
        .sync_many(&records, &SyncCredentials::new("", "topsecret"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Configuration(ConfigError::MissingCredential("falabella.user"))
    ));

    let err = client
        .sync_many(&records, &SyncCredentials::new("seller@example.com", " "))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::Configuration(ConfigError::MissingCredential("falabella.token"))
    ));
}

#[tokio::test]
async fn unreachable_server_is_transport_error() {
    // Nothing listens on port 1.
    let client = test_client("http://127.0.0.1:1/");
    let results = client
        .sync_many(&[record("OK-1")], &creds())
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert!(matches!(
        results[0].outcome,
        SyncOutcome::TransportError { .. }
    ));
    assert!(results[0].synced_at().is_none());
}

#[tokio::test]
async fn cancelled_run_starts_no_products() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let (cancel_tx, cancel_rx) = watch::channel(false);
    cancel_tx.send(true).unwrap();

    let records = vec![record("OK-1"), record("OK-2")];
    let results = client
        .sync_many_until(&records, &creds(), &cancel_rx)
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.outcome == SyncOutcome::Cancelled));
}

/// Accepts the update and flips the run's cancel flag while answering.
struct CancelWhileResponding(watch::Sender<bool>);

impl Respond for CancelWhileResponding {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.0.send_replace(true);
        ResponseTemplate::new(200)
    }
}

#[tokio::test]
async fn cancelling_mid_run_finishes_in_flight_product_only() {
    let server = MockServer::start().await;
    let (cancel_tx, cancel_rx) = watch::channel(false);

    Mock::given(method("POST"))
        .respond_with(CancelWhileResponding(cancel_tx))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let records = vec![record("OK-1"), record("OK-2"), record("OK-3")];
    let results = client
        .sync_many_until(&records, &creds(), &cancel_rx)
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert!(results[0].is_success(), "in-flight product must complete");
    assert_eq!(results[1].outcome, SyncOutcome::Cancelled);
    assert_eq!(results[2].outcome, SyncOutcome::Cancelled);
}

#[tokio::test]
async fn slow_response_times_out_without_stalling_the_batch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<SellerSku>SLOW-1</SellerSku>"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(4)))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = SellerCenterClient::new(ClientSettings {
        timeout_secs: 1,
        ..settings(&server.uri())
    })
    .unwrap();

    let records = vec![record("SLOW-1"), record("OK-1")];
    let results = client.sync_many(&records, &creds()).await.unwrap();

    assert!(matches!(
        results[0].outcome,
        SyncOutcome::TransportError { .. }
    ));
    assert!(results[1].is_success());
}

#[tokio::test]
async fn transient_failure_is_retried_within_the_product() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = SellerCenterClient::new(ClientSettings {
        max_retries: 2,
        ..settings(&server.uri())
    })
    .unwrap();

    let results = client
        .sync_many(&[record("OK-1")], &creds())
        .await
        .unwrap();
    assert!(results[0].is_success());
}

#[tokio::test]
async fn concurrent_batch_keeps_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(5)
        .mount(&server)
        .await;

    let client = SellerCenterClient::new(ClientSettings {
        max_concurrent_requests: 3,
        ..settings(&server.uri())
    })
    .unwrap();

    let records: Vec<_> = (1..=5).map(|i| record(&format!("SKU-{i}"))).collect();
    let results = client.sync_many(&records, &creds()).await.unwrap();

    let skus: Vec<&str> = results.iter().map(|r| r.sku.as_str()).collect();
    assert_eq!(skus, vec!["SKU-1", "SKU-2", "SKU-3", "SKU-4", "SKU-5"]);
    assert!(results.iter().all(fbsync_sellercenter::SyncResult::is_success));
}
