//! S6 (Response size cap): a REST adapter capped at 4 bytes against a 5-byte response reports
//! an external failure carrying the cap in metadata.

use deliverymesh_core::ErrorCategory;
use deliverymesh_transport::{CancelToken, RestAdapter, TransportAdapter, TransportRequest};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn oversized_response_is_an_external_failure_carrying_the_cap() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fiveb".to_vec()))
        .mount(&server)
        .await;

    let adapter = RestAdapter::new().with_default_max_response_bytes(4);
    let req = TransportRequest::new(format!("{}/events", server.uri()));
    let err = adapter
        .do_request(&CancelToken::new(), req)
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::External);
    assert_eq!(err.metadata().get("response_limit_b").map(String::as_str), Some("4"));
}

#[tokio::test]
async fn response_at_or_under_the_cap_is_read_in_full() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"four".to_vec()))
        .mount(&server)
        .await;

    let adapter = RestAdapter::new().with_default_max_response_bytes(4);
    let req = TransportRequest::new(format!("{}/events", server.uri()));
    let response = adapter.do_request(&CancelToken::new(), req).await.unwrap();

    assert_eq!(response.body, b"four");
    assert_eq!(response.status_code, 200);
}
