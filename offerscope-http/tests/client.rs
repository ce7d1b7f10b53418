use offerscope_http::{Auth, HttpClient, HttpError, RequestOpts};
use serde_json::{json, Value};
use std::borrow::Cow;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> HttpClient {
    HttpClient::new(&format!("{}/", server.uri())).unwrap()
}

#[tokio::test]
async fn get_text_decodes_latin9_bodies() {
    let server = MockServer::start().await;
    // "Durée 4 - 6 mois, prime 200 €" encoded as ISO-8859-15.
    let body = b"Dur\xe9e 4 - 6 mois, prime 200 \xa4".to_vec();

    Mock::given(method("GET"))
        .and(path("/!PORTAL14S.portalCell"))
        .and(query_param("ww_k_cell", "308197177"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_bytes(body),
        )
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server)
        .get_text(
            "!PORTAL14S.portalCell",
            RequestOpts {
                query: Some(vec![("ww_k_cell", Cow::Borrowed("308197177"))]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(text, "Durée 4 - 6 mois, prime 200 €");
}

#[tokio::test]
async fn non_success_status_is_an_api_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "down"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .get_text("missing", RequestOpts::default())
        .await
        .unwrap_err();

    match err {
        HttpError::Api {
            status, message, ..
        } => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(message, "down");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn rate_limited_post_is_sent_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clean-locations"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_json(json!({"error": "slow down"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server)
        .post_json_opts::<_, Value>("clean-locations", &json!(["Lausanne"]), RequestOpts::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Api { status, .. } if status.as_u16() == 429));
}

#[tokio::test]
async fn post_json_sends_api_key_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/clean-salaries"))
        .and(header("x-api-key", "k-123"))
        .and(body_json(json!(["5000 CHF"])))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"salaries": {"5000 CHF": 5000}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let value: Value = client(&server)
        .post_json_opts(
            "clean-salaries",
            &json!(["5000 CHF"]),
            RequestOpts {
                auth: Some(Auth::api_key("k-123").unwrap()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(value["salaries"]["5000 CHF"], 5000);
}

#[tokio::test]
async fn cancel_token_aborts_in_flight_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = client(&server)
        .post_json_opts::<_, Value>(
            "slow",
            &json!([]),
            RequestOpts {
                cancel: Some(cancel),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn already_cancelled_token_never_sends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = client(&server)
        .get_text(
            "anything",
            RequestOpts {
                cancel: Some(cancel),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Cancelled));
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server)
        .post_json_opts::<_, Value>("broken", &json!([]), RequestOpts::default())
        .await
        .unwrap_err();

    assert!(matches!(err, HttpError::Decode(_, snippet) if snippet == "<html>"));
}
