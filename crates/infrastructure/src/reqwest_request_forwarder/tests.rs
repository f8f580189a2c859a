use std::time::Duration;

use courier_application::{OutboundRequest, RequestForwarder};
use courier_core::{AppError, AppResult};
use courier_domain::HttpMethod;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::ReqwestRequestForwarder;

const GZIPPED_BODY: &[u8] = &[
    0x1f, 0x8b, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0xab, 0x56, 0xca, 0xcf, 0x56,
    0xb2, 0x2a, 0x29, 0x2a, 0x4d, 0xad, 0x05, 0x00, 0x43, 0xbf, 0xa6, 0x90, 0x0b, 0x00, 0x00,
    0x00,
];

fn get(url: String) -> OutboundRequest {
    OutboundRequest {
        method: HttpMethod::Get,
        url,
        headers: Vec::new(),
        body: None,
        client_identity: None,
    }
}

fn header_value<'a>(headers: &'a [(String, Vec<u8>)], name: &str) -> Option<&'a [u8]> {
    headers
        .iter()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_slice())
}

#[tokio::test]
async fn compressed_bodies_are_relayed_byte_for_byte() -> AppResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/report"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-encoding", "gzip")
                .set_body_raw(GZIPPED_BODY, "application/json"),
        )
        .mount(&server)
        .await;

    let forwarder = ReqwestRequestForwarder::new(None)?;
    let response = forwarder
        .forward(get(format!("{}/report", server.uri())))
        .await?;

    assert_eq!(response.status, 200);
    assert_eq!(response.body, GZIPPED_BODY);
    assert_eq!(
        header_value(&response.headers, "content-encoding"),
        Some(&b"gzip"[..])
    );
    let expected_length = GZIPPED_BODY.len().to_string();
    assert_eq!(
        header_value(&response.headers, "content-length"),
        Some(expected_length.as_bytes())
    );

    let received = server.received_requests().await.unwrap_or_default();
    assert_eq!(received.len(), 1);
    assert!(received[0].headers.get("accept-encoding").is_none());
    Ok(())
}

#[tokio::test]
async fn error_statuses_are_successful_forwards() -> AppResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .mount(&server)
        .await;

    let forwarder = ReqwestRequestForwarder::new(None)?;
    let response = forwarder.forward(get(server.uri())).await?;

    assert_eq!(response.status, 503);
    assert_eq!(response.body, b"busy");
    Ok(())
}

#[tokio::test]
async fn query_headers_and_body_reach_upstream() -> AppResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pour"))
        .and(query_param("drink", "coffee"))
        .and(query_param("key", "k1"))
        .and(header("authorization", "Bearer fresh"))
        .and(header("cookie", "session=abc; region=eu"))
        .and(body_string("{\"size\":\"large\"}"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let forwarder = ReqwestRequestForwarder::new(None)?;
    let response = forwarder
        .forward(OutboundRequest {
            method: HttpMethod::Post,
            url: format!("{}/pour?drink=coffee&key=k1", server.uri()),
            headers: vec![
                ("Authorization".to_owned(), "Bearer fresh".to_owned()),
                ("Cookie".to_owned(), "session=abc; region=eu".to_owned()),
                ("Content-Type".to_owned(), "application/json".to_owned()),
            ],
            body: Some(b"{\"size\":\"large\"}".to_vec()),
            client_identity: None,
        })
        .await?;

    assert_eq!(response.status, 201);
    Ok(())
}

#[tokio::test]
async fn timeouts_are_upstream_unreachable() -> AppResult<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let forwarder = ReqwestRequestForwarder::new(Some(Duration::from_millis(50)))?;
    let result = forwarder.forward(get(server.uri())).await;

    assert!(matches!(result, Err(AppError::UpstreamUnreachable(_))));
    Ok(())
}

#[tokio::test]
async fn refused_connections_do_not_echo_the_query() -> AppResult<()> {
    let forwarder = ReqwestRequestForwarder::new(None)?;
    let result = forwarder
        .forward(get("http://127.0.0.1:9/pour?key=super-secret".to_owned()))
        .await;

    match result {
        Err(AppError::UpstreamUnreachable(message)) => {
            assert!(!message.contains("super-secret"));
        }
        other => panic!("expected upstream unreachable, got {other:?}"),
    }
    Ok(())
}

#[test]
fn hop_by_hop_headers_are_recognized() {
    assert!(super::is_hop_by_hop("Transfer-Encoding"));
    assert!(super::is_hop_by_hop("connection"));
    assert!(!super::is_hop_by_hop("content-encoding"));
    assert!(!super::is_hop_by_hop("content-length"));
}
