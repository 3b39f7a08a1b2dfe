use docsift_http::{HttpClient, HttpError, RequestOpts};
use reqwest::Url;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn head_reports_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/article"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let url = Url::parse(&format!("{}/article", server.uri())).unwrap();
    let head = client.head(&url, RequestOpts::default()).await.unwrap();

    assert!(head.status.is_success());
    assert_eq!(head.content_type.as_deref(), Some("text/html; charset=utf-8"));
}

#[tokio::test]
async fn head_without_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let url = Url::parse(&server.uri()).unwrap();
    let head = client.head(&url, RequestOpts::default()).await.unwrap();

    assert_eq!(head.content_type, None);
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let client = HttpClient::new().unwrap();
    let url = Url::parse(&server.uri()).unwrap();
    let opts = RequestOpts {
        timeout: Some(Duration::from_millis(100)),
        ..Default::default()
    };
    let err = client.head(&url, opts).await.unwrap_err();

    assert!(matches!(err, HttpError::Timeout(d) if d == Duration::from_millis(100)));
}
