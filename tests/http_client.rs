use hyper::StatusCode;
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use shoot::application::services::HttpClient;
use shoot::domain::entities::{Method, Request};
use shoot::domain::errors::ClientError;
use shoot::domain::settings::ClientSettings;
use shoot::domain::value_objects::ParsedUrl;
use shoot::infrastructure::http_client::HyperHttpClient;
use std::time::Duration;
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request(method: Method, url: &str) -> Request {
    Request {
        method,
        url: ParsedUrl::parse(url).unwrap(),
        headers: HeaderMap::new(),
        body: Bytes::new(),
    }
}

fn client(settings: ClientSettings) -> HyperHttpClient {
    HyperHttpClient::new(settings).unwrap()
}

#[tokio::test]
async fn get_returns_status_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hello"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-served-by", "mock")
                .set_body_string("hi there"),
        )
        .mount(&server)
        .await;

    let response = client(ClientSettings::default())
        .send(request(Method::Get, &format!("{}/hello", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["x-served-by"], "mock");
    assert_eq!(&response.body[..], b"hi there");
    assert!(response.timings.dns.start.is_some());
    assert!(response.timings.connect.start.is_some());
    assert!(response.timings.tls.start.is_none());
    assert!(response.elapsed >= response.timings.connect.duration);
}

#[tokio::test]
async fn post_sends_body_and_host_header() {
    let server = MockServer::start().await;
    let address = server.address();
    Mock::given(method("POST"))
        .and(path("/items"))
        .and(header("host", format!("127.0.0.1:{}", address.port()).as_str()))
        .and(body_string(r#"{"id":1}"#))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let mut req = request(Method::Post, &format!("{}/items", server.uri()));
    req.body = Bytes::from_static(br#"{"id":1}"#);

    let response = client(ClientSettings::default()).send(req).await.unwrap();
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let settings = ClientSettings::default().with_timeout(Some(Duration::from_millis(200)));
    let err = client(settings)
        .send(request(Method::Get, &format!("{}/slow", server.uri())))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Timeout(d) if d == Duration::from_millis(200)));
}

#[tokio::test]
async fn redirects_are_only_followed_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/new"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_string("moved here"))
        .mount(&server)
        .await;

    let url = format!("{}/old", server.uri());

    let response = client(ClientSettings::default())
        .send(request(Method::Get, &url))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::FOUND);

    let response = client(ClientSettings::default().with_follow_redirects(true))
        .send(request(Method::Get, &url))
        .await
        .unwrap();
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(&response.body[..], b"moved here");
}

#[tokio::test]
async fn redirect_loops_are_cut_off() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(ResponseTemplate::new(307).insert_header("location", "/loop"))
        .mount(&server)
        .await;

    let err = client(ClientSettings::default().with_follow_redirects(true))
        .send(request(Method::Get, &format!("{}/loop", server.uri())))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::TooManyRedirects(10)));
}

#[tokio::test]
async fn refused_connection_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = client(ClientSettings::default())
        .send(request(Method::Get, &format!("http://127.0.0.1:{port}/")))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Connect { .. }));
}
