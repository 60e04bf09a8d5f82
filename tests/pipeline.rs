use hyper::StatusCode;
use shoot::application::builders::assembler::DataOptions;
use shoot::application::renderer::{Formatter, Renderer};
use shoot::application::services::{HttpRequestService, Invocation};
use shoot::application::signer::{AwsCredentials, AwsSigV4Signer, Signer};
use shoot::domain::alias::AliasTable;
use shoot::domain::entities::Method;
use shoot::domain::settings::ClientSettings;
use shoot::infrastructure::alias_store::FileAliasStore;
use shoot::infrastructure::history::HistoryRecorder;
use shoot::infrastructure::http_client::HyperHttpClient;
use std::io::Cursor;
use tempfile::TempDir;
use wiremock::matchers::{body_string, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Fixture {
    _dir: TempDir,
    aliases: FileAliasStore,
    history_path: std::path::PathBuf,
}

fn fixture(server: &MockServer) -> Fixture {
    let dir = TempDir::new().unwrap();
    let aliases = FileAliasStore::new(dir.path().join("aliases.json"));
    let table: AliasTable = [("api", server.uri())].into_iter().collect();
    aliases.save(&table).unwrap();
    let history_path = dir.path().join("history.jsonl");
    Fixture {
        _dir: dir,
        aliases,
        history_path,
    }
}

fn service(fixture: &Fixture, renderer: Renderer) -> HttpRequestService {
    let client = HyperHttpClient::new(ClientSettings::default()).unwrap();
    HttpRequestService::new(Box::new(client))
        .with_renderer(renderer)
        .with_aliases(Box::new(fixture.aliases.clone()))
        .with_history(Box::new(HistoryRecorder::new(&fixture.history_path)))
}

#[tokio::test]
async fn alias_request_is_sent_rendered_and_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/users"))
        .and(header("content-type", "application/json"))
        .and(header("x-trace", "abc"))
        .and(body_string(r#"{"name":"ada"}"#))
        .respond_with(
            ResponseTemplate::new(201).set_body_raw(r#"{"id":7}"#, "application/json"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let fixture = fixture(&server);
    let renderer = Renderer::from_spec(Formatter::Text, "statuscode,body", false).unwrap();
    let mut service = service(&fixture, renderer);

    let invocation = Invocation {
        method: "post".into(),
        url: "{api}/users".into(),
        headers: vec!["X-Trace: abc".into()],
        default_headers: None,
        data: DataOptions {
            inline: Some(r#"{"name":"ada"}"#.into()),
            ..Default::default()
        },
    };
    let request = service
        .prepare_with_stdin(&invocation, Cursor::new(Vec::new()), true)
        .unwrap();

    let mut out = Vec::new();
    let outcome = service.send_request(request, &mut out).await.unwrap();

    assert_eq!(outcome.status, StatusCode::CREATED);
    assert!(!outcome.failed);
    assert!(outcome.history_recorded);
    assert_eq!(String::from_utf8(out).unwrap(), "201\n{\n  \"id\": 7\n}\n");

    let mut history = HistoryRecorder::new(&fixture.history_path);
    let entry = history.latest().unwrap();
    assert_eq!(entry.method, Method::Post);
    assert_eq!(entry.url, format!("{}/users", server.uri()));
    assert_eq!(entry.body, br#"{"name":"ada"}"#);
}

#[tokio::test]
async fn error_status_is_flagged_after_output_and_history() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let fixture = fixture(&server);
    let renderer = Renderer::from_spec(Formatter::Text, "body", true).unwrap();
    let mut service = service(&fixture, renderer);

    let invocation = Invocation {
        method: "GET".into(),
        url: format!("{}/missing", server.uri()),
        ..Default::default()
    };
    let request = service
        .prepare_with_stdin(&invocation, Cursor::new(Vec::new()), true)
        .unwrap();

    let mut out = Vec::new();
    let outcome = service.send_request(request, &mut out).await.unwrap();

    assert!(outcome.failed);
    assert_eq!(out, b"nope\n");
    let mut history = HistoryRecorder::new(&fixture.history_path);
    assert_eq!(history.get_all().unwrap().len(), 1);
}

#[tokio::test]
async fn sigv4_signed_request_carries_authorization() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_exists("authorization"))
        .and(header_exists("x-amz-date"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let fixture = fixture(&server);
    let credentials = AwsCredentials {
        access_key_id: "AKIDEXAMPLE".into(),
        secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into(),
        session_token: None,
    };
    let signer = Signer::AwsSigV4(AwsSigV4Signer::new("us-east-1", "execute-api", Some(credentials)));
    let mut service = service(&fixture, Renderer::default()).with_signer(signer);

    let invocation = Invocation {
        method: "GET".into(),
        url: "{api}/signed".into(),
        ..Default::default()
    };
    let request = service
        .prepare_with_stdin(&invocation, Cursor::new(Vec::new()), true)
        .unwrap();
    assert!(request.headers["authorization"]
        .to_str()
        .unwrap()
        .starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/"));

    let mut out = Vec::new();
    let outcome = service.send_request(request, &mut out).await.unwrap();
    assert_eq!(outcome.status, StatusCode::OK);
}
