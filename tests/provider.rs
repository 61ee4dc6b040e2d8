use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::PathBuf;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use legend_cache::fake_provider::FixtureProvider;
use legend_cache::provider::BridgeProvider;
use legend_cache::{FetchError, StatsProvider};
use reqwest::StatusCode;
use reqwest::blocking::Client;

const PLAYER: &str = "Pagano94";
const API_KEY: &str = "test-key";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

/// Answers exactly one request with the canned status and body, then hands back the
/// request head it received.
fn serve_once(status: &str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let status = status.to_string();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = stream.read(&mut buf).expect("read request");
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write response");
        stream.flush().expect("flush");
        String::from_utf8_lossy(&head).into_owned()
    });
    (format!("http://{addr}/bridge"), handle)
}

fn provider(url: String) -> BridgeProvider {
    let client = Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("client");
    BridgeProvider::new(url, API_KEY, client)
}

#[test]
fn successful_response_is_parsed_and_request_is_authorized() {
    let (url, server) = serve_once("200 OK", read_fixture("bridge_player.json"));
    let payload = provider(url)
        .fetch_player_stats(PLAYER, "PC")
        .expect("payload");
    assert_eq!(payload.player_name.as_deref(), Some(PLAYER));
    assert_eq!(payload.legends.len(), 5);
    assert!(payload.legends.contains_key("Bloodhound"));

    let head = server.join().expect("server thread");
    let request_line = head.lines().next().unwrap_or_default();
    assert!(request_line.starts_with("GET /bridge?"), "{request_line}");
    assert!(request_line.contains("player=Pagano94"), "{request_line}");
    assert!(request_line.contains("platform=PC"), "{request_line}");
    assert!(
        head.lines()
            .any(|line| line.eq_ignore_ascii_case(&format!("authorization: {API_KEY}"))),
        "{head}"
    );
}

#[test]
fn unauthorized_status_maps_to_unauthorized() {
    let (url, server) = serve_once("401 Unauthorized", r#"{"Error":"bad key"}"#.to_string());
    let err = provider(url).fetch_player_stats(PLAYER, "PC").unwrap_err();
    assert!(
        matches!(err, FetchError::Unauthorized(status) if status == StatusCode::UNAUTHORIZED),
        "{err}"
    );
    server.join().expect("server thread");
}

#[test]
fn server_error_keeps_a_truncated_body() {
    let body = format!("upstream exploded: {}", "x".repeat(400));
    let (url, server) = serve_once("500 Internal Server Error", body);
    let err = provider(url).fetch_player_stats(PLAYER, "PC").unwrap_err();
    match err {
        FetchError::Status { status, body } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert!(body.starts_with("upstream exploded: "), "{body}");
            assert!(body.ends_with("..."), "{body}");
            assert_eq!(body.chars().count(), 203);
        }
        other => panic!("expected status error, got {other}"),
    }
    server.join().expect("server thread");
}

#[test]
fn provider_error_body_on_200_is_a_provider_error() {
    let (url, server) = serve_once("200 OK", r#"{"Error":" Player not found. "}"#.to_string());
    let err = provider(url).fetch_player_stats(PLAYER, "PC").unwrap_err();
    assert!(
        matches!(err, FetchError::Provider(ref message) if message == "Player not found."),
        "{err}"
    );
    server.join().expect("server thread");
}

#[test]
fn missing_fixture_file_is_a_fixture_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fixture = FixtureProvider::new(dir.path().join("absent.json"));
    let err = fixture.fetch_player_stats(PLAYER, "PC").unwrap_err();
    assert!(matches!(err, FetchError::Fixture { .. }), "{err}");
}
