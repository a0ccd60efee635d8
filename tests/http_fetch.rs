// HTTP token source against a loopback stub server.
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use pixpeek::api::{
    ErrorKind, FetchOptions, HttpTokenSource, TokenSource, encode_field, encode_segment,
    resolve_payload,
};
use serde_json::json;

fn serve_once(status_line: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr").to_string();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream.try_clone().expect("clone"));
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");
        loop {
            let mut line = String::new();
            let read = reader.read_line(&mut line).expect("header line");
            if read == 0 || line == "\r\n" {
                break;
            }
        }
        let response = format!(
            "{status_line}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).expect("write");
        request_line
    });
    (addr, handle)
}

fn http_source() -> HttpTokenSource {
    HttpTokenSource::with_options(
        FetchOptions::default()
            .with_scheme("http")
            .with_timeout(Duration::from_secs(5)),
    )
}

#[test]
fn fetch_returns_trimmed_body() {
    let (addr, server) = serve_once("HTTP/1.1 200 OK", "a.b.c\n".to_string());
    let text = http_source()
        .fetch_token(&format!("{addr}/qr/v2/cobv/abc"))
        .expect("fetch");
    assert_eq!(text, "a.b.c");
    let request_line = server.join().expect("server");
    assert!(request_line.starts_with("GET /qr/v2/cobv/abc HTTP/1.1"));
}

#[test]
fn fetch_maps_not_found_status() {
    let (addr, server) = serve_once("HTTP/1.1 404 Not Found", "gone".to_string());
    let err = http_source()
        .fetch_token(&format!("{addr}/missing"))
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.message(), Some("HTTP 404"));
    server.join().expect("server");
}

#[test]
fn fetch_reports_connection_failure_as_io() {
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").to_string()
    };
    let err = http_source()
        .fetch_token(&format!("{addr}/x"))
        .expect_err("err");
    assert_eq!(err.kind(), ErrorKind::Io);
}

#[test]
fn resolve_payload_over_http() {
    let token = format!(
        "{}.{}.c2lnbmF0dXJl",
        encode_segment(&json!({"alg": "PS256", "jku": "https://pix.example.com/jwks"})),
        encode_segment(&json!({"txid": "7978c0c97ea847e78e8849634473c1f1", "status": "ATIVA"})),
    );
    let (addr, server) = serve_once("HTTP/1.1 200 OK", token);
    let location = format!("{addr}/qr/v2/7978c0c9");
    let template = format!(
        "{}{}",
        encode_field("00", "br.gov.bcb.pix").expect("encode"),
        encode_field("25", &location).expect("encode"),
    );
    let payload = format!(
        "{}{}{}{}",
        encode_field("00", "01").expect("encode"),
        encode_field("26", &template).expect("encode"),
        encode_field("53", "986").expect("encode"),
        encode_field("63", "1D3D").expect("encode"),
    );

    let resolution = resolve_payload(&payload, &http_source()).expect("resolve");
    assert_eq!(resolution.tag, "26");
    assert_eq!(resolution.url, location);
    assert_eq!(resolution.token.header["alg"], "PS256");
    assert_eq!(resolution.token.payload["status"], "ATIVA");
    assert_eq!(resolution.token.signature, "c2lnbmF0dXJl");
    server.join().expect("server");
}
