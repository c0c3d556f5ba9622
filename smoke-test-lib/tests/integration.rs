// smoke-test-lib/tests/integration.rs

//! Integration tests for smoke-test-lib exports and the runner end to end.
//!
//! HTTP tests talk to a throwaway server on 127.0.0.1, so no external
//! network access is needed.

use async_trait::async_trait;
use smoke_test_lib::{
    parse_url_list, BasicAuth, BodyLength, FailureKind, HttpTransport, RequestOptions,
    RequestTimeout, Runner, SmokeConfig, SmokeResult, Timings, Transport, TransportFailure,
    TransportResponse, Url,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Start a tiny HTTP/1.1 server and return its base URL.
///
/// Routes:
/// - `/ok`       200 with a fixed body and an `X-Smoke` header
/// - `/echo`     200 echoing the request head
/// - `/cookies`  200 with two `Set-Cookie` headers around another header
/// - `/redirect` 302 to `/ok`
/// - `/slow`     200 after 300ms
/// - `/stall`    200 after 5s
/// - anything else 404
async fn spawn_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(handle_connection(socket));
        }
    });

    format!("http://{}", addr)
}

async fn handle_connection(mut socket: TcpStream) {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
        if head.windows(4).any(|w| w == b"\r\n\r\n") {
            break;
        }
    }

    let head = String::from_utf8_lossy(&head).into_owned();
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();

    let response = match path.as_str() {
        "/ok" => http_response("200 OK", "X-Smoke: yes\r\n", "hello smoke test world"),
        "/echo" => http_response("200 OK", "", &head),
        "/cookies" => http_response(
            "200 OK",
            "Set-Cookie: a=1\r\nX-Mid: m\r\nSet-Cookie: b=2\r\n",
            "",
        ),
        "/redirect" => http_response("302 Found", "Location: /ok\r\n", ""),
        "/slow" => {
            tokio::time::sleep(Duration::from_millis(300)).await;
            http_response("200 OK", "", "finally")
        }
        "/stall" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            http_response("200 OK", "", "too late")
        }
        _ => http_response("404 Not Found", "", "not found"),
    };

    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

fn http_response(status: &str, extra_headers: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n{}\r\n{}",
        status,
        body.len(),
        extra_headers,
        body
    )
}

fn url(base: &str, path: &str) -> Url {
    Url::new(format!("{}{}", base, path)).unwrap()
}

#[tokio::test]
async fn test_http_run_collects_valid_and_error_results() {
    let base = spawn_server().await;

    let successes = Arc::new(Mutex::new(Vec::new()));
    let failures = Arc::new(Mutex::new(Vec::new()));
    let (s, f) = (successes.clone(), failures.clone());

    let mut runner = Runner::new(
        4,
        BodyLength::new(5),
        move |ok| s.lock().unwrap().push(ok.url().to_string()),
        move |err| f.lock().unwrap().push(err.url().to_string()),
    )
    .unwrap();

    let config = SmokeConfig::default().with_timeout(RequestTimeout::from_secs(5).unwrap());
    runner.register(config.request_options(url(&base, "/ok")));
    runner.register(config.request_options(url(&base, "/missing")));
    runner.register(config.request_options(Url::new("http://127.0.0.1:9/").unwrap()));

    let results = runner.run().await;

    assert_eq!(results.len(), 3);
    assert_eq!(results.count_valid(), 2);
    assert_eq!(results.count_errors(), 1);
    assert_eq!(successes.lock().unwrap().len(), 2);
    assert_eq!(failures.lock().unwrap().len(), 1);

    for result in &results {
        match result {
            SmokeResult::Valid(valid) if valid.url().as_str().ends_with("/ok") => {
                assert_eq!(valid.status_code().as_u16(), 200);
                assert_eq!(valid.body().as_str(), "hello");
                assert_eq!(
                    valid.headers().get("x-smoke").map(|v| v.as_str()),
                    Some("yes")
                );
            }
            SmokeResult::Valid(valid) => {
                assert_eq!(valid.status_code().as_u16(), 404);
                assert!(!valid.status_code().is_success());
            }
            SmokeResult::Error(error) => {
                assert!(error
                    .error_message()
                    .as_str()
                    .starts_with("Transport Code: "));
                assert_eq!(result.time_to_first_byte().in_milliseconds(), 0);
            }
        }
    }
}

#[tokio::test]
async fn test_redirect_policy() {
    let base = spawn_server().await;

    let mut runner = Runner::new(2, BodyLength::DEFAULT, |_| {}, |_| {}).unwrap();
    runner.register(RequestOptions::new(url(&base, "/redirect")));
    runner.register(RequestOptions::new(url(&base, "/redirect")).with_follow_redirect(false));

    let results = runner.run().await;
    let mut statuses: Vec<u16> = results
        .iter()
        .filter_map(|r| r.status_code())
        .map(|s| s.as_u16())
        .collect();
    statuses.sort_unstable();

    assert_eq!(statuses, vec![200, 302]);
}

#[tokio::test]
async fn test_basic_auth_header_is_sent() {
    let base = spawn_server().await;

    let mut runner = Runner::new(1, BodyLength::new(2000), |_| {}, |_| {}).unwrap();
    runner.register(
        RequestOptions::new(url(&base, "/echo"))
            .with_basic_auth(BasicAuth::new("user", "pass").unwrap()),
    );
    runner.register(RequestOptions::new(url(&base, "/echo")));

    let results = runner.run().await;
    let with_auth = results
        .iter()
        .filter_map(|r| r.body())
        .filter(|b| {
            b.as_str()
                .to_lowercase()
                .contains("authorization: basic dxnlcjpwyxnz")
        })
        .count();

    assert_eq!(results.count_valid(), 2);
    assert_eq!(with_auth, 1);
}

#[tokio::test]
async fn test_timeout_becomes_error_result() {
    let base = spawn_server().await;

    let mut runner = Runner::new(2, BodyLength::DEFAULT, |_| {}, |_| {}).unwrap();
    runner.register(
        RequestOptions::new(url(&base, "/stall"))
            .with_timeout(RequestTimeout::from_secs(1).unwrap()),
    );

    let results = runner.run().await;
    assert_eq!(results.len(), 1);

    let result = &results.as_slice()[0];
    assert!(!result.is_valid_result());
    assert!(result.as_string().contains("Transport Code: timeout"));
}

#[tokio::test]
async fn test_time_to_first_byte_reflects_server_delay() {
    let base = spawn_server().await;

    let mut runner = Runner::new(1, BodyLength::DEFAULT, |_| {}, |_| {}).unwrap();
    runner.register(RequestOptions::new(url(&base, "/slow")));

    let results = runner.run().await;
    let ttfb = results.as_slice()[0].time_to_first_byte();

    assert!(ttfb.in_milliseconds() >= 250, "ttfb was {}", ttfb);
}

#[tokio::test]
async fn test_http_transport_reports_connect_time() {
    let base = spawn_server().await;
    let transport = HttpTransport::new().unwrap();

    let response = transport
        .execute(&RequestOptions::new(url(&base, "/slow")), BodyLength::new(10))
        .await
        .unwrap();

    let timings = response.timings;
    assert!(timings.connected > Duration::ZERO);
    assert!(timings.first_byte >= timings.connected);
    assert!(timings.first_byte - timings.connected >= Duration::from_millis(250));
}

#[tokio::test]
async fn test_repeated_headers_keep_their_order() {
    let base = spawn_server().await;

    let mut runner = Runner::new(1, BodyLength::DEFAULT, |_| {}, |_| {}).unwrap();
    runner.register(RequestOptions::new(url(&base, "/cookies")));

    let results = runner.run().await;
    let headers = results.as_slice()[0].headers();
    let cookies: Vec<&str> = headers.get_all("set-cookie").map(|v| v.as_str()).collect();

    assert_eq!(cookies, vec!["a=1", "b=2"]);
    assert!(headers.contains_key("x-mid"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_slow_callback_does_not_inflate_other_requests() {
    let base = spawn_server().await;

    let mut runner = Runner::new(
        2,
        BodyLength::DEFAULT,
        |ok| {
            if ok.url().as_str().ends_with("/ok") {
                std::thread::sleep(Duration::from_millis(1500));
            }
        },
        |_| {},
    )
    .unwrap();

    let timeout = RequestTimeout::from_secs(1).unwrap();
    runner.register(RequestOptions::new(url(&base, "/ok")).with_timeout(timeout));
    runner.register(RequestOptions::new(url(&base, "/slow")).with_timeout(timeout));

    let results = runner.run().await;
    assert_eq!(results.count_valid(), 2, "{}", results.as_string());

    let slow = results
        .iter()
        .find(|r| r.url().as_str().ends_with("/slow"))
        .unwrap();
    let ttfb = slow.time_to_first_byte().in_milliseconds();
    assert!((250..1000).contains(&ttfb), "ttfb was {}", ttfb);
}

/// Transport echoing the URL as the body. Hosts containing `down` fail.
struct EchoTransport;

#[async_trait]
impl Transport for EchoTransport {
    async fn execute(
        &self,
        options: &RequestOptions,
        body_limit: BodyLength,
    ) -> Result<TransportResponse, TransportFailure> {
        if options.url().as_str().contains("down") {
            return Err(TransportFailure::new(
                FailureKind::Connect,
                "connection refused",
            ));
        }

        Ok(TransportResponse {
            status: 200,
            headers: vec![("X-Limit".to_string(), body_limit.as_usize().to_string())],
            body: options.url().to_string(),
            timings: Timings {
                connected: Duration::from_millis(2),
                first_byte: Duration::from_millis(7),
            },
        })
    }
}

#[tokio::test]
async fn test_custom_transport_with_url_list() {
    let list = parse_url_list(
        "# targets\nhttps://up.example/a\nhttps://down.example\nhttps://up.example/b # second\n",
    );
    assert!(list.invalid_lines.is_empty());

    let mut runner =
        Runner::with_transport(EchoTransport, 2, BodyLength::new(64), |_| {}, |_| {}).unwrap();
    let config = SmokeConfig::default();
    for target in list.urls {
        runner.register(config.request_options(target));
    }
    assert_eq!(runner.pending(), 3);

    let results = runner.run().await;
    assert_eq!(results.count_valid(), 2);
    assert_eq!(results.count_errors(), 1);

    for result in results.iter().filter(|r| r.is_valid_result()) {
        assert_eq!(result.time_to_first_byte().in_milliseconds(), 5);
        assert_eq!(
            result.headers().get("x-limit").map(|v| v.as_str()),
            Some("64")
        );
    }

    let json = serde_json::to_value(&results).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 3);
}

#[test]
fn test_library_exports_work() {
    assert_eq!(smoke_test_lib::VERSION, env!("CARGO_PKG_VERSION"));

    let err = Runner::new(0, BodyLength::DEFAULT, |_| {}, |_| {}).err().unwrap();
    assert!(err.is_config());
}

#[test]
fn test_runner_is_usable_from_blocking_context() {
    let mut runner =
        Runner::with_transport(EchoTransport, 1, BodyLength::new(3), |_| {}, |_| {}).unwrap();
    runner.register(RequestOptions::new(Url::new("https://up.example").unwrap()));

    let results = tokio_test::block_on(runner.run());
    assert_eq!(results.as_slice()[0].body().unwrap().as_str(), "htt");
}
