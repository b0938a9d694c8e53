//! In-process HTTP server for integration tests
//!
//! Serves canned routes over plain HTTP/1.1 on a random localhost port and
//! counts how often each path was requested.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use learn_module_reader::domain::ModuleUrlPolicy;
use learn_module_reader::infrastructure::FetchConfig;

pub const MODULE_PATH: &str = "/training/modules/sample-module/";

#[derive(Debug, Clone)]
pub enum Route {
    Html(String),
    Status(u16),
    /// Answer with `code` for the first `failures` requests, then with the body
    Flaky { failures: usize, code: u16, body: String },
    /// Accept the request and never answer within `delay`
    Hang(Duration),
}

type Hits = Arc<Mutex<HashMap<String, usize>>>;

pub struct TestServer {
    pub addr: SocketAddr,
    hits: Hits,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start(routes: Vec<(&str, Route)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind test server");
        let addr = listener.local_addr().expect("local addr");
        let routes: Arc<HashMap<String, Route>> =
            Arc::new(routes.into_iter().map(|(path, route)| (path.to_string(), route)).collect());
        let hits: Hits = Arc::new(Mutex::new(HashMap::new()));

        let server_hits = Arc::clone(&hits);
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let routes = Arc::clone(&routes);
                let hits = Arc::clone(&server_hits);
                tokio::spawn(async move {
                    let _ = serve(stream, &routes, &hits).await;
                });
            }
        });

        Self { addr, hits, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn module_url(&self) -> String {
        self.url(MODULE_PATH)
    }

    pub fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve(mut stream: TcpStream, routes: &HashMap<String, Route>, hits: &Hits) -> std::io::Result<()> {
    let mut request = Vec::new();
    let mut buffer = [0_u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let read = stream.read(&mut buffer).await?;
        if read == 0 {
            return Ok(());
        }
        request.extend_from_slice(&buffer[..read]);
    }

    let head = String::from_utf8_lossy(&request);
    let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
    let seen = {
        let mut hits = hits.lock().unwrap();
        let count = hits.entry(path.clone()).or_insert(0);
        *count += 1;
        *count
    };

    let (code, body) = match routes.get(&path) {
        Some(Route::Html(body)) => (200, body.clone()),
        Some(Route::Status(code)) => (*code, String::new()),
        Some(Route::Flaky { failures, code, body }) => {
            if seen <= *failures {
                (*code, String::new())
            } else {
                (200, body.clone())
            }
        }
        Some(Route::Hang(delay)) => {
            tokio::time::sleep(*delay).await;
            return Ok(());
        }
        None => (404, String::new()),
    };

    let response = format!(
        "HTTP/1.1 {code} {reason}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n{body}",
        reason = reason(code),
        len = body.len(),
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await
}

fn reason(code: u16) -> &'static str {
    match code {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

/// Module URL policy accepting the local test server
pub fn local_policy() -> ModuleUrlPolicy {
    ModuleUrlPolicy {
        allowed_hosts: vec!["127.0.0.1".to_string()],
        path_markers: vec!["/training/modules/".to_string()],
    }
}

/// Fast fetch settings for tests
pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        timeout_seconds: 5,
        max_retries: 2,
        retry_backoff_ms: 10,
        ..FetchConfig::default()
    }
}

pub fn index_page(module_title: &str, units: &[(&str, &str)]) -> String {
    let items: String = units
        .iter()
        .map(|(title, href)| {
            format!(r#"<li class="module-unit"><div class="barLink"><a href="{href}">{title}</a></div></li>"#)
        })
        .collect();
    format!(
        r#"<html><head><title>{module_title}</title></head><body>
        <header class="site-header">Learn</header>
        <main><h1>{module_title}</h1><ul id="unit-list">{items}</ul></main></body></html>"#
    )
}

pub fn section_page(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{title} - Training</title></head><body>
        <header class="site-header">Learn</header>
        <main><nav aria-label="Breadcrumb"><a href="../">Module</a></nav>
        <h1>{title}</h1>{body}
        <div id="feedback-section">Was this page helpful?</div></main></body></html>"#
    )
}
