// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Data Nadhi

//! Shared fixtures: a minimal threaded HTTP mock and a `.datanadhi`
//! directory builder.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// One request as the mock saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

/// Tiny HTTP server: records every request, answers each path with its
/// configured status (default 200), closes the connection after one
/// exchange. The accept thread lives until the test process exits.
pub struct MockServer {
    url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    statuses: Arc<Mutex<HashMap<String, u16>>>,
}

impl MockServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
        let addr = listener.local_addr().expect("mock server addr");
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
        let statuses: Arc<Mutex<HashMap<String, u16>>> = Arc::default();

        {
            let requests = Arc::clone(&requests);
            let statuses = Arc::clone(&statuses);
            std::thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { continue };
                    let requests = Arc::clone(&requests);
                    let statuses = Arc::clone(&statuses);
                    std::thread::spawn(move || handle_connection(stream, &requests, &statuses));
                }
            });
        }

        Self { url: format!("http://{addr}"), requests, statuses }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Configure the status for one path (e.g. `/log`, `/upload`, `/`).
    pub fn set_status(&self, path: &str, status: u16) {
        self.statuses.lock().unwrap().insert(path.to_string(), status);
    }

    /// Configure the status for every path at once.
    pub fn set_all(&self, status: u16) {
        let mut statuses = self.statuses.lock().unwrap();
        for path in ["/", "/log", "/upload"] {
            statuses.insert(path.to_string(), status);
        }
    }

    pub fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    /// Poll until `path` has seen at least `count` requests.
    pub fn wait_for(&self, path: &str, count: usize, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.requests_for(path).len() >= count {
                return true;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        false
    }
}

fn handle_connection(
    stream: TcpStream,
    requests: &Mutex<Vec<RecordedRequest>>,
    statuses: &Mutex<HashMap<String, u16>>,
) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(path)) = (parts.next(), parts.next()) else {
        return;
    };
    let (method, path) = (method.to_string(), path.to_string());

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let content_length: usize =
        headers.get("content-length").and_then(|v| v.parse().ok()).unwrap_or(0);
    let mut body = vec![0u8; content_length];
    if content_length > 0 && reader.read_exact(&mut body).is_err() {
        return;
    }

    let status = statuses.lock().unwrap().get(&path).copied().unwrap_or(200);
    requests.lock().unwrap().push(RecordedRequest { method, path, headers, body });

    let mut stream = reader.into_inner();
    let _ = stream.write_all(
        format!("HTTP/1.1 {status} Mock\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .as_bytes(),
    );
    let _ = stream.flush();
}

/// A `.datanadhi` directory wired to the given mock servers, with fast
/// timeouts and the sidecar disabled.
pub fn datanadhi_dir(primary: &MockServer, fallback: &MockServer, queue_size: usize) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("config.yml"),
        format!(
            "server:\n  server_host: {}\n  fallback_server_host: {}\nasync:\n  queue_size: {}\n  exit_timeout: 2\nechopost:\n  disable: true\n",
            primary.url(),
            fallback.url(),
            queue_size,
        ),
    )
    .expect("write config");
    dir
}

/// A rule matching `context.user.id == "42"`, emitting to stdout and the
/// `p1` pipeline.
pub fn write_user_rule(dir: &std::path::Path) {
    let rules = dir.join("rules");
    std::fs::create_dir_all(&rules).expect("rules dir");
    std::fs::write(
        rules.join("base.yml"),
        r#"
- conditions:
    - key: context.user.id
      type: exact
      value: "42"
  stdout: true
  pipelines: [p1]
"#,
    )
    .expect("write rules");
}

/// Decode a gzipped JSONL upload body into its JSON objects.
pub fn decode_upload(body: &[u8]) -> Vec<serde_json::Value> {
    use flate2::read::GzDecoder;
    let mut text = String::new();
    GzDecoder::new(body).read_to_string(&mut text).expect("gunzip upload body");
    text.lines().map(|line| serde_json::from_str(line).expect("upload line")).collect()
}

pub fn set_api_key() {
    std::env::set_var("DATANADHI_API_KEY", "spec-key");
}

/// Poll for the first dropped-events file with the given reason prefix.
pub fn wait_for_dropped(
    dir: &std::path::Path,
    reason: &str,
    timeout: Duration,
) -> Option<std::path::PathBuf> {
    let dropped = dir.join("dropped");
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Ok(entries) = std::fs::read_dir(&dropped) {
            for entry in entries.flatten() {
                let name = entry.file_name().to_string_lossy().into_owned();
                if name.starts_with(reason) {
                    return Some(entry.path());
                }
            }
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    None
}
