//! Wire logging for HTTP-based clients.
//!
//! [`DebugTransport`] wraps a `reqwest::Client` and writes what goes over
//! the wire to a sink:
//!
//! - `verbose`: one line per request
//!   `[<start ms>] GET "/zones/example.com HTTP/1.1" 200 (12ms)`
//! - `very-verbose`: request lines prefixed `[c]`, response lines `[s]`
//! - `debug`: as `very-verbose`, plus bodies

use parking_lot::Mutex;
use reqwest::{Request, Response};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::error::Result;

/// How much of the HTTP traffic is written out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputLevel {
    /// Nothing.
    #[default]
    None,
    /// Summary line per request.
    Verbose,
    /// Start lines and headers of requests and responses.
    VeryVerbose,
    /// Everything, bodies included.
    Debug,
}

type Sink = Arc<Mutex<Box<dyn Write + Send>>>;

/// HTTP client wrapper logging requests and responses.
#[derive(Clone)]
pub struct DebugTransport {
    client: reqwest::Client,
    level: OutputLevel,
    output: Sink,
}

impl DebugTransport {
    /// Wrap `client`, writing to stdout.
    pub fn new(client: reqwest::Client, level: OutputLevel) -> Self {
        Self {
            client,
            level,
            output: Arc::new(Mutex::new(Box::new(io::stdout()))),
        }
    }

    /// Write to `output` instead of stdout.
    pub fn with_output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Arc::new(Mutex::new(Box::new(output)));
        self
    }

    /// Current output level.
    pub fn level(&self) -> OutputLevel {
        self.level
    }

    /// The wrapped client, for building requests.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// Send `request`, logging it according to the output level.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        if self.level == OutputLevel::None {
            return Ok(self.client.execute(request).await?);
        }

        let with_body = self.level == OutputLevel::Debug;
        let method = request.method().clone();
        let uri = request_uri(&request);

        if self.level >= OutputLevel::VeryVerbose {
            self.write_lines("c", &dump_request(&request, with_body));
        }

        let started_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let start = Instant::now();

        let response = self.client.execute(request).await?;

        if self.level == OutputLevel::Verbose {
            let line = format!(
                "[{}] {} \"{} {:?}\" {} ({}ms)\r\n",
                started_ms,
                method,
                uri,
                response.version(),
                response.status().as_u16(),
                start.elapsed().as_millis(),
            );
            self.write_raw(line.as_bytes());
            return Ok(response);
        }

        let head = dump_response_head(&response);
        if !with_body {
            self.write_lines("s", &head);
            return Ok(response);
        }

        let status = response.status();
        let version = response.version();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        let mut text = head;
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&body));
        self.write_lines("s", &text);

        let mut rebuilt = http::Response::new(body);
        *rebuilt.status_mut() = status;
        *rebuilt.version_mut() = version;
        *rebuilt.headers_mut() = headers;

        Ok(Response::from(rebuilt))
    }

    fn write_lines(&self, prefix: &str, text: &str) {
        let mut out = self.output.lock();
        let written = text
            .lines()
            .try_for_each(|line| writeln!(out, "[{prefix}] {line}"))
            .and_then(|()| out.flush());
        if let Err(e) = written {
            warn!(error = %e, "failed to write debug output");
        }
    }

    fn write_raw(&self, bytes: &[u8]) {
        let mut out = self.output.lock();
        if let Err(e) = out.write_all(bytes).and_then(|()| out.flush()) {
            warn!(error = %e, "failed to write debug output");
        }
    }
}

fn request_uri(request: &Request) -> String {
    let url = request.url();
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn dump_request(request: &Request, with_body: bool) -> String {
    let mut text = format!(
        "{} {} {:?}\n",
        request.method(),
        request_uri(request),
        request.version()
    );
    if let Some(host) = request.url().host_str() {
        text.push_str(&format!("host: {host}\n"));
    }
    for (name, value) in request.headers() {
        text.push_str(&format!("{}: {}\n", name, String::from_utf8_lossy(value.as_bytes())));
    }
    if with_body {
        if let Some(body) = request.body().and_then(|b| b.as_bytes()) {
            text.push('\n');
            text.push_str(&String::from_utf8_lossy(body));
        }
    }
    text
}

fn dump_response_head(response: &Response) -> String {
    let mut text = format!("{:?} {}\n", response.version(), response.status());
    for (name, value) in response.headers() {
        text.push_str(&format!("{}: {}\n", name, String::from_utf8_lossy(value.as_bytes())));
    }
    text
}
