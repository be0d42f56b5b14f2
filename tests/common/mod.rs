//! In-process stand-in for the image providers.
//!
//! Each (method, path) gets a queue of canned responses. Responses are
//! handed out in order and the last one repeats, so a status URL can answer
//! "pending" once and then "succeeded" forever.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use portrait_stylizer::config::{OpenAiSettings, ReplicateSettings, StylizerSettings};
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct Canned {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    pub delay: Option<Duration>,
}

impl Canned {
    pub fn json(status: u16, value: serde_json::Value) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: value.to_string().into_bytes(),
            delay: None,
        }
    }

    pub fn png(bytes: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: "image/png",
            body: bytes,
            delay: None,
        }
    }

    pub fn raw(status: u16, body: &[u8]) -> Self {
        Self {
            status,
            content_type: "application/octet-stream",
            body: body.to_vec(),
            delay: None,
        }
    }

    /// Holds the response back, like a provider that is slow to answer.
    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[derive(Clone, Debug)]
pub struct Recorded {
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    pub fn authorization(&self) -> Option<String> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    }
}

type RouteKey = (Method, String);

#[derive(Default)]
struct Script {
    responses: HashMap<RouteKey, VecDeque<Canned>>,
    requests: HashMap<RouteKey, Vec<Recorded>>,
}

pub struct MockProvider {
    base: String,
    script: Arc<Mutex<Script>>,
}

impl MockProvider {
    pub async fn start() -> Self {
        let script = Arc::new(Mutex::new(Script::default()));
        let app = Router::new()
            .fallback(replay)
            .with_state(script.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock provider");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("mock provider");
        });
        Self {
            base: format!("http://{addr}"),
            script,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn respond(&self, method: Method, path: &str, responses: Vec<Canned>) {
        assert!(!responses.is_empty(), "need at least one response");
        let mut script = self.script.lock().expect("script lock");
        script
            .responses
            .insert((method, path.to_string()), responses.into());
    }

    pub fn requests(&self, method: Method, path: &str) -> Vec<Recorded> {
        let script = self.script.lock().expect("script lock");
        script
            .requests
            .get(&(method, path.to_string()))
            .cloned()
            .unwrap_or_default()
    }

    pub fn hits(&self, method: Method, path: &str) -> usize {
        self.requests(method, path).len()
    }

    pub fn total_hits(&self) -> usize {
        let script = self.script.lock().expect("script lock");
        script.requests.values().map(Vec::len).sum()
    }

    /// Settings that point both providers at this server and poll quickly.
    pub fn settings(&self) -> StylizerSettings {
        StylizerSettings {
            openai: OpenAiSettings {
                endpoint: self.url("/v1/images/edits"),
                ..OpenAiSettings::default()
            },
            replicate: ReplicateSettings {
                endpoint: self.url("/v1/predictions"),
                poll_interval: Duration::from_millis(10),
                max_wait: Duration::from_secs(5),
                ..ReplicateSettings::default()
            },
            request_timeout: Duration::from_secs(10),
        }
    }
}

async fn replay(
    State(script): State<Arc<Mutex<Script>>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let key = (method, uri.path().to_string());
    let canned = {
        let mut script = script.lock().expect("script lock");
        script.requests.entry(key.clone()).or_default().push(Recorded {
            headers,
            body: body.to_vec(),
        });
        match script.responses.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front(),
            Some(queue) => queue.front().cloned(),
            None => None,
        }
    };
    if let Some(delay) = canned.as_ref().and_then(|canned| canned.delay) {
        tokio::time::sleep(delay).await;
    }
    match canned {
        Some(canned) => (
            StatusCode::from_u16(canned.status).expect("status"),
            [(CONTENT_TYPE, canned.content_type)],
            canned.body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no canned response").into_response(),
    }
}

/// A small image with distinct pixels.
pub fn photo() -> DynamicImage {
    let mut img = RgbaImage::new(6, 5);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgba([(x * 40) as u8, (y * 50) as u8, 90, 255]);
    }
    DynamicImage::ImageRgba8(img)
}

/// A different image, standing in for the provider's output.
pub fn portrait() -> DynamicImage {
    let mut img = RgbaImage::new(3, 3);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgba([200, (x * 30) as u8, (y * 70) as u8, 255]);
    }
    DynamicImage::ImageRgba8(img)
}

pub fn png_bytes(image: &DynamicImage) -> Vec<u8> {
    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode png");
    out
}

/// Builds a multipart/form-data POST to `/generate`.
pub fn generate_request(fields: &[(&str, Vec<u8>)]) -> Request<Body> {
    const BOUNDARY: &str = "mock-provider-boundary";
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = if *name == "image" {
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"photo.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
        } else {
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(value);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Request::builder()
        .method("POST")
        .uri("/generate")
        .header(
            CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request")
}
