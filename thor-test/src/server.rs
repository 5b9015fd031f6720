//! Exposes an in-process HTTP server for use in tests.
//!
//! ```
//! use std::time::Duration;
//!
//! use thor_test::server::TestServer;
//!
//! #[tokio::main]
//! async fn main() {
//!    let server = TestServer::with_latency(Duration::from_millis(100)).await;
//!    let url = server.url("/");
//!    // send requests to the URL in tests...
//!    assert_eq!(server.hits(), 0);
//! }
//! ```

use std::net::{Ipv4Addr, SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;

/// An in-process HTTP server for use in tests.
///
/// The server listens on a random available port on localhost and answers:
///
/// - `GET /` with [`TestServer::BODY`] and status `200`,
/// - `GET /status/{code}` with an empty body and the given status code.
///
/// Every response is delayed by a fixed latency, and every request is counted. The server is shut
/// down when dropped.
#[derive(Debug)]
pub struct TestServer {
    handle: tokio::task::JoinHandle<()>,
    socket: SocketAddr,
    hits: Arc<AtomicUsize>,
}

#[derive(Clone, Debug)]
struct Responder {
    latency: Duration,
    hits: Arc<AtomicUsize>,
}

impl Responder {
    async fn respond(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl TestServer {
    /// The body returned by `GET /`.
    pub const BODY: &'static str = "Hello from thor-test!";

    /// Starts a server that responds immediately.
    pub async fn new() -> Self {
        Self::with_latency(Duration::ZERO).await
    }

    /// Starts a server that delays every response by `latency`.
    pub async fn with_latency(latency: Duration) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let responder = Responder {
            latency,
            hits: Arc::clone(&hits),
        };

        let app = Router::new()
            .route("/", get(body))
            .route("/status/{code}", get(status))
            .with_state(responder);

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .unwrap();
        let socket = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            handle,
            socket,
            hits,
        }
    }

    /// Returns a full URL pointing to the given path.
    ///
    /// This URL uses the IPv4 loopback address as host, so no name resolution is involved.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("http://{}/{}", self.socket, path)
    }

    /// The number of requests received so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn body(State(responder): State<Responder>) -> &'static str {
    responder.respond().await;
    TestServer::BODY
}

async fn status(State(responder): State<Responder>, Path(code): Path<u16>) -> StatusCode {
    responder.respond().await;
    StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
}

/// Returns a URL on localhost that refuses connections.
///
/// This binds a random port and releases it again, so nothing is listening on it afterwards.
pub fn unreachable_url() -> String {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://{}:{port}/", Ipv4Addr::LOCALHOST)
}
