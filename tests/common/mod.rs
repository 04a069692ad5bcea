//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use axum::{
    extract::ws::{Message, WebSocketUpgrade},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use relay_gateway::config::{AliasConfig, GatewayConfig, MountConfig, RelayBackend};
use relay_gateway::lifecycle::GatewayPhase;
use relay_gateway::{GatewayError, HttpServer, Shutdown};
use tempdir::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite;

pub const HELLO: &str = "hello from the public bundle\n";
pub const INDEX: &str = "<!doctype html><title>front</title>\n";
pub const UV_BUNDLE: &str = "self.__uv$bundle = true;\n";
pub const UV_CONFIG: &str = "self.__uv$config = { prefix: '/service/' };\n";
pub const UV_CONFIG_SHADOWED: &str = "/* packaged default */\n";

/// Subprotocol the WebSocket echo relay agrees to.
pub const RELAY_PROTOCOL: &str = "wisp-v2";

/// Asset tree laid out like the shipped bundles.
pub struct Assets {
    pub dir: TempDir,
}

impl Assets {
    pub fn new() -> Self {
        let dir = TempDir::new("relay-gateway-assets").unwrap();
        let root = dir.path();
        write(root, "public/index.html", INDEX);
        write(root, "public/hello.txt", HELLO);
        write(root, "public/uv/uv.config.js", UV_CONFIG);
        write(root, "public/docs/index.html", INDEX);
        write(root, "uv/uv.bundle.js", UV_BUNDLE);
        write(root, "uv/uv.config.js", UV_CONFIG_SHADOWED);
        write(root, "epoxy/index.mjs", "export {};\n");
        write(root, "baremux/index.js", "export {};\n");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Default layout pointed at this tree and at `upstream`.
    pub fn config(&self, upstream: String) -> GatewayConfig {
        let root = self.root();
        let mut config = GatewayConfig::default();
        config.mounts = vec![
            MountConfig::new("/uv/", root.join("uv"), false),
            MountConfig::new("/epoxy/", root.join("epoxy"), false),
            MountConfig::new("/baremux/", root.join("baremux"), false),
            MountConfig::new("/", root.join("public"), true),
        ];
        config.aliases = vec![AliasConfig {
            path: "/uv/uv.config.js".into(),
            file: root.join("public/uv/uv.config.js"),
        }];
        config.relay.upstream = upstream;
        config
    }
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// A gateway running on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub phase: watch::Receiver<GatewayPhase>,
    pub handle: JoinHandle<Result<(), GatewayError>>,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for `run` to return.
    pub async fn stop(self) -> Result<(), GatewayError> {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("gateway did not stop")
            .expect("gateway task panicked")
    }
}

pub async fn start_gateway(config: GatewayConfig) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config).unwrap();
    let phase = server.phase();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    let handle = tokio::spawn(server.run(listener, receiver));

    let mut ready = phase.clone();
    tokio::time::timeout(
        Duration::from_secs(5),
        ready.wait_for(|p| *p == GatewayPhase::Listening),
    )
    .await
    .expect("gateway never started listening")
    .unwrap();

    TestGateway {
        addr,
        shutdown,
        phase,
        handle,
    }
}

/// Gateway with the HTTP relay pointed at `upstream`.
pub async fn start_http_gateway(assets: &Assets, upstream: SocketAddr) -> TestGateway {
    start_gateway(assets.config(format!("http://{}", upstream))).await
}

/// Gateway with the WebSocket relay pointed at `upstream`.
pub async fn start_websocket_gateway(assets: &Assets, upstream: SocketAddr) -> TestGateway {
    let mut config = assets.config(format!("ws://{}", upstream));
    config.relay.backend = RelayBackend::Websocket;
    start_gateway(config).await
}

async fn spawn_upstream(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Mock relay answering every request with the URI it received.
pub async fn start_echo_upstream() -> SocketAddr {
    async fn echo(uri: Uri) -> String {
        format!("upstream saw {}", uri)
    }
    spawn_upstream(Router::new().fallback(echo)).await
}

/// Mock relay echoing WebSocket frames on any path.
///
/// Picks [`RELAY_PROTOCOL`] when the client offers it.
pub async fn start_ws_echo_upstream() -> SocketAddr {
    async fn echo(ws: WebSocketUpgrade) -> Response {
        ws.protocols([RELAY_PROTOCOL]).on_upgrade(|mut socket| async move {
            while let Some(Ok(message)) = socket.recv().await {
                if matches!(message, Message::Close(_)) {
                    break;
                }
                if socket.send(message).await.is_err() {
                    break;
                }
            }
        })
    }
    spawn_upstream(Router::new().fallback(echo)).await
}

/// Mock relay refusing every upgrade with 403.
pub async fn start_refusing_upstream() -> SocketAddr {
    async fn refuse() -> Response {
        (
            StatusCode::FORBIDDEN,
            [("x-relay-reason", "tunnels-disabled")],
            "no tunnels here",
        )
            .into_response()
    }
    spawn_upstream(Router::new().fallback(refuse)).await
}

/// A port nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Send `request` verbatim and read until the peer closes.
pub async fn raw_exchange(addr: SocketAddr, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut received = Vec::new();
    let read = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut received));
    match read.await {
        Ok(_) => received,
        Err(_) => panic!("peer kept the connection open"),
    }
}

/// Attempt a WebSocket handshake that must be answered without `101`.
pub async fn refused_handshake(url: String) -> tungstenite::http::Response<Option<Vec<u8>>> {
    match tokio_tungstenite::connect_async(url).await {
        Err(tungstenite::Error::Http(response)) => response,
        Err(e) => panic!("unexpected handshake error: {}", e),
        Ok(_) => panic!("handshake unexpectedly succeeded"),
    }
}

/// Count occurrences of `name` in a response.
pub fn header_count(response: &reqwest::Response, name: &str) -> usize {
    response.headers().get_all(name).iter().count()
}
