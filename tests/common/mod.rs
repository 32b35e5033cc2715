//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

use config_road::config::{BootstrapConfig, SearchMode};

/// A minimal Nacos config endpoint over plain HTTP/1.1.
///
/// Serves `GET /nacos/v1/cs/configs` for both single-document fetches and
/// `search=` queries. Status codes can be forced to inject failures.
#[derive(Clone, Default)]
pub struct MockNacos {
    inner: Arc<MockState>,
}

#[derive(Default)]
struct MockState {
    docs: DashMap<(String, String), Vec<u8>>,
    fetch_status: AtomicU16,
    search_status: AtomicU16,
    fetches: AtomicUsize,
    searches: AtomicUsize,
    last_search: Mutex<Vec<(String, String)>>,
}

impl MockNacos {
    pub fn put(&self, group: &str, id: &str, content: &str) {
        self.put_bytes(group, id, content.as_bytes());
    }

    /// Serve `content` verbatim, whatever its encoding.
    pub fn put_bytes(&self, group: &str, id: &str, content: &[u8]) {
        self.inner
            .docs
            .insert((group.to_string(), id.to_string()), content.to_vec());
    }

    /// Force every fetch to answer with `status`; 0 restores normal behaviour.
    pub fn set_fetch_status(&self, status: u16) {
        self.inner.fetch_status.store(status, Ordering::SeqCst);
    }

    pub fn set_search_status(&self, status: u16) {
        self.inner.search_status.store(status, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.inner.fetches.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> usize {
        self.inner.searches.load(Ordering::SeqCst)
    }

    /// Query parameters of the most recent search request.
    pub fn last_search(&self) -> Vec<(String, String)> {
        self.inner.last_search.lock().unwrap().clone()
    }

    /// Bind to an ephemeral port and serve until the test runtime ends.
    pub async fn start(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mock = self.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((socket, _)) => {
                        let mock = mock.clone();
                        tokio::spawn(async move { mock.serve(socket).await });
                    }
                    Err(_) => break,
                }
            }
        });
        addr
    }

    async fn serve(&self, mut socket: TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => return,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }

        let request = String::from_utf8_lossy(&buf);
        let target = request.split_whitespace().nth(1).unwrap_or("/");
        let (status, body) = self.respond(target);

        let status_text = match status {
            200 => "200 OK",
            404 => "404 Not Found",
            500 => "500 Internal Server Error",
            503 => "503 Service Unavailable",
            _ => "400 Bad Request",
        };
        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain;charset=UTF-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_text,
            body.len()
        );
        let _ = socket.write_all(head.as_bytes()).await;
        let _ = socket.write_all(&body).await;
        let _ = socket.shutdown().await;
    }

    fn respond(&self, target: &str) -> (u16, Vec<u8>) {
        let url = match Url::parse(&format!("http://mock{}", target)) {
            Ok(url) => url,
            Err(_) => return (400, Vec::new()),
        };
        if url.path() != "/nacos/v1/cs/configs" {
            return (404, Vec::new());
        }

        let params: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let param = |name: &str| {
            params
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
                .unwrap_or_default()
        };

        let group = param("group");
        let data_id = param("dataId");

        if params.iter().any(|(k, _)| k == "search") {
            self.inner.searches.fetch_add(1, Ordering::SeqCst);
            *self.inner.last_search.lock().unwrap() = params.clone();

            let forced = self.inner.search_status.load(Ordering::SeqCst);
            if forced != 0 {
                return (forced, b"search failed".to_vec());
            }

            let mode = if param("search") == "blur" {
                SearchMode::Blur
            } else {
                SearchMode::Accurate
            };
            let page_no: usize = param("pageNo").parse().unwrap_or(1);
            let page_size: usize = param("pageSize").parse().unwrap_or(10);

            let mut ids: Vec<String> = self
                .inner
                .docs
                .iter()
                .filter(|e| e.key().0 == group && mode.matches(&data_id, &e.key().1))
                .map(|e| e.key().1.clone())
                .collect();
            ids.sort();

            let items: Vec<serde_json::Value> = ids
                .iter()
                .skip((page_no.max(1) - 1) * page_size)
                .take(page_size)
                .map(|id| serde_json::json!({ "dataId": id, "group": group }))
                .collect();
            let body = serde_json::json!({
                "totalCount": ids.len(),
                "pageNumber": page_no,
                "pageItems": items,
            });
            return (200, body.to_string().into_bytes());
        }

        self.inner.fetches.fetch_add(1, Ordering::SeqCst);
        let forced = self.inner.fetch_status.load(Ordering::SeqCst);
        if forced != 0 {
            return (forced, b"fetch failed".to_vec());
        }
        match self.inner.docs.get(&(group, data_id)) {
            Some(doc) => (200, doc.value().clone()),
            None => (404, b"config data not exist".to_vec()),
        }
    }
}

/// Bootstrap configuration pointing at `addr` with a cache under `cache_dir`.
pub fn bootstrap_for(addr: SocketAddr, cache_dir: &std::path::Path) -> BootstrapConfig {
    let mut config = BootstrapConfig::default();
    config.nacos_server.ip_addr = addr.ip().to_string();
    config.nacos_server.port = addr.port();
    config.nacos_client.timeout_ms = 2_000;
    config.nacos_client.poll_interval_ms = 50;
    config.base_config.cache_dir = cache_dir.display().to_string();
    config
}

/// HTTP client that never routes through an environment proxy.
pub fn direct_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

/// Poll `check` until it returns true or `timeout` elapses.
pub async fn wait_until<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
