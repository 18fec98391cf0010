//! Browser-level CDP connection.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, TargetInfo};
use super::session::PageSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value, CdpError>>>>>;

/// Default per-command timeout.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Request/response plumbing shared by the browser client and its page
/// sessions. One WebSocket carries every session's traffic.
pub(crate) struct Transport {
    sink: tokio::sync::Mutex<WsSink>,
    pending: Pending,
    next_id: AtomicU64,
    call_timeout: Duration,
}

impl Transport {
    /// Send `method` and wait for its response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(str::to_string),
        };
        let payload = serde_json::to_string(&request)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        trace!(id, method, "CDP request");
        if let Err(e) = self.sink.lock().await.send(Message::Text(payload.into())).await {
            self.pending.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(self.call_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(method.to_string()))
            }
        }
    }
}

/// Connection to a running browser.
pub struct CdpClient {
    transport: Arc<Transport>,
    version: BrowserVersion,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the DevTools endpoint at `endpoint`, e.g.
    /// `http://127.0.0.1:9222`.
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        Self::connect_with_timeout(endpoint, DEFAULT_CALL_TIMEOUT).await
    }

    pub async fn connect_with_timeout(
        endpoint: &str,
        call_timeout: Duration,
    ) -> Result<Self, CdpError> {
        let version = Self::discover(endpoint).await?;
        info!(browser = %version.browser, "Connecting to browser");

        let (stream, _) = connect_async(version.web_socket_debugger_url.as_str()).await?;
        let (sink, source) = stream.split();

        let pending: Pending = Arc::new(Mutex::new(HashMap::new()));
        let transport = Arc::new(Transport {
            sink: tokio::sync::Mutex::new(sink),
            pending: pending.clone(),
            next_id: AtomicU64::new(1),
            call_timeout,
        });
        let recv_task = tokio::spawn(receive_loop(source, pending));

        Ok(Self {
            transport,
            version,
            recv_task,
        })
    }

    /// Read `/json/version` for the browser WebSocket URL.
    async fn discover(endpoint: &str) -> Result<BrowserVersion, CdpError> {
        let base = url::Url::parse(endpoint)?;
        let version_url = base.join("/json/version")?;
        debug!(url = %version_url, "Discovering browser");

        let response = reqwest::get(version_url)
            .await
            .map_err(|_| CdpError::ChromeNotAvailable(endpoint.to_string()))?;
        if !response.status().is_success() {
            return Err(CdpError::ChromeNotAvailable(endpoint.to_string()));
        }
        Ok(response.json::<BrowserVersion>().await?)
    }

    pub fn version(&self) -> &BrowserVersion {
        &self.version
    }

    /// Send a browser-level command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.transport.call(method, params, None).await
    }

    pub async fn get_targets(&self) -> Result<Vec<TargetInfo>, CdpError> {
        let result = self.call("Target.getTargets", None).await?;
        let infos = result
            .get("targetInfos")
            .cloned()
            .ok_or_else(|| CdpError::InvalidResponse("missing targetInfos".to_string()))?;
        Ok(serde_json::from_value(infos)?)
    }

    /// Attach to a page target with a flattened session.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(serde_json::json!({ "targetId": target_id, "flatten": true })),
            )
            .await?;
        let session_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| CdpError::InvalidResponse("missing sessionId".to_string()))?;

        debug!(target_id, session_id, "Attached to page");
        let session = PageSession::new(
            self.transport.clone(),
            target_id.to_string(),
            session_id.to_string(),
        );
        session.enable_domains().await?;
        Ok(session)
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

/// Route responses to their waiting callers until the socket closes.
async fn receive_loop(mut source: SplitStream<WsStream>, pending: Pending) {
    while let Some(message) = source.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "CDP socket error");
                break;
            }
        };
        let response: CdpResponse = match serde_json::from_str(&text) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Unparseable CDP message");
                continue;
            }
        };
        // Events carry no id; nothing subscribes to them.
        let Some(id) = response.id else {
            continue;
        };
        let Some(tx) = pending.lock().remove(&id) else {
            continue;
        };
        let result = match response.error {
            Some(error) => Err(CdpError::Protocol {
                code: error.code,
                message: error.message,
            }),
            None => Ok(response.result.unwrap_or(Value::Null)),
        };
        let _ = tx.send(result);
    }

    // Fail every caller still waiting.
    let waiting: Vec<_> = pending.lock().drain().collect();
    for (_, tx) in waiting {
        let _ = tx.send(Err(CdpError::SessionClosed));
    }
    info!("CDP connection closed");
}
