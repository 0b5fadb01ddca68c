use crate::config::WhatsAppConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use shared_types::{SessionState, WhatsAppStatus};
use std::time::Duration;
use tokio::sync::Mutex;

const DATA_URL_PREFIX: &str = "data:image";
const QR_OBJECT_KEYS: [&str; 6] = ["base64", "qr", "data", "image", "img", "payload"];

#[derive(Debug, thiserror::Error)]
pub enum WhatsAppError {
    #[error("WhatsApp bridge request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WhatsApp bridge returned {status}: {body}")]
    Bridge { status: u16, body: String },
}

/// Linking a WhatsApp account to this server.
#[async_trait]
pub trait SessionLink: Send + Sync {
    /// Starts pairing unless a session is already linked or pairing.
    async fn request_link(&self) -> Result<WhatsAppStatus, WhatsAppError>;
    async fn get_status(&self) -> Result<WhatsAppStatus, WhatsAppError>;
    /// Always ends up unlinked, even if the remote logout fails.
    async fn unlink(&self) -> Result<WhatsAppStatus, WhatsAppError>;
}

/// Session state as reported by the bridge, e.g. `{"state":"QR","qr":"..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BridgeSnapshot {
    pub state: String,
    #[serde(default)]
    pub qr: Option<Value>,
    #[serde(default)]
    pub number: Option<String>,
}

/// Turns whatever QR payload the client emitted into a `data:image/...` URL.
pub fn to_data_url(payload: &Value) -> Option<String> {
    let raw = match payload {
        Value::String(s) => s.as_str(),
        Value::Object(map) => QR_OBJECT_KEYS
            .iter()
            .filter_map(|key| map.get(*key).and_then(Value::as_str))
            .find(|s| !s.is_empty())?,
        _ => return None,
    };

    if raw.is_empty() {
        None
    } else if raw.starts_with(DATA_URL_PREFIX) {
        Some(raw.to_string())
    } else {
        Some(format!("data:image/png;base64,{}", raw))
    }
}

#[derive(Debug, Default)]
pub struct SessionTracker {
    state: SessionState,
    qr: Option<String>,
    number: Option<String>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn begin_pairing(&mut self) {
        self.state = SessionState::Pairing;
    }

    pub fn apply(&mut self, snapshot: &BridgeSnapshot) {
        match snapshot.state.to_ascii_uppercase().as_str() {
            "QR" => {
                self.state = SessionState::Pairing;
                if let Some(qr) = snapshot.qr.as_ref().and_then(to_data_url) {
                    self.qr = Some(qr);
                }
            }
            "CONNECTED" => match snapshot.number.as_deref().filter(|n| !n.is_empty()) {
                Some(number) => {
                    self.state = SessionState::Ready;
                    self.number = Some(number.to_string());
                    self.qr = None;
                }
                None => tracing::debug!("Bridge connected but no host number yet"),
            },
            "CONFLICT" | "UNLAUNCHED" | "STARTING" => {}
            "LOGGED_OUT" | "UNPAIRED" | "DISCONNECTED" => self.reset(),
            other => tracing::debug!("Ignoring unknown bridge state {}", other),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn status(&self) -> WhatsAppStatus {
        WhatsAppStatus {
            linked: self.state == SessionState::Ready,
            status: self.state,
            number: match self.state {
                SessionState::Ready => self.number.clone(),
                _ => None,
            },
            qr: match self.state {
                SessionState::Pairing => self.qr.clone(),
                _ => None,
            },
        }
    }
}

/// `SessionLink` backed by the HTTP sidecar running the WhatsApp client.
pub struct BridgeLink {
    client: reqwest::Client,
    base_url: String,
    session_id: String,
    tracker: Mutex<SessionTracker>,
}

impl BridgeLink {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, WhatsAppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.bridge_url.trim_end_matches('/').to_string(),
            session_id: config.session_id.clone(),
            tracker: Mutex::new(SessionTracker::new()),
        })
    }

    fn session_url(&self, action: Option<&str>) -> String {
        match action {
            Some(action) => format!("{}/sessions/{}/{}", self.base_url, self.session_id, action),
            None => format!("{}/sessions/{}", self.base_url, self.session_id),
        }
    }

    async fn read_snapshot(response: reqwest::Response) -> Result<BridgeSnapshot, WhatsAppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Bridge {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }

    async fn start(&self) -> Result<BridgeSnapshot, WhatsAppError> {
        let response = self.client.post(self.session_url(Some("start"))).send().await?;
        Self::read_snapshot(response).await
    }

    async fn fetch(&self) -> Result<BridgeSnapshot, WhatsAppError> {
        let response = self.client.get(self.session_url(None)).send().await?;
        Self::read_snapshot(response).await
    }

    /// Polls the bridge and folds the answer into the tracker. A bridge
    /// failure leaves the cached state untouched.
    async fn refresh(&self) -> WhatsAppStatus {
        let snapshot = self.fetch().await;
        let mut tracker = self.tracker.lock().await;
        match snapshot {
            Ok(snapshot) => tracker.apply(&snapshot),
            Err(e) => tracing::warn!("Could not refresh WhatsApp status, using cached: {}", e),
        }
        tracker.status()
    }

    async fn logout(&self) -> Result<(), WhatsAppError> {
        let response = self.client.post(self.session_url(Some("logout"))).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WhatsAppError::Bridge {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SessionLink for BridgeLink {
    async fn request_link(&self) -> Result<WhatsAppStatus, WhatsAppError> {
        {
            let mut tracker = self.tracker.lock().await;
            match tracker.state() {
                SessionState::Ready => return Ok(tracker.status()),
                // Claimed under the lock so only one request starts the session
                SessionState::Unlinked => tracker.begin_pairing(),
                SessionState::Pairing => {
                    drop(tracker);
                    return Ok(self.refresh().await);
                }
            }
        }

        match self.start().await {
            Ok(snapshot) => {
                let mut tracker = self.tracker.lock().await;
                tracker.apply(&snapshot);
                Ok(tracker.status())
            }
            Err(e) => {
                tracing::error!("Failed to start WhatsApp session: {}", e);
                let mut tracker = self.tracker.lock().await;
                if tracker.state() == SessionState::Pairing {
                    tracker.reset();
                }
                Err(e)
            }
        }
    }

    async fn get_status(&self) -> Result<WhatsAppStatus, WhatsAppError> {
        {
            let tracker = self.tracker.lock().await;
            if tracker.state() == SessionState::Unlinked {
                return Ok(tracker.status());
            }
        }

        Ok(self.refresh().await)
    }

    async fn unlink(&self) -> Result<WhatsAppStatus, WhatsAppError> {
        if let Err(e) = self.logout().await {
            tracing::warn!("WhatsApp logout failed, resetting local session anyway: {}", e);
        }

        let mut tracker = self.tracker.lock().await;
        tracker.reset();
        Ok(tracker.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{web, App, HttpResponse, HttpServer};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn snapshot(value: Value) -> BridgeSnapshot {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_to_data_url_shapes() {
        assert_eq!(
            to_data_url(&json!("iVBORw0")).as_deref(),
            Some("data:image/png;base64,iVBORw0")
        );
        assert_eq!(
            to_data_url(&json!("data:image/png;base64,abc")).as_deref(),
            Some("data:image/png;base64,abc")
        );
        assert_eq!(
            to_data_url(&json!({ "image": "abc" })).as_deref(),
            Some("data:image/png;base64,abc")
        );
        assert_eq!(
            to_data_url(&json!({ "payload": "data:image/jpeg;base64,xyz" })).as_deref(),
            Some("data:image/jpeg;base64,xyz")
        );
        assert_eq!(to_data_url(&json!("")), None);
        assert_eq!(to_data_url(&json!({ "other": "abc" })), None);
        assert_eq!(to_data_url(&json!(42)), None);
    }

    #[test]
    fn test_tracker_pairing_to_ready() {
        let mut tracker = SessionTracker::new();
        assert_eq!(tracker.status(), WhatsAppStatus::unlinked());

        tracker.begin_pairing();
        assert_eq!(tracker.status().status, SessionState::Pairing);
        assert_eq!(tracker.status().qr, None);

        tracker.apply(&snapshot(json!({ "state": "QR", "qr": "abc" })));
        let status = tracker.status();
        assert_eq!(status.qr.as_deref(), Some("data:image/png;base64,abc"));
        assert!(!status.linked);

        tracker.apply(&snapshot(json!({ "state": "CONFLICT" })));
        assert_eq!(tracker.state(), SessionState::Pairing);

        // Connected without a number does not count as linked yet
        tracker.apply(&snapshot(json!({ "state": "CONNECTED" })));
        assert_eq!(tracker.state(), SessionState::Pairing);

        tracker.apply(&snapshot(json!({ "state": "CONNECTED", "number": "923001234567" })));
        let status = tracker.status();
        assert!(status.linked);
        assert_eq!(status.status, SessionState::Ready);
        assert_eq!(status.number.as_deref(), Some("923001234567"));
        assert_eq!(status.qr, None);
    }

    #[test]
    fn test_tracker_remote_logout_resets() {
        let mut tracker = SessionTracker::new();
        tracker.begin_pairing();
        tracker.apply(&snapshot(json!({ "state": "CONNECTED", "number": "923001234567" })));

        tracker.apply(&snapshot(json!({ "state": "LOGGED_OUT" })));
        assert_eq!(tracker.status(), WhatsAppStatus::unlinked());
    }

    fn unreachable_bridge() -> BridgeLink {
        BridgeLink::new(&WhatsAppConfig {
            bridge_url: "http://127.0.0.1:1/".to_string(),
            session_id: "test".to_string(),
            request_timeout_secs: 2,
        })
        .unwrap()
    }

    #[test]
    fn test_session_urls() {
        let link = unreachable_bridge();
        assert_eq!(
            link.session_url(Some("start")),
            "http://127.0.0.1:1/sessions/test/start"
        );
        assert_eq!(link.session_url(None), "http://127.0.0.1:1/sessions/test");
    }

    #[tokio::test]
    async fn test_failed_start_resets_to_unlinked() {
        let link = unreachable_bridge();

        assert!(link.request_link().await.is_err());
        assert_eq!(link.tracker.lock().await.state(), SessionState::Unlinked);

        // Unlinked status is served from the cache
        let status = link.get_status().await.unwrap();
        assert_eq!(status, WhatsAppStatus::unlinked());
    }

    #[tokio::test]
    async fn test_unlink_succeeds_when_bridge_is_down() {
        let link = unreachable_bridge();
        link.tracker.lock().await.begin_pairing();

        let status = link.unlink().await.unwrap();
        assert_eq!(status, WhatsAppStatus::unlinked());
    }

    #[derive(Default)]
    struct MockBridge {
        starts: AtomicUsize,
    }

    async fn mock_start(bridge: web::Data<MockBridge>) -> HttpResponse {
        if bridge.starts.fetch_add(1, Ordering::SeqCst) == 0 {
            HttpResponse::Ok().json(json!({ "state": "QR", "qr": "abc" }))
        } else {
            HttpResponse::Conflict().body("session already started")
        }
    }

    async fn mock_session() -> HttpResponse {
        HttpResponse::Ok().json(json!({ "state": "QR", "qr": "def" }))
    }

    /// Bridge that only accepts the first start; later starts answer 409.
    fn spawn_bridge() -> (BridgeLink, web::Data<MockBridge>) {
        let bridge = web::Data::new(MockBridge::default());
        let data = bridge.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .route("/sessions/{id}/start", web::post().to(mock_start))
                .route("/sessions/{id}", web::get().to(mock_session))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        actix_web::rt::spawn(server.run());

        let link = BridgeLink::new(&WhatsAppConfig {
            bridge_url: format!("http://{}", addr),
            session_id: "test".to_string(),
            request_timeout_secs: 5,
        })
        .unwrap();
        (link, bridge)
    }

    #[actix_web::test]
    async fn test_second_link_request_keeps_pairing_session() {
        let (link, bridge) = spawn_bridge();

        let first = link.request_link().await.unwrap();
        assert_eq!(first.status, SessionState::Pairing);
        assert_eq!(first.qr.as_deref(), Some("data:image/png;base64,abc"));

        let second = link.request_link().await.unwrap();
        assert_eq!(second.status, SessionState::Pairing);
        assert_eq!(second.qr.as_deref(), Some("data:image/png;base64,def"));
        assert_eq!(bridge.starts.load(Ordering::SeqCst), 1);

        let status = link.get_status().await.unwrap();
        assert_eq!(status.status, SessionState::Pairing);
        assert!(status.qr.is_some());
    }

    #[actix_web::test]
    async fn test_concurrent_link_requests_start_once() {
        let (link, bridge) = spawn_bridge();

        let (a, b) = tokio::join!(link.request_link(), link.request_link());
        assert_eq!(a.unwrap().status, SessionState::Pairing);
        assert_eq!(b.unwrap().status, SessionState::Pairing);
        assert_eq!(bridge.starts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_relink_while_pairing_keeps_cached_state_when_bridge_is_down() {
        let link = unreachable_bridge();
        link.tracker.lock().await.begin_pairing();

        let status = link.request_link().await.unwrap();
        assert_eq!(status.status, SessionState::Pairing);
        assert_eq!(link.tracker.lock().await.state(), SessionState::Pairing);
    }

    #[tokio::test]
    async fn test_status_falls_back_to_cache() {
        let link = unreachable_bridge();
        link.tracker.lock().await.begin_pairing();

        let status = link.get_status().await.unwrap();
        assert_eq!(status.status, SessionState::Pairing);
    }
}
