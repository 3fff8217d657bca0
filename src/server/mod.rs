//! Relay server
//!
//! Serves the public directory and the two relay endpoints that stand in
//! front of third-party services: the email signup form and the analytics
//! event beacon.

mod relay;

use anyhow::Result;
use axum::{
    http::{header, HeaderName, HeaderValue},
    routing::post,
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::SiteConfig;
use crate::Site;

pub use relay::{is_valid_email, ACCEPTED_FORM_TYPES};

/// Content-Security-Policy sent with every response
const CONTENT_SECURITY_POLICY: &str = "img-src * 'self'; \
    font-src * 'self' data:; \
    style-src 'self' 'unsafe-inline'; \
    default-src 'self'; \
    script-src 'self' 'unsafe-inline'";

/// Feature-Policy sent with every response
const FEATURE_POLICY: &str = "microphone 'none'; geolocation 'none'; document-domain 'none'; \
    display-capture 'none'; fullscreen 'none'; gamepad 'none'; gyroscope 'none'; \
    sync-xhr 'none'; screen-wake-lock 'none';";

/// Shared relay state
#[derive(Debug, Clone)]
pub struct RelayState {
    pub client: reqwest::Client,
    pub contact_api_url: String,
    pub event_api_url: String,
    pub thanks_path: String,
    /// Signup is disabled when unset
    pub contact_api_key: Option<String>,
    pub public_dir: PathBuf,
}

impl RelayState {
    pub fn from_config(config: &SiteConfig, public_dir: PathBuf) -> Self {
        Self {
            client: reqwest::Client::new(),
            contact_api_url: config.relay.contact_api_url.clone(),
            event_api_url: config.relay.event_api_url.clone(),
            thanks_path: config.relay.thanks_path.clone(),
            contact_api_key: config.relay.contact_api_key.clone(),
            public_dir,
        }
    }
}

/// Build the relay router
pub fn router(state: RelayState) -> Router {
    let public_dir = state.public_dir.clone();

    Router::new()
        .route("/api/addcontact", post(relay::add_contact))
        .route("/api/event", post(relay::track_event))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(Arc::new(state))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static("feature-policy"),
            HeaderValue::from_static(FEATURE_POLICY),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        ))
        .layer(TraceLayer::new_for_http())
}

/// Start the relay server
pub async fn start(site: &Site, ip: &str, port: u16) -> Result<()> {
    let state = RelayState::from_config(&site.config, site.public_dir.clone());
    if state.contact_api_key.is_none() {
        tracing::warn!("No contact API key configured; /api/addcontact will answer 503");
    }

    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
