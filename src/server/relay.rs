//! Signup and analytics relays

use axum::{
    body::{to_bytes, Body},
    extract::{FromRequest, Multipart, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use http_body_util::LengthLimitError;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

use super::RelayState;
use crate::helpers::encode_query_component;

/// Form encodings the signup relay accepts
pub const ACCEPTED_FORM_TYPES: [&str; 2] = ["application/x-www-form-urlencoded", "multipart/form-data"];

/// Largest analytics event body forwarded upstream
const MAX_EVENT_BYTES: usize = 64 * 1024;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

/// Check an address with the signup form's pattern
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// POST /api/addcontact
pub async fn add_contact(State(state): State<Arc<RelayState>>, request: Request) -> Response {
    let mime = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .unwrap_or_default();

    if !ACCEPTED_FORM_TYPES.contains(&mime.as_str()) {
        return bad_request("Invalid headers");
    }

    let referer = request
        .headers()
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let email = match read_email_field(&mime, request).await {
        Ok(email) => email,
        Err(response) => return response,
    };
    let email = match email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty()) {
        Some(email) => email,
        None => return bad_request("No email passed"),
    };
    if !is_valid_email(&email) {
        return bad_request("Invalid email");
    }

    let Some(api_key) = state.contact_api_key.as_deref() else {
        tracing::warn!("Signup rejected: no contact API key configured");
        return (StatusCode::SERVICE_UNAVAILABLE, "Signup is not configured").into_response();
    };

    let upstream = state
        .client
        .put(&state.contact_api_url)
        .bearer_auth(api_key)
        .json(&json!({ "contacts": [{ "email": email }] }))
        .send()
        .await;

    match upstream {
        Ok(res) if res.status().is_success() => {
            tracing::info!("Added contact from {}", referer.as_deref().unwrap_or("unknown page"));
            let location = match referer {
                Some(referer) => format!(
                    "{}?returnTo={}",
                    state.thanks_path,
                    encode_query_component(&referer)
                ),
                None => state.thanks_path.clone(),
            };
            Redirect::to(&location).into_response()
        }
        Ok(res) => {
            tracing::warn!("Contact API answered {}", res.status());
            passthrough(res).await
        }
        Err(e) => {
            tracing::warn!("Contact API unreachable: {}", e);
            (StatusCode::BAD_GATEWAY, "Contact list is unavailable").into_response()
        }
    }
}

/// Pull the `email` field out of a form body
async fn read_email_field(mime: &str, request: Request) -> Result<Option<String>, Response> {
    if mime == "multipart/form-data" {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| bad_request("Invalid form body"))?;
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|_| bad_request("Invalid form body"))?
        {
            if field.name() == Some("email") {
                let value = field.text().await.map_err(|_| bad_request("Invalid form body"))?;
                return Ok(Some(value));
            }
        }
        return Ok(None);
    }

    let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
        .await
        .map_err(|_| bad_request("Invalid form body"))?;
    Ok(fields.get("email").cloned())
}

/// POST /api/event
pub async fn track_event(State(state): State<Arc<RelayState>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match to_bytes(body, MAX_EVENT_BYTES).await {
        Ok(body) => body,
        Err(e) if exceeds_limit(&e) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Event body is too large").into_response()
        }
        Err(_) => return bad_request("Invalid event body"),
    };

    let mut headers = parts.headers;
    headers.remove(header::COOKIE);
    strip_hop_headers(&mut headers);

    let upstream = state
        .client
        .post(&state.event_api_url)
        .headers(headers)
        .body(body)
        .send()
        .await;

    match upstream {
        Ok(res) => passthrough(res).await,
        Err(e) => {
            tracing::warn!("Analytics API unreachable: {}", e);
            (StatusCode::BAD_GATEWAY, "Analytics endpoint is unavailable").into_response()
        }
    }
}

/// Relay an upstream response unchanged
async fn passthrough(upstream: reqwest::Response) -> Response {
    let status = upstream.status();
    let mut headers = upstream.headers().clone();
    strip_hop_headers(&mut headers);

    match upstream.bytes().await {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            response
        }
        Err(e) => {
            tracing::warn!("Failed to read upstream body: {}", e);
            (StatusCode::BAD_GATEWAY, "Upstream response was interrupted").into_response()
        }
    }
}

/// Whether a body read failed on the size limit
fn exceeds_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

fn strip_hop_headers(headers: &mut HeaderMap) {
    for name in [
        header::HOST,
        header::CONNECTION,
        header::CONTENT_LENGTH,
        header::TRANSFER_ENCODING,
    ] {
        headers.remove(name);
    }
}

fn bad_request(reason: &'static str) -> Response {
    (StatusCode::BAD_REQUEST, reason).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("jane@example.com"));
        assert!(is_valid_email("first.last+tag@mail.example.co"));
        assert!(!is_valid_email("jane"));
        assert!(!is_valid_email("jane@localhost"));
        assert!(!is_valid_email("jane doe@example.com"));
        assert!(!is_valid_email("@example.com"));
    }
}
