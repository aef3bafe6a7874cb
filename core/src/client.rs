//! Stateless HTTP request builder and response parser for the user API.
//!
//! # Design
//! `UserClient` holds only a `base_url` and carries no mutable state between
//! calls. Each CRUD operation is split into a `build_*` method that produces
//! an `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! The caller executes the actual HTTP round-trip, keeping the client
//! deterministic and free of I/O. Nothing here retries; in particular a
//! create must never be replayed, since the server would assign a second id.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{DataEnvelope, ErrorEnvelope, NewUser, User, UserId, UserPatch};

/// Synchronous, stateless client for the user API.
#[derive(Debug, Clone)]
pub struct UserClient {
    base_url: String,
}

impl UserClient {
    /// `base_url` includes any path prefix the backend mounts the
    /// collection under, e.g. `http://host/api`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_path(&self) -> String {
        format!("{}/users", self.base_url)
    }

    fn item_path(&self, id: UserId) -> String {
        format!("{}/users/{id}", self.base_url)
    }

    pub fn build_list_users(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.collection_path(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_get_user(&self, id: UserId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            path: self.item_path(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn build_create_user(&self, input: &NewUser) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Post, self.collection_path(), input)
    }

    pub fn build_update_user(&self, id: UserId, input: &UserPatch) -> Result<HttpRequest, ApiError> {
        json_request(HttpMethod::Put, self.item_path(id), input)
    }

    pub fn build_delete_user(&self, id: UserId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            path: self.item_path(id),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn parse_list_users(&self, response: HttpResponse) -> Result<Vec<User>, ApiError> {
        if !response.is_success() {
            return Err(http_error(response));
        }
        decode_data(&response.body)
    }

    pub fn parse_get_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        if response.status == 404 {
            return Err(ApiError::NotFound);
        }
        if !response.is_success() {
            return Err(http_error(response));
        }
        decode_data(&response.body)
    }

    pub fn parse_create_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        if !response.is_success() {
            return Err(rejection(response));
        }
        decode_data(&response.body)
    }

    pub fn parse_update_user(&self, response: HttpResponse) -> Result<User, ApiError> {
        if !response.is_success() {
            return Err(rejection(response));
        }
        decode_data(&response.body)
    }

    pub fn parse_delete_user(&self, response: HttpResponse) -> Result<(), ApiError> {
        if !response.is_success() {
            return Err(http_error(response));
        }
        Ok(())
    }
}

fn json_request<B: Serialize>(method: HttpMethod, path: String, input: &B) -> Result<HttpRequest, ApiError> {
    let body = serde_json::to_string(input).map_err(|e| ApiError::SerializationError(e.to_string()))?;
    debug!(method = method.as_str(), %path, "built json request");
    Ok(HttpRequest {
        method,
        path,
        headers: vec![("content-type".to_string(), "application/json".to_string())],
        body: Some(body),
    })
}

/// Unwrap the `{data: ...}` envelope.
fn decode_data<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str::<DataEnvelope<T>>(body)
        .map(|envelope| envelope.data)
        .map_err(|e| {
            warn!(error = %e, "response body is not a data envelope");
            ApiError::DeserializationError(e.to_string())
        })
}

fn http_error(response: HttpResponse) -> ApiError {
    warn!(status = response.status, "unexpected HTTP status");
    ApiError::HttpError {
        status: response.status,
        body: response.body,
    }
}

/// A rejected write is a `Validation` error only when the backend explains
/// itself with a non-empty message list.
fn rejection(response: HttpResponse) -> ApiError {
    match serde_json::from_str::<ErrorEnvelope>(&response.body) {
        Ok(envelope) if !envelope.messages.is_empty() => {
            warn!(status = response.status, messages = ?envelope.messages, "payload rejected");
            ApiError::Validation {
                status: response.status,
                messages: envelope.messages,
            }
        }
        _ => http_error(response),
    }
}
