//! Session-holding client for the OpenCGA REST API.
//!
//! # Design
//! `OpencgaClient` owns the base URL, the session token and a `Transport`.
//! Each call is split the same way: `build_request` produces an
//! `HttpRequest` as plain data and `parse_response` turns an `HttpResponse`
//! into the single validated `Response`. `call` joins the two through the
//! transport. The token is written once by `login` and then read by every
//! request; there is no refresh, so an expired session surfaces as an
//! `Api` error.
//!
//! The client is `Sync` and meant to be shared (e.g. behind an `Arc`) by all
//! operations of one provider instance. It also owns the lock that serializes
//! file-link creation.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use serde::Serialize;
use tracing::{debug, info};

use crate::envelope::{Envelope, Response};
use crate::error::{OpencgaError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::types::Login;

/// Path prefix of every REST endpoint below the base URL.
pub const REST_PREFIX: &str = "opencga/webservices/rest/v1";

/// Query parameter carrying the session token.
pub const SESSION_PARAM: &str = "sid";

/// Query parameters for a single call, kept sorted for stable URLs.
pub type QueryParams = BTreeMap<String, String>;

pub struct OpencgaClient {
    base_url: String,
    token: RwLock<Option<String>>,
    transport: Box<dyn Transport>,
    file_link_lock: Mutex<()>,
}

impl std::fmt::Debug for OpencgaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpencgaClient")
            .field("base_url", &self.base_url)
            .field("logged_in", &self.token().is_some())
            .finish()
    }
}

impl OpencgaClient {
    /// Client using the default `ureq` transport.
    pub fn new(base_url: &str) -> Self {
        Self::with_transport(base_url, UreqTransport::new())
    }

    pub fn with_transport(base_url: &str, transport: impl Transport + 'static) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        debug!(%base_url, "created api client");
        Self {
            base_url,
            token: RwLock::new(None),
            transport: Box::new(transport),
            file_link_lock: Mutex::new(()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Current session token, if logged in.
    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Log in and keep the returned token for all later calls.
    pub fn login(&self, user: &str, password: &str) -> Result<String> {
        let path = format!("users/{user}/login");
        let body = serde_json::json!({ "password": password });
        let request = self.build_request(&path, &QueryParams::new(), Some(&body))?;

        let response = self.call(&request).map_err(|e| match e {
            OpencgaError::Api { message, .. } => OpencgaError::Auth {
                user: user.to_string(),
                message,
            },
            other => other,
        })?;
        let login: Login = response.decode_first(&path, "login")?;
        if login.token.is_empty() {
            return Err(OpencgaError::Auth {
                user: user.to_string(),
                message: "server returned an empty token".to_string(),
            });
        }

        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(login.token.clone());
        info!(user, "logged in to OpenCGA");
        Ok(login.token)
    }

    /// Build a request for `path`. A body makes it a POST, otherwise GET.
    /// The session token, when present, is sent first as `sid`.
    pub fn build_request<B: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &QueryParams,
        body: Option<&B>,
    ) -> Result<HttpRequest> {
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| OpencgaError::Serialization(e.to_string()))?;

        let mut query = Vec::with_capacity(params.len() + 1);
        if let Some(token) = self.token() {
            query.push((SESSION_PARAM.to_string(), token));
        }
        query.extend(params.iter().map(|(k, v)| (k.clone(), v.clone())));

        Ok(HttpRequest {
            method: if body.is_some() {
                HttpMethod::Post
            } else {
                HttpMethod::Get
            },
            url: format!("{}/{REST_PREFIX}/{path}", self.base_url),
            query,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body,
        })
    }

    /// Validate an envelope and return its single response.
    pub fn parse_response(&self, path: &str, response: HttpResponse) -> Result<Response> {
        Envelope::parse(path, &response.body)?.into_single_response(path)
    }

    /// Execute a built request and return the single validated response.
    pub fn call(&self, request: &HttpRequest) -> Result<Response> {
        let path = self.relative_path(&request.url);
        debug!(method = request.method.as_str(), path, "calling OpenCGA");
        let response = self.transport.execute(request)?;
        debug!(status = response.status, path, "received response");
        self.parse_response(path, response)
    }

    /// Build, execute and parse in one step.
    pub fn get(&self, path: &str, params: &QueryParams) -> Result<Response> {
        let request = self.build_request::<()>(path, params, None)?;
        self.call(&request)
    }

    /// Build, execute and parse a POST in one step.
    pub fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        params: &QueryParams,
        body: &B,
    ) -> Result<Response> {
        let request = self.build_request(path, params, Some(body))?;
        self.call(&request)
    }

    /// Hold this client's file-link lock. OpenCGA races when linking files
    /// that share destination paths within one session.
    pub(crate) fn lock_file_links(&self) -> MutexGuard<'_, ()> {
        self.file_link_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn relative_path<'a>(&self, url: &'a str) -> &'a str {
        url.strip_prefix(&self.base_url)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|rest| rest.strip_prefix(REST_PREFIX))
            .map(|rest| rest.trim_start_matches('/'))
            .unwrap_or(url)
    }
}

/// Build `QueryParams` from literal pairs.
pub fn params<const N: usize>(pairs: [(&str, &str); N]) -> QueryParams {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
