// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! The single pipeline every backend call goes through.

use std::sync::Arc;

use log::{debug, warn};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Method,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use url::Url;

use crate::{
    error::{Error, Result},
    transport::{Body, Inbound, Multipart, Outbound, Transport},
};

/// How a successful response body should be handed back.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Decoding {
    /// JSON when the server says so, otherwise text.
    #[default]
    Json,
    Text,
    Binary,
}

#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    Json(Value),
    Multipart(Multipart),
}

/// Describes one outbound call. Built fresh for every call.
#[derive(Clone, Debug)]
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) headers: Vec<(HeaderName, HeaderValue)>,
    pub(crate) decoding: Decoding,
}

impl Request {
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: Vec::new(),
            decoding: Decoding::default(),
        }
    }

    pub fn get<P: Into<String>>(path: P) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post<P: Into<String>>(path: P) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch<P: Into<String>>(path: P) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete<P: Into<String>>(path: P) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn head<P: Into<String>>(path: P) -> Self {
        Self::new(Method::HEAD, path)
    }

    pub fn with_query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = Some(RequestBody::Json(body));
        self
    }

    pub fn with_multipart(mut self, body: Multipart) -> Self {
        self.body = Some(RequestBody::Multipart(body));
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    pub const fn decode_as(mut self, decoding: Decoding) -> Self {
        self.decoding = decoding;
        self
    }
}

/// A decoded successful response.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
    /// The server claimed JSON but sent something we could not parse.
    Null,
}

impl Payload {
    /// Collapses the payload into a JSON value; text becomes a JSON string
    /// and bytes are not representable.
    pub fn into_json(self) -> Value {
        match self {
            Self::Json(value) => value,
            Self::Text(text) => Value::String(text),
            Self::Binary(_) | Self::Null => Value::Null,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => text.into_bytes(),
            Self::Json(value) => value.to_string().into_bytes(),
            Self::Null => Vec::new(),
        }
    }
}

fn error_message(status: u16, payload: Option<&Value>) -> String {
    let non_empty = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    };

    match payload {
        Some(Value::Object(fields)) => {
            non_empty(fields.get("message")).or_else(|| non_empty(fields.get("error")))
        }
        Some(Value::String(text)) => Some(text.trim().to_owned()).filter(|s| !s.is_empty()),
        _ => None,
    }
    .unwrap_or_else(|| format!("HTTP {status}"))
}

fn classify(response: &Inbound) -> Error {
    let status = response.status.as_u16();
    let payload = if response.is_json() {
        serde_json::from_slice(&response.body)
            .map_err(|e| debug!("Could not decode JSON error body: {}", e))
            .ok()
    } else {
        Some(Value::String(
            String::from_utf8_lossy(&response.body).into_owned(),
        ))
    };

    Error::Http {
        status,
        message: error_message(status, payload.as_ref()),
        payload,
    }
}

fn decode(response: Inbound, decoding: Decoding) -> Payload {
    match decoding {
        Decoding::Binary => Payload::Binary(response.body),
        Decoding::Text => Payload::Text(String::from_utf8_lossy(&response.body).into_owned()),
        Decoding::Json if response.is_json() => match serde_json::from_slice(&response.body) {
            Ok(value) => Payload::Json(value),
            Err(e) => {
                warn!("Successful response carried malformed JSON: {}", e);
                Payload::Null
            }
        },
        Decoding::Json => Payload::Text(String::from_utf8_lossy(&response.body).into_owned()),
    }
}

/// Executes requests against one backend.
#[derive(Clone)]
pub struct Client {
    base: Url,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Request paths are resolved under `base`, so a portal mounted below
    /// the server root keeps its prefix.
    pub fn new<T: Transport + 'static>(mut base: Url, transport: T) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self {
            base,
            transport: Arc::new(transport),
        }
    }

    pub const fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, req: &Request) -> Result<Url> {
        let mut url = self.base.join(req.path.trim_start_matches('/')).map_err(|e| {
            Error::validation(format!("invalid request path {:?}: {}", req.path, e))
        })?;
        if !req.query.is_empty() {
            let _ = url.query_pairs_mut().extend_pairs(&req.query);
        }
        Ok(url)
    }

    fn headers(req: &Request, authorization: Option<&SecretString>) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &req.headers {
            let _ = headers.insert(name.clone(), value.clone());
        }

        if let Some(auth) = authorization {
            let mut value = HeaderValue::from_str(auth.expose_secret())
                .map_err(|_| Error::validation("the credential cannot be sent as a header"))?;
            value.set_sensitive(true);
            let _ = headers.insert(AUTHORIZATION, value);
        }

        match req.body {
            Some(RequestBody::Json(_)) => {
                if !headers.contains_key(CONTENT_TYPE) {
                    let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                }
            }
            Some(RequestBody::Multipart(_)) | None => {
                let _ = headers.remove(CONTENT_TYPE);
            }
        }

        Ok(headers)
    }

    fn body(req: Request) -> Result<Option<Body>> {
        if req.method == Method::GET || req.method == Method::HEAD {
            return Ok(None);
        }
        Ok(match req.body {
            Some(RequestBody::Json(value)) => Some(Body::Json(
                serde_json::to_vec(&value).map_err(|e| Error::validation(e.to_string()))?,
            )),
            Some(RequestBody::Multipart(form)) => Some(Body::Multipart(form)),
            None => None,
        })
    }

    /// Runs one request to completion. Either a payload comes back or a
    /// classified error does.
    pub async fn execute(
        &self,
        req: Request,
        authorization: Option<&SecretString>,
    ) -> Result<Payload> {
        let url = self.url(&req)?;
        let headers = Self::headers(&req, authorization)?;
        let method = req.method.clone();
        let decoding = req.decoding;
        let outbound = Outbound {
            method,
            url,
            headers,
            body: Self::body(req)?,
        };

        debug!("{} {}", outbound.method, outbound.url.path());
        let response = self.transport.send(outbound).await.map_err(|e| {
            warn!("Could not reach the backend: {}", e);
            Error::from(e)
        })?;
        debug!("Backend answered {}", response.status);

        if !response.status.is_success() {
            return Err(classify(&response));
        }
        Ok(decode(response, decoding))
    }
}
