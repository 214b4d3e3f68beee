// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_TYPE},
    multipart, Method, StatusCode,
};
use url::Url;

use crate::{error::Transport as Error, metadata};

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// One named part of a multipart upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Part {
    pub fn new<N: Into<String>, B: Into<Vec<u8>>>(name: N, bytes: B) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_filename<F: Into<String>>(mut self, filename: F) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_content_type<C: Into<String>>(mut self, content_type: C) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A multipart payload. The transport chooses the boundary and sets the
/// matching content type itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Multipart {
    pub parts: Vec<Part>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    /// An already-encoded JSON document.
    Json(Vec<u8>),
    Multipart(Multipart),
}

/// A fully assembled request, ready to go on the wire.
#[derive(Clone, Debug)]
pub struct Outbound {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Body>,
}

/// A complete response. The body has been read in full.
#[derive(Clone, Debug)]
pub struct Inbound {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Inbound {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    pub fn with_body<C: AsRef<str>, B: Into<Vec<u8>>>(mut self, content_type: C, body: B) -> Self {
        if let Ok(value) = HeaderValue::from_str(content_type.as_ref()) {
            let _ = self.headers.insert(CONTENT_TYPE, value);
        }
        self.body = body.into();
        self
    }

    pub fn json(status: StatusCode, value: &serde_json::Value) -> Self {
        Self::new(status).with_body("application/json", value.to_string())
    }

    pub fn content_type(&self) -> &str {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
    }

    pub fn is_json(&self) -> bool {
        self.content_type().contains("application/json")
    }
}

/// Moves one request to the backend and brings back its response. An error
/// means no usable response was obtained at all.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Outbound) -> Result<Inbound>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Outbound) -> Result<Inbound> {
        (**self).send(request).await
    }
}

#[derive(Clone)]
pub struct Reqwest {
    client: reqwest::Client,
}

impl Reqwest {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder()
                .user_agent(metadata::USER_AGENT.as_str())
                .build()
                .map_err(Error::Client)?,
        })
    }

    fn form(body: Multipart) -> Result<multipart::Form> {
        let mut form = multipart::Form::new();
        for part in body.parts {
            let mut encoded = multipart::Part::bytes(part.bytes);
            if let Some(filename) = part.filename {
                encoded = encoded.file_name(filename);
            }
            if let Some(content_type) = part.content_type {
                encoded = encoded.mime_str(&content_type).map_err(Error::Malformed)?;
            }
            form = form.part(part.name, encoded);
        }
        Ok(form)
    }
}

#[async_trait]
impl Transport for Reqwest {
    async fn send(&self, request: Outbound) -> Result<Inbound> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        builder = match request.body {
            Some(Body::Json(bytes)) => builder.body(bytes),
            Some(Body::Multipart(body)) => builder.multipart(Self::form(body)?),
            None => builder,
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        debug!("Received {} bytes with status {}", body.len(), status);

        Ok(Inbound {
            status,
            headers,
            body,
        })
    }
}


#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use super::*;

    #[tokio::test]
    async fn refused_connections_are_transport_errors() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = Reqwest::new().unwrap();
        let result = transport
            .send(Outbound {
                method: Method::GET,
                url: Url::parse(&format!("http://{addr}/api/users/me")).unwrap(),
                headers: HeaderMap::new(),
                body: None,
            })
            .await;
        assert!(matches!(result, Err(Error::Http(_))));
    }

    #[tokio::test]
    async fn bad_part_content_types_are_caught_before_sending() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let transport = Reqwest::new().unwrap();
        let result = transport
            .send(Outbound {
                method: Method::POST,
                url: Url::parse(&format!("http://{addr}/api/auth/register")).unwrap(),
                headers: HeaderMap::new(),
                body: Some(Body::Multipart(Multipart::new().part(
                    Part::new("idFront", vec![1, 2, 3]).with_content_type("not a mime"),
                ))),
            })
            .await;
        assert!(matches!(result, Err(Error::Malformed(_))));
        drop(listener);
    }

    #[test]
    fn inbound_recognizes_json_content_types() {
        let inbound = Inbound::new(StatusCode::OK).with_body("application/json; charset=utf-8", "{}");
        assert!(inbound.is_json());
        assert!(!Inbound::new(StatusCode::OK).with_body("text/plain", "hi").is_json());
        assert_eq!(Inbound::new(StatusCode::NO_CONTENT).content_type(), "");
    }
}
