// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! HTTP client for the dSS smart-meter API.
//!
//! All REST access goes through [`ApiClient::request`]: plain GET requests
//! against `/api/v1/` with bearer-token authentication. The same client
//! also opens the notification WebSocket.

use std::sync::Arc;
use std::time::Duration;

use actix_codec::Framed;
use actix_web::http::header;
use awc::ws::Codec;
use awc::{BoxedSocket, ClientResponse};
use log::{debug, warn};
use serde_json::Value;
use url::Url;

use crate::configuration::{DssSettings, ENV_DISABLE_CERT_VERIFICATION};
use crate::errors::ServiceError;
use crate::util::json::f64_value;
use crate::util::{bool_from_env, create_client_tls_config};

/// Response body limit. Apartment structures with many devices can get big,
/// metering responses are tiny.
const MAX_JSON_BODY: usize = 4 * 1024 * 1024;

#[derive(Clone)]
pub struct ApiClient {
    client: awc::Client,
    base_url: Url,
    token: String,
    request_timeout: Duration,
}

impl ApiClient {
    pub fn new(settings: &DssSettings) -> Result<Self, ServiceError> {
        let connection_timeout = Duration::from_secs(settings.connection_timeout as u64);
        let client = if settings.get_url().scheme() == "https" {
            let accept_invalid_certs = settings.disable_cert_verification
                || bool_from_env(ENV_DISABLE_CERT_VERIFICATION);
            if accept_invalid_certs {
                warn!("dSS server certificate verification is disabled");
            }
            let config = create_client_tls_config(accept_invalid_certs)?;
            let connector = awc::Connector::new().rustls_0_23(Arc::clone(&config));
            awc::ClientBuilder::new()
                .timeout(connection_timeout)
                .connector(connector)
                .finish()
        } else {
            awc::ClientBuilder::new()
                .timeout(connection_timeout)
                .finish()
        };

        Ok(Self {
            client,
            base_url: settings.get_url(),
            token: settings.get_token(),
            request_timeout: Duration::from_secs(settings.request_timeout as u64),
        })
    }

    /// GET `/api/v1/{path}` and deserialize the JSON body.
    pub async fn request(&self, path: &str) -> Result<Value, ServiceError> {
        let url = self.endpoint(path)?;
        debug!("GET {url}");

        let mut response = self
            .client
            .get(url.as_str())
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", self.token)))
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if status == awc::http::StatusCode::UNAUTHORIZED
            || status == awc::http::StatusCode::FORBIDDEN
        {
            return Err(ServiceError::BadRequest(format!(
                "dSS rejected application token ({status})"
            )));
        }
        if !status.is_success() {
            return Err(ServiceError::ServiceUnavailable(format!(
                "{path}: dSS returned {status}"
            )));
        }

        Ok(response.json::<Value>().limit(MAX_JSON_BODY).await?)
    }

    /// GET a metering endpoint and extract the `data.value` number.
    pub async fn metering_value(&self, path: &str) -> Result<f64, ServiceError> {
        let json = self.request(path).await?;
        json.get("data")
            .and_then(|data| f64_value(data, "value"))
            .ok_or_else(|| {
                ServiceError::SerializationError(format!("{path}: missing data.value"))
            })
    }

    /// Open the notification WebSocket.
    pub async fn ws(
        &self,
        url: &Url,
        max_frame_size: usize,
    ) -> Result<(ClientResponse, Framed<BoxedSocket, Codec>), ServiceError> {
        let request = self
            .client
            .ws(url.as_str())
            .header(header::AUTHORIZATION, format!("Bearer {}", self.token))
            .max_frame_size(max_frame_size);
        Ok(request.connect().await?)
    }

    fn endpoint(&self, path: &str) -> Result<Url, ServiceError> {
        self.base_url
            .join(&format!("/api/v1/{}", path.trim_start_matches('/')))
            .map_err(|e| ServiceError::BadRequest(format!("invalid request path {path}: {e}")))
    }
}
