// Copyright (c) 2024 Jens Obermayer <jens@ds-intg.dev>
// SPDX-License-Identifier: MPL-2.0

//! Configuration file handling.

use config::Config;
use log::warn;
use serde_with::{DurationMilliSeconds, DurationSeconds, serde_as};
use std::env;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use url::Url;

/// Default configuration file.
pub const DEF_CONFIG_FILE: &str = "ds-intg.yaml";

pub const DEF_DSS_URL: &str = "https://dss.local:8080";

/// Environment variable overriding the dSS application token.
///
/// Nested configuration keys containing a `_` cannot be set through the generic
/// `DS_` environment source, so the token gets its own variable.
pub const ENV_APP_TOKEN: &str = "DS_APPTOKEN";

/// Environment variable to enable dSS WebSocket message tracing.
///
/// Valid values:
/// - `all`: enable incoming and outgoing message traces
/// - `in`: only incoming messages
/// - `out`: only outgoing messages
pub const ENV_DSS_MSG_TRACING: &str = "DS_DSS_MSG_TRACING";

/// Environment variable to disable TLS verification of the dSS server certificate.
pub const ENV_DISABLE_CERT_VERIFICATION: &str = "DS_DISABLE_CERT_VERIFICATION";

#[derive(Default, serde::Deserialize, serde::Serialize)]
pub struct Settings {
    pub integration: IntegrationSettings,
    pub dss: DssSettings,
}

#[derive(serde::Deserialize, serde::Serialize)]
pub struct IntegrationSettings {
    pub interface: String,
    pub http: WebServerSettings,
}

impl Default for IntegrationSettings {
    fn default() -> Self {
        Self {
            interface: "0.0.0.0".to_string(),
            http: WebServerSettings {
                enabled: true,
                port: 8600,
            },
        }
    }
}

#[derive(serde::Deserialize, serde::Serialize)]
pub struct WebServerSettings {
    pub enabled: bool,
    pub port: u16,
}

#[serde_as]
#[derive(Clone, serde::Deserialize, serde::Serialize)]
pub struct DssSettings {
    url: Url,
    app_token: String,
    /// Connection timeout in seconds.
    /// This is the max time allowed to connect to the remote host, including DNS name resolution.
    /// Make sure that `request_timeout` >= `connection_timeout`.
    pub connection_timeout: u8,
    /// Request timeout in seconds.
    /// This is the total time before a response must be received. Should be equal or greater than `connection_timeout`.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u8,
    /// How often the circuit and modbus meters are polled.
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "poll_interval_sec")]
    pub poll_interval: Duration,
    pub max_frame_size_kb: usize,
    pub reconnect: ReconnectSettings,
    pub heartbeat: HeartbeatSettings,
    /// Disables certificate verification for the dSS connection.
    /// Most dSS appliances only provide a self-signed certificate.
    #[serde(default = "default_disable_cert_verification")]
    pub disable_cert_verification: bool,
}

impl Default for DssSettings {
    fn default() -> Self {
        Self {
            url: Url::parse(DEF_DSS_URL).unwrap(),
            app_token: "".to_string(),
            connection_timeout: 6,
            request_timeout: default_request_timeout(),
            poll_interval: Duration::from_secs(30),
            max_frame_size_kb: 1024,
            reconnect: Default::default(),
            heartbeat: Default::default(),
            disable_cert_verification: default_disable_cert_verification(),
        }
    }
}

impl DssSettings {
    /// Return the configured dSS base URL (http or https scheme).
    pub fn get_url(&self) -> Url {
        self.url.clone()
    }

    /// Return the dSS application token.
    ///
    /// The [`ENV_APP_TOKEN`] environment variable takes precedence over the
    /// configuration file value.
    pub fn get_token(&self) -> String {
        env::var(ENV_APP_TOKEN).unwrap_or_else(|_| self.app_token.clone())
    }

    /// WebSocket URL of the dSS notification endpoint, derived from the base URL.
    pub fn notification_url(&self) -> Url {
        let mut url = self.url.clone();
        let scheme = if url.scheme() == "http" { "ws" } else { "wss" };
        url.set_scheme(scheme).expect("invalid scheme");
        url.set_path("/api/v1/apartment/notifications");
        url
    }

    /// Update the configured dSS base URL.
    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    /// Update the configured application token.
    pub fn set_token(&mut self, token: impl AsRef<str>) {
        self.app_token = token.as_ref().trim().to_string();
    }
}

fn default_request_timeout() -> u8 {
    6
}
fn default_disable_cert_verification() -> bool {
    false
}

#[serde_as]
#[derive(Clone, serde::Deserialize, serde::Serialize)]
pub struct ReconnectSettings {
    pub attempts: u32,
    #[serde_as(as = "DurationMilliSeconds")]
    #[serde(rename = "duration_ms")]
    pub duration: Duration,
    #[serde_as(as = "DurationMilliSeconds")]
    #[serde(rename = "duration_max_ms")]
    pub duration_max: Duration,
    pub backoff_factor: f32,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            attempts: 0,
            duration: Duration::from_secs(1),
            duration_max: Duration::from_secs(30),
            backoff_factor: 1.5,
        }
    }
}

/// WebSocket heartbeat settings for sending ping frames.
#[serde_as]
#[derive(Clone, Copy, serde::Deserialize, serde::Serialize)]
pub struct HeartbeatSettings {
    /// How often heartbeat pings are sent
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "interval_sec")]
    pub interval: Duration,
    /// How long before lack of server response causes a timeout
    #[serde_as(as = "DurationSeconds")]
    #[serde(rename = "timeout_sec")]
    pub timeout: Duration,
}

impl Default for HeartbeatSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(20),
            timeout: Duration::from_secs(40),
        }
    }
}

impl Display for HeartbeatSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Heartbeat interval={:?}, timeout={:?}",
            self.interval, self.timeout
        )
    }
}

/// Load the configuration settings.
///
/// The application provides default values which can be overriden in the following order:
/// 1. Configuration settings in the read-only yaml configuration file specified in `filename`
/// 2. Environment variables with prefix `DS_` (works only for cfg keys not containing a `_`!)
pub fn get_configuration(filename: Option<&str>) -> Result<Settings, config::ConfigError> {
    // default configuration
    let mut config = Config::builder().add_source(Config::try_from(&Settings::default())?);
    // read optional configuration file to override defaults
    if let Some(filename) = filename {
        config = config.add_source(config::File::with_name(filename));
    }

    // Add in settings from the environment (with a prefix of DS)
    // E.g. `DS_DSS_URL=https://192.168.1.10:8080` would set the `dss.url` key
    // This does NOT WORK for nested configurations! https://github.com/mehcode/config-rs/issues/312
    let config = config
        .add_source(config::Environment::with_prefix("DS").separator("_"))
        .build()?;

    let settings: Settings = config.try_deserialize()?;

    check_cfg_values(settings)
}

fn check_cfg_values(mut settings: Settings) -> Result<Settings, config::ConfigError> {
    if settings.dss.reconnect.backoff_factor < 1.0
        || settings.dss.reconnect.duration.as_millis() < 100
        || settings.dss.reconnect.duration_max.as_millis() < 1000
    {
        warn!("Invalid dSS reconnect settings, using defaults.");
        settings.dss.reconnect = Default::default();
    }

    if settings.dss.heartbeat.interval.as_secs() < 5
        || settings.dss.heartbeat.timeout.as_secs() < 5
        || settings.dss.heartbeat.timeout.as_secs() <= settings.dss.heartbeat.interval.as_secs()
    {
        warn!("Invalid dSS heartbeat settings, using defaults.");
        settings.dss.heartbeat = Default::default();
    }

    if settings.dss.poll_interval.as_secs() < 5 {
        warn!("Invalid dSS poll interval, using default.");
        settings.dss.poll_interval = DssSettings::default().poll_interval;
    }

    match settings.dss.url.scheme() {
        "http" | "https" => {}
        "ws" => settings.dss.url.set_scheme("http").unwrap(),
        "wss" => settings.dss.url.set_scheme("https").unwrap(),
        scheme => {
            return Err(config::ConfigError::Message(format!(
                "invalid scheme in dss.url: {scheme}. Valid: [http, https]"
            )));
        }
    }

    Ok(settings)
}
