//! Device watcher: pings the IoT hub on a fixed interval and alerts when it
//! stops answering.

use std::time::Duration;

use beacon_upstream::{FetchError, Method, UpstreamClient};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use url::Url;

use crate::notify::{NotifyError, Notifier};

const DEVICE_PING: &str = "device/ping";
pub const ALERT_SUBJECT: &str = "OpenSolar IoT Hub DOWN";

#[derive(Clone, PartialEq, Eq)]
pub struct WatcherSettings {
    /// `PUT` target, e.g. `https://api.particle.io/v1/devices/<id>/ping`.
    pub ping_url: Url,
    pub access_token: String,
    pub location: String,
    pub interval: Duration,
    pub recipients: Vec<String>,
}

impl std::fmt::Debug for WatcherSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherSettings")
            .field("ping_url", &self.ping_url.as_str())
            .field("access_token", &"<redacted>")
            .field("location", &self.location)
            .field("interval", &self.interval)
            .field("recipients", &self.recipients)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DeviceStatus {
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub ok: bool,
}

impl DeviceStatus {
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        self.online && self.ok
    }
}

/// Result of one watch cycle.
#[derive(Debug)]
pub enum WatchOutcome {
    Healthy,
    Alerted,
    AlertFailed(NotifyError),
    CheckFailed(FetchError),
}

#[derive(Debug)]
pub struct DeviceWatcher<N> {
    client: UpstreamClient,
    settings: WatcherSettings,
    notifier: N,
}

impl<N: Notifier> DeviceWatcher<N> {
    #[must_use]
    pub fn new(http: reqwest::Client, settings: WatcherSettings, notifier: N) -> Self {
        let client = UpstreamClient::new(http, settings.ping_url.clone());
        Self {
            client,
            settings,
            notifier,
        }
    }

    /// Ping the device once.
    pub async fn check_once(&self) -> Result<DeviceStatus, FetchError> {
        let body = self
            .client
            .fetch(
                DEVICE_PING,
                Method::PutForm,
                self.settings.ping_url.clone(),
                &[("access_token", self.settings.access_token.as_str())],
            )
            .await?;
        serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
            endpoint: DEVICE_PING.to_string(),
            source,
        })
    }

    /// One cycle: check, and alert every recipient if the device is down.
    pub async fn tick(&self, now: DateTime<Utc>) -> WatchOutcome {
        let status = match self.check_once().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(error = %e, "Device check failed");
                return WatchOutcome::CheckFailed(e);
            }
        };
        if status.is_healthy() {
            tracing::debug!("Device is online");
            return WatchOutcome::Healthy;
        }

        tracing::warn!(
            online = status.online,
            ok = status.ok,
            recipients = self.settings.recipients.len(),
            "Device down, sending alerts"
        );
        let body = alert_body(&self.settings.location, now);
        match self
            .notifier
            .notify(ALERT_SUBJECT, &body, &self.settings.recipients)
            .await
        {
            Ok(()) => WatchOutcome::Alerted,
            Err(e) => {
                tracing::warn!(error = %e, "Device alert failed");
                WatchOutcome::AlertFailed(e)
            }
        }
    }

    /// Run forever. Failed checks and failed alerts do not stop the loop.
    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.settings.interval.as_secs(),
            "Device watcher started"
        );
        loop {
            self.tick(Utc::now()).await;
            tokio::time::sleep(self.settings.interval).await;
        }
    }
}

fn alert_body(location: &str, now: DateTime<Utc>) -> String {
    format!(
        "Greetings from your remote notifier!\n\n\
         Your remote IoT Hub in: {location} has not been responding to pings. \
         The timestamp of this alert is: {}. Please take action at the earliest.\n\n\
         Your Friendly Notifier",
        now.format("%Y-%m-%d %H:%M:%S UTC")
    )
}
