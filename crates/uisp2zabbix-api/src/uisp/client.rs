// Hand-crafted async HTTP client for the UISP NMS API (v2.1).
//
// Base path: whatever `UISP_ENDPOINT` points at, e.g. `/nms/api/v2.1/`
// Auth: x-auth-token header

use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// History window accepted by `GET /devices/{id}/statistics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatisticsInterval {
    Hour,
    FourHours,
    Day,
    Week,
    Month,
    Quarter,
    Year,
    Range,
}

impl StatisticsInterval {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::FourHours => "fourhours",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
            Self::Range => "range",
        }
    }
}

/// Async client for the UISP NMS API.
///
/// Records are returned as loosely-typed JSON: the bridge core owns the
/// decision of which fields matter and how a malformed record fails.
#[derive(Clone)]
pub struct UispClient {
    http: reqwest::Client,
    base_url: Url,
}

impl UispClient {
    /// Build from an auth token and transport config.
    ///
    /// Injects `x-auth-token` as a default header on every request.
    pub fn new(
        base_url: &Url,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        let mut token_value =
            HeaderValue::from_str(token.expose_secret()).map_err(|e| Error::Authentication {
                message: format!("invalid UISP token header value: {e}"),
            })?;
        token_value.set_sensitive(true);
        headers.insert("x-auth-token", token_value);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self::with_client(http, base_url))
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: &Url) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
        }
    }

    /// The API root every endpoint is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── Endpoints ───────────────────────────────────────────────────

    /// List every data link known to UISP.
    ///
    /// `GET {endpoint}/data-links`. An empty list is treated as a failed
    /// download: a healthy UISP instance always has at least one link.
    pub async fn list_data_links(&self) -> Result<Vec<serde_json::Value>, Error> {
        debug!("listing data links");
        let links: Vec<serde_json::Value> = self.get(self.url("data-links")?, &[]).await?;
        if links.is_empty() {
            return Err(Error::EmptyResponse {
                resource: "data links",
            });
        }
        Ok(links)
    }

    /// List every device known to UISP.
    ///
    /// `GET {endpoint}/devices`
    pub async fn list_devices(&self) -> Result<Vec<serde_json::Value>, Error> {
        debug!("listing devices");
        let devices: Vec<serde_json::Value> = self.get(self.url("devices")?, &[]).await?;
        if devices.is_empty() {
            return Err(Error::EmptyResponse { resource: "devices" });
        }
        Ok(devices)
    }

    /// Fetch the statistics history of one device.
    ///
    /// `GET {endpoint}/devices/{id}/statistics?interval=...`
    pub async fn device_statistics(
        &self,
        device_id: &str,
        interval: StatisticsInterval,
    ) -> Result<serde_json::Value, Error> {
        debug!(device_id, interval = interval.as_str(), "fetching device statistics");
        let url = self.url(&format!("devices/{device_id}/statistics"))?;
        self.get(url, &[("interval", interval.as_str())]).await
    }

    // ── Request helpers ─────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url, params: &[(&str, &str)]) -> Result<T, Error> {
        debug!("GET {url}");

        let resp = self.http.get(url).query(params).send().await?;
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(Error::Authentication {
                message: format!("UISP rejected the auth token (HTTP {})", status.as_u16()),
            });
        }

        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let preview: String = body.chars().take(200).collect();
            return Err(Error::Uisp {
                status: status.as_u16(),
                message: if preview.is_empty() {
                    status.to_string()
                } else {
                    preview
                },
            });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body))
    }
}

/// Ensure the base path ends with `/` so relative joins append instead of
/// replacing the last segment (`.../v2.1` + `devices` would lose `v2.1`).
fn normalize_base_url(raw: &Url) -> Url {
    let mut url = raw.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
