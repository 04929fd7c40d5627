// Async JSON-RPC 2.0 client for the Zabbix API.
//
// Endpoint: {ZABBIX_URL}/api_jsonrpc.php
// Auth: `user.login` token, sent as `Authorization: Bearer` afterwards.
// Bearer auth needs Zabbix 6.4 or newer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const RPC_PATH: &str = "api_jsonrpc.php";

// ── JSON-RPC envelope ────────────────────────────────────────────────

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    method: &'a str,
    params: &'a P,
    id: u64,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
    #[serde(default)]
    data: String,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Zabbix JSON-RPC API.
///
/// Holds the session token obtained by [`login`](Self::login), plus the
/// credentials used, so a session Zabbix has expired is renewed once and
/// the call retried. All inventory methods (groups, templates, items,
/// hosts) live in `inventory.rs` as inherent methods on this type.
///
/// Requires Zabbix 6.4 or newer.
pub struct ZabbixClient {
    http: reqwest::Client,
    endpoint: Url,
    token: RwLock<Option<SecretString>>,
    credentials: RwLock<Option<(String, SecretString)>>,
    next_id: AtomicU64,
}

impl ZabbixClient {
    /// Build from the Zabbix frontend URL and a transport config.
    ///
    /// `base_url` may be the frontend root (`https://zabbix.example/`) or
    /// the RPC endpoint itself (`.../api_jsonrpc.php`).
    pub fn new(base_url: &Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::with_client(http, base_url)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &Url) -> Result<Self, Error> {
        Ok(Self {
            http,
            endpoint: rpc_endpoint(base_url)?,
            token: RwLock::new(None),
            credentials: RwLock::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    /// The resolved `api_jsonrpc.php` URL.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Whether a session token is currently held.
    pub fn is_logged_in(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    // ── Session lifecycle ───────────────────────────────────────────

    /// Log in with username + password and keep the returned token.
    ///
    /// `user.login {username, password}`
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<(), Error> {
        let params = json!({
            "username": username,
            "password": password.expose_secret(),
        });
        let token: String = self
            .call_unauthenticated("user.login", &params)
            .await
            .map_err(|e| match e {
                Error::ZabbixApi { message, data, .. } => Error::Authentication {
                    message: format!("{message} {data}").trim().to_owned(),
                },
                other => other,
            })?;

        *self.token.write().unwrap_or_else(PoisonError::into_inner) =
            Some(SecretString::from(token));
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) =
            Some((username.to_owned(), password.clone()));
        info!(endpoint = %self.endpoint, "logged into Zabbix");
        Ok(())
    }

    /// Invalidate the session token.
    ///
    /// `user.logout []`. A client that never logged in is a no-op.
    pub async fn logout(&self) -> Result<(), Error> {
        if !self.is_logged_in() {
            return Ok(());
        }
        *self.credentials.write().unwrap_or_else(PoisonError::into_inner) = None;
        let _: bool = self.call_once("user.logout", &json!([])).await?;
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
        debug!("logged out of Zabbix");
        Ok(())
    }

    // ── Request helpers ─────────────────────────────────────────────

    /// Call an authenticated JSON-RPC method and decode its `result`.
    ///
    /// A rejected session triggers one fresh `user.login` with the stored
    /// credentials and one retry of the call.
    pub async fn call<T, P>(&self, method: &str, params: &P) -> Result<T, Error>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        match self.call_once(method, params).await {
            Err(err) if err.is_auth_expired() => {
                let Some((username, password)) = self.stored_credentials() else {
                    return Err(err);
                };
                warn!(method, error = %err, "Zabbix session rejected, logging in again");
                self.login(&username, &password).await?;
                self.call_once(method, params).await
            }
            other => other,
        }
    }

    fn stored_credentials(&self) -> Option<(String, SecretString)> {
        self.credentials
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn call_once<T, P>(&self, method: &str, params: &P) -> Result<T, Error>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        let token = self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(Error::NotLoggedIn)?;
        self.send(method, params, Some(&token)).await
    }

    async fn call_unauthenticated<T, P>(&self, method: &str, params: &P) -> Result<T, Error>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        self.send(method, params, None).await
    }

    async fn send<T, P>(
        &self,
        method: &str,
        params: &P,
        token: Option<&SecretString>,
    ) -> Result<T, Error>
    where
        T: DeserializeOwned,
        P: Serialize + Sync,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "POST {}", self.endpoint);

        let request = RpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id,
        };

        let mut builder = self.http.post(self.endpoint.clone()).json(&request);
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let preview: String = body.chars().take(200).collect();
            return Err(Error::ZabbixApi {
                code: i64::from(status.as_u16()),
                message: format!("HTTP {status}"),
                data: preview,
            });
        }

        let envelope: RpcResponse<T> =
            serde_json::from_str(&body).map_err(|e| Error::deserialization(&e, body.clone()))?;

        if let Some(err) = envelope.error {
            return Err(Error::ZabbixApi {
                code: err.code,
                message: err.message,
                data: err.data,
            });
        }

        envelope.result.ok_or_else(|| Error::Deserialization {
            message: format!("{method}: response carried neither result nor error"),
            body,
        })
    }
}

/// Resolve the RPC endpoint from a frontend URL.
fn rpc_endpoint(base: &Url) -> Result<Url, Error> {
    if base.path().ends_with(RPC_PATH) {
        return Ok(base.clone());
    }
    let mut url = base.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url.join(RPC_PATH)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_from_frontend_root() {
        let url = Url::parse("https://zabbix.example").unwrap();
        assert_eq!(
            rpc_endpoint(&url).unwrap().as_str(),
            "https://zabbix.example/api_jsonrpc.php"
        );
    }

    #[test]
    fn endpoint_from_subpath() {
        let url = Url::parse("https://example.net/zabbix").unwrap();
        assert_eq!(
            rpc_endpoint(&url).unwrap().as_str(),
            "https://example.net/zabbix/api_jsonrpc.php"
        );
    }

    #[test]
    fn endpoint_already_complete() {
        let url = Url::parse("https://example.net/zabbix/api_jsonrpc.php").unwrap();
        assert_eq!(rpc_endpoint(&url).unwrap(), url);
    }

    #[test]
    fn client_starts_logged_out() {
        let url = Url::parse("https://zabbix.example").unwrap();
        let client = ZabbixClient::with_client(reqwest::Client::new(), &url).unwrap();
        assert!(!client.is_logged_in());
    }
}
