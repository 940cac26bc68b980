use super::model::{looks_like_id, ObjectKind, SysVersion};
use crate::consts;
use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

/// Read-only client for the Bond local API (v2).
pub struct BondClient {
    http: reqwest::Client,
    base: String,
    token: String,
}

/// Accepts a bare host (`192.168.1.13`) or a full base URL.
pub fn base_url(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

impl BondClient {
    pub fn new(host: &str, token: &str, timeout: Duration) -> Result<Self> {
        let base = base_url(host);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| Error::Network {
                url: base.clone(),
                source,
            })?;

        Ok(Self {
            http,
            base,
            token: token.to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base, consts::BOND_API_PREFIX, path)
    }

    async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header(consts::BOND_TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|source| Error::Network {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Unauthorized {
                url,
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(Error::Status {
                url,
                status: status.as_u16(),
            });
        }

        let data = response.bytes().await.map_err(|source| Error::Network {
            url: url.clone(),
            source,
        })?;
        serde_json::from_slice(&data).map_err(|e| {
            Error::malformed(
                &url,
                format!("{} in body: {}", e, String::from_utf8_lossy(&data)),
            )
        })
    }

    pub async fn sys_version(&self) -> Result<SysVersion> {
        self.get("/sys/version").await
    }

    /// Sorted object ids of a collection.
    pub async fn index(&self, kind: ObjectKind) -> Result<Vec<String>> {
        let path = format!("/{}", kind.collection());
        let index: BTreeMap<String, Value> = self.get(&path).await?;
        Ok(index.into_keys().filter(|k| looks_like_id(k)).collect())
    }

    pub async fn object<R: DeserializeOwned>(&self, kind: ObjectKind, id: &str) -> Result<R> {
        self.get(&format!("/{}/{}", kind.collection(), id)).await
    }

    /// Empty when the bridge has nothing to say; state is optional.
    pub async fn state(&self, kind: ObjectKind, id: &str) -> BTreeMap<String, Value> {
        self.optional_map(&format!("/{}/{}/state", kind.collection(), id))
            .await
    }

    pub async fn properties(&self, kind: ObjectKind, id: &str) -> BTreeMap<String, Value> {
        self.optional_map(&format!("/{}/{}/properties", kind.collection(), id))
            .await
    }

    async fn optional_map(&self, path: &str) -> BTreeMap<String, Value> {
        match self.get(path).await {
            Ok(map) => map,
            Err(e) => {
                debug!("Ignoring optional {}: {}", path, e);
                BTreeMap::new()
            }
        }
    }
}
