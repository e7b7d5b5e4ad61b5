// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Indico client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Construction of (optionally signed) export request URLs.
//!
//! Indico authenticates HTTP API requests with an API key and an HMAC-SHA1 signature over the
//! request path and its query string, with the parameters sorted by key. A timestamp parameter
//! bounds the lifetime of a signed URL unless the request is marked persistent.

use hmac::{Hmac, Mac};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use std::time::{SystemTime, UNIX_EPOCH};
use url::form_urlencoded;

type HmacSha1 = Hmac<Sha1>;

/// Prefix `https://` to a base URL that carries no scheme.
pub fn normalize_base_url(raw: &str) -> String {
    if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    }
}

/// Which string the request signature is computed over.
///
/// Indico servers have been observed to verify either `<path>?<query>` or
/// `<base_url><path>?<query>`, so this is a compatibility setting rather than a fixed rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureScope {
    /// Sign `<path>?<query>`.
    Path,
    /// Sign `<base_url><path>?<query>`.
    FullUrl,
}

impl Default for SignatureScope {
    fn default() -> Self {
        Self::Path
    }
}

/// Connection settings shared by every request a client makes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawClientConfig")]
pub struct ClientConfig {
    base_url: String,
    api_key: Option<String>,
    secret_key: Option<String>,
    signature_scope: SignatureScope,
}

// Deserialization goes through this so that loaded configs are normalized the same way as ones
// built in code.
#[derive(Deserialize)]
struct RawClientConfig {
    base_url: String,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    secret_key: Option<String>,
    #[serde(default)]
    signature_scope: SignatureScope,
}

impl From<RawClientConfig> for ClientConfig {
    fn from(raw: RawClientConfig) -> Self {
        let mut config = Self::new(&raw.base_url).with_signature_scope(raw.signature_scope);
        if let Some(key) = raw.api_key {
            config = config.with_api_key(key);
        }
        if let Some(secret) = raw.secret_key {
            config = config.with_secret_key(secret);
        }
        config
    }
}

impl ClientConfig {
    /// Settings for unauthenticated access to the public data of `base_url`, e.g.
    /// `"indico.cern.ch"`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            api_key: None,
            secret_key: None,
            signature_scope: SignatureScope::default(),
        }
    }

    /// Empty keys are treated as absent.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into()).filter(|key| !key.is_empty());
        self
    }

    /// Empty secrets are treated as absent.
    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into()).filter(|secret| !secret.is_empty());
        self
    }

    pub fn with_signature_scope(mut self, scope: SignatureScope) -> Self {
        self.signature_scope = scope;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn secret_key(&self) -> Option<&str> {
        self.secret_key.as_deref()
    }

    pub fn signature_scope(&self) -> SignatureScope {
        self.signature_scope
    }
}

/// Builds request URLs for a fixed [ClientConfig].
///
/// Given the same inputs and timestamp, the output is always the same.
#[derive(Clone, Debug)]
pub struct RequestSigner {
    config: ClientConfig,
}

impl RequestSigner {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Build the URL for `path` with `params`, timestamped with the system clock.
    ///
    /// See [RequestSigner::build_request_at].
    pub fn build_request<I, K, V>(
        &self,
        path: &str,
        params: I,
        only_public: bool,
        persistent: bool,
    ) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.build_request_at(path, params, only_public, persistent, unix_now())
    }

    /// Build the URL for `path` with `params`, using `timestamp` (unix seconds) for signing.
    ///
    /// The API key and the `onlypublic` flag are appended to `params`. If a secret is configured,
    /// a timestamp is added (unless `persistent`), the parameters are sorted by key ignoring
    /// case, and a `signature` parameter is appended last. If no parameters remain at all,
    /// `path` is returned as is, without the base URL.
    pub fn build_request_at<I, K, V>(
        &self,
        path: &str,
        params: I,
        only_public: bool,
        persistent: bool,
        timestamp: u64,
    ) -> String
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut items: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if let Some(api_key) = &self.config.api_key {
            items.push(("apikey".into(), api_key.clone()));
        }
        if only_public {
            items.push(("onlypublic".into(), "yes".into()));
        }
        if let Some(secret) = &self.config.secret_key {
            if !persistent {
                items.push(("timestamp".into(), timestamp.to_string()));
            }
            // `sorted_by_key` is stable, so keys equal up to case keep their input order.
            items = items
                .into_iter()
                .sorted_by_key(|(k, _)| k.to_lowercase())
                .collect();
            let signature = self.signature(secret, path, &items);
            items.push(("signature".into(), signature));
        }
        if items.is_empty() {
            return path.to_string();
        }
        format!("{}{}?{}", self.config.base_url, path, encode_query(&items))
    }

    fn signature(&self, secret: &str, path: &str, sorted: &[(String, String)]) -> String {
        let query = encode_query(sorted);
        let message = match self.config.signature_scope {
            SignatureScope::Path => format!("{}?{}", path, query),
            SignatureScope::FullUrl => format!("{}{}?{}", self.config.base_url, path, query),
        };
        let mut mac =
            HmacSha1::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

fn encode_query(items: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(items)
        .finish()
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}
