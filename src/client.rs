// Copyright (c) 2022 Espresso Systems (espressosys.com)
// This file is part of the Indico client library.

// This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version.
// This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
// You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::error::{DecodeSnafu, IndicoError, MissingResultsSnafu, Result};
use crate::query::{QueryKind, QuerySpec};
use crate::signer::{ClientConfig, RequestSigner};
use crate::types::{Event, EventBatch};
use futures::future::BoxFuture;
use serde_json::Value;
use snafu::{OptionExt, ResultExt};
use std::sync::Arc;
use surf::{Response, StatusCode};
use tracing::{event, Level};

/// Fetches the raw body of a fully formed request URL.
///
/// Implementations must turn network failures and non-success statuses into
/// [IndicoError::Transport] rather than returning an empty body.
pub trait Transport: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;
}

/// [Transport] over a [surf::Client].
#[derive(Clone)]
pub struct SurfTransport {
    client: surf::Client,
}

impl SurfTransport {
    pub fn new() -> Self {
        Self::with_client(surf::Client::new())
    }

    pub fn with_client(client: surf::Client) -> Self {
        Self { client }
    }
}

impl Default for SurfTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SurfTransport {
    fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let parsed = url::Url::parse(url).map_err(|err| transport_error(url, None, err))?;
            let res = self
                .client
                .get(parsed)
                .await
                .map_err(|err| transport_error(url, None, err))?;
            let mut res = response_to_result(url, res).await?;
            let status = res.status();
            res.body_bytes()
                .await
                .map_err(|err| transport_error(url, Some(status), err))
        })
    }
}

/// Pass successful responses through; turn any other status into a transport error carrying the
/// status and whatever body the server sent along.
pub async fn response_to_result(url: &str, mut res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        Ok(res)
    } else {
        let body = res.body_string().await.unwrap_or_default();
        Err(transport_error(
            url,
            Some(status),
            format!("{} {}: {}", u16::from(status), status.canonical_reason(), body.trim()),
        ))
    }
}

fn transport_error(url: &str, status: Option<StatusCode>, message: impl ToString) -> IndicoError {
    IndicoError::Transport {
        url: without_query(url).to_string(),
        status: status.map(u16::from),
        message: message.to_string(),
    }
}

// Query strings carry the API key and signature, so they are kept out of errors and logs.
fn without_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Client for the Indico export API.
///
/// Each call makes exactly one request; nothing is cached between calls, so a client can be
/// cloned and shared freely between tasks.
#[derive(Clone)]
pub struct Client {
    signer: RequestSigner,
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, SurfTransport::new())
    }

    pub fn with_transport(config: ClientConfig, transport: impl Transport + 'static) -> Self {
        Self {
            signer: RequestSigner::new(config),
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        self.signer.config()
    }

    pub fn signer(&self) -> &RequestSigner {
        &self.signer
    }

    /// The signed URL `query` resolves to.
    ///
    /// Fails without side effects if the query has no kind or no id.
    pub fn request_url(&self, query: &QuerySpec) -> Result<String> {
        let path = query.path()?;
        Ok(self.signer.build_request(
            &path,
            query.params(),
            query.is_only_public(),
            query.is_persistent(),
        ))
    }

    /// Fetch `query` and return the decoded JSON body as is.
    pub async fn get(&self, query: &QuerySpec) -> Result<Value> {
        let url = self.request_url(query)?;
        event!(Level::DEBUG, "--> GET {}", without_query(&url));
        let body = self.transport.fetch(&url).await?;
        serde_json::from_slice(&body).context(DecodeSnafu {
            url: without_query(&url),
        })
    }

    /// Fetch events and map every result into an [Event].
    ///
    /// The kind of `query` is forced to [QueryKind::Event]. Results that can not be mapped are
    /// logged and returned in [EventBatch::failures]; they do not fail the call.
    pub async fn get_event(&self, query: QuerySpec) -> Result<EventBatch> {
        let query = query.with_kind(QueryKind::Event);
        let response = self.get(&query).await?;
        let results = response
            .get("results")
            .and_then(Value::as_array)
            .context(MissingResultsSnafu { url: query.path()? })?;

        let mut batch = EventBatch::default();
        for result in results {
            match Event::from_result(result) {
                Ok(event) => batch.events.push(event),
                Err(err) => {
                    event!(Level::WARN, "skipping event result: {}", err);
                    batch.failures.push(err);
                }
            }
        }
        event!(
            Level::INFO,
            "<-- event query {{id: {:?}, events: {}, malformed: {}}}",
            query.id(),
            batch.events.len(),
            batch.failures.len(),
        );
        Ok(batch)
    }

    /// Fetch a category export. The body is returned undecoded beyond JSON.
    pub async fn get_category(&self, query: QuerySpec) -> Result<Value> {
        self.get(&query.with_kind(QueryKind::Category)).await
    }

    /// Fetch a room export. The body is returned undecoded beyond JSON.
    pub async fn get_room(&self, query: QuerySpec) -> Result<Value> {
        self.get(&query.with_kind(QueryKind::Room)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Serves a fixed body and remembers every URL it was asked for.
    #[derive(Default)]
    struct Recording {
        body: Vec<u8>,
        urls: Mutex<Vec<String>>,
    }

    impl Recording {
        fn serving(body: &Value) -> Arc<Self> {
            Arc::new(Self {
                body: serde_json::to_vec(body).unwrap(),
                urls: Mutex::default(),
            })
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    impl Transport for Arc<Recording> {
        fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
            self.urls.lock().unwrap().push(url.to_string());
            let body = self.body.clone();
            Box::pin(async move { Ok(body) })
        }
    }

    fn config() -> ClientConfig {
        ClientConfig::new("indico.example.org")
            .with_api_key("KEY")
            .with_secret_key("SECRET")
    }

    fn event_payload() -> Value {
        json!({
            "count": 2,
            "results": [
                {
                    "id": "7",
                    "category": "Workshops",
                    "roomFullname": null,
                    "location": "Geneva",
                    "title": "Tracking Workshop",
                    "startDate": {"date": "2022-06-01", "time": "09:00:00", "tz": "UTC"},
                    "contributions": []
                },
                {"id": "8", "title": "No dates"}
            ]
        })
    }

    #[async_std::test]
    async fn missing_query_type_makes_no_request() {
        let transport = Recording::serving(&json!({}));
        let client = Client::with_transport(config(), transport.clone());
        let err = client.get(&QuerySpec::new().with_id("123")).await.unwrap_err();
        assert!(matches!(err, IndicoError::MissingQueryType));
        let err = client
            .get(&QuerySpec::new().with_kind(QueryKind::Event))
            .await
            .unwrap_err();
        assert!(matches!(err, IndicoError::MissingQueryId));
        assert!(transport.urls().is_empty());
    }

    #[async_std::test]
    async fn default_limit_is_signed() {
        let transport = Recording::serving(&json!({"results": []}));
        let client = Client::with_transport(config(), transport.clone());
        client.get(&QuerySpec::event("123")).await.unwrap();

        let urls = transport.urls();
        assert_eq!(urls.len(), 1);
        let url = url::Url::parse(&urls[0]).unwrap();
        assert_eq!(url.path(), "/export/event/123.json");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("limit".to_string(), "123".to_string())));
        assert_eq!(pairs.last().unwrap().0, "signature");
    }

    #[async_std::test]
    async fn get_event_keeps_going_past_malformed_results() {
        let transport = Recording::serving(&event_payload());
        let client = Client::with_transport(config(), transport);
        let batch = client.get_event(QuerySpec::new().with_id("7")).await.unwrap();

        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.events[0].title, "Tracking Workshop");
        assert!(!batch.is_complete());
        assert!(matches!(
            &batch.failures[..],
            [IndicoError::MalformedResponse { key, .. }] if key == "startDate"
        ));
    }

    #[async_std::test]
    async fn event_response_without_results_is_an_error() {
        let transport = Recording::serving(&json!({"count": 0}));
        let client = Client::with_transport(config(), transport);
        let err = client.get_event(QuerySpec::event("7")).await.unwrap_err();
        assert!(matches!(
            err,
            IndicoError::MissingResults { url } if url == "/export/event/7.json"
        ));
    }

    #[async_std::test]
    async fn category_and_room_return_raw_json() {
        let payload = json!({"results": [{"anything": ["goes"]}]});
        let transport = Recording::serving(&payload);
        let client = Client::with_transport(config(), transport.clone());
        assert_eq!(client.get_category(QuerySpec::new().with_id("2")).await.unwrap(), payload);
        assert_eq!(
            client.get_room(QuerySpec::event("CERN/28")).await.unwrap(),
            payload
        );
        let paths: Vec<String> = transport
            .urls()
            .iter()
            .map(|u| url::Url::parse(u).unwrap().path().to_string())
            .collect();
        assert_eq!(paths, vec!["/export/categ/2.json", "/export/room/CERN/28.json"]);
    }

    #[async_std::test]
    async fn invalid_json_is_a_decode_error() {
        let transport = Arc::new(Recording {
            body: b"<html>maintenance</html>".to_vec(),
            urls: Mutex::default(),
        });
        let client = Client::with_transport(config(), transport);
        let err = client.get(&QuerySpec::event("1")).await.unwrap_err();
        assert!(matches!(
            err,
            IndicoError::Decode { url, .. }
                if url == "https://indico.example.org/export/event/1.json"
        ));
    }

    #[test]
    fn query_strings_are_stripped_from_reported_urls() {
        assert_eq!(
            without_query("https://h/export/event/1.json?apikey=KEY&signature=abc"),
            "https://h/export/event/1.json"
        );
        assert_eq!(without_query("/export/event/1.json"), "/export/event/1.json");
    }
}
