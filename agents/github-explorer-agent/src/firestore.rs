//! Firestore document store, spoken to over its REST API.
//!
//! Credentials come from the GCE metadata server, which is what Cloud Run
//! and GKE workloads see. Setting `FIRESTORE_EMULATOR_HOST` points the client
//! at a local emulator and skips authentication.

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::fmt;
use tracing::{debug, info};

/// Collection every query result is written to.
pub const COLLECTION: &str = "github-explorer";

/// Format of the `updated` field on saved documents.
pub const DATE_TIME_FORMAT: &str = "%A %d %b %Y %H:%M:%S UTC";

/// Environment variable naming a Firestore emulator `host:port`.
pub const EMULATOR_HOST_VAR: &str = "FIRESTORE_EMULATOR_HOST";

const FIRESTORE_API: &str = "https://firestore.googleapis.com/v1";

const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Errors talking to Firestore or its credential source.
#[derive(Debug, thiserror::Error)]
pub enum FirestoreError {
    #[error("Failed to instantiate Firestore client in project {project}: {reason}")]
    Connect { project: String, reason: String },

    #[error("Firestore request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to serialise Firestore document: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to save Firestore document {name} in collection {collection}: {status}: {body}")]
    Status {
        name: String,
        collection: &'static str,
        status: StatusCode,
        body: String,
    },
}

#[derive(Debug, Deserialize)]
struct AccessToken {
    access_token: String,
}

/// Client bound to a single Firestore project.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    project: String,
    base_url: String,
    access_token: Option<String>,
}

impl FirestoreClient {
    /// Connects to Firestore for `project`.
    ///
    /// Fails if no access token can be obtained.
    pub async fn connect(project: &str) -> Result<Self, FirestoreError> {
        let emulator_host = std::env::var(EMULATOR_HOST_VAR).ok();
        Self::connect_from(project, emulator_host.as_deref(), METADATA_TOKEN_URL).await
    }

    /// Connects to the emulator at `emulator_host` when one is given, otherwise
    /// to Firestore proper with a token from `metadata_token_url`.
    pub async fn connect_from(
        project: &str,
        emulator_host: Option<&str>,
        metadata_token_url: &str,
    ) -> Result<Self, FirestoreError> {
        let http = http_client(project)?;

        if let Some(host) = emulator_host.filter(|h| !h.is_empty()) {
            info!(%host, "using Firestore emulator");
            return Ok(Self::from_parts(http, project, format!("http://{host}/v1"), None));
        }

        let token = fetch_access_token(&http, metadata_token_url)
            .await
            .map_err(|e| FirestoreError::Connect {
                project: project.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self::from_parts(http, project, FIRESTORE_API, Some(token)))
    }

    /// Builds a client against an explicit REST base URL, e.g. `http://localhost:8080/v1`.
    pub fn with_endpoint(
        project: &str,
        base_url: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, FirestoreError> {
        Ok(Self::from_parts(http_client(project)?, project, base_url, access_token))
    }

    fn from_parts(
        http: Client,
        project: &str,
        base_url: impl Into<String>,
        access_token: Option<String>,
    ) -> Self {
        Self {
            http,
            project: project.to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token,
        }
    }

    fn document_url(&self, name: &str) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{}/{}",
            self.base_url, self.project, COLLECTION, name
        )
    }

    /// Replaces document `name` with `data` and the current timestamp.
    pub async fn save_document<T: Serialize>(&self, name: &str, data: &T) -> Result<(), FirestoreError> {
        let updated = Utc::now().format(DATE_TIME_FORMAT).to_string();
        let body = document_body(serde_json::to_value(data)?, &updated);

        let mut request = self.http.patch(self.document_url(name)).json(&body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FirestoreError::Status {
                name: name.to_string(),
                collection: COLLECTION,
                status,
                body,
            });
        }

        debug!(document = name, collection = COLLECTION, "saved document");
        Ok(())
    }
}

impl fmt::Debug for FirestoreClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirestoreClient")
            .field("project", &self.project)
            .field("base_url", &self.base_url)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

fn http_client(project: &str) -> Result<Client, FirestoreError> {
    Client::builder()
        .timeout(crate::github::REQUEST_TIMEOUT)
        .build()
        .map_err(|e| FirestoreError::Connect {
            project: project.to_string(),
            reason: e.to_string(),
        })
}

/// Requests an OAuth access token from a metadata server.
pub async fn fetch_access_token(http: &Client, url: &str) -> Result<String, reqwest::Error> {
    let token: AccessToken = http
        .get(url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    Ok(token.access_token)
}

/// Wraps a result in a Firestore document with `data` and `updated` fields.
pub fn document_body(data: Value, updated: &str) -> Value {
    json!({
        "fields": {
            "data": to_firestore_value(&data),
            "updated": { "stringValue": updated },
        }
    })
}

/// Encodes JSON as a Firestore typed `Value`.
pub fn to_firestore_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => match (n.as_i64(), n.as_u64()) {
            (Some(i), _) => json!({ "integerValue": i.to_string() }),
            (None, Some(u)) => json!({ "integerValue": u.to_string() }),
            _ => json!({ "doubleValue": n.as_f64() }),
        },
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => json!({
            "arrayValue": { "values": items.iter().map(to_firestore_value).collect::<Vec<_>>() }
        }),
        Value::Object(map) => {
            let fields: Map<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), to_firestore_value(v)))
                .collect();
            json!({ "mapValue": { "fields": fields } })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_scalars() {
        assert_eq!(to_firestore_value(&Value::Null), json!({ "nullValue": null }));
        assert_eq!(to_firestore_value(&json!(true)), json!({ "booleanValue": true }));
        assert_eq!(to_firestore_value(&json!(42)), json!({ "integerValue": "42" }));
        assert_eq!(to_firestore_value(&json!(-7)), json!({ "integerValue": "-7" }));
        assert_eq!(to_firestore_value(&json!(1.5)), json!({ "doubleValue": 1.5 }));
        assert_eq!(to_firestore_value(&json!("x")), json!({ "stringValue": "x" }));
    }

    #[test]
    fn encodes_nested_structures() {
        let encoded = to_firestore_value(&json!([{ "login": "octocat", "teams": [] }]));

        assert_eq!(
            encoded,
            json!({
                "arrayValue": { "values": [
                    { "mapValue": { "fields": {
                        "login": { "stringValue": "octocat" },
                        "teams": { "arrayValue": { "values": [] } },
                    } } }
                ] }
            })
        );
    }

    #[test]
    fn document_body_carries_data_and_timestamp() {
        let body = document_body(json!("payload"), "Friday 16 Oct 2026 09:00:00 UTC");

        assert_eq!(body["fields"]["data"], json!({ "stringValue": "payload" }));
        assert_eq!(
            body["fields"]["updated"],
            json!({ "stringValue": "Friday 16 Oct 2026 09:00:00 UTC" })
        );
    }

    #[test]
    fn document_url_uses_default_database() {
        let client =
            FirestoreClient::with_endpoint("explorer-project", "http://localhost:8080/v1/", None).unwrap();

        assert_eq!(
            client.document_url("team-membership"),
            "http://localhost:8080/v1/projects/explorer-project/databases/(default)/documents/github-explorer/team-membership"
        );
    }

    #[test]
    fn debug_output_redacts_access_token() {
        let client = FirestoreClient::with_endpoint(
            "explorer-project",
            "http://localhost:8080/v1",
            Some("ya29.secret".to_string()),
        )
        .unwrap();
        let rendered = format!("{client:?}");

        assert!(!rendered.contains("ya29.secret"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("explorer-project"));
    }

    #[test]
    fn timestamp_format_matches_stored_layout() {
        use chrono::TimeZone;
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 9, 5, 3).unwrap();
        assert_eq!(at.format(DATE_TIME_FORMAT).to_string(), "Friday 16 Oct 2026 09:05:03 UTC");
    }
}
