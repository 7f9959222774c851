//! GitHub Enterprise GraphQL client.
//!
//! A thin wrapper over `reqwest` that posts `{query, variables}` documents to
//! `<base>/graphql` with a bearer token, and follows cursor pagination.
//!
//! ```no_run
//! # async fn demo() -> Result<(), github_explorer_agent::github::GitHubError> {
//! use github_explorer_agent::github::{GitHubClient, graphql_endpoint};
//!
//! let client = GitHubClient::new("token", graphql_endpoint("https://ghe.example.com/api"))?;
//! let _members = client.perform_team_membership_lookup("example-org").await?;
//! # Ok(())
//! # }
//! ```

mod teams;

pub use teams::{MemberTeams, Team};

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Records requested per page.
pub const PAGE_SIZE: u32 = 100;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

/// Pause between successive lookups, to stay clear of secondary rate limits.
pub const DEFAULT_PAGE_PAUSE: Duration = Duration::from_millis(500);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Errors returned by the GraphQL API or its transport.
#[derive(Debug, thiserror::Error)]
pub enum GitHubError {
    #[error("request to the GitHub GraphQL API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GitHub GraphQL API returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("A GitHub GraphQL API error occurred: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },

    #[error("GitHub GraphQL response is missing {0}")]
    MissingData(&'static str),
}

/// Builds the GraphQL endpoint for an API base URI.
pub fn graphql_endpoint(base_uri: &str) -> String {
    format!("{}/graphql", base_uri.trim_end_matches('/'))
}

/// Client for a single GraphQL endpoint.
#[derive(Clone)]
pub struct GitHubClient {
    http: Client,
    token: String,
    endpoint: String,
    page_pause: Duration,
}

impl GitHubClient {
    /// Creates a client that authenticates with `token` against `endpoint`.
    pub fn new(token: impl Into<String>, endpoint: impl Into<String>) -> Result<Self, GitHubError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            http,
            token: token.into(),
            endpoint: endpoint.into(),
            page_pause: DEFAULT_PAGE_PAUSE,
        })
    }

    /// Overrides the pause between lookups.
    pub fn with_page_pause(mut self, pause: Duration) -> Self {
        self.page_pause = pause;
        self
    }

    /// Runs one GraphQL document and returns its `data` member.
    async fn query<D: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<D, GitHubError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GitHubError::Status { status, body });
        }

        let envelope: Envelope<D> = response.json().await?;
        if !envelope.errors.is_empty() {
            return Err(GitHubError::GraphQl {
                messages: envelope.errors.into_iter().map(|e| e.message).collect(),
            });
        }

        envelope.data.ok_or(GitHubError::MissingData("data"))
    }

    /// Collects every node of a paginated connection.
    ///
    /// `variables` gets `first` and `after` added for each page; `connection`
    /// picks the connection out of the page's `data`.
    async fn paginate<D, N, F>(
        &self,
        query: &str,
        variables: Value,
        connection: F,
    ) -> Result<Vec<N>, GitHubError>
    where
        D: DeserializeOwned,
        F: Fn(D) -> Result<Connection<N>, GitHubError>,
    {
        let mut nodes = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut page_variables = variables.clone();
            if let Value::Object(map) = &mut page_variables {
                map.insert("first".to_string(), json!(PAGE_SIZE));
                map.insert("after".to_string(), json!(after));
            }

            let page = connection(self.query(query, page_variables).await?)?;
            debug!(
                nodes = page.nodes.len(),
                has_next_page = page.page_info.has_next_page,
                "fetched page"
            );
            nodes.extend(page.nodes.into_iter().flatten());

            match page.page_info {
                PageInfo {
                    has_next_page: true,
                    end_cursor: Some(cursor),
                } => after = Some(cursor),
                _ => break,
            }
        }

        Ok(nodes)
    }
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .field("page_pause", &self.page_pause)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<D> {
    data: Option<D>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<N> {
    page_info: PageInfo,
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<N>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_graphql() {
        assert_eq!(
            graphql_endpoint("https://ghe.example.com/api"),
            "https://ghe.example.com/api/graphql"
        );
    }

    #[test]
    fn endpoint_does_not_double_slash() {
        assert_eq!(
            graphql_endpoint("https://ghe.example.com/api/"),
            "https://ghe.example.com/api/graphql"
        );
    }

    #[test]
    fn graphql_error_joins_messages() {
        let err = GitHubError::GraphQl {
            messages: vec!["first".to_string(), "second".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "A GitHub GraphQL API error occurred: first; second"
        );
    }

    #[test]
    fn connection_without_nodes_is_empty() {
        let connection: Connection<Team> = serde_json::from_str(
            r#"{"pageInfo": {"endCursor": null, "hasNextPage": false}}"#,
        )
        .unwrap();
        assert!(connection.nodes.is_empty());
        assert!(!connection.page_info.has_next_page);
    }

    #[test]
    fn connection_skips_null_nodes() {
        let connection: Connection<Team> = serde_json::from_str(
            r#"{
                "pageInfo": {"endCursor": "c1", "hasNextPage": true},
                "nodes": [null, {"name": "Platform", "privacy": "SECRET", "slug": "platform"}]
            }"#,
        )
        .unwrap();
        let teams: Vec<Team> = connection.nodes.into_iter().flatten().collect();
        assert_eq!(teams.len(), 1);
        assert_eq!(connection.page_info.end_cursor.as_deref(), Some("c1"));
    }

    #[test]
    fn debug_output_redacts_token() {
        let client = GitHubClient::new("ghp_secret_value", "https://ghe.example.com/api/graphql").unwrap();
        let rendered = format!("{client:?}");

        assert!(!rendered.contains("ghp_secret_value"));
        assert!(rendered.contains("<redacted>"));
        assert!(rendered.contains("https://ghe.example.com/api/graphql"));
    }

    #[test]
    fn envelope_tolerates_missing_errors() {
        let envelope: Envelope<Value> = serde_json::from_str(r#"{"data": {"x": 1}}"#).unwrap();
        assert!(envelope.errors.is_empty());
        assert_eq!(envelope.data, Some(json!({"x": 1})));
    }
}
