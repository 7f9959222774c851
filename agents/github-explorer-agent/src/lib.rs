//! GitHub Explorer Agent
//!
//! Runs one named GraphQL query against a GitHub Enterprise organisation and
//! stores the result as a Firestore document named after the query.
//!
//! # Usage
//!
//! ```bash
//! export FIRESTORE_PROJECT=my-project
//! export GITHUB_API_BASE_URI=https://ghe.example.com/api
//! export GITHUB_ENTERPRISE_NAME=example-enterprise
//! export GITHUB_ORGANISATION_NAME=example-org
//! export GITHUB_TOKEN=...
//!
//! github-explorer-agent team-membership
//! ```
//!
//! # Queries
//!
//! - `team-membership` - every organisation member and the teams they belong to
//! - `all-repositories` - not yet implemented
//! - `member-roles` - not yet implemented

pub mod config;
pub mod dispatch;
pub mod firestore;
pub mod github;
pub mod query;

pub use config::{Config, ConfigError};
pub use dispatch::{GraphQlOperations, Outcome, StoreError, dispatch, store_outcome};
pub use firestore::{FirestoreClient, FirestoreError};
pub use github::{GitHubClient, GitHubError};
pub use query::{Query, QueryError};
