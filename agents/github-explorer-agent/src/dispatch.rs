//! Routes a [`Query`] to the GraphQL operation that implements it.

use crate::config::Config;
use crate::firestore::{FirestoreClient, FirestoreError};
use crate::github::{GitHubClient, GitHubError, MemberTeams};
use crate::query::Query;
use tracing::{info, warn};

/// Operations the dispatcher can invoke.
#[allow(async_fn_in_trait)]
pub trait GraphQlOperations {
    async fn perform_team_membership_lookup(
        &self,
        organisation: &str,
    ) -> Result<Vec<MemberTeams>, GitHubError>;
}

impl GraphQlOperations for GitHubClient {
    async fn perform_team_membership_lookup(
        &self,
        organisation: &str,
    ) -> Result<Vec<MemberTeams>, GitHubError> {
        GitHubClient::perform_team_membership_lookup(self, organisation).await
    }
}

/// Result of a dispatched query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    TeamMembership(Vec<MemberTeams>),
    /// The query is recognised but has no operation behind it yet.
    NotImplemented(Query),
}

/// Runs `query` against `operations` using the organisation from `config`.
pub async fn dispatch<O>(query: Query, config: &Config, operations: &O) -> Result<Outcome, GitHubError>
where
    O: GraphQlOperations,
{
    match query {
        Query::TeamMembership => {
            let members = operations
                .perform_team_membership_lookup(&config.github_organisation_name)
                .await?;
            info!(members = members.len(), "team membership lookup complete");
            Ok(Outcome::TeamMembership(members))
        }
        // TODO: port the repository and members-with-role queries once the
        // stored document shape for them is agreed.
        Query::AllRepositories | Query::MemberRoles => {
            warn!("GraphQL query '{query}' is not yet implemented");
            Ok(Outcome::NotImplemented(query))
        }
    }
}

/// Errors raised while storing a dispatched result.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("No document store connected for GraphQL query '{0}'")]
    NotConnected(Query),

    #[error(transparent)]
    Firestore(#[from] FirestoreError),
}

/// Saves `outcome` as the document named after `query`.
///
/// Stub outcomes carry nothing to store and are skipped.
pub async fn store_outcome(
    query: Query,
    outcome: &Outcome,
    firestore: Option<&FirestoreClient>,
) -> Result<(), StoreError> {
    match outcome {
        Outcome::TeamMembership(members) => {
            let firestore = firestore.ok_or(StoreError::NotConnected(query))?;
            firestore.save_document(query.as_str(), members).await?;
            info!(%query, members = members.len(), "saved query result");
            Ok(())
        }
        Outcome::NotImplemented(_) => Ok(()),
    }
}
