//! Team membership lookup.

use super::{GitHubClient, GitHubError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, info};

const TEAM_NAMES_QUERY: &str = r#"
query ($login: String!, $first: Int!, $after: String) {
  organization(login: $login) {
    teams(first: $first, after: $after) {
      pageInfo {
        endCursor
        hasNextPage
      }
      nodes {
        name
        privacy
        slug
      }
    }
  }
}
"#;

const TEAM_MEMBERS_QUERY: &str = r#"
query ($login: String!, $slug: String!, $first: Int!, $after: String) {
  organization(login: $login) {
    team(slug: $slug) {
      members(first: $first, after: $after) {
        pageInfo {
          endCursor
          hasNextPage
        }
        nodes {
          login
        }
      }
    }
  }
}
"#;

/// A team within an organisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    /// `VISIBLE` or `SECRET`.
    pub privacy: String,
    pub slug: String,
}

/// The teams a single user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberTeams {
    pub login: String,
    pub teams: Vec<Team>,
}

#[derive(Debug, Deserialize)]
struct TeamNamesData {
    organization: Option<TeamNamesOrganization>,
}

#[derive(Debug, Deserialize)]
struct TeamNamesOrganization {
    teams: super::Connection<Team>,
}

#[derive(Debug, Deserialize)]
struct TeamMembersData {
    organization: Option<TeamMembersOrganization>,
}

#[derive(Debug, Deserialize)]
struct TeamMembersOrganization {
    team: Option<TeamMembers>,
}

#[derive(Debug, Deserialize)]
struct TeamMembers {
    members: super::Connection<Login>,
}

#[derive(Debug, Deserialize)]
struct Login {
    login: String,
}

impl GitHubClient {
    /// Maps every member of `organisation` to the teams they belong to.
    ///
    /// Members outside every team are absent from the result, which is
    /// sorted by login.
    pub async fn perform_team_membership_lookup(
        &self,
        organisation: &str,
    ) -> Result<Vec<MemberTeams>, GitHubError> {
        let teams = self.team_names(organisation).await?;
        info!(teams = teams.len(), "listed organisation teams");

        let mut by_login: BTreeMap<String, Vec<Team>> = BTreeMap::new();
        for team in teams {
            let logins = self.team_logins(organisation, &team.slug).await?;
            debug!(team = %team.slug, members = logins.len(), "listed team members");

            for login in logins {
                by_login.entry(login).or_default().push(team.clone());
            }

            tokio::time::sleep(self.page_pause).await;
        }

        Ok(by_login
            .into_iter()
            .map(|(login, teams)| MemberTeams { login, teams })
            .collect())
    }

    async fn team_names(&self, organisation: &str) -> Result<Vec<Team>, GitHubError> {
        self.paginate(
            TEAM_NAMES_QUERY,
            json!({ "login": organisation }),
            |data: TeamNamesData| {
                data.organization
                    .map(|org| org.teams)
                    .ok_or(GitHubError::MissingData("organization"))
            },
        )
        .await
    }

    async fn team_logins(&self, organisation: &str, slug: &str) -> Result<Vec<String>, GitHubError> {
        let members = self
            .paginate(
                TEAM_MEMBERS_QUERY,
                json!({ "login": organisation, "slug": slug }),
                |data: TeamMembersData| {
                    data.organization
                        .ok_or(GitHubError::MissingData("organization"))?
                        .team
                        .map(|team| team.members)
                        .ok_or(GitHubError::MissingData("team"))
                },
            )
            .await?;

        Ok(members.into_iter().map(|member| member.login).collect())
    }
}
