//! Query names accepted on the command line.

use std::fmt;
use std::str::FromStr;

/// Errors raised while reading the query argument.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Missing GraphQL query command-line argument")]
    Missing,

    #[error("Unknown GraphQL query: '{0}'")]
    Unknown(String),
}

/// A named GraphQL query the agent knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Query {
    AllRepositories,
    MemberRoles,
    TeamMembership,
}

impl Query {
    /// Every recognised query.
    pub const ALL: [Query; 3] = [
        Query::AllRepositories,
        Query::MemberRoles,
        Query::TeamMembership,
    ];

    /// Parses the optional positional argument.
    pub fn from_arg(arg: Option<&str>) -> Result<Self, QueryError> {
        arg.ok_or(QueryError::Missing)?.parse()
    }

    /// Name used on the command line and as the stored document name.
    pub fn as_str(self) -> &'static str {
        match self {
            Query::AllRepositories => "all-repositories",
            Query::MemberRoles => "member-roles",
            Query::TeamMembership => "team-membership",
        }
    }

    /// Whether the query is wired to a GraphQL operation yet.
    pub fn is_implemented(self) -> bool {
        matches!(self, Query::TeamMembership)
    }
}

impl FromStr for Query {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Query::ALL
            .into_iter()
            .find(|query| query.as_str() == s)
            .ok_or_else(|| QueryError::Unknown(s.to_string()))
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
