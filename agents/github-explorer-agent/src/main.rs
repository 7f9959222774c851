//! GitHub Explorer Agent - GraphQL query runner
//!
//! Loads configuration from the environment, runs the GraphQL query named on
//! the command line and saves its result to Firestore. Any failure is logged
//! and ends the process with exit status 1.

use anyhow::Context;
use clap::Parser;
use github_explorer_agent::github::graphql_endpoint;
use github_explorer_agent::{Config, FirestoreClient, GitHubClient, Query, dispatch, store_outcome};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Runs a named GitHub Enterprise GraphQL query.
#[derive(Parser, Debug)]
#[command(name = "github-explorer-agent")]
#[command(about = "Runs a GitHub Enterprise GraphQL query and stores the result in Firestore")]
struct Args {
    /// Query to run: all-repositories, member-roles or team-membership.
    query: Option<String>,

    /// Ignored; only the first argument names the query.
    #[arg(hide = true, allow_hyphen_values = true)]
    rest: Vec<String>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    let query = Query::from_arg(args.query.as_deref())?;
    if !args.rest.is_empty() {
        debug!(ignored = args.rest.len(), "ignoring extra command-line arguments");
    }

    let client = GitHubClient::new(
        config.github_token.as_str(),
        graphql_endpoint(&config.github_api_base_uri),
    )?;

    // Connect before querying so an unreachable store fails fast.
    let firestore = if query.is_implemented() {
        Some(FirestoreClient::connect(&config.firestore_project).await?)
    } else {
        None
    };

    info!(%query, "running GraphQL query");
    let outcome = dispatch(query, &config, &client).await?;

    store_outcome(query, &outcome, firestore.as_ref())
        .await
        .with_context(|| format!("storing {query} result"))?;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_logging();

    if let Err(e) = run(args).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn query_argument_is_optional() {
        let args = Args::try_parse_from(["github-explorer-agent"]).unwrap();
        assert!(args.query.is_none());
    }

    #[test]
    fn trailing_arguments_are_accepted() {
        let args =
            Args::try_parse_from(["github-explorer-agent", "team-membership", "extra", "--flag"]).unwrap();

        assert_eq!(args.query.as_deref(), Some("team-membership"));
        assert_eq!(args.rest, vec!["extra".to_string(), "--flag".to_string()]);
    }
}
