//! `dkg`: command-line client for a DKG node.
//!
//! Every node operation is asynchronous on the node side: the initiating call
//! prints a handler id. With `--wait`, the CLI sleeps, fetches the matching
//! result and repeats while the node still reports `PENDING`.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dkg_client::{
    types::status, AssertionSearchOptions, ClientConfig, DkgClient, DkgError, DkgNode, EntitySearchOptions, HandlerId,
    HttpRequest, NQuad, PublishOperation, PublishOptions, ResponseFuture, SparqlQueryType, Visibility,
};
use serde::Serialize;
use serde_json::Value;

mod args;

use args::{Cli, Command, Operation, PublishArgs, SearchCommand, WaitArgs};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.client_config(ClientConfig::from_env().context("invalid DKG_* environment")?);
    let node = DkgNode::connect(&config)?;
    tracing::debug!(node = %config.target, "client configured");

    run(&node, cli.command, &cli.wait).await
}

async fn run(node: &DkgNode, command: Command, wait: &WaitArgs) -> Result<()> {
    match command {
        Command::Info => print(&node.info().await?),
        Command::Publish(args) => publish(node, PublishOperation::Publish, args, wait).await,
        Command::Provision(args) => publish(node, PublishOperation::Provision, args, wait).await,
        Command::Update(args) => publish(node, PublishOperation::Update, args, wait).await,
        Command::Resolve { ids } => {
            let id = node.resolve(&ids).await?;
            follow(node, Operation::Resolve, id, wait).await
        }
        Command::Search(SearchCommand::Entities {
            query,
            ids,
            issuers,
            types,
            prefix,
            framing_criteria,
            limit,
            load,
        }) => {
            let options = EntitySearchOptions {
                query,
                ids,
                issuers,
                types,
                prefix,
                framing_criteria,
                limit,
                load,
            };
            let id = node.entities_search(&options)?.await?;
            follow(node, Operation::EntitiesSearch, id, wait).await
        }
        Command::Search(SearchCommand::Assertions { query, load }) => {
            let options = AssertionSearchOptions {
                query: Some(query),
                load,
            };
            let id = node.assertions_search(&options)?.await?;
            follow(node, Operation::AssertionsSearch, id, wait).await
        }
        Command::Query { sparql } => {
            let id = node.query(SparqlQueryType::Construct, &sparql).await?;
            follow(node, Operation::Query, id, wait).await
        }
        Command::Proofs { nquads, assertions } => {
            let nquads = nquads
                .iter()
                .map(|line| line.parse::<NQuad>())
                .collect::<Result<Vec<_>, _>>()?;
            let id = node.proofs(&nquads, &assertions)?.await?;
            follow(node, Operation::ProofsGet, id, wait).await
        }
        Command::Result { operation, handler_id } => print(&fetch_result(node, operation, &handler_id).await?),
    }
}

async fn publish(node: &DkgNode, operation: PublishOperation, args: PublishArgs, wait: &WaitArgs) -> Result<()> {
    let options = PublishOptions {
        assets: args.assets,
        keywords: args.keywords,
        visibility: if args.private { Visibility::Private } else { Visibility::Public },
        ual: args.ual,
    };
    let id = node
        .publish_file(operation, &args.file, &options)
        .with_context(|| format!("cannot {} {}", operation.path(), args.file.display()))?
        .await?;
    let follow_op = match operation {
        PublishOperation::Publish => Operation::Publish,
        PublishOperation::Provision => Operation::Provision,
        PublishOperation::Update => Operation::Update,
    };
    follow(node, follow_op, id, wait).await
}

/// Print the handler id, or with `--wait` poll for and print the result.
async fn follow(node: &DkgNode, operation: Operation, id: HandlerId, wait: &WaitArgs) -> Result<()> {
    if !wait.wait {
        return print(&id);
    }

    let interval = Duration::from_millis(wait.interval_ms);
    for attempt in 1..=wait.attempts {
        tokio::time::sleep(interval).await;
        let result = fetch_result(node, operation, id.as_str()).await?;
        if result.get("status").and_then(Value::as_str) != Some(status::PENDING) {
            return print(&result);
        }
        tracing::info!(attempt, handler_id = id.as_str(), "operation still pending");
    }
    bail!(
        "operation {} still pending after {} attempts",
        id.as_str(),
        wait.attempts
    )
}

fn fetch_result(node: &DkgNode, operation: Operation, handler_id: &str) -> ResponseFuture<Value> {
    node.execute(result_request(node.client(), operation, handler_id))
}

fn result_request(client: &DkgClient, operation: Operation, id: &str) -> Result<HttpRequest, DkgError> {
    match operation {
        Operation::Publish => client.build_publish_result(PublishOperation::Publish, id),
        Operation::Provision => client.build_publish_result(PublishOperation::Provision, id),
        Operation::Update => client.build_publish_result(PublishOperation::Update, id),
        Operation::Resolve => client.build_resolve_result(id),
        Operation::EntitiesSearch => client.build_entities_search_result(id),
        Operation::AssertionsSearch => client.build_assertions_search_result(id),
        Operation::Query => client.build_query_result(id),
        Operation::ProofsGet => client.build_proofs_result(id),
    }
}

fn print<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
