use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use dkg_client::{ClientConfig, ConnectionTarget, Scheme};

/// Connection flags override `DKG_SCHEME`, `DKG_HOST`, `DKG_PORT` and
/// `DKG_TIMEOUT_SECS`, which in turn override the built-in defaults.
#[derive(Parser, Debug, Clone)]
#[command(name = "dkg", version, about = "Command-line client for a DKG node")]
pub struct Cli {
    /// `http` or `https` [default: http]
    #[arg(long, global = true)]
    pub scheme: Option<Scheme>,

    /// Node host name or address [default: localhost]
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Node API port [default: 8900]
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Connect and per-request timeout, in seconds [default: 10]
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(flatten)]
    pub wait: WaitArgs,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Apply the connection flags on top of `base`.
    pub fn client_config(&self, base: ClientConfig) -> ClientConfig {
        let ClientConfig { target, timeout } = base;
        let target = ConnectionTarget::new(
            self.scheme.unwrap_or(target.scheme),
            self.host.clone().unwrap_or(target.host),
            self.port.unwrap_or(target.port),
        );
        ClientConfig {
            target,
            timeout: self.timeout.map(Duration::from_secs).unwrap_or(timeout),
        }
    }
}

/// Caller-side polling for operation results.
#[derive(Args, Debug, Clone)]
pub struct WaitArgs {
    /// After starting an operation, poll its result until it is no longer
    /// PENDING.
    #[arg(long, global = true)]
    pub wait: bool,

    /// Maximum number of result fetches.
    #[arg(long, global = true, default_value_t = 5)]
    pub attempts: u32,

    /// Pause before each result fetch, in milliseconds.
    #[arg(long, global = true, default_value_t = 1000)]
    pub interval_ms: u64,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print node version information.
    Info,

    /// Publish an assertion file.
    Publish(PublishArgs),

    /// Provision an assertion file.
    Provision(PublishArgs),

    /// Update a published assertion.
    Update(PublishArgs),

    /// Resolve assertions or assets by id.
    Resolve {
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Search entities or assertions.
    #[command(subcommand)]
    Search(SearchCommand),

    /// Run a SPARQL construct query.
    Query { sparql: String },

    /// Request proofs for N-Quads within assertions.
    Proofs {
        /// N-Quad line, e.g. `<s> <p> "o" .`; repeatable.
        #[arg(long = "nquad", required = true)]
        nquads: Vec<String>,

        /// Assertion id; repeatable.
        #[arg(long = "assertion", required = true)]
        assertions: Vec<String>,
    },

    /// Fetch the result of an earlier operation.
    Result {
        operation: Operation,
        handler_id: String,
    },
}

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    /// JSON-LD assertion file with a `.json` extension.
    pub file: PathBuf,

    #[arg(long = "asset")]
    pub assets: Vec<String>,

    #[arg(long = "keyword")]
    pub keywords: Vec<String>,

    /// Publish with private visibility.
    #[arg(long)]
    pub private: bool,

    /// Universal asset locator of the asset to update.
    #[arg(long)]
    pub ual: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SearchCommand {
    Entities {
        #[arg(long)]
        query: Option<String>,
        #[arg(long)]
        ids: Option<String>,
        #[arg(long)]
        issuers: Option<String>,
        #[arg(long)]
        types: Option<String>,
        #[arg(long)]
        prefix: Option<bool>,
        #[arg(long)]
        framing_criteria: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        load: Option<bool>,
    },
    Assertions {
        query: String,
        #[arg(long)]
        load: Option<bool>,
    },
}

/// Operation whose result endpoint to read.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Publish,
    Provision,
    Update,
    Resolve,
    #[value(name = "entities:search")]
    EntitiesSearch,
    #[value(name = "assertions:search")]
    AssertionsSearch,
    Query,
    #[value(name = "proofs:get")]
    ProofsGet,
}
