//! Command-line parameters.

use std::time::Duration;

use clap::Parser;

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parameters for one run of the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchParams {
    /// URIs to load, relative to `prefix`.
    pub uris: Vec<String>,
    /// Prefix prepended to every URI before fetching.
    pub prefix: Option<String>,
    /// Enqueue everything first and load it as one batch.
    pub defer: bool,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Skip the built-in decoders and keep raw bytes.
    pub raw: bool,
    /// Log at debug level unless `RUST_LOG` says otherwise.
    pub verbose: bool,
}

#[derive(Parser)]
#[command(about = "Fetch assets by URI, decode them and print a summary")]
struct CliArgs {
    /// URIs to fetch. Repeated URIs are fetched once.
    #[arg(required = true)]
    uris: Vec<String>,

    /// Prefix prepended to every URI, e.g. `https://example.com/assets/`.
    #[arg(long)]
    prefix: Option<String>,

    /// Queue every URI, then process the queue in one batch.
    #[arg(long)]
    defer: bool,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout: u64,

    /// Keep raw bytes instead of decoding images, text and JSON.
    #[arg(long)]
    raw: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl From<CliArgs> for LaunchParams {
    fn from(args: CliArgs) -> Self {
        Self {
            uris: args.uris,
            prefix: args.prefix,
            defer: args.defer,
            timeout: Duration::from_secs(args.timeout),
            raw: args.raw,
            verbose: args.verbose,
        }
    }
}

/// Parse launch parameters from the process arguments.
pub fn parse() -> LaunchParams {
    CliArgs::parse().into()
}
