//! Command-line front end for the asset pipeline.
//!
//! Fetches each URI through one pipeline, so repeated URIs are loaded once,
//! and prints a summary line per asset.

mod launch_params;
mod report;

use std::process::ExitCode;

use anyhow::Context;
use assetline::{AssetPipeline, HttpFetcher};

use crate::launch_params::LaunchParams;

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn build_pipeline(params: &LaunchParams) -> anyhow::Result<AssetPipeline> {
    let fetcher =
        HttpFetcher::with_timeout(params.timeout).context("failed to build http client")?;

    let mut builder = AssetPipeline::builder().fetcher(fetcher);
    if !params.raw {
        builder = builder.with_builtin_decoders();
    }
    if let Some(prefix) = &params.prefix {
        builder = builder.asset_prefix(prefix.clone());
    }
    Ok(builder.build())
}

/// Load every URI, printing each success. Returns the number of failures.
async fn run(pipeline: &AssetPipeline, params: &LaunchParams) -> usize {
    let outcomes = if params.defer {
        for uri in &params.uris {
            pipeline.enqueue_asset(uri);
        }
        tracing::info!(queued = pipeline.stats().queued, "processing queue");
        pipeline.process_queue_settled().await
    } else {
        let requests: Vec<_> = params
            .uris
            .iter()
            .map(|uri| (uri.clone(), pipeline.request_asset(uri)))
            .collect();
        let mut outcomes = Vec::with_capacity(requests.len());
        for (uri, request) in requests {
            outcomes.push((uri, request.await));
        }
        outcomes
    };

    let mut failures = 0;
    for (uri, outcome) in outcomes {
        match outcome {
            Ok(asset) => println!("{}", report::summarize(&asset)),
            Err(e) => {
                failures += 1;
                tracing::error!(uri, "{e}");
            }
        }
    }
    failures
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let params = launch_params::parse();
    init_tracing(params.verbose);

    let pipeline = build_pipeline(&params)?;
    let failures = run(&pipeline, &params).await;

    let stats = pipeline.stats();
    tracing::info!(resolved = stats.resolved, failures, "done");

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
