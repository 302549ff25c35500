//! dimfilters CLI
//!
//! Runs one dimension filter lookup against a fixture data source and prints
//! the resulting map as JSON.

use dimfilters::config::{lookback_from_days, query_timeout_from_millis, FilterConfig};
use dimfilters::filters::DimensionFilterService;
use dimfilters::gather::ExecutionContext;
use dimfilters::metadata::LocalMetadataClient;
use dimfilters::query::StaticQueryExecutor;
use dimfilters::telemetry::Telemetry;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Dimension filter lookup
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dataset catalog (JSON)
    #[arg(long, env = "DATASET_CATALOG")]
    catalog: PathBuf,

    /// Fixture rows answering the sub-queries (JSON)
    #[arg(long, env = "DIMFILTERS_FIXTURES")]
    fixtures: PathBuf,

    /// Dataset to look up
    #[arg(long)]
    dataset: String,

    /// Restrict the lookup to these dimensions (repeatable)
    #[arg(long = "dimension")]
    dimensions: Vec<String>,

    /// Per sub-query timeout in milliseconds (> 0)
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum sub-queries in flight (0 = unbounded)
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Query window length in days (1 to 3650)
    #[arg(long)]
    lookback_days: Option<u64>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Command-line flags take precedence over the environment
fn apply_overrides(config: &mut FilterConfig, args: &Args) -> dimfilters::Result<()> {
    if let Some(millis) = args.timeout_ms {
        config.per_query_timeout = query_timeout_from_millis("--timeout-ms", millis)?;
    }
    if let Some(limit) = args.max_concurrency {
        config.max_concurrency = (limit > 0).then_some(limit);
    }
    if let Some(days) = args.lookback_days {
        config.lookback = lookback_from_days("--lookback-days", days)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let _telemetry = Telemetry::init_for_component("dimfilters", &args.log_level)?;

    let mut config = FilterConfig::from_env()?;
    apply_overrides(&mut config, &args)?;

    let metadata = Arc::new(LocalMetadataClient::from_json_file(&args.catalog)?);
    let executor = Arc::new(StaticQueryExecutor::from_json_file(&args.fixtures)?);

    let shutdown = CancellationToken::new();
    let ctx = ExecutionContext::from_config(executor, &config).with_shutdown(shutdown.clone());
    let service = DimensionFilterService::new(metadata, ctx).with_lookback(config.lookback);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling lookup");
            shutdown.cancel();
        }
    });

    info!(
        dataset = %args.dataset,
        timeout_ms = config.per_query_timeout.as_millis() as u64,
        max_concurrency = config.max_concurrency.unwrap_or(0),
        "Running dimension filter lookup"
    );

    let result = if args.dimensions.is_empty() {
        service.get_dimension_filters(&args.dataset).await
    } else {
        service
            .get_dimension_filters_for(&args.dataset, &args.dimensions)
            .await
    };

    match result {
        Ok(filters) => {
            println!("{}", serde_json::to_string_pretty(&filters)?);
            Ok(())
        }
        Err(e) => {
            if let Some(partial) = e.partial_filters() {
                println!("{}", serde_json::to_string_pretty(partial)?);
            }
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec![
            "dimfilters",
            "--catalog",
            "catalog.json",
            "--fixtures",
            "rows.json",
            "--dataset",
            "pageviews",
        ];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_overrides_applied() {
        let args = parse(&["--timeout-ms", "1500", "--max-concurrency", "0", "--lookback-days", "30"]);
        let mut config = FilterConfig {
            max_concurrency: Some(8),
            ..Default::default()
        };
        apply_overrides(&mut config, &args).unwrap();

        assert_eq!(config.per_query_timeout, std::time::Duration::from_millis(1500));
        assert_eq!(config.max_concurrency, None);
        assert_eq!(config.lookback, chrono::Duration::days(30));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let args = parse(&["--timeout-ms", "0"]);
        let err = apply_overrides(&mut FilterConfig::default(), &args).unwrap_err();
        assert!(format!("{err}").contains("--timeout-ms"));
    }

    #[test]
    fn test_lookback_range_enforced() {
        for days in ["0", "3651", "200000000"] {
            let args = parse(&["--lookback-days", days]);
            assert!(apply_overrides(&mut FilterConfig::default(), &args).is_err(), "{days}");
        }
    }
}
