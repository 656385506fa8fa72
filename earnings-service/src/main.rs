use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use earnings_service::config::{Cli, Command, Settings};
use earnings_service::input::load_pools;
use earnings_service::market_quotes::fetch_market_aprs;
use earnings_service::{http_client, metrics, PoolReport, Runner};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::FmtSubscriber;

fn print_reports(reports: &[PoolReport]) {
    for report in reports {
        match serde_json::to_string(report) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::error!(pool_id = %report.earnings.pool_id, error = %e, "failed to encode report"),
        }
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // logger
    let subscriber = FmtSubscriber::builder().with_target(false).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let cli = Cli::parse();
    let settings = Settings::load(&cli)?;

    if let Some(addr) = settings.metrics_addr {
        tokio::spawn(metrics::serve(addr));
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl+C received; shutting down…");
            on_signal.cancel();
        }
    });

    match &cli.command {
        Command::Pools { input, now_ms } => {
            let entries = load_pools(input)?;
            let runner = Runner::from_settings(&settings)?;
            let now_ms = now_ms.unwrap_or_else(|| Utc::now().timestamp_millis());
            let reports = runner.evaluate(&entries, now_ms, &cancel).await;
            print_reports(&reports);
        }
        Command::Watch { input } => {
            let entries = load_pools(input)?;
            let runner = Runner::from_settings(&settings)?;
            runner.watch(&entries, cancel, print_reports).await;
        }
        Command::Markets => {
            let api_url = settings.require_api_url()?;
            let client = http_client::builder(Duration::from_secs(settings.fetch_timeout_secs)).build()?;
            for market in fetch_market_aprs(&client, api_url).await? {
                println!("{}", serde_json::to_string(&market)?);
            }
        }
    }

    Ok(())
}
