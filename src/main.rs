use std::env;

use anyhow::Result;
use delhivery_track::{CarrierMode, Tracker, TrackerConfig, TrackingQuery};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays pure JSON
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "delhivery_track=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        usage(&args[0]);
    }

    let tracker = Tracker::new(TrackerConfig::from_env()?)?;

    if args[1] == "selftest" {
        println!("{}", serde_json::to_string_pretty(&tracker.self_test())?);
        return Ok(());
    }

    let Some(values) = args.get(2) else {
        usage(&args[0]);
    };

    let hint = args.get(3).map(|s| {
        let mode = CarrierMode::from_hint(s);
        if mode.is_none() {
            eprintln!("Unknown service: {}. Using default order.", s);
        }
        mode
    });

    let query = match args[1].as_str() {
        "awb" => TrackingQuery::waybill(values.as_str()),
        "id" => TrackingQuery::order_id(values.as_str()),
        other => {
            eprintln!("Unknown lookup kind: {}", other);
            usage(&args[0]);
        }
    }
    .with_hint(hint.flatten());

    match tracker.handle(&query).await {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(payload.as_value())?);
            Ok(())
        }
        Err(e) => {
            match e.detail() {
                Some(detail) => eprintln!("{}: {}", e, detail),
                None => eprintln!("{}", e),
            }
            std::process::exit(1);
        }
    }
}

fn usage(program: &str) -> ! {
    eprintln!("Usage: {} <awb|id> <values> [service]", program);
    eprintln!("       {} selftest", program);
    eprintln!("  values: comma-separated, at most 50 (e.g., AWB1,AWB2)");
    eprintln!("  service: surface or express, tried first when its token is set");
    std::process::exit(1);
}
