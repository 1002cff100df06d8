//! reviewsync - push pending review changes, pull server reviews, or show
//! what is waiting to be synced.
//!
//! ```text
//! reviewsync [sync|pull|status]
//! ```

use reviewsync_client::{Config, HttpRemoteClient, LocalStore, SyncEngine};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Sync,
    Pull,
    Status,
}

impl Command {
    fn parse(arg: Option<&str>) -> Option<Self> {
        match arg.unwrap_or("sync") {
            "sync" => Some(Command::Sync),
            "pull" => Some(Command::Pull),
            "status" => Some(Command::Status),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reviewsync_client=debug,reviewsync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let arg = std::env::args().nth(1);
    let Some(command) = Command::parse(arg.as_deref()) else {
        eprintln!(
            "unknown command '{}', expected sync, pull or status",
            arg.unwrap_or_default()
        );
        std::process::exit(2);
    };

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    run(command, &config).await?;
    Ok(())
}

async fn run(command: Command, config: &Config) -> reviewsync_client::Result<()> {
    tracing::info!(database = %config.database_url, "Opening local store");
    let store = LocalStore::open(&config.database_url).await?;

    if command == Command::Status {
        let pending = store.pending_reviews().await;
        println!("{} reviews pending", pending.len());
        for entry in &pending {
            println!(
                "  review {} ({}), {} pending photos",
                entry.review.review_id,
                entry.review.status,
                entry.pending_photos().count()
            );
        }
        return Ok(());
    }

    let remote = HttpRemoteClient::new(config.remote_base_url()?, config.request_timeout)?;
    let engine = SyncEngine::new(store, Arc::new(remote), config.auth_token.clone())
        .with_delete_replay(config.delete_replay);

    match command {
        Command::Pull => {
            let count = engine.pull_all().await?;
            println!("pulled {} reviews", count);
        }
        _ => {
            let report = engine.run_pass().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}
