use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::Parser;
use database::{Database, InMemoryStore, Store};
use server::{Server, ServerConfig};
use tracing::{info, warn};

#[derive(Debug, clap::Parser)]
#[command(version, about = "GrooveLog practice tracker API")]
enum Command {
    /// Serve the REST API
    Serve {
        #[arg(short, long, env = "DATABASE_URL", required_unless_present = "in_memory")]
        db: Option<String>,
        #[arg(short = 'H', long, default_value = "0.0.0.0")]
        host: std::net::IpAddr,
        #[arg(short, long, default_value_t = 3000)]
        port: u16,
        #[arg(long, default_value_t = 5)]
        max_connections: u32,
        /// Owner of songs created without an x-user-id header
        #[arg(long, default_value_t = 1)]
        default_user_id: i32,
        /// Keep everything in memory instead of postgres
        #[arg(long)]
        in_memory: bool,
        /// Skip creating tables on startup
        #[arg(long)]
        no_migrate: bool,
        #[arg(long)]
        no_cors: bool,
    },
    /// Create tables and seed the instrument catalog
    Migrate {
        #[arg(short, long, env = "DATABASE_URL")]
        db: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    {
        use tracing_subscriber::prelude::*;

        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(tracing_subscriber::EnvFilter::from_default_env())
            .init()
    }

    match Command::parse() {
        Command::Serve {
            db,
            host,
            port,
            max_connections,
            default_user_id,
            in_memory,
            no_migrate,
            no_cors,
        } => {
            let store: Arc<dyn Store> = match db.filter(|_| !in_memory) {
                Some(url) => Arc::new(connect(&url, max_connections, !no_migrate).await?),
                None => {
                    warn!("using in-memory store, nothing will be persisted");
                    Arc::new(InMemoryStore::new())
                }
            };

            let config = ServerConfig::builder()
                .addr(SocketAddr::new(host, port))
                .cors(!no_cors)
                .default_user_id(default_user_id)
                .build();

            Server::new(config, store).run().await.context("server failed")
        }
        Command::Migrate { db } => {
            connect(&db, 1, true).await?;
            Ok(())
        }
    }
}

async fn connect(url: &str, max_connections: u32, migrate: bool) -> anyhow::Result<Database> {
    let database = Database::connect(url, max_connections)
        .await
        .context("failed to connect to database")?;

    if migrate {
        database.migrate().await.context("failed to apply schema")?;
        info!("schema up to date");
    }

    Ok(database)
}
