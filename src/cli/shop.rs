// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Training Shop Service
 * The intentionally vulnerable mitten store
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};

use lapanen::catalog::CatalogStore;
use lapanen::config::ShopConfig;
use lapanen::flags::FlagIssuer;
use lapanen::session::SessionStore;
use lapanen::shop::{create_shop_router, ShopState};
use lapanen::verify_client::VerificationClient;

/// Lapanen training shop
#[derive(Parser)]
#[command(name = "lapanen-shop")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version = "1.0.0")]
#[command(about = "Intentionally vulnerable shop for XSS training", long_about = None)]
struct Cli {
    /// Debug logging
    #[arg(long)]
    debug: bool,

    /// Listen port
    #[arg(long, env = "SHOP_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(default_level.into()),
        )
        .init();

    let mut config = ShopConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }

    let sessions = Arc::new(SessionStore::new());
    let flags = FlagIssuer::new(sessions.clone());
    let verify = VerificationClient::new(
        config.verifier_url.clone(),
        config.public_base_url.clone(),
        flags.clone(),
    );

    let state = Arc::new(ShopState {
        catalog: CatalogStore::new(),
        sessions,
        flags,
        verify,
    });
    let router = create_shop_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("[Shop] Listening on {} (verifier at {})", addr, config.verifier_url);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
