// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Lapanen - Exploit Verification Service
 * Pooled headless Chrome behind POST /visit
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};

use lapanen::config::VerifierConfig;
use lapanen::driver_pool::DriverPool;
use lapanen::verify_service::create_visit_router;
use lapanen::visitor::{BrowserVisitor, PageVisitor};

/// Lapanen exploit verification service
#[derive(Parser)]
#[command(name = "lapanen-verifier")]
#[command(author = "Bountyy Oy <info@bountyy.fi>")]
#[command(version = "1.0.0")]
#[command(about = "Drives pooled browser sessions to confirm XSS exploits", long_about = None)]
struct Cli {
    /// Single headful browser session, debug logging
    #[arg(long)]
    debug: bool,

    /// Listen port
    #[arg(long, env = "VERIFIER_PORT")]
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

    let mut config = VerifierConfig::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }

    info!("[Verifier] Starting drivers...");
    let pool = if cli.debug {
        // One visible browser so the operator can watch exploits fire
        DriverPool::launch(1, false)?
    } else {
        DriverPool::launch(config.pool_size, config.headless)?
    };
    info!(
        "[Verifier] Driver pool ready with {} sessions",
        pool.capacity()
    );

    let visitor: Arc<dyn PageVisitor> = Arc::new(BrowserVisitor::new(pool));
    let router = create_visit_router(visitor);

    let addr = format!("{}:{}", config.host, config.port);
    info!("[Verifier] Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
