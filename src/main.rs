//! Surfbot - Paper-Trading Position Decision Engine

use anyhow::Result;

use surfbot::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (SURFBOT_* overrides may live there)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
