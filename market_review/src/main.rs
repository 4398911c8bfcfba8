use anyhow::{Context, Result};
use chrono::Utc;
use log::info;
use market_data::config::Settings;
use market_data::logger::init_logger;
use market_review::context::RunContext;
use market_review::pipeline::Pipeline;

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();

    let settings = Settings::load().context("Failed to load settings")?;
    let ctx = RunContext::new(settings, Utc::now()).context("Invalid report settings")?;
    info!("Capabilities: {:?}", ctx.capabilities);

    let pipeline = Pipeline::new(ctx)?;
    pipeline.run().await?;

    info!("Market review delivered");
    Ok(())
}
