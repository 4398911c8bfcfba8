use analysis::snapshot::PriceSnapshot;
use anyhow::{Context, Result};
use log::{error, info};
use market_data::fetcher::PriceHistoryClient;
use market_data::news::{NewsFetcher, NewsSource};
use reqwest::Client;
use std::time::Duration;

use crate::context::RunContext;
use crate::generator::{ChatCompletionClient, DisabledGenerator, TextGenerator};
use crate::notifier::WebhookNotifier;
use crate::report::{MarketView, ReportAssembler};

const REPORT_TITLE: &str = "US Market Review";

pub struct Pipeline {
    ctx: RunContext,
    prices: PriceHistoryClient,
    news: NewsFetcher,
    generator: Box<dyn TextGenerator>,
    notifier: WebhookNotifier,
}

impl Pipeline {
    pub fn new(ctx: RunContext) -> Result<Self> {
        let settings = &ctx.settings;
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.http.timeout_secs))
            .user_agent(settings.http.user_agent.as_str())
            .build()
            .context("Failed to build HTTP client")?;

        let generator: Box<dyn TextGenerator> = match &settings.secrets.openai_api_key {
            Some(key) => Box::new(ChatCompletionClient::new(
                client.clone(),
                key.clone(),
                &settings.generation,
            )),
            None => Box::new(DisabledGenerator),
        };

        let source = NewsSource::select(
            &settings.news,
            &settings.market.symbol,
            settings.secrets.news_api_key.as_deref(),
        );

        info!(
            "🚀Configured {} run: generator={}, news={}",
            ctx.mode,
            generator.provider(),
            source.name()
        );

        Ok(Self {
            prices: PriceHistoryClient::new(client.clone(), &settings.market),
            news: NewsFetcher::new(client.clone(), source),
            notifier: WebhookNotifier::new(
                client,
                settings.secrets.webhook_url().to_string(),
                settings.webhook.format,
            ),
            generator,
            ctx,
        })
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Build the review and post it. On failure a single error notice is posted
    /// instead (when enabled) and the original error is returned.
    pub async fn run(&self) -> Result<()> {
        match self.compose().await {
            Ok(message) => {
                self.notifier
                    .send(REPORT_TITLE, &message)
                    .await
                    .context("Failed to deliver market review")?;
                Ok(())
            }
            Err(e) => {
                error!("Market review failed: {:#}", e);
                if self.ctx.settings.webhook.notify_on_error {
                    let notice = failure_notice(&self.ctx, &e);
                    if let Err(send_err) = self.notifier.send(REPORT_TITLE, &notice).await {
                        error!("Failed to deliver error notice: {}", send_err);
                    }
                }
                Err(e)
            }
        }
    }

    pub async fn compose(&self) -> Result<String> {
        let market = &self.ctx.settings.market;

        let stock = self.snapshot(&market.symbol).await?;
        let sector = self.snapshot(&market.sector_symbol).await?;
        let benchmark = self.snapshot(&market.benchmark_symbol).await?;
        let headlines = self.news.fetch_headlines().await;

        let view = MarketView {
            stock,
            sector,
            benchmark,
            headlines,
        };

        let message = ReportAssembler::new(&self.ctx, self.generator.as_ref())
            .assemble(&view)
            .await;
        info!("Assembled review of {} characters", message.chars().count());
        Ok(message)
    }

    async fn snapshot(&self, symbol: &str) -> Result<PriceSnapshot> {
        let bars = self
            .prices
            .fetch_bars(symbol)
            .await
            .with_context(|| format!("Failed to fetch price history for {symbol}"))?;

        PriceSnapshot::from_bars(&bars, self.ctx.settings.market.avg_volume_window)
            .with_context(|| format!("Cannot build snapshot for {symbol}"))
    }
}

fn failure_notice(ctx: &RunContext, err: &anyhow::Error) -> String {
    format!(
        "{REPORT_TITLE} failed ({})\n```\n{:?}\n```",
        ctx.sent_at(),
        err
    )
}
