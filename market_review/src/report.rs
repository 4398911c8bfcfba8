use analysis::mode::Mode;
use analysis::signals::{RelativeStrength, Trend};
use analysis::snapshot::PriceSnapshot;
use log::info;

use crate::context::RunContext;
use crate::generator::{Prompt, TextGenerator};

pub const NEWS_FALLBACK: &str =
    "・Headlines are out, but the market has largely priced them in; reaction is limited.";
pub const SCENARIO_FALLBACK: &str =
    "・Up: extends higher on rising volume\n・Flat: range continues\n・Down: profit-taking";
pub const REVIEW_FALLBACK: &str = "・A flow-driven session rather than a news-driven one.";

const RULE: &str = "━━━━━━━━━━━━━━━━━━";
const NO_HEADLINES: &str = "・No headlines retrieved.";

/// Inputs gathered for one review.
#[derive(Debug, Clone)]
pub struct MarketView {
    pub stock: PriceSnapshot,
    pub sector: PriceSnapshot,
    pub benchmark: PriceSnapshot,
    pub headlines: Vec<String>,
}

struct Signals {
    stock: Trend,
    sector: Trend,
    strength: RelativeStrength,
}

pub struct ReportAssembler<'a> {
    ctx: &'a RunContext,
    generator: &'a dyn TextGenerator,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(ctx: &'a RunContext, generator: &'a dyn TextGenerator) -> Self {
        Self { ctx, generator }
    }

    pub async fn assemble(&self, view: &MarketView) -> String {
        let market = &self.ctx.settings.market;
        let signals = Signals {
            stock: Trend::classify(&view.stock),
            sector: Trend::classify(&view.sector),
            strength: RelativeStrength::compare(view.sector.change_pct, view.benchmark.change_pct),
        };
        info!(
            "{} {}, {} {}, sector vs {}: {}",
            market.symbol,
            signals.stock,
            market.sector_name,
            signals.sector,
            market.benchmark_name,
            signals.strength
        );

        let stock_line = technical_line(&market.symbol, &view.stock, signals.stock);
        let sector_line = technical_line(&market.sector_name, &view.sector, signals.sector);
        let strength_line = format!(
            "Versus the {}, semiconductors {} ({:+.2}% vs {:+.2}%).",
            market.benchmark_name,
            signals.strength.verb(),
            view.sector.change_pct,
            view.benchmark.change_pct
        );

        let news_block = if view.headlines.is_empty() {
            NO_HEADLINES.to_string()
        } else {
            view.headlines
                .iter()
                .map(|h| format!("・{h}"))
                .collect::<Vec<_>>()
                .join("\n")
        };

        let news_analysis = self
            .generator
            .generate(&self.news_prompt(&view.headlines))
            .await
            .or_fallback("news analysis", NEWS_FALLBACK);

        let facts = format!("{stock_line}\n{sector_line}\n{strength_line}");
        let (closing_heading, closing) = match self.ctx.mode {
            Mode::Evening => (
                format!("[{} {} Scenarios]", self.ctx.mode.slot(), market.symbol),
                self.generator
                    .generate(&self.scenario_prompt(&facts))
                    .await
                    .or_fallback("scenarios", SCENARIO_FALLBACK),
            ),
            Mode::Morning => (
                "[Review | Previous Session]".to_string(),
                self.generator
                    .generate(&self.review_prompt(&facts, &view.headlines))
                    .await
                    .or_fallback("previous session review", REVIEW_FALLBACK),
            ),
        };

        format!(
            "{RULE}\n\
             US Market Review | {time_label}\n\
             (US equities / semiconductors, {symbol} focus)\n\
             {RULE}\n\
             [News | Latest]\n\
             {news_block}\n\
             {news_analysis}\n\
             \n\
             [{symbol} Technicals]\n\
             {stock_line}\n\
             \n\
             [Semiconductor Sector]\n\
             {sector_line}\n\
             {strength_line}\n\
             \n\
             {closing_heading}\n\
             {closing}\n\
             {RULE}\n\
             Sent: {sent_at}\n\
             * Automatically generated. Not investment advice.\n",
            time_label = self.ctx.time_label(),
            symbol = market.symbol,
            sent_at = self.ctx.sent_at(),
        )
    }

    fn prompt(&self, user: String) -> Prompt {
        Prompt {
            system: self.ctx.settings.generation.system_prompt.clone(),
            user,
        }
    }

    fn news_prompt(&self, headlines: &[String]) -> Prompt {
        let market = &self.ctx.settings.market;
        self.prompt(format!(
            "Analyse how the following headlines affect US equities, especially \
             semiconductors and {}. Use only the information given and do not invent \
             figures. Answer as short bullet points starting with '・'.\n{}",
            market.symbol,
            bullet_list(headlines)
        ))
    }

    fn scenario_prompt(&self, facts: &str) -> Prompt {
        let market = &self.ctx.settings.market;
        self.prompt(format!(
            "Give three technical scenarios (up / flat / down) for {} and the {} for the \
             next session, one bullet each starting with '・'. Base them only on these \
             figures:\n{}",
            market.symbol, market.sector_name, facts
        ))
    }

    fn review_prompt(&self, facts: &str, headlines: &[String]) -> Prompt {
        let market = &self.ctx.settings.market;
        self.prompt(format!(
            "Review the previous session for {} and semiconductors using the news and \
             technicals below. Say whether the move was news-driven or flow-driven, as \
             short bullet points starting with '・'.\n\nTechnicals:\n{}\n\nNews:\n{}",
            market.symbol,
            facts,
            bullet_list(headlines)
        ))
    }
}

pub fn technical_line(name: &str, snapshot: &PriceSnapshot, trend: Trend) -> String {
    format!(
        "{} closed at {:.2} ({:+.2}%). {}",
        name,
        snapshot.close,
        snapshot.change_pct,
        trend.narrative()
    )
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "(none)".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}
