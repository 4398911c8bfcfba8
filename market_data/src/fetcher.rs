use log::{debug, info};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::MarketSettings;
use crate::error::FetchError;

/// One daily observation as returned by the chart endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

#[derive(Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    indicators: Indicators,
}

#[derive(Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

// The provider sends `null` for sessions that are still incomplete.
#[derive(Deserialize, Default)]
#[serde(default)]
struct Quote {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<i64>>,
}

/// Pulls daily price history from a Yahoo-style v8 chart endpoint.
pub struct PriceHistoryClient {
    client: Client,
    base_url: String,
    lookback: String,
    interval: String,
}

impl PriceHistoryClient {
    pub fn new(client: Client, settings: &MarketSettings) -> Self {
        Self {
            client,
            base_url: settings.chart_base_url.trim_end_matches('/').to_string(),
            lookback: settings.lookback.clone(),
            interval: settings.interval.clone(),
        }
    }

    /// Bars in chronological order, oldest first.
    pub async fn fetch_bars(&self, symbol: &str) -> Result<Vec<PriceBar>, FetchError> {
        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            symbol.replace('^', "%5E")
        );
        info!("Fetching {} price history for {}", self.lookback, symbol);

        let response = self
            .client
            .get(&url)
            .query(&[("range", self.lookback.as_str()), ("interval", self.interval.as_str())])
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status(),
            });
        }

        let body: ChartResponse = response.json().await?;
        let bars = extract_bars(symbol, body)?;
        debug!("Received {} bars for {}", bars.len(), symbol);
        Ok(bars)
    }
}

fn extract_bars(symbol: &str, body: ChartResponse) -> Result<Vec<PriceBar>, FetchError> {
    if let Some(err) = body.chart.error {
        return Err(FetchError::NoData(format!(
            "{symbol} ({}: {})",
            err.code, err.description
        )));
    }

    let quote = body
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .and_then(|result| result.indicators.quote.into_iter().next())
        .ok_or_else(|| FetchError::NoData(symbol.to_string()))?;

    let rows = [
        quote.open.len(),
        quote.high.len(),
        quote.low.len(),
        quote.close.len(),
        quote.volume.len(),
    ]
    .into_iter()
    .min()
    .unwrap_or(0);

    let bars: Vec<PriceBar> = (0..rows)
        .filter_map(|i| {
            Some(PriceBar {
                open: quote.open[i]?,
                high: quote.high[i]?,
                low: quote.low[i]?,
                close: quote.close[i]?,
                volume: quote.volume[i]?,
            })
        })
        .collect();

    if bars.is_empty() {
        return Err(FetchError::NoData(symbol.to_string()));
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base: &str) -> MarketSettings {
        MarketSettings {
            chart_base_url: base.to_string(),
            ..Default::default()
        }
    }

    fn chart_body() -> serde_json::Value {
        json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "NVDA" },
                    "timestamp": [1, 2, 3],
                    "indicators": {
                        "quote": [{
                            "open":   [180.0, 182.0, null],
                            "high":   [185.0, 190.0, 191.0],
                            "low":    [178.0, 180.0, 189.0],
                            "close":  [184.0, 186.5, 190.5],
                            "volume": [100, 150, 20]
                        }]
                    }
                }],
                "error": null
            }
        })
    }

    #[tokio::test]
    async fn parses_bars_and_drops_incomplete_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/NVDA"))
            .and(query_param("range", "10d"))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = PriceHistoryClient::new(Client::new(), &settings(&server.uri()));
        let bars = client.fetch_bars("NVDA").await.unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(
            bars[1],
            PriceBar {
                open: 182.0,
                high: 190.0,
                low: 180.0,
                close: 186.5,
                volume: 150,
            }
        );
    }

    #[tokio::test]
    async fn index_symbols_are_escaped_in_the_path() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/%5ESOX"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chart_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = PriceHistoryClient::new(Client::new(), &settings(&server.uri()));
        assert!(client.fetch_bars("^SOX").await.is_ok());
    }

    #[tokio::test]
    async fn provider_error_object_is_no_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "chart": {
                    "result": null,
                    "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
                }
            })))
            .mount(&server)
            .await;

        let client = PriceHistoryClient::new(Client::new(), &settings(&server.uri()));
        let err = client.fetch_bars("XXXX").await.unwrap_err();
        assert!(matches!(err, FetchError::NoData(msg) if msg.contains("delisted")));
    }

    #[tokio::test]
    async fn non_success_status_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = PriceHistoryClient::new(Client::new(), &settings(&server.uri()));
        let err = client.fetch_bars("NVDA").await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status, .. } if status.as_u16() == 503));
    }
}
