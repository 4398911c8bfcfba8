use log::warn;
use market_data::fetcher::PriceBar;
use std::collections::VecDeque;

use crate::error::AnalysisError;

/// One evaluation's worth of price/volume figures for a single instrument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSnapshot {
    pub close: f64,
    /// Percent change of `close` against the previous close.
    pub change_pct: f64,
    pub high: f64,
    pub low: f64,
    pub prev_high: f64,
    pub prev_low: f64,
    pub volume: i64,
    /// Mean of the trailing volume window, current bar included.
    pub avg_volume: i64,
}

impl PriceSnapshot {
    /// Build a snapshot from chronologically ordered bars. Only the last two
    /// bars and the trailing volume window are read.
    pub fn from_bars(bars: &[PriceBar], avg_volume_window: usize) -> Result<Self, AnalysisError> {
        if avg_volume_window == 0 {
            return Err(AnalysisError::InvalidWindow);
        }

        let [.., prev, cur] = bars else {
            return Err(AnalysisError::InsufficientHistory { bars: bars.len() });
        };

        let first_used = bars.len().saturating_sub(avg_volume_window.max(2));
        let mut window = VolumeWindow::init(avg_volume_window.min(bars.len()));
        for (index, bar) in bars.iter().enumerate().skip(first_used) {
            validate_bar(bar).map_err(|reason| AnalysisError::InvalidBar { index, reason })?;
            window.insert(bar.volume);
        }

        if prev.close == 0.0 {
            return Err(AnalysisError::InvalidBar {
                index: bars.len() - 2,
                reason: "previous close is zero",
            });
        }

        Ok(Self {
            close: cur.close,
            change_pct: (cur.close / prev.close - 1.0) * 100.0,
            high: cur.high,
            low: cur.low,
            prev_high: prev.high,
            prev_low: prev.low,
            volume: cur.volume,
            avg_volume: window.mean(),
        })
    }
}

struct VolumeWindow {
    data: VecDeque<i64>,
    size: usize,
}

impl VolumeWindow {
    fn init(size: usize) -> Self {
        Self {
            data: VecDeque::with_capacity(size),
            size,
        }
    }

    fn insert(&mut self, volume: i64) {
        if self.data.len() == self.size {
            self.data.pop_front();
        }
        self.data.push_back(volume);
    }

    // Truncates toward zero.
    fn mean(&self) -> i64 {
        if self.data.is_empty() {
            return 0;
        }
        let sum: i128 = self.data.iter().map(|&v| i128::from(v)).sum();
        (sum / self.data.len() as i128) as i64
    }
}

pub fn validate_bar(bar: &PriceBar) -> Result<(), &'static str> {
    let prices = [bar.open, bar.high, bar.low, bar.close];

    if prices.iter().any(|p| !p.is_finite()) {
        warn!("Non-finite price in bar {:?}", bar);
        return Err("price is not a finite number");
    }

    if prices.iter().any(|&p| p < 0.0) {
        warn!("Negative price in bar {:?}", bar);
        return Err("price cannot be negative");
    }

    if bar.volume < 0 {
        warn!("Invalid volume data in bar {:?}", bar);
        return Err("volume cannot be negative");
    }

    Ok(())
}
