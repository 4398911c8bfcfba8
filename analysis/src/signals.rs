use std::fmt;

use crate::snapshot::PriceSnapshot;

/// Qualitative read of a single snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trend {
    UpwardBreakout,
    DownwardBreakout,
    RangeBound,
}

impl Trend {
    /// First match wins: an upward break is reported even when the low was
    /// also undercut.
    pub fn classify(snapshot: &PriceSnapshot) -> Self {
        let heavy_volume = snapshot.volume > snapshot.avg_volume;

        if heavy_volume && snapshot.high > snapshot.prev_high {
            Self::UpwardBreakout
        } else if heavy_volume && snapshot.low < snapshot.prev_low {
            Self::DownwardBreakout
        } else {
            Self::RangeBound
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UpwardBreakout => "UPWARD_BREAKOUT",
            Self::DownwardBreakout => "DOWNWARD_BREAKOUT",
            Self::RangeBound => "RANGE_BOUND",
        }
    }

    pub const fn narrative(&self) -> &'static str {
        match self {
            Self::UpwardBreakout => {
                "It cleared the prior session's high on above-average volume, a short-term breakout."
            }
            Self::DownwardBreakout => {
                "It undercut the prior session's low on above-average volume as selling pressure built."
            }
            Self::RangeBound => {
                "Volume was unremarkable and price is consolidating around key levels."
            }
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sector performance against a broader benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelativeStrength {
    Outperform,
    Underperform,
    Inline,
}

impl RelativeStrength {
    pub fn compare(sector_change_pct: f64, benchmark_change_pct: f64) -> Self {
        if sector_change_pct > benchmark_change_pct {
            Self::Outperform
        } else if sector_change_pct < benchmark_change_pct {
            Self::Underperform
        } else {
            Self::Inline
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Outperform => "OUTPERFORM",
            Self::Underperform => "UNDERPERFORM",
            Self::Inline => "INLINE",
        }
    }

    pub const fn verb(&self) -> &'static str {
        match self {
            Self::Outperform => "outperformed",
            Self::Underperform => "underperformed",
            Self::Inline => "moved in line",
        }
    }
}

impl fmt::Display for RelativeStrength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn snapshot(volume: i64, avg_volume: i64, high: f64, prev_high: f64, low: f64, prev_low: f64) -> PriceSnapshot {
        PriceSnapshot {
            close: (high + low) / 2.0,
            change_pct: 0.0,
            high,
            low,
            prev_high,
            prev_low,
            volume,
            avg_volume,
        }
    }

    #[test_case(150, 100, 190.0, 185.0, 180.0, 178.0 => Trend::UpwardBreakout; "volume and new high")]
    #[test_case(90, 100, 190.0, 195.0, 180.0, 178.0 => Trend::RangeBound; "light volume")]
    #[test_case(150, 100, 190.0, 195.0, 170.0, 178.0 => Trend::DownwardBreakout; "volume and new low")]
    #[test_case(150, 100, 200.0, 195.0, 170.0, 178.0 => Trend::UpwardBreakout; "outside day prefers upward")]
    #[test_case(100, 100, 200.0, 195.0, 170.0, 178.0 => Trend::RangeBound; "volume equal to average")]
    #[test_case(150, 100, 195.0, 195.0, 178.0, 178.0 => Trend::RangeBound; "inside the prior range")]
    fn classifies(volume: i64, avg: i64, high: f64, prev_high: f64, low: f64, prev_low: f64) -> Trend {
        Trend::classify(&snapshot(volume, avg, high, prev_high, low, prev_low))
    }

    #[test_case(2.73, 0.81 => RelativeStrength::Outperform)]
    #[test_case(0.81, 2.73 => RelativeStrength::Underperform)]
    #[test_case(-0.10, -0.10 => RelativeStrength::Inline)]
    fn compares(sector: f64, benchmark: f64) -> RelativeStrength {
        RelativeStrength::compare(sector, benchmark)
    }

    #[test]
    fn labels_render_in_screaming_case() {
        assert_eq!(Trend::DownwardBreakout.to_string(), "DOWNWARD_BREAKOUT");
        assert_eq!(RelativeStrength::Inline.to_string(), "INLINE");
    }

    fn price() -> impl Strategy<Value = f64> {
        1.0f64..10_000.0
    }

    proptest! {
        #[test]
        fn upward_when_volume_and_high_break(
            avg in 0i64..1_000_000, extra in 1i64..1_000_000,
            prev_high in price(), up in 0.01f64..100.0,
            prev_low in price(), down in 0.0f64..100.0,
        ) {
            let s = snapshot(avg + extra, avg, prev_high + up, prev_high, prev_low + down, prev_low);
            prop_assert_eq!(Trend::classify(&s), Trend::UpwardBreakout);
        }

        #[test]
        fn downward_when_volume_and_low_break(
            avg in 0i64..1_000_000, extra in 1i64..1_000_000,
            prev_high in price(), below in 0.0f64..100.0,
            prev_low in price(), down in 0.01f64..100.0,
        ) {
            let s = snapshot(avg + extra, avg, prev_high - below, prev_high, prev_low - down, prev_low);
            prop_assert_eq!(Trend::classify(&s), Trend::DownwardBreakout);
        }

        #[test]
        fn both_breaks_resolve_upward(
            avg in 0i64..1_000_000, extra in 1i64..1_000_000,
            prev_high in price(), up in 0.01f64..100.0,
            prev_low in price(), down in 0.01f64..100.0,
        ) {
            let s = snapshot(avg + extra, avg, prev_high + up, prev_high, prev_low - down, prev_low);
            prop_assert_eq!(Trend::classify(&s), Trend::UpwardBreakout);
        }

        #[test]
        fn range_bound_without_volume(
            volume in 0i64..1_000_000, surplus in 0i64..1_000_000,
            high in price(), prev_high in price(),
            low in price(), prev_low in price(),
        ) {
            let s = snapshot(volume, volume + surplus, high, prev_high, low, prev_low);
            prop_assert_eq!(Trend::classify(&s), Trend::RangeBound);
        }

        #[test]
        fn range_bound_inside_prior_range(
            avg in 0i64..1_000_000, extra in 0i64..1_000_000,
            prev_high in price(), below in 0.0f64..100.0,
            prev_low in price(), above in 0.0f64..100.0,
        ) {
            let s = snapshot(avg + extra, avg, prev_high - below, prev_high, prev_low + above, prev_low);
            prop_assert_eq!(Trend::classify(&s), Trend::RangeBound);
        }

        #[test]
        fn comparison_is_antisymmetric(a in -50.0f64..50.0, b in -50.0f64..50.0) {
            let forward = RelativeStrength::compare(a, b);
            let backward = RelativeStrength::compare(b, a);
            prop_assert_eq!(
                forward == RelativeStrength::Outperform,
                backward == RelativeStrength::Underperform
            );
            prop_assert_eq!(RelativeStrength::compare(a, a), RelativeStrength::Inline);
        }
    }
}
