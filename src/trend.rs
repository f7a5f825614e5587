//! Dip-buy trend signal
//!
//! Buy when the latest price sits below the trailing mean by more than the
//! configured ratio. No smoothing, no outlier rejection; an empty history is
//! never a buy.

use crate::market::PriceSeries;
use serde::Serialize;

/// Default dip ratio: buy at least 10% under the trailing average
pub const DEFAULT_DIP_RATIO: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradeSignal {
    pub should_trade: bool,
    pub current_price: Option<f64>,
    pub average_price: Option<f64>,
}

impl TradeSignal {
    fn no_data() -> Self {
        Self {
            should_trade: false,
            current_price: None,
            average_price: None,
        }
    }
}

/// Analyze with the default 10% dip
pub fn analyze(series: &PriceSeries) -> TradeSignal {
    analyze_with_ratio(series, DEFAULT_DIP_RATIO)
}

pub fn analyze_with_ratio(series: &PriceSeries, dip_ratio: f64) -> TradeSignal {
    let Some(last) = series.last() else {
        tracing::warn!("No historical data available to analyze trends");
        return TradeSignal::no_data();
    };

    let current_price = last.price;
    let average_price = series.prices().sum::<f64>() / series.len() as f64;
    let should_trade = current_price < average_price * dip_ratio;

    tracing::debug!(current_price, average_price, should_trade, "Trend analyzed");

    TradeSignal {
        should_trade,
        current_price: Some(current_price),
        average_price: Some(average_price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_series_never_trades() {
        let signal = analyze(&PriceSeries::empty());
        assert!(!signal.should_trade);
        assert_eq!(signal.current_price, None);
        assert_eq!(signal.average_price, None);
    }

    #[test]
    fn twenty_percent_dip_trades() {
        let series = PriceSeries::from_prices(&[100.0, 100.0, 100.0, 100.0, 100.0, 100.0, 80.0]);
        let signal = analyze(&series);

        assert!(signal.should_trade);
        assert_eq!(signal.current_price, Some(80.0));
        let avg = signal.average_price.unwrap();
        assert!((avg - 97.142857).abs() < 1e-4);
    }

    #[test]
    fn small_dip_does_not_trade() {
        // mean 97.5, threshold 87.75
        let series = PriceSeries::from_prices(&[100.0, 100.0, 100.0, 90.0]);
        assert!(!analyze(&series).should_trade);
    }

    #[test]
    fn exactly_at_threshold_does_not_trade() {
        // mean 100, last 90 == 100 * 0.9
        let series = PriceSeries::from_prices(&[110.0, 100.0, 90.0]);
        assert!(!analyze(&series).should_trade);
    }

    #[test]
    fn rising_price_does_not_trade() {
        let series = PriceSeries::from_prices(&[1.0, 2.0, 3.0, 4.0]);
        assert!(!analyze(&series).should_trade);
    }

    #[test]
    fn single_sample_equals_its_mean() {
        let signal = analyze(&PriceSeries::from_prices(&[42.0]));
        assert!(!signal.should_trade);
        assert_eq!(signal.average_price, Some(42.0));
    }

    #[test]
    fn custom_ratio_is_honored() {
        // mean 97.5, last 90: below 0.95 * mean but not 0.9 * mean
        let series = PriceSeries::from_prices(&[100.0, 100.0, 100.0, 90.0]);
        assert!(analyze_with_ratio(&series, 0.95).should_trade);
        assert!(!analyze_with_ratio(&series, 0.9).should_trade);
    }
}
