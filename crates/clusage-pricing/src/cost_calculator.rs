//! Cost calculator module for computing usage costs
//!
//! Each record carrying token data is priced against the tier its model
//! name belongs to. Cache tokens (creation and read) are billed at 10% of
//! the input rate; the difference from the full input rate is reported as
//! the cache discount.
//!
//! Every sub-total is rounded to 6 decimal places before it is summed so
//! that drift never becomes visible at 2-decimal display precision.
//!
//! # Examples
//!
//! ```
//! use clusage_core::types::{TokenBreakdown, UsageRecord};
//! use clusage_pricing::{CostCalculator, CostOptions};
//! use chrono::DateTime;
//!
//! let mut record = UsageRecord::new(
//!     DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z").unwrap(),
//!     0.5,
//!     0.2,
//! );
//! record.model = Some("sonnet".to_string());
//! record.tokens = Some(TokenBreakdown::new(1_000_000, 0, 0, 0));
//!
//! let cost = CostCalculator::calculate_total_cost(&[record], CostOptions::default());
//! assert_eq!(cost.input_cost_usd, 3.0);
//! assert_eq!(cost.total_cost_krw, None);
//! ```

use clusage_core::settings::DEFAULT_EXCHANGE_RATE;
use clusage_core::types::{TokenBreakdown, UsageRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fraction of the input rate waived on cache tokens
pub const CACHE_DISCOUNT_RATE: f64 = 0.9;

const TOKENS_PER_MTOK: f64 = 1_000_000.0;

/// Pricing tiers by model family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Opus,
    Sonnet,
    Haiku,
}

impl ModelTier {
    /// Resolve the tier for a model display name
    ///
    /// The name is lowercased and searched for a family substring rather
    /// than looked up in a table of exact model ids, so `"Opus 4.1"`,
    /// `"claude-opus-4-1"` and future releases of a family all resolve
    /// without an update here. `opus` is tested before `haiku`, and a name
    /// containing both is opus. Anything else, including a missing name, is
    /// priced as sonnet.
    ///
    /// ```
    /// use clusage_pricing::ModelTier;
    ///
    /// assert_eq!(ModelTier::from_model_name(Some("claude-opus-5")), ModelTier::Opus);
    /// assert_eq!(ModelTier::from_model_name(Some("Haiku")), ModelTier::Haiku);
    /// assert_eq!(ModelTier::from_model_name(Some("unknown")), ModelTier::Sonnet);
    /// ```
    pub fn from_model_name(name: Option<&str>) -> Self {
        let Some(name) = name else {
            return Self::Sonnet;
        };
        let lower = name.to_lowercase();
        if lower.contains("opus") {
            Self::Opus
        } else if lower.contains("haiku") {
            Self::Haiku
        } else {
            if !lower.contains("sonnet") {
                debug!("Unknown model '{}', pricing as sonnet", name);
            }
            Self::Sonnet
        }
    }

    pub fn pricing(&self) -> ModelPricing {
        match self {
            Self::Opus => ModelPricing::new(15.0, 75.0),
            Self::Sonnet => ModelPricing::new(3.0, 15.0),
            Self::Haiku => ModelPricing::new(0.25, 1.25),
        }
    }
}

/// USD prices per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPricing {
    pub input_per_mtok: f64,
    pub output_per_mtok: f64,
}

impl ModelPricing {
    pub fn new(input_per_mtok: f64, output_per_mtok: f64) -> Self {
        Self {
            input_per_mtok,
            output_per_mtok,
        }
    }
}

/// Cost figures for one record or a set of records
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub input_cost_usd: f64,
    pub output_cost_usd: f64,
    pub cache_discount_usd: f64,
    pub total_cost_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_cost_krw: Option<u64>,
}

/// Options for [`CostCalculator::calculate_total_cost`]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostOptions {
    pub include_krw: bool,
    /// KRW per USD; [`DEFAULT_EXCHANGE_RATE`] when `None`
    pub exchange_rate: Option<f64>,
}

impl CostOptions {
    /// Options that add a KRW total at `rate`
    pub fn krw(rate: f64) -> Self {
        Self {
            include_krw: true,
            exchange_rate: Some(rate),
        }
    }
}

/// Round to 6 decimal places
pub fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}

fn token_cost(tokens: u64, price_per_mtok: f64) -> f64 {
    round6(tokens as f64 / TOKENS_PER_MTOK * price_per_mtok)
}

/// Stateless calculator over the static pricing table
pub struct CostCalculator;

impl CostCalculator {
    /// Price a token breakdown at the given rates
    pub fn calculate_from_pricing(tokens: &TokenBreakdown, pricing: &ModelPricing) -> CostBreakdown {
        let cache_tokens = tokens.cache_total();

        let input_base = token_cost(tokens.input, pricing.input_per_mtok);
        let cache_cost = token_cost(
            cache_tokens,
            pricing.input_per_mtok * (1.0 - CACHE_DISCOUNT_RATE),
        );
        let input_cost_usd = round6(input_base + cache_cost);
        let output_cost_usd = token_cost(tokens.output, pricing.output_per_mtok);
        let cache_discount_usd = round6(
            cache_tokens as f64 / TOKENS_PER_MTOK * pricing.input_per_mtok * CACHE_DISCOUNT_RATE,
        );

        CostBreakdown {
            input_cost_usd,
            output_cost_usd,
            cache_discount_usd,
            total_cost_usd: round6(input_cost_usd + output_cost_usd),
            total_cost_krw: None,
        }
    }

    /// Cost of one record, or `None` if it carries no token data
    pub fn calculate_record_cost(record: &UsageRecord) -> Option<CostBreakdown> {
        let tokens = record.tokens.as_ref()?;
        let pricing = ModelTier::from_model_name(record.model.as_deref()).pricing();
        Some(Self::calculate_from_pricing(tokens, &pricing))
    }

    /// Sum the cost of every record that carries token data
    pub fn calculate_total_cost(records: &[UsageRecord], options: CostOptions) -> CostBreakdown {
        let mut input = 0.0;
        let mut output = 0.0;
        let mut discount = 0.0;
        let mut priced = 0usize;

        for cost in records.iter().filter_map(Self::calculate_record_cost) {
            input += cost.input_cost_usd;
            output += cost.output_cost_usd;
            discount += cost.cache_discount_usd;
            priced += 1;
        }

        let input_cost_usd = round6(input);
        let output_cost_usd = round6(output);
        let total_cost_usd = round6(input_cost_usd + output_cost_usd);

        debug!(
            "Calculated cost: ${:.6} over {} of {} records",
            total_cost_usd,
            priced,
            records.len()
        );

        CostBreakdown {
            input_cost_usd,
            output_cost_usd,
            cache_discount_usd: round6(discount),
            total_cost_usd,
            total_cost_krw: options.include_krw.then(|| {
                Self::convert_to_krw(
                    total_cost_usd,
                    options.exchange_rate.unwrap_or(DEFAULT_EXCHANGE_RATE),
                )
            }),
        }
    }

    /// Convert USD to whole won, truncating any fraction
    pub fn convert_to_krw(usd: f64, exchange_rate: f64) -> u64 {
        let krw = (usd * exchange_rate).floor();
        if krw.is_finite() && krw > 0.0 {
            krw as u64
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn record(model: Option<&str>, tokens: Option<TokenBreakdown>) -> UsageRecord {
        let mut record = UsageRecord::new(
            DateTime::parse_from_rfc3339("2026-03-01T10:00:00+09:00").unwrap(),
            0.4,
            0.1,
        );
        record.model = model.map(str::to_string);
        record.tokens = tokens;
        record
    }

    #[test]
    fn test_tier_resolution() {
        assert_eq!(ModelTier::from_model_name(Some("Opus 4.1")), ModelTier::Opus);
        assert_eq!(
            ModelTier::from_model_name(Some("claude-3-5-haiku")),
            ModelTier::Haiku
        );
        assert_eq!(ModelTier::from_model_name(Some("SONNET")), ModelTier::Sonnet);
        assert_eq!(ModelTier::from_model_name(Some("gpt-4")), ModelTier::Sonnet);
        assert_eq!(ModelTier::from_model_name(None), ModelTier::Sonnet);
    }

    #[test]
    fn test_tier_resolution_matches_substrings() {
        // Any id embedding a family name resolves, not just known releases
        assert_eq!(
            ModelTier::from_model_name(Some("anthropic/claude-opus-9-preview")),
            ModelTier::Opus
        );
        assert_eq!(ModelTier::from_model_name(Some("xHAIKUx")), ModelTier::Haiku);
        assert_eq!(ModelTier::from_model_name(Some("opus-haiku")), ModelTier::Opus);
        assert_eq!(ModelTier::from_model_name(Some("")), ModelTier::Sonnet);
    }

    #[test]
    fn test_sonnet_input_and_cache_discount() {
        let plain = record(Some("sonnet"), Some(TokenBreakdown::new(1_000_000, 0, 0, 0)));
        let cost = CostCalculator::calculate_record_cost(&plain).unwrap();
        assert_eq!(cost.input_cost_usd, 3.0);
        assert_eq!(cost.cache_discount_usd, 0.0);

        let cached = record(
            Some("sonnet"),
            Some(TokenBreakdown::new(1_000_000, 0, 0, 1_000_000)),
        );
        let cost = CostCalculator::calculate_record_cost(&cached).unwrap();
        assert_eq!(cost.input_cost_usd, 3.3);
        assert_eq!(cost.cache_discount_usd, 2.7);
        assert_eq!(cost.total_cost_usd, 3.3);
    }

    #[test]
    fn test_opus_output_rate() {
        let r = record(Some("opus"), Some(TokenBreakdown::new(0, 1_000_000, 0, 0)));
        let cost = CostCalculator::calculate_record_cost(&r).unwrap();
        assert_eq!(cost.output_cost_usd, 75.0);
        assert_eq!(cost.total_cost_usd, 75.0);
    }

    #[test]
    fn test_records_without_tokens_are_skipped() {
        assert!(CostCalculator::calculate_record_cost(&record(Some("opus"), None)).is_none());

        let records = vec![
            record(None, None),
            record(Some("haiku"), Some(TokenBreakdown::new(4_000_000, 0, 0, 0))),
        ];
        let total = CostCalculator::calculate_total_cost(&records, CostOptions::default());
        assert_eq!(total.total_cost_usd, 1.0);
        assert_eq!(total.total_cost_krw, None);
    }

    #[test]
    fn test_empty_records_are_zero() {
        let total = CostCalculator::calculate_total_cost(&[], CostOptions::krw(1300.0));
        assert_eq!(total.total_cost_usd, 0.0);
        assert_eq!(total.total_cost_krw, Some(0));
    }

    #[test]
    fn test_krw_conversion_truncates() {
        assert_eq!(CostCalculator::convert_to_krw(2.75, 999.0), 2747);
        assert_eq!(CostCalculator::convert_to_krw(0.0019, 1000.0), 1);
        assert_eq!(CostCalculator::convert_to_krw(1.0, 1300.0), 1300);

        let records = vec![record(
            Some("sonnet"),
            Some(TokenBreakdown::new(1_000_000, 0, 0, 0)),
        )];
        let total = CostCalculator::calculate_total_cost(
            &records,
            CostOptions {
                include_krw: true,
                exchange_rate: None,
            },
        );
        assert_eq!(total.total_cost_krw, Some(3900));
    }

    #[test]
    fn test_round6() {
        assert_eq!(round6(0.1 + 0.2), 0.3);
        assert_eq!(round6(1.2345674), 1.234567);
    }

    #[test]
    fn test_breakdown_serialization_omits_missing_krw() {
        let json = serde_json::to_value(CostBreakdown::default()).unwrap();
        assert!(json.get("total_cost_krw").is_none());

        let with_krw = CostBreakdown {
            total_cost_krw: Some(1300),
            ..Default::default()
        };
        let json = serde_json::to_value(with_krw).unwrap();
        assert_eq!(json["total_cost_krw"], 1300);
    }
}
