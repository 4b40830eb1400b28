//! Static model pricing and cost calculation for clusage
//!
//! Prices are a fixed per-family table; there is no network lookup. The
//! calculator turns the token breakdown attached to usage records into
//! USD (and optionally KRW) figures.

pub mod cost_calculator;

pub use cost_calculator::{CostBreakdown, CostCalculator, CostOptions, ModelPricing, ModelTier};
