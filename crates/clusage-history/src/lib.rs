//! Daily usage file reader for clusage
//!
//! This crate implements [`clusage_core::HistoryReader`] over the
//! `data/daily/YYYY-MM-DD.json` files written by the usage recorder.

pub mod reader;

pub use reader::DailyFileReader;
