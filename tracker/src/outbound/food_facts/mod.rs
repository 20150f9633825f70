//! Food-facts outbound adapters.
//!
//! This module provides a thin HTTP implementation of the `FoodFactsSource`
//! port against the Open Food Facts v2 product API.

mod dto;
mod http_source;

pub use http_source::FoodFactsHttpSource;
