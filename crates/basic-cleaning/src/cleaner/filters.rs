//! Row filters on numeric bounds.
//!
//! Both filters build a boolean mask and hand it to [`DataFrame::filter`],
//! which keeps surviving rows in their original order. A null coordinate or
//! price never satisfies a range, so such rows are dropped.

use crate::config::GeoBounds;
use crate::error::{CleaningError, Result};
use crate::utils::{LATITUDE, LONGITUDE, NumericFormat, PRICE, numeric_column_as_f64};
use polars::prelude::*;

/// Read a required column as `Float64`, mapping failures to malformed input.
///
/// Only `price` may carry a currency symbol or thousands separators.
fn float_column(df: &DataFrame, name: &str) -> Result<Float64Chunked> {
    let column = df.column(name)?;
    let format = if name == PRICE {
        NumericFormat::Currency
    } else {
        NumericFormat::Plain
    };
    numeric_column_as_f64(column.as_materialized_series(), format)
        .map_err(|reason| CleaningError::MalformedInput(format!("column '{}': {}", name, reason)))
}

/// Mask of rows with `min_price <= price <= max_price`.
pub(crate) fn price_mask(df: &DataFrame, min_price: f64, max_price: f64) -> Result<BooleanChunked> {
    let prices = float_column(df, PRICE)?;

    let mask_values: Vec<bool> = prices
        .into_iter()
        .map(|price| price.is_some_and(|p| min_price <= p && p <= max_price))
        .collect();

    Ok(BooleanChunked::from_slice("price_mask".into(), &mask_values))
}

/// Mask of rows whose coordinates lie inside `bounds`.
pub(crate) fn geo_mask(df: &DataFrame, bounds: &GeoBounds) -> Result<BooleanChunked> {
    let longitudes = float_column(df, LONGITUDE)?;
    let latitudes = float_column(df, LATITUDE)?;

    let mask_values: Vec<bool> = longitudes
        .into_iter()
        .zip(latitudes.into_iter())
        .map(|pair| match pair {
            (Some(lon), Some(lat)) => bounds.contains(lon, lat),
            _ => false,
        })
        .collect();

    Ok(BooleanChunked::from_slice("geo_mask".into(), &mask_values))
}

/// Keep rows inside the inclusive price range. Returns the filtered frame and
/// the number of rows removed.
pub(crate) fn filter_by_price(
    df: &DataFrame,
    min_price: f64,
    max_price: f64,
) -> Result<(DataFrame, usize)> {
    let mask = price_mask(df, min_price, max_price)?;
    let filtered = df.filter(&mask)?;
    let removed = df.height() - filtered.height();
    Ok((filtered, removed))
}

/// Keep rows inside the bounding box. Returns the filtered frame and the
/// number of rows removed.
pub(crate) fn filter_by_geography(df: &DataFrame, bounds: &GeoBounds) -> Result<(DataFrame, usize)> {
    let mask = geo_mask(df, bounds)?;
    let filtered = df.filter(&mask)?;
    let removed = df.height() - filtered.height();
    Ok((filtered, removed))
}
