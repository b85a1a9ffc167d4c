use std::ops::Range;
use std::sync::Arc;

use chrono::NaiveDate;

use super::model::{DataError, Dataset, FilteredView};

// ---------------------------------------------------------------------------
// Country facets
// ---------------------------------------------------------------------------

/// Distinct locations, lexically ascending.
pub fn list_countries(dataset: &Dataset) -> &[String] {
    &dataset.countries
}

/// The country a fresh dashboard opens on: `preferred` when present in the
/// list, otherwise the lexically first entry. `None` only for an empty list.
pub fn default_country<'a>(countries: &'a [String], preferred: &str) -> Option<&'a str> {
    countries
        .iter()
        .find(|c| c.as_str() == preferred)
        .or_else(|| countries.first())
        .map(String::as_str)
}

/// Earliest and latest record date for `country`.
pub fn date_bounds(dataset: &Dataset, country: &str) -> Result<(NaiveDate, NaiveDate), DataError> {
    let rows = country_range(dataset, country);
    let slice = &dataset.records[rows];
    match (slice.first(), slice.last()) {
        (Some(first), Some(last)) => Ok((first.date, last.date)),
        _ => Err(DataError::UnknownCountry(country.to_string())),
    }
}

// ---------------------------------------------------------------------------
// Range filtering
// ---------------------------------------------------------------------------

/// Rows for `country` with `start <= date <= end`, both ends inclusive.
///
/// `start > end` is refused before anything else is looked at, so the error
/// never depends on the dataset. A country with no matching rows (unknown
/// countries included) yields an empty view, which is a valid result.
pub fn filter(
    dataset: &Arc<Dataset>,
    country: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<FilteredView, DataError> {
    if start > end {
        return Err(DataError::InvalidRange { start, end });
    }

    let rows = country_range(dataset, country);
    let slice = &dataset.records[rows.clone()];
    let lo = rows.start + slice.partition_point(|r| r.date < start);
    let hi = rows.start + slice.partition_point(|r| r.date <= end);

    Ok(FilteredView::new(
        Arc::clone(dataset),
        lo..hi,
        country.to_string(),
        start,
        end,
    ))
}

/// Contiguous run of records for `country` in the sorted dataset.
fn country_range(dataset: &Dataset, country: &str) -> Range<usize> {
    let start = dataset
        .records
        .partition_point(|r| r.location.as_str() < country);
    // From `start` on, locations sort >= country; the matching run is the
    // prefix still equal to it.
    let len = dataset.records[start..].partition_point(|r| r.location.as_str() == country);
    start..start + len
}
