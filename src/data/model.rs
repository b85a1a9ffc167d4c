use std::ops::Range;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Metric – the known numeric fields of the dataset
// ---------------------------------------------------------------------------

/// One of the six numeric columns a record may carry. Values for a metric are
/// always optional: a source file may omit the column entirely or leave
/// individual cells empty, and both look the same downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    TotalCases,
    TotalDeaths,
    TotalVaccinations,
    NewCases,
    NewDeaths,
    NewVaccinations,
}

impl Metric {
    /// All metrics, in cumulative-then-daily order.
    pub const ALL: [Metric; 6] = [
        Metric::TotalCases,
        Metric::TotalDeaths,
        Metric::TotalVaccinations,
        Metric::NewCases,
        Metric::NewDeaths,
        Metric::NewVaccinations,
    ];

    /// Number of metrics; sizes the per-record value array.
    pub const COUNT: usize = Self::ALL.len();

    /// Normalized source column name.
    pub fn column(self) -> &'static str {
        match self {
            Metric::TotalCases => "total_cases",
            Metric::TotalDeaths => "total_deaths",
            Metric::TotalVaccinations => "total_vaccinations",
            Metric::NewCases => "new_cases",
            Metric::NewDeaths => "new_deaths",
            Metric::NewVaccinations => "new_vaccinations",
        }
    }

    /// Human-readable label for cards and chart titles.
    pub fn label(self) -> &'static str {
        match self {
            Metric::TotalCases => "Total Cases",
            Metric::TotalDeaths => "Total Deaths",
            Metric::TotalVaccinations => "Total Vaccinations",
            Metric::NewCases => "New Cases",
            Metric::NewDeaths => "New Deaths",
            Metric::NewVaccinations => "New Vaccinations",
        }
    }

    /// Whether this is a running total (plotted as a line) rather than a
    /// daily increment (plotted as bars).
    pub fn is_cumulative(self) -> bool {
        matches!(
            self,
            Metric::TotalCases | Metric::TotalDeaths | Metric::TotalVaccinations
        )
    }

    /// Match a normalized (trimmed, lowercased) column name.
    pub fn from_column(name: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.column() == name)
    }
}

// ---------------------------------------------------------------------------
// Record – one (location, date) observation
// ---------------------------------------------------------------------------

/// A single observation row. `values` is indexed by [`Metric`] declaration
/// order; an absent source column and a present-but-empty cell are both
/// `None`, so consumers never need to distinguish the two.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub location: String,
    pub date: NaiveDate,
    pub values: [Option<f64>; Metric::COUNT],
}

impl Record {
    /// A record with every metric unset.
    pub fn new(location: impl Into<String>, date: NaiveDate) -> Self {
        Record {
            location: location.into(),
            date,
            values: [None; Metric::COUNT],
        }
    }

    /// Value of one metric for this row.
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values[metric as usize]
    }

    /// Set one metric's value.
    pub fn set_value(&mut self, metric: Metric, value: Option<f64>) {
        self.values[metric as usize] = value;
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full normalized dataset: records sorted by (location, date) ascending,
/// immutable after construction. The country index is precomputed here so the
/// UI never scans all rows per frame.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// All valid records, sorted by (location asc, date asc).
    pub records: Vec<Record>,
    /// Distinct locations, lexically ascending.
    pub countries: Vec<String>,
}

impl Dataset {
    /// Sort the records into canonical order and build the country index.
    pub fn from_records(mut records: Vec<Record>) -> Self {
        records.sort_by(|a, b| a.location.cmp(&b.location).then(a.date.cmp(&b.date)));

        let mut countries: Vec<String> = Vec::new();
        for rec in &records {
            if countries.last().map(String::as_str) != Some(rec.location.as_str()) {
                countries.push(rec.location.clone());
            }
        }

        Dataset { records, countries }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset has no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// FilteredView – the subset shown for one (country, date range) selection
// ---------------------------------------------------------------------------

/// A non-owning slice of the dataset matching one country and one inclusive
/// date range. Because records are sorted by (location, date), the match is
/// always a single contiguous run, held as a range into the shared dataset.
#[derive(Debug, Clone)]
pub struct FilteredView {
    dataset: Arc<Dataset>,
    range: Range<usize>,
    pub country: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FilteredView {
    pub(crate) fn new(
        dataset: Arc<Dataset>,
        range: Range<usize>,
        country: String,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        FilteredView {
            dataset,
            range,
            country,
            start,
            end,
        }
    }

    /// The matching records, in date order.
    pub fn records(&self) -> &[Record] {
        &self.dataset.records[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    /// The chronologically last non-null value of `metric`, if any. An
    /// all-null column yields `None` exactly like an absent one.
    pub fn latest_value(&self, metric: Metric) -> Option<f64> {
        self.records().iter().rev().find_map(|r| r.value(metric))
    }

    /// Ordered (date, value) pairs for `metric`, nulls preserved so the
    /// presentation layer decides how to render gaps.
    pub fn series(&self, metric: Metric) -> impl Iterator<Item = (NaiveDate, Option<f64>)> + '_ {
        self.records().iter().map(move |r| (r.date, r.value(metric)))
    }

    /// Whether any row in the view has a value for `metric`.
    pub fn has_values(&self, metric: Metric) -> bool {
        self.records().iter().any(|r| r.value(metric).is_some())
    }
}

// ---------------------------------------------------------------------------
// DataError – the failure taxonomy of the data layer
// ---------------------------------------------------------------------------

/// Everything that can go wrong between a source file and a rendered view.
/// Load-time variants are fatal for that load; `InvalidRange` is a
/// user-correctable validation failure that only blocks the current render.
#[derive(Debug, Error)]
pub enum DataError {
    /// Input missing, unreadable, or not a format we know how to parse.
    #[error("cannot read {}: {reason}", path.display())]
    SourceUnavailable { path: PathBuf, reason: String },

    /// The source was readable but zero valid rows survived normalization.
    #[error("{}: no valid rows after normalization", path.display())]
    EmptyDataset { path: PathBuf },

    /// The requested country has no records.
    #[error("no records for country {0:?}")]
    UnknownCountry(String),

    /// Start date after end date.
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn rec(location: &str, d: &str) -> Record {
        Record::new(location, date(d))
    }

    #[test]
    fn metric_columns_round_trip() {
        for m in Metric::ALL {
            assert_eq!(Metric::from_column(m.column()), Some(m));
        }
        assert_eq!(Metric::from_column("population"), None);
    }

    #[test]
    fn cumulative_and_daily_split_evenly() {
        let cumulative = Metric::ALL.iter().filter(|m| m.is_cumulative()).count();
        assert_eq!(cumulative, 3);
    }

    #[test]
    fn record_values_default_to_none_and_set_by_metric() {
        let mut r = rec("Kenya", "2021-01-01");
        for m in Metric::ALL {
            assert_eq!(r.value(m), None);
        }
        r.set_value(Metric::NewCases, Some(12.0));
        assert_eq!(r.value(Metric::NewCases), Some(12.0));
        assert_eq!(r.value(Metric::TotalCases), None);
    }

    #[test]
    fn from_records_sorts_by_location_then_date() {
        let ds = Dataset::from_records(vec![
            rec("Kenya", "2021-01-02"),
            rec("Germany", "2021-03-01"),
            rec("Kenya", "2021-01-01"),
            rec("Germany", "2021-01-01"),
        ]);

        let keys: Vec<(&str, NaiveDate)> = ds
            .records
            .iter()
            .map(|r| (r.location.as_str(), r.date))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Germany", date("2021-01-01")),
                ("Germany", date("2021-03-01")),
                ("Kenya", date("2021-01-01")),
                ("Kenya", date("2021-01-02")),
            ]
        );
    }

    #[test]
    fn country_index_is_distinct_and_sorted() {
        let ds = Dataset::from_records(vec![
            rec("Kenya", "2021-01-01"),
            rec("Kenya", "2021-01-02"),
            rec("Argentina", "2021-01-01"),
            rec("Zimbabwe", "2021-01-01"),
            rec("Kenya", "2021-01-03"),
        ]);
        assert_eq!(ds.countries, vec!["Argentina", "Kenya", "Zimbabwe"]);
        assert_eq!(ds.len(), 5);
        assert!(!ds.is_empty());
    }
}
