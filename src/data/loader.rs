use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::Value as JsonValue;

use super::model::{DataError, Dataset, Metric, Record};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`  – header row with `location`, `date` and optional metric columns
/// * `.json` – records-oriented array, `[{ "location": .., "date": .., ... }]`
///
/// Column keys are matched after trimming and lowercasing. Rows with a
/// missing/unparsable date or an empty location are dropped individually;
/// they never fail the load.
pub fn load_file(path: &Path) -> Result<Dataset, DataError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        other => Err(unavailable(
            path,
            format!("unsupported file extension .{other} (expected .csv or .json)"),
        )),
    }
}

fn unavailable(path: &Path, reason: impl ToString) -> DataError {
    DataError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Shared normalization helpers
// ---------------------------------------------------------------------------

/// Accepted date formats, tried in order. ISO first; the slash spellings show
/// up in hand-edited exports.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Column keys are case- and whitespace-insensitive on read. Excel-style
/// exports prefix the first header with a UTF-8 BOM; without the strip that
/// header never matches `location`.
fn normalize_key(key: &str) -> String {
    key.trim_start_matches('\u{feff}').trim().to_lowercase()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Empty, unparsable and non-finite cells all map to null.
fn parse_metric_cell(s: &str) -> Option<f64> {
    let v: f64 = s.trim().parse().ok()?;
    v.is_finite().then_some(v)
}

/// Common tail of both loaders: reject empty results, sort, log a summary.
fn finish_dataset(path: &Path, records: Vec<Record>, dropped: usize) -> Result<Dataset, DataError> {
    if records.is_empty() {
        return Err(DataError::EmptyDataset {
            path: path.to_path_buf(),
        });
    }
    let dataset = Dataset::from_records(records);
    log::info!(
        "{}: {} records across {} countries ({} rows dropped)",
        path.display(),
        dataset.len(),
        dataset.countries.len(),
        dropped
    );
    Ok(dataset)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one observation per row.
/// `location` and `date` are required, the six metric columns optional;
/// any other columns are ignored.
fn load_csv(path: &Path) -> Result<Dataset, DataError> {
    let file = File::open(path).map_err(|e| unavailable(path, e))?;
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| unavailable(path, e))?
        .iter()
        .map(normalize_key)
        .collect();

    let location_idx = headers.iter().position(|h| h == "location");
    let date_idx = headers.iter().position(|h| h == "date");
    let (Some(location_idx), Some(date_idx)) = (location_idx, date_idx) else {
        // Without the required columns every row is invalid; say why before
        // reporting the usual empty result.
        log::warn!(
            "{}: required column(s) missing (need location and date)",
            path.display()
        );
        return Err(DataError::EmptyDataset {
            path: path.to_path_buf(),
        });
    };

    // Metric → column index, for the metric columns this file carries.
    let metric_cols: Vec<(Metric, usize)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| Metric::from_column(h).map(|m| (m, i)))
        .collect();

    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let row = match result {
            Ok(row) => row,
            Err(e) => {
                log::warn!("{}: skipping malformed row {row_no}: {e}", path.display());
                dropped += 1;
                continue;
            }
        };

        let location = row.get(location_idx).unwrap_or("");
        if location.is_empty() {
            dropped += 1;
            continue;
        }
        let Some(date) = row.get(date_idx).and_then(parse_date) else {
            dropped += 1;
            continue;
        };

        let mut record = Record::new(location, date);
        for &(metric, idx) in &metric_cols {
            record.set_value(metric, row.get(idx).and_then(parse_metric_cell));
        }
        records.push(record);
    }

    finish_dataset(path, records, dropped)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON (the shape `df.to_json(orient='records')` writes):
///
/// ```json
/// [
///   { "location": "Kenya", "date": "2021-01-01", "total_cases": 10.0 },
///   ...
/// ]
/// ```
///
/// Nulls and missing keys both read as null; numbers must be finite.
fn load_json(path: &Path) -> Result<Dataset, DataError> {
    let text = std::fs::read_to_string(path).map_err(|e| unavailable(path, e))?;
    let root: JsonValue =
        serde_json::from_str(&text).map_err(|e| unavailable(path, format!("invalid JSON: {e}")))?;

    let Some(rows) = root.as_array() else {
        return Err(unavailable(path, "expected a top-level JSON array of records"));
    };

    let mut records = Vec::with_capacity(rows.len());
    let mut dropped = 0usize;

    for row in rows {
        let Some(obj) = row.as_object() else {
            dropped += 1;
            continue;
        };

        // Normalize keys the same way as CSV headers.
        let fields: BTreeMap<String, &JsonValue> =
            obj.iter().map(|(k, v)| (normalize_key(k), v)).collect();

        let location = fields
            .get("location")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        if location.is_empty() {
            dropped += 1;
            continue;
        }
        let date = fields
            .get("date")
            .and_then(|v| v.as_str())
            .and_then(parse_date);
        let Some(date) = date else {
            dropped += 1;
            continue;
        };

        let mut record = Record::new(location, date);
        for metric in Metric::ALL {
            let value = fields
                .get(metric.column())
                .and_then(|v| v.as_f64())
                .filter(|v| v.is_finite());
            record.set_value(metric, value);
        }
        records.push(record);
    }

    finish_dataset(path, records, dropped)
}

// ---------------------------------------------------------------------------
// DatasetCache – memoized loads keyed by source identity
// ---------------------------------------------------------------------------

/// Process-wide memoization of loaded datasets, keyed by canonicalized path.
/// The source is treated as static for the process lifetime: `load` never
/// re-reads a known source, and invalidation is explicit only
/// ([`DatasetCache::reload`] / [`DatasetCache::invalidate`]).
/// Single-threaded, like everything else in this app.
#[derive(Debug, Default)]
pub struct DatasetCache {
    entries: BTreeMap<PathBuf, Arc<Dataset>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stable identity for a source path: the canonicalized spelling where
    /// canonicalization is possible, the given path otherwise.
    fn key(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
    }

    /// Memoized load: a source that was loaded before is returned as-is,
    /// without touching the file again.
    pub fn load(&mut self, path: &Path) -> Result<Arc<Dataset>, DataError> {
        let key = Self::key(path);
        if let Some(dataset) = self.entries.get(&key) {
            log::debug!("{}: dataset cache hit", path.display());
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(load_file(path)?);
        self.entries.insert(key, Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Bypass the cache, re-read the source, and replace the entry.
    pub fn reload(&mut self, path: &Path) -> Result<Arc<Dataset>, DataError> {
        let dataset = Arc::new(load_file(path)?);
        self.entries.insert(Self::key(path), Arc::clone(&dataset));
        Ok(dataset)
    }

    /// Drop the cached entry for `path`, if any.
    pub fn invalidate(&mut self, path: &Path) {
        self.entries.remove(&Self::key(path));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    const BASIC_CSV: &str = "\
location,date,total_cases,new_cases
Kenya,2021-01-02,15,5
Kenya,2021-01-01,10,10
Germany,2021-01-01,100,100
";

    #[test]
    fn loads_and_sorts_by_location_then_date() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", BASIC_CSV);

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.countries, vec!["Germany", "Kenya"]);

        let keys: Vec<(&str, NaiveDate)> = ds
            .records
            .iter()
            .map(|r| (r.location.as_str(), r.date))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Germany", date("2021-01-01")),
                ("Kenya", date("2021-01-01")),
                ("Kenya", date("2021-01-02")),
            ]
        );
        assert_eq!(ds.records[1].value(Metric::TotalCases), Some(10.0));
        assert_eq!(ds.records[1].value(Metric::NewCases), Some(10.0));
        // Column not present in the file at all.
        assert_eq!(ds.records[1].value(Metric::TotalDeaths), None);
    }

    #[test]
    fn headers_are_trimmed_and_lowercased() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            " Location , DATE , Total_Cases \nKenya,2021-01-01,7\n",
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].location, "Kenya");
        assert_eq!(ds.records[0].value(Metric::TotalCases), Some(7.0));
    }

    #[test]
    fn bom_prefixed_header_still_finds_location() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            "\u{feff}location,date,total_cases\nKenya,2021-01-01,5\n",
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.records[0].location, "Kenya");
        assert_eq!(ds.records[0].value(Metric::TotalCases), Some(5.0));
    }

    #[test]
    fn unparsable_dates_drop_only_their_row() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            "location,date,new_cases\n\
             Kenya,2021-01-01,1\n\
             Kenya,not-a-date,2\n\
             Kenya,2021-01-03,3\n",
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        // Surviving neighbours keep their values and relative order.
        assert_eq!(ds.records[0].date, date("2021-01-01"));
        assert_eq!(ds.records[0].value(Metric::NewCases), Some(1.0));
        assert_eq!(ds.records[1].date, date("2021-01-03"));
        assert_eq!(ds.records[1].value(Metric::NewCases), Some(3.0));
    }

    #[test]
    fn slash_date_formats_are_accepted() {
        assert_eq!(parse_date("2021/01/31"), Some(date("2021-01-31")));
        assert_eq!(parse_date("01/31/2021"), Some(date("2021-01-31")));
        assert_eq!(parse_date(" 2021-01-31 "), Some(date("2021-01-31")));
        assert_eq!(parse_date("31st of Jan"), None);
    }

    #[test]
    fn missing_file_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let err = load_file(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, DataError::SourceUnavailable { .. }));
    }

    #[test]
    fn unsupported_extension_is_source_unavailable() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.parquet", "whatever");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DataError::SourceUnavailable { .. }));
    }

    #[test]
    fn zero_valid_rows_is_empty_dataset() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            "location,date\nKenya,never\n,2021-01-01\n",
        );
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DataError::EmptyDataset { .. }));
    }

    #[test]
    fn missing_required_columns_is_empty_dataset() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", "country,day\nKenya,2021-01-01\n");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DataError::EmptyDataset { .. }));
    }

    #[test]
    fn absent_column_equals_all_null_column() {
        let dir = TempDir::new().unwrap();
        let absent = write_file(
            &dir,
            "absent.csv",
            "location,date,total_cases\nKenya,2021-01-01,5\n",
        );
        let all_null = write_file(
            &dir,
            "null.csv",
            "location,date,total_cases,total_deaths\nKenya,2021-01-01,5,\n",
        );

        let a = load_file(&absent).unwrap();
        let b = load_file(&all_null).unwrap();
        assert_eq!(a.records[0].value(Metric::TotalDeaths), None);
        assert_eq!(b.records[0].value(Metric::TotalDeaths), None);
        assert_eq!(a.records[0].values, b.records[0].values);
    }

    #[test]
    fn unparsable_and_non_finite_numbers_become_null() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.csv",
            "location,date,total_cases,new_cases,total_deaths\n\
             Kenya,2021-01-01,abc,NaN,inf\n",
        );

        let ds = load_file(&path).unwrap();
        let rec = &ds.records[0];
        assert_eq!(rec.value(Metric::TotalCases), None);
        assert_eq!(rec.value(Metric::NewCases), None);
        assert_eq!(rec.value(Metric::TotalDeaths), None);
    }

    #[test]
    fn json_records_load() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "data.json",
            r#"[
                {"Location": "Kenya", "DATE": "2021-01-02", "total_cases": 15, "total_deaths": null},
                {"location": "Kenya", "date": "2021-01-01", "total_cases": 10},
                {"location": "Kenya", "date": "garbage", "total_cases": 99}
            ]"#,
        );

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.records[0].date, date("2021-01-01"));
        assert_eq!(ds.records[1].value(Metric::TotalCases), Some(15.0));
        assert_eq!(ds.records[1].value(Metric::TotalDeaths), None);
    }

    #[test]
    fn json_top_level_must_be_an_array() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.json", r#"{"location": "Kenya"}"#);
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, DataError::SourceUnavailable { .. }));
    }

    #[test]
    fn cache_load_is_memoized_by_source() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", BASIC_CSV);

        let mut cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // Changing the file is not observed without an explicit reload.
        fs::write(&path, "location,date\nKenya,2021-01-01\n").unwrap();
        let third = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &third));
        assert_eq!(third.len(), 3);
    }

    #[test]
    fn cache_reload_re_reads_the_source() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", BASIC_CSV);

        let mut cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();
        assert_eq!(first.len(), 3);

        fs::write(&path, "location,date\nKenya,2021-01-01\n").unwrap();
        let reloaded = cache.reload(&path).unwrap();
        assert_eq!(reloaded.len(), 1);

        // The replacement becomes the memoized entry.
        let after = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&reloaded, &after));
    }

    #[test]
    fn cache_invalidate_forces_a_re_read() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "data.csv", BASIC_CSV);

        let mut cache = DatasetCache::new();
        let first = cache.load(&path).unwrap();

        cache.invalidate(&path);
        let second = cache.load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(first.records, second.records);
    }
}
