use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::data::filter;
use crate::data::loader::DatasetCache;
use crate::data::model::{DataError, Dataset, FilteredView};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Debug)]
pub struct AppState {
    /// Settings from `covid-tracker.json`, or defaults.
    pub config: AppConfig,

    /// Memoized loads; the only state shared across interactions.
    pub cache: DatasetCache,

    /// Path of the source currently shown.
    pub source: Option<PathBuf>,

    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Arc<Dataset>>,

    /// Currently selected country.
    pub country: Option<String>,

    /// Inclusive display range; meaningful only while a country is selected.
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    /// Earliest/latest record date of the selected country.
    pub bounds: Option<(NaiveDate, NaiveDate)>,

    /// Rows for the current selection (cached; rebuilt by `refilter`).
    pub view: Option<FilteredView>,

    /// Validation message when start > end; blocks the dashboard render.
    pub range_error: Option<String>,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        AppState {
            config,
            cache: DatasetCache::new(),
            source: None,
            dataset: None,
            country: None,
            start_date: NaiveDate::MIN,
            end_date: NaiveDate::MIN,
            bounds: None,
            view: None,
            range_error: None,
            status_message: None,
        }
    }

    /// Load `path` through the cache and show it. The caller decides whether
    /// a failure is fatal (startup) or a status message (File → Open).
    pub fn load_path(&mut self, path: PathBuf) -> Result<(), DataError> {
        let dataset = self.cache.load(&path)?;
        self.set_dataset(path, dataset);
        Ok(())
    }

    /// Re-read the current source, bypassing the cache.
    pub fn reload(&mut self) {
        let Some(path) = self.source.clone() else {
            return;
        };
        match self.cache.reload(&path) {
            Ok(dataset) => {
                log::info!("{}: reloaded", path.display());
                self.set_dataset(path, dataset);
            }
            Err(e) => {
                log::error!("reload failed: {e}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a loaded dataset: pick the default country, reset the range to
    /// its bounds, rebuild the view.
    pub fn set_dataset(&mut self, source: PathBuf, dataset: Arc<Dataset>) {
        self.country = filter::default_country(
            filter::list_countries(&dataset),
            &self.config.default_country,
        )
        .map(str::to_string);

        self.source = Some(source);
        self.dataset = Some(dataset);
        self.status_message = None;
        self.reset_range_to_bounds();
    }

    /// Select a country and reset the pickers to its full range.
    pub fn set_country(&mut self, country: String) {
        self.country = Some(country);
        self.reset_range_to_bounds();
    }

    /// Move the start of the range, clamped into the country's bounds.
    pub fn set_start_date(&mut self, date: NaiveDate) {
        self.start_date = self.clamp(date);
        self.refilter();
    }

    /// Move the end of the range, clamped into the country's bounds.
    pub fn set_end_date(&mut self, date: NaiveDate) {
        self.end_date = self.clamp(date);
        self.refilter();
    }

    fn clamp(&self, date: NaiveDate) -> NaiveDate {
        match self.bounds {
            Some((min, max)) => date.clamp(min, max),
            None => date,
        }
    }

    fn reset_range_to_bounds(&mut self) {
        self.bounds = None;
        if let (Some(dataset), Some(country)) = (&self.dataset, &self.country) {
            if let Ok((min, max)) = filter::date_bounds(dataset, country) {
                self.bounds = Some((min, max));
                self.start_date = min;
                self.end_date = max;
            }
        }
        self.refilter();
    }

    /// Recompute the cached view after any selection change.
    pub fn refilter(&mut self) {
        self.view = None;
        self.range_error = None;

        let (Some(dataset), Some(country)) = (&self.dataset, &self.country) else {
            return;
        };
        match filter::filter(dataset, country, self.start_date, self.end_date) {
            Ok(view) => self.view = Some(view),
            Err(e @ DataError::InvalidRange { .. }) => {
                self.range_error = Some(e.to_string());
            }
            Err(e) => {
                self.status_message = Some(e.to_string());
            }
        }
    }
}
