use std::path::{Path, PathBuf};

use crate::color::ColorMap;
use crate::config::Config;
use crate::dashboard::Dashboard;
use crate::data::filter::{filtered_indices, init_filter_state, FilterState};
use crate::data::loader::{load_or_default, LoadedTable};
use crate::data::model::{columns, CellValue};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table and where it came from (None until a load succeeds).
    pub loaded: Option<LoadedTable>,

    /// File read when nothing has been uploaded.
    pub fallback_path: PathBuf,

    /// Histogram bin count.
    pub bins: usize,

    /// Current sidebar control values.
    pub filters: FilterState,

    /// Indices of trips passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Charts derived from `visible_indices` (cached).
    pub dashboard: Dashboard,

    /// Colours for the `model` category, shared by scatter series and legends.
    pub color_map: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            loaded: None,
            fallback_path: config.data.clone(),
            bins: usize::from(config.bins),
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            dashboard: Dashboard::default(),
            color_map: ColorMap::default(),
            status_message: None,
        }
    }

    /// Load an uploaded file, or the fallback file when `upload` is `None`.
    ///
    /// On failure the previous table stays loaded and the error is shown.
    pub fn load(&mut self, upload: Option<&Path>) {
        match load_or_default(upload, &self.fallback_path) {
            Ok(loaded) => self.set_table(loaded),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Ingest a newly loaded table, initialise filters and colours.
    pub fn set_table(&mut self, loaded: LoadedTable) {
        self.filters = init_filter_state(&loaded.table);
        self.color_map = loaded
            .table
            .unique_values
            .get(columns::MODEL)
            .map(ColorMap::new)
            .unwrap_or_default();
        self.loaded = Some(loaded);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and every chart after a control change.
    pub fn refilter(&mut self) {
        if let Some(loaded) = &self.loaded {
            self.visible_indices = filtered_indices(&loaded.table, &self.filters);
            self.dashboard = Dashboard::build(&loaded.table, &self.visible_indices, self.bins);
            log::debug!(
                "Filtered {} of {} trips",
                self.visible_indices.len(),
                loaded.table.len()
            );
        }
    }

    /// Restore slider and dropdown defaults.
    pub fn reset_filters(&mut self) {
        if let Some(loaded) = &self.loaded {
            self.filters = init_filter_state(&loaded.table);
            self.refilter();
        }
    }

    /// Choose a dropdown value; `None` shows every category.
    pub fn select_category(&mut self, value: Option<CellValue>) {
        if let Some(category) = &mut self.filters.category {
            category.selected = value;
            self.refilter();
        }
    }

    /// Set one slider's selection, clamped to its bounds.
    pub fn set_range(&mut self, column: &str, min: f64, max: f64) {
        if let Some(range) = self.filters.ranges.iter_mut().find(|r| r.column == column) {
            range.min = min;
            range.max = max;
            range.clamp();
            self.refilter();
        }
    }

    pub fn total_rows(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.table.len())
    }
}
