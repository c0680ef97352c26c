use std::path::PathBuf;
use std::time::Duration;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

pub const PAGE_SIZE: usize = 9;
pub const ALL_INDUSTRIES: &str = "All Industries";
pub const ALL_LOCATIONS: &str = "All Locations";
pub const FETCH_FAILED_MESSAGE: &str = "Failed to fetch companies. Please try again later.";

pub const HELP_TEXT: &str = "\
  /            search by name\n\
  i            pick industry\n\
  l            pick location\n\
  s            toggle sort A-Z / Z-A\n\
  r            reset all filters\n\
  n, →, PgDn   next page\n\
  p, ←, PgUp   previous page\n\
  Home, End    first / last page\n\
  ↑, ↓, Tab    select company\n\
  y            copy selected company\n\
  ?            this help\n\
  q            quit\n\
\n\
  Esc closes this window.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Help,
    Exit,
    Enter,
    RawKey(KeyEvent),
    FocusSearch,
    SearchChanged(String),
    OpenIndustryPicker,
    OpenLocationPicker,
    PickerUp,
    PickerDown,
    IndustryChanged(String),
    LocationChanged(String),
    ToggleSort,
    ResetFilters,
    PageRequested(usize),
    SelectNext,
    SelectPrev,
    CopySelected,
}

/// Which facet a picker popup edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facet {
    Industry,
    Location,
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct DirectoryConfig {
    /// Replaces the bundled collection when set.
    #[setters(strip_option)]
    pub data_path: Option<PathBuf>,
    pub fetch_delay: Duration,
    /// Probability in `[0, 1]` that a fetch fails on purpose.
    pub failure_rate: f64,
    pub page_size: usize,
    pub event_poll_time: u64,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            data_path: None,
            fetch_delay: Duration::from_millis(1000),
            failure_rate: 0.0,
            page_size: PAGE_SIZE,
            event_poll_time: 100,
        }
    }
}

impl DirectoryConfig {
    pub fn validate(self) -> Result<Self, DirectoryError> {
        if !(0.0..=1.0).contains(&self.failure_rate) {
            return Err(DirectoryError::Config(format!(
                "failure rate must be within 0.0..=1.0, got {}",
                self.failure_rate
            )));
        }
        if self.page_size == 0 {
            return Err(DirectoryError::Config("page size must be at least 1".into()));
        }
        Ok(self)
    }
}

/// Everything that can go wrong while retrieving the collection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("simulated failure while fetching companies")]
    Simulated,
    #[error("could not read company data: {0}")]
    Io(String),
    #[error("company data is malformed: {0}")]
    Malformed(String),
}

impl From<std::io::Error> for FetchError {
    fn from(err: std::io::Error) -> Self {
        FetchError::Io(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = DirectoryConfig::default().validate().unwrap();
        assert_eq!(cfg.page_size, 9);
        assert_eq!(cfg.failure_rate, 0.0);
        assert_eq!(cfg.fetch_delay, Duration::from_millis(1000));
    }

    #[test]
    fn rejects_out_of_range_failure_rate() {
        let err = DirectoryConfig::default()
            .with_failure_rate(1.5)
            .validate()
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Config(_)));
    }

    #[test]
    fn rejects_empty_pages() {
        let err = DirectoryConfig::default()
            .with_page_size(0)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("page size"));
    }
}
