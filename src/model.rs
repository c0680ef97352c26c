use arboard::Clipboard;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info, trace};

use crate::company::Company;
use crate::domain::{
    DirectoryConfig, DirectoryError, FETCH_FAILED_MESSAGE, Facet, HELP_TEXT, Message,
};
use crate::engine::{self, Derived, Facets, Query};
use crate::inputter::{InputResult, Inputter};
use crate::store::{FetchHandle, FetchResult};

#[derive(Debug, PartialEq)]
pub enum Status {
    RUNNING,
    QUITTING,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Error(String),
    Ready,
}

/// What key presses currently mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modus {
    BROWSE,
    SEARCH,
    PICKER,
    POPUP,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker {
    pub facet: Facet,
    pub options: Vec<String>,
    pub selected: usize,
}

/// Everything the ui needs to draw one frame. Published on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct UIData {
    pub load_state: LoadState,
    pub query: Query,
    pub page: Vec<Company>,
    pub total_matches: usize,
    pub total_pages: usize,
    pub industries: Vec<String>,
    pub locations: Vec<String>,
    pub selected: usize,
    pub search_input: Option<InputResult>,
    pub picker: Option<Picker>,
    pub show_popup: bool,
    pub popup_message: String,
    pub status_message: String,
}

impl UIData {
    pub fn empty() -> Self {
        UIData {
            load_state: LoadState::Loading,
            query: Query::default(),
            page: Vec::new(),
            total_matches: 0,
            total_pages: 0,
            industries: Vec::new(),
            locations: Vec::new(),
            selected: 0,
            search_input: None,
            picker: None,
            show_popup: false,
            popup_message: String::new(),
            status_message: String::new(),
        }
    }
}

/// Owns the directory state. Filter, sort and page changes go through
/// [`Model::update`]; the derived page is recomputed right away and published
/// to subscribers as one [`UIData`].
pub struct Model {
    config: DirectoryConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    load_state: LoadState,
    companies: Vec<Company>,
    facets: Facets,
    query: Query,
    derived: Derived,
    derived_for: Option<Query>,
    derive_count: usize,
    selected: usize,
    input: Inputter,
    last_input: InputResult,
    picker: Option<Picker>,
    fetch: Option<FetchHandle>,
    clipboard: Option<Clipboard>,
    status_message: String,
    uidata_tx: watch::Sender<UIData>,
}

impl Model {
    pub fn init(config: &DirectoryConfig) -> Self {
        let (uidata_tx, _) = watch::channel(UIData::empty());
        let mut model = Self {
            config: config.clone(),
            status: Status::RUNNING,
            modus: Modus::BROWSE,
            previous_modus: Modus::BROWSE,
            load_state: LoadState::Loading,
            companies: Vec::new(),
            facets: engine::facets(&[]),
            query: Query::default(),
            derived: Derived::default(),
            derived_for: None,
            derive_count: 0,
            selected: 0,
            input: Inputter::default(),
            last_input: InputResult::default(),
            picker: None,
            fetch: None,
            clipboard: None,
            status_message: "Loading companies ...".to_string(),
            uidata_tx,
        };
        model.publish();
        model
    }

    pub fn subscribe(&self) -> watch::Receiver<UIData> {
        self.uidata_tx.subscribe()
    }

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn total_pages(&self) -> usize {
        self.derived.total_pages
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    /// Take over an in-flight fetch. Its result is applied by [`Model::poll_fetch`].
    pub fn load(&mut self, handle: FetchHandle) {
        info!("Loading companies ...");
        self.load_state = LoadState::Loading;
        self.fetch = Some(handle);
        self.publish();
    }

    pub fn poll_fetch(&mut self) {
        let Some(result) = self.fetch.as_mut().and_then(FetchHandle::poll) else {
            return;
        };
        self.fetch = None;
        self.on_fetched(result);
    }

    pub(crate) fn on_fetched(&mut self, result: FetchResult) {
        if self.load_state != LoadState::Loading {
            debug!("Ignoring fetch result, state is already {:?}", self.load_state);
            return;
        }
        match result {
            Ok(companies) => {
                info!("Loaded {} companies", companies.len());
                self.facets = engine::facets(&companies);
                self.companies = companies;
                self.load_state = LoadState::Ready;
                self.derived_for = None;
                self.set_status_message(format!("Loaded {} companies", self.companies.len()));
            }
            Err(e) => {
                error!("Could not load companies: {e}");
                self.companies.clear();
                self.facets = engine::facets(&[]);
                self.load_state = LoadState::Error(FETCH_FAILED_MESSAGE.to_string());
                self.derived_for = None;
                self.set_status_message("Loading failed");
            }
        }
        self.publish();
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Option<Message>) -> Result<(), DirectoryError> {
        self.poll_fetch();

        let Some(msg) = message else {
            return Ok(());
        };
        trace!("Update: Modus {:?}, Message {:?}", self.modus, msg);
        match self.modus {
            Modus::BROWSE => match msg {
                Message::Quit => self.quit(),
                Message::Help => self.show_help(),
                Message::FocusSearch => self.focus_search(),
                Message::OpenIndustryPicker => self.open_picker(Facet::Industry),
                Message::OpenLocationPicker => self.open_picker(Facet::Location),
                msg @ (Message::SearchChanged(_)
                | Message::IndustryChanged(_)
                | Message::LocationChanged(_)
                | Message::ToggleSort
                | Message::ResetFilters
                | Message::PageRequested(_)) => self.apply_intent(msg),
                Message::SelectNext => self.move_selection(1),
                Message::SelectPrev => self.move_selection(-1),
                Message::CopySelected => self.copy_selected(),
                _ => (),
            },
            Modus::SEARCH => match msg {
                Message::Quit => self.quit(),
                Message::RawKey(key) => self.search_input(key),
                msg @ Message::SearchChanged(_) => self.apply_intent(msg),
                _ => (),
            },
            Modus::PICKER => match msg {
                Message::Quit => self.quit(),
                Message::PickerUp => self.move_picker(-1),
                Message::PickerDown => self.move_picker(1),
                Message::Enter => self.apply_picker(),
                Message::Exit => self.close_picker(),
                _ => (),
            },
            Modus::POPUP => match msg {
                Message::Quit => self.quit(),
                Message::Exit | Message::Help => self.exit_popup(),
                _ => (),
            },
        }
        Ok(())
    }

    // -------------------- Filter, sort and page state ---------------------- //

    /// Filter, sort and page intents, whether typed as a key binding or
    /// produced by the search box and the facet pickers.
    fn apply_intent(&mut self, msg: Message) {
        match msg {
            Message::SearchChanged(term) => self.set_search_term(term),
            Message::IndustryChanged(industry) => self.set_industry(industry),
            Message::LocationChanged(location) => self.set_location(location),
            Message::ToggleSort => self.toggle_sort(),
            Message::ResetFilters => self.reset_filters(),
            Message::PageRequested(page) => self.request_page(page),
            _ => trace!("Not a filter intent: {msg:?}"),
        }
    }

    pub fn set_search_term(&mut self, term: String) {
        self.query.search_term = term;
        self.filters_changed();
    }

    pub fn set_industry(&mut self, industry: String) {
        self.query.industry = industry;
        self.filters_changed();
    }

    pub fn set_location(&mut self, location: String) {
        self.query.location = location;
        self.filters_changed();
    }

    pub fn toggle_sort(&mut self) {
        self.query.sort_order = self.query.sort_order.toggled();
        self.filters_changed();
    }

    pub fn reset_filters(&mut self) {
        info!("Resetting filters");
        self.query = Query::default();
        self.filters_changed();
    }

    // Every filter or sort change starts over at the first page, even if the
    // current page would still exist.
    fn filters_changed(&mut self) {
        self.query.current_page = 1;
        self.selected = 0;
        self.recompute();
        self.set_status_message(format!("Found {} companies", self.derived.total_matches));
        self.publish();
    }

    /// Jump to `page`, kept within `1..=max(1, total_pages)`.
    pub fn request_page(&mut self, page: usize) {
        let last = std::cmp::max(1, self.derived.total_pages);
        let page = page.clamp(1, last);
        trace!("Page {page} requested, {last} available");
        self.query.current_page = page;
        // Back to the first card, like scrolling to the top.
        self.selected = 0;
        self.recompute();
        self.set_status_message(format!("Page {page}/{last}"));
        self.publish();
    }

    fn recompute(&mut self) {
        if self.derived_for.as_ref() == Some(&self.query) {
            return;
        }
        let start_time = Instant::now();
        self.derived = engine::derive(&self.companies, &self.query, self.config.page_size);
        self.derived_for = Some(self.query.clone());
        self.derive_count += 1;
        debug!(
            "Recomputed view #{} for {:?}: {} matches, {} pages in {}us",
            self.derive_count,
            self.query,
            self.derived.total_matches,
            self.derived.total_pages,
            start_time.elapsed().as_micros()
        );
    }

    fn publish(&mut self) {
        self.recompute();
        let uidata = UIData {
            load_state: self.load_state.clone(),
            query: self.query.clone(),
            page: self.derived.page.clone(),
            total_matches: self.derived.total_matches,
            total_pages: self.derived.total_pages,
            industries: self.facets.industries.clone(),
            locations: self.facets.locations.clone(),
            selected: self.selected,
            search_input: (self.modus == Modus::SEARCH).then(|| self.last_input.clone()),
            picker: self.picker.clone(),
            show_popup: self.modus == Modus::POPUP,
            popup_message: HELP_TEXT.to_string(),
            status_message: self.status_message.clone(),
        };
        self.uidata_tx.send_replace(uidata);
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }

    // -------------------- Control handling functions ---------------------- //

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.publish();
    }

    fn exit_popup(&mut self) {
        trace!("Close popup ...");
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
        self.publish();
    }

    fn focus_search(&mut self) {
        trace!("Entering search input ...");
        self.previous_modus = self.modus;
        self.modus = Modus::SEARCH;
        self.last_input = self.input.begin(&self.query.search_term);
        self.publish();
    }

    fn search_input(&mut self, key: ratatui::crossterm::event::KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.modus = self.previous_modus;
            self.previous_modus = Modus::SEARCH;
        }
        if self.last_input.changed {
            self.apply_intent(Message::SearchChanged(self.last_input.input.clone()));
        } else {
            self.publish();
        }
    }

    fn open_picker(&mut self, facet: Facet) {
        let (options, current) = match facet {
            Facet::Industry => (&self.facets.industries, &self.query.industry),
            Facet::Location => (&self.facets.locations, &self.query.location),
        };
        let selected = options.iter().position(|o| o == current).unwrap_or(0);
        self.picker = Some(Picker {
            facet,
            options: options.clone(),
            selected,
        });
        self.previous_modus = self.modus;
        self.modus = Modus::PICKER;
        self.publish();
    }

    fn move_picker(&mut self, step: isize) {
        if let Some(picker) = self.picker.as_mut() {
            let last = picker.options.len().saturating_sub(1);
            picker.selected = picker.selected.saturating_add_signed(step).min(last);
        }
        self.publish();
    }

    fn apply_picker(&mut self) {
        let Some(picker) = self.picker.take() else {
            self.modus = Modus::BROWSE;
            self.publish();
            return;
        };
        self.modus = self.previous_modus;
        self.previous_modus = Modus::PICKER;
        let value = picker
            .options
            .get(picker.selected)
            .cloned()
            .unwrap_or_default();
        let intent = match picker.facet {
            Facet::Industry => Message::IndustryChanged(value),
            Facet::Location => Message::LocationChanged(value),
        };
        self.apply_intent(intent);
    }

    fn close_picker(&mut self) {
        self.picker = None;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::PICKER;
        self.publish();
    }

    fn move_selection(&mut self, step: isize) {
        let last = self.derived.page.len().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(step).min(last);
        self.publish();
    }

    fn copy_selected(&mut self) {
        let Some(company) = self.derived.page.get(self.selected) else {
            return;
        };
        let row = company.as_csv_row();
        let name = company.name.clone();
        trace!("Copy content: {}", row);

        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    trace!("Clipboard unavailable: {:?}", e);
                    self.set_status_message("Clipboard unavailable");
                    self.publish();
                    return;
                }
            }
        }
        if let Some(clipboard) = self.clipboard.as_mut() {
            match clipboard.set_text(row) {
                Ok(_) => self.set_status_message(format!("Copied {name} to clipboard")),
                Err(e) => {
                    trace!("Error copying to clipboard: {:?}", e);
                    self.set_status_message("Copy failed");
                }
            }
        }
        self.publish();
    }
}
