use std::time::Duration;
use tracing::trace;

use crate::domain::{DirectoryConfig, DirectoryError, Message};
use crate::model::{Modus, Model};
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &DirectoryConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, DirectoryError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            return Ok(self.handle_key(model, key));
        }
        Ok(None)
    }

    pub fn handle_key(&self, model: &Model, key: KeyEvent) -> Option<Message> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Some(Message::Quit);
        }
        let message = match model.modus() {
            Modus::SEARCH => Some(Message::RawKey(key)),
            Modus::PICKER => match key.code {
                KeyCode::Up | KeyCode::Char('k') => Some(Message::PickerUp),
                KeyCode::Down | KeyCode::Char('j') => Some(Message::PickerDown),
                KeyCode::Enter => Some(Message::Enter),
                KeyCode::Esc => Some(Message::Exit),
                KeyCode::Char('q') => Some(Message::Quit),
                _ => None,
            },
            Modus::POPUP => match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('?') => Some(Message::Exit),
                KeyCode::Char('q') => Some(Message::Quit),
                _ => None,
            },
            Modus::BROWSE => self.browse_key(model, key),
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }

    fn browse_key(&self, model: &Model, key: KeyEvent) -> Option<Message> {
        let current = model.query().current_page;
        let last = model.total_pages();
        match key.code {
            KeyCode::Char('q') => Some(Message::Quit),
            KeyCode::Char('?') => Some(Message::Help),
            KeyCode::Char('/') => Some(Message::FocusSearch),
            KeyCode::Char('i') => Some(Message::OpenIndustryPicker),
            KeyCode::Char('l') => Some(Message::OpenLocationPicker),
            KeyCode::Char('s') => Some(Message::ToggleSort),
            KeyCode::Char('r') => Some(Message::ResetFilters),
            KeyCode::Char('y') => Some(Message::CopySelected),
            KeyCode::Down | KeyCode::Tab | KeyCode::Char('j') => Some(Message::SelectNext),
            KeyCode::Up | KeyCode::BackTab | KeyCode::Char('k') => Some(Message::SelectPrev),
            // The pager only offers pages that exist.
            KeyCode::Char('n') | KeyCode::Right | KeyCode::PageDown if current < last => {
                Some(Message::PageRequested(current + 1))
            }
            KeyCode::Char('p') | KeyCode::Left | KeyCode::PageUp if current > 1 => {
                Some(Message::PageRequested(current - 1))
            }
            KeyCode::Home if current != 1 && last > 0 => Some(Message::PageRequested(1)),
            KeyCode::End if current != last && last > 0 => Some(Message::PageRequested(last)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::company::company;
    use crate::domain::FetchError;
    use crate::engine::Query;

    fn model_with(n: usize) -> Model {
        let mut model = Model::init(&DirectoryConfig::default());
        if n > 0 {
            let companies = (0..n)
                .map(|i| company(&i.to_string(), &format!("C{i:02}"), "Tech", "Oslo"))
                .collect();
            model.on_fetched(Ok(companies));
        } else {
            model.on_fetched(Err(FetchError::Simulated));
        }
        model
    }

    fn press(controller: &Controller, model: &Model, code: KeyCode) -> Option<Message> {
        controller.handle_key(model, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn maps_filter_keys() {
        let c = Controller::new(&DirectoryConfig::default());
        let m = model_with(20);
        assert_eq!(press(&c, &m, KeyCode::Char('/')), Some(Message::FocusSearch));
        assert_eq!(press(&c, &m, KeyCode::Char('i')), Some(Message::OpenIndustryPicker));
        assert_eq!(press(&c, &m, KeyCode::Char('l')), Some(Message::OpenLocationPicker));
        assert_eq!(press(&c, &m, KeyCode::Char('s')), Some(Message::ToggleSort));
        assert_eq!(press(&c, &m, KeyCode::Char('r')), Some(Message::ResetFilters));
        assert_eq!(press(&c, &m, KeyCode::Char('x')), None);
    }

    #[test]
    fn pager_keys_stay_within_existing_pages() {
        let c = Controller::new(&DirectoryConfig::default());
        let mut m = model_with(20);
        assert_eq!(press(&c, &m, KeyCode::Char('p')), None);
        assert_eq!(press(&c, &m, KeyCode::Right), Some(Message::PageRequested(2)));
        assert_eq!(press(&c, &m, KeyCode::End), Some(Message::PageRequested(3)));

        m.update(Some(Message::PageRequested(3))).unwrap();
        assert_eq!(press(&c, &m, KeyCode::Char('n')), None);
        assert_eq!(press(&c, &m, KeyCode::PageUp), Some(Message::PageRequested(2)));
        assert_eq!(press(&c, &m, KeyCode::Home), Some(Message::PageRequested(1)));
    }

    #[test]
    fn no_pages_no_paging() {
        let c = Controller::new(&DirectoryConfig::default());
        let m = model_with(0);
        assert_eq!(m.query(), &Query::default());
        for code in [KeyCode::Right, KeyCode::Left, KeyCode::Home, KeyCode::End] {
            assert_eq!(press(&c, &m, code), None);
        }
    }

    #[test]
    fn search_mode_forwards_raw_keys() {
        let c = Controller::new(&DirectoryConfig::default());
        let mut m = model_with(20);
        m.update(Some(Message::FocusSearch)).unwrap();
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(c.handle_key(&m, key), Some(Message::RawKey(key)));
    }

    #[test]
    fn picker_mode_keys() {
        let c = Controller::new(&DirectoryConfig::default());
        let mut m = model_with(20);
        m.update(Some(Message::OpenIndustryPicker)).unwrap();
        assert_eq!(press(&c, &m, KeyCode::Down), Some(Message::PickerDown));
        assert_eq!(press(&c, &m, KeyCode::Up), Some(Message::PickerUp));
        assert_eq!(press(&c, &m, KeyCode::Enter), Some(Message::Enter));
        assert_eq!(press(&c, &m, KeyCode::Esc), Some(Message::Exit));
    }

    #[test]
    fn ctrl_c_always_quits() {
        let c = Controller::new(&DirectoryConfig::default());
        let mut m = model_with(20);
        m.update(Some(Message::FocusSearch)).unwrap();
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(c.handle_key(&m, key), Some(Message::Quit));
    }
}
