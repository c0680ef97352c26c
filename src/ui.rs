use ratatui::{
    Frame,
    buffer::Buffer,
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::border,
    text::{Line, Span, Text},
    widgets::{Block, Clear, List, ListItem, ListState, Paragraph, Widget, Wrap},
};

use crate::company::{Company, SortOrder};
use crate::domain::{ALL_INDUSTRIES, ALL_LOCATIONS, Facet};
use crate::model::{LoadState, Picker, UIData};

pub const FILTERBAR_HEIGHT: u16 = 3;
pub const PAGER_HEIGHT: u16 = 1;
pub const STATUSLINE_HEIGHT: u16 = 1;
pub const GRID_COLUMNS: usize = 3;
pub const SKELETON_CARDS: usize = 6;

const EMPTY_MESSAGE: &str = "No companies found matching your criteria.";

#[derive(Debug, Default)]
pub struct DirectoryUI {}

impl DirectoryUI {
    pub fn new() -> Self {
        Self {}
    }

    pub fn draw(&mut self, uidata: &UIData, frame: &mut Frame) {
        let title = Line::from(" Companies Directory ".bold());
        let instructions = Line::from(vec![
            " Search ".into(),
            "</>".blue().bold(),
            " Industry ".into(),
            "<I>".blue().bold(),
            " Location ".into(),
            "<L>".blue().bold(),
            " Sort ".into(),
            "<S>".blue().bold(),
            " Reset ".into(),
            "<R>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);
        let inner = block.inner(frame.area());
        frame.render_widget(block, frame.area());

        let [filterbar, results, pager, statusline] = Layout::vertical([
            Constraint::Length(FILTERBAR_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(PAGER_HEIGHT),
            Constraint::Length(STATUSLINE_HEIGHT),
        ])
        .areas(inner);

        self.draw_filterbar(uidata, filterbar, frame);
        self.draw_results(uidata, results, frame.buffer_mut());
        if uidata.load_state == LoadState::Ready && uidata.total_pages > 1 {
            PagerView { uidata }.render(pager, frame.buffer_mut());
        }
        Paragraph::new(Line::from(uidata.status_message.as_str().dark_gray()))
            .render(statusline, frame.buffer_mut());

        if let Some(picker) = &uidata.picker {
            Self::draw_picker(picker, frame);
        }
        if uidata.show_popup {
            Self::draw_popup(&uidata.popup_message, frame);
        }
    }

    fn draw_filterbar(&self, uidata: &UIData, area: Rect, frame: &mut Frame) {
        let [search, industry, location, sort] = Layout::horizontal([
            Constraint::Percentage(34),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
            Constraint::Percentage(22),
        ])
        .areas(area);
        let query = &uidata.query;

        let editing = uidata.search_input.as_ref();
        let search_block = Block::bordered()
            .title(" Company Name ")
            .border_style(if editing.is_some() {
                Style::new().yellow()
            } else {
                Style::new()
            });
        let search_text = match editing {
            Some(input) => Line::from(input.input.as_str()),
            None if query.search_term.is_empty() => Line::from("Search by name...".dark_gray()),
            None => Line::from(query.search_term.as_str()),
        };
        if let Some(input) = editing {
            frame.set_cursor_position(input_cursor(search, input.curser_pos));
        }
        frame.render_widget(Paragraph::new(search_text).block(search_block), search);

        let facet = |title: &'static str, value: &str, sentinel: &'static str| {
            let shown = if value.is_empty() { sentinel } else { value };
            Paragraph::new(format!("{shown} ▾")).block(Block::bordered().title(title))
        };
        frame.render_widget(
            facet(" Industry ", &query.industry, ALL_INDUSTRIES),
            industry,
        );
        frame.render_widget(
            facet(" Location ", &query.location, ALL_LOCATIONS),
            location,
        );

        let arrow = match query.sort_order {
            SortOrder::Ascending => "↑",
            SortOrder::Descending => "↓",
        };
        let sort_line = Line::from(vec![
            format!("{arrow} Sort {} ", query.sort_order.label()).bold(),
            " Reset".into(),
        ]);
        frame.render_widget(
            Paragraph::new(sort_line).block(Block::bordered().title(" Order ")),
            sort,
        );
    }

    fn draw_results(&self, uidata: &UIData, area: Rect, buf: &mut Buffer) {
        match &uidata.load_state {
            LoadState::Loading => {
                for (idx, cell) in grid_cells(area, SKELETON_CARDS).into_iter().enumerate() {
                    SkeletonCard { idx }.render(cell, buf);
                }
            }
            LoadState::Error(message) => {
                Paragraph::new(Line::from(message.as_str().red().bold()).centered())
                    .render(centered_line(area), buf);
            }
            LoadState::Ready if uidata.page.is_empty() => {
                Paragraph::new(Line::from(EMPTY_MESSAGE.dark_gray()).centered())
                    .render(centered_line(area), buf);
            }
            LoadState::Ready => {
                let cells = grid_cells(area, uidata.page.len());
                for (idx, (company, cell)) in uidata.page.iter().zip(cells).enumerate() {
                    CompanyCard {
                        company,
                        selected: idx == uidata.selected,
                    }
                    .render(cell, buf);
                }
            }
        }
    }

    fn draw_picker(picker: &Picker, frame: &mut Frame) {
        let title = match picker.facet {
            Facet::Industry => " Industry ",
            Facet::Location => " Location ",
        };
        let width = picker
            .options
            .iter()
            .map(|o| o.chars().count())
            .max()
            .unwrap_or(0)
            .max(title.len()) as u16
            + 6;
        let height = picker.options.len() as u16 + 2;
        let area = popup_area(frame.area(), width, height);

        let items: Vec<ListItem> = picker
            .options
            .iter()
            .map(|o| ListItem::new(o.as_str()))
            .collect();
        let list = List::new(items)
            .block(Block::bordered().title(title).border_set(border::ROUNDED))
            .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .highlight_symbol("› ");
        let mut state = ListState::default().with_selected(Some(picker.selected));
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_popup(message: &str, frame: &mut Frame) {
        let text = Text::from(message);
        let width = text.width() as u16 + 4;
        let height = text.height() as u16 + 2;
        let area = popup_area(frame.area(), width, height);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(text).block(
                Block::bordered()
                    .title(" Help ".bold())
                    .border_set(border::ROUNDED),
            ),
            area,
        );
    }
}

// Split `area` into a grid of GRID_COLUMNS columns with room for `count` cards
fn grid_cells(area: Rect, count: usize) -> Vec<Rect> {
    let nrows = count.div_ceil(GRID_COLUMNS).max(1);
    let rows = Layout::vertical(vec![Constraint::Ratio(1, nrows as u32); nrows]).split(area);
    rows.iter()
        .flat_map(|row| {
            Layout::horizontal([Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
                .spacing(1)
                .split(*row)
                .to_vec()
        })
        .take(count)
        .collect()
}

/// Cursor cell inside a bordered one-line input, kept left of the right border.
fn input_cursor(area: Rect, curser_pos: usize) -> (u16, u16) {
    let offset = u16::try_from(curser_pos).unwrap_or(u16::MAX);
    let x = area.x.saturating_add(1).saturating_add(offset);
    (x.min(area.right().saturating_sub(2)), area.y.saturating_add(1))
}

fn centered_line(area: Rect) -> Rect {
    let [line] = Layout::vertical([Constraint::Length(1)])
        .flex(Flex::Center)
        .areas(area);
    line
}

fn popup_area(area: Rect, width: u16, height: u16) -> Rect {
    let [area] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(area);
    area
}

struct CompanyCard<'a> {
    company: &'a Company,
    selected: bool,
}

impl Widget for CompanyCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title(Line::from(self.company.name.as_str().bold()))
            .title_bottom(Line::from(vec![
                " ⌖ ".into(),
                self.company.location.as_str().bold(),
                " ".into(),
            ]))
            .border_set(if self.selected {
                border::THICK
            } else {
                border::ROUNDED
            })
            .border_style(if self.selected {
                Style::new().fg(Color::Cyan)
            } else {
                Style::new()
            });

        let text = Text::from(vec![
            Line::from(vec!["▪ ".into(), self.company.industry.as_str().italic()]),
            Line::from(""),
            Line::from(self.company.description.as_str()),
        ]);
        Paragraph::new(text)
            .wrap(Wrap { trim: true })
            .block(block)
            .render(area, buf);
    }
}

struct SkeletonCard {
    idx: usize,
}

impl Widget for SkeletonCard {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner_width = area.width.saturating_sub(2) as usize;
        // Shapes from wide to narrow, shifted per card so the grid does not look stamped.
        let bar = |percent: usize| {
            let len = inner_width * percent / 100;
            Line::from(Span::styled("░".repeat(len), Style::new().dark_gray()))
        };
        let shift = (self.idx % 3) * 5;
        let text = Text::from(vec![
            bar(75 - shift),
            bar(50),
            Line::from(""),
            bar(100),
            bar(100),
            bar(83 - shift),
        ]);
        Paragraph::new(text)
            .block(
                Block::bordered()
                    .border_set(border::ROUNDED)
                    .border_style(Style::new().dark_gray()),
            )
            .render(area, buf);
    }
}

struct PagerView<'a> {
    uidata: &'a UIData,
}

impl Widget for PagerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let current = self.uidata.query.current_page;
        let total = self.uidata.total_pages;

        let prev = if current > 1 {
            "‹ Prev".bold()
        } else {
            "‹ Prev".dark_gray()
        };
        let next = if current < total {
            "Next ›".bold()
        } else {
            "Next ›".dark_gray()
        };
        let mut spans = vec![prev, "  ".into()];
        for page in 1..=total {
            if page == current {
                spans.push(format!("[{page}]").reversed());
            } else {
                spans.push(format!(" {page} ").into());
            }
            spans.push(" ".into());
        }
        spans.push(" ".into());
        spans.push(next);
        Paragraph::new(Line::from(spans).centered()).render(area, buf);
    }
}
