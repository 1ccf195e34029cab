//! TUI rendering logic for the movie browser.

use cinedex_api::tmdb::Movie;
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Row, Table, Wrap};

use super::state::{BrowserState, InputMode};
use crate::orchestrator::FetchStatus;

/// Placeholder for absent values.
const NONE_LABEL: &str = "--";

/// Draws the browser UI.
#[allow(clippy::indexing_slicing)]
pub fn draw(frame: &mut Frame, state: &mut BrowserState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // search + status
            Constraint::Length(3), // filters
            Constraint::Min(5),    // main content
            Constraint::Length(3), // footer
        ])
        .split(frame.area());

    draw_header(frame, chunks[0], state);
    draw_filter_bar(frame, chunks[1], state);

    let pane_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);

    let error = match state.orchestrator.status() {
        FetchStatus::Error(message) => Some(message.clone()),
        _ => None,
    };
    if let Some(message) = error {
        draw_error(frame, pane_chunks[0], &message);
    } else {
        draw_movie_list(frame, pane_chunks[0], state);
    }
    draw_movie_detail(frame, pane_chunks[1], state);

    draw_footer(frame, chunks[3], state);
}

/// Draws the search box and the mode/page status.
#[allow(clippy::indexing_slicing)]
fn draw_header(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let search_style = if state.input_mode == InputMode::Search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    let orch = &state.orchestrator;
    let search = Paragraph::new(orch.search_text())
        .style(search_style)
        .block(Block::default().borders(Borders::ALL).title(" Search: / "));
    frame.render_widget(search, header_chunks[0]);

    if state.input_mode == InputMode::Search {
        let width = u16::try_from(orch.search_text().chars().count()).unwrap_or(u16::MAX);
        frame.set_cursor_position((
            header_chunks[0].x.saturating_add(1).saturating_add(width),
            header_chunks[0].y.saturating_add(1),
        ));
    }

    let mut spans = vec![
        Span::styled(
            orch.mode().label(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  Page {} / {}", orch.page(), orch.total_pages())),
    ];
    if orch.is_loading() {
        spans.push(Span::styled(
            "  Loading...",
            Style::default().fg(Color::Yellow),
        ));
    }
    let status = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title(" cinedex "));
    frame.render_widget(status, header_chunks[1]);
}

/// Draws the active filters.
fn draw_filter_bar(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let filters = state.orchestrator.filters();
    let rating = filters
        .min_rating
        .map_or_else(|| String::from("All"), |r| format!("{r}+"));
    let year = if state.input_mode == InputMode::Year {
        format!("{}_", state.year_input)
    } else {
        filters
            .year
            .map_or_else(|| String::from("All"), |y| y.to_string())
    };
    let genre = filters.genre_id.map_or_else(
        || String::from("All"),
        |id| {
            state
                .orchestrator
                .genre_name(id)
                .map_or_else(|| id.to_string(), String::from)
        },
    );

    let label = Style::default().fg(Color::DarkGray);
    let year_style = if state.input_mode == InputMode::Year {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let line = Line::from(vec![
        Span::styled("Rating ", label),
        Span::raw(rating),
        Span::styled("  Year ", label),
        Span::styled(year, year_style),
        Span::styled("  Genre ", label),
        Span::raw(genre),
        Span::styled("  Sort ", label),
        Span::raw(filters.sort.label()),
    ]);

    let bar = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title(" Filters "));
    frame.render_widget(bar, area);
}

/// Draws the movie table (left).
fn draw_movie_list(frame: &mut Frame, area: Rect, state: &mut BrowserState) {
    let header = Row::new(vec!["Title", "Year", "Rating", "Genres"])
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .bottom_margin(1);

    let rows: Vec<Row> = state
        .orchestrator
        .movies()
        .iter()
        .map(|m| {
            Row::new(vec![
                m.title.clone(),
                m.release_year().unwrap_or(NONE_LABEL).to_owned(),
                format!("{:.1}", m.vote_average),
                state.genre_labels(m),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Min(12),
    ];

    let title = format!(" Movies ({}) ", rows.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .row_highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_stateful_widget(table, area, &mut state.table_state);
}

/// Draws the error banner in place of the movie table.
fn draw_error(frame: &mut Frame, area: Rect, message: &str) {
    let banner = Paragraph::new(Line::from(Span::styled(
        message,
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
    )))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Movies ")
            .border_style(Style::default().fg(Color::Red)),
    );
    frame.render_widget(banner, area);
}

/// Draws details of the selected movie (right).
fn draw_movie_detail(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let block = Block::default().borders(Borders::ALL).title(" Details ");
    let Some(movie) = state.selected_movie() else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let detail = Paragraph::new(detail_lines(state, movie))
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(detail, area);
}

/// Builds the detail pane text.
fn detail_lines<'a>(state: &BrowserState, movie: &'a Movie) -> Vec<Line<'a>> {
    let label = Style::default().fg(Color::Yellow);
    let genres = state.genre_labels(movie);
    let mut lines = vec![
        Line::from(Span::styled(
            movie.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Released: ", label),
            Span::raw(movie.release_date.as_deref().unwrap_or(NONE_LABEL)),
        ]),
        Line::from(vec![
            Span::styled("Rating:   ", label),
            Span::raw(format!("{:.1}", movie.vote_average)),
        ]),
        Line::from(vec![
            Span::styled("Genres:   ", label),
            Span::raw(if genres.is_empty() {
                String::from(NONE_LABEL)
            } else {
                genres
            }),
        ]),
    ];
    if let Some(poster) = movie.poster_url() {
        lines.push(Line::from(vec![
            Span::styled("Poster:   ", label),
            Span::raw(poster),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(movie.overview.as_deref().unwrap_or_default()));
    lines
}

/// Draws the footer with key hints.
fn draw_footer(frame: &mut Frame, area: Rect, state: &BrowserState) {
    let help_text = match state.input_mode {
        InputMode::Search => {
            Line::from("Type to search | Enter: search now | Esc: done | Ctrl-U: clear")
        }
        InputMode::Year => Line::from("Type a year | Enter: apply (empty clears) | Esc: cancel"),
        InputMode::Normal => Line::from(vec![Span::raw(
            "/: search  [ ]: rating  y: year  g/G: genre  s: sort  x: reset  \u{2190}\u{2192}/p/n: page  j/k: move  o: open  q: quit",
        )]),
    };

    let footer = Paragraph::new(help_text).block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
