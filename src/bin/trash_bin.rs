//! `trash-bin`: an interactive terminal browser over the trash, fulfilling
//! the project's "Trash Bin" TUI mentioned by the `trash` binary's help
//! text. A list view, not a desktop-shell integration.

use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Terminal;

use libtrash::{Trashcan, TrashOptions, TrashedItem};

fn main() -> io::Result<()> {
    env_logger::init();

    let trashcan = match Trashcan::new(TrashOptions::default()) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("trash-bin: cannot open trash: {e}");
            std::process::exit(1);
        }
    };

    let mut items: Vec<TrashedItem> = trashcan.by_item().collect();
    items.sort_by(|a, b| b.deletion_date.cmp(&a.deletion_date));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut state = ListState::default();
    if !items.is_empty() {
        state.select(Some(0));
    }
    let mut status = String::new();

    let result = run(&mut terminal, &trashcan, &mut items, &mut state, &mut status);

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    trashcan: &Trashcan,
    items: &mut Vec<TrashedItem>,
    state: &mut ListState,
    status: &mut String,
) -> io::Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, items, state, status))?;

        if !event::poll(std::time::Duration::from_millis(200))? {
            continue;
        }

        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Down | KeyCode::Char('j') => select_next(state, items.len()),
            KeyCode::Up | KeyCode::Char('k') => select_prev(state, items.len()),
            KeyCode::Char('r') => {
                if let Some(i) = state.selected() {
                    if i < items.len() {
                        match trashcan.restore(&items[i]) {
                            Ok(()) => {
                                *status = format!("restored {}", items[i].restore_path.display());
                                items.remove(i);
                                clamp_selection(state, items.len());
                            }
                            Err(e) => *status = format!("restore failed: {e}"),
                        }
                    }
                }
            }
            KeyCode::Char('d') => {
                if let Some(i) = state.selected() {
                    if i < items.len() {
                        match trashcan.erase(&items[i]) {
                            Ok(()) => {
                                *status = format!("erased {}", items[i].restore_path.display());
                                items.remove(i);
                                clamp_selection(state, items.len());
                            }
                            Err(e) => *status = format!("erase failed: {e}"),
                        }
                    }
                }
            }
            _ => {}
        }
    }
}

fn select_next(state: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let next = state.selected().map(|i| (i + 1).min(len - 1)).unwrap_or(0);
    state.select(Some(next));
}

fn select_prev(state: &mut ListState, len: usize) {
    if len == 0 {
        return;
    }
    let prev = state.selected().map(|i| i.saturating_sub(1)).unwrap_or(0);
    state.select(Some(prev));
}

fn clamp_selection(state: &mut ListState, len: usize) {
    if len == 0 {
        state.select(None);
    } else if let Some(i) = state.selected() {
        state.select(Some(i.min(len - 1)));
    }
}

fn draw(frame: &mut ratatui::Frame, items: &[TrashedItem], state: &mut ListState, status: &str) {
    let layout = Layout::vertical([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)]).split(frame.area());

    let rows: Vec<ListItem> = items
        .iter()
        .map(|item| {
            let kind = if item.is_dir { "dir " } else { "file" };
            let when = item.deletion_date.map(|d| d.to_string()).unwrap_or_else(|| "unknown".to_string());
            ListItem::new(Line::from(vec![
                Span::styled(format!("{kind}  "), Style::default().fg(Color::DarkGray)),
                Span::styled(when, Style::default().fg(Color::DarkGray)),
                Span::raw("  "),
                Span::raw(item.restore_path.to_string_lossy().into_owned()),
            ]))
        })
        .collect();

    let list = List::new(rows)
        .block(Block::default().borders(Borders::ALL).title("trash-bin"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, layout[0], state);

    let help = Paragraph::new("j/k or arrows: move  r: restore  d: erase  q: quit");
    frame.render_widget(help, layout[1]);

    let status_line = Paragraph::new(status).style(Style::default().fg(Color::Yellow));
    frame.render_widget(status_line, layout[2]);
}
