use std::io::{self, Stdout};

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::{Frame, Terminal};
use tail_stream::StyleHint;
use tracing::warn;

use super::LogView;

pub type Screen = Terminal<CrosstermBackend<Stdout>>;

/// Raw-mode alternate screen, restored on drop.
pub struct TerminalGuard {
    terminal: Screen,
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;
        Ok(Self { terminal })
    }

    pub fn terminal(&mut self) -> &mut Screen {
        &mut self.terminal
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let restored = disable_raw_mode()
            .and_then(|_| execute!(self.terminal.backend_mut(), LeaveAlternateScreen))
            .and_then(|_| self.terminal.show_cursor());
        if let Err(err) = restored {
            warn!(target: "tail.render", error = %err, "failed to restore terminal");
        }
    }
}

/// What the status bar shows besides the scroll position.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    pub endpoint: String,
    pub connection: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Lines(isize),
    Pages(isize),
    Top,
    Bottom,
}

pub fn key_action(key: KeyEvent) -> Option<KeyAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let action = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
        KeyCode::Up | KeyCode::Char('k') => KeyAction::Lines(-1),
        KeyCode::Down | KeyCode::Char('j') => KeyAction::Lines(1),
        KeyCode::PageUp => KeyAction::Pages(-1),
        KeyCode::PageDown | KeyCode::Char(' ') => KeyAction::Pages(1),
        KeyCode::Home | KeyCode::Char('g') => KeyAction::Top,
        KeyCode::End | KeyCode::Char('G') => KeyAction::Bottom,
        _ => return None,
    };
    Some(action)
}

/// Applies a scroll action. Returns `false` for [`KeyAction::Quit`].
pub fn apply(view: &mut LogView, action: KeyAction) -> bool {
    match action {
        KeyAction::Quit => return false,
        KeyAction::Lines(delta) => view.scroll_lines(delta),
        KeyAction::Pages(delta) => view.scroll_pages(delta),
        KeyAction::Top => view.scroll_to_top(),
        KeyAction::Bottom => view.scroll_to_bottom(),
    }
    true
}

/// Sizes the view's viewport for `area` (border and status bar excluded).
pub fn fit(view: &mut LogView, area: Rect) {
    let [body, _] = split(area);
    view.set_viewport_height(body.height.saturating_sub(2) as usize);
}

pub fn draw(frame: &mut Frame, view: &LogView, status: &StatusLine) {
    let [body, bar] = split(frame.area());

    let lines: Vec<Line> = view
        .visible()
        .iter()
        .map(|row| Line::styled(row.text.as_str(), hint_style(row.style_hint)))
        .collect();
    let block = Block::bordered().title(format!(" {} ", status.endpoint));
    frame.render_widget(Paragraph::new(lines).block(block), body);

    let position = if view.is_at_bottom() {
        Span::styled("following", Style::default().fg(Color::Green))
    } else {
        Span::styled("paused", Style::default().fg(Color::Yellow))
    };
    let bar_line = Line::from(vec![
        Span::styled(
            format!(" {} ", status.connection),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("| {} rows | ", view.rows().len())),
        position,
        Span::raw(" | q quit, arrows/PgUp/PgDn scroll, End follow"),
    ]);
    frame.render_widget(Paragraph::new(bar_line), bar);
}

fn split(area: Rect) -> [Rect; 2] {
    let chunks = Layout::vertical([Constraint::Min(1), Constraint::Length(1)]).split(area);
    [chunks[0], chunks[1]]
}

fn hint_style(hint: Option<StyleHint>) -> Style {
    match hint {
        Some(StyleHint::Error) => Style::default().fg(Color::Red),
        Some(StyleHint::Success) => Style::default().fg(Color::Green),
        None => Style::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use tail_stream::{DecodedLine, Surface};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn maps_navigation_keys() {
        assert_eq!(key_action(key(KeyCode::Char('q'))), Some(KeyAction::Quit));
        assert_eq!(key_action(key(KeyCode::Up)), Some(KeyAction::Lines(-1)));
        assert_eq!(key_action(key(KeyCode::PageDown)), Some(KeyAction::Pages(1)));
        assert_eq!(key_action(key(KeyCode::End)), Some(KeyAction::Bottom));
        assert_eq!(
            key_action(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(KeyAction::Quit)
        );
        assert_eq!(key_action(key(KeyCode::Char('x'))), None);
    }

    #[test]
    fn draws_rows_and_status() {
        let mut view = LogView::new();
        fit(&mut view, Rect::new(0, 0, 40, 8));
        assert_eq!(view.viewport_height(), 5);
        view.append(DecodedLine::success("connected!"));
        view.append(DecodedLine::plain("message: a b"));

        let mut terminal = Terminal::new(TestBackend::new(40, 8)).expect("terminal");
        let status = StatusLine {
            endpoint: "/events".into(),
            connection: "OPEN".into(),
        };
        terminal
            .draw(|frame| draw(frame, &view, &status))
            .expect("draw");

        let buffer = terminal.backend().buffer();
        let row = |y: u16| -> String {
            (0..buffer.area.width)
                .map(|x| buffer[(x, y)].symbol().to_string())
                .collect()
        };
        assert!(row(1).contains("connected!"));
        assert!(row(2).contains("message: a b"));
        assert!(row(7).contains("following"));
        assert_eq!(buffer[(1, 1)].fg, Color::Green);
    }

    #[test]
    fn apply_scrolls_view() {
        let mut view = LogView::new();
        view.set_viewport_height(2);
        for idx in 0..6 {
            view.append(DecodedLine::plain(format!("row {idx}")));
        }
        assert!(apply(&mut view, KeyAction::Bottom));
        assert_eq!(view.scroll_top(), 4);
        assert!(apply(&mut view, KeyAction::Lines(-3)));
        assert_eq!(view.scroll_top(), 1);
        assert!(!apply(&mut view, KeyAction::Quit));
    }
}
