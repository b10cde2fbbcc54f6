use std::io::{self, IsTerminal, Write};

use crossterm::style::{Color, Stylize};
use tail_stream::{DecodedLine, ScrollBehavior, StyleHint, Surface, ViewState};
use tracing::warn;

/// Line-oriented surface for pipes and dumb terminals: every row is written
/// as it arrives and the view is always at the bottom.
pub struct PlainSurface {
    out: Box<dyn Write>,
    color: bool,
    rows: usize,
}

impl PlainSurface {
    pub fn stdout() -> Self {
        let color = io::stdout().is_terminal();
        Self::new(Box::new(io::stdout()), color)
    }

    pub fn new(out: Box<dyn Write>, color: bool) -> Self {
        Self {
            out,
            color,
            rows: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn format(&self, line: &DecodedLine) -> String {
        match (self.color, line.style_hint) {
            (true, Some(hint)) => line.text.as_str().with(hint_color(hint)).to_string(),
            _ => line.text.clone(),
        }
    }
}

pub(crate) fn hint_color(hint: StyleHint) -> Color {
    match hint {
        StyleHint::Error => Color::Red,
        StyleHint::Success => Color::Green,
    }
}

impl Surface for PlainSurface {
    type RowRef = usize;

    fn view_state(&self) -> ViewState {
        ViewState {
            scroll_height: self.rows as f64,
            scroll_top: self.rows as f64,
            client_height: 0.0,
        }
    }

    fn append(&mut self, line: DecodedLine) -> usize {
        let text = self.format(&line);
        if let Err(err) = writeln!(self.out, "{text}").and_then(|_| self.out.flush()) {
            warn!(target: "tail.render", error = %err, "failed to write row");
        }
        self.rows += 1;
        self.rows - 1
    }

    fn scroll_into_view(&mut self, _row: &usize, _behavior: ScrollBehavior) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use tail_stream::Renderer;

    #[derive(Clone, Default)]
    struct Capture(Rc<RefCell<Vec<u8>>>);

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writes_rows_in_order_without_color() {
        let capture = Capture::default();
        let surface = PlainSurface::new(Box::new(capture.clone()), false);
        let mut renderer = Renderer::new(surface, 50.0);
        renderer.render(DecodedLine::success("connected!"));
        renderer.render(DecodedLine::plain("message: a b"));
        let written = String::from_utf8(capture.0.borrow().clone()).expect("utf8");
        assert_eq!(written, "connected!\nmessage: a b\n");
        assert_eq!(renderer.surface().rows(), 2);
    }

    #[test]
    fn styled_rows_keep_their_text() {
        // NO_COLOR may strip the escapes, so only the text is checked.
        let capture = Capture::default();
        let mut surface = PlainSurface::new(Box::new(capture.clone()), true);
        assert_eq!(surface.append(DecodedLine::error("error: disconnected (OPEN)")), 0);
        let written = String::from_utf8(capture.0.borrow().clone()).expect("utf8");
        assert!(written.contains("error: disconnected (OPEN)"));
        assert!(written.ends_with('\n'));
    }
}
