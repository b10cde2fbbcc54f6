use tail_stream::{DecodedLine, ScrollBehavior, Surface, ViewState};

/// Scrollable list of rows measured in terminal lines.
#[derive(Debug, Clone, Default)]
pub struct LogView {
    rows: Vec<DecodedLine>,
    scroll_top: usize,
    viewport_height: usize,
}

impl LogView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows(&self) -> &[DecodedLine] {
        &self.rows
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn viewport_height(&self) -> usize {
        self.viewport_height
    }

    /// Resizes the viewport, keeping the bottom pinned if it already was.
    pub fn set_viewport_height(&mut self, height: usize) {
        let pinned = self.is_at_bottom();
        self.viewport_height = height;
        if pinned {
            self.scroll_to_bottom();
        } else {
            self.scroll_top = self.scroll_top.min(self.max_scroll());
        }
    }

    pub fn visible(&self) -> &[DecodedLine] {
        let start = self.scroll_top.min(self.rows.len());
        let end = (start + self.viewport_height).min(self.rows.len());
        &self.rows[start..end]
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_top >= self.max_scroll()
    }

    pub fn scroll_lines(&mut self, delta: isize) {
        if delta.is_negative() {
            self.scroll_top = self.scroll_top.saturating_sub(delta.unsigned_abs());
        } else {
            self.scroll_top = (self.scroll_top + delta as usize).min(self.max_scroll());
        }
    }

    pub fn scroll_pages(&mut self, delta_pages: isize) {
        let page = self.viewport_height.max(1) as isize;
        self.scroll_lines(delta_pages * page);
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_top = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_top = self.max_scroll();
    }

    fn max_scroll(&self) -> usize {
        self.rows.len().saturating_sub(self.viewport_height)
    }
}

impl Surface for LogView {
    type RowRef = usize;

    fn view_state(&self) -> ViewState {
        ViewState {
            scroll_height: self.rows.len() as f64,
            scroll_top: self.scroll_top as f64,
            client_height: self.viewport_height as f64,
        }
    }

    fn append(&mut self, line: DecodedLine) -> usize {
        self.rows.push(line);
        self.rows.len() - 1
    }

    // Terminals have no animation; smooth and instant both jump.
    fn scroll_into_view(&mut self, row: &usize, _behavior: ScrollBehavior) {
        let viewport = self.viewport_height.max(1);
        if *row < self.scroll_top {
            self.scroll_top = *row;
        } else if *row >= self.scroll_top + viewport {
            self.scroll_top = (*row + 1 - viewport).min(self.max_scroll());
        }
    }
}
