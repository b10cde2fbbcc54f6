use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::event::DecodedLine;

/// Scroll metrics of a surface, in the surface's native length unit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewState {
    pub scroll_height: f64,
    pub scroll_top: f64,
    pub client_height: f64,
}

impl ViewState {
    /// Unseen trailing content; negative when scrolled past the end.
    pub fn distance_from_bottom(&self) -> f64 {
        self.scroll_height - self.scroll_top - self.client_height
    }

    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.distance_from_bottom() < threshold
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScrollBehavior {
    #[default]
    Smooth,
    Instant,
}

/// A scrollable container that rows are appended to.
pub trait Surface {
    /// Handle to an appended row, used to scroll it into view.
    type RowRef;

    fn view_state(&self) -> ViewState;
    fn append(&mut self, line: DecodedLine) -> Self::RowRef;
    fn scroll_into_view(&mut self, row: &Self::RowRef, behavior: ScrollBehavior);
}

impl<S: Surface> Surface for Rc<RefCell<S>> {
    type RowRef = S::RowRef;

    fn view_state(&self) -> ViewState {
        self.borrow().view_state()
    }

    fn append(&mut self, line: DecodedLine) -> Self::RowRef {
        self.borrow_mut().append(line)
    }

    fn scroll_into_view(&mut self, row: &Self::RowRef, behavior: ScrollBehavior) {
        self.borrow_mut().scroll_into_view(row, behavior)
    }
}

/// Resolves surfaces by id.
pub trait SurfaceHost {
    type Surface: Surface;

    fn locate(&self, id: &str) -> Option<Self::Surface>;
}

/// Appends lines to a surface and keeps it pinned to the newest row only while
/// the reader is already near the bottom.
pub struct Renderer<S: Surface> {
    surface: S,
    threshold: f64,
}

impl<S: Surface> Renderer<S> {
    pub fn new(surface: S, threshold: f64) -> Self {
        Self { surface, threshold }
    }

    /// Renders one line. Returns `true` when the new row was scrolled into view.
    pub fn render(&mut self, line: DecodedLine) -> bool {
        // Appending grows scroll_height; the decision must use the prior state.
        let before = self.surface.view_state();
        let follow = before.is_near_bottom(self.threshold);
        let row = self.surface.append(line);
        if follow {
            self.surface.scroll_into_view(&row, ScrollBehavior::Smooth);
        }
        trace!(
            target: "tail.render",
            distance = before.distance_from_bottom(),
            threshold = self.threshold,
            follow,
            "appended row"
        );
        follow
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSurface;

    fn surface(scroll_height: f64, scroll_top: f64, client_height: f64) -> MockSurface {
        MockSurface::with_view(ViewState {
            scroll_height,
            scroll_top,
            client_height,
        })
    }

    #[test]
    fn scrolled_past_bottom_follows_new_rows() {
        let mut renderer = Renderer::new(surface(1000.0, 980.0, 50.0), 50.0);
        assert!(renderer.render(DecodedLine::plain("next")));
        let surface = renderer.surface();
        assert_eq!(surface.scrolled_rows(), &[0]);
        assert_eq!(surface.last_behavior(), Some(ScrollBehavior::Smooth));
    }

    #[test]
    fn reader_scrolled_up_is_left_alone() {
        let mut renderer = Renderer::new(surface(1000.0, 500.0, 50.0), 50.0);
        assert!(!renderer.render(DecodedLine::plain("next")));
        let surface = renderer.surface();
        assert!(surface.scrolled_rows().is_empty());
        assert_eq!(surface.view_state().scroll_top, 500.0);
        assert_eq!(surface.lines().len(), 1);
    }

    #[test]
    fn decision_uses_pre_append_metrics() {
        // 40 units from the bottom before the append, 40 + row height after.
        let mut view = surface(1000.0, 910.0, 50.0);
        view.set_row_height(30.0);
        let mut renderer = Renderer::new(view, 50.0);
        assert!(renderer.render(DecodedLine::plain("one")));
        assert_eq!(renderer.surface().scrolled_rows(), &[0]);
    }

    #[test]
    fn following_stops_once_reader_scrolls_away() {
        let mut renderer = Renderer::new(surface(100.0, 50.0, 50.0), 50.0);
        assert!(renderer.render(DecodedLine::plain("one")));
        renderer.surface_mut().set_scroll_top(0.0);
        assert!(!renderer.render(DecodedLine::plain("two")));
        assert_eq!(renderer.surface().scrolled_rows(), &[0]);
        assert_eq!(renderer.surface().view_state().scroll_top, 0.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut renderer = Renderer::new(surface(1000.0, 900.0, 50.0), 50.0);
        assert!(!renderer.render(DecodedLine::plain("edge")));
    }

    #[test]
    fn custom_threshold_applies() {
        let mut renderer = Renderer::new(surface(100.0, 0.0, 10.0), 100.0);
        assert!(renderer.render(DecodedLine::plain("row")));
    }

    #[test]
    fn shared_surface_sees_rows() {
        let shared = Rc::new(RefCell::new(surface(0.0, 0.0, 50.0)));
        let mut renderer = Renderer::new(shared.clone(), 50.0);
        renderer.render(DecodedLine::success("connected!"));
        assert_eq!(shared.borrow().lines()[0].text, "connected!");
    }
}
