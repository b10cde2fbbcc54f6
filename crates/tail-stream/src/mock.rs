//! In-memory transport and surface doubles for exercising the controller
//! without a network or a screen.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::controller::{Subscription, Transport};
use crate::event::{ConnectionState, DecodedLine};
use crate::render::{ScrollBehavior, Surface, SurfaceHost, ViewState};

#[derive(Debug, Default)]
struct TransportLog {
    opened: Vec<String>,
    states: Vec<Rc<RefCell<ConnectionState>>>,
}

/// Records every subscription it opens; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    log: Rc<RefCell<TransportLog>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<String> {
        self.log.borrow().opened.clone()
    }

    pub fn closed_count(&self) -> usize {
        self.count_in(ConnectionState::Closed)
    }

    pub fn open_count(&self) -> usize {
        self.log.borrow().states.len() - self.closed_count()
    }

    /// Forces the reported state of the most recent subscription.
    pub fn set_state(&self, state: ConnectionState) {
        if let Some(current) = self.log.borrow().states.last() {
            *current.borrow_mut() = state;
        }
    }

    fn count_in(&self, state: ConnectionState) -> usize {
        self.log
            .borrow()
            .states
            .iter()
            .filter(|current| *current.borrow() == state)
            .count()
    }
}

impl Transport for MockTransport {
    type Subscription = MockSubscription;

    fn subscribe(&mut self, url: &str) -> MockSubscription {
        let state = Rc::new(RefCell::new(ConnectionState::Connecting));
        let mut log = self.log.borrow_mut();
        log.opened.push(url.to_string());
        log.states.push(state.clone());
        MockSubscription { state }
    }
}

#[derive(Debug)]
pub struct MockSubscription {
    state: Rc<RefCell<ConnectionState>>,
}

impl Subscription for MockSubscription {
    fn ready_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    fn close(&mut self) {
        *self.state.borrow_mut() = ConnectionState::Closed;
    }
}

/// Surface that grows by a fixed row height and records scroll requests.
#[derive(Debug, Clone)]
pub struct MockSurface {
    view: ViewState,
    row_height: f64,
    lines: Vec<DecodedLine>,
    scrolled: Vec<usize>,
    last_behavior: Option<ScrollBehavior>,
}

impl MockSurface {
    pub fn with_view(view: ViewState) -> Self {
        Self {
            view,
            row_height: 20.0,
            lines: Vec::new(),
            scrolled: Vec::new(),
            last_behavior: None,
        }
    }

    pub fn set_row_height(&mut self, height: f64) {
        self.row_height = height;
    }

    pub fn set_scroll_top(&mut self, top: f64) {
        self.view.scroll_top = top;
    }

    pub fn lines(&self) -> &[DecodedLine] {
        &self.lines
    }

    pub fn scrolled_rows(&self) -> &[usize] {
        &self.scrolled
    }

    pub fn last_behavior(&self) -> Option<ScrollBehavior> {
        self.last_behavior
    }
}

impl Surface for MockSurface {
    type RowRef = usize;

    fn view_state(&self) -> ViewState {
        self.view
    }

    fn append(&mut self, line: DecodedLine) -> usize {
        self.lines.push(line);
        self.view.scroll_height += self.row_height;
        self.lines.len() - 1
    }

    fn scroll_into_view(&mut self, row: &usize, behavior: ScrollBehavior) {
        self.view.scroll_top = (self.view.scroll_height - self.view.client_height).max(0.0);
        self.scrolled.push(*row);
        self.last_behavior = Some(behavior);
    }
}

/// Id-addressed set of [`MockSurface`]s; clones share the same surfaces.
#[derive(Debug, Clone, Default)]
pub struct MockHost {
    surfaces: Rc<RefCell<HashMap<String, Rc<RefCell<MockSurface>>>>>,
}

impl MockHost {
    pub fn with_surface(id: &str, view: ViewState) -> Self {
        let host = Self::default();
        host.insert(id, MockSurface::with_view(view));
        host
    }

    pub fn insert(&self, id: &str, surface: MockSurface) {
        self.surfaces
            .borrow_mut()
            .insert(id.to_string(), Rc::new(RefCell::new(surface)));
    }

    pub fn surface(&self, id: &str) -> Option<Rc<RefCell<MockSurface>>> {
        self.surfaces.borrow().get(id).cloned()
    }

    pub fn lines(&self, id: &str) -> Vec<DecodedLine> {
        self.surface(id)
            .map(|surface| surface.borrow().lines().to_vec())
            .unwrap_or_default()
    }
}

impl SurfaceHost for MockHost {
    type Surface = Rc<RefCell<MockSurface>>;

    fn locate(&self, id: &str) -> Option<Self::Surface> {
        self.surface(id)
    }
}
