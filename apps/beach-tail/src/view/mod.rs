pub mod log_view;
pub mod plain;
pub mod tui;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tail_stream::SurfaceHost;

pub use log_view::LogView;
pub use plain::PlainSurface;

pub type SharedView = Rc<RefCell<LogView>>;

/// Named log panes the controller can bind to.
#[derive(Debug, Default, Clone)]
pub struct Panes {
    panes: HashMap<String, SharedView>,
}

impl Panes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fresh pane under `id`, returning the shared handle.
    pub fn register(&mut self, id: &str) -> SharedView {
        let view = Rc::new(RefCell::new(LogView::new()));
        self.panes.insert(id.to_string(), view.clone());
        view
    }

    pub fn get(&self, id: &str) -> Option<SharedView> {
        self.panes.get(id).cloned()
    }
}

impl SurfaceHost for Panes {
    type Surface = SharedView;

    fn locate(&self, id: &str) -> Option<SharedView> {
        self.get(id)
    }
}

/// Host holding a single surface under one id.
#[derive(Debug)]
pub struct SingleHost<S> {
    id: String,
    surface: S,
}

impl<S> SingleHost<S> {
    pub fn new(id: impl Into<String>, surface: S) -> Self {
        Self {
            id: id.into(),
            surface,
        }
    }
}

impl<S: tail_stream::Surface + Clone> SurfaceHost for SingleHost<S> {
    type Surface = S;

    fn locate(&self, id: &str) -> Option<S> {
        (self.id == id).then(|| self.surface.clone())
    }
}
