use beach_tail::app::EVENT_PANE;
use beach_tail::view::Panes;
use tail_stream::mock::MockTransport;
use tail_stream::{StartError, StreamConfig, StreamController, StreamEvent};

fn message(data: &str) -> StreamEvent {
    StreamEvent::Message {
        name: None,
        data: data.into(),
    }
}

fn config() -> StreamConfig {
    StreamConfig {
        follow_threshold: 1.0,
        ..StreamConfig::default()
    }
}

#[test_timeout::timeout(5)]
fn pinned_reader_follows_new_rows() {
    let mut panes = Panes::new();
    let view = panes.register(EVENT_PANE);
    view.borrow_mut().set_viewport_height(3);
    let mut controller = StreamController::new(MockTransport::new(), panes);
    controller.start(config()).expect("start");

    controller.dispatch(StreamEvent::Open);
    for idx in 0..10 {
        controller.dispatch(message(&format!("row,{idx}")));
    }

    let view = view.borrow();
    assert!(view.is_at_bottom());
    let visible: Vec<&str> = view.visible().iter().map(|row| row.text.as_str()).collect();
    assert_eq!(visible, ["message: row 7", "message: row 8", "message: row 9"]);
}

#[test_timeout::timeout(5)]
fn scrolled_up_reader_is_not_pulled_down() {
    let mut panes = Panes::new();
    let view = panes.register(EVENT_PANE);
    view.borrow_mut().set_viewport_height(3);
    let mut controller = StreamController::new(MockTransport::new(), panes);
    controller.start(config()).expect("start");

    for idx in 0..10 {
        controller.dispatch(message(&idx.to_string()));
    }
    view.borrow_mut().scroll_to_top();
    for idx in 10..20 {
        controller.dispatch(message(&idx.to_string()));
    }

    let view = view.borrow();
    assert_eq!(view.scroll_top(), 0);
    assert_eq!(view.rows().len(), 20);
    assert_eq!(view.visible()[0].text, "message: 0");
}

#[test_timeout::timeout(5)]
fn unknown_pane_fails_start() {
    let mut panes = Panes::new();
    panes.register(EVENT_PANE);
    let mut controller = StreamController::new(MockTransport::new(), panes);
    let config = StreamConfig {
        target_container_id: "sidebar".into(),
        ..config()
    };
    assert!(matches!(
        controller.start(config),
        Err(StartError::SurfaceNotFound { .. })
    ));
}
