//! Dispatch semantics of the event bus
//!
//! Ordering, failure isolation and re-entrant publishing.

use pocket_core::{Event, EventFilter, EventKind, InputMode, ManualClock};
use pocket_events::{EventBus, Subscriber};
use std::cell::RefCell;
use std::rc::Rc;

// ===== Test Helpers =====

type Log = Rc<RefCell<Vec<String>>>;

fn new_bus() -> EventBus {
    EventBus::new(Rc::new(ManualClock::new(0)))
}

fn recorder(bus: &EventBus, log: &Log, label: &'static str, filter: EventFilter) {
    let log = log.clone();
    bus.subscribe_fn(filter, move |event| {
        log.borrow_mut().push(format!("{label}:{:?}", event.kind));
        Ok(())
    });
}

struct Failing;

impl Subscriber for Failing {
    fn handle(&self, _event: &Event) -> anyhow::Result<()> {
        anyhow::bail!("renderer offline")
    }

    fn name(&self) -> &str {
        "failing"
    }
}

struct Panicking;

impl Subscriber for Panicking {
    fn handle(&self, _event: &Event) -> anyhow::Result<()> {
        panic!("subscriber bug");
    }
}

// ===== Tests =====

#[test]
fn test_delivery_follows_registration_order() {
    let bus = new_bus();
    let log = Log::default();

    recorder(&bus, &log, "first", EventFilter::all());
    recorder(&bus, &log, "second", EventFilter::all());
    recorder(&bus, &log, "third", EventFilter::all());

    bus.emit(EventKind::ButtonPress);

    assert_eq!(
        *log.borrow(),
        vec![
            "first:ButtonPress",
            "second:ButtonPress",
            "third:ButtonPress"
        ]
    );
}

#[test]
fn test_filter_limits_delivery() {
    let bus = new_bus();
    let log = Log::default();

    recorder(&bus, &log, "buttons", EventFilter::BUTTONS);
    recorder(&bus, &log, "screen", EventFilter::SCREEN);

    bus.emit(EventKind::ButtonDoubleTap);
    bus.emit(EventKind::ScreenSleep);
    bus.emit(EventKind::PeriodicTick { elapsed_ms: 1000 });

    assert_eq!(
        *log.borrow(),
        vec!["buttons:ButtonDoubleTap", "screen:ScreenSleep"]
    );
}

#[test]
fn test_failing_subscriber_does_not_block_later_ones() {
    let bus = new_bus();
    let log = Log::default();

    bus.subscribe(EventFilter::all(), Rc::new(Failing));
    recorder(&bus, &log, "after-error", EventFilter::all());

    bus.emit(EventKind::PlaybackPaused);

    assert_eq!(*log.borrow(), vec!["after-error:PlaybackPaused"]);
}

#[test]
fn test_panicking_subscriber_does_not_block_later_ones() {
    let bus = new_bus();
    let log = Log::default();

    bus.subscribe(EventFilter::all(), Rc::new(Panicking));
    recorder(&bus, &log, "after-panic", EventFilter::all());

    bus.emit(EventKind::ScreenWake);
    // Still usable afterwards
    bus.emit(EventKind::ScreenSleep);

    assert_eq!(
        *log.borrow(),
        vec!["after-panic:ScreenWake", "after-panic:ScreenSleep"]
    );
}

#[test]
fn test_nested_publish_completes_before_outer_returns() {
    let bus = new_bus();
    let log = Log::default();

    // First subscriber turns a wake into a tick
    let inner_bus = bus.clone();
    let inner_log = log.clone();
    bus.subscribe_fn(EventFilter::SCREEN_WAKE, move |_| {
        inner_log.borrow_mut().push("wake-handler:start".to_string());
        inner_bus.emit(EventKind::PeriodicTick { elapsed_ms: 0 });
        inner_log.borrow_mut().push("wake-handler:end".to_string());
        Ok(())
    });
    recorder(&bus, &log, "observer", EventFilter::all());

    bus.emit(EventKind::ScreenWake);
    log.borrow_mut().push("outer:returned".to_string());

    assert_eq!(
        *log.borrow(),
        vec![
            "wake-handler:start",
            "observer:PeriodicTick { elapsed_ms: 0 }",
            "wake-handler:end",
            "observer:ScreenWake",
            "outer:returned",
        ]
    );
}

#[test]
fn test_subscribe_during_dispatch_applies_to_next_publish() {
    let bus = new_bus();
    let log = Log::default();

    let handle = bus.clone();
    let late_log = log.clone();
    bus.subscribe_fn(EventFilter::BUTTON_PRESS, move |_| {
        if handle.subscriber_count() == 1 {
            let log = late_log.clone();
            handle.subscribe_fn(EventFilter::BUTTON_PRESS, move |_| {
                log.borrow_mut().push("late".to_string());
                Ok(())
            });
        }
        Ok(())
    });

    bus.emit(EventKind::ButtonPress);
    assert!(log.borrow().is_empty());

    bus.emit(EventKind::ButtonPress);
    assert_eq!(*log.borrow(), vec!["late"]);
}

#[test]
fn test_publish_records_event_mode() {
    let bus = new_bus();
    assert_eq!(bus.mode(), InputMode::ScreenOff);

    bus.publish(&Event::new(EventKind::ScreenWake, 10, InputMode::ScreenOn));
    assert_eq!(bus.mode(), InputMode::ScreenOn);
}
