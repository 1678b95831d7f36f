use crate::Subscriber;
use pocket_core::{Clock, Event, EventFilter, EventKind, InputMode, PocketError};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use tracing::{error, trace};

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    handler: Rc<dyn Subscriber>,
}

struct BusInner {
    subscriptions: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
    clock: Rc<dyn Clock>,
    /// Mode carried by the most recently published event
    mode: Cell<InputMode>,
}

/// Synchronous publish/subscribe dispatcher
///
/// Cloning yields another handle to the same bus, so subscribers can keep
/// one to publish follow-up events. The bus is single-threaded by design:
/// the runtime is one cooperative poll loop.
#[derive(Clone)]
pub struct EventBus {
    inner: Rc<BusInner>,
}

impl EventBus {
    /// Create a bus stamping `emit`ted events with `clock`
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            inner: Rc::new(BusInner {
                subscriptions: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
                clock,
                mode: Cell::new(InputMode::default()),
            }),
        }
    }

    /// Non-owning handle for subscribers that publish follow-up events
    pub fn downgrade(&self) -> WeakEventBus {
        WeakEventBus {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Register a handler for every event matching `filter`
    ///
    /// A subscription made while an event is being dispatched takes effect
    /// from the next `publish`.
    pub fn subscribe(&self, filter: EventFilter, handler: Rc<dyn Subscriber>) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);

        trace!(?id, ?filter, subscriber = handler.name(), "subscribe");
        self.inner.subscriptions.borrow_mut().push(Subscription {
            id,
            filter,
            handler,
        });
        id
    }

    /// Register a closure handler
    pub fn subscribe_fn<F>(&self, filter: EventFilter, handler: F) -> SubscriptionId
    where
        F: Fn(&Event) -> anyhow::Result<()> + 'static,
    {
        self.subscribe(filter, Rc::new(handler))
    }

    /// Remove a subscription; returns whether it existed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.inner.subscriptions.borrow_mut();
        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != id);
        before != subscriptions.len()
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscriptions.borrow().len()
    }

    /// Input mode carried by the last published event
    pub fn mode(&self) -> InputMode {
        self.inner.mode.get()
    }

    /// Stamp `kind` with the bus clock and current mode, then publish it
    pub fn emit(&self, kind: EventKind) {
        let event = Event::new(kind, self.inner.clock.now_ms(), self.mode());
        self.publish(&event);
    }

    /// Deliver `event` to every matching subscriber
    pub fn publish(&self, event: &Event) {
        self.inner.mode.set(event.mode);

        // Snapshot so handlers may subscribe or publish during dispatch
        let targets: Vec<Rc<dyn Subscriber>> = self
            .inner
            .subscriptions
            .borrow()
            .iter()
            .filter(|s| s.filter.intersects(event.kind.filter()))
            .map(|s| Rc::clone(&s.handler))
            .collect();

        trace!(kind = ?event.kind, at = event.timestamp_ms, targets = targets.len(), "publish");

        for handler in targets {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event)));
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => PocketError::subscriber(handler.name(), format!("{e:#}")),
                Err(payload) => PocketError::subscriber(handler.name(), panic_message(&*payload)),
            };
            error!(kind = ?event.kind, "{}", failure);
        }
    }
}

/// Bus handle that does not keep the bus alive
///
/// Subscribers are owned by the bus, so one holding a strong [`EventBus`]
/// would form a cycle.
#[derive(Clone, Debug)]
pub struct WeakEventBus {
    inner: Weak<BusInner>,
}

impl WeakEventBus {
    /// The bus, if it still exists
    pub fn upgrade(&self) -> Option<EventBus> {
        self.inner.upgrade().map(|inner| EventBus { inner })
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscriber_count())
            .field("mode", &self.mode())
            .finish()
    }
}
