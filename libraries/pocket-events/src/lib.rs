//! Pocket Player - Event Bus
//!
//! Typed publish/subscribe dispatcher decoupling input detection from every
//! reactive subsystem. The bus has no business logic of its own.
//!
//! # Delivery rules
//!
//! - Synchronous, on the calling thread, in subscription order
//! - A handler may publish while being dispatched; the nested event is
//!   delivered in full before the outer `publish` returns
//! - The bus does not guard against recursion; handlers must not publish
//!   an event that leads back to themselves unconditionally
//! - A handler that returns an error or panics is logged and skipped;
//!   later subscribers still receive the event
//!
//! # Example
//!
//! ```rust
//! use pocket_core::{EventFilter, EventKind, ManualClock};
//! use pocket_events::EventBus;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! let bus = EventBus::new(Rc::new(ManualClock::new(0)));
//! let presses = Rc::new(Cell::new(0));
//!
//! let counter = presses.clone();
//! bus.subscribe_fn(EventFilter::BUTTON_PRESS, move |_| {
//!     counter.set(counter.get() + 1);
//!     Ok(())
//! });
//!
//! bus.emit(EventKind::ButtonPress);
//! bus.emit(EventKind::ScreenWake);
//! assert_eq!(presses.get(), 1);
//! ```

mod bus;
mod subscriber;

pub use bus::{EventBus, SubscriptionId, WeakEventBus};
pub use subscriber::Subscriber;
