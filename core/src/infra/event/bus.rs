//! Event bus for decoupled communication between models and views
//!
//! Delivery is synchronous and single-threaded. Handlers run in registration
//! order; an event emitted from inside a handler is queued and delivered once
//! the current event has reached every handler.

use super::{EntityEvent, Event, EventKind, SubscriptionFilter};
use crate::domain::Entity;
use std::{
	cell::{Cell, RefCell},
	collections::VecDeque,
	fmt,
	rc::{Rc, Weak},
};
use tracing::{debug, trace};
use uuid::Uuid;

type Handler = Rc<RefCell<dyn FnMut(&Event)>>;

struct Registration {
	id: Uuid,
	filter: SubscriptionFilter,
	handler: Handler,
}

#[derive(Default)]
struct Inner {
	registrations: RefCell<Vec<Registration>>,
	queue: RefCell<VecDeque<Event>>,
	dispatching: Cell<bool>,
}

impl Inner {
	fn unsubscribe(&self, id: Uuid) {
		self.registrations
			.borrow_mut()
			.retain(|registration| registration.id != id);
		debug!("Unsubscribed event handler {}", id);
	}

	fn is_registered(&self, id: Uuid) -> bool {
		self.registrations
			.borrow()
			.iter()
			.any(|registration| registration.id == id)
	}

	fn matching(&self, event: &Event) -> Vec<(Uuid, Handler)> {
		self.registrations
			.borrow()
			.iter()
			.filter(|registration| registration.filter.matches(event))
			.map(|registration| (registration.id, Rc::clone(&registration.handler)))
			.collect()
	}
}

/// Resets the dispatching flag even if a handler panics
struct DispatchGuard<'a>(&'a Cell<bool>);

impl Drop for DispatchGuard<'_> {
	fn drop(&mut self) {
		self.0.set(false);
	}
}

/// Event bus shared by the components of one application context
#[derive(Clone, Default)]
pub struct EventBus {
	inner: Rc<Inner>,
}

impl EventBus {
	pub fn new() -> Self {
		Self::default()
	}

	/// Emit an event to every matching handler
	pub fn emit(&self, event: impl Into<Event>) {
		self.inner.queue.borrow_mut().push_back(event.into());

		if self.inner.dispatching.get() {
			// Delivered by the outer emit once the current event is done
			return;
		}

		self.inner.dispatching.set(true);
		let _guard = DispatchGuard(&self.inner.dispatching);

		loop {
			let next = self.inner.queue.borrow_mut().pop_front();
			let Some(event) = next else {
				break;
			};
			self.dispatch(&event);
		}
	}

	fn dispatch(&self, event: &Event) {
		let handlers = self.inner.matching(event);
		trace!(
			entity = %event.entity(),
			kind = %event.kind(),
			"Dispatching event to {} handlers",
			handlers.len()
		);

		for (id, handler) in handlers {
			// A handler may unsubscribe a later one while this event is in flight
			if !self.inner.is_registered(id) {
				continue;
			}
			(&mut *handler.borrow_mut())(event);
		}
	}

	/// Subscribe with a filter
	pub fn subscribe(
		&self,
		filter: SubscriptionFilter,
		handler: impl FnMut(&Event) + 'static,
	) -> Subscription {
		let id = Uuid::new_v4();
		let handler: Handler = Rc::new(RefCell::new(handler));

		self.inner.registrations.borrow_mut().push(Registration {
			id,
			filter,
			handler,
		});

		debug!(
			"Created subscription {} for {:?} {} events",
			id, filter.entity, filter.kind
		);

		Subscription {
			id,
			bus: Rc::downgrade(&self.inner),
		}
	}

	/// Subscribe to events of entity `R` at or below `kind`
	pub fn on<R: Entity>(
		&self,
		kind: EventKind,
		mut handler: impl FnMut(&EntityEvent<R>) + 'static,
	) -> Subscription {
		self.subscribe(
			SubscriptionFilter::for_entity(R::KIND, kind),
			move |event| {
				if let Some(event) = R::from_event(event) {
					handler(event);
				}
			},
		)
	}

	/// Unsubscribe a handler by id
	pub fn unsubscribe(&self, subscription_id: Uuid) {
		self.inner.unsubscribe(subscription_id);
	}

	/// Get the number of registered handlers
	pub fn subscriber_count(&self) -> usize {
		self.inner.registrations.borrow().len()
	}
}

impl fmt::Debug for EventBus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EventBus")
			.field("subscribers", &self.subscriber_count())
			.field("queued", &self.inner.queue.borrow().len())
			.finish()
	}
}

/// Registration guard; dropping it unregisters the handler
#[derive(Debug)]
#[must_use = "dropping a subscription unregisters its handler"]
pub struct Subscription {
	id: Uuid,
	bus: Weak<Inner>,
}

impl Subscription {
	pub const fn id(&self) -> Uuid {
		self.id
	}
}

impl Drop for Subscription {
	fn drop(&mut self) {
		if let Some(bus) = self.bus.upgrade() {
			bus.unsubscribe(self.id);
		}
	}
}
