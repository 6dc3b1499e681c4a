use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use crate::metrics::{EMPTY_CALLS, TICKETS_CALLED};
use crate::ticket::{Ticket, TicketClass, TicketError, TicketStore};

/// Decides which ticket a counter serves next.
///
/// Urgent tickets normally go first, but after an urgent call the other
/// classes get the next attempt so a steady urgent stream cannot starve
/// them. The rotation depends only on the last class actually called, not
/// on which counter asked.
pub struct Dispatcher {
    store: Arc<dyn TicketStore>,
    last_called: Mutex<Option<TicketClass>>,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self {
            store,
            last_called: Mutex::new(None),
        }
    }

    /// Call the next ticket for the given counter. Returns `None` when every
    /// queue is empty; no call event is recorded in that case.
    pub fn call_next(&self, counter: u32) -> Result<Option<Ticket>, TicketError> {
        // Held across probe and claim so concurrent calls see a consistent
        // rotation state.
        let mut last = self.last_called.lock().unwrap();
        let order = Self::attempt_order(*last);

        match self.store.claim_next(&order, counter)? {
            Some(ticket) => {
                *last = Some(ticket.class);
                TICKETS_CALLED
                    .with_label_values(&[ticket.class.code()])
                    .inc();
                info!(code = %ticket.code, counter, "called ticket");
                Ok(Some(ticket))
            }
            None => {
                EMPTY_CALLS.inc();
                debug!(counter, "call with all queues empty");
                Ok(None)
            }
        }
    }

    pub fn last_called(&self) -> Option<TicketClass> {
        *self.last_called.lock().unwrap()
    }

    fn attempt_order(last: Option<TicketClass>) -> [TicketClass; 3] {
        match last {
            Some(TicketClass::Sp) => [TicketClass::Se, TicketClass::Sg, TicketClass::Sp],
            _ => [TicketClass::Sp, TicketClass::Se, TicketClass::Sg],
        }
    }
}
