use std::sync::Arc;

use guichet_core::{Config, Dispatcher, Reporter, TicketIssuer, TicketStore};

/// Shared application state
pub struct AppState {
    config: Config,
    ticket_store: Arc<dyn TicketStore>,
    issuer: TicketIssuer,
    dispatcher: Dispatcher,
    reporter: Reporter,
}

impl AppState {
    pub fn new(
        config: Config,
        ticket_store: Arc<dyn TicketStore>,
        issuer: TicketIssuer,
        dispatcher: Dispatcher,
        reporter: Reporter,
    ) -> Self {
        Self {
            config,
            ticket_store,
            issuer,
            dispatcher,
            reporter,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn ticket_store(&self) -> &dyn TicketStore {
        self.ticket_store.as_ref()
    }

    pub fn issuer(&self) -> &TicketIssuer {
        &self.issuer
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }
}
