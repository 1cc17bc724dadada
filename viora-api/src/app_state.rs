use std::sync::Arc;

use mongodb::Database;

use crate::config::{SearchDefaults, Settings};
use crate::services::{BookingFlow, Notifier, RatingService};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub search: SearchDefaults,
    pub notifier: Arc<Notifier>,
}

impl AppState {
    pub fn new(db: Database, settings: &Settings) -> Self {
        let notifier = Arc::new(Notifier::new(db.clone(), &settings.courier));
        Self {
            db: Arc::new(db),
            search: settings.search,
            notifier,
        }
    }

    pub fn booking_flow(&self) -> BookingFlow {
        BookingFlow::new(self.db.as_ref().clone(), Arc::clone(&self.notifier))
    }

    pub fn ratings(&self) -> RatingService {
        RatingService::new(self.db.as_ref().clone())
    }
}
