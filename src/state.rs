use std::sync::Arc;

use crate::application::{InvoiceService, ReservationService};
use crate::db::DbPool;
use crate::domain::ports::{CatalogRepository, InvoiceRepository, ReservationRepository};
use crate::infrastructure::{
    DieselCatalogRepository, DieselInvoiceRepository, DieselReservationRepository, InMemoryStore,
};

pub type SharedReservationService =
    ReservationService<Arc<dyn ReservationRepository>, Arc<dyn CatalogRepository>>;
pub type SharedInvoiceService =
    InvoiceService<Arc<dyn InvoiceRepository>, Arc<dyn ReservationRepository>>;

/// Services shared by every worker of the HTTP server.
pub struct AppState {
    pub reservations: SharedReservationService,
    pub invoices: SharedInvoiceService,
}

impl AppState {
    pub fn new(
        reservations: Arc<dyn ReservationRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        catalog: Arc<dyn CatalogRepository>,
    ) -> Self {
        Self {
            reservations: ReservationService::new(reservations.clone(), catalog),
            invoices: InvoiceService::new(invoices, reservations),
        }
    }

    pub fn from_pool(pool: DbPool) -> Self {
        Self::new(
            Arc::new(DieselReservationRepository::new(pool.clone())),
            Arc::new(DieselInvoiceRepository::new(pool.clone())),
            Arc::new(DieselCatalogRepository::new(pool)),
        )
    }

    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self::new(store.clone(), store.clone(), store)
    }
}
