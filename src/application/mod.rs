pub mod invoice_service;
pub mod reservation_service;

pub use invoice_service::InvoiceService;
pub use reservation_service::{ReservationRequest, ReservationService};
