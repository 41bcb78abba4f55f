use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::invoice::{Invoice, InvoiceDocument, InvoiceView, NewInvoice};
use crate::domain::ports::{InvoiceRepository, ReservationRepository};
use crate::domain::reservation::Reservation;

pub struct InvoiceService<I, R> {
    invoices: I,
    reservations: R,
}

impl<I: InvoiceRepository, R: ReservationRepository> InvoiceService<I, R> {
    pub fn new(invoices: I, reservations: R) -> Self {
        Self {
            invoices,
            reservations,
        }
    }

    pub fn create_invoice(&self, reservation_id: Uuid) -> Result<Uuid, DomainError> {
        let reservation = self.require_reservation(reservation_id)?;
        if reservation.canceled_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "reservation {} is canceled",
                reservation_id
            )));
        }

        let issued_total = reservation.total_price();
        let id = self.invoices.create(NewInvoice {
            reservation_id,
            issued_total: issued_total.clone(),
        })?;
        log::info!(
            "Issued invoice {} for reservation {} (total {})",
            id,
            reservation_id,
            issued_total
        );
        Ok(id)
    }

    pub fn get_invoice(&self, id: Uuid) -> Result<Option<InvoiceView>, DomainError> {
        let Some(invoice) = self.invoices.find_by_id(id)? else {
            return Ok(None);
        };
        self.view(invoice).map(Some)
    }

    pub fn invoices_for_reservation(
        &self,
        reservation_id: Uuid,
    ) -> Result<Vec<Invoice>, DomainError> {
        self.require_reservation(reservation_id)?;
        self.invoices.list_for_reservation(reservation_id)
    }

    pub fn mark_paid(&self, id: Uuid) -> Result<InvoiceView, DomainError> {
        let now = Utc::now();
        self.require(id)?.mark_paid(now)?;
        self.invoices.mark_paid(id, now)?;
        log::info!("Invoice {} paid", id);
        self.view(self.require(id)?)
    }

    pub fn cancel(&self, id: Uuid) -> Result<InvoiceView, DomainError> {
        let now = Utc::now();
        self.require(id)?.cancel(now)?;
        self.invoices.mark_canceled(id, now)?;
        log::info!("Invoice {} canceled", id);
        self.view(self.require(id)?)
    }

    pub fn document(&self, id: Uuid) -> Result<InvoiceDocument, DomainError> {
        Ok(self.require(id)?.document())
    }

    fn view(&self, invoice: Invoice) -> Result<InvoiceView, DomainError> {
        let reservation = self
            .reservations
            .find_by_id(invoice.reservation_id)?
            .ok_or_else(|| {
                DomainError::Internal(format!(
                    "invoice {} references missing reservation {}",
                    invoice.id, invoice.reservation_id
                ))
            })?;
        InvoiceView::new(invoice, reservation)
    }

    fn require(&self, id: Uuid) -> Result<Invoice, DomainError> {
        self.invoices.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    fn require_reservation(&self, id: Uuid) -> Result<Reservation, DomainError> {
        self.reservations.find_by_id(id)?.ok_or(DomainError::NotFound)
    }
}
