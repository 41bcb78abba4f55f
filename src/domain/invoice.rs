use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::DomainError;
use super::reservation::Reservation;

#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub reservation_id: Uuid,
    pub issued_total: BigDecimal,
}

/// A billing record for one reservation.
///
/// `issued_total` is the reservation's total at the time the invoice was
/// created and never changes. The live figure is [`InvoiceView::total_price`].
#[derive(Debug, Clone)]
pub struct Invoice {
    pub id: Uuid,
    pub reservation_id: Uuid,
    pub issued_total: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn mark_paid(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.paid_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "invoice {} is already paid",
                self.id
            )));
        }
        self.paid_at = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.canceled_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "invoice {} is already canceled",
                self.id
            )));
        }
        self.canceled_at = Some(at);
        Ok(())
    }

    /// Printable form of the invoice. Rendering is not implemented yet, so
    /// the document is always empty.
    pub fn document(&self) -> InvoiceDocument {
        InvoiceDocument::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceDocument {
    bytes: Vec<u8>,
}

impl InvoiceDocument {
    pub const CONTENT_TYPE: &'static str = "application/pdf";

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// An invoice together with the reservation it bills.
#[derive(Debug, Clone)]
pub struct InvoiceView {
    pub invoice: Invoice,
    pub reservation: Reservation,
}

impl InvoiceView {
    pub fn new(invoice: Invoice, reservation: Reservation) -> Result<Self, DomainError> {
        if invoice.reservation_id != reservation.id {
            return Err(DomainError::Internal(format!(
                "invoice {} bills reservation {}, not {}",
                invoice.id, invoice.reservation_id, reservation.id
            )));
        }
        Ok(Self {
            invoice,
            reservation,
        })
    }

    /// Recomputed from the reservation on every call.
    pub fn total_price(&self) -> BigDecimal {
        self.reservation.total_cabin_price() + self.reservation.total_services_price()
    }
}

impl fmt::Display for InvoiceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.reservation, f)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::domain::catalog::Service;
    use crate::domain::reservation::tests::{dec, reservation};

    fn invoice_for(reservation: &Reservation) -> Invoice {
        Invoice {
            id: Uuid::new_v4(),
            reservation_id: reservation.id,
            issued_total: reservation.total_price(),
            created_at: Utc::now(),
            paid_at: None,
            canceled_at: None,
        }
    }

    #[test]
    fn total_price_delegates_to_reservation() {
        let r = reservation("100", &[("Sauna", "20"), ("Linen", "30")]);
        let view = InvoiceView::new(invoice_for(&r), r).unwrap();
        assert_eq!(view.total_price(), dec("350"));
    }

    #[test]
    fn total_price_tracks_services_added_after_issue() {
        let r = reservation("100", &[]);
        let mut view = InvoiceView::new(invoice_for(&r), r).unwrap();
        assert_eq!(view.total_price(), dec("300"));

        view.reservation
            .services
            .push(Service::new(Uuid::new_v4(), "Boat", dec("40")).unwrap());

        assert_eq!(view.total_price(), dec("340"));
        assert_eq!(view.invoice.issued_total, dec("300"));
    }

    #[test]
    fn view_rejects_mismatched_reservation() {
        let a = reservation("100", &[]);
        let b = reservation("100", &[]);
        let err = InvoiceView::new(invoice_for(&a), b).unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
    }

    #[test]
    fn document_is_empty() {
        let r = reservation("100", &[("Sauna", "20")]);
        let mut invoice = invoice_for(&r);
        assert!(invoice.document().is_empty());

        invoice.mark_paid(Utc::now()).unwrap();
        assert!(invoice.document().as_bytes().is_empty());
    }

    #[test]
    fn paid_and_canceled_are_write_once() {
        let r = reservation("100", &[]);
        let mut invoice = invoice_for(&r);

        invoice.mark_paid(Utc::now()).unwrap();
        assert!(matches!(
            invoice.mark_paid(Utc::now()),
            Err(DomainError::Conflict(_))
        ));

        invoice.cancel(Utc::now()).unwrap();
        assert!(matches!(
            invoice.cancel(Utc::now()),
            Err(DomainError::Conflict(_))
        ));
        assert!(invoice.paid_at.is_some() && invoice.canceled_at.is_some());
    }

    #[test]
    fn display_uses_reservation_label() {
        let r = reservation("100", &[]);
        let label = r.to_string();
        let view = InvoiceView::new(invoice_for(&r), r).unwrap();
        assert_eq!(view.to_string(), label);
    }
}
