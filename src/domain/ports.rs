use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::catalog::{Cabin, Service};
use super::errors::DomainError;
use super::invoice::{Invoice, NewInvoice};
use super::reservation::{NewReservation, Reservation, ReservationPage};

/// Read access to the reference data reservations point at.
pub trait CatalogRepository: Send + Sync + 'static {
    fn find_cabin(&self, id: Uuid) -> Result<Option<Cabin>, DomainError>;
    fn find_service(&self, id: Uuid) -> Result<Option<Service>, DomainError>;
    fn user_exists(&self, id: Uuid) -> Result<bool, DomainError>;
}

pub trait ReservationRepository: Send + Sync + 'static {
    fn create(&self, reservation: NewReservation) -> Result<Uuid, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<ReservationPage, DomainError>;
    /// Links a service. Linking an already linked service is a no-op.
    fn attach_service(&self, id: Uuid, service_id: Uuid) -> Result<(), DomainError>;
    /// Returns whether a link was removed.
    fn detach_service(&self, id: Uuid, service_id: Uuid) -> Result<bool, DomainError>;
    /// Stamps `accepted_at` only if the reservation is neither accepted nor
    /// canceled at write time. `Conflict` otherwise, `NotFound` if missing.
    fn mark_accepted(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;
    /// Stamps `canceled_at` only if it is still unset at write time.
    fn mark_canceled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;
}

pub trait InvoiceRepository: Send + Sync + 'static {
    fn create(&self, invoice: NewInvoice) -> Result<Uuid, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, DomainError>;
    fn list_for_reservation(&self, reservation_id: Uuid) -> Result<Vec<Invoice>, DomainError>;
    /// Stamps `paid_at` only if it is still unset at write time.
    fn mark_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;
    /// Stamps `canceled_at` only if it is still unset at write time.
    fn mark_canceled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError>;
}

impl<T: CatalogRepository + ?Sized> CatalogRepository for Arc<T> {
    fn find_cabin(&self, id: Uuid) -> Result<Option<Cabin>, DomainError> {
        (**self).find_cabin(id)
    }

    fn find_service(&self, id: Uuid) -> Result<Option<Service>, DomainError> {
        (**self).find_service(id)
    }

    fn user_exists(&self, id: Uuid) -> Result<bool, DomainError> {
        (**self).user_exists(id)
    }
}

impl<T: ReservationRepository + ?Sized> ReservationRepository for Arc<T> {
    fn create(&self, reservation: NewReservation) -> Result<Uuid, DomainError> {
        (**self).create(reservation)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DomainError> {
        (**self).find_by_id(id)
    }

    fn list(&self, page: i64, limit: i64) -> Result<ReservationPage, DomainError> {
        (**self).list(page, limit)
    }

    fn attach_service(&self, id: Uuid, service_id: Uuid) -> Result<(), DomainError> {
        (**self).attach_service(id, service_id)
    }

    fn detach_service(&self, id: Uuid, service_id: Uuid) -> Result<bool, DomainError> {
        (**self).detach_service(id, service_id)
    }

    fn mark_accepted(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        (**self).mark_accepted(id, at)
    }

    fn mark_canceled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        (**self).mark_canceled(id, at)
    }
}

impl<T: InvoiceRepository + ?Sized> InvoiceRepository for Arc<T> {
    fn create(&self, invoice: NewInvoice) -> Result<Uuid, DomainError> {
        (**self).create(invoice)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, DomainError> {
        (**self).find_by_id(id)
    }

    fn list_for_reservation(&self, reservation_id: Uuid) -> Result<Vec<Invoice>, DomainError> {
        (**self).list_for_reservation(reservation_id)
    }

    fn mark_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        (**self).mark_paid(id, at)
    }

    fn mark_canceled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        (**self).mark_canceled(id, at)
    }
}
