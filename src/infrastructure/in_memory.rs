//! A process-local store implementing every repository port.
//!
//! Used to exercise services and handlers without a database.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::catalog::{Cabin, Service};
use crate::domain::errors::DomainError;
use crate::domain::invoice::{Invoice, NewInvoice};
use crate::domain::ports::{CatalogRepository, InvoiceRepository, ReservationRepository};
use crate::domain::reservation::{
    page_offset, NewReservation, Reservation, ReservationPage, StayPeriod,
};

struct ReservationRecord {
    id: Uuid,
    cabin_id: Uuid,
    customer_id: Uuid,
    owner_id: Uuid,
    stay: StayPeriod,
    service_ids: Vec<Uuid>,
    created_at: DateTime<Utc>,
    accepted_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct State {
    users: HashMap<Uuid, String>,
    cabins: HashMap<Uuid, Cabin>,
    services: HashMap<Uuid, Service>,
    reservations: Vec<ReservationRecord>,
    invoices: Vec<Invoice>,
}

impl State {
    fn resolve(&self, record: &ReservationRecord) -> Result<Reservation, DomainError> {
        let cabin = self.cabins.get(&record.cabin_id).cloned().ok_or_else(|| {
            DomainError::Internal(format!(
                "reservation {} references missing cabin {}",
                record.id, record.cabin_id
            ))
        })?;
        Ok(Reservation {
            id: record.id,
            cabin,
            customer_id: record.customer_id,
            owner_id: record.owner_id,
            stay: record.stay,
            services: record
                .service_ids
                .iter()
                .filter_map(|id| self.services.get(id).cloned())
                .collect(),
            created_at: record.created_at,
            accepted_at: record.accepted_at,
            canceled_at: record.canceled_at,
        })
    }

    fn record_mut(&mut self, id: Uuid) -> Result<&mut ReservationRecord, DomainError> {
        self.reservations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(DomainError::NotFound)
    }

    fn invoice_mut(&mut self, id: Uuid) -> Result<&mut Invoice, DomainError> {
        self.invoices
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(DomainError::NotFound)
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, username: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.state().users.insert(id, username.to_string());
        id
    }

    pub fn add_cabin(&self, name: &str, price_per_night: BigDecimal) -> Result<Uuid, DomainError> {
        let cabin = Cabin::new(Uuid::new_v4(), name, price_per_night)?;
        let id = cabin.id;
        self.state().cabins.insert(id, cabin);
        Ok(id)
    }

    pub fn add_service(&self, name: &str, service_price: BigDecimal) -> Result<Uuid, DomainError> {
        let service = Service::new(Uuid::new_v4(), name, service_price)?;
        let id = service.id;
        self.state().services.insert(id, service);
        Ok(id)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CatalogRepository for InMemoryStore {
    fn find_cabin(&self, id: Uuid) -> Result<Option<Cabin>, DomainError> {
        Ok(self.state().cabins.get(&id).cloned())
    }

    fn find_service(&self, id: Uuid) -> Result<Option<Service>, DomainError> {
        Ok(self.state().services.get(&id).cloned())
    }

    fn user_exists(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.state().users.contains_key(&id))
    }
}

impl ReservationRepository for InMemoryStore {
    fn create(&self, reservation: NewReservation) -> Result<Uuid, DomainError> {
        let id = Uuid::new_v4();
        self.state().reservations.push(ReservationRecord {
            id,
            cabin_id: reservation.cabin_id,
            customer_id: reservation.customer_id,
            owner_id: reservation.owner_id,
            stay: reservation.stay,
            service_ids: reservation.service_ids,
            created_at: Utc::now(),
            accepted_at: None,
            canceled_at: None,
        });
        Ok(id)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DomainError> {
        let state = self.state();
        state
            .reservations
            .iter()
            .find(|r| r.id == id)
            .map(|r| state.resolve(r))
            .transpose()
    }

    fn list(&self, page: i64, limit: i64) -> Result<ReservationPage, DomainError> {
        let offset = usize::try_from(page_offset(page, limit)?).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let state = self.state();
        let items = state
            .reservations
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .map(|r| state.resolve(r))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReservationPage {
            items,
            total: state.reservations.len() as i64,
        })
    }

    fn attach_service(&self, id: Uuid, service_id: Uuid) -> Result<(), DomainError> {
        let mut state = self.state();
        let record = state.record_mut(id)?;
        if !record.service_ids.contains(&service_id) {
            record.service_ids.push(service_id);
        }
        Ok(())
    }

    fn detach_service(&self, id: Uuid, service_id: Uuid) -> Result<bool, DomainError> {
        let mut state = self.state();
        let record = state.record_mut(id)?;
        let before = record.service_ids.len();
        record.service_ids.retain(|s| *s != service_id);
        Ok(record.service_ids.len() != before)
    }

    fn mark_accepted(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut state = self.state();
        let record = state.record_mut(id)?;
        if record.accepted_at.is_some() || record.canceled_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "reservation {} is already accepted or canceled",
                id
            )));
        }
        record.accepted_at = Some(at);
        Ok(())
    }

    fn mark_canceled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut state = self.state();
        let record = state.record_mut(id)?;
        if record.canceled_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "reservation {} is already canceled",
                id
            )));
        }
        record.canceled_at = Some(at);
        Ok(())
    }
}

impl InvoiceRepository for InMemoryStore {
    fn create(&self, invoice: NewInvoice) -> Result<Uuid, DomainError> {
        let id = Uuid::new_v4();
        self.state().invoices.push(Invoice {
            id,
            reservation_id: invoice.reservation_id,
            issued_total: invoice.issued_total,
            created_at: Utc::now(),
            paid_at: None,
            canceled_at: None,
        });
        Ok(id)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, DomainError> {
        Ok(self.state().invoices.iter().find(|i| i.id == id).cloned())
    }

    fn list_for_reservation(&self, reservation_id: Uuid) -> Result<Vec<Invoice>, DomainError> {
        Ok(self
            .state()
            .invoices
            .iter()
            .filter(|i| i.reservation_id == reservation_id)
            .cloned()
            .collect())
    }

    fn mark_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut state = self.state();
        state.invoice_mut(id)?.mark_paid(at)
    }

    fn mark_canceled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut state = self.state();
        state.invoice_mut(id)?.cancel(at)
    }
}
