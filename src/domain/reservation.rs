use std::fmt;

use bigdecimal::{BigDecimal, Zero};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use super::catalog::{Cabin, Service};
use super::errors::DomainError;

/// The booked date range. `end_date` is never before `start_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayPeriod {
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl StayPeriod {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Result<Self, DomainError> {
        if end_date < start_date {
            return Err(DomainError::InvalidInput(format!(
                "end_date {} is before start_date {}",
                end_date, start_date
            )));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    /// Whole days between start and end.
    pub fn nights(&self) -> i64 {
        self.end_date
            .signed_duration_since(self.start_date)
            .num_days()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservationStatus {
    Pending,
    Accepted,
    Canceled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "PENDING",
            ReservationStatus::Accepted => "ACCEPTED",
            ReservationStatus::Canceled => "CANCELED",
        }
    }
}

/// Input for booking a cabin.
#[derive(Debug, Clone)]
pub struct NewReservation {
    pub cabin_id: Uuid,
    pub customer_id: Uuid,
    pub owner_id: Uuid,
    pub stay: StayPeriod,
    pub service_ids: Vec<Uuid>,
}

/// A booking of a cabin by a customer, with its linked add-on services
/// resolved. Prices are derived from the linked data on every call.
#[derive(Debug, Clone)]
pub struct Reservation {
    pub id: Uuid,
    pub cabin: Cabin,
    pub customer_id: Uuid,
    pub owner_id: Uuid,
    pub stay: StayPeriod,
    /// Insertion order, ties broken by name.
    pub services: Vec<Service>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn length_of_stay(&self) -> i64 {
        self.stay.nights()
    }

    pub fn total_cabin_price(&self) -> BigDecimal {
        &self.cabin.price_per_night * &BigDecimal::from(self.length_of_stay())
    }

    pub fn total_services_price(&self) -> BigDecimal {
        self.services
            .iter()
            .fold(BigDecimal::zero(), |acc, s| acc + &s.service_price)
    }

    pub fn total_price(&self) -> BigDecimal {
        self.total_cabin_price() + self.total_services_price()
    }

    /// `(name, price)` for every linked service, for display.
    pub fn services(&self) -> Vec<(String, BigDecimal)> {
        self.services
            .iter()
            .map(|s| (s.name.clone(), s.service_price.clone()))
            .collect()
    }

    pub fn status(&self) -> ReservationStatus {
        if self.canceled_at.is_some() {
            ReservationStatus::Canceled
        } else if self.accepted_at.is_some() {
            ReservationStatus::Accepted
        } else {
            ReservationStatus::Pending
        }
    }

    pub fn price_breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            length_of_stay: self.length_of_stay(),
            price_per_night: self.cabin.price_per_night.clone(),
            total_cabin_price: self.total_cabin_price(),
            total_services_price: self.total_services_price(),
            total_price: self.total_price(),
            services: self.services(),
        }
    }

    pub fn accept(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.canceled_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "reservation {} is canceled",
                self.id
            )));
        }
        if self.accepted_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "reservation {} is already accepted",
                self.id
            )));
        }
        self.accepted_at = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.canceled_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "reservation {} is already canceled",
                self.id
            )));
        }
        self.canceled_at = Some(at);
        Ok(())
    }

    /// Services can only be changed while the reservation is still live.
    pub fn ensure_modifiable(&self) -> Result<(), DomainError> {
        if self.canceled_at.is_some() {
            return Err(DomainError::Conflict(format!(
                "reservation {} is canceled",
                self.id
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Reservation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.cabin.name,
            self.customer_id,
            self.stay.start_date(),
            self.stay.end_date()
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub length_of_stay: i64,
    pub price_per_night: BigDecimal,
    pub total_cabin_price: BigDecimal,
    pub total_services_price: BigDecimal,
    pub total_price: BigDecimal,
    pub services: Vec<(String, BigDecimal)>,
}

#[derive(Debug, Clone)]
pub struct ReservationPage {
    pub items: Vec<Reservation>,
    pub total: i64,
}

/// Rows to skip for a 1-based `page` of `limit` items.
pub fn page_offset(page: i64, limit: i64) -> Result<i64, DomainError> {
    if page < 1 || limit < 1 {
        return Err(DomainError::InvalidInput(format!(
            "page {} with limit {} is not a valid page",
            page, limit
        )));
    }
    (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| DomainError::InvalidInput(format!("page {} is out of range", page)))
}
