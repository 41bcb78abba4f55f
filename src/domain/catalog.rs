//! Reference data owned by other subsystems: cabins and add-on services.
//!
//! Reservations only read these through their identifiers, names and prices.

use bigdecimal::{BigDecimal, Zero};
use uuid::Uuid;

use super::errors::DomainError;

#[derive(Debug, Clone, PartialEq)]
pub struct Cabin {
    pub id: Uuid,
    pub name: String,
    pub price_per_night: BigDecimal,
}

impl Cabin {
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        price_per_night: BigDecimal,
    ) -> Result<Self, DomainError> {
        ensure_non_negative("price_per_night", &price_per_night)?;
        Ok(Self {
            id,
            name: name.into(),
            price_per_night,
        })
    }
}

/// A paid add-on a customer can attach to a reservation.
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub service_price: BigDecimal,
}

impl Service {
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        service_price: BigDecimal,
    ) -> Result<Self, DomainError> {
        ensure_non_negative("service_price", &service_price)?;
        Ok(Self {
            id,
            name: name.into(),
            service_price,
        })
    }
}

fn ensure_non_negative(field: &str, amount: &BigDecimal) -> Result<(), DomainError> {
    if amount < &BigDecimal::zero() {
        return Err(DomainError::InvalidInput(format!(
            "{} must not be negative, got {}",
            field, amount
        )));
    }
    Ok(())
}
