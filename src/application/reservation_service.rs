use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::ports::{CatalogRepository, ReservationRepository};
use crate::domain::reservation::{
    NewReservation, PriceBreakdown, Reservation, ReservationPage, StayPeriod,
};

#[derive(Debug, Clone)]
pub struct ReservationRequest {
    pub cabin_id: Uuid,
    pub customer_id: Uuid,
    pub owner_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub service_ids: Vec<Uuid>,
}

pub struct ReservationService<R, C> {
    repo: R,
    catalog: C,
}

impl<R: ReservationRepository, C: CatalogRepository> ReservationService<R, C> {
    pub fn new(repo: R, catalog: C) -> Self {
        Self { repo, catalog }
    }

    pub fn create_reservation(&self, request: ReservationRequest) -> Result<Uuid, DomainError> {
        let stay = StayPeriod::new(request.start_date, request.end_date)?;

        if self.catalog.find_cabin(request.cabin_id)?.is_none() {
            return Err(DomainError::InvalidInput(format!(
                "unknown cabin {}",
                request.cabin_id
            )));
        }
        for user_id in [request.customer_id, request.owner_id] {
            if !self.catalog.user_exists(user_id)? {
                return Err(DomainError::InvalidInput(format!("unknown user {}", user_id)));
            }
        }

        let mut service_ids: Vec<Uuid> = Vec::with_capacity(request.service_ids.len());
        for service_id in request.service_ids {
            if service_ids.contains(&service_id) {
                continue;
            }
            self.require_service(service_id)?;
            service_ids.push(service_id);
        }

        let id = self.repo.create(NewReservation {
            cabin_id: request.cabin_id,
            customer_id: request.customer_id,
            owner_id: request.owner_id,
            stay,
            service_ids,
        })?;
        log::info!(
            "Created reservation {} for cabin {} ({} nights)",
            id,
            request.cabin_id,
            stay.nights()
        );
        Ok(id)
    }

    pub fn get_reservation(&self, id: Uuid) -> Result<Option<Reservation>, DomainError> {
        self.repo.find_by_id(id)
    }

    pub fn list_reservations(&self, page: i64, limit: i64) -> Result<ReservationPage, DomainError> {
        self.repo.list(page, limit)
    }

    pub fn quote(&self, id: Uuid) -> Result<PriceBreakdown, DomainError> {
        Ok(self.require(id)?.price_breakdown())
    }

    pub fn attach_service(&self, id: Uuid, service_id: Uuid) -> Result<(), DomainError> {
        self.require(id)?.ensure_modifiable()?;
        self.require_service(service_id)?;
        self.repo.attach_service(id, service_id)?;
        log::info!("Attached service {} to reservation {}", service_id, id);
        Ok(())
    }

    pub fn detach_service(&self, id: Uuid, service_id: Uuid) -> Result<(), DomainError> {
        self.require(id)?.ensure_modifiable()?;
        if !self.repo.detach_service(id, service_id)? {
            return Err(DomainError::NotFound);
        }
        log::info!("Detached service {} from reservation {}", service_id, id);
        Ok(())
    }

    pub fn accept(&self, id: Uuid) -> Result<Reservation, DomainError> {
        let now = Utc::now();
        self.require(id)?.accept(now)?;
        // The stored row may have moved on since it was read.
        self.repo.mark_accepted(id, now)?;
        log::info!("Accepted reservation {}", id);
        self.require(id)
    }

    pub fn cancel(&self, id: Uuid) -> Result<Reservation, DomainError> {
        let now = Utc::now();
        self.require(id)?.cancel(now)?;
        self.repo.mark_canceled(id, now)?;
        log::info!("Canceled reservation {}", id);
        self.require(id)
    }

    fn require(&self, id: Uuid) -> Result<Reservation, DomainError> {
        self.repo.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    fn require_service(&self, service_id: Uuid) -> Result<(), DomainError> {
        match self.catalog.find_service(service_id)? {
            Some(_) => Ok(()),
            None => Err(DomainError::InvalidInput(format!(
                "unknown service {}",
                service_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use bigdecimal::BigDecimal;

    use super::*;
    use crate::infrastructure::in_memory::InMemoryStore;

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: ReservationService<Arc<InMemoryStore>, Arc<InMemoryStore>>,
        cabin_id: Uuid,
        customer_id: Uuid,
        owner_id: Uuid,
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let cabin_id = store.add_cabin("Lakeside", dec("100")).unwrap();
        let customer_id = store.add_user("customer");
        let owner_id = store.add_user("owner");
        Fixture {
            service: ReservationService::new(store.clone(), store.clone()),
            store,
            cabin_id,
            customer_id,
            owner_id,
        }
    }

    fn request(f: &Fixture, service_ids: Vec<Uuid>) -> ReservationRequest {
        ReservationRequest {
            cabin_id: f.cabin_id,
            customer_id: f.customer_id,
            owner_id: f.owner_id,
            start_date: date("2024-01-01"),
            end_date: date("2024-01-04"),
            service_ids,
        }
    }

    #[test]
    fn create_and_quote_without_services() {
        let f = fixture();
        let id = f.service.create_reservation(request(&f, vec![])).unwrap();

        let quote = f.service.quote(id).unwrap();
        assert_eq!(quote.length_of_stay, 3);
        assert_eq!(quote.total_cabin_price, dec("300"));
        assert_eq!(quote.total_services_price, dec("0"));
        assert!(quote.services.is_empty());
    }

    #[test]
    fn create_with_services_prices_them() {
        let f = fixture();
        let sauna = f.store.add_service("Sauna", dec("20")).unwrap();
        let linen = f.store.add_service("Linen", dec("30")).unwrap();

        let id = f
            .service
            .create_reservation(request(&f, vec![sauna, linen, sauna]))
            .unwrap();

        let reservation = f.service.get_reservation(id).unwrap().unwrap();
        assert_eq!(reservation.services.len(), 2);
        assert_eq!(reservation.total_services_price(), dec("50"));
        assert_eq!(reservation.total_price(), dec("350"));
        assert_eq!(
            reservation.services(),
            vec![
                ("Sauna".to_string(), dec("20")),
                ("Linen".to_string(), dec("30"))
            ]
        );
    }

    #[test]
    fn create_rejects_inverted_dates() {
        let f = fixture();
        let mut req = request(&f, vec![]);
        req.end_date = date("2023-12-31");

        let err = f.service.create_reservation(req).unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[test]
    fn create_rejects_unknown_references() {
        let f = fixture();

        let mut req = request(&f, vec![]);
        req.cabin_id = Uuid::new_v4();
        assert!(matches!(
            f.service.create_reservation(req),
            Err(DomainError::InvalidInput(_))
        ));

        let mut req = request(&f, vec![]);
        req.owner_id = Uuid::new_v4();
        assert!(matches!(
            f.service.create_reservation(req),
            Err(DomainError::InvalidInput(_))
        ));

        let req = request(&f, vec![Uuid::new_v4()]);
        assert!(matches!(
            f.service.create_reservation(req),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn attach_is_idempotent_and_detach_removes() {
        let f = fixture();
        let sauna = f.store.add_service("Sauna", dec("20")).unwrap();
        let id = f.service.create_reservation(request(&f, vec![])).unwrap();

        f.service.attach_service(id, sauna).unwrap();
        f.service.attach_service(id, sauna).unwrap();
        assert_eq!(f.service.quote(id).unwrap().total_services_price, dec("20"));

        f.service.detach_service(id, sauna).unwrap();
        assert_eq!(f.service.quote(id).unwrap().total_services_price, dec("0"));

        assert!(matches!(
            f.service.detach_service(id, sauna),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn quote_unknown_reservation_is_not_found() {
        let f = fixture();
        assert!(matches!(
            f.service.quote(Uuid::new_v4()),
            Err(DomainError::NotFound)
        ));
    }

    #[test]
    fn accept_then_cancel_is_persisted() {
        let f = fixture();
        let id = f.service.create_reservation(request(&f, vec![])).unwrap();

        f.service.accept(id).unwrap();
        assert!(matches!(f.service.accept(id), Err(DomainError::Conflict(_))));

        f.service.cancel(id).unwrap();
        let stored = f.service.get_reservation(id).unwrap().unwrap();
        assert!(stored.accepted_at.is_some());
        assert!(stored.canceled_at.is_some());
    }

    #[test]
    fn cancel_wins_over_an_accept_read_before_it() {
        let f = fixture();
        let id = f.service.create_reservation(request(&f, vec![])).unwrap();
        let mut stale = f.service.get_reservation(id).unwrap().unwrap();

        f.service.cancel(id).unwrap();
        // An accept that validated against the earlier read still loses.
        stale.accept(Utc::now()).unwrap();
        assert!(matches!(
            f.store.mark_accepted(id, Utc::now()),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(f.service.accept(id), Err(DomainError::Conflict(_))));

        let stored = f.service.get_reservation(id).unwrap().unwrap();
        assert!(stored.canceled_at.is_some());
        assert!(stored.accepted_at.is_none());
    }

    #[test]
    fn list_rejects_out_of_range_page() {
        let f = fixture();
        assert!(matches!(
            f.service.list_reservations(i64::MAX, 100),
            Err(DomainError::InvalidInput(_))
        ));
    }

    #[test]
    fn canceled_reservation_rejects_service_changes() {
        let f = fixture();
        let sauna = f.store.add_service("Sauna", dec("20")).unwrap();
        let id = f.service.create_reservation(request(&f, vec![])).unwrap();
        f.service.cancel(id).unwrap();

        assert!(matches!(
            f.service.attach_service(id, sauna),
            Err(DomainError::Conflict(_))
        ));
    }

    #[test]
    fn list_pages_through_reservations() {
        let f = fixture();
        for _ in 0..5 {
            f.service.create_reservation(request(&f, vec![])).unwrap();
        }

        let page1 = f.service.list_reservations(1, 3).unwrap();
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);

        let page2 = f.service.list_reservations(2, 3).unwrap();
        assert_eq!(page2.items.len(), 2);
    }
}
