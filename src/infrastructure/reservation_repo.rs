use std::collections::HashMap;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{Cabin, Service};
use crate::domain::errors::DomainError;
use crate::domain::ports::ReservationRepository;
use crate::domain::reservation::{
    page_offset, NewReservation, Reservation, ReservationPage, StayPeriod,
};
use crate::schema::{cabins, reservation_services, reservations, services};

use super::models::{
    CabinRow, NewReservationRow, NewReservationServiceRow, ReservationRow, ServiceRow,
};

fn to_domain(
    row: ReservationRow,
    cabin: CabinRow,
    services: Vec<ServiceRow>,
) -> Result<Reservation, DomainError> {
    Ok(Reservation {
        id: row.id,
        cabin: Cabin::try_from(cabin)?,
        customer_id: row.customer_id,
        owner_id: row.owner_id,
        stay: StayPeriod::new(row.start_date, row.end_date)?,
        services: services
            .into_iter()
            .map(Service::try_from)
            .collect::<Result<Vec<_>, _>>()?,
        created_at: row.created_at,
        accepted_at: row.accepted_at,
        canceled_at: row.canceled_at,
    })
}

pub struct DieselReservationRepository {
    pool: DbPool,
}

impl DieselReservationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Turns the row count of a guarded stamp into a result. Zero rows means
    /// either the reservation is gone or the guard no longer held.
    fn settle_stamp(
        conn: &mut PgConnection,
        id: Uuid,
        updated: usize,
        conflict: &str,
    ) -> Result<(), DomainError> {
        if updated > 0 {
            return Ok(());
        }
        let exists: bool =
            diesel::select(diesel::dsl::exists(reservations::table.find(id))).get_result(conn)?;
        if exists {
            Err(DomainError::Conflict(format!("reservation {} is {}", id, conflict)))
        } else {
            Err(DomainError::NotFound)
        }
    }
}

impl ReservationRepository for DieselReservationRepository {
    fn create(&self, reservation: NewReservation) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let id = Uuid::new_v4();
            diesel::insert_into(reservations::table)
                .values(&NewReservationRow {
                    id,
                    cabin_id: reservation.cabin_id,
                    customer_id: reservation.customer_id,
                    owner_id: reservation.owner_id,
                    start_date: reservation.stay.start_date(),
                    end_date: reservation.stay.end_date(),
                })
                .execute(conn)?;

            // One statement per link so `added_at` follows the request order.
            for service_id in &reservation.service_ids {
                diesel::insert_into(reservation_services::table)
                    .values(&NewReservationServiceRow {
                        reservation_id: id,
                        service_id: *service_id,
                    })
                    .on_conflict_do_nothing()
                    .execute(conn)?;
            }

            log::debug!(
                "Inserted reservation {} with {} service(s)",
                id,
                reservation.service_ids.len()
            );
            Ok(id)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DomainError> {
        let mut conn = self.pool.get()?;

        let row = reservations::table
            .find(id)
            .select(ReservationRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let cabin = cabins::table
            .find(row.cabin_id)
            .select(CabinRow::as_select())
            .first(&mut conn)?;

        let linked = reservation_services::table
            .inner_join(services::table)
            .filter(reservation_services::reservation_id.eq(row.id))
            .order((reservation_services::added_at.asc(), services::name.asc()))
            .select(ServiceRow::as_select())
            .load(&mut conn)?;

        to_domain(row, cabin, linked).map(Some)
    }

    fn list(&self, page: i64, limit: i64) -> Result<ReservationPage, DomainError> {
        let offset = page_offset(page, limit)?;
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = reservations::table.count().get_result(conn)?;

            let rows = reservations::table
                .select(ReservationRow::as_select())
                .order(reservations::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            let reservation_ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
            let cabin_ids: Vec<Uuid> = rows.iter().map(|r| r.cabin_id).collect();

            let cabins_by_id: HashMap<Uuid, CabinRow> = cabins::table
                .filter(cabins::id.eq_any(cabin_ids))
                .select(CabinRow::as_select())
                .load(conn)?
                .into_iter()
                .map(|c| (c.id, c))
                .collect();

            let links: Vec<(Uuid, ServiceRow)> = reservation_services::table
                .inner_join(services::table)
                .filter(reservation_services::reservation_id.eq_any(reservation_ids))
                .order((reservation_services::added_at.asc(), services::name.asc()))
                .select((reservation_services::reservation_id, ServiceRow::as_select()))
                .load(conn)?;

            let mut services_by_reservation: HashMap<Uuid, Vec<ServiceRow>> = HashMap::new();
            for (reservation_id, service) in links {
                services_by_reservation
                    .entry(reservation_id)
                    .or_default()
                    .push(service);
            }

            let items = rows
                .into_iter()
                .map(|row| {
                    // Several reservations may share a cabin.
                    let cabin = cabins_by_id.get(&row.cabin_id).cloned().ok_or_else(|| {
                        DomainError::Internal(format!("missing cabin {}", row.cabin_id))
                    })?;
                    let linked = services_by_reservation.remove(&row.id).unwrap_or_default();
                    to_domain(row, cabin, linked)
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(ReservationPage { items, total })
        })
    }

    fn attach_service(&self, id: Uuid, service_id: Uuid) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let inserted = diesel::insert_into(reservation_services::table)
            .values(&NewReservationServiceRow {
                reservation_id: id,
                service_id,
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)?;
        if inserted == 0 {
            log::debug!("Service {} already linked to reservation {}", service_id, id);
        }
        Ok(())
    }

    fn detach_service(&self, id: Uuid, service_id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let deleted = diesel::delete(
            reservation_services::table
                .filter(reservation_services::reservation_id.eq(id))
                .filter(reservation_services::service_id.eq(service_id)),
        )
        .execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn mark_accepted(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            reservations::table
                .find(id)
                .filter(reservations::accepted_at.is_null())
                .filter(reservations::canceled_at.is_null()),
        )
        .set(reservations::accepted_at.eq(Some(at)))
        .execute(&mut conn)?;
        Self::settle_stamp(&mut conn, id, updated, "already accepted or canceled")
    }

    fn mark_canceled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(
            reservations::table
                .find(id)
                .filter(reservations::canceled_at.is_null()),
        )
        .set(reservations::canceled_at.eq(Some(at)))
        .execute(&mut conn)?;
        Self::settle_stamp(&mut conn, id, updated, "already canceled")
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use bigdecimal::BigDecimal;
    use chrono::{NaiveDate, Utc};

    use super::DieselReservationRepository;
    use crate::domain::errors::DomainError;
    use crate::domain::ports::ReservationRepository;
    use crate::domain::reservation::{NewReservation, StayPeriod};
    use crate::infrastructure::catalog_repo::DieselCatalogRepository;
    use crate::infrastructure::test_support::setup_db;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn stay() -> StayPeriod {
        StayPeriod::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 4).unwrap(),
        )
        .unwrap()
    }

    fn new_reservation(catalog: &DieselCatalogRepository, services: Vec<uuid::Uuid>) -> NewReservation {
        NewReservation {
            cabin_id: catalog.insert_cabin("Lakeside", dec("100")).unwrap(),
            customer_id: catalog.insert_user(&format!("c-{}", uuid::Uuid::new_v4())).unwrap(),
            owner_id: catalog.insert_user(&format!("o-{}", uuid::Uuid::new_v4())).unwrap(),
            stay: stay(),
            service_ids: services,
        }
    }

    #[tokio::test]
    async fn create_and_find_by_id_roundtrip() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselReservationRepository::new(pool);

        let sauna = catalog.insert_service("Sauna", dec("20")).unwrap();
        let linen = catalog.insert_service("Linen", dec("30")).unwrap();
        let id = repo
            .create(new_reservation(&catalog, vec![sauna, linen]))
            .expect("create failed");

        let reservation = repo
            .find_by_id(id)
            .expect("find failed")
            .expect("reservation should exist");

        assert_eq!(reservation.length_of_stay(), 3);
        assert_eq!(reservation.total_cabin_price(), dec("300"));
        assert_eq!(reservation.total_services_price(), dec("50"));
        assert_eq!(
            reservation.services(),
            vec![
                ("Sauna".to_string(), dec("20.00")),
                ("Linen".to_string(), dec("30.00"))
            ]
        );
        assert!(reservation.accepted_at.is_none());
    }

    #[tokio::test]
    async fn prices_follow_live_service_data() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselReservationRepository::new(pool);

        let sauna = catalog.insert_service("Sauna", dec("20")).unwrap();
        let id = repo.create(new_reservation(&catalog, vec![sauna])).unwrap();

        catalog.update_service_price(sauna, dec("25")).unwrap();
        let boat = catalog.insert_service("Boat", dec("40")).unwrap();
        repo.attach_service(id, boat).unwrap();
        repo.attach_service(id, boat).unwrap();

        let reservation = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(reservation.total_services_price(), dec("65"));
        assert_eq!(reservation.services.len(), 2);

        assert!(repo.detach_service(id, sauna).unwrap());
        assert!(!repo.detach_service(id, sauna).unwrap());
        let reservation = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(reservation.total_services_price(), dec("40"));
    }

    #[tokio::test]
    async fn lifecycle_timestamps_are_persisted() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselReservationRepository::new(pool);

        let id = repo.create(new_reservation(&catalog, vec![])).unwrap();
        repo.mark_accepted(id, Utc::now()).unwrap();

        let stored = repo.find_by_id(id).unwrap().unwrap();
        assert!(stored.accepted_at.is_some());
        assert!(stored.canceled_at.is_none());

        assert!(matches!(
            repo.mark_accepted(uuid::Uuid::new_v4(), Utc::now()),
            Err(DomainError::NotFound)
        ));
    }

    #[tokio::test]
    async fn stale_accept_cannot_erase_a_cancellation() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselReservationRepository::new(pool);

        let id = repo.create(new_reservation(&catalog, vec![])).unwrap();
        let first = repo.find_by_id(id).unwrap().unwrap();
        let second = repo.find_by_id(id).unwrap().unwrap();

        repo.mark_canceled(first.id, Utc::now()).unwrap();
        let canceled_at = repo.find_by_id(id).unwrap().unwrap().canceled_at;

        assert!(matches!(
            repo.mark_accepted(second.id, Utc::now()),
            Err(DomainError::Conflict(_))
        ));
        assert!(matches!(
            repo.mark_canceled(second.id, Utc::now()),
            Err(DomainError::Conflict(_))
        ));

        let stored = repo.find_by_id(id).unwrap().unwrap();
        assert!(stored.accepted_at.is_none());
        assert_eq!(stored.canceled_at, canceled_at);
    }

    #[tokio::test]
    async fn find_by_id_returns_none_for_unknown_id() {
        let (_container, pool) = setup_db().await;
        let repo = DieselReservationRepository::new(pool);

        let result = repo
            .find_by_id(uuid::Uuid::new_v4())
            .expect("find should not error");

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn list_paginates_correctly() {
        let (_container, pool) = setup_db().await;
        let catalog = DieselCatalogRepository::new(pool.clone());
        let repo = DieselReservationRepository::new(pool);
        let sauna = catalog.insert_service("Sauna", dec("20")).unwrap();

        for _ in 0..5 {
            repo.create(new_reservation(&catalog, vec![sauna]))
                .expect("create failed");
        }

        let page1 = repo.list(1, 3).expect("list page 1 failed");
        assert_eq!(page1.total, 5);
        assert_eq!(page1.items.len(), 3);
        assert!(page1
            .items
            .iter()
            .all(|r| r.total_services_price() == dec("20")));

        let page2 = repo.list(2, 3).expect("list page 2 failed");
        assert_eq!(page2.total, 5);
        assert_eq!(page2.items.len(), 2);

        assert!(matches!(
            repo.list(i64::MAX, 100),
            Err(DomainError::InvalidInput(_))
        ));
    }
}
