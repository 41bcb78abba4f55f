use bigdecimal::BigDecimal;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{Cabin, Service};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::{cabins, services, users};

use super::models::{CabinRow, NewCabinRow, NewServiceRow, NewUserRow, ServiceRow};

impl TryFrom<CabinRow> for Cabin {
    type Error = DomainError;

    fn try_from(row: CabinRow) -> Result<Self, Self::Error> {
        Cabin::new(row.id, row.name, row.price_per_night)
    }
}

impl TryFrom<ServiceRow> for Service {
    type Error = DomainError;

    fn try_from(row: ServiceRow) -> Result<Self, Self::Error> {
        Service::new(row.id, row.name, row.service_price)
    }
}

pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn insert_user(&self, username: &str) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;
        let id = Uuid::new_v4();
        diesel::insert_into(users::table)
            .values(&NewUserRow {
                id,
                username: username.to_string(),
            })
            .execute(&mut conn)?;
        Ok(id)
    }

    pub fn insert_cabin(&self, name: &str, price_per_night: BigDecimal) -> Result<Uuid, DomainError> {
        let cabin = Cabin::new(Uuid::new_v4(), name, price_per_night)?;
        let mut conn = self.pool.get()?;
        diesel::insert_into(cabins::table)
            .values(&NewCabinRow {
                id: cabin.id,
                name: cabin.name,
                price_per_night: cabin.price_per_night,
            })
            .execute(&mut conn)?;
        Ok(cabin.id)
    }

    pub fn insert_service(&self, name: &str, service_price: BigDecimal) -> Result<Uuid, DomainError> {
        let service = Service::new(Uuid::new_v4(), name, service_price)?;
        let mut conn = self.pool.get()?;
        diesel::insert_into(services::table)
            .values(&NewServiceRow {
                id: service.id,
                name: service.name,
                service_price: service.service_price,
            })
            .execute(&mut conn)?;
        Ok(service.id)
    }

    pub fn update_service_price(&self, id: Uuid, service_price: BigDecimal) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let updated = diesel::update(services::table.find(id))
            .set(services::service_price.eq(service_price))
            .execute(&mut conn)?;
        if updated == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }
}

impl CatalogRepository for DieselCatalogRepository {
    fn find_cabin(&self, id: Uuid) -> Result<Option<Cabin>, DomainError> {
        let mut conn = self.pool.get()?;
        cabins::table
            .find(id)
            .select(CabinRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Cabin::try_from)
            .transpose()
    }

    fn find_service(&self, id: Uuid) -> Result<Option<Service>, DomainError> {
        let mut conn = self.pool.get()?;
        services::table
            .find(id)
            .select(ServiceRow::as_select())
            .first(&mut conn)
            .optional()?
            .map(Service::try_from)
            .transpose()
    }

    fn user_exists(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut conn = self.pool.get()?;
        let exists = diesel::select(diesel::dsl::exists(users::table.find(id)))
            .get_result::<bool>(&mut conn)?;
        Ok(exists)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;
    use crate::infrastructure::test_support::setup_db;

    #[tokio::test]
    async fn inserted_reference_data_is_found() {
        let (_container, pool) = setup_db().await;
        let repo = DieselCatalogRepository::new(pool);

        let cabin_id = repo
            .insert_cabin("Lakeside", BigDecimal::from_str("120.50").unwrap())
            .expect("insert cabin");
        let service_id = repo
            .insert_service("Sauna", BigDecimal::from_str("20").unwrap())
            .expect("insert service");
        let user_id = repo.insert_user("alice").expect("insert user");

        let cabin = repo.find_cabin(cabin_id).unwrap().expect("cabin exists");
        assert_eq!(cabin.name, "Lakeside");
        assert_eq!(cabin.price_per_night, BigDecimal::from_str("120.50").unwrap());

        let service = repo.find_service(service_id).unwrap().expect("service exists");
        assert_eq!(service.name, "Sauna");

        assert!(repo.user_exists(user_id).unwrap());
        assert!(!repo.user_exists(Uuid::new_v4()).unwrap());
        assert!(repo.find_cabin(Uuid::new_v4()).unwrap().is_none());
    }
}
