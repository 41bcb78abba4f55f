use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::errors::DomainError;
use crate::domain::invoice::{Invoice, NewInvoice};
use crate::domain::ports::InvoiceRepository;
use crate::schema::invoices;

use super::models::{InvoiceRow, NewInvoiceRow};

impl From<InvoiceRow> for Invoice {
    fn from(row: InvoiceRow) -> Self {
        Invoice {
            id: row.id,
            reservation_id: row.reservation_id,
            issued_total: row.issued_total,
            created_at: row.created_at,
            paid_at: row.paid_at,
            canceled_at: row.canceled_at,
        }
    }
}

pub struct DieselInvoiceRepository {
    pool: DbPool,
}

impl DieselInvoiceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

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
            diesel::select(diesel::dsl::exists(invoices::table.find(id))).get_result(conn)?;
        if exists {
            Err(DomainError::Conflict(format!("invoice {} is {}", id, conflict)))
        } else {
            Err(DomainError::NotFound)
        }
    }
}

impl InvoiceRepository for DieselInvoiceRepository {
    fn create(&self, invoice: NewInvoice) -> Result<Uuid, DomainError> {
        let mut conn = self.pool.get()?;
        let id = Uuid::new_v4();
        diesel::insert_into(invoices::table)
            .values(&NewInvoiceRow {
                id,
                reservation_id: invoice.reservation_id,
                issued_total: invoice.issued_total,
            })
            .execute(&mut conn)?;
        log::debug!("Inserted invoice {} for reservation {}", id, invoice.reservation_id);
        Ok(id)
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<Invoice>, DomainError> {
        let mut conn = self.pool.get()?;
        let row = invoices::table
            .find(id)
            .select(InvoiceRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(row.map(Invoice::from))
    }

    fn list_for_reservation(&self, reservation_id: Uuid) -> Result<Vec<Invoice>, DomainError> {
        let mut conn = self.pool.get()?;
        let rows = invoices::table
            .filter(invoices::reservation_id.eq(reservation_id))
            .order(invoices::created_at.asc())
            .select(InvoiceRow::as_select())
            .load(&mut conn)?;
        Ok(rows.into_iter().map(Invoice::from).collect())
    }

    fn mark_paid(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let updated =
            diesel::update(invoices::table.find(id).filter(invoices::paid_at.is_null()))
                .set(invoices::paid_at.eq(Some(at)))
                .execute(&mut conn)?;
        Self::settle_stamp(&mut conn, id, updated, "already paid")
    }

    fn mark_canceled(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        let updated =
            diesel::update(invoices::table.find(id).filter(invoices::canceled_at.is_null()))
                .set(invoices::canceled_at.eq(Some(at)))
                .execute(&mut conn)?;
        Self::settle_stamp(&mut conn, id, updated, "already canceled")
    }
}
