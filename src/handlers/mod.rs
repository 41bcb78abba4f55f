pub mod invoices;
pub mod reservations;
