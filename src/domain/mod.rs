pub mod catalog;
pub mod errors;
pub mod invoice;
pub mod ports;
pub mod reservation;
