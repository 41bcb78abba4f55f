use utoipa::OpenApi;

use crate::handlers::{invoices, reservations};

#[derive(OpenApi)]
#[openapi(
    paths(
        reservations::create_reservation,
        reservations::list_reservations,
        reservations::get_reservation,
        reservations::quote,
        reservations::attach_service,
        reservations::detach_service,
        reservations::accept_reservation,
        reservations::cancel_reservation,
        invoices::create_invoice,
        invoices::list_reservation_invoices,
        invoices::get_invoice,
        invoices::pay_invoice,
        invoices::cancel_invoice,
        invoices::invoice_document,
    ),
    components(schemas(
        reservations::CreateReservationRequest,
        reservations::CreatedResponse,
        reservations::ServiceLineResponse,
        reservations::PriceBreakdownResponse,
        reservations::ReservationResponse,
        reservations::ListReservationsResponse,
        invoices::InvoiceResponse,
        invoices::InvoiceSummaryResponse,
    )),
    tags(
        (name = "reservations", description = "Cabin bookings and their pricing"),
        (name = "invoices", description = "Billing records issued for reservations"),
    )
)]
pub struct ApiDoc;
