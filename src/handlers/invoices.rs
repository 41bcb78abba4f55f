use actix_web::{web, HttpResponse};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::invoice::{Invoice, InvoiceDocument, InvoiceView};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub reservation_id: Uuid,
    /// Human-readable label of the billed reservation
    pub label: String,
    /// Total at the time the invoice was issued
    pub issued_total: String,
    /// Total recomputed from the reservation's current state
    pub total_price: String,
    pub created_at: String,
    pub paid_at: Option<String>,
    pub canceled_at: Option<String>,
}

impl From<InvoiceView> for InvoiceResponse {
    fn from(view: InvoiceView) -> Self {
        let label = view.to_string();
        let total_price = view.total_price().to_string();
        let invoice = view.invoice;
        Self {
            id: invoice.id,
            reservation_id: invoice.reservation_id,
            label,
            issued_total: invoice.issued_total.to_string(),
            total_price,
            created_at: invoice.created_at.to_rfc3339(),
            paid_at: invoice.paid_at.map(|t| t.to_rfc3339()),
            canceled_at: invoice.canceled_at.map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InvoiceSummaryResponse {
    pub id: Uuid,
    pub issued_total: String,
    pub created_at: String,
    pub paid_at: Option<String>,
    pub canceled_at: Option<String>,
}

impl From<Invoice> for InvoiceSummaryResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            issued_total: invoice.issued_total.to_string(),
            created_at: invoice.created_at.to_rfc3339(),
            paid_at: invoice.paid_at.map(|t| t.to_rfc3339()),
            canceled_at: invoice.canceled_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// POST /reservations/{id}/invoices
///
/// Issues an invoice for the reservation, recording its current total.
#[utoipa::path(
    post,
    path = "/reservations/{id}/invoices",
    params(("id" = Uuid, Path, description = "Reservation UUID")),
    responses(
        (status = 201, description = "Invoice created", body = crate::handlers::reservations::CreatedResponse),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is canceled"),
    ),
    tag = "invoices"
)]
pub async fn create_invoice(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let reservation_id = path.into_inner();

    let id = web::block(move || state.invoices.create_invoice(reservation_id)).await??;

    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

/// GET /reservations/{id}/invoices
#[utoipa::path(
    get,
    path = "/reservations/{id}/invoices",
    params(("id" = Uuid, Path, description = "Reservation UUID")),
    responses(
        (status = 200, description = "Invoices issued for the reservation", body = [InvoiceSummaryResponse]),
        (status = 404, description = "Reservation not found"),
    ),
    tag = "invoices"
)]
pub async fn list_reservation_invoices(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let reservation_id = path.into_inner();

    let invoices =
        web::block(move || state.invoices.invoices_for_reservation(reservation_id)).await??;

    let body: Vec<InvoiceSummaryResponse> = invoices.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /invoices/{id}
#[utoipa::path(
    get,
    path = "/invoices/{id}",
    params(("id" = Uuid, Path, description = "Invoice UUID")),
    responses(
        (status = 200, description = "Invoice found", body = InvoiceResponse),
        (status = 404, description = "Invoice not found"),
    ),
    tag = "invoices"
)]
pub async fn get_invoice(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let view = web::block(move || state.invoices.get_invoice(id)).await??;

    match view {
        Some(view) => Ok(HttpResponse::Ok().json(InvoiceResponse::from(view))),
        None => Err(AppError::NotFound),
    }
}

/// POST /invoices/{id}/pay
#[utoipa::path(
    post,
    path = "/invoices/{id}/pay",
    params(("id" = Uuid, Path, description = "Invoice UUID")),
    responses(
        (status = 200, description = "Invoice marked as paid", body = InvoiceResponse),
        (status = 404, description = "Invoice not found"),
        (status = 409, description = "Invoice already paid"),
    ),
    tag = "invoices"
)]
pub async fn pay_invoice(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let view = web::block(move || state.invoices.mark_paid(id)).await??;

    Ok(HttpResponse::Ok().json(InvoiceResponse::from(view)))
}

/// POST /invoices/{id}/cancel
#[utoipa::path(
    post,
    path = "/invoices/{id}/cancel",
    params(("id" = Uuid, Path, description = "Invoice UUID")),
    responses(
        (status = 200, description = "Invoice canceled", body = InvoiceResponse),
        (status = 404, description = "Invoice not found"),
        (status = 409, description = "Invoice already canceled"),
    ),
    tag = "invoices"
)]
pub async fn cancel_invoice(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let view = web::block(move || state.invoices.cancel(id)).await??;

    Ok(HttpResponse::Ok().json(InvoiceResponse::from(view)))
}

/// GET /invoices/{id}/document
///
/// Returns the printable invoice. Rendering is not available yet, so this
/// answers 204 No Content for every existing invoice.
#[utoipa::path(
    get,
    path = "/invoices/{id}/document",
    params(("id" = Uuid, Path, description = "Invoice UUID")),
    responses(
        (status = 200, description = "Rendered invoice (application/pdf)"),
        (status = 204, description = "No document available"),
        (status = 404, description = "Invoice not found"),
    ),
    tag = "invoices"
)]
pub async fn invoice_document(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let document = web::block(move || state.invoices.document(id)).await??;

    if document.is_empty() {
        return Ok(HttpResponse::NoContent().finish());
    }
    Ok(HttpResponse::Ok()
        .content_type(InvoiceDocument::CONTENT_TYPE)
        .body(document.into_bytes()))
}
