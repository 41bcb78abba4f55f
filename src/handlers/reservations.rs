use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::application::ReservationRequest;
use crate::domain::reservation::{PriceBreakdown, Reservation};
use crate::errors::AppError;
use crate::state::AppState;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    pub cabin_id: Uuid,
    pub customer_id: Uuid,
    pub owner_id: Uuid,
    /// First night, `YYYY-MM-DD`
    pub start_date: NaiveDate,
    /// Departure day, `YYYY-MM-DD`; must not be before `start_date`
    pub end_date: NaiveDate,
    #[serde(default)]
    pub service_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceLineResponse {
    pub name: String,
    /// Decimal amount as a string, e.g. "20.00"
    pub price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PriceBreakdownResponse {
    pub length_of_stay: i64,
    pub price_per_night: String,
    pub total_cabin_price: String,
    pub total_services_price: String,
    pub total_price: String,
    pub services: Vec<ServiceLineResponse>,
}

impl From<PriceBreakdown> for PriceBreakdownResponse {
    fn from(b: PriceBreakdown) -> Self {
        Self {
            length_of_stay: b.length_of_stay,
            price_per_night: b.price_per_night.to_string(),
            total_cabin_price: b.total_cabin_price.to_string(),
            total_services_price: b.total_services_price.to_string(),
            total_price: b.total_price.to_string(),
            services: b
                .services
                .into_iter()
                .map(|(name, price)| ServiceLineResponse {
                    name,
                    price: price.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub cabin_id: Uuid,
    pub cabin_name: String,
    pub customer_id: Uuid,
    pub owner_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// PENDING, ACCEPTED or CANCELED
    pub status: String,
    pub created_at: String,
    pub accepted_at: Option<String>,
    pub canceled_at: Option<String>,
    pub pricing: PriceBreakdownResponse,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            cabin_id: r.cabin.id,
            cabin_name: r.cabin.name.clone(),
            customer_id: r.customer_id,
            owner_id: r.owner_id,
            start_date: r.stay.start_date(),
            end_date: r.stay.end_date(),
            status: r.status().as_str().to_string(),
            created_at: r.created_at.to_rfc3339(),
            accepted_at: r.accepted_at.map(|t| t.to_rfc3339()),
            canceled_at: r.canceled_at.map(|t| t.to_rfc3339()),
            pricing: r.price_breakdown().into(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListReservationsParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListReservationsResponse {
    pub items: Vec<ReservationResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /reservations
///
/// Books a cabin. The reservation and its initial services are written in a
/// single transaction.
#[utoipa::path(
    post,
    path = "/reservations",
    request_body = CreateReservationRequest,
    responses(
        (status = 201, description = "Reservation created", body = CreatedResponse),
        (status = 400, description = "Invalid dates or unknown cabin, user or service"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reservations"
)]
pub async fn create_reservation(
    state: web::Data<AppState>,
    body: web::Json<CreateReservationRequest>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let request = ReservationRequest {
        cabin_id: body.cabin_id,
        customer_id: body.customer_id,
        owner_id: body.owner_id,
        start_date: body.start_date,
        end_date: body.end_date,
        service_ids: body.service_ids,
    };

    let id = web::block(move || state.reservations.create_reservation(request)).await??;

    Ok(HttpResponse::Created().json(json!({ "id": id })))
}

/// GET /reservations
///
/// Returns a paginated list of reservations, newest first.
#[utoipa::path(
    get,
    path = "/reservations",
    params(ListReservationsParams),
    responses(
        (status = 200, description = "Paginated list of reservations", body = ListReservationsResponse),
        (status = 400, description = "Page out of range"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reservations"
)]
pub async fn list_reservations(
    state: web::Data<AppState>,
    query: web::Query<ListReservationsParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let result = web::block(move || state.reservations.list_reservations(page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListReservationsResponse {
        items: result.items.into_iter().map(Into::into).collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// GET /reservations/{id}
#[utoipa::path(
    get,
    path = "/reservations/{id}",
    params(("id" = Uuid, Path, description = "Reservation UUID")),
    responses(
        (status = 200, description = "Reservation found", body = ReservationResponse),
        (status = 404, description = "Reservation not found"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "reservations"
)]
pub async fn get_reservation(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let reservation = web::block(move || state.reservations.get_reservation(id)).await??;

    match reservation {
        Some(reservation) => Ok(HttpResponse::Ok().json(ReservationResponse::from(reservation))),
        None => Err(AppError::NotFound),
    }
}

/// GET /reservations/{id}/quote
///
/// Prices the reservation from the current cabin and service data.
#[utoipa::path(
    get,
    path = "/reservations/{id}/quote",
    params(("id" = Uuid, Path, description = "Reservation UUID")),
    responses(
        (status = 200, description = "Current price breakdown", body = PriceBreakdownResponse),
        (status = 404, description = "Reservation not found"),
    ),
    tag = "reservations"
)]
pub async fn quote(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let breakdown = web::block(move || state.reservations.quote(id)).await??;

    Ok(HttpResponse::Ok().json(PriceBreakdownResponse::from(breakdown)))
}

/// PUT /reservations/{id}/services/{service_id}
#[utoipa::path(
    put,
    path = "/reservations/{id}/services/{service_id}",
    params(
        ("id" = Uuid, Path, description = "Reservation UUID"),
        ("service_id" = Uuid, Path, description = "Service UUID"),
    ),
    responses(
        (status = 204, description = "Service linked"),
        (status = 400, description = "Unknown service"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation is canceled"),
    ),
    tag = "reservations"
)]
pub async fn attach_service(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (id, service_id) = path.into_inner();

    web::block(move || state.reservations.attach_service(id, service_id)).await??;

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /reservations/{id}/services/{service_id}
#[utoipa::path(
    delete,
    path = "/reservations/{id}/services/{service_id}",
    params(
        ("id" = Uuid, Path, description = "Reservation UUID"),
        ("service_id" = Uuid, Path, description = "Service UUID"),
    ),
    responses(
        (status = 204, description = "Service unlinked"),
        (status = 404, description = "Reservation not found or service not linked"),
        (status = 409, description = "Reservation is canceled"),
    ),
    tag = "reservations"
)]
pub async fn detach_service(
    state: web::Data<AppState>,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (id, service_id) = path.into_inner();

    web::block(move || state.reservations.detach_service(id, service_id)).await??;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /reservations/{id}/accept
#[utoipa::path(
    post,
    path = "/reservations/{id}/accept",
    params(("id" = Uuid, Path, description = "Reservation UUID")),
    responses(
        (status = 200, description = "Reservation accepted", body = ReservationResponse),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Already accepted or canceled"),
    ),
    tag = "reservations"
)]
pub async fn accept_reservation(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let reservation = web::block(move || state.reservations.accept(id)).await??;

    Ok(HttpResponse::Ok().json(ReservationResponse::from(reservation)))
}

/// POST /reservations/{id}/cancel
#[utoipa::path(
    post,
    path = "/reservations/{id}/cancel",
    params(("id" = Uuid, Path, description = "Reservation UUID")),
    responses(
        (status = 200, description = "Reservation canceled", body = ReservationResponse),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Already canceled"),
    ),
    tag = "reservations"
)]
pub async fn cancel_reservation(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let reservation = web::block(move || state.reservations.cancel(id)).await??;

    Ok(HttpResponse::Ok().json(ReservationResponse::from(reservation)))
}
