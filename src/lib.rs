pub mod api_doc;
pub mod application;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod state;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use config::Settings;
pub use db::{create_pool, DbPool};
pub use state::AppState;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut conn = pool.get()?;
    let applied = conn.run_pending_migrations(MIGRATIONS)?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Registers the reservation and invoice routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    use handlers::{invoices, reservations};

    cfg.service(
        web::scope("/reservations")
            .route("", web::post().to(reservations::create_reservation))
            .route("", web::get().to(reservations::list_reservations))
            .route("/{id}", web::get().to(reservations::get_reservation))
            .route("/{id}/quote", web::get().to(reservations::quote))
            .route(
                "/{id}/services/{service_id}",
                web::put().to(reservations::attach_service),
            )
            .route(
                "/{id}/services/{service_id}",
                web::delete().to(reservations::detach_service),
            )
            .route("/{id}/accept", web::post().to(reservations::accept_reservation))
            .route("/{id}/cancel", web::post().to(reservations::cancel_reservation))
            .route("/{id}/invoices", web::post().to(invoices::create_invoice))
            .route(
                "/{id}/invoices",
                web::get().to(invoices::list_reservation_invoices),
            ),
    )
    .service(
        web::scope("/invoices")
            .route("/{id}", web::get().to(invoices::get_invoice))
            .route("/{id}/pay", web::post().to(invoices::pay_invoice))
            .route("/{id}/cancel", web::post().to(invoices::cancel_invoice))
            .route("/{id}/document", web::get().to(invoices::invoice_document)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(AppState::from_pool(pool));
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", api_doc::ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
