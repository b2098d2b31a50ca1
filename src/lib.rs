pub mod application;
pub mod config;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub use application::registry::SessionRegistry;
pub use application::session::SessionSettings;
pub use config::Config;
pub use domain::ports::Backend;
pub use infrastructure::HttpBackend;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::sessions::open_session,
        handlers::sessions::get_session,
        handlers::sessions::get_catalog,
        handlers::sessions::apply_edit,
        handlers::sessions::submit_session,
        handlers::sessions::close_session,
    ),
    tags((name = "sessions", description = "Order composition with live line-item pricing"))
)]
pub struct ApiDoc;

/// Register the session routes on an actix app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/sessions")
            .route("", web::post().to(handlers::sessions::open_session))
            .route("/{id}", web::get().to(handlers::sessions::get_session))
            .route("/{id}", web::delete().to(handlers::sessions::close_session))
            .route("/{id}/catalog", web::get().to(handlers::sessions::get_catalog))
            .route("/{id}/edits", web::post().to(handlers::sessions::apply_edit))
            .route("/{id}/submit", web::post().to(handlers::sessions::submit_session)),
    );
}

/// Build and return an actix-web `Server` bound to `host:port`.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    registry: Arc<SessionRegistry>,
    host: &str,
    port: u16,
) -> std::io::Result<actix_web::dev::Server> {
    let registry = web::Data::from(registry);
    Ok(HttpServer::new(move || {
        App::new()
            .app_data(registry.clone())
            .wrap(Logger::default())
            .configure(configure)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind((host.to_string(), port))?
    .run())
}
