use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use order_composer::{build_server, Backend, Config, HttpBackend, SessionRegistry, SessionSettings};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let backend = HttpBackend::new(config.backend_url.clone(), config.backend_timeout)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let registry = Arc::new(SessionRegistry::new(
        Backend::shared(Arc::new(backend)),
        SessionSettings {
            debounce: config.debounce,
            idle_timeout: config.session_idle,
        },
    ));

    log::info!(
        "Starting server at http://{}:{} (backend {}, debounce {:?})",
        config.host,
        config.port,
        config.backend_url,
        config.debounce
    );

    build_server(registry, &config.host, config.port)?.await
}
