use actix_web::{web, App, HttpServer};
use backend::config::{GameConfig, ProviderKeys, ServerConfig};
use backend::middleware::cors::cors_middleware;
use backend::middleware::request_trace::RequestTrace;
use backend::middleware::structured_logger::StructuredLogger;
use backend::state::build_state;
use backend::{routes, telemetry};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables must be set by the runtime environment
    // (docker env_file, or `set -a; . ./.env; set +a` locally).
    let (server, game) = match (ServerConfig::from_env(), GameConfig::from_env()) {
        (Ok(server), Ok(game)) => (server, game),
        (Err(e), _) | (_, Err(e)) => {
            error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let app_state = match build_state()
        .with_config(game)
        .with_keys(ProviderKeys::from_env())
        .build()
    {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "failed to build application state");
            std::process::exit(1);
        }
    };

    let (host, port) = server.bind_addr();
    info!(host = %host, port, "starting beer game backend");

    let data = web::Data::new(app_state);
    let origins = server.cors_allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&origins))
            .wrap(StructuredLogger)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
