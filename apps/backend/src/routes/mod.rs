use actix_web::web;

pub mod admin;
pub mod health;
pub mod realtime;

/// All application routes. `main.rs` adds the middleware stack around these.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(health::root));

    // Health check: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Admin control surface: /api/admin/**
    cfg.service(web::scope("/api/admin").configure(admin::configure_routes));

    // Websocket endpoint: /api/ws
    cfg.service(web::scope("/api/ws").configure(realtime::configure_routes));
}
