use actix_cors::Cors;
use actix_web::http::header;

const LOCAL_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

/// Explicit-origin CORS for the admin and player front ends.
///
/// `allowed` is the raw comma-separated `CORS_ALLOWED_ORIGINS` value. Empty,
/// `null` and non-http(s) entries are ignored; with nothing valid left only
/// the local dev origins are allowed.
pub fn cors_middleware(allowed: &str) -> Cors {
    let mut origins = parse_origins(allowed);
    if origins.is_empty() {
        origins = LOCAL_ORIGINS.iter().map(|s| s.to_string()).collect();
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers(vec![
            header::HeaderName::from_static("x-trace-id"),
            header::HeaderName::from_static("x-request-id"),
        ])
        .max_age(3600);

    for origin in &origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn junk_entries_are_dropped() {
        let origins = parse_origins(" https://beer.example ,null,,ftp://x, http://localhost:5173");
        assert_eq!(
            origins,
            vec!["https://beer.example".to_string(), "http://localhost:5173".to_string()]
        );
    }
}
