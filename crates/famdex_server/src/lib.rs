//! HTTP server wiring for Famdex (API, handlers, and shared state).

/// Admin session check for mutation endpoints.
pub mod auth;
/// Client identity derivation for admission control.
pub mod client_ip;
/// HTTP error mapping for API handlers.
pub mod error;
/// HTTP handlers for catalog endpoints.
pub mod handlers;

pub use error::HttpError;
pub use famdex_core::{
    cache, config, db, media, models, query, ratelimit, search, AppError, Config, Database,
    ListingCache, RateLimiter, SearchService,
};

use axum::{
    extract::DefaultBodyLimit,
    http::header,
    routing::{delete, get, post},
    Router,
};
use famdex_core::media::MediaStore;
use hyper::HeaderMap;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};

/// Shared state passed to HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub config: Arc<Config>,
    pub cache: Arc<ListingCache>,
    pub limiter: Arc<RateLimiter>,
    pub search: Arc<SearchService>,
    pub media: Arc<MediaStore>,
}

impl AppState {
    /// Construct shared application state.
    ///
    /// # Arguments
    /// - `config`: Loaded configuration.
    /// - `db`: Open database handle.
    ///
    /// # Returns
    /// A new [`AppState`] with its own cache and rate-limiter instances.
    pub fn new(config: Config, db: Database) -> Self {
        let db = Arc::new(db);
        let limiter = Arc::new(RateLimiter::default());
        let search = Arc::new(SearchService::new(db.clone(), limiter.clone()));
        let media = Arc::new(MediaStore::new(
            config.media_dir.clone(),
            config.media_base_url.clone(),
        ));
        Self {
            db,
            config: Arc::new(config),
            cache: Arc::new(ListingCache::default()),
            limiter,
            search,
            media,
        }
    }
}

/// Create the application router with all routes and middleware.
///
/// # Arguments
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any
///   origin.
///
/// # Returns
/// Configured `axum::Router`.
///
/// # Panics
/// Panics if static header values fail to parse (should not happen).
pub fn create_app(state: AppState, allow_public_access: bool) -> Router {
    let cors_port = state.config.port;
    create_app_with_cors_port(state, allow_public_access, cors_port)
}

/// Resolve the listener address from env var overrides and security policy.
///
/// # Arguments
/// - `config`: Server configuration containing the configured `port`.
/// - `allow_public_access`: Whether non-loopback bind targets are permitted.
///
/// # Returns
/// A validated socket address that enforces loopback when public access is
/// disabled.
pub fn resolve_bind_address(config: &Config, allow_public_access: bool) -> SocketAddr {
    let default_bind = SocketAddr::from(([127, 0, 0, 1], config.port));
    let requested = match std::env::var("BIND") {
        Ok(value) => match value.trim().parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(err) => {
                tracing::warn!(
                    "Invalid BIND='{}': {}. Falling back to {}",
                    value,
                    err,
                    default_bind
                );
                default_bind
            }
        },
        Err(_) => default_bind,
    };

    if allow_public_access || requested.ip().is_loopback() {
        return requested;
    }

    tracing::warn!(
        "Non-loopback bind {} requested without ALLOW_PUBLIC_ACCESS; forcing 127.0.0.1",
        requested
    );
    SocketAddr::from(([127, 0, 0, 1], requested.port()))
}

fn create_app_with_cors_port(state: AppState, allow_public_access: bool, cors_port: u16) -> Router {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(header::X_CONTENT_TYPE_OPTIONS, "nosniff".parse().unwrap());
    default_headers.insert(header::X_FRAME_OPTIONS, "DENY".parse().unwrap());

    // CORS - optionally allow public access
    let cors = if allow_public_access {
        CorsLayer::new()
            .allow_origin(tower_http::cors::Any)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
            ])
            .allow_headers(tower_http::cors::Any)
    } else {
        CorsLayer::new()
            .allow_origin([
                format!("http://localhost:{}", cors_port).parse().unwrap(),
                format!("http://127.0.0.1:{}", cors_port).parse().unwrap(),
            ])
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
            ])
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
    };

    Router::new()
        // Public read surface
        .route("/api/search", get(handlers::search::search_families))
        .route(
            "/api/families",
            get(handlers::family::list_families).post(handlers::family::create_family),
        )
        .route(
            "/api/families/category/:category",
            get(handlers::family::list_families_by_category),
        )
        .route(
            "/api/families/:slug",
            get(handlers::family::get_family)
                .put(handlers::family::update_family)
                .delete(handlers::family::delete_family),
        )
        .route(
            "/api/families/:slug/download",
            post(handlers::family::download_family),
        )
        // Gallery mutation surface
        .route(
            "/api/families/:slug/images",
            post(handlers::gallery::upload_image),
        )
        .route(
            "/api/families/:slug/images/:image_id",
            delete(handlers::gallery::delete_image),
        )
        .with_state(state.clone())
        .layer(
            tower::ServiceBuilder::new()
                .layer(DefaultBodyLimit::max(state.config.max_upload_size))
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(cors)
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_CONTENT_TYPE_OPTIONS,
                    default_headers
                        .get(header::X_CONTENT_TYPE_OPTIONS)
                        .unwrap()
                        .clone(),
                ))
                .layer(SetResponseHeaderLayer::overriding(
                    header::X_FRAME_OPTIONS,
                    default_headers.get(header::X_FRAME_OPTIONS).unwrap().clone(),
                )),
        )
}

fn listener_cors_port(listener: &tokio::net::TcpListener, fallback_port: u16) -> u16 {
    listener
        .local_addr()
        .map(|addr| addr.port())
        .unwrap_or(fallback_port)
}

/// Run the Axum server with graceful shutdown support.
///
/// # Arguments
/// - `listener`: Bound TCP listener for the server.
/// - `state`: Shared application state.
/// - `allow_public_access`: Whether to allow cross-origin requests from any
///   origin.
/// - `shutdown_signal`: Future that resolves when shutdown should start.
///
/// # Returns
/// `Ok(())` when the server exits cleanly.
///
/// # Errors
/// Returns any I/O error produced by `axum::serve`.
pub async fn serve_router(
    listener: tokio::net::TcpListener,
    state: AppState,
    allow_public_access: bool,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    let cors_port = listener_cors_port(&listener, state.config.port);
    let app = create_app_with_cors_port(state, allow_public_access, cors_port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
}

#[cfg(test)]
mod tests {
    use super::listener_cors_port;
    use super::resolve_bind_address;
    use famdex_core::constants::DEFAULT_PORT;
    use famdex_core::Config;
    use std::net::SocketAddr;

    fn config_with_port(port: u16) -> Config {
        Config {
            db_path: String::from("/tmp/famdex-db"),
            port,
            max_upload_size: 1024,
            admin_token: None,
            cache_ttl_secs: 3600,
            media_dir: String::from("/tmp/famdex-media"),
            media_base_url: String::from("/media"),
        }
    }

    #[tokio::test]
    async fn listener_cors_port_uses_bound_listener_port() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener");
        let expected = listener.local_addr().expect("listener addr").port();
        let resolved = listener_cors_port(&listener, DEFAULT_PORT);
        assert_eq!(resolved, expected);
    }

    // One test so BIND mutation never races a parallel test thread.
    #[test]
    fn resolve_bind_address_enforces_loopback_policy_and_fallbacks() {
        let config = config_with_port(4041);
        let loopback = resolve_bind_address(&config, false);
        assert_eq!(loopback, SocketAddr::from(([127, 0, 0, 1], 4041)));

        std::env::set_var("BIND", "0.0.0.0:4040");
        let forced = resolve_bind_address(&config, false);
        assert_eq!(forced.ip().to_string(), "127.0.0.1");
        assert_eq!(forced.port(), 4040);

        std::env::set_var("BIND", "bad:host");
        let fallback = resolve_bind_address(&config, false);
        assert_eq!(fallback, SocketAddr::from(([127, 0, 0, 1], 4041)));
        std::env::remove_var("BIND");
    }
}
