use axum::{
    middleware,
    response::Redirect,
    routing::{get, get_service, post},
    Router,
};
use dotenvy::dotenv;
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use portal::config::Config;
use portal::database::schema;
use portal::state::AppState;
use portal::web::middleware::auth as auth_middleware;
use portal::web::routes::{activities, activity, api, auth, participation};

#[tokio::main]
async fn main() {
    // Load .env file
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();

    // 2. Connect to the database
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set in .env");
    println!("Connecting to database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .connect(&db_url)
        .await
        .expect("Cannot connect to DB");

    schema::init(&pool).await.expect("Cannot initialize schema");

    let config = Config::load();
    let state = AppState::new(pool, config.clone());

    // 3. Protected routes under one middleware layer
    let protected_routes = Router::new()
        .route("/activities", get(activities::activities_handler))
        .route(
            "/activities/:activity_id",
            get(activity::activity_detail_handler),
        )
        .route(
            "/activities/:activity_id/otp",
            post(participation::generate_otp_handler),
        )
        .route(
            "/activities/:activity_id/verify",
            get(participation::verify_otp_page).post(participation::verify_otp_handler),
        )
        .route(
            "/activities/:activity_id/participation",
            get(participation::participation_form_handler)
                .post(participation::submit_participation_handler),
        )
        .route(
            "/activities/:activity_id/participants",
            get(participation::participant_list_handler),
        )
        .route(
            "/api/v1/activities/:activity_id/otp",
            post(api::generate_otp_api),
        )
        .route("/api/v1/otp/verify", post(api::verify_otp_api))
        .route("/api/v1/participations", get(api::list_participations_api))
        .route("/logout", post(auth::logout_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    // 4. Build the whole application
    let app = Router::new()
        // Public routes
        .route("/", get(|| async { Redirect::to("/activities") }))
        .route("/login", get(auth::login_page).post(auth::login_handler))
        // Protected routes
        .merge(protected_routes)
        // Static files and uploaded photos
        .nest_service(
            "/assets",
            get_service(ServeDir::new("assets")).layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        )
        .nest_service("/media", get_service(ServeDir::new(config.media_root.clone())))
        // Layers
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        // State
        .with_state(state);

    // 5. Start the server (with fallback port)
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Cannot parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "⚠️  Could not bind on {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("Cannot parse fallback");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Cannot bind on fallback port")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    println!("🚀 Server running on http://{}", bound_addr);
    println!("📍 Go to http://{}/login to get started", bound_addr);

    axum::serve(listener, app).await.unwrap();
}
