pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post, put},
    Json, Router,
};
use service_core::middleware::{
    metrics::metrics_middleware,
    rate_limit::{ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{openapi::security::SecurityScheme, Modify, OpenApi};

use crate::config::FlashcardConfig;
use crate::services::{
    providers::TextProvider, AuthService, ContentExtractor, DeckService, FlashcardGenerator,
    JwtService, MongoDb, QuizService,
};

/// Headroom for multipart framing and the text fields around the file.
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health_check,
        handlers::auth::signup,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::me,
        handlers::user::update_me,
        handlers::decks::list_decks,
        handlers::decks::create_deck,
        handlers::decks::get_deck,
        handlers::decks::update_deck,
        handlers::decks::delete_deck,
        handlers::cards::add_card,
        handlers::cards::update_card,
        handlers::cards::delete_card,
        handlers::cards::review_card,
        handlers::cards::record_session,
        handlers::upload::process_upload,
        handlers::upload::upload_text,
        handlers::quiz::generate_quiz,
        handlers::quiz::complete_quiz,
        handlers::dashboard::dashboard,
    ),
    components(
        schemas(
            dtos::ErrorResponse,
            dtos::MessageResponse,
            dtos::auth::SignupRequest,
            dtos::auth::LoginRequest,
            dtos::auth::AuthResponse,
            dtos::auth::UpdateProfileRequest,
            dtos::decks::CardRequest,
            dtos::decks::UpdateCardRequest,
            dtos::decks::CreateDeckRequest,
            dtos::decks::UpdateDeckRequest,
            dtos::decks::ReviewRequest,
            dtos::decks::StudySessionRequest,
            dtos::decks::CardResponse,
            dtos::decks::CardSummary,
            dtos::decks::DeckResponse,
            dtos::decks::DeckSummary,
            dtos::decks::ReviewResponse,
            dtos::upload::TextUploadRequest,
            dtos::upload::UploadResponse,
            dtos::upload::FileUploadForm,
            dtos::quiz::QuizType,
            dtos::quiz::QuestionType,
            dtos::quiz::QuizQuestion,
            dtos::quiz::QuizResponse,
            dtos::quiz::QuizAnswer,
            dtos::quiz::CompleteQuizRequest,
            dtos::quiz::CompleteQuizResponse,
            dtos::dashboard::DashboardStats,
            dtos::dashboard::RecentDeck,
            dtos::dashboard::DashboardResponse,
            models::SanitizedUser,
            models::Difficulty,
            models::DeckStats,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Signup, login and session management"),
        (name = "User", description = "User profile management"),
        (name = "Decks", description = "Flashcard decks"),
        (name = "Cards", description = "Cards and spaced-repetition reviews"),
        (name = "Upload", description = "AI flashcard generation from files and text"),
        (name = "Quiz", description = "AI quizzes, XP and badges"),
        (name = "Dashboard", description = "Study statistics"),
        (name = "Observability", description = "Service health and monitoring"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: FlashcardConfig,
    pub db: MongoDb,
    pub jwt: JwtService,
    pub provider: Arc<dyn TextProvider>,
    pub auth_service: AuthService,
    pub deck_service: DeckService,
    pub quiz_service: QuizService,
    pub generator: FlashcardGenerator,
    pub extractor: ContentExtractor,
    pub auth_rate_limiter: IpRateLimiter,
    pub ip_rate_limiter: IpRateLimiter,
}

pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/signup", post(handlers::auth::signup))
        .route("/auth/login", post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.auth_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let upload_routes = Router::new()
        .route("/upload/process", post(handlers::upload::process_upload))
        .route("/upload/text", post(handlers::upload::upload_text))
        .layer(DefaultBodyLimit::max(
            state.config.upload.max_bytes + MULTIPART_OVERHEAD_BYTES,
        ));

    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::me))
        .route("/users/me", patch(handlers::user::update_me))
        .route(
            "/decks",
            get(handlers::decks::list_decks).post(handlers::decks::create_deck),
        )
        .route(
            "/decks/:deck_id",
            get(handlers::decks::get_deck)
                .put(handlers::decks::update_deck)
                .delete(handlers::decks::delete_deck),
        )
        .route("/decks/:deck_id/cards", post(handlers::cards::add_card))
        .route(
            "/decks/:deck_id/cards/:card_id",
            put(handlers::cards::update_card).delete(handlers::cards::delete_card),
        )
        .route(
            "/decks/:deck_id/cards/:card_id/review",
            post(handlers::cards::review_card),
        )
        .route(
            "/decks/:deck_id/sessions",
            post(handlers::cards::record_session),
        )
        .route("/quiz/generate", get(handlers::quiz::generate_quiz))
        .route("/quiz/complete", post(handlers::quiz::complete_quiz))
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .merge(upload_routes)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let allowed_origins: Vec<HeaderValue> = state
        .config
        .security
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::metrics))
        .route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .route("/auth/logout", post(handlers::auth::logout))
        .merge(auth_routes)
        .merge(protected_routes)
        .with_state(state.clone())
        // Global IP rate limiting
        .layer(from_fn_with_state(
            state.ip_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ))
        .layer(from_fn(metrics_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_credentials(true)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::PATCH,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        )
}
