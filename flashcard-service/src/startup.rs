use crate::config::{FlashcardConfig, ProviderKind};
use crate::services::{
    providers::{GeminiConfig, GeminiTextProvider, MockTextProvider, TextProvider},
    AuthService, ContentExtractor, DeckService, FlashcardGenerator, JwtService, MongoDb,
    QuizService,
};
use crate::{build_router, AppState};
use axum::Router;
use service_core::error::AppError;
use service_core::middleware::rate_limit::{create_ip_rate_limiter, spawn_rate_limiter_cleanup};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

const RATE_LIMIT_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    state: AppState,
    limiter_cleanup: JoinHandle<()>,
}

impl Application {
    /// Builds the app with the AI provider selected by `GENAI_PROVIDER`.
    pub async fn build(config: FlashcardConfig) -> Result<Self, AppError> {
        let provider = text_provider(&config)?;
        Self::build_with_provider(config, provider).await
    }

    pub async fn build_with_provider(
        config: FlashcardConfig,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        let db = MongoDb::connect(&config.mongodb.uri, &config.mongodb.database)
            .await
            .map_err(|e| {
                tracing::error!("Failed to connect to MongoDB: {}", e);
                e
            })?;
        db.initialize_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;

        let extractor = ContentExtractor::new(
            provider.clone(),
            Duration::from_secs(config.extraction.command_timeout_seconds),
        );

        let state = AppState {
            config: config.clone(),
            db: db.clone(),
            jwt: jwt.clone(),
            provider: provider.clone(),
            auth_service: AuthService::new(db.clone(), jwt),
            deck_service: DeckService::new(db.clone()),
            quiz_service: QuizService::new(db, provider.clone()),
            generator: FlashcardGenerator::new(provider.clone()),
            extractor,
            auth_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.auth_attempts,
                config.rate_limit.auth_window_seconds,
            ),
            ip_rate_limiter: create_ip_rate_limiter(
                config.rate_limit.global_ip_limit,
                config.rate_limit.global_ip_window_seconds,
            ),
        };

        let limiter_cleanup = spawn_rate_limiter_cleanup(
            vec![
                state.auth_rate_limiter.clone(),
                state.ip_rate_limiter.clone(),
            ],
            RATE_LIMIT_PRUNE_INTERVAL,
        );

        let router = build_router(state.clone());

        let addr = config.common.socket_addr();
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!(
            port,
            provider = provider.name(),
            environment = ?config.environment,
            "Listening on {}",
            port
        );

        Ok(Self {
            port,
            listener,
            router,
            state,
            limiter_cleanup,
        })
    }

    pub fn db(&self) -> &MongoDb {
        &self.state.db
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Serves until `signal` resolves, then drains in-flight requests.
    pub async fn run_until<F>(self, signal: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let result = axum::serve(
            self.listener,
            self.router
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(signal)
        .await;

        self.limiter_cleanup.abort();
        result
    }
}

fn text_provider(config: &FlashcardConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    match config.genai.provider {
        ProviderKind::Gemini => {
            let provider = GeminiTextProvider::new(GeminiConfig {
                api_key: config.genai.api_key.clone(),
                model: config.genai.text_model.clone(),
            })
            .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;
            Ok(Arc::new(provider))
        }
        ProviderKind::Mock => {
            tracing::warn!("Using mock AI provider; generated content is placeholder text");
            Ok(Arc::new(MockTextProvider::new(true)))
        }
    }
}
