//! edumatch server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use edumatch_api::{app, AppState};
use edumatch_common::{AppError, Config, JsonCache};
use edumatch_core::{
    AccountService, ActivityService, FeedbackService, NotificationService, OwnershipGuard,
    RecommendationService, StudentService, TeacherService,
};
use edumatch_db::repositories::{
    ActivityRepository, FeedbackRepository, NotificationRepository, RecommendationRepository,
    StudentRepository, TeacherRepository, UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn cors_layer(config: &Config) -> Result<CorsLayer, AppError> {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match config.server.cors_origin.as_deref() {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin)
                .map_err(|e| AppError::Config(format!("Invalid CORS origin: {e}")))?;
            Ok(layer.allow_origin(origin))
        }
        None => Ok(layer.allow_origin(Any)),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "edumatch=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting edumatch server...");

    let config = Config::load()?;

    let db = Arc::new(edumatch_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    edumatch_db::migrate(&db).await?;
    info!("Migrations completed");

    // Catalog cache is optional
    let cache = match config.cache.redis_url.as_deref() {
        Some(url) => match JsonCache::connect(
            url,
            config.cache.prefix.clone(),
            config.cache.ttl_secs,
        )
        .await
        {
            Ok(cache) => {
                info!("Connected to Redis catalog cache");
                Some(cache)
            }
            Err(e) => {
                warn!(error = %e, "Redis unavailable, serving catalog without cache");
                None
            }
        },
        None => None,
    };

    // Initialize repositories
    let user_repo = UserRepository::new(Arc::clone(&db));
    let teacher_repo = TeacherRepository::new(Arc::clone(&db));
    let student_repo = StudentRepository::new(Arc::clone(&db));
    let activity_repo = ActivityRepository::new(Arc::clone(&db));
    let recommendation_repo = RecommendationRepository::new(Arc::clone(&db));
    let feedback_repo = FeedbackRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Initialize services
    let guard = OwnershipGuard::new(student_repo.clone(), teacher_repo.clone());
    let notification_service = NotificationService::new(notification_repo);

    let mut activity_service = ActivityService::new(
        activity_repo,
        recommendation_repo.clone(),
        feedback_repo.clone(),
    );
    if let Some(cache) = cache {
        activity_service = activity_service.with_cache(cache);
    }

    let account_service = AccountService::new(
        user_repo.clone(),
        teacher_repo.clone(),
        student_repo.clone(),
    );
    let teacher_service = TeacherService::new(teacher_repo, student_repo.clone(), user_repo.clone());
    let student_service = StudentService::new(
        student_repo,
        user_repo,
        recommendation_repo.clone(),
        feedback_repo.clone(),
        notification_service.clone(),
        guard.clone(),
    );
    let recommendation_service = RecommendationService::new(
        recommendation_repo.clone(),
        feedback_repo.clone(),
        activity_service.clone(),
        guard.clone(),
    );
    let feedback_service = FeedbackService::new(feedback_repo, recommendation_repo, guard.clone());

    if let Some(admin) = account_service
        .ensure_bootstrap_admin(&config.bootstrap)
        .await?
    {
        info!(username = %admin.username, "Bootstrap admin ready");
    }

    let state = AppState {
        account_service,
        teacher_service,
        student_service,
        activity_service,
        recommendation_service,
        feedback_service,
        notification_service,
        guard,
    };

    let app = app(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    // Start server with graceful shutdown
    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
