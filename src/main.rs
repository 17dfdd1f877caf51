use std::sync::Arc;

use folio::{
    application::{
        activities::ActivityService,
        auth::AuthService,
        effects::WriteEffects,
        error::AppError,
        notifications::NotificationService,
        portfolio::PortfolioService,
        repos::{ActivitiesRepo, NotificationsRepo, PortfolioRepo, RoadmapsRepo, SkillsRepo, UsersRepo},
        roadmaps::RoadmapService,
        skills::SkillService,
    },
    cache::{CacheStore, CachedReads},
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
    realtime::EventBroker,
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        std::process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(config::ServeArgs::default()));

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let database_url = settings
        .database
        .url
        .as_ref()
        .ok_or_else(|| InfraError::configuration("database url is not configured"))
        .map_err(AppError::from)?;

    let pool =
        PostgresRepositories::connect(database_url, settings.database.max_connections.get())
            .await
            .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    let repositories = Arc::new(PostgresRepositories::new(pool));

    // Process-wide service objects; everything downstream receives handles.
    let cache = Arc::new(CacheStore::new(&settings.cache));
    let broker = Arc::new(EventBroker::new(settings.realtime.clone()));
    let reads = CachedReads::new(cache.clone(), settings.cache.clone());
    let effects = WriteEffects::new(cache, broker.clone());

    let portfolio_repo: Arc<dyn PortfolioRepo> = repositories.clone();
    let skills_repo: Arc<dyn SkillsRepo> = repositories.clone();
    let roadmaps_repo: Arc<dyn RoadmapsRepo> = repositories.clone();
    let notifications_repo: Arc<dyn NotificationsRepo> = repositories.clone();
    let activities_repo: Arc<dyn ActivitiesRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();

    let state = AppState {
        portfolio: PortfolioService::new(portfolio_repo, reads.clone(), effects.clone()),
        skills: SkillService::new(
            skills_repo,
            notifications_repo.clone(),
            reads.clone(),
            effects.clone(),
        ),
        roadmaps: RoadmapService::new(roadmaps_repo, reads.clone(), effects.clone()),
        notifications: NotificationService::new(
            notifications_repo,
            reads.clone(),
            effects.clone(),
        ),
        activities: ActivityService::new(activities_repo, reads, effects),
        auth: AuthService::new(users_repo),
        broker: broker.clone(),
        realtime: settings.realtime.clone(),
        db: repositories,
    };

    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(addr = %settings.server.addr, "folio listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    // Closing subscribers ends their streams so the graceful drain finishes.
    broker.shutdown();
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
}
