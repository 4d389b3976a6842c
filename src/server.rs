use std::{net::SocketAddr, sync::Arc};

use axum::{extract::FromRef, routing::get, Router};
use serde::Serialize;
use tera::Tera;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    analytics::services::AnalyticsService,
    authentication::JwtKeys,
    budgets::services::BudgetService,
    categories::services::CategoryService,
    cors::cors_layer,
    database::PostgresConnection,
    email::{
        clients::{ConsoleMailer, SendgridMailer},
        load_templates,
    },
    envelope::Envelope,
    expenses::services::ExpenseService,
    http_err::expose_error_details,
    identities::services::{DynEmailClient, DynRateLimiter, EmailService, UserService},
    rate_limit::{RedisRateLimiter, UnlimitedRateLimiter},
    repos::{
        BudgetRepo, CategoryRepo, EmailRepo, ExpenseRepo, NotificationRepo, PasswordResetRepo,
        UserRepo,
    },
};

pub struct Options {
    pub allowed_origins: Vec<String>,
    pub bind_address: SocketAddr,

    pub database_pool_size: u32,
    pub database_timeout_seconds: u8,
    pub database_url: String,

    /// Include error details in responses.
    pub development: bool,

    pub email_from_address: String,
    pub email_from_name: String,

    pub frontend_url: String,

    pub jwt_secret: String,
    pub jwt_lifetime_hours: i64,

    pub redis_url: Option<String>,
    pub sendgrid_key: Option<String>,
}

/// Collaborators shared by the services that are not repositories.
pub struct Collaborators {
    pub email_client: DynEmailClient,
    pub frontend_url: String,
    pub jwt_keys: JwtKeys,
    pub rate_limiter: DynRateLimiter,
    pub templates: Tera,
}

#[derive(Clone)]
pub struct AppState {
    analytics_service: AnalyticsService,
    budget_service: BudgetService,
    category_service: CategoryService,
    email_service: EmailService,
    expense_service: ExpenseService,
    jwt_keys: JwtKeys,
    user_service: UserService,
}

impl AppState {
    /// Wire every service to a single store implementing all repositories.
    pub fn new<R>(repos: R, collaborators: Collaborators) -> Self
    where
        R: BudgetRepo
            + CategoryRepo
            + EmailRepo
            + ExpenseRepo
            + NotificationRepo
            + PasswordResetRepo
            + UserRepo
            + Clone
            + Send
            + Sync
            + 'static,
    {
        let budget_service = BudgetService::new(
            Arc::new(repos.clone()),
            Arc::new(repos.clone()),
            Arc::new(repos.clone()),
            Arc::new(repos.clone()),
        );

        Self {
            analytics_service: AnalyticsService::new(
                Arc::new(repos.clone()),
                Arc::new(repos.clone()),
            ),
            category_service: CategoryService::new(Arc::new(repos.clone())),
            email_service: EmailService::new(Arc::new(repos.clone())),
            expense_service: ExpenseService::new(
                budget_service.clone(),
                Arc::new(repos.clone()),
                Arc::new(repos.clone()),
            ),
            user_service: UserService::new(
                collaborators.email_client,
                Arc::new(repos.clone()),
                collaborators.frontend_url,
                collaborators.rate_limiter,
                Arc::new(repos.clone()),
                collaborators.templates,
                Arc::new(repos),
            ),
            budget_service,
            jwt_keys: collaborators.jwt_keys,
        }
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
}

async fn health() -> Envelope<Health> {
    Envelope::data(Health { status: "OK" }).with_message("Server is running")
}

/// Build the application's routes.
pub fn router(state: AppState) -> Router {
    let auth_routes =
        crate::identities::http::routes().merge(crate::authentication::http::routes());

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/analytics", crate::analytics::http::routes())
        .nest("/budgets", crate::budgets::http::routes())
        .nest("/categories", crate::categories::http::routes())
        .nest("/dashboard", crate::analytics::http::dashboard_routes())
        .nest("/expenses", crate::expenses::http::routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(opts: Options) -> anyhow::Result<()> {
    expose_error_details(opts.development);

    let db_connection = PostgresConnection::connect(
        &opts.database_url,
        opts.database_pool_size,
        opts.database_timeout_seconds,
    )
    .await?;

    let email_client: DynEmailClient = match opts.sendgrid_key {
        Some(api_key) => {
            info!("Sending emails with SendGrid.");

            Arc::new(SendgridMailer::new(
                api_key,
                opts.email_from_address,
                opts.email_from_name,
            ))
        }
        None => {
            info!("No SendGrid key provided. Emails will be printed to stdout.");

            Arc::new(ConsoleMailer {
                from: opts.email_from_address,
            })
        }
    };

    let rate_limiter: DynRateLimiter = match &opts.redis_url {
        Some(url) => Arc::new(RedisRateLimiter::new(url)?),
        None => {
            info!("No Redis URL provided. Requests will not be rate limited.");

            Arc::new(UnlimitedRateLimiter)
        }
    };

    let collaborators = Collaborators {
        email_client,
        frontend_url: opts.frontend_url,
        jwt_keys: JwtKeys::new(
            opts.jwt_secret.as_bytes(),
            chrono::Duration::hours(opts.jwt_lifetime_hours),
        ),
        rate_limiter,
        templates: load_templates()?,
    };

    let state = AppState::new(db_connection, collaborators);
    let app = router(state).layer(cors_layer(&opts.allowed_origins)?);

    info!(address = %opts.bind_address, "Starting server.");

    axum::Server::bind(&opts.bind_address)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

impl FromRef<AppState> for AnalyticsService {
    fn from_ref(state: &AppState) -> Self {
        state.analytics_service.clone()
    }
}

impl FromRef<AppState> for BudgetService {
    fn from_ref(state: &AppState) -> Self {
        state.budget_service.clone()
    }
}

impl FromRef<AppState> for CategoryService {
    fn from_ref(state: &AppState) -> Self {
        state.category_service.clone()
    }
}

impl FromRef<AppState> for EmailService {
    fn from_ref(state: &AppState) -> Self {
        state.email_service.clone()
    }
}

impl FromRef<AppState> for ExpenseService {
    fn from_ref(state: &AppState) -> Self {
        state.expense_service.clone()
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt_keys.clone()
    }
}

impl FromRef<AppState> for UserService {
    fn from_ref(state: &AppState) -> Self {
        state.user_service.clone()
    }
}
