use std::{borrow::Cow, net::SocketAddr, time::Duration};

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::{
    client::{ApiClient, IntervalTicker, LoggingSink, NotificationPoller, Session},
    server,
};

mod migrate;

#[derive(Parser)]
#[clap(about = "Personal expense tracking API")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,

    /// DSN to tell Sentry where to send events.
    ///
    /// If provided, errors will be sent to Sentry.
    #[clap(long = "sentry-dsn", env = "SENTRY_DSN")]
    sentry_dsn: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations.
    Migrate(MigrateOpts),
    /// Run migrations, then serve the API.
    Serve(ServeOpts),
    /// Poll a running API for budget notifications and log them.
    WatchNotifications(WatchOpts),
}

#[derive(Args)]
struct MigrateOpts {
    /// Connection string for the database.
    #[clap(long = "database-url", env = "DATABASE_URL")]
    database_url: String,
}

impl From<MigrateOpts> for migrate::MigrationOpts {
    fn from(opts: MigrateOpts) -> Self {
        Self {
            database_url: opts.database_url,
        }
    }
}

#[derive(Args)]
struct ServeOpts {
    /// Origins allowed to make cross-origin requests. Any origin is allowed
    /// if none are given.
    #[clap(
        long = "allowed-origin",
        env = "ALLOWED_ORIGINS",
        value_delimiter = ','
    )]
    allowed_origins: Vec<String>,

    /// Address to listen on.
    #[clap(long = "bind", default_value = "0.0.0.0:5001", env = "BIND_ADDRESS")]
    bind_address: SocketAddr,

    /// The number of connections to use for the database pool.
    #[clap(long = "database-pool-size", default_value = "16")]
    database_pool_size: u32,

    /// The number of seconds before a database connection times out.
    #[clap(long = "database-timeout", default_value = "5")]
    database_timeout: u8,

    /// Connection string for the application database.
    #[clap(long = "database-url", env = "DATABASE_URL")]
    database_url: String,

    /// Include error details in 500 responses.
    #[clap(long = "development")]
    development: bool,

    /// Address to send emails from.
    #[clap(
        long = "email-from-address",
        default_value = "admin@localhost",
        env = "EMAIL_FROM_ADDRESS"
    )]
    email_from_address: String,

    /// Display name to send emails from.
    #[clap(
        long = "email-from-name",
        default_value = "Expense Tracker",
        env = "EMAIL_FROM_NAME"
    )]
    email_from_name: String,

    /// Base URL of the web frontend, used to build links in emails.
    #[clap(
        long = "frontend-url",
        default_value = "http://localhost:3000",
        env = "FRONTEND_URL"
    )]
    frontend_url: String,

    /// Secret key for signing session tokens.
    ///
    /// If this is changed, existing sessions become invalid.
    /// Generate with: openssl rand -base64 32
    #[clap(long = "jwt-secret", env = "JWT_SECRET")]
    jwt_secret: String,

    /// Number of hours a session token is valid for.
    #[clap(long = "jwt-lifetime-hours", default_value = "24", env = "JWT_LIFETIME_HOURS")]
    jwt_lifetime_hours: i64,

    /// Connection string for Redis.
    ///
    /// If provided, authentication requests are rate limited.
    #[clap(long = "redis-url", env = "REDIS_URL")]
    redis_url: Option<String>,

    /// API key for SendGrid.
    ///
    /// If provided, emails will be sent using SendGrid. If this is not set,
    /// emails will be printed to stdout.
    #[clap(long = "sendgrid-key", env = "SENDGRID_KEY")]
    sendgrid_key: Option<String>,
}

impl From<ServeOpts> for server::Options {
    fn from(opts: ServeOpts) -> Self {
        Self {
            allowed_origins: opts.allowed_origins,
            bind_address: opts.bind_address,
            database_pool_size: opts.database_pool_size,
            database_timeout_seconds: opts.database_timeout,
            database_url: opts.database_url,
            development: opts.development,
            email_from_address: opts.email_from_address,
            email_from_name: opts.email_from_name,
            frontend_url: opts.frontend_url,
            jwt_secret: opts.jwt_secret,
            jwt_lifetime_hours: opts.jwt_lifetime_hours,
            redis_url: opts.redis_url,
            sendgrid_key: opts.sendgrid_key,
        }
    }
}

#[derive(Args)]
struct WatchOpts {
    /// Base URL of the API, including the `/api` prefix.
    #[clap(
        long = "api-url",
        default_value = "http://localhost:5001/api",
        env = "API_URL"
    )]
    api_url: String,

    /// Session token to authenticate with.
    #[clap(long = "token", env = "API_TOKEN")]
    token: String,

    /// Seconds between polls.
    #[clap(long = "interval", default_value = "30")]
    interval_seconds: u64,
}

async fn watch_notifications(opts: WatchOpts) -> anyhow::Result<()> {
    let client = ApiClient::new(&opts.api_url, Session::new(opts.token))?;
    let ticker = IntervalTicker::new(Duration::from_secs(opts.interval_seconds.max(1)));
    let handle = NotificationPoller::new(client, LoggingSink, ticker).spawn();

    tokio::signal::ctrl_c().await?;
    handle.stop().await;

    Ok(())
}

pub async fn run_with_sys_args() -> anyhow::Result<()> {
    use tracing_subscriber::prelude::*;

    let cli = Cli::parse();

    let sentry_config = cli.sentry_dsn.map(|dsn| {
        debug!("Enabled sentry.");

        let release_name = option_env!("GIT_SHA")
            .map(Cow::from)
            .or_else(|| sentry::release_name!());

        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: release_name,
                ..Default::default()
            },
        ))
    });

    let sentry_tracing_layer = if sentry_config.is_some() {
        Some(sentry_tracing::layer())
    } else {
        None
    };

    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(EnvFilter::from_default_env());

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(sentry_tracing_layer)
        .init();

    match cli.command {
        Commands::Migrate(opts) => migrate::run_migrations(opts.into()).await,
        Commands::Serve(opts) => {
            let migrate_opts = MigrateOpts {
                database_url: opts.database_url.clone(),
            };

            migrate::run_migrations(migrate_opts.into()).await?;

            server::serve(opts.into()).await
        }
        Commands::WatchNotifications(opts) => watch_notifications(opts).await,
    }
}
