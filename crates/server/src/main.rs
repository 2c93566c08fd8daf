use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use axum_server::tls_rustls::RustlsConfig;
use chrono::Local;
use clap::{Parser, ValueEnum};
use sqlx::PgPool;
use tracing::{error, info};

use application::Supervisor;
use domain::{ArchiveSink, SystemConfig};
use infrastructure::{
    ArchiveRepository, ConfigRepository, SchemaManager, Settings, UserRepository, database,
    exchange, logging, open_link_transport,
};

use blackbox_server::state::{AppState, LinkInventory};
use blackbox_server::{api, remote};

#[derive(Parser, Debug)]
#[command(author, version, about = "Field-data acquisition service", long_about = None)]
struct Args {
    /// Start the full pipeline: polling, archiving and the HTTP servers.
    #[arg(long, conflicts_with = "action")]
    run: bool,

    /// Run one maintenance action and exit.
    #[arg(long = "do", value_enum, value_name = "ACTION")]
    action: Option<MaintenanceAction>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MaintenanceAction {
    #[value(name = "DB-check")]
    DbCheck,
    #[value(name = "DB-create")]
    DbCreate,
    #[value(name = "DB-import")]
    DbImport,
    #[value(name = "DB-export")]
    DbExport,
    #[value(name = "DB-erase")]
    DbErase,
    #[value(name = "Xlsx-show")]
    XlsxShow,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    dotenv::dotenv().ok();
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(error) => {
            eprintln!("failed to load settings: {error}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guards = match logging::init(&settings.log_path) {
        Ok(guards) => guards,
        Err(error) => {
            eprintln!("failed to initialize logging: {error:#}");
            return ExitCode::FAILURE;
        }
    };
    info!("service starting");

    let pool = match database::connect(&settings).await {
        Ok(pool) => pool,
        Err(error) => {
            error!(error = %format!("{error:#}"), "database connection failed");
            eprintln!("database connection failed: {error:#}");
            return ExitCode::FAILURE;
        }
    };

    if args.run {
        return match full_run(settings, pool).await {
            Ok(()) => {
                info!("service stopped");
                ExitCode::SUCCESS
            }
            Err(error) => {
                error!(error = %format!("{error:#}"), "service failed");
                eprintln!("service failed: {error:#}");
                ExitCode::FAILURE
            }
        };
    }

    let Some(action) = args.action else {
        eprintln!("nothing to do: pass --run or --do <ACTION>");
        return ExitCode::FAILURE;
    };

    match dispatch(action, &settings, pool).await {
        Ok(()) => {
            println!("ok");
            ExitCode::SUCCESS
        }
        Err(error) => {
            error!(error = %format!("{error:#}"), "maintenance action failed");
            println!("bad");
            ExitCode::FAILURE
        }
    }
}

async fn dispatch(action: MaintenanceAction, settings: &Settings, pool: PgPool) -> Result<()> {
    match action {
        MaintenanceAction::DbCheck => db_check(settings, pool).await,
        MaintenanceAction::DbCreate => db_create(settings, pool).await,
        MaintenanceAction::DbImport => db_import(settings, pool).await,
        MaintenanceAction::DbExport => db_export(settings, pool).await,
        MaintenanceAction::DbErase => db_erase(settings, pool).await,
        MaintenanceAction::XlsxShow => import_preview(settings),
    }
}

async fn db_check(settings: &Settings, pool: PgPool) -> Result<()> {
    let schema = SchemaManager::new(pool, settings.clone());
    if !schema.tables_exist().await? {
        bail!("required tables are missing");
    }
    info!("table check passed");
    Ok(())
}

async fn db_create(settings: &Settings, pool: PgPool) -> Result<()> {
    let schema = SchemaManager::new(pool.clone(), settings.clone());
    if schema.tables_exist().await? {
        bail!("tables already present; not recreating");
    }
    schema.create_tables().await?;

    UserRepository::new(pool, settings).seed_admin().await?;
    info!("tables created and admin user seeded");
    Ok(())
}

async fn db_import(settings: &Settings, pool: PgPool) -> Result<()> {
    let schema = SchemaManager::new(pool.clone(), settings.clone());
    if !schema.tables_exist().await? {
        bail!("required tables are missing; run DB-create first");
    }

    let (hosts, devices, tags) = exchange::read_exchange(&settings.import_file())?;
    // Reject inconsistent files before touching the tables.
    SystemConfig::from_records(&hosts, &devices, &tags)
        .context("import file failed validation")?;

    schema.truncate_config_tables().await?;
    ConfigRepository::new(pool, settings.clone())
        .insert_records(&hosts, &devices, &tags)
        .await?;
    info!("configuration imported");
    Ok(())
}

async fn db_export(settings: &Settings, pool: PgPool) -> Result<()> {
    let (hosts, devices, tags) = ConfigRepository::new(pool, settings.clone())
        .read_records()
        .await?;
    if hosts.is_empty() && devices.is_empty() && tags.is_empty() {
        bail!("nothing to export: configuration tables are empty");
    }

    let stamp = Local::now().format("%d.%m.%Y-%H:%M:%S").to_string();
    let path = settings.export_file(&stamp);
    exchange::write_exchange(&path, &hosts, &devices, &tags)?;
    info!(file = %path.display(), "configuration exported");
    Ok(())
}

async fn db_erase(settings: &Settings, pool: PgPool) -> Result<()> {
    SchemaManager::new(pool, settings.clone())
        .truncate_config_tables()
        .await
}

fn import_preview(settings: &Settings) -> Result<()> {
    let (hosts, devices, tags) = exchange::read_exchange(&settings.import_file())?;
    print!("{}", exchange::render_preview(&hosts, &devices, &tags));
    Ok(())
}

/// Full pipeline start: configuration, connections, workers, then the HTTP
/// surfaces. Blocks until the plain server stops, an OS signal arrives or
/// a worker fails; afterwards the scope is cancelled and every worker
/// drains before the process exits.
async fn full_run(settings: Settings, pool: PgPool) -> Result<()> {
    let started_at = Local::now().format("%d-%m-%Y %H:%M:%S").to_string();

    let config = ConfigRepository::new(pool.clone(), settings.clone())
        .load()
        .await?;

    // Connection factory: every host link gets its live transport before
    // any polling starts.
    let mut transports = Vec::with_capacity(config.links().len());
    for link in config.links() {
        let transport = open_link_transport(&settings, &config, link).await?;
        transports.push((link.name.clone(), transport));
    }

    let archive = ArchiveRepository::new(pool.clone(), &settings);
    let mut supervisor = Supervisor::new();
    supervisor.start_pipeline(
        &config,
        transports,
        Arc::new(archive.clone()) as Arc<dyn ArchiveSink>,
    );
    let token = supervisor.cancellation_token();

    let state = Arc::new(AppState::new(
        started_at,
        LinkInventory::from_config(&config, &settings),
        settings.clone(),
        archive,
        UserRepository::new(pool, &settings),
    ));

    // TLS surface for remote clients, when enabled.
    if settings.use_https() {
        let tls = RustlsConfig::from_pem_file(
            &settings.https_server_key_public,
            &settings.https_server_key_private,
        )
        .await
        .context("loading TLS key material")?;
        let addr: SocketAddr = settings
            .https_bind()
            .parse()
            .context("parsing HTTPS bind address")?;
        let https_router = remote::router(Arc::clone(&state));
        let https_token = token.clone();

        info!(%addr, "HTTPS server listening");
        tokio::spawn(async move {
            if let Err(error) = axum_server::bind_rustls(addr, tls)
                .serve(https_router.into_make_service())
                .await
            {
                error!(%error, "HTTPS server failed");
                https_token.cancel();
            }
        });
    }

    // Plain surface for local clients; its termination ends the service.
    let listener = tokio::net::TcpListener::bind(settings.http_bind())
        .await
        .context("binding HTTP server")?;
    info!(addr = %settings.http_bind(), "HTTP server listening");

    let shutdown = token.clone();
    let serve_result = axum::serve(listener, api::router(state))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = shutdown.cancelled() => info!("shutdown requested by pipeline"),
                _ = tokio::signal::ctrl_c() => info!("shutdown requested by signal"),
            }
        })
        .await;

    if let Err(error) = serve_result {
        error!(%error, "HTTP server failed");
    }

    // Cancel the scope and wait for every worker to reach its stopped
    // state; the first worker error becomes the exit status.
    supervisor.shutdown().await
}
