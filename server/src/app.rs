//! Core application

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::api::ApiServer;
use crate::core::banner;
use crate::core::cli::{self, CliConfig, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_DOT_FOLDER, APP_NAME_LOWER, ENV_LOG};
use crate::core::shutdown::ShutdownService;
use crate::data::analytics::AnalyticsClient;
use crate::data::datasets::Catalog;
use crate::data::filters::{compile, parse_filters};
use crate::domain::{QueryDispatcher, resolve_presets};

pub struct CoreApp {
    pub shutdown: ShutdownService,
    pub config: AppConfig,
    pub catalog: Arc<Catalog>,
    pub dispatcher: Arc<QueryDispatcher>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("Application starting");

        let (cli_config, command) = cli::parse();
        tracing::trace!(command = ?command, "Parsed command");

        match command {
            Some(Commands::Compile { dataset, filters }) => {
                return Self::compile_command(&dataset, &filters);
            }
            Some(Commands::Datasets) => return Self::datasets_command(),
            Some(Commands::Start) | None => {}
        }

        let app = Self::init(&cli_config).await?;
        Self::start_server(app).await
    }

    async fn init(cli: &CliConfig) -> Result<Self> {
        let config = AppConfig::load(cli)?;
        let catalog = Arc::new(Catalog::builtin().context("Invalid builtin dataset catalog")?);

        let client = AnalyticsClient::new(&config.analytics)
            .context("Failed to initialize analytics client")?;
        tracing::debug!(endpoint = client.endpoint(), "Analytics client initialized");

        let mut dispatcher = QueryDispatcher::new(Arc::new(client), config.dispatch.coalesce);
        if config.debug {
            let dir = Self::debug_dir();
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create debug directory: {}", dir.display()))?;
            tracing::info!(path = %dir.display(), "Debug mode: recording analytics queries");
            dispatcher = dispatcher.with_debug_log(dir);
        }

        let dispatcher = Arc::new(dispatcher);
        let shutdown = ShutdownService::new(dispatcher.clone());

        Ok(Self {
            shutdown,
            config,
            catalog,
            dispatcher,
        })
    }

    fn debug_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DOT_FOLDER)
            .join("debug")
    }

    fn compile_command(dataset_id: &str, filters: &str) -> Result<()> {
        let catalog = Catalog::builtin().context("Invalid builtin dataset catalog")?;
        let dataset = catalog.get(dataset_id).with_context(|| {
            let known: Vec<&str> = catalog.iter().map(|d| d.id.as_str()).collect();
            format!(
                "Unknown dataset '{}' (known: {})",
                dataset_id,
                known.join(", ")
            )
        })?;

        let spec = parse_filters(filters)?;
        let spec = resolve_presets(spec, Utc::now().date_naive());
        let compiled = compile(&spec, dataset.schema())?;

        println!("{}", serde_json::to_string_pretty(&compiled)?);
        Ok(())
    }

    fn datasets_command() -> Result<()> {
        let catalog = Catalog::builtin().context("Invalid builtin dataset catalog")?;
        for dataset in catalog.iter() {
            println!("{}  ({})", dataset.id, dataset.table);
            for field in dataset.schema().fields() {
                let operators: Vec<&str> = field.operators.iter().map(|o| o.as_str()).collect();
                println!("  {:<16} {}", field.name, operators.join(", "));
            }
        }
        Ok(())
    }

    fn init_logging() {
        let default_filter = format!("info,{}=info", APP_NAME_LOWER);

        let filter = std::env::var(ENV_LOG)
            .or_else(|_| std::env::var("RUST_LOG"))
            .unwrap_or(default_filter);

        tracing_subscriber::fmt()
            .with_target(false)
            .with_thread_ids(false)
            .with_level(true)
            .with_ansi(true)
            .compact()
            .with_env_filter(filter)
            .init();
    }

    async fn start_server(app: Self) -> Result<()> {
        // Install signal handlers FIRST (before any blocking calls)
        app.shutdown.install_signal_handlers();

        banner::print_banner(
            &app.config.server.host,
            app.config.server.port,
            &app.config.analytics.url,
            app.config.dispatch.coalesce,
        );

        let server = ApiServer::new(app);
        let app = server.start().await?;
        app.shutdown.shutdown().await;

        Ok(())
    }
}
