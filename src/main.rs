//! Tipsheet - multi-agent data analysis for newsrooms
//!
//! A CLI tool that drives analyst, reporter, and editor agents over an
//! assistants backend to investigate a dataset question by question
//! and compile a ranked tipsheet of newsworthy findings.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, generation failure, etc.)

mod agent;
mod backend;
mod cli;
mod config;
mod models;
mod pipeline;
mod prompts;
mod store;

use anyhow::{bail, Context, Result};
use cli::Args;
use config::Config;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use agent::{AgentHandle, AgentOptions};
use backend::{AssistantBackend, Binding, OpenAiBackend, OpenAiConfig};
use models::Role;
use pipeline::{Pipeline, RunConfig};
use store::{run_dir_name, FsArtifactStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Tipsheet v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_pipeline(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .tipsheet.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".tipsheet.toml");

    if path.exists() {
        eprintln!("⚠️  .tipsheet.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .tipsheet.toml")?;

    println!("✅ Created .tipsheet.toml with default settings.");
    println!("   Edit it to customize the model, role flags, and limits.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete pipeline workflow.
async fn run_pipeline(args: Args) -> Result<()> {
    let start_time = Instant::now();

    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let project = args.project.clone().context("project is required")?;
    let dataset = args.dataset.clone().context("dataset is required")?;
    let description_path = args.description.clone().context("description is required")?;
    let api_key = args.api_key.clone().context("API key is required")?;

    let dataset_description = std::fs::read_to_string(&description_path).with_context(|| {
        format!(
            "Failed to read dataset description: {}",
            description_path.display()
        )
    })?;

    // Run directory; its name encodes which roles are enabled so
    // differently configured runs never share artifacts.
    let run_dir = PathBuf::from(&config.general.output_root).join(run_dir_name(
        &project,
        config.pipeline.use_reporter,
        config.pipeline.use_editor,
    ));
    let store = Arc::new(FsArtifactStore::create(&run_dir)?);
    info!("Run directory: {}", run_dir.display());

    // Cancellation: first Ctrl-C interrupts the in-flight agent wait.
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C received, cancelling run");
            ctrl_c_token.cancel();
        }
    });

    let backend: Arc<dyn AssistantBackend> = Arc::new(OpenAiBackend::new(OpenAiConfig {
        api_key,
        base_url: config.backend.base_url.clone(),
        request_timeout: Duration::from_secs(config.backend.request_timeout_seconds),
        retries: config.backend.retries,
    })?);

    println!("🤖 Setting up agents...");
    println!("   Model: {}", config.backend.model);
    println!("   Backend: {}", config.backend.base_url);
    println!(
        "   Roles: analyst{}{}",
        if config.pipeline.use_reporter { " + reporter" } else { "" },
        if config.pipeline.use_editor { " + editor" } else { "" },
    );

    let options = AgentOptions {
        model: config.backend.model.clone(),
        poll_interval: Duration::from_millis(config.backend.poll_interval_ms),
        send_timeout: Duration::from_secs(config.backend.send_timeout_seconds),
    };

    // The dataset is uploaded once and shared by analyst and reporter.
    let dataset_file_id = backend
        .ensure_file(&dataset)
        .await
        .with_context(|| format!("Failed to upload dataset: {}", dataset.display()))?;

    let analyst = AgentHandle::create(
        backend.clone(),
        store.clone(),
        Role::Analyst,
        Binding::CodeExecution {
            file_id: dataset_file_id.clone(),
        },
        &project,
        options.clone(),
        cancel.clone(),
    )
    .await?;

    let editor = if config.pipeline.use_editor {
        let vector_store_id =
            editor_vector_store(backend.as_ref(), &config.pipeline.editor_docs).await?;
        Some(
            AgentHandle::create(
                backend.clone(),
                store.clone(),
                Role::Editor,
                Binding::DocumentSearch { vector_store_id },
                &project,
                options.clone(),
                cancel.clone(),
            )
            .await?,
        )
    } else {
        None
    };

    let reporter = if config.pipeline.use_reporter {
        Some(
            AgentHandle::create(
                backend.clone(),
                store.clone(),
                Role::Reporter,
                Binding::CodeExecution {
                    file_id: dataset_file_id,
                },
                &project,
                options,
                cancel.clone(),
            )
            .await?,
        )
    } else {
        None
    };

    let run_config = RunConfig {
        n_questions: config.pipeline.questions,
        n_bullets: config.pipeline.bullets,
        max_feedback: config.pipeline.max_feedback,
        reset_agents: config.pipeline.reset_agents,
        show_progress: !args.quiet,
    };

    println!("\n🔬 Starting run...");
    println!(
        "   Started: {}",
        chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("   Questions: {}", run_config.n_questions);
    println!("   Max feedback rounds: {}", run_config.max_feedback);

    let mut pipeline = Pipeline::new(
        run_config,
        store.clone(),
        analyst,
        editor,
        reporter,
        dataset_description,
    );
    let tipsheet = pipeline.run().await?;

    let duration = start_time.elapsed().as_secs_f64();
    println!("\n📊 Tipsheet preview:");
    for line in tipsheet.lines().take(5) {
        println!("   {}", line);
    }
    println!("   ...");
    println!("   Duration: {:.1}s", duration);
    println!(
        "\n✅ Run complete! Tipsheet saved to: {}",
        store.root().join("tipsheet.txt").display()
    );

    Ok(())
}

/// Upload the editor's reference documents and build a vector store
/// over them.
async fn editor_vector_store(
    backend: &dyn AssistantBackend,
    docs_dir: &str,
) -> Result<String> {
    let dir = Path::new(docs_dir);
    if !dir.is_dir() {
        bail!(
            "Editor enabled but reference directory not found: {} (disable with --no-editor)",
            dir.display()
        );
    }

    let mut file_ids = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read editor documents: {}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    entries.sort();

    if entries.is_empty() {
        bail!(
            "Editor enabled but no .txt documents in {} (disable with --no-editor)",
            dir.display()
        );
    }

    for path in &entries {
        let file_id = backend
            .ensure_file(path)
            .await
            .with_context(|| format!("Failed to upload editor document: {}", path.display()))?;
        file_ids.push(file_id);
    }
    debug!("editor vector store over {} document(s)", file_ids.len());

    let vector_store_id = backend
        .create_vector_store("Editor documents", &file_ids)
        .await
        .context("Failed to create editor vector store")?;
    Ok(vector_store_id)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .tipsheet.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
