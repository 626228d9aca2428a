//! CLI command definitions, routing, and tracing setup.

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use serpforge_assistant::AssistantClient;
use serpforge_core::{
    BatchProcessor, BatchProgress, PipelineOptions, ProgressReporter,
};
use serpforge_shared::config::{
    AppConfig, init_config, load_config, resolve_db_path,
};
use serpforge_shared::types::{GroupStatus, ResearchRecord};
use serpforge_storage::{STANDARD_INSTRUCTION_ID, Storage};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// serpforge — keyword research and SEO content blueprints.
#[derive(Parser)]
#[command(
    name = "serpforge",
    version,
    about = "Research keywords: SERP, page artifacts, corpus synthesis, SEO blueprint.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Research one keyword and store the result.
    Research {
        /// Keyword to research.
        #[arg(long)]
        kw: String,

        /// Route the SERP step through the AI assistant gateway.
        #[arg(long)]
        assisted: bool,
    },

    /// List stored research records, newest first.
    List {
        /// Maximum number of rows.
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Show one stored research record as JSON.
    Show {
        /// Research record id.
        id: String,
    },

    /// Queue and process keyword groups.
    Batch {
        /// Create a group with this name; keywords follow as arguments.
        #[arg(long)]
        group: Option<String>,

        /// Keywords for the new group.
        keywords: Vec<String>,

        /// Process all pending tasks of a group.
        #[arg(long)]
        process_group: Option<String>,

        /// Worker pool width for --process-group.
        #[arg(long)]
        workers: Option<u32>,

        /// Print progress for a group.
        #[arg(long)]
        status: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults and seed the research database.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "serpforge=info",
        1 => "serpforge=debug",
        _ => "serpforge=trace",
    };

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Research { kw, assisted } => cmd_research(&kw, assisted).await,
        Command::List { limit } => cmd_list(limit).await,
        Command::Show { id } => cmd_show(&id).await,
        Command::Batch {
            group,
            keywords,
            process_group,
            workers,
            status,
        } => match (group, process_group, status) {
            (Some(name), None, None) => cmd_batch_create(&name, &keywords).await,
            (None, Some(id), None) => cmd_batch_process(&id, workers).await,
            (None, None, Some(id)) => cmd_batch_status(&id).await,
            _ => Err(eyre!(
                "batch needs exactly one of --group, --process-group, or --status"
            )),
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

/// Open the configured database.
async fn open_storage(config: &AppConfig) -> Result<Storage> {
    let db_path = resolve_db_path(config)?;
    Ok(Storage::open(&db_path).await?)
}

/// Build the assistant client when assisted mode is requested.
fn assistant_client(config: &AppConfig, assisted: bool) -> Result<Option<AssistantClient>> {
    if !assisted {
        return Ok(None);
    }
    Ok(Some(AssistantClient::new(&config.assistant)?))
}

// ---------------------------------------------------------------------------
// research / list / show
// ---------------------------------------------------------------------------

async fn cmd_research(keyword: &str, assisted: bool) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    // Fatal on an unseeded database.
    storage.get_instruction(STANDARD_INSTRUCTION_ID).await?;

    let options = PipelineOptions::from_config(&config);
    let assistant = assistant_client(&config, assisted)?;

    info!(keyword, assisted, "starting research");

    let reporter = CliProgress::new();
    let record = serpforge_core::research_keyword(
        keyword,
        &options,
        &config.rules,
        assistant.as_ref(),
        &reporter,
    )
    .await?;
    storage.save_research(&record).await?;

    println!();
    println!("  Research complete!");
    println!("  ID:       {}", record.id);
    println!("  Keyword:  {}", record.keyword);
    println!("  SERP:     {} results ({})", record.serp.len(), record.serp_source);
    println!(
        "  Pages:    {} ({} synthetic)",
        record.pages.len(),
        record.pages.iter().filter(|p| p.synthetic).count()
    );
    println!("  Facts:    {}", record.corpus.consensus.len());
    println!("  Evidence: {}", record.evidence.len());
    println!("  Slug:     {}", record.blueprint.slug);
    println!("  Time:     {:.1}s", record.execution_time_seconds);
    println!();

    Ok(())
}

async fn cmd_list(limit: u32) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let summaries = storage.list_research(limit).await?;
    if summaries.is_empty() {
        println!("No research records yet. Run: serpforge research --kw \"<keyword>\"");
        return Ok(());
    }

    for summary in summaries {
        println!(
            "{}  {}  [{}]  {:.1}s  {}",
            summary.created_at.format("%Y-%m-%d %H:%M"),
            summary.id,
            summary.status,
            summary.execution_time_seconds,
            summary.keyword,
        );
    }
    Ok(())
}

async fn cmd_show(id: &str) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let record = storage
        .get_research(id)
        .await?
        .ok_or_else(|| eyre!("no research record with id '{id}'"))?;

    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// batch
// ---------------------------------------------------------------------------

async fn cmd_batch_create(name: &str, keywords: &[String]) -> Result<()> {
    if keywords.is_empty() {
        return Err(eyre!("batch --group needs at least one keyword"));
    }

    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let group_id = storage.create_group(name, keywords, 1).await?;

    println!("Group created: {group_id}");
    println!("  Name:  {name}");
    println!("  Tasks: {}", keywords.len());
    println!("Process it with: serpforge batch --process-group {group_id}");
    Ok(())
}

async fn cmd_batch_process(group_id: &str, workers: Option<u32>) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let max_workers = workers.unwrap_or(config.defaults.max_workers) as usize;
    let options = PipelineOptions::from_config(&config);

    let processor = BatchProcessor::new(
        storage,
        options,
        config.rules.clone(),
        None,
        max_workers,
    );

    let reporter = CliBatchProgress::new();
    let status = processor.process_group(group_id, &reporter).await?;

    println!();
    println!("  Group drained!");
    println!("  Completed: {}/{}", status.completed_tasks, status.total_tasks);
    println!("  Failed:    {}", status.failed_tasks);
    println!("  Progress:  {:.1}%", status.progress_percent);
    println!();
    Ok(())
}

async fn cmd_batch_status(group_id: &str) -> Result<()> {
    let config = load_config()?;
    let storage = open_storage(&config).await?;

    let status = storage
        .group_status(group_id)
        .await?
        .ok_or_else(|| eyre!("no task group with id '{group_id}'"))?;

    println!("Group {}  [{}]", status.group_id, status.status);
    println!("  Name:      {}", status.name);
    println!("  Tasks:     {}", status.total_tasks);
    println!("  Completed: {}", status.completed_tasks);
    println!("  Failed:    {}", status.failed_tasks);
    println!("  Progress:  {:.1}%", status.progress_percent);

    for task in storage.list_group_tasks(group_id).await? {
        println!("  - {}  [{}]  {}", task.task_id, task.status, task.keyword);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());

    // Seed the database so research can run.
    let config = load_config()?;
    let storage = open_storage(&config).await?;
    storage.ensure_standard_instruction().await?;
    println!(
        "Database ready at: {} (standard instruction seeded)",
        resolve_db_path(&config)?.display()
    );
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Progress reporters
// ---------------------------------------------------------------------------

/// Spinner-based progress for single-keyword research.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn page_fetched(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Fetching [{current}/{total}] {url}"));
    }

    fn done(&self, _record: &ResearchRecord) {
        self.spinner.finish_and_clear();
    }
}

/// Bar-based progress for batch group processing.
struct CliBatchProgress {
    bar: ProgressBar,
}

impl CliBatchProgress {
    fn new() -> Self {
        let bar = ProgressBar::hidden();
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}").unwrap(),
        );
        Self { bar }
    }
}

impl BatchProgress for CliBatchProgress {
    fn group_started(&self, _group_id: &str, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_draw_target(indicatif::ProgressDrawTarget::stderr());
    }

    fn task_finished(&self, keyword: &str, ok: bool, done: usize, _total: usize, _percent: f64) {
        self.bar.set_position(done as u64);
        let mark = if ok { "ok" } else { "failed" };
        self.bar.set_message(format!("{keyword} ({mark})"));
    }

    fn group_finished(&self, _status: &GroupStatus, _elapsed: std::time::Duration) {
        self.bar.finish_and_clear();
    }
}
