use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use hwgrid_bundle::{
    DocLookup, NoDocs, OutputFormat, ReportCache, SourceTreeDocs, format_report, parse_bundle,
    report_for,
};
use hwgrid_core::{BundleIdentity, is_up_to_date};
use hwgrid_store::{BundleStore, DirReportCache, GridConfig, StoreError, StoredBundle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hwgrid")]
#[command(about = "Parse laptop hardware test bundles and manage their reports")]
struct Cli {
    /// Log debug output to stderr (overrides RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Parse a bundle archive and print its report.
    Parse(ParseArgs),
    /// Store a bundle archive and cache its report.
    Ingest(IngestArgs),
    /// Print the report of a stored bundle, regenerating it when stale.
    Show(ShowArgs),
    /// Regenerate stale reports of every stored bundle in parallel.
    Refresh(RefreshArgs),
    /// List stored bundles.
    List(ListArgs),
    /// Copy a file or directory out of a stored bundle.
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
struct ConfigArg {
    /// YAML configuration file.
    #[arg(long)]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct ParseArgs {
    /// Bundle archive (.zip).
    archive: PathBuf,
    /// Test suite sources used for test titles and categories.
    #[arg(long)]
    tests_dir: Option<PathBuf>,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct IngestArgs {
    /// Bundle archive (.zip).
    archive: PathBuf,
    #[command(flatten)]
    config: ConfigArg,
}

#[derive(Debug, Args)]
struct ShowArgs {
    /// Stored bundle id, as printed by `ingest` or `list`.
    id: String,
    #[command(flatten)]
    config: ConfigArg,
    /// Output format.
    #[arg(long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Args)]
struct RefreshArgs {
    #[command(flatten)]
    config: ConfigArg,
    /// Number of parallel jobs (default: parse.jobs from the config).
    #[arg(long)]
    jobs: Option<usize>,
    /// Regenerate every report, even current ones.
    #[arg(long)]
    force: bool,
}

#[derive(Debug, Args)]
struct ListArgs {
    #[command(flatten)]
    config: ConfigArg,
}

#[derive(Debug, Args)]
struct ExtractArgs {
    /// Stored bundle id.
    id: String,
    /// Archive path; a trailing `/` selects a whole directory, repacked as zip.
    path: String,
    #[command(flatten)]
    config: ConfigArg,
    /// Write to this file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Command::Parse(args) => run_parse(args),
        Command::Ingest(args) => run_ingest(args),
        Command::Show(args) => run_show(args),
        Command::Refresh(args) => run_refresh(args),
        Command::List(args) => run_list(args),
        Command::Extract(args) => run_extract(args),
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Storage handles opened from one configuration file.
struct Workspace {
    config: GridConfig,
    store: BundleStore,
    cache: DirReportCache,
}

impl Workspace {
    fn open(path: &Path) -> Result<Self, String> {
        let mut config = GridConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {e}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.anchor_paths(base);

        let store = BundleStore::open(&config.storage.bundles_dir).map_err(|e| {
            format!(
                "Failed to open bundle store '{}': {e}",
                config.storage.bundles_dir.display()
            )
        })?;
        let cache = DirReportCache::new(&config.storage.cache_dir);
        Ok(Self {
            config,
            store,
            cache,
        })
    }

    fn docs(&self) -> Box<dyn DocLookup> {
        doc_lookup(self.config.tests_dir.as_deref())
    }
}

fn doc_lookup(tests_dir: Option<&Path>) -> Box<dyn DocLookup> {
    match tests_dir {
        Some(dir) => Box::new(SourceTreeDocs::new(dir)),
        None => Box::new(NoDocs),
    }
}

fn read_archive(path: &Path) -> Result<Vec<u8>, String> {
    fs::read(path).map_err(|e| format!("Failed to read '{}': {e}", path.display()))
}

fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<(), String> {
    match output {
        Some(path) => fs::write(path, bytes)
            .map_err(|e| format!("Failed to write '{}': {e}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(bytes)
                .and_then(|()| stdout.flush())
                .map_err(|e| format!("Failed to write output: {e}"))
        }
    }
}

// ---------------------------------------------------------------------------
// parse / ingest / show
// ---------------------------------------------------------------------------

fn run_parse(args: ParseArgs) -> Result<(), String> {
    let bytes = read_archive(&args.archive)?;
    let docs = doc_lookup(args.tests_dir.as_deref());
    let report = parse_bundle(&bytes, docs.as_ref())
        .map_err(|e| format!("Failed to parse '{}': {e}", args.archive.display()))?;
    println!("{}", format_report(&report, args.format)?);
    Ok(())
}

fn run_ingest(args: IngestArgs) -> Result<(), String> {
    let workspace = Workspace::open(&args.config.config)?;
    let bytes = read_archive(&args.archive)?;
    let report = parse_bundle(&bytes, workspace.docs().as_ref())
        .map_err(|e| format!("Failed to parse '{}': {e}", args.archive.display()))?;

    let main_run = report.testruns.last().map(String::as_str).unwrap_or_default();
    let identity = BundleIdentity::from_sysinfo(&report.sysinfo, main_run).ok_or_else(|| {
        StoreError::Unidentified("system information lacks manufacturer or product".to_string())
            .to_string()
    })?;

    let stored = workspace
        .store
        .ingest(&bytes, &identity)
        .map_err(|e| e.to_string())?;
    workspace.cache.store(&stored.id, &report);
    println!("{}", stored.id);
    Ok(())
}

fn run_show(args: ShowArgs) -> Result<(), String> {
    let workspace = Workspace::open(&args.config.config)?;
    let docs = workspace.docs();
    let report = report_for(
        &workspace.cache,
        &args.id,
        || workspace.store.read(&args.id),
        docs.as_ref(),
        workspace.config.parse.always_regenerate,
    )
    .map_err(|e| e.to_string())?;
    println!("{}", format_report(&report, args.format)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// refresh
// ---------------------------------------------------------------------------

enum RefreshOutcome {
    Current,
    Regenerated { tests: usize },
    Failed(String),
}

fn run_refresh(args: RefreshArgs) -> Result<(), String> {
    use rayon::prelude::*;

    let workspace = Workspace::open(&args.config.config)?;
    let bundles = workspace.store.list().map_err(|e| e.to_string())?;
    let force = args.force || workspace.config.parse.always_regenerate;
    let jobs = args.jobs.unwrap_or(workspace.config.parse.jobs).max(1);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs)
        .build()
        .map_err(|e| format!("Failed to create thread pool: {e}"))?;
    let docs = workspace.docs();
    let docs = docs.as_ref();

    let outcomes: Vec<(String, RefreshOutcome)> = pool.install(|| {
        bundles
            .par_iter()
            .map(|stored| (stored.id.clone(), refresh_one(&workspace, stored, docs, force)))
            .collect()
    });

    let mut failed = 0usize;
    for (id, outcome) in &outcomes {
        match outcome {
            RefreshOutcome::Current => println!("{id}: up to date"),
            RefreshOutcome::Regenerated { tests } => println!("{id}: regenerated ({tests} tests)"),
            RefreshOutcome::Failed(err) => {
                failed += 1;
                eprintln!("{id}: failed: {err}");
            }
        }
    }

    if failed > 0 {
        return Err(format!("{failed} of {} bundles failed", outcomes.len()));
    }
    Ok(())
}

fn refresh_one(
    workspace: &Workspace,
    stored: &StoredBundle,
    docs: &dyn DocLookup,
    force: bool,
) -> RefreshOutcome {
    if !force && is_up_to_date(workspace.cache.load(&stored.id).as_ref()) {
        debug!(id = %stored.id, "Report current");
        return RefreshOutcome::Current;
    }
    match report_for(
        &workspace.cache,
        &stored.id,
        || workspace.store.read(&stored.id),
        docs,
        true,
    ) {
        Ok(report) => RefreshOutcome::Regenerated {
            tests: report.tests.len(),
        },
        Err(err) => RefreshOutcome::Failed(err.to_string()),
    }
}

// ---------------------------------------------------------------------------
// list / extract
// ---------------------------------------------------------------------------

fn run_list(args: ListArgs) -> Result<(), String> {
    let workspace = Workspace::open(&args.config.config)?;
    let bundles = workspace.store.list().map_err(|e| e.to_string())?;
    if bundles.is_empty() {
        println!("No bundles stored.");
        return Ok(());
    }

    let header = ["ID", "MANUFACTURER", "PRODUCT", "OS", "INGESTED"];
    let rows: Vec<[&str; 5]> = bundles
        .iter()
        .map(|b| {
            [
                b.id.as_str(),
                b.identity.manufacturer.as_str(),
                b.identity.product.as_str(),
                b.identity.os.as_str(),
                b.ingested_at.as_str(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let render = |cells: &[&str; 5]| {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        line.join("  ").trim_end().to_string()
    };

    println!("{}", render(&header));
    for row in &rows {
        println!("{}", render(row));
    }
    Ok(())
}

fn run_extract(args: ExtractArgs) -> Result<(), String> {
    let workspace = Workspace::open(&args.config.config)?;
    let bytes = if args.path.ends_with('/') {
        workspace.store.extract_dir(&args.id, &args.path)
    } else {
        workspace.store.extract_entry(&args.id, &args.path)
    }
    .map_err(|e| e.to_string())?;
    write_output(args.output.as_deref(), &bytes)
}
