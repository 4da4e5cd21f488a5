use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pagespeed_sheets::audit::Strategy;
use pagespeed_sheets::config::{ConfigLoader, OutputConfig, RunConfig, SourceConfig};
use pagespeed_sheets::metrics::snapshot::RunSummary;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pagespeed-sheets")]
#[command(version)]
#[command(about = "Append PageSpeed Insights metrics to Google Sheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    Mobile,
    Desktop,
    Both,
}

impl StrategyArg {
    fn strategies(self) -> Vec<Strategy> {
        match self {
            StrategyArg::Mobile => vec![Strategy::Mobile],
            StrategyArg::Desktop => vec![Strategy::Desktop],
            StrategyArg::Both => vec![Strategy::Mobile, Strategy::Desktop],
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Audit every URL and append the results
    Run {
        /// Path to the configuration file (JSON/YAML/TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// Plain log output instead of progress bars
        #[arg(long)]
        no_progress: bool,

        /// Device strategies to audit
        #[arg(short, long, value_enum)]
        strategy: Option<StrategyArg>,

        /// Read URLs from a local file instead of the configured source
        #[arg(long)]
        urls_file: Option<PathBuf>,

        /// URLs audited in parallel
        #[arg(long)]
        concurrency: Option<usize>,

        /// Stop at the first failed URL
        #[arg(long)]
        strict: bool,

        /// Print rows instead of appending them
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Check {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn print_summary(summary: &RunSummary) {
    println!("\n✅ Run Completed:");
    println!("   URLs Processed: {}", summary.urls_processed);
    println!("   Succeeded: {}", summary.urls_succeeded);
    println!("   Skipped (no route): {}", summary.urls_skipped);
    println!("   Failed: {}", summary.urls_failed);
    println!("   Rows Appended: {} ({} cells)", summary.rows_appended, summary.cells_appended);
    println!("   Average Audit: {}ms", summary.avg_fetch_time_ms);
    println!("   Total Time: {:.1}s", summary.elapsed_seconds);
}

fn print_config(cfg: &RunConfig) {
    println!("   Name: {}", cfg.name);
    match &cfg.source {
        SourceConfig::Range { range } => println!("   URL Source: range {}", range),
        SourceConfig::File { path } => println!("   URL Source: file {}", path),
    }
    println!(
        "   Strategies: {}",
        cfg.strategies
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("   Routes:");
    for route in &cfg.routes {
        println!("     {} -> {}", route.pattern, route.range);
    }
    println!("   Concurrency: {}", cfg.concurrency);
    println!("   Timeout: {}s", cfg.timeout_secs);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).build();
    let multi = Arc::new(indicatif::MultiProgress::new());

    match cli.command {
        Commands::Run {
            config,
            no_progress,
            strategy,
            urls_file,
            concurrency,
            strict,
            dry_run,
        } => {
            let progress = !no_progress;
            if progress {
                indicatif_log_bridge::LogWrapper::new((*multi).clone(), logger).try_init()?;
            } else {
                let level = logger.filter();
                log::set_boxed_logger(Box::new(logger))?;
                log::set_max_level(level);
            }

            log::info!("Loading config from {:?}", config);
            let mut config_data = ConfigLoader::load(&config)?;
            if let Some(strategy) = strategy {
                config_data.strategies = strategy.strategies();
            }
            if let Some(path) = urls_file {
                config_data.source = SourceConfig::File {
                    path: path.display().to_string(),
                };
            }
            if let Some(concurrency) = concurrency {
                config_data.concurrency = concurrency.max(1);
            }
            config_data.strict |= strict;
            if dry_run {
                config_data.output = OutputConfig::Console;
            }
            ConfigLoader::apply_env(&mut config_data);
            log::info!("Loaded run: {}", config_data.name);

            let pipeline = ConfigLoader::create_pipeline(&config_data, progress.then(|| multi.clone()))?;

            let mut progress_bar: Option<ProgressBar> = None;
            let mut progress_task = None;
            if progress {
                let pb = multi.add(ProgressBar::new(0));
                pb.set_style(ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")?
                    .progress_chars("#>-"));

                let mut metrics_rx = pipeline.watch_metrics();
                let pb_clone = pb.clone();
                progress_bar = Some(pb);
                progress_task = Some(tokio::spawn(async move {
                    while metrics_rx.changed().await.is_ok() {
                        let snapshot: RunSummary = metrics_rx.borrow().clone();
                        pb_clone.set_length(snapshot.urls_queued);
                        pb_clone.set_position(snapshot.urls_processed);
                        pb_clone.set_message(format!(
                            "Active: {} | OK: {} | Skipped: {} | Failed: {}",
                            snapshot.active_workers,
                            snapshot.urls_succeeded,
                            snapshot.urls_skipped,
                            snapshot.urls_failed
                        ));
                    }
                }));
            }

            log::info!("Starting run...");
            let result = pipeline.run().await;

            if let Some(task) = progress_task {
                task.abort();
            }
            let summary = result?;

            if let Some(pb) = progress_bar {
                pb.set_style(ProgressStyle::default_bar()
                    .template("✅ [{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} {msg}")?
                    .progress_chars("#>-"));
                pb.set_length(summary.urls_queued);
                pb.set_position(summary.urls_processed);
                pb.finish_with_message(format!(
                    "OK: {} | Skipped: {} | Failed: {} - Completed",
                    summary.urls_succeeded, summary.urls_skipped, summary.urls_failed
                ));
            }

            print_summary(&summary);
        }
        Commands::Check { config } => {
            match ConfigLoader::load(&config) {
                Ok(cfg) => {
                    println!("✅ Config is valid:");
                    print_config(&cfg);
                }
                Err(e) => {
                    eprintln!("❌ Config error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
