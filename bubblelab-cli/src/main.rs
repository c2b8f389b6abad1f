//! BubbleLab CLI — fetch, pipeline, and study commands.
//!
//! Commands:
//! - `fetch` — download the raw series, cache them, write the merged table
//! - `features` — run the feature pipeline and persist the featured table
//! - `summary` — print the per-window bubble summary table
//! - `models` — fit the regression, t-test, ARIMA/ARIMAX, and walk-forward
//! - `report` — export chart panels, model fits, and the markdown report
//! - `cache status` — per-series cache presence and date ranges

use anyhow::{Context, Result};
use bubblelab_core::data::{
    read_table, CsvCache, DatasetBuilder, FredProvider, ShillerProvider, FEATURED_FILE,
    MERGED_RAW_FILE, SERIES_CATALOG,
};
use bubblelab_core::features::{run_pipeline, FeatureTable};
use bubblelab_core::summary::compute_bubble_summary;
use bubblelab_core::StudyConfig;
use bubblelab_report::{
    save_model_fits, save_study_panels, StudyReportGenerator, StudyReportInputs,
};
use bubblelab_stats::{
    fit_return_arimax, fit_return_baseline, flagged_vs_normal_test,
    regression_valuation_vs_return, return_walk_forward, volatility_regimes, ArimaOrder,
    DEFAULT_HORIZON_MONTHS, DEFAULT_TRAIN_FRACTION,
};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Window, in months, for the pre/post-peak volatility comparison.
const VOLATILITY_WINDOW: usize = 24;

#[derive(Parser)]
#[command(
    name = "bubblelab",
    about = "BubbleLab CLI — historical market bubble study pipeline"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download every raw series, cache it, and write the merged table.
    Fetch {
        /// Force re-download even if cached.
        #[arg(long, default_value_t = false)]
        force: bool,

        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Build the featured table from the cached series and persist it.
    Features {
        /// Path to a TOML study config (thresholds and windows).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Print the per-window bubble summary table.
    Summary {
        /// Path to a TOML study config (thresholds and windows).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Fit the statistical models and print their readouts.
    Models {
        /// Forward-return horizon in months.
        #[arg(long, default_value_t = DEFAULT_HORIZON_MONTHS)]
        horizon: usize,

        /// ARIMA order as p,d,q.
        #[arg(long, default_value = "1,0,1")]
        order: ArimaOrder,

        /// Path to a TOML study config (thresholds and windows).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Export chart panels, model fits, and the markdown study report.
    Report {
        /// Output directory for the report artifacts.
        #[arg(long, default_value = "reports")]
        out_dir: PathBuf,

        /// Path to a TOML study config (thresholds and windows).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Cache management commands.
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Report per-series cache presence, row counts, and date ranges.
    Status {
        /// Data directory. Defaults to ./data.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { force, data_dir } => run_fetch(force, &data_dir),
        Commands::Features { config, data_dir } => run_features(config.as_deref(), &data_dir),
        Commands::Summary { config, data_dir } => run_summary(config.as_deref(), &data_dir),
        Commands::Models {
            horizon,
            order,
            config,
            data_dir,
        } => run_models(horizon, order, config.as_deref(), &data_dir),
        Commands::Report {
            out_dir,
            config,
            data_dir,
        } => run_report(&out_dir, config.as_deref(), &data_dir),
        Commands::Cache { action } => match action {
            CacheAction::Status { data_dir } => run_cache_status(&data_dir),
        },
    }
}

fn run_fetch(force: bool, data_dir: &Path) -> Result<()> {
    let cache = CsvCache::new(data_dir);
    let shiller = ShillerProvider::new();
    let fred = FredProvider::new();
    let builder = DatasetBuilder::new(&cache, &shiller, &fred);

    let table = builder.build_merged(force)?;

    match (table.months().first(), table.months().last()) {
        (Some(first), Some(last)) => {
            println!("Merged table: {} monthly rows, {first} to {last}.", table.len());
        }
        _ => println!("Merged table is empty."),
    }
    println!("Written to {}", data_dir.join(MERGED_RAW_FILE).display());
    Ok(())
}

fn run_features(config_path: Option<&Path>, data_dir: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let cache = CsvCache::new(data_dir);
    let shiller = ShillerProvider::new();
    let fred = FredProvider::new();
    let builder = DatasetBuilder::new(&cache, &shiller, &fred);

    let features = run_pipeline(&cache, &builder, &config, false)?;

    let names: Vec<&str> = features.table.column_names().collect();
    println!(
        "Featured table: {} rows x {} columns.",
        features.table.len(),
        names.len()
    );
    println!("Columns: {}", names.join(", "));
    println!("Written to {}", data_dir.join(FEATURED_FILE).display());
    Ok(())
}

fn run_summary(config_path: Option<&Path>, data_dir: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let features = load_features(data_dir, &config)?;

    let summaries = compute_bubble_summary(&features);
    if summaries.is_empty() {
        println!("No bubble window overlapped the available history.");
        return Ok(());
    }

    println!(
        "{:<14} {:<9} {:>9} {:>11} {:>11} {:>9} {:>7}",
        "Window", "Peak", "Peak CAPE", "Run-up 12m", "Run-up 24m", "Max DD", "Months"
    );
    println!("{}", "-".repeat(76));
    for s in &summaries {
        println!(
            "{:<14} {:<9} {:>9} {:>11} {:>11} {:>9} {:>7}",
            s.window,
            s.peak_month.to_string(),
            num(s.peak_valuation, 1),
            pct(s.runup_12m),
            pct(s.runup_24m),
            pct(s.max_drawdown),
            s.months_to_trough,
        );
    }
    Ok(())
}

fn run_models(
    horizon: usize,
    order: ArimaOrder,
    config_path: Option<&Path>,
    data_dir: &Path,
) -> Result<()> {
    let config = load_config(config_path)?;
    let features = load_features(data_dir, &config)?;

    let regression = regression_valuation_vs_return(&features, horizon)?;
    println!("=== Forward {horizon}m Annualized Return on CAPE ===");
    print!("{}", regression.summary());

    let test = flagged_vs_normal_test(&features, "bubble_flag")?;
    println!();
    println!("=== Flagged vs Normal Months ===");
    println!("Flagged mean:  {} ({} months)", pct(test.mean_a), test.n_a);
    println!("Normal mean:   {} ({} months)", pct(test.mean_b), test.n_b);
    println!("t-statistic:   {:.3}", test.t_stat);
    println!("p-value:       {:.4}", test.p_value);

    let baseline = fit_return_baseline(&features, order)?;
    println!();
    println!("=== Monthly Return Baseline ===");
    print!("{}", baseline.summary());

    let arimax = fit_return_arimax(&features, order)?;
    println!();
    println!("=== Monthly Return on CAPE + Bubble Flag, ARMA Errors ===");
    print!("{}", arimax.summary());

    let wf = return_walk_forward(&features, order, DEFAULT_TRAIN_FRACTION)?;
    println!();
    println!("=== Walk-Forward ({} train / {} test) ===", wf.train_len, wf.test_len);
    println!("Directional accuracy: {:.1}%", wf.directional_accuracy * 100.0);
    println!("Mean absolute error:  {:.5}", wf.mae);

    let summaries = compute_bubble_summary(&features);
    if !summaries.is_empty() {
        println!();
        println!("=== Return Volatility Around Window Peaks ({VOLATILITY_WINDOW}m) ===");
        for s in &summaries {
            let regimes = volatility_regimes(&features, s.peak_month, VOLATILITY_WINDOW);
            println!(
                "{:<14} pre {:>8}  post {:>8}",
                s.window,
                num(regimes.pre_vol, 4),
                num(regimes.post_vol, 4)
            );
        }
    }
    Ok(())
}

fn run_report(out_dir: &Path, config_path: Option<&Path>, data_dir: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let features = load_features(data_dir, &config)?;

    let summaries = compute_bubble_summary(&features);
    // Model sections are skipped when their fit cannot run on the
    // available rows.
    let regression = regression_valuation_vs_return(&features, DEFAULT_HORIZON_MONTHS).ok();
    let flagged = flagged_vs_normal_test(&features, "bubble_flag").ok();
    let walk_forward =
        return_walk_forward(&features, ArimaOrder::default(), DEFAULT_TRAIN_FRACTION).ok();

    let inputs = StudyReportInputs {
        summaries: &summaries,
        regression: regression.as_ref(),
        flagged_returns: flagged.as_ref(),
        walk_forward: walk_forward.as_ref(),
    };

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("failed to create {}", out_dir.display()))?;
    save_study_panels(out_dir, &features)?;
    save_model_fits(&out_dir.join("models.json"), &inputs)?;

    let report_path = out_dir.join("report.md");
    std::fs::write(&report_path, StudyReportGenerator.generate(&inputs))
        .with_context(|| format!("failed to write {}", report_path.display()))?;

    println!("Report artifacts written to {}", out_dir.display());
    Ok(())
}

fn run_cache_status(data_dir: &Path) -> Result<()> {
    let cache = CsvCache::new(data_dir);
    let keys: Vec<&str> = SERIES_CATALOG.iter().map(|spec| spec.key).collect();

    println!("Cache: {}", data_dir.display());
    println!("{:<20} {:>6}  {}", "Series", "Rows", "Date Range");
    println!("{}", "-".repeat(52));
    for status in cache.status(&keys) {
        match (status.rows, status.start, status.end) {
            (Some(rows), Some(start), Some(end)) => {
                println!("{:<20} {:>6}  {start} to {end}", status.key, rows);
            }
            _ => println!("{:<20} {:>6}  (not cached)", status.key, "-"),
        }
    }

    println!();
    for file in [MERGED_RAW_FILE, FEATURED_FILE] {
        let state = if data_dir.join(file).exists() {
            "present"
        } else {
            "absent"
        };
        println!("{file}: {state}");
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<StudyConfig> {
    match path {
        Some(p) => StudyConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(StudyConfig::default()),
    }
}

/// Read the persisted featured table, relabelled with the configured windows.
fn load_features(data_dir: &Path, config: &StudyConfig) -> Result<FeatureTable> {
    let path = data_dir.join(FEATURED_FILE);
    let table = read_table(&path).with_context(|| {
        format!(
            "no featured table at {} (run `features` first)",
            path.display()
        )
    })?;
    Ok(FeatureTable {
        table,
        windows: config.windows.clone(),
    })
}

fn pct(value: f64) -> String {
    if value.is_finite() {
        format!("{:+.2}%", value * 100.0)
    } else {
        "n/a".to_string()
    }
}

fn num(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        "n/a".to_string()
    }
}
