//! tradeplot CLI — broker trade history to Pine Script overlays.
//!
//! Commands:
//! - `instruments` — list the instruments in an export with their trade counts
//! - `render` — classify a window of trades and expand the Pine template
//! - `convert` — re-encode an export as UTF-8

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use tradeplot_core::config::RenderProfile;
use tradeplot_core::data::encoding;
use tradeplot_core::export::{write_trades_csv, write_trades_json, TradeDump};
use tradeplot_core::range::default_end;
use tradeplot_core::{
    classify_and_select, load_table_file, render_template_file, Category, LoadedExport,
};

/// Template used when neither the flags nor the profile name one.
const DEFAULT_TEMPLATE: &str = "templates/trade_plotter.pine";

#[derive(Parser)]
#[command(
    name = "tradeplot",
    about = "tradeplot — render broker trade history as a Pine Script overlay"
)]
struct Cli {
    /// Log resolution decisions (encoding, columns, ordering) to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List instruments in a trade export with their trade counts.
    Instruments {
        /// Broker trade-history CSV.
        csv: PathBuf,
    },
    /// Render a window of one instrument's trades into the Pine template.
    Render(RenderArgs),
    /// Re-encode a Shift_JIS / CP932 / EUC-JP export as UTF-8.
    Convert {
        /// Export to read.
        input: PathBuf,
        /// Where to write the UTF-8 copy.
        output: PathBuf,
    },
}

#[derive(Args)]
struct RenderArgs {
    /// Path to a TOML render profile. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Broker trade-history CSV.
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Pine Script template. Defaults to templates/trade_plotter.pine.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Instrument label exactly as it appears in the export.
    #[arg(long)]
    instrument: Option<String>,

    /// First trade to render (1-based). Defaults to 1.
    #[arg(long)]
    start: Option<usize>,

    /// Last trade to render, inclusive. Defaults to start + 199 or the last trade.
    #[arg(long)]
    end: Option<usize>,

    /// Output file. Defaults to trade_plotter_pinescript_updated.txt.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also dump the selected trades (JSON, or a CSV tape for a .csv path).
    #[arg(long)]
    dump: Option<PathBuf>,
}

impl RenderArgs {
    /// Flag values as a profile, merged over the `--config` file if given.
    fn into_profile(self) -> Result<RenderProfile> {
        let flags = RenderProfile {
            csv: self.csv,
            template: self.template,
            instrument: self.instrument,
            start: self.start,
            end: self.end,
            output: self.output,
            dump: self.dump,
        };
        match self.config {
            Some(path) => Ok(flags.or(RenderProfile::from_file(&path)?)),
            None => Ok(flags),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Instruments { csv } => run_instruments(&csv),
        Commands::Render(args) => run_render(args.into_profile()?),
        Commands::Convert { input, output } => run_convert(&input, &output),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_instruments(csv: &Path) -> Result<()> {
    let loaded = load_table_file(csv)?;
    let instruments = loaded.table.instruments();

    println!(
        "{} ({}, {} rows)",
        csv.display(),
        loaded.encoding,
        loaded.table.len()
    );
    if instruments.is_empty() {
        println!("No instruments found.");
        return Ok(());
    }

    println!("{:>8}  Instrument", "Trades");
    println!("{}", "-".repeat(40));
    for summary in &instruments {
        println!("{:>8}  {}", summary.trades, summary.name);
    }
    Ok(())
}

fn run_render(profile: RenderProfile) -> Result<()> {
    debug!(?profile, "render profile");
    let Some(csv) = profile.csv.as_deref() else {
        bail!("no trade export given: pass --csv or set `csv` in the profile");
    };
    let loaded = load_table_file(csv)?;

    let Some(instrument) = profile.instrument.as_deref() else {
        let names: Vec<String> = loaded
            .table
            .instruments()
            .into_iter()
            .map(|s| s.name)
            .collect();
        bail!(
            "no instrument given: pass --instrument. Instruments in {}: {}",
            csv.display(),
            names.join(", ")
        );
    };

    let total = loaded.table.records_for(instrument).count();
    let start = profile.start.unwrap_or(1);
    let end = profile.end.unwrap_or_else(|| default_end(start, total));

    let selection = classify_and_select(&loaded.table, instrument, start, end)?;

    let template = profile
        .template
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATE));
    let script = render_template_file(&template, &selection.trades, instrument)?;

    // A failed dump must leave no script on disk.
    if let Some(dump_path) = profile.dump.as_deref() {
        write_dump(dump_path, &loaded, &selection)?;
        println!("Trades dumped to: {}", dump_path.display());
    }

    let output = profile.output_or_default();
    std::fs::write(&output, script)
        .with_context(|| format!("Failed to write script {}", output.display()))?;

    print_summary(&loaded, &selection, &output);
    Ok(())
}

fn write_dump(
    path: &Path,
    loaded: &LoadedExport,
    selection: &tradeplot_core::Selection,
) -> Result<()> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        write_trades_csv(path, &selection.trades)
    } else {
        write_trades_json(path, &TradeDump::new(loaded, selection))
    }
}

fn print_summary(loaded: &LoadedExport, selection: &tradeplot_core::Selection, output: &Path) {
    println!();
    println!("=== {} ===", selection.instrument);
    println!("Source encoding: {}", loaded.encoding);
    println!(
        "Trades:          {}..={} of {} ({} rendered)",
        selection.start,
        selection.end,
        selection.total,
        selection.trades.len()
    );
    if !selection.warnings.is_empty() {
        println!(
            "Warnings:        {} numeric cell(s) did not parse and render as `na`",
            selection.warnings.len()
        );
    }
    println!("Script written to: {}", output.display());

    println!();
    println!("Legend:");
    for (category, count) in selection.category_counts() {
        if category == Category::Unknown && count == 0 {
            continue;
        }
        println!("  {:<8} {:<28} {:>5}", category.tag(), category.description(), count);
    }
}

fn run_convert(input: &Path, output: &Path) -> Result<()> {
    let bytes =
        std::fs::read(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let decoded = encoding::resolve(&bytes)?;
    std::fs::write(output, &decoded.text)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!(
        "Converted {} ({}) -> {} (utf-8)",
        input.display(),
        decoded.encoding,
        output.display()
    );
    Ok(())
}
