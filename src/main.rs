use clap::{Parser, Subcommand, ValueEnum};
use flock_analysis::error::AnalysisResult;
use flock_analysis::trajectory::{BoundaryStyle, Delimiter};
use flock_analysis::{polarization, statistics, summary};
use std::path::PathBuf;
use std::process;

#[derive(Parser)]
#[command(name = "flock-analysis", about = "Order-parameter statistics for flocking simulation logs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compute the per-frame polarization series of one trajectory log
    Export {
        /// Trajectory log file
        log: PathBuf,
        /// Output series file; defaults to output_<axis>_<value>.txt
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the particle speed instead of reading it from the log
        #[arg(long)]
        speed: Option<f64>,
        /// Step-boundary syntax of the log
        #[arg(long, value_enum, default_value_t = BoundaryArg::Auto)]
        boundary: BoundaryArg,
        /// Field delimiter of particle records
        #[arg(long, value_enum, default_value_t = DelimiterArg::Auto)]
        delimiter: DelimiterArg,
    },
    /// Aggregate a directory of polarization series into a summary table
    Aggregate {
        /// Directory of per-run series files
        dir: PathBuf,
        /// Summary table to write
        #[arg(short, long, default_value = "avg-polarization.txt")]
        output: PathBuf,
        /// Burn-in samples to discard from the start of every series
        #[arg(long, default_value_t = 0)]
        skip: usize,
        /// Also write the rows as a JSON snapshot
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Print the statistics of a single polarization series
    Average {
        /// Series file, one value per line
        file: PathBuf,
        /// Burn-in samples to discard
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },
    /// Print a summary table (current or legacy schema)
    Show {
        /// Summary table file
        table: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BoundaryArg {
    Auto,
    Dash,
    Colon,
    Equals,
}

impl BoundaryArg {
    fn resolve(self) -> Option<BoundaryStyle> {
        match self {
            BoundaryArg::Auto => None,
            BoundaryArg::Dash => Some(BoundaryStyle::Dash),
            BoundaryArg::Colon => Some(BoundaryStyle::Colon),
            BoundaryArg::Equals => Some(BoundaryStyle::Equals),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DelimiterArg {
    Auto,
    Semicolon,
    Whitespace,
}

impl DelimiterArg {
    fn resolve(self) -> Option<Delimiter> {
        match self {
            DelimiterArg::Auto => None,
            DelimiterArg::Semicolon => Some(Delimiter::Semicolon),
            DelimiterArg::Whitespace => Some(Delimiter::Whitespace),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Command) -> AnalysisResult<()> {
    match command {
        Command::Export {
            log,
            output,
            speed,
            boundary,
            delimiter,
        } => {
            println!("Reading trajectory log {}...", log.display());
            let outcome = polarization::export_series(
                &log,
                output.as_deref(),
                speed,
                boundary.resolve(),
                delimiter.resolve(),
            )?;

            let params = &outcome.params;
            if let (Some(n), Some(l)) = (params.particle_count, params.box_size) {
                println!("Run: N = {}, L = {}", n, l);
            }
            if let (Some(axis), Some(value)) = (params.sweep_axis, params.sweep_value) {
                println!("Sweep: {} = {}", axis.label(), value);
            }
            println!("Wrote {} frames to {}", outcome.frames, outcome.path.display());
        }
        Command::Aggregate {
            dir,
            output,
            skip,
            json,
        } => {
            println!("Aggregating series in {}...", dir.display());
            let rows = statistics::aggregate_dir(&dir, skip)?;
            summary::write_table(&output, &rows)?;
            if let Some(json_path) = json {
                summary::write_json(&json_path, &rows)?;
            }
            println!("Wrote {} rows to {}", rows.len(), output.display());
        }
        Command::Average { file, skip } => {
            let stats = statistics::series_stats(&file, skip)?;
            println!("Samples:   {}", stats.count);
            println!("Mean:      {:.6}", stats.mean);
            println!("Std:       {:.6}", stats.std);
            println!("Std error: {:.6}", stats.stderr);
        }
        Command::Show { table } => {
            let rows = summary::read_table(&table)?;
            println!("{:>10} {:>8} {:>12} {:>12} {:>12}", "sweep", "n", "mean", "std", "stderr");
            for row in &rows {
                println!(
                    "{:>10.4} {:>8} {:>12.6} {:>12.6} {:>12.6}",
                    row.sweep_value, row.sample_count, row.mean, row.std, row.stderr
                );
            }
        }
    }

    Ok(())
}
