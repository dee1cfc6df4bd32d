use anyhow::{Context, Result, anyhow};
use clap::Parser;
use phdsnp_batch::{
    command::{DEFAULT_PYTHON_BIN, PredictorCommand},
    loader,
    output::{self, OutputFormat},
    scheduler::{ProcessPool, clamp_concurrency},
};
use std::{path::PathBuf, time::Instant};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Submit multiple mutations to PhD-SNP and collect the predictions.
#[derive(Debug, Parser)]
#[command(name = "phdsnp_batch", version)]
struct Args {
    /// Batch input file, one `mode|sequence|position|new_residue` job per line
    #[arg(long)]
    input: PathBuf,

    /// Output file name
    #[arg(long)]
    output: PathBuf,

    /// Number of predictor processes to run in parallel
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    processes: u32,

    /// PhD-SNP installation directory containing PhD-SNP.py
    #[arg(long, env = "PHDHOME")]
    phd_home: Option<PathBuf>,

    /// Python interpreter used to run PhD-SNP.py
    #[arg(long, env = "PHDSNP_PYTHON", default_value = DEFAULT_PYTHON_BIN)]
    python: String,

    #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
    format: OutputFormat,
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Err(e) = run(Args::parse()) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let phd_home = args
        .phd_home
        .filter(|dir| !dir.as_os_str().is_empty())
        .ok_or_else(|| anyhow!("PhD-SNP installation directory not set; pass --phd-home or set PHDHOME"))?;
    let command = PredictorCommand::from_install_dir(args.python.trim(), &phd_home);

    let jobs = loader::load_from_file(&args.input)?;
    let processes = clamp_concurrency(args.processes as usize, jobs.len());
    println!("Running PhD-SNP on {processes} cores...");

    let start = Instant::now();
    let mut pool = ProcessPool::new(command, processes);
    let outcome = pool.run(&jobs, |progress| {
        println!("Completed {}/{}", progress.completed, progress.total);
    });
    println!("Time taken: {:.3?}", start.elapsed());

    output::write_to_path(&outcome.records, &args.output, args.format)
        .with_context(|| format!("Could not write results to '{}'", args.output.display()))?;
    Ok(())
}
