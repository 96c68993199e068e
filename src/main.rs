//! micro-etl-bench - cache-aware micro-ETL benchmark
//!
//! Generates synthetic event datasets and times aggregation strategies
//! over them, individually or as a sweep across working-set sizes.

use anyhow::Result;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use micro_etl_bench::benchmark::{
    format_count, results_table, run_single, timed, write_results_csv, write_results_json,
    RunOptions, SweepHarness,
};
use micro_etl_bench::config::{BenchConfig, CliArgs, Command, GenerateArgs, RunArgs, SweepArgs};
use micro_etl_bench::dataset::{generate_and_save, BinaryDataset, DataGenerator, DatasetFormat};
use micro_etl_bench::strategy::VariantRegistry;

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else if verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }
}

fn print_info(config: &BenchConfig, registry: &VariantRegistry) {
    println!("micro-etl-bench v{}", env!("CARGO_PKG_VERSION"));
    println!("====================================");
    println!("{}", config);
    println!("====================================\n");

    let mut builder = Builder::default();
    builder.push_record(["Id", "Name", "Default Format", "Allowed Formats"].map(String::from));
    for variant in registry.iter() {
        builder.push_record([
            variant.id.to_uppercase(),
            variant.name.clone(),
            variant.default_format.to_string(),
            variant
                .allowed_formats
                .iter()
                .map(DatasetFormat::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

fn cmd_generate(config: &BenchConfig, args: &GenerateArgs) -> Result<()> {
    let rows = args.rows.unwrap_or(config.default_rows);
    let generator = DataGenerator::new(config.seed);
    let path = timed("generate", || {
        generate_and_save(config, &generator, rows, args.format, args.output.as_deref())
    })?;

    if args.format == DatasetFormat::Binary {
        let dataset = BinaryDataset::open(&path)?;
        info!("{}", dataset.summary());
    }
    println!("{}", path.display());
    Ok(())
}

fn cmd_run(config: &BenchConfig, registry: &VariantRegistry, args: &RunArgs) -> Result<()> {
    let options = RunOptions {
        variant: args.variant.clone(),
        input: args.input.clone(),
        rows: args.rows,
        format: args.format,
        output: args.output.clone(),
        auto_generate: !args.no_auto_generate,
    };
    let outcome = run_single(config, registry, &options)?;

    info!("Aggregation complete");
    for row in &outcome.rows {
        println!(
            "event_type={} count={} sum={:.4} mean={:.4}",
            row.event_type,
            format_count(row.count),
            row.sum,
            row.mean
        );
    }
    println!(
        "Variant {} ({}) finished in {:.4}s",
        outcome.variant.to_uppercase(),
        outcome.variant_name,
        outcome.seconds
    );
    if let Some(ref output) = args.output {
        info!("Aggregate rows written to {}", output.display());
    }
    Ok(())
}

fn cmd_sweep(config: &BenchConfig, registry: &VariantRegistry, args: &SweepArgs) -> Result<()> {
    let variants: Vec<String> = if args.variants.is_empty() {
        registry.ids()
    } else {
        args.variants.iter().map(|v| v.to_lowercase()).collect()
    };

    let results = SweepHarness::new(config, registry)
        .with_progress(args.progress)
        .run(&variants, &args.sizes_kb, config.seed)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.sweep_results_path());
    if write_results_csv(&results, &output)? {
        info!("Sweep complete. Results written to {}", output.display());
    } else {
        info!("No results produced");
        return Ok(());
    }

    if let Some(ref json) = args.json {
        write_results_json(&results, json)?;
        info!("JSON summary written to {}", json.display());
    }

    println!("{}", results_table(&results));
    Ok(())
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse_args();

    // Setup logging
    setup_logging(args.global.verbose, args.global.quiet);

    args.validate()
        .map_err(|e| anyhow::anyhow!("Invalid arguments: {}", e))?;

    // Build configuration
    let config = BenchConfig::from_cli(&args.global)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    config.ensure_dirs()?;

    let registry = VariantRegistry::builtin();

    match args.command {
        Command::Info => print_info(&config, &registry),
        Command::Generate(ref generate) => cmd_generate(&config, generate)?,
        Command::Run(ref run) => cmd_run(&config, &registry, run)?,
        Command::Sweep(ref sweep) => cmd_sweep(&config, &registry, sweep)?,
    }

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}
