use super::construct_theory;
use crate::cli::RunArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use lieper::core::series::PoissonSeries;
use lieper::engine::progress::ProgressReporter;
use lieper::engine::theory::PerturbationTheory;
use lieper::workflows::{self, propagate::Trajectory};
use std::io;
use tracing::info;

pub fn run(args: RunArgs, quiet: bool) -> Result<()> {
    info!("Merging configuration from file and CLI arguments...");
    let config = build_config(&args.theory)?;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let mut theory = construct_theory(&config, &reporter)?;
    if args.show_series {
        print_series(&theory);
    }

    info!(
        samples = config.times.len(),
        "Evaluating the trajectory from the initial conditions..."
    );
    let trajectory =
        workflows::propagate::run(&mut theory, &config.initial, &config.times, &reporter)?;

    match &args.output {
        Some(path) => {
            let file = std::fs::File::create(path)?;
            write_trajectory(&trajectory, file)?;
            println!(
                "✓ Trajectory with {} sample(s) written to: {}",
                trajectory.len(),
                path.display()
            );
        }
        None => write_trajectory(&trajectory, io::stdout().lock())?,
    }
    Ok(())
}

fn print_series(theory: &PerturbationTheory<PoissonSeries>) {
    println!("Mean Hamiltonian (order {}):", theory.order());
    println!("  {}", theory.mean_hamiltonian());
    for (i, generator) in theory.generators().iter().enumerate() {
        println!("Generator {}:", i + 1);
        println!("  {}", generator);
    }
}

/// Writes one CSV row per sample: the time followed by every quantity in sorted order.
pub fn write_trajectory<W: io::Write>(trajectory: &Trajectory, writer: W) -> Result<()> {
    let columns = trajectory.columns();
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec!["t".to_string()];
    header.extend(columns.iter().cloned());
    csv_writer.write_record(&header)?;

    for sample in &trajectory.samples {
        let mut record = vec![sample.time.to_string()];
        record.extend(columns.iter().map(|name| {
            sample
                .state
                .get(name)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}
