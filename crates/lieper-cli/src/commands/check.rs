use super::construct_theory;
use crate::cli::CheckArgs;
use crate::config::build_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use lieper::engine::progress::ProgressReporter;
use tracing::{info, warn};

pub fn run(args: CheckArgs, quiet: bool) -> Result<()> {
    let config = build_config(&args.theory)?;

    let progress_handler = if quiet {
        CliProgressHandler::hidden()
    } else {
        CliProgressHandler::new()
    };
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());
    let theory = construct_theory(&config, &reporter)?;

    info!("Checking canonicity of {} direct transform(s)...", theory.order());
    let violations = theory.canonicity_violations()?;
    if violations.is_empty() {
        println!(
            "✓ All {} transformation(s) are canonical up to order {}.",
            theory.order(),
            theory.order()
        );
        return Ok(());
    }

    for (step, a, b) in &violations {
        warn!(step = *step, "Bracket {{{}', {}'}} is not preserved.", a, b);
        println!("✗ Level {}: bracket {{{}', {}'}} is not preserved.", step, a, b);
    }
    Err(CliError::Verification(format!(
        "{} canonical relation(s) violated",
        violations.len()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::TheoryArgs;
    use std::io::Write;

    #[test]
    fn periodic_theory_passes_the_check() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(
            br#"
[theory]
momenta = ["Lam"]
coordinates = ["lam"]
order = 2

[[hamiltonian]]
coefficient = "-1/2"
powers = { Lam = -2 }

[[hamiltonian]]
coefficient = "1"
powers = { eps = 1, Lam = 1 }
harmonics = { lam = 1 }

[solver]
periodic-only = true
factor = [{ coefficient = "1", powers = { Lam = 3 } }]
"#,
        )
        .unwrap();

        let args = CheckArgs {
            theory: TheoryArgs {
                config: file.path().to_path_buf(),
                order: None,
                set_values: vec![],
            },
        };
        assert!(run(args, true).is_ok());
    }
}
