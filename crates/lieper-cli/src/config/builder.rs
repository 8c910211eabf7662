use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileMeanFlow, FileSolverConfig, FileTimesConfig};
use super::models::{AppConfig, MeanFlowKind};
use crate::cli::TheoryArgs;
use crate::error::{CliError, Result};
use lieper::core::series::{PoissonSeries, Series, Truncation};
use lieper::engine::config::TheoryConfigBuilder;
use lieper::engine::solver::IntegratingFactorSolver;

pub fn build_config(args: &TheoryArgs) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = FileConfig::from_file(&args.config)?;
    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let theory_file = file_config.theory.take().unwrap_or_default();
    let eps = theory_file.eps.unwrap_or_else(|| defaults.eps.clone());
    let order = args.order.or(theory_file.order).unwrap_or(defaults.order);
    if order == 0 {
        return Err(CliError::Argument(
            "the perturbation order must be at least 1".to_string(),
        ));
    }
    let truncation = theory_file
        .truncation
        .unwrap_or_else(|| Truncation::on_symbol(&eps, order as i32 + 1));

    let mut builder = TheoryConfigBuilder::new().eps(eps).truncation(truncation);
    if let Some(momenta) = theory_file.momenta {
        builder = builder.momenta(momenta);
    }
    if let Some(coordinates) = theory_file.coordinates {
        builder = builder.coordinates(coordinates);
    }
    let core_config = builder.build().map_err(|e| CliError::Config(e.to_string()))?;

    if file_config.hamiltonian.is_empty() {
        return Err(CliError::Config(
            "the theory description contains no Hamiltonian terms".to_string(),
        ));
    }
    let hamiltonian = PoissonSeries::from_specs(&file_config.hamiltonian)?;

    let default_angle = core_config.coordinates.first().cloned();
    let solver = merge_solver(file_config.solver.take().unwrap_or_default(), default_angle)?;

    let mean_flow = match file_config.mean_flow {
        Some(FileMeanFlow::Frozen) => MeanFlowKind::Frozen,
        Some(FileMeanFlow::SecularDrift) | None => MeanFlowKind::SecularDrift,
    };

    let times = merge_times(file_config.times.take().unwrap_or_default(), &defaults)?;

    Ok(AppConfig {
        hamiltonian,
        core_config,
        order,
        solver,
        mean_flow,
        initial: file_config.initial,
        times,
    })
}

fn merge_solver(
    file: FileSolverConfig,
    default_angle: Option<String>,
) -> Result<IntegratingFactorSolver<PoissonSeries>> {
    let angle = file.angle.or(default_angle).ok_or_else(|| {
        CliError::Config("the solver needs an angle to integrate over".to_string())
    })?;
    let factor = if file.factor.is_empty() {
        PoissonSeries::one()
    } else {
        PoissonSeries::from_specs(&file.factor)?
    };
    Ok(if file.periodic_only.unwrap_or(false) {
        IntegratingFactorSolver::periodic(angle, factor)
    } else {
        IntegratingFactorSolver::new(angle, factor)
    })
}

fn merge_times(file: FileTimesConfig, defaults: &DefaultsConfig) -> Result<Vec<f64>> {
    if let Some(values) = file.values {
        return Ok(values);
    }
    let start = file.start.unwrap_or(defaults.time_start);
    let stop = file.stop.unwrap_or(defaults.time_stop);
    let steps = file.steps.unwrap_or(defaults.time_steps);
    match steps {
        0 => Err(CliError::Config("times.steps must be at least 1".to_string())),
        1 => Ok(vec![start]),
        n => {
            let dt = (stop - start) / (n - 1) as f64;
            Ok((0..n).map(|i| start + i as f64 * dt).collect())
        }
    }
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    for kv_pair in set_values {
        let parts: Vec<_> = kv_pair.splitn(2, '=').collect();
        if parts.len() != 2 {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        }
        let key = parts[0];
        let value_str = parts[1];

        match key {
            "theory.eps" => {
                config.theory.get_or_insert_with(Default::default).eps =
                    Some(value_str.to_string());
            }
            "theory.order" => {
                config.theory.get_or_insert_with(Default::default).order =
                    Some(parse_value(key, value_str)?);
            }
            "solver.angle" => {
                config.solver.get_or_insert_with(Default::default).angle =
                    Some(value_str.to_string());
            }
            "solver.periodic-only" => {
                config.solver.get_or_insert_with(Default::default).periodic_only =
                    Some(parse_value(key, value_str)?);
            }
            "mean-flow" => {
                config.mean_flow = Some(match value_str {
                    "secular-drift" => FileMeanFlow::SecularDrift,
                    "frozen" => FileMeanFlow::Frozen,
                    _ => {
                        return Err(CliError::Config(format!(
                            "Unknown mean flow '{}'. Expected 'secular-drift' or 'frozen'.",
                            value_str
                        )));
                    }
                });
            }
            "times.start" => {
                config.times.get_or_insert_with(Default::default).start =
                    Some(parse_value(key, value_str)?);
            }
            "times.stop" => {
                config.times.get_or_insert_with(Default::default).stop =
                    Some(parse_value(key, value_str)?);
            }
            "times.steps" => {
                config.times.get_or_insert_with(Default::default).steps =
                    Some(parse_value(key, value_str)?);
            }
            _ => match key.strip_prefix("initial.") {
                Some(name) if !name.is_empty() => {
                    config
                        .initial
                        .insert(name.to_string(), parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unknown configuration key for --set: '{}'",
                        key
                    )));
                }
            },
        }
    }
    Ok(config)
}

fn parse_value<T: std::str::FromStr>(key: &str, value_str: &str) -> Result<T> {
    value_str
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value_str)))
}
