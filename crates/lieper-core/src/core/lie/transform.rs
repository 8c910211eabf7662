use super::LieError;
use super::bracket::{PhaseSpace, poisson_bracket};
use crate::core::series::{Series, Truncation, inverse_factorial};

/// The `n`-th repeated Lie derivative `L^n_χ arg`, with `L_χ f = {f, χ}`.
///
/// `n = 0` returns `arg` unchanged. No intermediate results are kept; see
/// [`LieCache`](crate::engine::cache::LieCache) for the memoized variant.
pub fn lie_derivative<S: Series>(
    generator: &S,
    arg: &S,
    space: &PhaseSpace,
    truncation: &Truncation,
    n: usize,
) -> S {
    (0..n).fold(arg.clone(), |acc, _| {
        poisson_bracket(&acc, generator, space, truncation)
    })
}

/// The truncated Lie series `Σ_{k=0}^{limit-1} eps_power^k / k! · L^k_χ arg`.
///
/// With `limit = None` the number of terms is derived from `truncation` via
/// [`Truncation::psi`] on `eps_power`, which fails when the policy is inactive.
/// `limit = Some(0)` yields the zero series. Passing `-χ` as generator gives the inverse
/// transformation.
pub fn lie_series<S: Series>(
    eps_power: &S,
    generator: &S,
    arg: &S,
    space: &PhaseSpace,
    truncation: &Truncation,
    limit: Option<usize>,
) -> Result<S, LieError> {
    let limit = match limit {
        Some(limit) => limit,
        None => truncation.psi(eps_power, 0, 1)?,
    };
    if limit == 0 {
        return Ok(S::zero());
    }

    let mut result = arg.clone();
    let mut derivative = arg.clone();
    let mut eps_k = S::one();
    for k in 1..limit {
        derivative = poisson_bracket(&derivative, generator, space, truncation);
        if derivative.is_zero() {
            break;
        }
        eps_k = (eps_k * eps_power.clone()).truncated(truncation);
        let term = eps_k.clone() * derivative.clone() * inverse_factorial::<S>(k);
        result = (result + term).truncated(truncation);
    }
    Ok(result.truncated(truncation))
}
