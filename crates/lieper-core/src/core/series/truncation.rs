use super::{Series, SeriesError};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{ToPrimitive, Zero};
use serde::Deserialize;

/// Rule bounding which terms of an expansion are retained.
///
/// The policy is an explicit value: it is stored in the theory configuration and
/// handed to every series-producing call, never read from global state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum Truncation {
    #[default]
    None,
    /// Drops terms whose total degree is `>= limit`.
    Degree { limit: i32 },
    /// Drops terms whose degree in `symbols` is `>= limit`.
    PartialDegree { symbols: Vec<String>, limit: i32 },
}

impl Truncation {
    /// Partial-degree truncation on a single symbol, the common case for a small parameter.
    pub fn on_symbol(symbol: &str, limit: i32) -> Self {
        Self::PartialDegree {
            symbols: vec![symbol.to_string()],
            limit,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Number of terms of the power-series expansion in `series` that survive this policy.
    ///
    /// The expansion is `Σ_k a_k · series^(start + k·step)`; the result is the number of
    /// values of `k` whose power still has a (partial) minimum degree below the limit.
    pub fn psi<S: Series>(&self, series: &S, start: i32, step: i32) -> Result<usize, SeriesError> {
        if step < 1 {
            return Err(SeriesError::Truncation(
                "please use a step size of at least 1".to_string(),
            ));
        }
        let (order, limit) = match self {
            Self::None => {
                return Err(SeriesError::Truncation(
                    "cannot calculate the limit of a power series expansion if no degree limit has been set"
                        .to_string(),
                ));
            }
            Self::Degree { limit } => (series.order(), *limit),
            Self::PartialDegree { symbols, limit } => (series.partial_order(symbols), *limit),
        };
        let order = order.ok_or_else(|| {
            SeriesError::Truncation(
                "cannot calculate the limit of the power series expansion of an empty series"
                    .to_string(),
            )
        })?;
        if order <= 0 {
            return Err(SeriesError::Truncation(format!(
                "minimum degree {} of the expanded series must be positive",
                order
            )));
        }
        if limit < 0 {
            return Err(SeriesError::Truncation(format!(
                "degree limit {} must not be negative",
                limit
            )));
        }

        // (limit / order - start) / step + 1
        let ratio = |n: i32| BigRational::from_integer(BigInt::from(n));
        let tmp = (ratio(limit) / ratio(order) - ratio(start)) / ratio(step) + ratio(1);
        if tmp <= BigRational::zero() {
            return Ok(0);
        }
        let floor = tmp.floor().to_integer().to_usize().unwrap_or(0);
        if tmp.is_integer() {
            Ok(floor.saturating_sub(1))
        } else {
            Ok(floor)
        }
    }
}
