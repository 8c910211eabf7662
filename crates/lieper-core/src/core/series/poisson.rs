use super::key::{Flavor, Key};
use super::{Series, SeriesError, StateDict, Truncation};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::Deserialize;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Declarative description of a single term, as found in configuration files.
///
/// `coefficient` is an exact rational written as `"p"` or `"p/q"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TermSpec {
    pub coefficient: String,
    #[serde(default)]
    pub powers: BTreeMap<String, i32>,
    #[serde(default)]
    pub harmonics: BTreeMap<String, i32>,
    #[serde(default)]
    pub flavor: Flavor,
}

/// Series that can be integrated term by term in a single variable.
pub trait Integrable: Series {
    fn integrate(&self, var: &str) -> Result<Self, SeriesError>;

    /// Mean over the angle `var`: the terms whose trigonometric argument does not
    /// involve `var`.
    fn average(&self, var: &str) -> Self;
}

/// Sparse Poisson series with exact rational coefficients.
///
/// Each term is `c · Π x^n · cos|sin(Σ k·θ)` with integer (possibly negative) exponents
/// and integer trigonometric multipliers. A symbol may appear both polynomially and
/// inside the trigonometric argument.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PoissonSeries {
    terms: BTreeMap<Key, BigRational>,
}

impl PoissonSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_term(
        coefficient: BigRational,
        powers: BTreeMap<String, i32>,
        harmonics: BTreeMap<String, i32>,
        flavor: Flavor,
    ) -> Self {
        let mut series = Self::new();
        if let Some((key, sign)) = Key::canonical(powers, harmonics, flavor) {
            series.accumulate(key, coefficient * BigInt::from(sign));
        }
        series
    }

    pub fn from_spec(spec: &TermSpec) -> Result<Self, SeriesError> {
        let coefficient: BigRational = spec
            .coefficient
            .trim()
            .parse()
            .map_err(|_| SeriesError::InvalidCoefficient(spec.coefficient.clone()))?;
        Ok(Self::from_term(
            coefficient,
            spec.powers.clone(),
            spec.harmonics.clone(),
            spec.flavor,
        ))
    }

    pub fn from_specs(specs: &[TermSpec]) -> Result<Self, SeriesError> {
        specs
            .iter()
            .try_fold(Self::new(), |acc, spec| Ok(acc + Self::from_spec(spec)?))
    }

    /// `cos(var)` with unit coefficient.
    pub fn cos_of(var: &str) -> Self {
        Self::from_term(
            BigRational::one(),
            BTreeMap::new(),
            BTreeMap::from([(var.to_string(), 1)]),
            Flavor::Cos,
        )
    }

    /// `sin(var)` with unit coefficient.
    pub fn sin_of(var: &str) -> Self {
        Self::from_term(
            BigRational::one(),
            BTreeMap::new(),
            BTreeMap::from([(var.to_string(), 1)]),
            Flavor::Sin,
        )
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> impl Iterator<Item = (&Key, &BigRational)> {
        self.terms.iter()
    }

    pub fn coefficient(&self, key: &Key) -> Option<&BigRational> {
        self.terms.get(key)
    }

    fn accumulate(&mut self, key: Key, coefficient: BigRational) {
        if coefficient.is_zero() {
            return;
        }
        match self.terms.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(coefficient);
            }
            Entry::Occupied(mut slot) => {
                *slot.get_mut() += coefficient;
                if slot.get().is_zero() {
                    slot.remove();
                }
            }
        }
    }

    fn multiply(&self, other: &Self) -> Self {
        let mut out = Self::new();
        for (k1, c1) in &self.terms {
            for (k2, c2) in &other.terms {
                let base = c1 * c2;
                for (key, (numer, denom)) in k1.product(k2) {
                    let factor = BigRational::new(BigInt::from(numer), BigInt::from(denom));
                    out.accumulate(key, &base * factor);
                }
            }
        }
        out
    }

    fn retain_terms<F>(&self, keep: F) -> Self
    where
        F: Fn(&Key) -> bool,
    {
        Self {
            terms: self
                .terms
                .iter()
                .filter(|(key, _)| keep(key))
                .map(|(key, c)| (key.clone(), c.clone()))
                .collect(),
        }
    }

    /// The integer linear combination of symbols represented by this series, if any.
    fn as_linear_combination(&self) -> Option<BTreeMap<String, i32>> {
        let mut combination = BTreeMap::new();
        for (key, c) in &self.terms {
            if key.is_trigonometric() || key.powers().len() != 1 || !c.is_integer() {
                return None;
            }
            let (var, n) = key.powers().iter().next()?;
            if *n != 1 {
                return None;
            }
            combination.insert(var.clone(), c.to_integer().to_i32()?);
        }
        Some(combination)
    }
}

impl Add for PoissonSeries {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self::Output {
        for (key, c) in rhs.terms {
            self.accumulate(key, c);
        }
        self
    }
}

impl Sub for PoissonSeries {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        self + (-rhs)
    }
}

impl Neg for PoissonSeries {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self {
            terms: self.terms.into_iter().map(|(key, c)| (key, -c)).collect(),
        }
    }
}

impl Mul for PoissonSeries {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}

impl Series for PoissonSeries {
    fn zero() -> Self {
        Self::new()
    }

    fn one() -> Self {
        Self::from_integer(1)
    }

    fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    fn symbol(name: &str) -> Self {
        Self::from_term(
            BigRational::one(),
            BTreeMap::from([(name.to_string(), 1)]),
            BTreeMap::new(),
            Flavor::Cos,
        )
    }

    fn from_integer(value: i64) -> Self {
        Self::from_term(
            BigRational::from_integer(BigInt::from(value)),
            BTreeMap::new(),
            BTreeMap::new(),
            Flavor::Cos,
        )
    }

    fn from_ratio(numer: i64, denom: i64) -> Self {
        Self::from_term(
            BigRational::new(BigInt::from(numer), BigInt::from(denom)),
            BTreeMap::new(),
            BTreeMap::new(),
            Flavor::Cos,
        )
    }

    fn pow(&self, exponent: i32) -> Result<Self, SeriesError> {
        let base = if exponent < 0 {
            let (key, c) = match (self.terms.len(), self.terms.iter().next()) {
                (1, Some(term)) if !term.0.is_trigonometric() => term,
                _ => {
                    return Err(SeriesError::NotInvertible(format!(
                        "negative power of '{}' requires a single polynomial term",
                        self
                    )));
                }
            };
            let powers = key
                .powers()
                .iter()
                .map(|(var, n)| (var.clone(), -n))
                .collect();
            Self::from_term(c.recip(), powers, BTreeMap::new(), Flavor::Cos)
        } else {
            self.clone()
        };

        let mut remaining = exponent.unsigned_abs();
        let mut square = base;
        let mut acc = Self::one();
        while remaining > 0 {
            if remaining & 1 == 1 {
                acc = acc.multiply(&square);
            }
            remaining >>= 1;
            if remaining > 0 {
                square = square.multiply(&square);
            }
        }
        Ok(acc)
    }

    fn partial(&self, var: &str) -> Self {
        let mut out = Self::new();
        for (key, c) in &self.terms {
            let n = key.power_of(var);
            if n != 0 {
                out.accumulate(key.with_power_shift(var, -1), c * BigInt::from(n));
            }
            let k = key.harmonic_of(var);
            if k != 0 {
                match key.flavor() {
                    Flavor::Cos => {
                        out.accumulate(key.with_flavor(Flavor::Sin), c * BigInt::from(-k))
                    }
                    Flavor::Sin => out.accumulate(key.with_flavor(Flavor::Cos), c * BigInt::from(k)),
                }
            }
        }
        out
    }

    fn substitute(&self, var: &str, replacement: &Self) -> Result<Self, SeriesError> {
        let mut out = Self::new();
        let mut power_cache: HashMap<i32, Self> = HashMap::new();

        for (key, c) in &self.terms {
            let n = key.power_of(var);
            let k = key.harmonic_of(var);
            if n == 0 && k == 0 {
                out.accumulate(key.clone(), c.clone());
                continue;
            }

            let (powers, mut harmonics) = key.without(var);
            if k != 0 {
                let combination = replacement.as_linear_combination().ok_or_else(|| {
                    SeriesError::UnsupportedSubstitution {
                        var: var.to_string(),
                        reason: format!(
                            "'{}' appears in a trigonometric argument and '{}' is not an integer combination of symbols",
                            var, replacement
                        ),
                    }
                })?;
                for (symbol, weight) in combination {
                    *harmonics.entry(symbol).or_insert(0) += k * weight;
                }
            }
            let rest = Self::from_term(c.clone(), powers, harmonics, key.flavor());

            let term = if n != 0 {
                let factor = match power_cache.get(&n) {
                    Some(factor) => factor.clone(),
                    None => {
                        let factor = replacement.pow(n)?;
                        power_cache.insert(n, factor.clone());
                        factor
                    }
                };
                rest.multiply(&factor)
            } else {
                rest
            };
            out = out + term;
        }
        Ok(out)
    }

    fn degree(&self, var: &str) -> i32 {
        self.terms
            .keys()
            .map(|key| key.power_of(var))
            .max()
            .unwrap_or(0)
    }

    fn order(&self) -> Option<i32> {
        self.terms.keys().map(Key::total_degree).min()
    }

    fn partial_order(&self, vars: &[String]) -> Option<i32> {
        self.terms.keys().map(|key| key.partial_degree(vars)).min()
    }

    fn filter_by_degree<F>(&self, var: &str, predicate: F) -> Self
    where
        F: Fn(i32) -> bool,
    {
        self.retain_terms(|key| predicate(key.power_of(var)))
    }

    fn is_polynomial_in(&self, var: &str) -> bool {
        self.terms.keys().all(|key| key.harmonic_of(var) == 0)
    }

    fn truncated(&self, policy: &Truncation) -> Self {
        match policy {
            Truncation::None => self.clone(),
            Truncation::Degree { limit } => self.retain_terms(|key| key.total_degree() < *limit),
            Truncation::PartialDegree { symbols, limit } => {
                self.retain_terms(|key| key.partial_degree(symbols) < *limit)
            }
        }
    }

    fn evaluate(&self, values: &StateDict) -> Result<f64, SeriesError> {
        let mut total = 0.0;
        for (key, c) in &self.terms {
            let coefficient = c
                .to_f64()
                .ok_or_else(|| SeriesError::InvalidCoefficient(c.to_string()))?;
            let value = key
                .evaluate(|name| values.get(name).copied())
                .map_err(SeriesError::MissingVariable)?;
            total += coefficient * value;
        }
        Ok(total)
    }
}

impl Integrable for PoissonSeries {
    fn integrate(&self, var: &str) -> Result<Self, SeriesError> {
        let mut out = Self::new();
        for (key, c) in &self.terms {
            let n = key.power_of(var);
            let k = key.harmonic_of(var);
            match (n, k) {
                (-1, 0) => {
                    return Err(SeriesError::NotIntegrable {
                        var: var.to_string(),
                        reason: format!("term '{}' has exponent -1", key),
                    });
                }
                (n, 0) => {
                    let divisor = BigRational::from_integer(BigInt::from(n + 1));
                    out.accumulate(key.with_power_shift(var, 1), c / divisor);
                }
                (0, k) => {
                    let divisor = BigRational::from_integer(BigInt::from(k));
                    match key.flavor() {
                        Flavor::Cos => out.accumulate(key.with_flavor(Flavor::Sin), c / divisor),
                        Flavor::Sin => {
                            out.accumulate(key.with_flavor(Flavor::Cos), -(c / divisor))
                        }
                    }
                }
                _ => {
                    return Err(SeriesError::NotIntegrable {
                        var: var.to_string(),
                        reason: format!(
                            "term '{}' mixes polynomial and trigonometric dependence",
                            key
                        ),
                    });
                }
            }
        }
        Ok(out)
    }

    fn average(&self, var: &str) -> Self {
        self.retain_terms(|key| key.harmonic_of(var) == 0)
    }
}

impl fmt::Display for PoissonSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return write!(f, "0");
        }
        for (i, (key, c)) in self.terms.iter().enumerate() {
            let magnitude = c.abs();
            if i == 0 {
                if c.is_negative() {
                    write!(f, "-")?;
                }
            } else if c.is_negative() {
                write!(f, " - ")?;
            } else {
                write!(f, " + ")?;
            }
            if *key == Key::unit() {
                write!(f, "{}", magnitude)?;
            } else if magnitude.is_one() {
                write!(f, "{}", key)?;
            } else {
                write!(f, "{}*{}", magnitude, key)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(name: &str) -> PoissonSeries {
        PoissonSeries::symbol(name)
    }

    fn int(value: i64) -> PoissonSeries {
        PoissonSeries::from_integer(value)
    }

    fn ratio(numer: i64, denom: i64) -> PoissonSeries {
        PoissonSeries::from_ratio(numer, denom)
    }

    fn values(entries: &[(&str, f64)]) -> StateDict {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn addition_cancels_opposite_terms() {
        let x = sym("x");
        let sum = x.clone() + int(3) - x;
        assert_eq!(sum, int(3));
        assert!((sym("y") - sym("y")).is_zero());
    }

    #[test]
    fn multiplication_expands_binomial() {
        let s = sym("x") + int(1);
        let square = s.clone() * s;
        let expected = sym("x") * sym("x") + int(2) * sym("x") + int(1);
        assert_eq!(square, expected);
    }

    #[test]
    fn trigonometric_square_identity_holds() {
        let c = PoissonSeries::cos_of("t");
        let s = PoissonSeries::sin_of("t");
        let identity = c.clone() * c + s.clone() * s;
        assert_eq!(identity, int(1));
    }

    #[test]
    fn pow_supports_negative_exponent_of_monomial() {
        let lam = sym("L") * int(2);
        let inverse_square = lam.pow(-2).unwrap();
        assert_eq!(inverse_square, ratio(1, 4) * PoissonSeries::from_term(
            BigRational::one(),
            BTreeMap::from([("L".to_string(), -2)]),
            BTreeMap::new(),
            Flavor::Cos,
        ));
        assert_eq!(inverse_square * sym("L").pow(2).unwrap(), ratio(1, 4));
    }

    #[test]
    fn pow_rejects_negative_exponent_of_sum() {
        let s = sym("x") + int(1);
        assert!(matches!(s.pow(-1), Err(SeriesError::NotInvertible(_))));
        assert_eq!(s.pow(0).unwrap(), int(1));
    }

    #[test]
    fn partial_applies_power_and_chain_rules() {
        let l = sym("L");
        // d/dL (L^3 cos t) = 3 L^2 cos t
        let f = l.pow(3).unwrap() * PoissonSeries::cos_of("t");
        assert_eq!(f.partial("L"), int(3) * l.pow(2).unwrap() * PoissonSeries::cos_of("t"));
        // d/dt (L^3 cos t) = -L^3 sin t
        assert_eq!(
            f.partial("t"),
            -(l.pow(3).unwrap() * PoissonSeries::sin_of("t"))
        );
        assert!(f.partial("unrelated").is_zero());
    }

    #[test]
    fn partial_of_mixed_occurrence_uses_product_rule() {
        // d/dt (t sin t) = sin t + t cos t
        let f = sym("t") * PoissonSeries::sin_of("t");
        let expected = PoissonSeries::sin_of("t") + sym("t") * PoissonSeries::cos_of("t");
        assert_eq!(f.partial("t"), expected);
    }

    #[test]
    fn integrate_inverts_partial() {
        let f = sym("L") * PoissonSeries::cos_of("t") + ratio(1, 2) * sym("t");
        let primitive = f.integrate("t").unwrap();
        assert_eq!(primitive.partial("t"), f);
    }

    #[test]
    fn average_drops_terms_periodic_in_the_angle() {
        let f = sym("L") * PoissonSeries::cos_of("t")
            + sym("L") * sym("t")
            + PoissonSeries::sin_of("g");
        assert_eq!(
            f.average("t"),
            sym("L") * sym("t") + PoissonSeries::sin_of("g")
        );
    }

    #[test]
    fn integrate_rejects_reciprocal_and_mixed_terms() {
        let reciprocal = sym("x").pow(-1).unwrap();
        assert!(matches!(
            reciprocal.integrate("x"),
            Err(SeriesError::NotIntegrable { .. })
        ));
        let mixed = sym("t") * PoissonSeries::cos_of("t");
        assert!(matches!(
            mixed.integrate("t"),
            Err(SeriesError::NotIntegrable { .. })
        ));
    }

    #[test]
    fn substitute_polynomial_occurrence_by_series() {
        let f = sym("x").pow(2).unwrap() * sym("y");
        let result = f.substitute("x", &(sym("a") + int(1))).unwrap();
        let expected = (sym("a") * sym("a") + int(2) * sym("a") + int(1)) * sym("y");
        assert_eq!(result, expected);
    }

    #[test]
    fn substitute_trigonometric_occurrence_by_linear_combination() {
        let f = PoissonSeries::cos_of("lam");
        let shifted = f.substitute("lam", &(sym("lam0") + sym("dlam"))).unwrap();
        let expected = PoissonSeries::from_term(
            BigRational::one(),
            BTreeMap::new(),
            BTreeMap::from([("dlam".to_string(), 1), ("lam0".to_string(), 1)]),
            Flavor::Cos,
        );
        assert_eq!(shifted, expected);
    }

    #[test]
    fn substitute_trigonometric_occurrence_by_constant_is_unsupported() {
        let f = PoissonSeries::cos_of("lam");
        assert!(matches!(
            f.substitute("lam", &ratio(1, 2)),
            Err(SeriesError::UnsupportedSubstitution { .. })
        ));
    }

    #[test]
    fn homogeneous_piece_extracts_degree_and_removes_symbol() {
        let h = ratio(-1, 2) * sym("L").pow(-2).unwrap()
            + sym("eps") * sym("P")
            + sym("eps").pow(2).unwrap() * sym("L");
        assert_eq!(h.homogeneous_piece("eps", 0).unwrap(), ratio(-1, 2) * sym("L").pow(-2).unwrap());
        assert_eq!(h.homogeneous_piece("eps", 1).unwrap(), sym("P"));
        assert_eq!(h.homogeneous_piece("eps", 2).unwrap(), sym("L"));
        assert!(h.homogeneous_piece("eps", 3).unwrap().is_zero());
    }

    #[test]
    fn degree_queries_report_extremes() {
        let h = sym("eps").pow(3).unwrap() + sym("eps") * sym("x") + int(2);
        assert_eq!(h.degree("eps"), 3);
        assert_eq!(h.order(), Some(0));
        assert_eq!(h.partial_order(&["eps".to_string()]), Some(0));
        assert_eq!(PoissonSeries::zero().order(), None);
    }

    #[test]
    fn truncated_drops_terms_at_or_above_limit() {
        let eps = sym("eps");
        let s = int(1) + eps.clone() + eps.pow(2).unwrap() + eps.pow(3).unwrap();
        let policy = Truncation::PartialDegree {
            symbols: vec!["eps".to_string()],
            limit: 2,
        };
        assert_eq!(s.truncated(&policy), int(1) + eps);
        assert_eq!(s.truncated(&Truncation::None), s);
    }

    #[test]
    fn evaluate_combines_polynomial_and_trig_parts() {
        let f = ratio(1, 2) * sym("x") * PoissonSeries::cos_of("t") + int(3);
        let value = f
            .evaluate(&values(&[("x", 2.0), ("t", std::f64::consts::PI)]))
            .unwrap();
        assert!((value - 2.0).abs() < 1e-12);
    }

    #[test]
    fn evaluate_reports_missing_symbol() {
        let f = sym("x") + sym("y");
        assert_eq!(
            f.evaluate(&values(&[("x", 1.0)])),
            Err(SeriesError::MissingVariable("y".to_string()))
        );
    }

    #[test]
    fn from_specs_parses_rational_coefficients() {
        let specs = vec![
            TermSpec {
                coefficient: "-1/2".to_string(),
                powers: BTreeMap::from([("L".to_string(), -2)]),
                harmonics: BTreeMap::new(),
                flavor: Flavor::Cos,
            },
            TermSpec {
                coefficient: "3".to_string(),
                powers: BTreeMap::new(),
                harmonics: BTreeMap::from([("l".to_string(), 1)]),
                flavor: Flavor::Sin,
            },
        ];
        let s = PoissonSeries::from_specs(&specs).unwrap();
        let expected =
            ratio(-1, 2) * sym("L").pow(-2).unwrap() + int(3) * PoissonSeries::sin_of("l");
        assert_eq!(s, expected);

        let bad = TermSpec {
            coefficient: "0.5".to_string(),
            powers: BTreeMap::new(),
            harmonics: BTreeMap::new(),
            flavor: Flavor::Cos,
        };
        assert!(matches!(
            PoissonSeries::from_spec(&bad),
            Err(SeriesError::InvalidCoefficient(_))
        ));
    }

    #[test]
    fn display_is_human_readable() {
        let f = ratio(-1, 2) * sym("L").pow(-2).unwrap() + sym("eps") * sym("P");
        assert_eq!(f.to_string(), "-1/2*L**-2 + P*eps");
        assert_eq!(PoissonSeries::zero().to_string(), "0");
    }
}
