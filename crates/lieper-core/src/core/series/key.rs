use itertools::Itertools;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flavor {
    #[default]
    Cos,
    Sin,
}

/// The monomial part of a Poisson-series term: `Π x^n · cos|sin(Σ k·θ)`.
///
/// Keys are always canonical: no zero exponents or multipliers are stored, the first
/// trigonometric multiplier is positive, and a `sin` key always carries at least one
/// multiplier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Key {
    powers: BTreeMap<String, i32>,
    harmonics: BTreeMap<String, i32>,
    flavor: Flavor,
}

impl Key {
    pub fn unit() -> Self {
        Self::default()
    }

    /// Builds a canonical key, returning the sign the coefficient must be multiplied by,
    /// or `None` when the key denotes the zero function (`sin(0)`).
    pub fn canonical(
        powers: BTreeMap<String, i32>,
        harmonics: BTreeMap<String, i32>,
        flavor: Flavor,
    ) -> Option<(Self, i32)> {
        let powers: BTreeMap<_, _> = powers.into_iter().filter(|(_, n)| *n != 0).collect();
        let mut harmonics: BTreeMap<_, _> =
            harmonics.into_iter().filter(|(_, k)| *k != 0).collect();

        if harmonics.is_empty() {
            return match flavor {
                Flavor::Cos => Some((
                    Self {
                        powers,
                        harmonics,
                        flavor,
                    },
                    1,
                )),
                Flavor::Sin => None,
            };
        }

        let mut sign = 1;
        if harmonics.values().next().is_some_and(|k| *k < 0) {
            harmonics.values_mut().for_each(|k| *k = -*k);
            if flavor == Flavor::Sin {
                sign = -1;
            }
        }
        Some((
            Self {
                powers,
                harmonics,
                flavor,
            },
            sign,
        ))
    }

    pub fn powers(&self) -> &BTreeMap<String, i32> {
        &self.powers
    }

    pub fn harmonics(&self) -> &BTreeMap<String, i32> {
        &self.harmonics
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    pub fn power_of(&self, var: &str) -> i32 {
        self.powers.get(var).copied().unwrap_or(0)
    }

    pub fn harmonic_of(&self, var: &str) -> i32 {
        self.harmonics.get(var).copied().unwrap_or(0)
    }

    pub fn is_trigonometric(&self) -> bool {
        !self.harmonics.is_empty()
    }

    pub fn total_degree(&self) -> i32 {
        self.powers.values().sum()
    }

    pub fn partial_degree(&self, vars: &[String]) -> i32 {
        vars.iter().map(|v| self.power_of(v)).sum()
    }

    /// The same key with the exponent of `var` shifted by `delta`.
    pub fn with_power_shift(&self, var: &str, delta: i32) -> Self {
        let mut powers = self.powers.clone();
        let n = powers.get(var).copied().unwrap_or(0) + delta;
        if n == 0 {
            powers.remove(var);
        } else {
            powers.insert(var.to_string(), n);
        }
        Self {
            powers,
            harmonics: self.harmonics.clone(),
            flavor: self.flavor,
        }
    }

    /// The same key with the given trigonometric flavor.
    pub fn with_flavor(&self, flavor: Flavor) -> Self {
        Self {
            powers: self.powers.clone(),
            harmonics: self.harmonics.clone(),
            flavor,
        }
    }

    /// Splits the key into the part free of `var` and the exponent/multiplier of `var`.
    pub fn without(&self, var: &str) -> (BTreeMap<String, i32>, BTreeMap<String, i32>) {
        let mut powers = self.powers.clone();
        let mut harmonics = self.harmonics.clone();
        powers.remove(var);
        harmonics.remove(var);
        (powers, harmonics)
    }

    /// Product of two keys as a list of `(key, factor)` pairs, where `factor` is `±1` or
    /// `±1/2` encoded as `(numer, denom)`.
    pub fn product(&self, other: &Key) -> Vec<(Key, (i32, i32))> {
        let mut powers = self.powers.clone();
        for (var, n) in &other.powers {
            *powers.entry(var.clone()).or_insert(0) += n;
        }

        if !self.is_trigonometric() || !other.is_trigonometric() {
            let (harmonics, flavor) = if self.is_trigonometric() {
                (self.harmonics.clone(), self.flavor)
            } else {
                (other.harmonics.clone(), other.flavor)
            };
            return Self::canonical(powers, harmonics, flavor)
                .map(|(key, sign)| vec![(key, (sign, 1))])
                .unwrap_or_default();
        }

        let combine = |sign: i32| {
            let mut out = self.harmonics.clone();
            for (var, k) in &other.harmonics {
                *out.entry(var.clone()).or_insert(0) += sign * k;
            }
            out
        };
        let sum = combine(1);
        let diff = combine(-1);

        // cos a cos b = (cos(a-b) + cos(a+b)) / 2, and similarly for the other flavors.
        let parts = match (self.flavor, other.flavor) {
            (Flavor::Cos, Flavor::Cos) => [(diff, Flavor::Cos, 1), (sum, Flavor::Cos, 1)],
            (Flavor::Sin, Flavor::Sin) => [(diff, Flavor::Cos, 1), (sum, Flavor::Cos, -1)],
            (Flavor::Sin, Flavor::Cos) => [(sum, Flavor::Sin, 1), (diff, Flavor::Sin, 1)],
            (Flavor::Cos, Flavor::Sin) => [(sum, Flavor::Sin, 1), (diff, Flavor::Sin, -1)],
        };

        parts
            .into_iter()
            .filter_map(|(harmonics, flavor, sign)| {
                Self::canonical(powers.clone(), harmonics, flavor)
                    .map(|(key, s)| (key, (sign * s, 2)))
            })
            .collect()
    }

    /// Evaluates the key at the given symbol values.
    pub fn evaluate(&self, lookup: impl Fn(&str) -> Option<f64>) -> Result<f64, String> {
        let mut value = 1.0;
        for (var, n) in &self.powers {
            value *= lookup(var.as_str()).ok_or_else(|| var.clone())?.powi(*n);
        }
        if self.is_trigonometric() {
            let mut angle = 0.0;
            for (var, k) in &self.harmonics {
                angle += f64::from(*k) * lookup(var.as_str()).ok_or_else(|| var.clone())?;
            }
            value *= match self.flavor {
                Flavor::Cos => angle.cos(),
                Flavor::Sin => angle.sin(),
            };
        }
        Ok(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let powers = self
            .powers
            .iter()
            .map(|(var, n)| {
                if *n == 1 {
                    var.clone()
                } else {
                    format!("{}**{}", var, n)
                }
            })
            .join("*");

        let trig = if self.is_trigonometric() {
            let argument = self
                .harmonics
                .iter()
                .enumerate()
                .map(|(i, (var, k))| match (*k, i) {
                    (1, 0) => var.clone(),
                    (1, _) => format!("+{}", var),
                    (-1, _) => format!("-{}", var),
                    (k, 0) => format!("{}*{}", k, var),
                    (k, _) if k > 0 => format!("+{}*{}", k, var),
                    (k, _) => format!("{}*{}", k, var),
                })
                .join("");
            let name = match self.flavor {
                Flavor::Cos => "cos",
                Flavor::Sin => "sin",
            };
            format!("{}({})", name, argument)
        } else {
            String::new()
        };

        match (powers.is_empty(), trig.is_empty()) {
            (true, true) => write!(f, "1"),
            (false, true) => write!(f, "{}", powers),
            (true, false) => write!(f, "{}", trig),
            (false, false) => write!(f, "{}*{}", powers, trig),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, i32)]) -> BTreeMap<String, i32> {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn canonical_flips_negative_leading_multiplier() {
        let (key, sign) =
            Key::canonical(map(&[]), map(&[("a", -1), ("b", 2)]), Flavor::Sin).unwrap();
        assert_eq!(sign, -1);
        assert_eq!(key.harmonic_of("a"), 1);
        assert_eq!(key.harmonic_of("b"), -2);

        let (_, sign) = Key::canonical(map(&[]), map(&[("a", -1)]), Flavor::Cos).unwrap();
        assert_eq!(sign, 1);
    }

    #[test]
    fn canonical_drops_sine_of_zero() {
        assert!(Key::canonical(map(&[("x", 2)]), map(&[("a", 0)]), Flavor::Sin).is_none());
    }

    #[test]
    fn canonical_strips_zero_exponents() {
        let (key, _) = Key::canonical(map(&[("x", 0), ("y", 1)]), map(&[]), Flavor::Cos).unwrap();
        assert_eq!(key.powers().len(), 1);
        assert_eq!(key.total_degree(), 1);
    }

    #[test]
    fn product_of_polynomial_keys_adds_exponents() {
        let (a, _) = Key::canonical(map(&[("x", 2)]), map(&[]), Flavor::Cos).unwrap();
        let (b, _) = Key::canonical(map(&[("x", -3), ("y", 1)]), map(&[]), Flavor::Cos).unwrap();
        let product = a.product(&b);
        assert_eq!(product.len(), 1);
        assert_eq!(product[0].0.power_of("x"), -1);
        assert_eq!(product[0].0.power_of("y"), 1);
        assert_eq!(product[0].1, (1, 1));
    }

    #[test]
    fn product_of_sines_yields_cosines() {
        let (a, _) = Key::canonical(map(&[]), map(&[("t", 1)]), Flavor::Sin).unwrap();
        let product = a.product(&a);
        // sin^2 t = 1/2 - 1/2 cos 2t
        assert_eq!(product.len(), 2);
        assert!(product.contains(&(Key::unit(), (1, 2))));
        let (cos2, _) = Key::canonical(map(&[]), map(&[("t", 2)]), Flavor::Cos).unwrap();
        assert!(product.contains(&(cos2, (-1, 2))));
    }

    #[test]
    fn evaluate_reports_missing_symbol() {
        let (key, _) = Key::canonical(map(&[("x", 1)]), map(&[("t", 1)]), Flavor::Cos).unwrap();
        let result = key.evaluate(|name| (name == "x").then_some(2.0));
        assert_eq!(result, Err("t".to_string()));
    }

    #[test]
    fn display_renders_powers_and_trig_argument() {
        let (key, _) = Key::canonical(
            map(&[("L", -2), ("P", 1)]),
            map(&[("l", 1), ("g", -2)]),
            Flavor::Cos,
        )
        .unwrap();
        assert_eq!(key.to_string(), "L**-2*P*cos(2*g-l)");
    }
}
