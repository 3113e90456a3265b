//! Weighted random selection over candidate sets.
//!
//! Two probability models are supported. `Simple` draws a uniform index
//! (single) or an independent Bernoulli per candidate (multiple). `Complex`
//! runs an inverse-CDF fold over caller-supplied weights, either over the
//! candidates themselves (single) or over every inclusion pattern of the
//! candidate set (multiple).

use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::domain::error::{DomainError, DomainResult};

/// Largest candidate set the complex multiple draw will enumerate; the
/// pattern space doubles per candidate, so the cap bounds it at 2^16.
pub const MAX_PATTERN_ITEMS: usize = 16;

/// Probability model for candidate selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Uniform single draw, or independent per-candidate inclusion.
    #[default]
    Simple,
    /// Weighted inverse-CDF draw; weights are required.
    Complex,
}

impl FromStr for Method {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(Method::Simple),
            "complex" => Ok(Method::Complex),
            other => Err(DomainError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Simple => write!(f, "simple"),
            Method::Complex => write!(f, "complex"),
        }
    }
}

/// Selection options handed through unchanged to every sampling step of a
/// tree walk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawOptions {
    /// Select several candidates per branch instead of exactly one.
    pub multiple: bool,
    pub method: Method,
    /// Per-candidate weights; required by [`Method::Complex`], optional
    /// inclusion probabilities for the simple multiple draw.
    pub weights: Option<Vec<f64>>,
}

/// All `2^n` inclusion patterns over `n` items, in binary counting order:
/// pattern `k` includes item `i` iff bit `i` of `k` is set.
pub fn bool_combinations(n: usize) -> Vec<Vec<bool>> {
    (0..1usize << n)
        .map(|k| (0..n).map(|i| (k >> i) & 1 == 1).collect())
        .collect()
}

/// Select a single candidate index out of `n`.
pub fn draw_one(
    n: usize,
    method: Method,
    weights: Option<&[f64]>,
    rng: &mut impl Rng,
) -> DomainResult<usize> {
    if n == 0 {
        return Err(DomainError::malformed(
            "cannot select from an empty candidate set",
        ));
    }
    match method {
        Method::Simple => Ok(rng.random_range(0..n)),
        Method::Complex => {
            let weights = required_weights(n, weights)?;
            let u = rng.random::<f64>();
            Ok(fold_select(weights, u))
        }
    }
}

/// Select a subset of candidate indices out of `n`, in ascending order.
pub fn draw_many(
    n: usize,
    method: Method,
    weights: Option<&[f64]>,
    rng: &mut impl Rng,
) -> DomainResult<Vec<usize>> {
    match method {
        Method::Simple => {
            if let Some(weights) = weights {
                check_weight_count(n, weights)?;
            }
            let mut selected = Vec::new();
            for i in 0..n {
                let w = weights.map_or(0.5, |weights| weights[i]);
                if rng.random::<f64>() < w {
                    selected.push(i);
                }
            }
            Ok(selected)
        }
        Method::Complex => {
            let weights = required_weights(n, weights)?;
            if n > MAX_PATTERN_ITEMS {
                return Err(DomainError::malformed(format!(
                    "complex multiple selection over {n} candidates would \
                     enumerate 2^{n} assignment profiles (limit: {MAX_PATTERN_ITEMS})"
                )));
            }
            // The draw is consumed before the pattern space is built.
            let u = rng.random::<f64>();
            let profiles = bool_combinations(n);
            let profile_weights: Vec<f64> = profiles
                .iter()
                .map(|profile| {
                    profile
                        .iter()
                        .enumerate()
                        .map(|(i, &included)| {
                            if included {
                                weights[i]
                            } else {
                                1.0 - weights[i]
                            }
                        })
                        .product()
                })
                .collect();
            let chosen = fold_select(&profile_weights, u);
            Ok(profiles[chosen]
                .iter()
                .enumerate()
                .filter_map(|(i, &included)| included.then_some(i))
                .collect())
        }
    }
}

/// Unified selection entry: a single draw is coerced into a one-element
/// sequence so callers can treat both modes alike.
pub fn draw(n: usize, opts: &DrawOptions, rng: &mut impl Rng) -> DomainResult<Vec<usize>> {
    let weights = opts.weights.as_deref();
    if opts.multiple {
        draw_many(n, opts.method, weights, rng)
    } else {
        draw_one(n, opts.method, weights, rng).map(|i| vec![i])
    }
}

/// Inverse-CDF fold: the smallest index whose cumulative mass brings the
/// remainder `1 - cum` down to `u` or below. Under-unit weight vectors
/// saturate at the final index.
fn fold_select(weights: &[f64], u: f64) -> usize {
    let mut cum = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cum += w;
        if 1.0 - cum <= u {
            return i;
        }
    }
    weights.len().saturating_sub(1)
}

fn required_weights<'a>(n: usize, weights: Option<&'a [f64]>) -> DomainResult<&'a [f64]> {
    let weights = weights.ok_or_else(|| {
        DomainError::malformed("the complex method requires selection weights")
    })?;
    check_weight_count(n, weights)?;
    Ok(weights)
}

fn check_weight_count(n: usize, weights: &[f64]) -> DomainResult<()> {
    if weights.len() != n {
        return Err(DomainError::malformed(format!(
            "{} weights supplied for {} candidates",
            weights.len(),
            n
        )));
    }
    Ok(())
}
