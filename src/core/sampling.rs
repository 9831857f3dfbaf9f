//! Value sources for arrival delays, order quantities and lead times.
//!
//! Every source implements [`Generator`] and declares how reproducible it is, so
//! constant, distribution-sampled and scripted sources are interchangeable.

use super::errors::SimError;
use log::warn;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Exp, Normal, Poisson, Triangular, Uniform};
use serde::{Deserialize, Serialize};

/// Reproducibility contract of a generator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Determinism {
    /// Always yields the same value
    Constant,
    /// Pseudo-random, seeded; replays exactly for the same seed
    Seeded,
    /// Pseudo-random from OS entropy; differs per run
    Unseeded,
    /// Replays a fixed list of values
    Scripted,
}

/// Source of `f64` values. `None` means the source is exhausted.
pub trait Generator: Send {
    fn next_value(&mut self) -> Option<f64>;

    fn determinism(&self) -> Determinism;
}

/// Constant value source
#[derive(Debug, Clone)]
pub struct Constant(pub f64);

impl Generator for Constant {
    fn next_value(&mut self) -> Option<f64> {
        Some(self.0)
    }

    fn determinism(&self) -> Determinism {
        Determinism::Constant
    }
}

/// Draws from any `rand_distr` distribution with its own RNG
pub struct Sampled<D> {
    dist: D,
    rng: StdRng,
    determinism: Determinism,
}

impl<D: Distribution<f64>> Sampled<D> {
    pub fn seeded(dist: D, seed: u64) -> Self {
        Self {
            dist,
            rng: StdRng::seed_from_u64(seed),
            determinism: Determinism::Seeded,
        }
    }

    pub fn unseeded(dist: D) -> Self {
        Self {
            dist,
            rng: StdRng::from_entropy(),
            determinism: Determinism::Unseeded,
        }
    }
}

impl<D: Distribution<f64> + Send> Generator for Sampled<D> {
    fn next_value(&mut self) -> Option<f64> {
        Some(self.dist.sample(&mut self.rng))
    }

    fn determinism(&self) -> Determinism {
        self.determinism
    }
}

/// Replays a list of values, optionally cycling
#[derive(Debug, Clone)]
pub struct Scripted {
    values: Vec<f64>,
    position: usize,
    cycle: bool,
}

impl Scripted {
    pub fn new(values: Vec<f64>, cycle: bool) -> Self {
        Self {
            values,
            position: 0,
            cycle,
        }
    }
}

impl Generator for Scripted {
    fn next_value(&mut self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        if self.position >= self.values.len() {
            if !self.cycle {
                return None;
            }
            self.position = 0;
        }
        let value = self.values[self.position];
        self.position += 1;
        Some(value)
    }

    fn determinism(&self) -> Determinism {
        Determinism::Scripted
    }
}

/// Wraps a closure. The caller declares its determinism.
pub struct FromFn<F> {
    f: F,
    determinism: Determinism,
}

impl<F> FromFn<F>
where
    F: FnMut() -> Option<f64> + Send,
{
    pub fn new(f: F, determinism: Determinism) -> Self {
        Self { f, determinism }
    }
}

impl<F> Generator for FromFn<F>
where
    F: FnMut() -> Option<f64> + Send,
{
    fn next_value(&mut self) -> Option<f64> {
        (self.f)()
    }

    fn determinism(&self) -> Determinism {
        self.determinism
    }
}

/// Discrete uniform over an inclusive integer range
#[derive(Debug, Clone, Copy)]
pub struct UniformInt {
    inner: Uniform<i64>,
}

impl UniformInt {
    pub fn new(low: i64, high: i64) -> Self {
        Self {
            inner: Uniform::new_inclusive(low, high),
        }
    }
}

impl Distribution<f64> for UniformInt {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.inner.sample(rng) as f64
    }
}

/// Serializable description of a generator, used by the assembly descriptors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SamplerSpec {
    Constant { value: f64 },
    Uniform { low: f64, high: f64 },
    UniformInt { low: i64, high: i64 },
    Exponential { rate: f64 },
    Normal { mean: f64, std_dev: f64 },
    Poisson { mean: f64 },
    Triangular { min: f64, max: f64, mode: f64 },
    Scripted {
        values: Vec<f64>,
        #[serde(default)]
        cycle: bool,
    },
}

impl SamplerSpec {
    /// Build the generator. `seed = None` draws the RNG from OS entropy.
    pub fn build(&self, entity: &str, seed: Option<u64>) -> Result<Box<dyn Generator>, SimError> {
        let invalid = |reason: String| SimError::config(entity, reason);

        let generator: Box<dyn Generator> = match self {
            SamplerSpec::Constant { value } => {
                if !value.is_finite() {
                    return Err(invalid(format!("constant {} is not finite", value)));
                }
                Box::new(Constant(*value))
            }
            SamplerSpec::Uniform { low, high } => {
                if !(low.is_finite() && high.is_finite()) || low >= high {
                    return Err(invalid(format!("uniform bounds [{}, {}) are malformed", low, high)));
                }
                sampled(Uniform::new(*low, *high), seed)
            }
            SamplerSpec::UniformInt { low, high } => {
                if low > high {
                    return Err(invalid(format!("integer bounds [{}, {}] are malformed", low, high)));
                }
                sampled(UniformInt::new(*low, *high), seed)
            }
            SamplerSpec::Exponential { rate } => {
                let dist = Exp::new(*rate)
                    .map_err(|e| invalid(format!("exponential rate {}: {}", rate, e)))?;
                if *rate <= 0.0 {
                    return Err(invalid(format!("exponential rate {} must be positive", rate)));
                }
                sampled(dist, seed)
            }
            SamplerSpec::Normal { mean, std_dev } => {
                let dist = Normal::new(*mean, *std_dev)
                    .map_err(|e| invalid(format!("normal({}, {}): {}", mean, std_dev, e)))?;
                sampled(dist, seed)
            }
            SamplerSpec::Poisson { mean } => {
                let dist = Poisson::new(*mean)
                    .map_err(|e| invalid(format!("poisson mean {}: {}", mean, e)))?;
                sampled(dist, seed)
            }
            SamplerSpec::Triangular { min, max, mode } => {
                let dist = Triangular::new(*min, *max, *mode)
                    .map_err(|e| invalid(format!("triangular({}, {}, {}): {}", min, max, mode, e)))?;
                sampled(dist, seed)
            }
            SamplerSpec::Scripted { values, cycle } => {
                if values.iter().any(|v| !v.is_finite()) {
                    return Err(invalid("scripted values must be finite".to_string()));
                }
                Box::new(Scripted::new(values.clone(), *cycle))
            }
        };

        if self.may_draw_negative() {
            warn!(
                "{}: {:?} may draw negative values, which abort the run when sampled",
                entity, self
            );
        }
        Ok(generator)
    }

    /// Whether a draw can plausibly fall below zero. A normal counts once its
    /// mean sits within three standard deviations of zero.
    pub fn may_draw_negative(&self) -> bool {
        match self {
            SamplerSpec::Constant { value } => *value < 0.0,
            SamplerSpec::Uniform { low, .. } => *low < 0.0,
            SamplerSpec::UniformInt { low, .. } => *low < 0,
            SamplerSpec::Exponential { .. } | SamplerSpec::Poisson { .. } => false,
            SamplerSpec::Normal { mean, std_dev } => mean - 3.0 * std_dev < 0.0,
            SamplerSpec::Triangular { min, .. } => *min < 0.0,
            SamplerSpec::Scripted { values, .. } => values.iter().any(|v| *v < 0.0),
        }
    }

    /// Whether the built generator replays identically for a fixed seed
    pub fn is_reproducible(&self, seeded: bool) -> bool {
        match self {
            SamplerSpec::Constant { .. } | SamplerSpec::Scripted { .. } => true,
            _ => seeded,
        }
    }
}

fn sampled<D>(dist: D, seed: Option<u64>) -> Box<dyn Generator>
where
    D: Distribution<f64> + Send + 'static,
{
    match seed {
        Some(seed) => Box::new(Sampled::seeded(dist, seed)),
        None => Box::new(Sampled::unseeded(dist)),
    }
}

/// Derive an independent stream seed for the `stream`-th sampler of a run
pub fn stream_seed(base: u64, stream: u64) -> u64 {
    base ^ (stream.wrapping_add(1)).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;

    #[test]
    fn test_constant_never_exhausts() {
        let mut g = Constant(2.5);
        for _ in 0..10 {
            assert_eq!(g.next_value(), Some(2.5));
        }
        assert_eq!(g.determinism(), Determinism::Constant);
    }

    #[test]
    fn test_seeded_samplers_replay() {
        let spec = SamplerSpec::Exponential { rate: 0.5 };
        let mut a = spec.build("demand", Some(11)).unwrap();
        let mut b = spec.build("demand", Some(11)).unwrap();
        let xs: Vec<f64> = (0..20).filter_map(|_| a.next_value()).collect();
        let ys: Vec<f64> = (0..20).filter_map(|_| b.next_value()).collect();
        assert_eq!(xs, ys);
        assert_eq!(a.determinism(), Determinism::Seeded);
        assert!(xs.iter().all(|x| *x >= 0.0));
    }

    #[test]
    fn test_uniform_int_is_inclusive() {
        let mut g = SamplerSpec::UniformInt { low: 3, high: 4 }
            .build("qty", Some(1))
            .unwrap();
        let mut seen = [false; 2];
        for _ in 0..200 {
            let v = g.next_value().unwrap();
            assert!(v == 3.0 || v == 4.0);
            seen[(v as usize) - 3] = true;
        }
        assert!(seen[0] && seen[1]);
    }

    #[test]
    fn test_scripted_exhausts_unless_cycling() {
        let mut once = Scripted::new(vec![1.0, 2.0], false);
        assert_eq!(once.next_value(), Some(1.0));
        assert_eq!(once.next_value(), Some(2.0));
        assert_eq!(once.next_value(), None);

        let mut looping = Scripted::new(vec![1.0, 2.0], true);
        let drawn: Vec<f64> = (0..5).filter_map(|_| looping.next_value()).collect();
        assert_eq!(drawn, vec![1.0, 2.0, 1.0, 2.0, 1.0]);
    }

    #[test]
    fn test_malformed_parameters_are_config_errors() {
        let bad = [
            SamplerSpec::Exponential { rate: -1.0 },
            SamplerSpec::Uniform { low: 5.0, high: 1.0 },
            SamplerSpec::Normal { mean: 0.0, std_dev: -2.0 },
            SamplerSpec::Constant { value: f64::INFINITY },
        ];
        for spec in bad {
            let err = spec.build("link", Some(0)).err().expect("should fail");
            assert_eq!(err.kind(), ErrorKind::InvalidConfig);
        }
    }

    #[test]
    fn test_negative_prone_samplers_are_flagged() {
        let wide = SamplerSpec::Normal { mean: 5.0, std_dev: 2.0 };
        assert!(wide.may_draw_negative());
        assert!(wide.build("demand", Some(3)).is_ok());

        assert!(!SamplerSpec::Normal { mean: 10.0, std_dev: 2.0 }.may_draw_negative());
        assert!(!SamplerSpec::Poisson { mean: 1.0 }.may_draw_negative());
        assert!(SamplerSpec::Uniform { low: -1.0, high: 1.0 }.may_draw_negative());
        assert!(SamplerSpec::Scripted {
            values: vec![1.0, -0.5],
            cycle: false
        }
        .may_draw_negative());
    }

    #[test]
    fn test_sampler_spec_from_json() {
        let spec: SamplerSpec =
            serde_json::from_str(r#"{"kind": "triangular", "min": 1.0, "max": 4.0, "mode": 2.0}"#).unwrap();
        assert_eq!(spec, SamplerSpec::Triangular { min: 1.0, max: 4.0, mode: 2.0 });
    }

    #[test]
    fn test_closure_generator() {
        let mut n = 0.0;
        let mut g = FromFn::new(
            move || {
                n += 1.0;
                Some(n)
            },
            Determinism::Scripted,
        );
        assert_eq!(g.next_value(), Some(1.0));
        assert_eq!(g.next_value(), Some(2.0));
    }
}
