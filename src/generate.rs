//! Random FJSP instance generation.
//!
//! Produces structurally valid instances for tests and benchmarks: every
//! operation gets a random set of distinct eligible machines, each with
//! its own processing time.
//!
//! # Reference
//! Brandimarte (1993), "Routing and scheduling in a flexible job shop by
//! tabu search" (instance generation scheme)

use std::ops::RangeInclusive;

use log::debug;
use rand::prelude::IndexedRandom;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::GeneratorError;
use crate::models::{Instance, Mode};

/// Parameters of the instance generator.
///
/// All ranges are inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Number of jobs.
    pub num_jobs: usize,
    /// Number of machines.
    pub num_machines: usize,
    /// Operations per job.
    pub operations_per_job: RangeInclusive<usize>,
    /// Eligible machines per operation.
    pub machines_per_operation: RangeInclusive<usize>,
    /// Processing time of each mode.
    pub durations: RangeInclusive<u32>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            num_jobs: 5,
            num_machines: 4,
            operations_per_job: 2..=5,
            machines_per_operation: 1..=3,
            durations: 1..=20,
        }
    }
}

impl GeneratorConfig {
    /// Sets the number of jobs.
    pub fn with_num_jobs(mut self, n: usize) -> Self {
        self.num_jobs = n;
        self
    }

    /// Sets the number of machines.
    pub fn with_num_machines(mut self, n: usize) -> Self {
        self.num_machines = n;
        self
    }

    /// Sets the range of operations per job.
    pub fn with_operations_per_job(mut self, range: RangeInclusive<usize>) -> Self {
        self.operations_per_job = range;
        self
    }

    /// Sets the range of eligible machines per operation.
    pub fn with_machines_per_operation(mut self, range: RangeInclusive<usize>) -> Self {
        self.machines_per_operation = range;
        self
    }

    /// Sets the range of processing times.
    pub fn with_durations(mut self, range: RangeInclusive<u32>) -> Self {
        self.durations = range;
        self
    }

    /// Checks that the configuration describes at least one instance.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        let invalid = |msg: String| Err(GeneratorError::InvalidConfig(msg));

        if self.num_jobs == 0 || self.num_machines == 0 {
            return invalid(format!(
                "need at least one job and one machine, got {} job(s) and {} machine(s)",
                self.num_jobs, self.num_machines
            ));
        }
        if self.operations_per_job.is_empty() {
            return invalid(format!(
                "empty operations_per_job range {:?}",
                self.operations_per_job
            ));
        }
        let machines = &self.machines_per_operation;
        if machines.is_empty() || *machines.start() == 0 || *machines.end() > self.num_machines {
            return invalid(format!(
                "machines_per_operation {machines:?} must lie within 1..={}",
                self.num_machines
            ));
        }
        if self.durations.is_empty() {
            return invalid(format!("empty durations range {:?}", self.durations));
        }
        Ok(())
    }
}

/// Generates a random instance.
///
/// Jobs are chained in operation order. Every operation draws a number
/// of distinct machines from `machines_per_operation`, listed in
/// ascending order.
pub fn generate<R: Rng + ?Sized>(
    config: &GeneratorConfig,
    rng: &mut R,
) -> Result<Instance, GeneratorError> {
    config.validate()?;

    let machines: Vec<usize> = (0..config.num_machines).collect();
    let mut jobs: Vec<Vec<Vec<Mode>>> = Vec::with_capacity(config.num_jobs);
    for _ in 0..config.num_jobs {
        let num_ops = rng.random_range(config.operations_per_job.clone());
        let mut ops = Vec::with_capacity(num_ops);
        for _ in 0..num_ops {
            let k = rng.random_range(config.machines_per_operation.clone());
            let mut eligible: Vec<usize> = machines.choose_multiple(rng, k).copied().collect();
            eligible.sort_unstable();

            let modes: Vec<Mode> = eligible
                .into_iter()
                .map(|m| Mode::new(m, rng.random_range(config.durations.clone())))
                .collect();
            ops.push(modes);
        }
        jobs.push(ops);
    }

    let instance = Instance::new(config.num_machines, jobs);
    debug!(
        "generated instance: {} job(s), {} machine(s), {} operation(s), {} mode(s)",
        instance.num_jobs(),
        instance.num_machines(),
        instance.num_operations(),
        instance.num_modes()
    );
    Ok(instance)
}

/// Generates a random instance from a seed (reproducible).
pub fn generate_seeded(config: &GeneratorConfig, seed: u64) -> Result<Instance, GeneratorError> {
    let mut rng = StdRng::seed_from_u64(seed);
    generate(config, &mut rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_instance;

    #[test]
    fn test_default_config_generates_valid_instances() {
        let config = GeneratorConfig::default();
        for seed in 0..50 {
            let inst = generate_seeded(&config, seed).unwrap();
            assert_eq!(inst.num_jobs(), 5);
            assert_eq!(inst.num_machines(), 4);
            assert!(validate_instance(&inst).is_ok(), "seed {seed}");
            for job in inst.jobs() {
                assert!((2..=5).contains(&job.len()));
            }
            for op in inst.operations() {
                assert!((1..=3).contains(&op.modes.len()));
                assert!(op.modes.windows(2).all(|w| w[0].machine < w[1].machine));
                assert!(op.modes.iter().all(|m| (1..=20).contains(&m.duration)));
            }
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let config = GeneratorConfig::default();
        assert_eq!(
            generate_seeded(&config, 7).unwrap(),
            generate_seeded(&config, 7).unwrap()
        );
    }

    #[test]
    fn test_fully_flexible() {
        let config = GeneratorConfig::default()
            .with_num_machines(3)
            .with_machines_per_operation(3..=3)
            .with_durations(4..=4);
        let inst = generate_seeded(&config, 1).unwrap();
        for op in inst.operations() {
            assert_eq!(op.modes, vec![Mode::new(0, 4), Mode::new(1, 4), Mode::new(2, 4)]);
        }
        assert!((inst.flexibility() - inst.num_operations() as f64).abs() < 1e-9);
    }

    #[test]
    fn test_generate_with_rng() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = GeneratorConfig::default().with_operations_per_job(0..=0);
        let inst = generate(&config, &mut rng).unwrap();
        assert_eq!(inst.num_operations(), 0);
        assert!(inst.precedences().is_empty());
    }

    #[test]
    fn test_invalid_configs() {
        let base = GeneratorConfig::default();
        let cases = [
            base.clone().with_num_jobs(0),
            base.clone().with_num_machines(0),
            base.clone().with_machines_per_operation(0..=2),
            base.clone().with_machines_per_operation(2..=9),
            base.clone().with_operations_per_job(3..=1),
            base.clone().with_durations(5..=2),
        ];
        for config in cases {
            assert!(
                matches!(generate_seeded(&config, 0), Err(GeneratorError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }
}
