//! FJSP instance model.
//!
//! An instance is a set of jobs, each an ordered chain of operations, and
//! each operation a list of modes: the machines that can process it and
//! how long it takes there. Operations are stored in one flat list indexed
//! by concatenating jobs in order, so operation 0 is the first operation of
//! job 0 and the last index belongs to the last operation of the last job.
//!
//! # Reference
//! Brandimarte (1993), "Routing and scheduling in a flexible job shop by
//! tabu search"

use serde::{Deserialize, Serialize};

/// One way of processing an operation: a machine and its processing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mode {
    /// Zero-based machine index.
    pub machine: usize,
    /// Processing time on that machine.
    pub duration: u32,
}

impl Mode {
    /// Creates a mode.
    pub fn new(machine: usize, duration: u32) -> Self {
        Self { machine, duration }
    }
}

/// An operation together with the job it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    /// Index of the owning job.
    pub job: usize,
    /// Eligible modes, in input order.
    pub modes: Vec<Mode>,
}

impl Operation {
    /// Shortest processing time over all modes (0 if there are none).
    pub fn min_duration(&self) -> u32 {
        self.modes.iter().map(|m| m.duration).min().unwrap_or(0)
    }

    /// Longest processing time over all modes (0 if there are none).
    pub fn max_duration(&self) -> u32 {
        self.modes.iter().map(|m| m.duration).max().unwrap_or(0)
    }

    /// The mode on `machine`, if the operation is eligible there.
    pub fn mode_on(&self, machine: usize) -> Option<&Mode> {
        self.modes.iter().find(|m| m.machine == machine)
    }

    /// Whether `machine` can process this operation.
    pub fn is_eligible(&self, machine: usize) -> bool {
        self.mode_on(machine).is_some()
    }
}

/// A flexible job shop instance.
///
/// Instances are immutable once built. The operation count and job count
/// are derived from the stored jobs, so they can never disagree with them.
///
/// Equality compares job contents and precedences only; two instances
/// built along different paths (parsed, generated, deserialized) compare
/// equal when they describe the same jobs and ordering.
///
/// # Examples
///
/// ```
/// use u_fjsp::models::{Instance, Mode};
///
/// let instance = Instance::new(
///     3,
///     vec![
///         vec![vec![Mode::new(0, 1), Mode::new(1, 2)]],
///         vec![vec![Mode::new(0, 1)], vec![Mode::new(2, 1), Mode::new(1, 1)]],
///     ],
/// );
/// assert_eq!(instance.num_operations(), 3);
/// assert_eq!(instance.precedences(), &[(1, 2)]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "InstanceRepr", into = "InstanceRepr")]
pub struct Instance {
    num_machines: usize,
    jobs: Vec<Vec<usize>>,
    operations: Vec<Operation>,
    precedences: Vec<(usize, usize)>,
}

impl Instance {
    /// Creates an instance from per-job operation mode lists.
    ///
    /// Precedences are derived from job order: consecutive operations of
    /// the same job form a chain; there are no edges across jobs.
    pub fn new(num_machines: usize, jobs: Vec<Vec<Vec<Mode>>>) -> Self {
        let mut job_indices = Vec::with_capacity(jobs.len());
        let mut operations = Vec::with_capacity(jobs.iter().map(Vec::len).sum());

        for (job, ops) in jobs.into_iter().enumerate() {
            let mut indices = Vec::with_capacity(ops.len());
            for modes in ops {
                indices.push(operations.len());
                operations.push(Operation { job, modes });
            }
            job_indices.push(indices);
        }

        let precedences = chain_precedences(&job_indices);

        Self {
            num_machines,
            jobs: job_indices,
            operations,
            precedences,
        }
    }

    /// Appends explicit precedence edges after the derived job chains.
    pub fn with_precedences(mut self, edges: impl IntoIterator<Item = (usize, usize)>) -> Self {
        self.precedences.extend(edges);
        self
    }

    /// Returns true if the precedences go beyond the derived job chains.
    ///
    /// FJSPLIB text only carries the job chains, so such edges are lost
    /// when the instance is written.
    pub fn has_explicit_precedences(&self) -> bool {
        self.precedences != chain_precedences(&self.jobs)
    }

    /// Number of jobs.
    pub fn num_jobs(&self) -> usize {
        self.jobs.len()
    }

    /// Number of machines.
    pub fn num_machines(&self) -> usize {
        self.num_machines
    }

    /// Number of operations over all jobs.
    pub fn num_operations(&self) -> usize {
        self.operations.len()
    }

    /// Global operation indices of each job, in processing order.
    pub fn jobs(&self) -> &[Vec<usize>] {
        &self.jobs
    }

    /// All operations, indexed by global operation index.
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// The operation at a global index.
    pub fn operation(&self, index: usize) -> Option<&Operation> {
        self.operations.get(index)
    }

    /// Operations of one job in processing order.
    ///
    /// Yields nothing for an unknown job.
    pub fn job_operations(&self, job: usize) -> impl Iterator<Item = &Operation> + '_ {
        self.jobs
            .get(job)
            .into_iter()
            .flatten()
            .filter_map(move |&i| self.operations.get(i))
    }

    /// Precedence edges `(pred, succ)`.
    pub fn precedences(&self) -> &[(usize, usize)] {
        &self.precedences
    }

    /// Total number of eligible modes over all operations.
    pub fn num_modes(&self) -> usize {
        self.operations.iter().map(|op| op.modes.len()).sum()
    }

    /// Average number of eligible modes per machine.
    ///
    /// This is the statistic written in the FJSPLIB header. Returns 0 when
    /// there are no machines.
    pub fn flexibility(&self) -> f64 {
        if self.num_machines == 0 {
            return 0.0;
        }
        self.num_modes() as f64 / self.num_machines as f64
    }

    /// Sum of the longest mode duration of every operation.
    ///
    /// No semi-active schedule ends later than this, so it is a safe
    /// planning horizon for the CP formulation.
    pub fn horizon_bound(&self) -> i64 {
        self.operations
            .iter()
            .map(|op| i64::from(op.max_duration()))
            .sum()
    }

    /// Mode lists of every job, the nested form `Instance::new` accepts.
    pub fn job_modes(&self) -> Vec<Vec<Vec<Mode>>> {
        self.jobs
            .iter()
            .map(|ops| {
                ops.iter()
                    .filter_map(|&i| self.operations.get(i))
                    .map(|op| op.modes.clone())
                    .collect()
            })
            .collect()
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.jobs.len() == other.jobs.len()
            && self
                .jobs
                .iter()
                .zip(&other.jobs)
                .all(|(a, b)| {
                    a.len() == b.len()
                        && a.iter().zip(b).all(|(&i, &j)| {
                            self.operations.get(i).map(|op| &op.modes)
                                == other.operations.get(j).map(|op| &op.modes)
                        })
                })
            && self.precedences == other.precedences
    }
}

impl Eq for Instance {}

/// Consecutive-operation edges for every job.
fn chain_precedences(jobs: &[Vec<usize>]) -> Vec<(usize, usize)> {
    jobs.iter()
        .flat_map(|ops| ops.windows(2).map(|w| (w[0], w[1])))
        .collect()
}

/// Plain serde form of an [`Instance`].
#[derive(Serialize, Deserialize)]
struct InstanceRepr {
    num_machines: usize,
    jobs: Vec<Vec<Vec<Mode>>>,
    precedences: Vec<(usize, usize)>,
}

impl From<InstanceRepr> for Instance {
    fn from(repr: InstanceRepr) -> Self {
        let mut instance = Instance::new(repr.num_machines, repr.jobs);
        instance.precedences = repr.precedences;
        instance
    }
}

impl From<Instance> for InstanceRepr {
    fn from(instance: Instance) -> Self {
        Self {
            num_machines: instance.num_machines,
            jobs: instance.job_modes(),
            precedences: instance.precedences,
        }
    }
}
