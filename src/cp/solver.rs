//! CP solver interface and a greedy reference implementation.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

use log::debug;

use super::model::{Constraint, CpModel, Objective};
use super::variables::{BoolVarId, IntVarId, IntervalId};

/// Status of the solver after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    /// Proven optimal solution found.
    Optimal,
    /// Feasible (but not necessarily optimal) solution found.
    Feasible,
    /// No feasible solution exists.
    Infeasible,
    /// Model is invalid or malformed.
    ModelInvalid,
    /// Solver exceeded time limit.
    Timeout,
    /// No solution found for unknown reasons.
    Unknown,
}

/// Solution for an interval variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalSolution {
    /// Assigned start time.
    pub start: i64,
    /// Assigned end time.
    pub end: i64,
    /// Assigned duration.
    pub duration: i64,
    /// Whether this interval is present (for optional intervals).
    pub is_present: bool,
}

/// Solution from a CP solver.
///
/// Values are stored by variable index, so they line up with the
/// `int_vars`, `bool_vars` and `intervals` of the solved [`CpModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpSolution {
    /// Solver status.
    pub status: SolverStatus,
    /// Objective function value (if any).
    pub objective_value: Option<i64>,
    /// Integer variable assignments.
    pub int_values: Vec<i64>,
    /// Boolean variable assignments.
    pub bool_values: Vec<bool>,
    /// Interval variable assignments.
    pub intervals: Vec<IntervalSolution>,
    /// Solve time in milliseconds.
    pub solve_time_ms: i64,
}

impl CpSolution {
    /// Creates an empty solution with the given status.
    pub fn empty(status: SolverStatus) -> Self {
        Self {
            status,
            objective_value: None,
            int_values: Vec::new(),
            bool_values: Vec::new(),
            intervals: Vec::new(),
            solve_time_ms: 0,
        }
    }

    /// Whether a feasible solution was found.
    pub fn is_solution_found(&self) -> bool {
        matches!(self.status, SolverStatus::Optimal | SolverStatus::Feasible)
    }

    /// Returns the maximum end time across all present intervals.
    pub fn max_end(&self) -> i64 {
        self.intervals
            .iter()
            .filter(|s| s.is_present)
            .map(|s| s.end)
            .max()
            .unwrap_or(0)
    }

    /// Assignment of an interval variable.
    pub fn interval(&self, id: IntervalId) -> Option<&IntervalSolution> {
        self.intervals.get(id.index())
    }

    /// Value of an integer variable.
    pub fn value(&self, id: IntVarId) -> Option<i64> {
        self.int_values.get(id.index()).copied()
    }

    /// Value of a boolean variable.
    pub fn literal(&self, id: BoolVarId) -> Option<bool> {
        self.bool_values.get(id.index()).copied()
    }
}

/// Solver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Maximum solve time in milliseconds.
    pub time_limit_ms: i64,
    /// Number of parallel workers.
    pub num_workers: usize,
    /// Stop after finding the first feasible solution.
    pub stop_after_first: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_ms: 60_000,
            num_workers: 1,
            stop_after_first: false,
        }
    }
}

impl SolverConfig {
    /// Sets the time limit.
    pub fn with_time_limit_ms(mut self, ms: i64) -> Self {
        self.time_limit_ms = ms;
        self
    }

    /// Sets the number of parallel workers.
    pub fn with_num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    /// Stops at the first feasible solution.
    pub fn with_stop_after_first(mut self, stop: bool) -> Self {
        self.stop_after_first = stop;
        self
    }
}

/// Trait for CP solver implementations.
///
/// Implementors provide the actual constraint solving logic.
/// This can wrap external solvers (e.g., OR-Tools CP-SAT) or
/// provide custom heuristics.
pub trait CpSolver {
    /// Solves the model and returns a solution.
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution;
}

/// A greedy list-scheduling solver.
///
/// Mandatory intervals are placed one at a time in topological order of
/// the precedence graph (lowest index first among ready intervals), each
/// as early as its predecessors and no-overlap groups allow. Optional
/// intervals tied to a mandatory interval by a same-start constraint are
/// its alternatives: the one finishing earliest is made present, the rest
/// are absent and mirror the mandatory interval's times.
///
/// # Limitations
///
/// - Single pass: never proves optimality unless the model is empty
/// - Optional intervals without a same-start link to a mandatory interval
///   are left absent
/// - Exactly-one constraints are only satisfied through alternative
///   selection; free boolean variables are set to false
/// - `num_workers` and `stop_after_first` have no effect
///
/// # Reference
/// Kolisch (1996), "Serial and parallel resource-constrained project
/// scheduling methods revisited"
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyCpSolver;

impl GreedyCpSolver {
    pub fn new() -> Self {
        Self
    }
}

/// Interval roles and graphs derived from the constraint list.
struct Structure {
    /// Optional alternatives of each mandatory interval.
    alternatives: Vec<Vec<usize>>,
    /// Mandatory owner of each optional interval.
    owner: Vec<Option<usize>>,
    /// No-overlap groups each interval belongs to.
    groups_of: Vec<Vec<usize>>,
    num_groups: usize,
    /// Precedence predecessors (owner index, delay) per mandatory interval.
    preds: Vec<Vec<(usize, i64)>>,
    succs: Vec<Vec<usize>>,
}

impl Structure {
    fn analyze(model: &CpModel) -> Self {
        let n = model.intervals.len();
        let optional = |i: usize| model.intervals[i].is_optional();

        let mut alternatives = vec![Vec::new(); n];
        let mut owner = vec![None; n];
        for c in &model.constraints {
            if let Constraint::SameStart {
                interval1,
                interval2,
            } = c
            {
                let (a, b) = (interval1.index(), interval2.index());
                let link = match (optional(a), optional(b)) {
                    (false, true) => Some((a, b)),
                    (true, false) => Some((b, a)),
                    _ => None,
                };
                if let Some((main, alt)) = link {
                    if owner[alt].is_none() {
                        owner[alt] = Some(main);
                        alternatives[main].push(alt);
                    }
                }
            }
        }

        let resolve = |i: usize| if optional(i) { owner[i] } else { Some(i) };

        let mut groups_of = vec![Vec::new(); n];
        let mut num_groups = 0;
        let mut preds = vec![Vec::new(); n];
        let mut succs = vec![Vec::new(); n];
        for c in &model.constraints {
            match c {
                Constraint::NoOverlap { intervals } => {
                    for id in intervals {
                        groups_of[id.index()].push(num_groups);
                    }
                    num_groups += 1;
                }
                Constraint::Precedence {
                    before,
                    after,
                    min_delay,
                } => {
                    if let (Some(b), Some(a)) = (resolve(before.index()), resolve(after.index())) {
                        if a != b {
                            preds[a].push((b, *min_delay));
                            succs[b].push(a);
                        }
                    }
                }
                _ => {}
            }
        }

        Self {
            alternatives,
            owner,
            groups_of,
            num_groups,
            preds,
            succs,
        }
    }

    /// Kahn's algorithm over mandatory intervals; `None` on a cycle.
    fn topological_order(&self, model: &CpModel) -> Option<Vec<usize>> {
        let mains: Vec<usize> = (0..model.intervals.len())
            .filter(|&i| !model.intervals[i].is_optional())
            .collect();

        let mut in_degree: Vec<usize> = self.preds.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<usize>> = mains
            .iter()
            .filter(|&&m| in_degree[m] == 0)
            .map(|&m| Reverse(m))
            .collect();

        let mut order = Vec::with_capacity(mains.len());
        while let Some(Reverse(m)) = ready.pop() {
            order.push(m);
            for &s in &self.succs[m] {
                in_degree[s] -= 1;
                if in_degree[s] == 0 {
                    ready.push(Reverse(s));
                }
            }
        }

        (order.len() == mains.len()).then_some(order)
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    i64::try_from(started.elapsed().as_millis()).unwrap_or(i64::MAX)
}

impl CpSolver for GreedyCpSolver {
    fn solve(&self, model: &CpModel, config: &SolverConfig) -> CpSolution {
        if let Err(err) = model.validate() {
            debug!("model {:?} rejected: {err}", model.name);
            return CpSolution::empty(SolverStatus::ModelInvalid);
        }

        let started = Instant::now();
        let structure = Structure::analyze(model);
        let Some(order) = structure.topological_order(model) else {
            debug!("model {:?}: precedence graph is cyclic", model.name);
            return CpSolution::empty(SolverStatus::Infeasible);
        };

        let mut bool_values: Vec<bool> = model
            .bool_vars
            .iter()
            .map(|b| b.fixed.unwrap_or(false))
            .collect();
        let mut placed: Vec<Option<IntervalSolution>> = vec![None; model.intervals.len()];
        let mut group_end = vec![i64::MIN; structure.num_groups];
        let mut fits = true;

        for main in order {
            if elapsed_ms(started) > config.time_limit_ms {
                debug!("model {:?}: time limit reached", model.name);
                let mut timeout = CpSolution::empty(SolverStatus::Timeout);
                timeout.solve_time_ms = elapsed_ms(started);
                return timeout;
            }

            let iv = &model.intervals[main];
            let mut earliest = iv.start.min;
            for &(pred, delay) in &structure.preds[main] {
                if let Some(p) = placed[pred] {
                    earliest = earliest.max(p.end + delay);
                }
            }

            let candidates: Vec<usize> = if structure.alternatives[main].is_empty() {
                vec![main]
            } else {
                structure.alternatives[main]
                    .iter()
                    .copied()
                    .filter(|&alt| {
                        model.intervals[alt]
                            .presence
                            .map_or(true, |p| model.bool_vars[p.index()].fixed != Some(false))
                    })
                    .collect()
            };

            let best = candidates
                .into_iter()
                .map(|c| {
                    let cand = &model.intervals[c];
                    let start = structure.groups_of[main]
                        .iter()
                        .chain(&structure.groups_of[c])
                        .fold(earliest.max(cand.start.min), |s, &g| s.max(group_end[g]));
                    (start + cand.duration.min, start, c)
                })
                .min_by_key(|&(end, start, _)| (end, start));

            let Some((end, start, chosen)) = best else {
                debug!("model {:?}: interval {main} has no selectable alternative", model.name);
                return CpSolution::empty(SolverStatus::Infeasible);
            };

            let sol = IntervalSolution {
                start,
                end,
                duration: end - start,
                is_present: true,
            };
            for &i in &[main, chosen] {
                let var = &model.intervals[i];
                fits &= var.start.contains(start) && var.end.contains(end);
                fits &= var.duration.contains(sol.duration);
                placed[i] = Some(sol);
                for &g in &structure.groups_of[i] {
                    group_end[g] = group_end[g].max(end);
                }
            }
            if let Some(p) = model.intervals[chosen].presence {
                bool_values[p.index()] = true;
            }
        }

        let intervals: Vec<IntervalSolution> = model
            .intervals
            .iter()
            .enumerate()
            .map(|(i, iv)| {
                placed[i].unwrap_or_else(|| {
                    let mirror = structure.owner[i].and_then(|m| placed[m]);
                    let (start, end) = match mirror {
                        Some(m) => (m.start, m.end),
                        None => (iv.start.min, iv.end.min.max(iv.start.min)),
                    };
                    IntervalSolution {
                        start,
                        end,
                        duration: end - start,
                        is_present: false,
                    }
                })
            })
            .collect();

        let mut int_values: Vec<i64> = model.int_vars.iter().map(|v| v.min).collect();
        for c in &model.constraints {
            if let Constraint::MaxEnd { target, intervals: ids } = c {
                let value = ids
                    .iter()
                    .map(|id| intervals[id.index()])
                    .filter(|s| s.is_present)
                    .map(|s| s.end)
                    .max()
                    .unwrap_or(0);
                fits &= model.int_vars[target.index()].contains(value);
                int_values[target.index()] = value;
            }
        }

        let objective_value = match model.objective {
            Some(Objective::Minimize(var)) => Some(int_values[var.index()]),
            None => None,
        };

        let status = if model.intervals.is_empty() {
            SolverStatus::Optimal
        } else if fits {
            SolverStatus::Feasible
        } else {
            SolverStatus::Unknown
        };

        let solution = CpSolution {
            status,
            objective_value,
            int_values,
            bool_values,
            intervals,
            solve_time_ms: elapsed_ms(started),
        };
        debug!(
            "model {:?}: {:?}, objective {:?}, {} ms",
            model.name, solution.status, solution.objective_value, solution.solve_time_ms
        );
        solution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::{BoolVar, DurationVar, IntVar, IntervalVar};

    fn solve(model: &CpModel) -> CpSolution {
        GreedyCpSolver::new().solve(model, &SolverConfig::default())
    }

    fn span(start: i64, end: i64, is_present: bool) -> IntervalSolution {
        IntervalSolution {
            start,
            end,
            duration: end - start,
            is_present,
        }
    }

    #[test]
    fn test_greedy_solver_basic() {
        let mut model = CpModel::new("test", 1_000_000);
        let a = model.add_interval(IntervalVar::new("op1", 0, 100_000, 50_000, 200_000));
        let b = model.add_interval(IntervalVar::new("op2", 0, 100_000, 30_000, 200_000));
        let makespan = model.add_int_var(IntVar::new("makespan", 0, 1_000_000));
        model.add_max_end(makespan, vec![a, b]);
        model.set_objective(Objective::Minimize(makespan));

        let solution = solve(&model);

        assert!(solution.is_solution_found());
        assert_eq!(solution.intervals.len(), 2);
        // No shared resource, so both start at 0
        assert_eq!(solution.objective_value, Some(50_000));
        assert!(model.violations(&solution).is_empty());
    }

    #[test]
    fn test_no_overlap() {
        let mut model = CpModel::new("test", 1000);
        let a = model.add_interval(IntervalVar::new("a", 0, 100, 50, 200));
        let b = model.add_interval(IntervalVar::new("b", 0, 100, 30, 200));
        model.add_no_overlap(vec![a, b]);

        let solution = solve(&model);
        assert!(solution.is_solution_found());

        let a = solution.interval(a).unwrap();
        let b = solution.interval(b).unwrap();
        assert!(a.end <= b.start || b.end <= a.start);
        assert!(model.violations(&solution).is_empty());
    }

    #[test]
    fn test_precedence_with_delay() {
        let mut model = CpModel::new("test", 1000);
        let second = model.add_interval(IntervalVar::new("second", 0, 200, 30, 300));
        let first = model.add_interval(IntervalVar::new("first", 0, 100, 50, 200));
        model.add_precedence(first, second, 10);

        let solution = solve(&model);
        assert!(solution.is_solution_found());

        let first = solution.interval(first).unwrap();
        let second = solution.interval(second).unwrap();
        assert_eq!(first.end, 50);
        assert_eq!(second.start, 60);
    }

    #[test]
    fn test_invalid_model() {
        let mut model = CpModel::new("test", 1000);
        model.add_no_overlap(vec![IntervalId::new(0)]);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::ModelInvalid);
    }

    #[test]
    fn test_cycle_is_infeasible() {
        let mut model = CpModel::new("test", 1000);
        let a = model.add_interval(IntervalVar::new("a", 0, 100, 10, 200));
        let b = model.add_interval(IntervalVar::new("b", 0, 100, 10, 200));
        model.add_precedence(a, b, 0);
        model.add_precedence(b, a, 0);

        assert_eq!(solve(&model).status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_alternative_with_earliest_end() {
        let mut model = CpModel::new("test", 100);
        let slow_p = model.add_bool_var(BoolVar::new("slow"));
        let fast_p = model.add_bool_var(BoolVar::new("fast"));
        let main = model.add_interval(IntervalVar::within_horizon(
            "main",
            100,
            DurationVar::new(2, 9),
        ));
        let slow = model.add_interval(
            IntervalVar::within_horizon("slow", 100, DurationVar::fixed(9)).as_optional(slow_p),
        );
        let fast = model.add_interval(
            IntervalVar::within_horizon("fast", 100, DurationVar::fixed(2)).as_optional(fast_p),
        );
        model.add_exactly_one(vec![slow_p, fast_p]);
        for alt in [slow, fast] {
            model.add_same_start(main, alt);
            model.add_same_end(main, alt);
        }
        model.add_same_duration(main, slow, Some(slow_p));
        model.add_same_duration(main, fast, Some(fast_p));

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Feasible);
        assert_eq!(solution.literal(fast_p), Some(true));
        assert_eq!(solution.literal(slow_p), Some(false));
        assert_eq!(solution.interval(main).unwrap().end, 2);
        // absent alternative mirrors the main interval
        assert_eq!(solution.interval(slow).unwrap().end, 2);
        assert!(!solution.interval(slow).unwrap().is_present);
        assert!(model.violations(&solution).is_empty());
    }

    #[test]
    fn test_fixed_false_alternative_is_skipped() {
        let mut model = CpModel::new("test", 100);
        let off = model.add_bool_var(BoolVar::fixed("off", false));
        let main = model.add_interval(IntervalVar::within_horizon(
            "main",
            100,
            DurationVar::new(1, 1),
        ));
        let alt = model.add_interval(
            IntervalVar::within_horizon("alt", 100, DurationVar::fixed(1)).as_optional(off),
        );
        model.add_same_start(main, alt);

        assert_eq!(solve(&model).status, SolverStatus::Infeasible);
    }

    #[test]
    fn test_horizon_overflow_is_unknown() {
        let mut model = CpModel::new("test", 10);
        let a = model.add_interval(IntervalVar::within_horizon("a", 10, DurationVar::fixed(6)));
        let b = model.add_interval(IntervalVar::within_horizon("b", 10, DurationVar::fixed(6)));
        model.add_no_overlap(vec![a, b]);

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Unknown);
        assert!(!solution.is_solution_found());
    }

    #[test]
    fn test_empty_model_is_optimal() {
        let mut model = CpModel::new("empty", 0);
        let makespan = model.add_int_var(IntVar::new("makespan", 0, 0));
        model.add_max_end(makespan, vec![]);
        model.set_objective(Objective::Minimize(makespan));

        let solution = solve(&model);
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective_value, Some(0));
    }

    #[test]
    fn test_time_limit() {
        let mut model = CpModel::new("test", 100);
        model.add_interval(IntervalVar::new("a", 0, 100, 10, 200));

        let config = SolverConfig::default().with_time_limit_ms(-1);
        let solution = GreedyCpSolver::new().solve(&model, &config);
        assert_eq!(solution.status, SolverStatus::Timeout);
    }

    #[test]
    fn test_max_end() {
        let mut solution = CpSolution::empty(SolverStatus::Feasible);
        solution.intervals = vec![
            span(0, 50, true),
            span(10, 80, true),
            span(0, 100, false),
        ];

        assert_eq!(solution.max_end(), 80); // third is not present
        assert_eq!(solution.value(IntVarId::new(0)), None);
    }

    #[test]
    fn test_solver_config() {
        let config = SolverConfig::default();
        assert_eq!(config.time_limit_ms, 60_000);
        assert_eq!(config.num_workers, 1);
        assert!(!config.stop_after_first);

        let config = config
            .with_time_limit_ms(500)
            .with_num_workers(8)
            .with_stop_after_first(true);
        assert_eq!(config.time_limit_ms, 500);
        assert_eq!(config.num_workers, 8);
        assert!(config.stop_after_first);
    }
}
