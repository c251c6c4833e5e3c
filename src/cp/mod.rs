//! CP-based FJSP formulation.
//!
//! Provides a small constraint programming modeling layer (variables,
//! constraints, a solver boundary) and the compiler that turns an
//! [`Instance`] into a [`CpModel`] using optional intervals:
//!
//! - One interval per operation, with start and end in `[0, horizon]`
//! - One optional interval per (operation, eligible machine), guarded by
//!   a presence literal
//! - `ExactlyOne` over each operation's presence literals
//! - Mode intervals synchronized with their operation interval
//! - `NoOverlap` per machine, `Precedence` per edge
//! - Makespan as the maximum operation end, minimized
//!
//! # Reference
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"
//! - Baptiste et al. (2001), "Constraint-Based Scheduling"

mod model;
mod solver;
mod variables;

pub use model::{Constraint, CpModel, Objective};
pub use solver::{
    CpSolution, CpSolver, GreedyCpSolver, IntervalSolution, SolverConfig, SolverStatus,
};
pub use variables::{
    BoolVar, BoolVarId, DurationVar, IntVar, IntVarId, IntervalId, IntervalVar, TimeVar,
};

use log::{debug, warn};

use crate::error::ModelError;
use crate::models::{Assignment, Instance, Schedule};
use crate::validation::validate_instance;

/// Builds a CP model from an FJSP instance.
///
/// # Example
/// ```
/// use u_fjsp::cp::{FjspCpBuilder, GreedyCpSolver, SolverConfig};
/// use u_fjsp::models::{Instance, Mode};
///
/// let instance = Instance::new(
///     2,
///     vec![vec![vec![Mode::new(0, 3), Mode::new(1, 2)], vec![Mode::new(0, 4)]]],
/// );
/// let (schedule, solution) = FjspCpBuilder::new(&instance)
///     .solve(&GreedyCpSolver::new(), &SolverConfig::default())
///     .unwrap();
/// assert!(solution.is_solution_found());
/// assert_eq!(schedule.makespan(), 6);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FjspCpBuilder<'a> {
    instance: &'a Instance,
    horizon: Option<i64>,
}

/// One (operation, machine) alternative in a compiled model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeVar {
    /// Zero-based machine.
    pub machine: usize,
    /// Processing time on that machine.
    pub duration: u32,
    /// Optional interval placed on the machine.
    pub interval: IntervalId,
    /// Presence literal of `interval`.
    pub present: BoolVarId,
}

/// A compiled FJSP model.
///
/// Keeps the ids of every variable created for the instance so solver
/// output can be mapped back onto operations and machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FjspModel {
    /// The CP model handed to the solver.
    pub model: CpModel,
    /// Operation interval, by global operation index.
    pub operations: Vec<IntervalId>,
    /// Mode alternatives, by global operation index, in mode order.
    pub modes: Vec<Vec<ModeVar>>,
    /// Makespan variable (the objective).
    pub makespan: IntVarId,
}

impl<'a> FjspCpBuilder<'a> {
    /// Creates a new CP builder.
    pub fn new(instance: &'a Instance) -> Self {
        Self {
            instance,
            horizon: None,
        }
    }

    /// Sets the planning horizon.
    ///
    /// Defaults to [`Instance::horizon_bound`]. A smaller horizon is
    /// accepted but may make the model infeasible.
    pub fn with_horizon(mut self, horizon: i64) -> Self {
        self.horizon = Some(horizon);
        self
    }

    /// Horizon the model will be built with.
    pub fn horizon(&self) -> i64 {
        self.horizon.unwrap_or_else(|| self.instance.horizon_bound())
    }

    /// Builds the CP model.
    ///
    /// # Errors
    /// - [`ModelError::EmptyOperation`] if an operation has no modes
    /// - [`ModelError::InvalidInstance`] for any other validation failure
    /// - [`ModelError::InvalidHorizon`] if the horizon is negative
    pub fn build(&self) -> Result<FjspModel, ModelError> {
        let instance = self.instance;

        if let Some(operation) = instance.operations().iter().position(|op| op.modes.is_empty()) {
            return Err(ModelError::EmptyOperation { operation });
        }
        validate_instance(instance).map_err(ModelError::InvalidInstance)?;

        let horizon = self.horizon();
        if horizon < 0 {
            return Err(ModelError::InvalidHorizon { horizon });
        }
        let bound = instance.horizon_bound();
        if horizon < bound {
            warn!("horizon {horizon} is below the safe bound {bound}; the model may be infeasible");
        }

        let mut model = CpModel::new("fjsp", horizon);

        let operations: Vec<IntervalId> = instance
            .operations()
            .iter()
            .enumerate()
            .map(|(i, op)| {
                let duration = DurationVar::new(
                    i64::from(op.min_duration()),
                    i64::from(op.max_duration()),
                );
                model.add_interval(IntervalVar::within_horizon(format!("op{i}"), horizon, duration))
            })
            .collect();

        let mut modes: Vec<Vec<ModeVar>> = Vec::with_capacity(operations.len());
        for (i, op) in instance.operations().iter().enumerate() {
            let vars: Vec<ModeVar> = op
                .modes
                .iter()
                .map(|mode| {
                    let present = model.add_bool_var(BoolVar::new(format!(
                        "op{i}_m{}_present",
                        mode.machine
                    )));
                    let interval = model.add_interval(
                        IntervalVar::within_horizon(
                            format!("op{i}_m{}", mode.machine),
                            horizon,
                            DurationVar::fixed(i64::from(mode.duration)),
                        )
                        .as_optional(present),
                    );
                    ModeVar {
                        machine: mode.machine,
                        duration: mode.duration,
                        interval,
                        present,
                    }
                })
                .collect();
            modes.push(vars);
        }

        for (&main, vars) in operations.iter().zip(&modes) {
            model.add_exactly_one(vars.iter().map(|m| m.present).collect());
            for m in vars {
                model.add_same_start(main, m.interval);
                model.add_same_end(main, m.interval);
                model.add_same_duration(main, m.interval, Some(m.present));
            }
        }

        let mut per_machine: Vec<Vec<IntervalId>> = vec![Vec::new(); instance.num_machines()];
        for m in modes.iter().flatten() {
            per_machine[m.machine].push(m.interval);
        }
        for intervals in per_machine {
            model.add_no_overlap(intervals);
        }

        for &(pred, succ) in instance.precedences() {
            model.add_precedence(operations[pred], operations[succ], 0);
        }

        let makespan = model.add_int_var(IntVar::new("makespan", 0, horizon));
        model.add_max_end(makespan, operations.clone());
        model.set_objective(Objective::Minimize(makespan));

        debug!(
            "compiled {} operation(s) on {} machine(s): {} interval(s), {} literal(s), {} constraint(s), horizon {horizon}",
            instance.num_operations(),
            instance.num_machines(),
            model.interval_count(),
            model.bool_var_count(),
            model.constraint_count(),
        );

        Ok(FjspModel {
            model,
            operations,
            modes,
            makespan,
        })
    }

    /// Builds the model, solves it, and decodes the result.
    ///
    /// The schedule is empty when the solver found no solution; check the
    /// returned solution's status.
    pub fn solve<S: CpSolver + ?Sized>(
        &self,
        solver: &S,
        config: &SolverConfig,
    ) -> Result<(Schedule, CpSolution), ModelError> {
        let fjsp = self.build()?;
        let solution = solver.solve(&fjsp.model, config);
        let schedule = fjsp.decode(self.instance, &solution);
        Ok((schedule, solution))
    }
}

impl FjspModel {
    /// The mode whose presence literal is true in `solution`.
    pub fn selected_mode(&self, operation: usize, solution: &CpSolution) -> Option<&ModeVar> {
        self.modes
            .get(operation)?
            .iter()
            .find(|m| solution.literal(m.present) == Some(true))
    }

    /// Maps solver output back onto the instance.
    ///
    /// Each operation is assigned to its selected machine with the times
    /// of its operation interval. Returns an empty schedule if the solver
    /// did not find a solution.
    pub fn decode(&self, instance: &Instance, solution: &CpSolution) -> Schedule {
        let mut schedule = Schedule::new();
        if !solution.is_solution_found() {
            return schedule;
        }

        for (index, (&interval, op)) in
            self.operations.iter().zip(instance.operations()).enumerate()
        {
            let (Some(mode), Some(sol)) =
                (self.selected_mode(index, solution), solution.interval(interval))
            else {
                continue;
            };
            schedule.add_assignment(Assignment::new(
                index,
                op.job,
                mode.machine,
                sol.start,
                sol.end,
            ));
        }
        schedule
    }
}

/// Compiles an instance with the default horizon.
pub fn compile(instance: &Instance) -> Result<FjspModel, ModelError> {
    FjspCpBuilder::new(instance).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{generate_seeded, GeneratorConfig};
    use crate::models::Mode;

    fn classic() -> Instance {
        Instance::new(
            3,
            vec![
                vec![vec![Mode::new(0, 1), Mode::new(1, 2)]],
                vec![
                    vec![Mode::new(0, 1)],
                    vec![Mode::new(2, 1), Mode::new(1, 1)],
                ],
            ],
        )
    }

    fn count(model: &CpModel, pred: impl Fn(&Constraint) -> bool) -> usize {
        model.constraints.iter().filter(|c| pred(c)).count()
    }

    #[test]
    fn test_classic_model_shape() {
        let inst = classic();
        let builder = FjspCpBuilder::new(&inst);
        assert_eq!(builder.horizon(), 4);

        let fjsp = builder.build().unwrap();
        let model = &fjsp.model;
        // 3 operation intervals + 5 mode intervals
        assert_eq!(model.interval_count(), 8);
        assert_eq!(model.bool_var_count(), 5);
        assert_eq!(model.int_var_count(), 1);
        // 3 exactly-one + 5 × 3 sync + 3 no-overlap + 1 precedence + max-end
        assert_eq!(model.constraint_count(), 23);
        assert_eq!(count(model, |c| matches!(c, Constraint::NoOverlap { .. })), 3);
        assert_eq!(
            count(model, |c| matches!(c, Constraint::SameDuration { enforce_if: Some(_), .. })),
            5
        );
        assert_eq!(model.objective, Some(Objective::Minimize(fjsp.makespan)));
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_interval_domains() {
        let inst = classic();
        let fjsp = compile(&inst).unwrap();
        let op0 = fjsp.model.interval(fjsp.operations[0]).unwrap();
        assert_eq!(op0.start, TimeVar::new(0, 4));
        assert_eq!(op0.end, TimeVar::new(0, 4));
        assert_eq!(op0.duration, DurationVar::new(1, 2));
        assert!(!op0.is_optional());

        let m = fjsp.modes[0][1];
        assert_eq!((m.machine, m.duration), (1, 2));
        let mode_iv = fjsp.model.interval(m.interval).unwrap();
        assert_eq!(mode_iv.duration.fixed_value(), Some(2));
        assert_eq!(mode_iv.presence, Some(m.present));
        assert_eq!(mode_iv.name, "op0_m1");
        assert_eq!(fjsp.model.bool_var(m.present).unwrap().name, "op0_m1_present");
    }

    #[test]
    fn test_exactly_one_per_operation() {
        let inst = classic();
        let fjsp = compile(&inst).unwrap();
        let groups: Vec<&Vec<BoolVarId>> = fjsp
            .model
            .constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::ExactlyOne { literals } => Some(literals),
                _ => None,
            })
            .collect();
        assert_eq!(groups.len(), inst.num_operations());
        for (literals, vars) in groups.iter().zip(&fjsp.modes) {
            let expected: Vec<BoolVarId> = vars.iter().map(|m| m.present).collect();
            assert_eq!(**literals, expected);
        }
    }

    #[test]
    fn test_no_overlap_per_machine() {
        let inst = classic();
        let fjsp = compile(&inst).unwrap();
        let groups: Vec<usize> = fjsp
            .model
            .constraints
            .iter()
            .filter_map(|c| match c {
                Constraint::NoOverlap { intervals } => Some(intervals.len()),
                _ => None,
            })
            .collect();
        // machine 0: op0, op1; machine 1: op0, op2; machine 2: op2
        assert_eq!(groups, vec![2, 2, 1]);
    }

    #[test]
    fn test_greedy_solve_classic() {
        let inst = classic();
        let (schedule, solution) = FjspCpBuilder::new(&inst)
            .solve(&GreedyCpSolver::new(), &SolverConfig::default())
            .unwrap();

        assert_eq!(solution.status, SolverStatus::Feasible);
        assert_eq!(solution.objective_value, Some(3));
        assert_eq!(schedule.makespan(), 3);
        assert_eq!(
            schedule.assignments,
            vec![
                Assignment::new(0, 0, 0, 0, 1),
                Assignment::new(1, 1, 0, 1, 2),
                Assignment::new(2, 1, 2, 2, 3),
            ]
        );
        assert!(schedule.verify(&inst).is_empty());
    }

    #[test]
    fn test_solution_satisfies_model() {
        let inst = classic();
        let fjsp = compile(&inst).unwrap();
        let solution = GreedyCpSolver::new().solve(&fjsp.model, &SolverConfig::default());
        assert!(fjsp.model.violations(&solution).is_empty());

        let makespan = solution.value(fjsp.makespan).unwrap();
        for &op in &fjsp.operations {
            assert!(solution.interval(op).unwrap().end <= makespan);
        }
        assert_eq!(makespan, solution.max_end());
    }

    #[test]
    fn test_empty_instance() {
        let inst = Instance::new(2, vec![]);
        let (schedule, solution) = FjspCpBuilder::new(&inst)
            .solve(&GreedyCpSolver::new(), &SolverConfig::default())
            .unwrap();
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_eq!(solution.objective_value, Some(0));
        assert_eq!(schedule.assignment_count(), 0);
    }

    #[test]
    fn test_empty_operation_error() {
        let inst = Instance::new(2, vec![vec![vec![Mode::new(0, 1)], vec![]]]);
        assert!(matches!(
            compile(&inst),
            Err(ModelError::EmptyOperation { operation: 1 })
        ));
    }

    #[test]
    fn test_invalid_instance_error() {
        let inst = classic().with_precedences([(2, 1)]);
        match compile(&inst) {
            Err(ModelError::InvalidInstance(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected InvalidInstance, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_horizon() {
        let inst = classic();
        assert!(matches!(
            FjspCpBuilder::new(&inst).with_horizon(-1).build(),
            Err(ModelError::InvalidHorizon { horizon: -1 })
        ));
    }

    #[test]
    fn test_tight_horizon() {
        let inst = classic();
        let builder = FjspCpBuilder::new(&inst).with_horizon(2);
        let fjsp = builder.build().unwrap();
        assert_eq!(fjsp.model.horizon, 2);

        // greedy makespan 3 does not fit in a horizon of 2
        let (schedule, solution) = builder
            .solve(&GreedyCpSolver::new(), &SolverConfig::default())
            .unwrap();
        assert!(!solution.is_solution_found());
        assert_eq!(schedule.assignment_count(), 0);
    }

    #[test]
    fn test_generated_instances_solve_cleanly() {
        let config = GeneratorConfig::default();
        for seed in 0..20 {
            let inst = generate_seeded(&config, seed).unwrap();
            let fjsp = compile(&inst).unwrap();
            let solution = GreedyCpSolver::new().solve(&fjsp.model, &SolverConfig::default());

            assert!(solution.is_solution_found(), "seed {seed}");
            assert!(fjsp.model.violations(&solution).is_empty(), "seed {seed}");

            let schedule = fjsp.decode(&inst, &solution);
            assert_eq!(schedule.assignment_count(), inst.num_operations());
            assert!(schedule.verify(&inst).is_empty(), "seed {seed}");
            assert_eq!(Some(schedule.makespan()), solution.objective_value);
        }
    }

    #[test]
    fn test_types_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Instance>();
        assert_send_sync::<CpModel>();
        assert_send_sync::<FjspModel>();
        assert_send_sync::<CpSolution>();
    }
}
