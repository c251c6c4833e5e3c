//! CP model definition.

use super::solver::CpSolution;
use super::variables::{BoolVar, BoolVarId, IntVar, IntVarId, IntervalId, IntervalVar};
use crate::error::ModelError;

/// A constraint in the CP model.
///
/// These are the scheduling constraints needed to express
/// alternative-resource (flexible) scheduling: resource disjunctions,
/// precedences, interval synchronization, mode selection and an
/// aggregated completion time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// Non-overlapping intervals on a shared resource.
    ///
    /// No two present intervals in the set may overlap in time. Absent
    /// intervals are ignored.
    NoOverlap {
        /// Intervals that must not overlap.
        intervals: Vec<IntervalId>,
    },

    /// Precedence constraint: `before` must end before `after` starts.
    ///
    /// More precisely: `end(before) + min_delay <= start(after)`, enforced
    /// when both intervals are present.
    Precedence {
        /// Interval that must come first.
        before: IntervalId,
        /// Interval that must come after.
        after: IntervalId,
        /// Minimum delay between end of `before` and start of `after`.
        min_delay: i64,
    },

    /// Same-start constraint: two intervals start at the same time.
    SameStart {
        interval1: IntervalId,
        interval2: IntervalId,
    },

    /// Same-end constraint: two intervals end at the same time.
    SameEnd {
        interval1: IntervalId,
        interval2: IntervalId,
    },

    /// Same-duration constraint, optionally reified.
    ///
    /// With `enforce_if`, the durations only need to agree when that
    /// literal is true.
    SameDuration {
        interval1: IntervalId,
        interval2: IntervalId,
        enforce_if: Option<BoolVarId>,
    },

    /// Exactly one of the literals is true.
    ExactlyOne {
        /// Literals of which exactly one holds.
        literals: Vec<BoolVarId>,
    },

    /// `target` equals the maximum end over the present intervals
    /// (0 when none is present).
    MaxEnd {
        /// Variable receiving the maximum.
        target: IntVarId,
        /// Intervals whose ends are aggregated.
        intervals: Vec<IntervalId>,
    },
}

/// Objective function for the CP model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Objective {
    /// Minimize an integer variable.
    Minimize(IntVarId),
}

/// A constraint programming model.
///
/// Contains variables, constraints, and an optional objective function.
/// The model is plain data: once built it can be shared read-only between
/// any number of solver workers.
///
/// # Examples
///
/// ```
/// use u_fjsp::cp::{CpModel, IntVar, IntervalVar, Objective};
///
/// let mut model = CpModel::new("example", 1000);
/// let op1 = model.add_interval(IntervalVar::new("op1", 0, 100, 50, 200));
/// let op2 = model.add_interval(IntervalVar::new("op2", 0, 100, 30, 200));
/// model.add_no_overlap(vec![op1, op2]);
/// let makespan = model.add_int_var(IntVar::new("makespan", 0, 1000));
/// model.add_max_end(makespan, vec![op1, op2]);
/// model.set_objective(Objective::Minimize(makespan));
/// assert!(model.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CpModel {
    /// Model name.
    pub name: String,
    /// Planning horizon (maximum time).
    pub horizon: i64,
    /// Integer variables, indexed by [`IntVarId`].
    pub int_vars: Vec<IntVar>,
    /// Boolean variables, indexed by [`BoolVarId`].
    pub bool_vars: Vec<BoolVar>,
    /// Interval variables, indexed by [`IntervalId`].
    pub intervals: Vec<IntervalVar>,
    /// Constraints.
    pub constraints: Vec<Constraint>,
    /// Objective function.
    pub objective: Option<Objective>,
}

impl CpModel {
    /// Creates a new empty model.
    pub fn new(name: impl Into<String>, horizon: i64) -> Self {
        Self {
            name: name.into(),
            horizon,
            int_vars: Vec::new(),
            bool_vars: Vec::new(),
            intervals: Vec::new(),
            constraints: Vec::new(),
            objective: None,
        }
    }

    /// Adds an interval variable.
    pub fn add_interval(&mut self, var: IntervalVar) -> IntervalId {
        self.intervals.push(var);
        IntervalId::new(self.intervals.len() - 1)
    }

    /// Adds an integer variable.
    pub fn add_int_var(&mut self, var: IntVar) -> IntVarId {
        self.int_vars.push(var);
        IntVarId::new(self.int_vars.len() - 1)
    }

    /// Adds a boolean variable.
    pub fn add_bool_var(&mut self, var: BoolVar) -> BoolVarId {
        self.bool_vars.push(var);
        BoolVarId::new(self.bool_vars.len() - 1)
    }

    /// Looks up an interval variable.
    pub fn interval(&self, id: IntervalId) -> Option<&IntervalVar> {
        self.intervals.get(id.index())
    }

    /// Looks up an integer variable.
    pub fn int_var(&self, id: IntVarId) -> Option<&IntVar> {
        self.int_vars.get(id.index())
    }

    /// Looks up a boolean variable.
    pub fn bool_var(&self, id: BoolVarId) -> Option<&BoolVar> {
        self.bool_vars.get(id.index())
    }

    /// Adds a constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    /// Convenience: add a no-overlap constraint.
    pub fn add_no_overlap(&mut self, intervals: Vec<IntervalId>) {
        self.add_constraint(Constraint::NoOverlap { intervals });
    }

    /// Convenience: add a precedence constraint.
    pub fn add_precedence(&mut self, before: IntervalId, after: IntervalId, min_delay: i64) {
        self.add_constraint(Constraint::Precedence {
            before,
            after,
            min_delay,
        });
    }

    /// Convenience: add a same-start constraint.
    pub fn add_same_start(&mut self, interval1: IntervalId, interval2: IntervalId) {
        self.add_constraint(Constraint::SameStart {
            interval1,
            interval2,
        });
    }

    /// Convenience: add a same-end constraint.
    pub fn add_same_end(&mut self, interval1: IntervalId, interval2: IntervalId) {
        self.add_constraint(Constraint::SameEnd {
            interval1,
            interval2,
        });
    }

    /// Convenience: add a same-duration constraint, enforced only if
    /// `enforce_if` is true when given.
    pub fn add_same_duration(
        &mut self,
        interval1: IntervalId,
        interval2: IntervalId,
        enforce_if: Option<BoolVarId>,
    ) {
        self.add_constraint(Constraint::SameDuration {
            interval1,
            interval2,
            enforce_if,
        });
    }

    /// Convenience: add an exactly-one constraint.
    pub fn add_exactly_one(&mut self, literals: Vec<BoolVarId>) {
        self.add_constraint(Constraint::ExactlyOne { literals });
    }

    /// Convenience: constrain `target` to the maximum end of `intervals`.
    pub fn add_max_end(&mut self, target: IntVarId, intervals: Vec<IntervalId>) {
        self.add_constraint(Constraint::MaxEnd { target, intervals });
    }

    /// Sets the objective function.
    pub fn set_objective(&mut self, objective: Objective) {
        self.objective = Some(objective);
    }

    /// Validates the model for consistency.
    ///
    /// Checks that every id referenced by an interval, a constraint, or
    /// the objective belongs to this model.
    pub fn validate(&self) -> Result<(), ModelError> {
        for interval in &self.intervals {
            if let Some(presence) = interval.presence {
                self.check_bool(presence)?;
            }
        }

        for constraint in &self.constraints {
            match constraint {
                Constraint::NoOverlap { intervals } => {
                    for &id in intervals {
                        self.check_interval(id)?;
                    }
                }
                Constraint::Precedence { before, after, .. } => {
                    self.check_interval(*before)?;
                    self.check_interval(*after)?;
                }
                Constraint::SameStart {
                    interval1,
                    interval2,
                }
                | Constraint::SameEnd {
                    interval1,
                    interval2,
                } => {
                    self.check_interval(*interval1)?;
                    self.check_interval(*interval2)?;
                }
                Constraint::SameDuration {
                    interval1,
                    interval2,
                    enforce_if,
                } => {
                    self.check_interval(*interval1)?;
                    self.check_interval(*interval2)?;
                    if let Some(literal) = enforce_if {
                        self.check_bool(*literal)?;
                    }
                }
                Constraint::ExactlyOne { literals } => {
                    for &literal in literals {
                        self.check_bool(literal)?;
                    }
                }
                Constraint::MaxEnd { target, intervals } => {
                    self.check_int(*target)?;
                    for &id in intervals {
                        self.check_interval(id)?;
                    }
                }
            }
        }

        match self.objective {
            Some(Objective::Minimize(var)) => self.check_int(var),
            None => Ok(()),
        }
    }

    fn check_interval(&self, id: IntervalId) -> Result<(), ModelError> {
        self.interval(id).map(|_| ()).ok_or(ModelError::UndefinedReference {
            kind: "interval",
            index: id.index(),
        })
    }

    fn check_int(&self, id: IntVarId) -> Result<(), ModelError> {
        self.int_var(id).map(|_| ()).ok_or(ModelError::UndefinedReference {
            kind: "integer variable",
            index: id.index(),
        })
    }

    fn check_bool(&self, id: BoolVarId) -> Result<(), ModelError> {
        self.bool_var(id).map(|_| ()).ok_or(ModelError::UndefinedReference {
            kind: "boolean variable",
            index: id.index(),
        })
    }

    /// Returns the number of interval variables.
    pub fn interval_count(&self) -> usize {
        self.intervals.len()
    }

    /// Returns the number of integer variables.
    pub fn int_var_count(&self) -> usize {
        self.int_vars.len()
    }

    /// Returns the number of boolean variables.
    pub fn bool_var_count(&self) -> usize {
        self.bool_vars.len()
    }

    /// Returns the number of constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Checks a solution against every domain, interval invariant,
    /// constraint and the objective.
    ///
    /// Returns one message per problem; an empty list means the solution
    /// satisfies the model. A model that fails [`validate`](Self::validate)
    /// yields that error as its only message. Presence is read from the boolean assignment,
    /// and an interval's `is_present` flag must agree with it.
    pub fn violations(&self, solution: &CpSolution) -> Vec<String> {
        if let Err(err) = self.validate() {
            return vec![err.to_string()];
        }

        let mut out = Vec::new();

        if solution.intervals.len() != self.intervals.len()
            || solution.int_values.len() != self.int_vars.len()
            || solution.bool_values.len() != self.bool_vars.len()
        {
            out.push(format!(
                "solution shape ({} intervals, {} ints, {} bools) does not match the model ({}, {}, {})",
                solution.intervals.len(),
                solution.int_values.len(),
                solution.bool_values.len(),
                self.intervals.len(),
                self.int_vars.len(),
                self.bool_vars.len(),
            ));
            return out;
        }

        for (index, (var, &value)) in self.int_vars.iter().zip(&solution.int_values).enumerate() {
            if !var.contains(value) {
                out.push(format!("x{index} = {value} outside [{}, {}]", var.min, var.max));
            }
        }

        for (index, (var, &value)) in self.bool_vars.iter().zip(&solution.bool_values).enumerate() {
            if var.fixed.is_some_and(|fixed| fixed != value) {
                out.push(format!("b{index} = {value} contradicts its fixed value"));
            }
        }

        let present: Vec<bool> = self
            .intervals
            .iter()
            .map(|iv| iv.presence.map_or(true, |p| solution.bool_values[p.index()]))
            .collect();

        for (index, (var, sol)) in self.intervals.iter().zip(&solution.intervals).enumerate() {
            if sol.is_present != present[index] {
                out.push(format!("i{index} presence flag disagrees with its literal"));
            }
            if !var.start.contains(sol.start) || !var.end.contains(sol.end) {
                out.push(format!(
                    "i{index} [{}, {}) outside its start/end domains",
                    sol.start, sol.end
                ));
            }
            if present[index] {
                if !var.duration.contains(sol.duration) {
                    out.push(format!("i{index} duration {} outside its domain", sol.duration));
                }
                if sol.start + sol.duration != sol.end {
                    out.push(format!("i{index} violates end = start + duration"));
                }
            }
        }

        for constraint in &self.constraints {
            if let Some(message) = self.check_constraint(constraint, solution, &present) {
                out.push(message);
            }
        }

        if let (Some(Objective::Minimize(var)), Some(value)) =
            (self.objective, solution.objective_value)
        {
            if solution.int_values[var.index()] != value {
                out.push(format!("objective value {value} differs from {var}"));
            }
        }

        out
    }

    fn check_constraint(
        &self,
        constraint: &Constraint,
        solution: &CpSolution,
        present: &[bool],
    ) -> Option<String> {
        let iv = move |id: IntervalId| &solution.intervals[id.index()];

        match constraint {
            Constraint::NoOverlap { intervals } => {
                let mut active: Vec<(i64, i64, IntervalId)> = intervals
                    .iter()
                    .filter(|id| present[id.index()] && iv(**id).duration > 0)
                    .map(|&id| (iv(id).start, iv(id).end, id))
                    .collect();
                active.sort();
                active
                    .windows(2)
                    .find(|w| w[1].0 < w[0].1)
                    .map(|w| format!("no-overlap violated by {} and {}", w[0].2, w[1].2))
            }
            Constraint::Precedence {
                before,
                after,
                min_delay,
            } => {
                let both = present[before.index()] && present[after.index()];
                (both && iv(*before).end + min_delay > iv(*after).start)
                    .then(|| format!("precedence {before} -> {after} violated"))
            }
            Constraint::SameStart {
                interval1,
                interval2,
            } => (iv(*interval1).start != iv(*interval2).start)
                .then(|| format!("same-start {interval1} / {interval2} violated")),
            Constraint::SameEnd {
                interval1,
                interval2,
            } => (iv(*interval1).end != iv(*interval2).end)
                .then(|| format!("same-end {interval1} / {interval2} violated")),
            Constraint::SameDuration {
                interval1,
                interval2,
                enforce_if,
            } => {
                let enforced = enforce_if.map_or(true, |l| solution.bool_values[l.index()]);
                (enforced && iv(*interval1).duration != iv(*interval2).duration)
                    .then(|| format!("same-duration {interval1} / {interval2} violated"))
            }
            Constraint::ExactlyOne { literals } => {
                let count = literals
                    .iter()
                    .filter(|l| solution.bool_values[l.index()])
                    .count();
                (count != 1).then(|| format!("exactly-one has {count} true literal(s)"))
            }
            Constraint::MaxEnd { target, intervals } => {
                let max_end = intervals
                    .iter()
                    .filter(|id| present[id.index()])
                    .map(|&id| iv(id).end)
                    .max()
                    .unwrap_or(0);
                let value = solution.int_values[target.index()];
                (value != max_end).then(|| format!("{target} = {value} but max end is {max_end}"))
            }
        }
    }
}
