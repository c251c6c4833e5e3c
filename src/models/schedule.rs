//! Schedule (solution) model.
//!
//! A schedule assigns every operation of an instance to one of its
//! eligible machines and a time interval. It is what a solver's answer
//! looks like once decoded back onto the instance.
//!
//! # Reference
//! Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems", Ch. 3

use serde::{Deserialize, Serialize};

use super::Instance;

/// A complete or partial schedule for an FJSP instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// Operation assignments (operation → machine × time).
    pub assignments: Vec<Assignment>,
}

/// An operation-machine-time assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// Global operation index.
    pub operation: usize,
    /// Owning job (denormalized for query convenience).
    pub job: usize,
    /// Selected machine (zero-based).
    pub machine: usize,
    /// Start time.
    pub start: i64,
    /// End time.
    pub end: i64,
}

/// A broken schedule property, found by [`Schedule::verify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Type of violation.
    pub violation_type: ViolationType,
    /// Operation the violation is reported against.
    pub operation: usize,
    /// Human-readable description.
    pub message: String,
}

/// Classification of schedule violations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// An operation has no assignment.
    MissingOperation,
    /// An operation is assigned more than once.
    DuplicateOperation,
    /// Assignment refers to an operation the instance doesn't have.
    UnknownOperation,
    /// Operation placed on a machine it has no mode for.
    IneligibleMachine,
    /// Interval length differs from the mode's processing time.
    DurationMismatch,
    /// Two operations overlap on the same machine.
    MachineOverlap,
    /// Operation started before its predecessor finished.
    PrecedenceViolation,
}

impl Assignment {
    /// Creates a new assignment.
    pub fn new(operation: usize, job: usize, machine: usize, start: i64, end: i64) -> Self {
        Self {
            operation,
            job,
            machine,
            start,
            end,
        }
    }

    /// Duration (end - start).
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }
}

impl Violation {
    fn new(violation_type: ViolationType, operation: usize, message: impl Into<String>) -> Self {
        Self {
            violation_type,
            operation,
            message: message.into(),
        }
    }
}

impl Schedule {
    /// Creates an empty schedule.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Makespan: latest end time across all assignments.
    pub fn makespan(&self) -> i64 {
        self.assignments.iter().map(|a| a.end).max().unwrap_or(0)
    }

    /// Finds the assignment for a given operation.
    pub fn assignment_for_operation(&self, operation: usize) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.operation == operation)
    }

    /// Returns all assignments for a given job.
    pub fn assignments_for_job(&self, job: usize) -> Vec<&Assignment> {
        self.assignments.iter().filter(|a| a.job == job).collect()
    }

    /// Returns all assignments on a given machine, ordered by start time.
    pub fn assignments_for_machine(&self, machine: usize) -> Vec<&Assignment> {
        let mut on_machine: Vec<&Assignment> = self
            .assignments
            .iter()
            .filter(|a| a.machine == machine)
            .collect();
        on_machine.sort_by_key(|a| (a.start, a.end));
        on_machine
    }

    /// Completion time for a job (latest end of its assignments).
    pub fn job_completion_time(&self, job: usize) -> Option<i64> {
        self.assignments_for_job(job).iter().map(|a| a.end).max()
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Checks the schedule against an instance.
    ///
    /// Reports every violation found: each operation assigned exactly
    /// once, on an eligible machine, for exactly that mode's duration, with
    /// no overlap per machine and every precedence edge respected.
    /// Zero-length operations never overlap anything.
    pub fn verify(&self, instance: &Instance) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut by_operation: Vec<Option<&Assignment>> = vec![None; instance.num_operations()];

        for a in &self.assignments {
            let Some(op) = instance.operation(a.operation) else {
                violations.push(Violation::new(
                    ViolationType::UnknownOperation,
                    a.operation,
                    format!("Operation {} does not exist", a.operation),
                ));
                continue;
            };

            // the first assignment wins; later ones are only reported
            if by_operation[a.operation].is_some() {
                violations.push(Violation::new(
                    ViolationType::DuplicateOperation,
                    a.operation,
                    format!("Operation {} is assigned more than once", a.operation),
                ));
            } else {
                by_operation[a.operation] = Some(a);
            }

            match op.mode_on(a.machine) {
                None => violations.push(Violation::new(
                    ViolationType::IneligibleMachine,
                    a.operation,
                    format!("Operation {} cannot run on machine {}", a.operation, a.machine),
                )),
                Some(mode) if i64::from(mode.duration) != a.duration() => {
                    violations.push(Violation::new(
                        ViolationType::DurationMismatch,
                        a.operation,
                        format!(
                            "Operation {} takes {} on machine {} but is scheduled for {}",
                            a.operation,
                            mode.duration,
                            a.machine,
                            a.duration()
                        ),
                    ))
                }
                Some(_) => {}
            }
        }

        for (operation, assigned) in by_operation.iter().enumerate() {
            if assigned.is_none() {
                violations.push(Violation::new(
                    ViolationType::MissingOperation,
                    operation,
                    format!("Operation {operation} is not scheduled"),
                ));
            }
        }

        for machine in 0..instance.num_machines() {
            // Sorted by start, so comparing against the latest-ending
            // earlier interval catches every overlap.
            let mut latest: Option<&Assignment> = None;
            for a in self.assignments_for_machine(machine) {
                if a.duration() <= 0 {
                    continue;
                }
                if let Some(prev) = latest {
                    if a.start < prev.end {
                        violations.push(Violation::new(
                            ViolationType::MachineOverlap,
                            a.operation,
                            format!(
                                "Operations {} and {} overlap on machine {machine}",
                                prev.operation, a.operation
                            ),
                        ));
                    }
                    if a.end <= prev.end {
                        continue;
                    }
                }
                latest = Some(a);
            }
        }

        for &(pred, succ) in instance.precedences() {
            let (Some(Some(p)), Some(Some(s))) = (by_operation.get(pred), by_operation.get(succ))
            else {
                continue;
            };
            if p.end > s.start {
                violations.push(Violation::new(
                    ViolationType::PrecedenceViolation,
                    succ,
                    format!(
                        "Operation {succ} starts at {} before {pred} ends at {}",
                        s.start, p.end
                    ),
                ));
            }
        }

        violations
    }
}
