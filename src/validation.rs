//! Structural validation of FJSP instances.
//!
//! An [`Instance`] can be built by any producer, so nothing stops a caller
//! from constructing one that breaks the model invariants. This module
//! checks them before compilation and reports every problem found:
//! - Operations without eligible modes
//! - Machine indices outside `[0, num_machines)`
//! - A machine listed twice for one operation
//! - Job index lists that do not partition the operations in order
//! - Precedence edges to unknown operations or self-loops
//! - Circular precedence dependencies (DAG validation)
//!
//! # Reference
//! Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4 (Topological Sort)

use std::collections::HashSet;

use crate::models::Instance;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// An operation has no eligible modes.
    EmptyOperation,
    /// A mode references a machine that doesn't exist.
    MachineOutOfRange,
    /// An operation lists the same machine twice.
    DuplicateMachine,
    /// Job lists and operation back-references disagree.
    InconsistentJobs,
    /// A precedence edge references an unknown operation or itself.
    InvalidPrecedence,
    /// Precedence graph contains a cycle.
    CyclicPrecedence,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// Validates the structure of an instance.
///
/// Checks:
/// 1. Every operation has at least one mode
/// 2. Every mode's machine is in `[0, num_machines)`
/// 3. No machine occurs twice within one operation
/// 4. Jobs list operation indices `0..n` consecutively, in job order,
///    and each operation points back to its job
/// 5. Precedence edges reference existing, distinct operations
/// 6. No circular precedence dependencies
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_instance(instance: &Instance) -> ValidationResult {
    let mut errors = Vec::new();
    let num_machines = instance.num_machines();
    let num_operations = instance.num_operations();

    for (index, op) in instance.operations().iter().enumerate() {
        if op.modes.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyOperation,
                format!("Operation {index} has no eligible modes"),
            ));
        }

        let mut seen = HashSet::new();
        for mode in &op.modes {
            if mode.machine >= num_machines {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MachineOutOfRange,
                    format!(
                        "Operation {index} references machine {} (instance has {num_machines})",
                        mode.machine
                    ),
                ));
            }
            if !seen.insert(mode.machine) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::DuplicateMachine,
                    format!("Operation {index} lists machine {} twice", mode.machine),
                ));
            }
        }
    }

    // Job partition: concatenating the job lists must give 0..n.
    let mut expected = 0;
    for (job, ops) in instance.jobs().iter().enumerate() {
        for &index in ops {
            if index != expected {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InconsistentJobs,
                    format!("Job {job} lists operation {index} where {expected} was expected"),
                ));
            }
            match instance.operation(index) {
                Some(op) if op.job != job => errors.push(ValidationError::new(
                    ValidationErrorKind::InconsistentJobs,
                    format!(
                        "Operation {index} belongs to job {} but is listed under job {job}",
                        op.job
                    ),
                )),
                _ => {}
            }
            expected += 1;
        }
    }
    if expected != num_operations {
        errors.push(ValidationError::new(
            ValidationErrorKind::InconsistentJobs,
            format!("Jobs list {expected} operation(s) but the instance holds {num_operations}"),
        ));
    }

    let mut edges_valid = true;
    for &(pred, succ) in instance.precedences() {
        if pred >= num_operations || succ >= num_operations {
            edges_valid = false;
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPrecedence,
                format!("Precedence ({pred}, {succ}) references an unknown operation"),
            ));
        } else if pred == succ {
            edges_valid = false;
            errors.push(ValidationError::new(
                ValidationErrorKind::InvalidPrecedence,
                format!("Precedence ({pred}, {succ}) is a self-loop"),
            ));
        }
    }

    // Cycle search needs in-range edges; self-loops are already reported.
    if edges_valid {
        if let Some(cycle_err) = detect_cycles(num_operations, instance.precedences()) {
            errors.push(cycle_err);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Detects cycles in the precedence graph using DFS.
///
/// # Algorithm
/// Iterative DFS with three colours. Reaching a node that is still on the
/// stack (grey) is a back-edge, which closes a cycle.
///
/// # Reference
/// Cormen et al. (2009), "Introduction to Algorithms", Ch. 22.4
fn detect_cycles(num_operations: usize, precedences: &[(usize, usize)]) -> Option<ValidationError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Colour {
        White,
        Grey,
        Black,
    }

    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); num_operations];
    for &(pred, succ) in precedences {
        adj[pred].push(succ);
    }

    let mut colour = vec![Colour::White; num_operations];

    for root in 0..num_operations {
        if colour[root] != Colour::White {
            continue;
        }

        // (node, index of the next neighbour to visit)
        let mut stack = vec![(root, 0usize)];
        colour[root] = Colour::Grey;

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            if let Some(&succ) = adj[node].get(frame.1) {
                frame.1 += 1;
                match colour[succ] {
                    Colour::Grey => {
                        return Some(ValidationError::new(
                            ValidationErrorKind::CyclicPrecedence,
                            format!("Circular precedence detected involving operation {succ}"),
                        ));
                    }
                    Colour::White => {
                        colour[succ] = Colour::Grey;
                        stack.push((succ, 0));
                    }
                    Colour::Black => {}
                }
            } else {
                colour[node] = Colour::Black;
                stack.pop();
            }
        }
    }

    None
}
