//! Flexible Job Shop Scheduling (FJSP) instances and their CP formulation.
//!
//! Reads and writes FJSPLIB instances, validates them, and compiles them
//! into a constraint programming model with optional intervals that any
//! [`cp::CpSolver`] can solve. Solver output decodes back into a
//! [`models::Schedule`].
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Instance`, `Operation`, `Mode`, `Schedule`,
//!   `Assignment`
//! - **`validation`**: Structural checks (machine ranges, job partition,
//!   precedence cycles)
//! - **`io`**: FJSPLIB reader and writer
//! - **`cp`**: CP modeling layer, solver boundary, and the FJSP compiler
//! - **`generate`**: Seeded random instance generation
//! - **`error`**: Error types
//!
//! # Example
//!
//! ```
//! use u_fjsp::cp::{FjspCpBuilder, GreedyCpSolver, SolverConfig};
//!
//! let instance = u_fjsp::io::parse("2 3 1.0\n1 2 1 1 2 2\n2 1 1 1 2 3 1 2 1").unwrap();
//! let (schedule, solution) = FjspCpBuilder::new(&instance)
//!     .solve(&GreedyCpSolver::new(), &SolverConfig::default())
//!     .unwrap();
//!
//! assert!(solution.is_solution_found());
//! assert!(schedule.verify(&instance).is_empty());
//! assert_eq!(schedule.makespan(), 3);
//! ```
//!
//! # References
//!
//! - Brandimarte (1993), "Routing and scheduling in a flexible job shop by tabu search"
//! - Pinedo (2016), "Scheduling: Theory, Algorithms, and Systems"
//! - Laborie et al. (2018), "IBM ILOG CP Optimizer for Scheduling"

pub mod cp;
pub mod error;
pub mod generate;
pub mod io;
pub mod models;
pub mod validation;

pub use error::{FormatError, GeneratorError, ModelError};
