//! FJSP domain models.
//!
//! Provides the instance data types and the decoded schedule.
//!
//! # Domain Mappings
//!
//! | u-fjsp | FJSPLIB | Manufacturing |
//! |--------|---------|---------------|
//! | Instance | instance file | Production order book |
//! | Operation | operation | Routing step |
//! | Mode | (machine, time) pair | Machine alternative |
//! | Schedule | solution | Production plan |

mod instance;
mod schedule;

pub use instance::{Instance, Mode, Operation};
pub use schedule::{Assignment, Schedule, Violation, ViolationType};
