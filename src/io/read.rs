//! FJSPLIB reader.

use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use log::{debug, trace};

use super::parse_number;
use crate::error::FormatError;
use crate::models::{Instance, Mode};

/// Position of the cursor within a job line.
#[derive(Debug, Clone, Copy)]
enum Cursor {
    /// Expecting the job's operation count.
    AwaitOperationCount,
    /// Expecting the number of eligible machines of the next operation.
    AwaitModeCount,
    /// Expecting a 1-based machine; `remaining` pairs still to read.
    AwaitMachine { remaining: usize },
    /// Expecting the processing time on `machine` (zero-based).
    AwaitDuration { remaining: usize, machine: usize },
}

/// Parses an FJSPLIB instance from text.
///
/// Blank lines are skipped. The first line holds the job count, the
/// machine count and an optional flexibility statistic, which is checked
/// to be numeric and otherwise ignored. Every following line describes
/// one job:
///
/// ```text
/// <num ops> { <num machines> { <machine> <duration> }* }*
/// ```
///
/// Machines are 1-based in the file and zero-based in the result.
/// Operations are numbered globally in file order, and each job's
/// operations are chained by precedence edges.
///
/// # Errors
/// Returns a [`FormatError`] naming the offending line when the text
/// doesn't follow this grammar exactly.
pub fn parse(text: &str) -> Result<Instance, FormatError> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| (i + 1, l))
        .collect();

    let [(header_line, header), job_lines @ ..] = lines.as_slice() else {
        return Err(FormatError::TooFewLines { found: 0 });
    };
    if job_lines.is_empty() {
        return Err(FormatError::TooFewLines { found: 1 });
    }

    let (num_jobs, num_machines) = parse_header(*header_line, header)?;
    if num_jobs == 0 || num_machines == 0 {
        return Err(FormatError::InvalidDimensions {
            num_jobs,
            num_machines,
        });
    }
    if job_lines.len() != num_jobs {
        return Err(FormatError::JobCountMismatch {
            declared: num_jobs,
            found: job_lines.len(),
        });
    }

    let jobs = job_lines
        .iter()
        .enumerate()
        .map(|(job, &(line, text))| -> Result<Vec<Vec<Mode>>, FormatError> {
            let ops = parse_job_line(line, text, num_machines)?;
            trace!("job {job} (line {line}): {} operation(s)", ops.len());
            Ok(ops)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let instance = Instance::new(num_machines, jobs);
    debug!(
        "parsed FJSPLIB instance: {} job(s), {} machine(s), {} operation(s)",
        instance.num_jobs(),
        instance.num_machines(),
        instance.num_operations()
    );
    Ok(instance)
}

/// Reads an FJSPLIB instance from a reader.
pub fn read_from<R: Read>(mut reader: R) -> Result<Instance, FormatError> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse(&text)
}

/// Reads an FJSPLIB instance from a file.
pub fn read_path(path: impl AsRef<Path>) -> Result<Instance, FormatError> {
    let text = std::fs::read_to_string(path)?;
    parse(&text)
}

impl FromStr for Instance {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

fn parse_header(line: usize, text: &str) -> Result<(usize, usize), FormatError> {
    let mut tokens = text.split_whitespace();
    let mut field = |name: &'static str| -> Result<usize, FormatError> {
        let token = tokens.next().ok_or(FormatError::MissingHeaderField { line, field: name })?;
        to_usize(line, token)
    };
    let num_jobs = field("job count")?;
    let num_machines = field("machine count")?;

    if let Some(token) = tokens.next() {
        number(line, token)?;
    }
    Ok((num_jobs, num_machines))
}

fn parse_job_line(
    line: usize,
    text: &str,
    num_machines: usize,
) -> Result<Vec<Vec<Mode>>, FormatError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut declared = 0;
    let mut operations: Vec<Vec<Mode>> = Vec::new();
    let mut current: Vec<Mode> = Vec::new();
    let mut cursor = Cursor::AwaitOperationCount;

    for (pos, &token) in tokens.iter().enumerate() {
        cursor = match cursor {
            Cursor::AwaitOperationCount => {
                declared = to_usize(line, token)?;
                Cursor::AwaitModeCount
            }
            Cursor::AwaitModeCount => {
                if operations.len() == declared {
                    return Err(FormatError::TrailingTokens {
                        line,
                        count: tokens.len() - pos,
                    });
                }
                let remaining = to_usize(line, token)?;
                if remaining == 0 {
                    return Err(FormatError::EmptyOperation {
                        line,
                        operation: operations.len(),
                    });
                }
                Cursor::AwaitMachine { remaining }
            }
            Cursor::AwaitMachine { remaining } => {
                let machine = to_usize(line, token)?;
                if machine == 0 || machine > num_machines {
                    return Err(FormatError::MachineOutOfRange {
                        line,
                        machine,
                        num_machines,
                    });
                }
                if current.iter().any(|m| m.machine == machine - 1) {
                    return Err(FormatError::DuplicateMachine {
                        line,
                        operation: operations.len(),
                        machine,
                    });
                }
                Cursor::AwaitDuration {
                    remaining,
                    machine: machine - 1,
                }
            }
            Cursor::AwaitDuration { remaining, machine } => {
                let duration =
                    u32::try_from(number(line, token)?).map_err(|_| invalid(line, token))?;
                current.push(Mode::new(machine, duration));
                if remaining == 1 {
                    operations.push(std::mem::take(&mut current));
                    Cursor::AwaitModeCount
                } else {
                    Cursor::AwaitMachine {
                        remaining: remaining - 1,
                    }
                }
            }
        };
    }

    match cursor {
        Cursor::AwaitOperationCount | Cursor::AwaitModeCount => {
            if operations.len() != declared {
                return Err(FormatError::OperationCountMismatch {
                    line,
                    declared,
                    found: operations.len(),
                });
            }
            Ok(operations)
        }
        Cursor::AwaitMachine { remaining } | Cursor::AwaitDuration { remaining, .. } => {
            Err(FormatError::TruncatedOperation {
                line,
                operation: operations.len(),
                expected: current.len() + remaining,
                found: current.len(),
            })
        }
    }
}

fn invalid(line: usize, token: &str) -> FormatError {
    FormatError::InvalidToken {
        line,
        token: token.to_string(),
    }
}

fn number(line: usize, token: &str) -> Result<u64, FormatError> {
    parse_number(token).ok_or_else(|| invalid(line, token))
}

fn to_usize(line: usize, token: &str) -> Result<usize, FormatError> {
    usize::try_from(number(line, token)?).map_err(|_| invalid(line, token))
}
