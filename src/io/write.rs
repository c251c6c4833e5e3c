//! FJSPLIB writer.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use log::warn;

use crate::models::Instance;

/// Formats an instance as FJSPLIB text.
///
/// The header carries the flexibility statistic (eligible modes per
/// machine) rounded half away from zero to one decimal. Lines are joined
/// by `\n` with no trailing newline.
///
/// The format has no room for precedences other than the job chains.
/// Edges added with [`Instance::with_precedences`] are dropped (with a
/// warning), so [`parse`](super::parse) gives back an equal instance only
/// when [`Instance::has_explicit_precedences`] is false.
pub fn format_instance(instance: &Instance) -> String {
    if instance.has_explicit_precedences() {
        warn!("FJSPLIB keeps only job chains; explicit precedences are dropped");
    }
    let flexibility = (instance.flexibility() * 10.0).round() / 10.0;

    let mut lines = Vec::with_capacity(instance.num_jobs() + 1);
    lines.push(format!(
        "{} {} {:.1}",
        instance.num_jobs(),
        instance.num_machines(),
        flexibility
    ));

    for job in 0..instance.num_jobs() {
        let mut tokens = vec![instance.jobs()[job].len().to_string()];
        for op in instance.job_operations(job) {
            tokens.push(op.modes.len().to_string());
            for mode in &op.modes {
                tokens.push((mode.machine + 1).to_string());
                tokens.push(mode.duration.to_string());
            }
        }
        lines.push(tokens.join(" "));
    }

    lines.join("\n")
}

/// Writes an instance as FJSPLIB text to a writer.
pub fn write_to<W: Write>(mut writer: W, instance: &Instance) -> io::Result<()> {
    writer.write_all(format_instance(instance).as_bytes())
}

/// Writes an instance as FJSPLIB text to a file, replacing its contents.
pub fn write_path(path: impl AsRef<Path>, instance: &Instance) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_to(&mut writer, instance)?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
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

    #[test]
    fn test_format_classic() {
        assert_eq!(
            format_instance(&classic()),
            "2 3 1.7\n1 2 1 1 2 2\n2 1 1 1 2 3 1 2 1"
        );
    }

    #[test]
    fn test_flexibility_formatting() {
        // 4 modes on 2 machines: always one decimal
        let inst = Instance::new(
            2,
            vec![vec![
                vec![Mode::new(0, 1), Mode::new(1, 1)],
                vec![Mode::new(0, 1), Mode::new(1, 1)],
            ]],
        );
        assert!(format_instance(&inst).starts_with("1 2 2.0\n"));

        // 1 mode on 4 machines = 0.25, rounded away from zero
        let inst = Instance::new(4, vec![vec![vec![Mode::new(3, 9)]]]);
        assert_eq!(format_instance(&inst), "1 4 0.3\n1 1 4 9");
    }

    #[test]
    fn test_zero_operation_job() {
        let inst = Instance::new(1, vec![vec![], vec![vec![Mode::new(0, 2)]]]);
        assert_eq!(format_instance(&inst), "2 1 1.0\n0\n1 1 1 2");
    }

    #[test]
    fn test_explicit_precedences_not_written() {
        let inst = classic().with_precedences([(0, 2)]);
        let text = format_instance(&inst);
        assert_eq!(text, format_instance(&classic()));

        let back = crate::io::parse(&text).unwrap();
        assert_eq!(back.precedences(), &[(1, 2)]);
        assert_ne!(back, inst);
        assert_eq!(back, classic());
    }

    #[test]
    fn test_write_to_buffer() {
        let mut buf = Vec::new();
        write_to(&mut buf, &classic()).unwrap();
        assert_eq!(buf, format_instance(&classic()).into_bytes());
        assert!(!buf.ends_with(b"\n"));
    }
}
