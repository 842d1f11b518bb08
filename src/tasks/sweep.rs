use std::path::PathBuf;
use std::process::Command;

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;

/// A declarative parameter sweep: one value per flag and one value per
/// environment variable are picked for every run, over the full Cartesian
/// product of the declared values.
///
/// Keys carry their own separator ("-g " or "OMP_NUM_THREADS="), so a
/// combination is rendered by plain key+value concatenation.
#[derive(Clone, Debug)]
pub struct SweepSpec {
    pub command: String,
    pub options: Vec<(String, Vec<String>)>,
    pub env: Vec<(String, Vec<String>)>,
    pub runs: u32,
    pub workdir: PathBuf,
    pub verbose: bool,
}

/// Expand `(key, values)` declarations into every combination of one value
/// per key. Keys iterate in declaration order, values in declared order, the
/// rightmost key varying fastest. An empty declaration yields exactly one
/// empty combination.
pub fn combinations(spec: &[(String, Vec<String>)]) -> Vec<String> {
    let mut combos = vec![String::new()];
    for (key, values) in spec {
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for prefix in &combos {
            for value in values {
                let mut combo = prefix.clone();
                if !combo.is_empty() {
                    combo.push(' ');
                }
                combo.push_str(key);
                combo.push_str(value);
                next.push(combo);
            }
        }
        combos = next;
    }
    combos
}

impl SweepSpec {
    /// Every shell command line this sweep will issue, in execution order:
    /// env combinations outermost, then flag combinations, then repetitions.
    pub fn command_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for env in combinations(&self.env) {
            for opt in combinations(&self.options) {
                for _ in 0..self.runs {
                    let mut parts: Vec<&str> = Vec::with_capacity(4);
                    if !env.is_empty() {
                        parts.push(&env);
                    }
                    parts.push(&self.command);
                    parts.push("-n");
                    if !opt.is_empty() {
                        parts.push(&opt);
                    }
                    lines.push(parts.join(" "));
                }
            }
        }
        lines
    }

    /// Run the whole sweep, one blocking shell invocation at a time, in the
    /// declared working directory. The benchmark appends its own rows to the
    /// shared measurement file; its stdout/stderr pass through untouched.
    ///
    /// An exit status of 1 aborts the remaining combinations and surfaces as
    /// an error value, leaving the caller free to go on with a follow-up
    /// sweep. Other exit statuses are not checked.
    pub fn execute(&self) -> Result<()> {
        let lines = self.command_lines();
        let progress = (!self.verbose).then(|| {
            let pb = ProgressBar::new(lines.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)")
                    .expect("perfxp(sweep): error creating progress bar")
                    .progress_chars("#>-"),
            );
            pb.set_message(self.command.clone());
            pb
        });

        for line in &lines {
            if self.verbose {
                println!("{line}");
            } else {
                debug!("running: {line}");
            }

            let status = Command::new("sh")
                .arg("-c")
                .arg(line)
                .current_dir(&self.workdir)
                .status()
                .with_context(|| format!("failed to launch command: {line}"))?;

            if status.code() == Some(1) {
                bail!("Error on the command used: {line}");
            }

            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = &progress {
            pb.finish();
            println!("Experiments done");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn pairs(spec: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
        spec.iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn scratch_file(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("perfxp-sweep-{}-{name}", std::process::id()));
        let _ = fs::remove_file(&path);
        path
    }

    #[test]
    fn test_combinations_cartesian_product() {
        let options = pairs(&[("-k ", &["a", "b"]), ("-i ", &["1"])]);
        assert_eq!(
            combinations(&options),
            vec!["-k a -i 1", "-k b -i 1"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_combinations_empty_spec() {
        assert_eq!(combinations(&[]), vec![String::new()]);
    }

    #[test]
    fn test_command_lines_enumeration_order() {
        let sweep = SweepSpec {
            command: "./run".to_string(),
            options: pairs(&[("-k ", &["a", "b"]), ("-i ", &["1"])]),
            env: pairs(&[("E=", &["1", "2"])]),
            runs: 1,
            workdir: PathBuf::from("."),
            verbose: false,
        };
        // 2 flag combos x 1 x 2 env combos = 4 distinct lines, env outermost
        assert_eq!(
            sweep.command_lines(),
            vec![
                "E=1 ./run -n -k a -i 1",
                "E=1 ./run -n -k b -i 1",
                "E=2 ./run -n -k a -i 1",
                "E=2 ./run -n -k b -i 1",
            ]
        );
    }

    #[test]
    fn test_repetitions_repeat_identical_lines() {
        let sweep = SweepSpec {
            command: "./run".to_string(),
            options: pairs(&[("-k ", &["a"])]),
            env: pairs(&[("E=", &["1"])]),
            runs: 3,
            workdir: PathBuf::from("."),
            verbose: false,
        };
        let lines = sweep.command_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l == &lines[0]));
    }

    #[test]
    fn test_execute_invokes_once_per_repetition() {
        let marker = scratch_file("reps");
        let sweep = SweepSpec {
            command: format!("echo run >> {}", marker.display()),
            options: vec![],
            env: vec![],
            runs: 3,
            workdir: std::env::temp_dir(),
            verbose: true,
        };
        sweep.execute().unwrap();
        let content = fs::read_to_string(&marker).unwrap();
        assert_eq!(content.lines().count(), 3);
        let _ = fs::remove_file(&marker);
    }

    #[test]
    fn test_execute_aborts_on_exit_code_one() {
        let marker = scratch_file("abort");
        let sweep = SweepSpec {
            command: format!("echo attempt >> {}; exit 1; echo", marker.display()),
            options: pairs(&[("-k ", &["a", "b", "c"])]),
            env: vec![],
            runs: 1,
            workdir: std::env::temp_dir(),
            verbose: true,
        };
        let err = sweep.execute().unwrap_err();
        assert!(err.to_string().contains("Error on the command used"));
        // The remaining two combinations were skipped
        let content = fs::read_to_string(&marker).unwrap();
        assert_eq!(content.lines().count(), 1);
        let _ = fs::remove_file(&marker);
    }

    #[test]
    fn test_execute_ignores_other_exit_codes() {
        // Only exit status 1 is checked; a status of 2 sails through
        let sweep = SweepSpec {
            command: "exit 2; echo".to_string(),
            options: vec![],
            env: vec![],
            runs: 1,
            workdir: std::env::temp_dir(),
            verbose: true,
        };
        assert!(sweep.execute().is_ok());
    }
}
