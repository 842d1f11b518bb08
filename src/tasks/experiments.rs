use std::path::PathBuf;

use anyhow::Result;
use clap::ValueEnum;
use log::error;

use crate::tasks::sweep::SweepSpec;

/// The pre-declared sweeps. Each one is a runnable configuration: the values
/// below are the whole interface, there are no extra knobs.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Experiment {
    Mandel,
    Life,
    Rotation90,
    Divergence,
}

fn values<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn keyed(key: &str, vals: Vec<String>) -> (String, Vec<String>) {
    (key.to_string(), vals)
}

/// 1 plus the even thread counts up to `max` inclusive.
fn thread_ladder(max: u32) -> Vec<String> {
    let mut counts = vec![1];
    counts.extend((2..=max).step_by(2));
    values(&counts)
}

/// Run a sweep whose failure must not suppress what follows: the error is
/// reported and sequencing goes on.
fn run_and_report(sweep: &SweepSpec) {
    if let Err(e) = sweep.execute() {
        error!("perfxp(sweep): {e}");
    }
}

/// Grain sweep of the tiled mandel kernel over the thread ladder, followed
/// by the sequential reference runs used as the speedup baseline.
fn mandel() -> Result<()> {
    let mut sweep = SweepSpec {
        command: "./run".to_string(),
        options: vec![
            keyed("-k ", values(&["mandel"])),
            keyed("-i ", values(&[30])),
            keyed("-v ", values(&["omp_tiled"])),
            keyed("-s ", values(&[1024])),
            keyed("-g ", values(&[8, 16, 32, 64, 128])),
        ],
        env: vec![keyed("OMP_NUM_THREADS=", thread_ladder(12))],
        runs: 2,
        workdir: PathBuf::from("."),
        verbose: false,
    };
    run_and_report(&sweep);

    // Sequential baseline, single-threaded regardless of the ladder
    sweep.options[2] = keyed("-v ", values(&["seq"]));
    sweep.options[4] = keyed("-g ", values(&[8]));
    sweep.env = vec![keyed("OMP_NUM_THREADS=", values(&[1]))];
    run_and_report(&sweep);
    Ok(())
}

fn life() -> Result<()> {
    let mut sweep = SweepSpec {
        command: "./run".to_string(),
        options: vec![
            keyed("-k ", values(&["life"])),
            keyed("-i ", values(&[30])),
            keyed("-v ", values(&["omp", "omp_task"])),
            keyed("-s ", values(&[1024, 2048])),
            keyed("-g ", values(&[4, 8, 16, 32])),
            keyed("-a ", values(&["random"])),
            keyed("-of ", values(&["./plots/data/perf_data.csv"])),
        ],
        env: vec![
            keyed("OMP_NUM_THREADS=", thread_ladder(8)),
            keyed("OMP_PLACES=", values(&["cores", "threads"])),
        ],
        runs: 4,
        workdir: PathBuf::from("."),
        verbose: true,
    };
    run_and_report(&sweep);

    sweep.options[2] = keyed("-v ", values(&["seq"]));
    sweep.env = vec![keyed("OMP_NUM_THREADS=", values(&[1]))];
    sweep.verbose = false;
    run_and_report(&sweep);
    Ok(())
}

fn rotation90() -> Result<()> {
    let sweep = SweepSpec {
        command: "./run".to_string(),
        options: vec![
            keyed("--kernel ", values(&["rotation90"])),
            keyed("--iterations ", values(&[100])),
            keyed("--variant ", values(&["omp_affinity", "omp_cache", "sched"])),
            keyed("--grain ", values(&[8, 16, 32])),
            keyed("--size ", values(&[512, 1024, 2048, 4096])),
        ],
        env: vec![
            keyed("OMP_NUM_THREADS=", thread_ladder(12)),
            keyed("OMP_SCHEDULE=", values(&["static"])),
        ],
        runs: 1,
        workdir: PathBuf::from("."),
        verbose: true,
    };
    sweep.execute()
}

fn divergence() -> Result<()> {
    let sweep = SweepSpec {
        command: "./run".to_string(),
        options: vec![
            keyed("-k ", values(&["stripes"])),
            keyed("-o", values(&[""])),
            keyed("-i ", values(&[1000])),
            keyed("-a ", values(&(0..9).collect::<Vec<_>>())),
        ],
        env: vec![keyed("TILEX=", values(&[256])), keyed("TILEY=", values(&[1]))],
        runs: 1,
        workdir: PathBuf::from("."),
        verbose: true,
    };
    sweep.execute()
}

pub fn run(experiment: &Experiment) -> Result<()> {
    match experiment {
        Experiment::Mandel => mandel(),
        Experiment::Life => life(),
        Experiment::Rotation90 => rotation90(),
        Experiment::Divergence => divergence(),
    }
}
