use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, ValueEnum};
use log::debug;

use crate::table::{Field, Measure, Table};
use crate::tasks::render;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AxisScale {
    Linear,
    Log,
    Symlog,
    Logit,
}

impl AxisScale {
    /// The plotters coordinate system only distinguishes linear from
    /// logarithmic; symlog and logit render as log.
    pub fn is_log(self) -> bool {
        !matches!(self, AxisScale::Linear)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PlotType {
    Lineplot,
    Catplot,
}

/// Categorical plot families the renderer knows how to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CatKind {
    Strip,
    Box,
    Point,
    Bar,
}

#[derive(Debug, Args)]
pub struct PlotArgs {
    /// Field mapped to the x axis
    #[arg(short, long, value_enum, default_value_t = Field::Threads)]
    pub x: Field,
    /// Measure mapped to the y axis
    #[arg(short, long, value_enum, default_value_t = Measure::Speedup)]
    pub y: Measure,
    /// Facet into one column of panels per value of this field
    #[arg(short = 'C', long, value_enum)]
    pub col: Option<Field>,
    /// Facet into one row of panels per value of this field
    #[arg(short = 'R', long, value_enum)]
    pub row: Option<Field>,

    /// Measurement file to read
    #[arg(long, default_value = "plots/data/perf_data.csv")]
    pub input: PathBuf,
    /// File to write the plot to
    #[arg(long, default_value = "plot.svg")]
    pub output: PathBuf,

    /// Kernels to keep
    #[arg(short = 'k', long, num_args = 1..)]
    pub kernel: Vec<String>,
    /// Thread counts to keep
    #[arg(short = 't', long, num_args = 1..)]
    pub threads: Vec<String>,
    /// Variants to keep
    #[arg(short = 'v', long, num_args = 1..)]
    pub variant: Vec<String>,
    /// Grain sizes to keep
    #[arg(short = 'g', long, num_args = 1..)]
    pub grain: Vec<String>,
    /// Machines to keep
    #[arg(short = 'm', long, num_args = 1..)]
    pub machine: Vec<String>,
    /// Iteration counts to keep
    #[arg(short = 'i', long, num_args = 1..)]
    pub iterations: Vec<String>,
    /// Scheduling policies to keep
    #[arg(long, num_args = 1..)]
    pub schedule: Vec<String>,
    /// Problem dimensions to keep
    #[arg(short = 'd', long, num_args = 1..)]
    pub dim: Vec<String>,
    /// Labels to keep
    #[arg(long, num_args = 1..)]
    pub label: Vec<String>,
    /// Columns to delete before any other processing
    #[arg(long, num_args = 1.., value_enum)]
    pub delete: Vec<Field>,
    /// Variants eligible as the speedup baseline
    #[arg(long, num_args = 1..)]
    pub ref_variants: Vec<String>,
    /// Keep the derived reference-time column in the output table
    #[arg(long, default_value_t = false)]
    pub keep_ref_time: bool,

    /// Height of each panel, in hundreds of pixels
    #[arg(long, default_value_t = 4.0)]
    pub height: f64,
    /// Width/height ratio of each panel
    #[arg(long, default_value_t = 1.1)]
    pub aspect: f64,
    /// Scale applied to every text style
    #[arg(long, default_value_t = 1.0)]
    pub font_scale: f64,
    /// Fraction of the figure height left to the panels when a title is shown
    #[arg(long, default_value_t = 0.9)]
    pub adjust_top: f64,
    #[arg(long, value_enum, default_value_t = AxisScale::Linear)]
    pub xscale: AxisScale,
    #[arg(long, value_enum, default_value_t = AxisScale::Linear)]
    pub yscale: AxisScale,
    /// Draw the constant-parameter summary on the figure instead of stdout
    #[arg(long, default_value_t = false)]
    pub show_parameters: bool,
    /// Draw the legend inside the first panel instead of a side strip
    #[arg(long, default_value_t = false)]
    pub legend_inside: bool,

    #[arg(long, value_enum, default_value_t = PlotType::Lineplot)]
    pub plottype: PlotType,
    /// Kind of categorical plot (with --plottype catplot)
    #[arg(long, value_enum, default_value_t = CatKind::Strip)]
    pub kind: CatKind,
}

impl PlotArgs {
    /// Column names already spoken for by the plot axes and facets.
    pub fn axis_columns(&self) -> Vec<String> {
        let mut axes = vec![self.x.to_string(), self.y.to_string()];
        if let Some(col) = self.col {
            axes.push(col.to_string());
        }
        if let Some(row) = self.row {
            axes.push(row.to_string());
        }
        axes
    }
}

pub fn run(args: &PlotArgs) -> Result<()> {
    let table = Table::load(&args.input)?;
    let table = prepare(table, args)?;
    render::render(&table, args)
}

/// Apply the whole filter/derivation pipeline. Column deletion happens
/// before anything that could reference a deleted column; speedup derivation
/// precedes the thread/variant filters so the baseline rows are still
/// around when the reference times are computed.
pub fn prepare(mut table: Table, args: &PlotArgs) -> Result<Table> {
    table.retain_matching(Field::Kernel, &args.kernel);
    table.retain_matching(Field::Iterations, &args.iterations);
    table.retain_matching(Field::Dim, &args.dim);
    table.retain_matching(Field::Machine, &args.machine);

    for field in &args.delete {
        table.delete_column(*field);
    }

    if args.y == Measure::Speedup {
        table.derive_speedup(&args.ref_variants, args.keep_ref_time)?;
    }

    table.retain_matching(Field::Label, &args.label);
    table.retain_matching(Field::Schedule, &args.schedule);
    table.retain_matching(Field::Threads, &args.threads);
    table.retain_matching(Field::Variant, &args.variant);
    table.retain_matching(Field::Grain, &args.grain);

    if args.y == Measure::Throughput {
        table.derive_throughput()?;
    }

    if table.rows.is_empty() {
        bail!("No data");
    }

    debug!("table after filtering: {} rows", table.rows.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: PlotArgs,
    }

    pub fn parse_args(argv: &[&str]) -> PlotArgs {
        let mut full = vec!["perfxp-plot"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    const SAMPLE: &str = "\
machine;dim;grain;threads;kernel;variant;iterations;schedule;label;arg;time
node0;1024;8;1;mandel;seq;10;static;unlabelled;none;2000
node0;1024;8;2;mandel;omp;10;static;unlabelled;none;1100
node0;1024;8;4;mandel;omp;10;static;unlabelled;none;600
node0;1024;8;4;life;omp;10;static;unlabelled;none;800
node0;1024;8;1;life;seq;10;static;unlabelled;none;1600
";

    fn sample_table() -> Table {
        Table::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let args = parse_args(&[]);
        assert_eq!(args.x, Field::Threads);
        assert_eq!(args.y, Measure::Speedup);
        assert_eq!(args.plottype, PlotType::Lineplot);
        assert!(args.kernel.is_empty());
    }

    #[test]
    fn test_unknown_field_rejected_at_parse_time() {
        let mut full = vec!["perfxp-plot", "-x", "banana"];
        assert!(Harness::try_parse_from(full.drain(..)).is_err());
    }

    #[test]
    fn test_pipeline_filters_and_derives_speedup() {
        let args = parse_args(&["-k", "mandel", "-y", "speedup"]);
        let table = prepare(sample_table(), &args).unwrap();
        assert_eq!(table.rows.len(), 3);
        let row = table.rows.iter().find(|r| r.threads == Some(4)).unwrap();
        assert!((row.speedup.unwrap() - 2000.0 / 600.0).abs() < 1e-9);
        assert!(!table.has_column("ref"));
    }

    #[test]
    fn test_speedup_happens_before_thread_filter() {
        // Filtering threads to 4 must not starve the baseline (threads=1)
        let args = parse_args(&["-k", "mandel", "-t", "4", "-y", "speedup"]);
        let table = prepare(sample_table(), &args).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert!((table.rows[0].speedup.unwrap() - 2000.0 / 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_kernel_stays_in_speedup_key() {
        let args = parse_args(&["-y", "speedup"]);
        let table = prepare(sample_table(), &args).unwrap();
        let life = table
            .rows
            .iter()
            .find(|r| r.kernel.as_deref() == Some("life") && r.threads == Some(4))
            .unwrap();
        assert_eq!(life.speedup, Some(2.0));
    }

    #[test]
    fn test_empty_result_is_fatal() {
        let args = parse_args(&["-k", "nosuchkernel", "-y", "time"]);
        let err = prepare(sample_table(), &args).unwrap_err();
        assert_eq!(err.to_string(), "No data");
    }

    #[test]
    fn test_axis_columns() {
        let args = parse_args(&["-x", "threads", "-y", "speedup", "-C", "dim"]);
        assert_eq!(args.axis_columns(), vec!["threads", "speedup", "dim"]);
    }

    #[test]
    fn test_throughput_pipeline() {
        let csv = "\
kernel;dim;iterations;threads;variant;time
mandel;1000;5;4;omp;2.0
";
        let args = parse_args(&["-y", "throughput"]);
        let table = prepare(Table::from_reader(csv.as_bytes()).unwrap(), &args).unwrap();
        assert_eq!(table.rows[0].throughput, Some(2_500_000.0));
    }
}
