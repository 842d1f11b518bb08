use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use csv::ReaderBuilder;
use log::debug;

/// Columns of the measurement file that can be picked as a plot axis, used
/// as a facet, filtered on, or deleted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Field {
    Dim,
    Iterations,
    Kernel,
    Variant,
    Threads,
    Grain,
    Schedule,
    Label,
    Machine,
    Custom,
}

impl Field {
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Dim => "dim",
            Field::Iterations => "iterations",
            Field::Kernel => "kernel",
            Field::Variant => "variant",
            Field::Threads => "threads",
            Field::Grain => "grain",
            Field::Schedule => "schedule",
            Field::Label => "label",
            Field::Machine => "machine",
            Field::Custom => "custom",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Quantity mapped to the y axis. `time` and `custom` come straight from the
/// file; `speedup` and `throughput` are derived per plot invocation and
/// never written back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Measure {
    Time,
    Speedup,
    Throughput,
    Custom,
}

impl Measure {
    pub fn as_str(&self) -> &'static str {
        match self {
            Measure::Time => "time",
            Measure::Speedup => "speedup",
            Measure::Throughput => "throughput",
            Measure::Custom => "custom",
        }
    }
}

impl Measure {
    /// Axis label, carrying units where the measure has them.
    pub fn axis_label(&self) -> &'static str {
        match self {
            Measure::Throughput => "throughput (MPixel / s)",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Column names with a typed field in [`Record`]. Anything else found in the
/// header lands in the extras map.
const KNOWN_COLUMNS: [&str; 12] = [
    "machine",
    "dim",
    "grain",
    "threads",
    "kernel",
    "variant",
    "iterations",
    "schedule",
    "label",
    "custom",
    "time",
    "ref",
];

/// One measurement row. Every field but `time` is optional so that files
/// with a reduced column set still load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    pub time: f64,
    pub machine: Option<String>,
    pub dim: Option<u64>,
    pub grain: Option<String>,
    pub threads: Option<u32>,
    pub kernel: Option<String>,
    pub variant: Option<String>,
    pub iterations: Option<u64>,
    pub schedule: Option<String>,
    pub label: Option<String>,
    pub custom: Option<String>,
    pub ref_time: Option<f64>,
    pub extra: BTreeMap<String, String>,
    // Derived columns, computed by the plot pipeline
    pub speedup: Option<f64>,
    pub throughput: Option<f64>,
}

fn parse_cell<T>(fields: &BTreeMap<String, String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match fields.get(key).map(|s| s.trim()).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(raw) => match raw.parse() {
            Ok(v) => Ok(Some(v)),
            Err(e) => bail!("bad value {raw:?} in column '{key}': {e}"),
        },
    }
}

impl Record {
    fn from_fields(fields: &BTreeMap<String, String>) -> Result<Record> {
        let time: f64 = fields
            .get("time")
            .context("missing 'time' column")?
            .trim()
            .parse()
            .context("bad value in column 'time'")?;

        let extra = fields
            .iter()
            .filter(|(k, _)| !KNOWN_COLUMNS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Record {
            time,
            machine: parse_cell(fields, "machine")?,
            dim: parse_cell(fields, "dim")?,
            grain: parse_cell(fields, "grain")?,
            threads: parse_cell(fields, "threads")?,
            kernel: parse_cell(fields, "kernel")?,
            variant: parse_cell(fields, "variant")?,
            iterations: parse_cell(fields, "iterations")?,
            schedule: parse_cell(fields, "schedule")?,
            label: parse_cell(fields, "label")?,
            custom: parse_cell(fields, "custom")?,
            ref_time: parse_cell(fields, "ref")?,
            extra,
            speedup: None,
            throughput: None,
        })
    }

    /// String rendering of any column of this row, derived ones included.
    pub fn value_of(&self, column: &str) -> Option<String> {
        match column {
            "time" => Some(self.time.to_string()),
            "ref" => self.ref_time.map(|v| v.to_string()),
            "speedup" => self.speedup.map(|v| v.to_string()),
            "throughput" => self.throughput.map(|v| v.to_string()),
            "machine" => self.machine.clone(),
            "dim" => self.dim.map(|v| v.to_string()),
            "grain" => self.grain.clone(),
            "threads" => self.threads.map(|v| v.to_string()),
            "kernel" => self.kernel.clone(),
            "variant" => self.variant.clone(),
            "iterations" => self.iterations.map(|v| v.to_string()),
            "schedule" => self.schedule.clone(),
            "label" => self.label.clone(),
            "custom" => self.custom.clone(),
            other => self.extra.get(other).cloned(),
        }
    }

    pub fn field_value(&self, field: Field) -> Option<String> {
        self.value_of(field.as_str())
    }

    /// Numeric reading of a field, for axis placement.
    pub fn field_number(&self, field: Field) -> Option<f64> {
        self.field_value(field).and_then(|v| v.parse().ok())
    }

    /// Value of the y-axis measure for this row.
    pub fn measure(&self, measure: Measure) -> Option<f64> {
        match measure {
            Measure::Time => Some(self.time),
            Measure::Speedup => self.speedup,
            Measure::Throughput => self.throughput,
            Measure::Custom => self.custom.as_ref().and_then(|v| v.parse().ok()),
        }
    }

    fn clear_field(&mut self, field: Field) {
        match field {
            Field::Dim => self.dim = None,
            Field::Iterations => self.iterations = None,
            Field::Kernel => self.kernel = None,
            Field::Variant => self.variant = None,
            Field::Threads => self.threads = None,
            Field::Grain => self.grain = None,
            Field::Schedule => self.schedule = None,
            Field::Label => self.label = None,
            Field::Machine => self.machine = None,
            Field::Custom => self.custom = None,
        }
    }
}

/// All rows loaded from one measurement file, plus the column order of its
/// header. Columns are dropped from the order when deleted; derived columns
/// are appended when computed.
#[derive(Clone, Debug)]
pub struct Table {
    pub rows: Vec<Record>,
    pub columns: Vec<String>,
}

impl Table {
    /// Load a semicolon-delimited measurement file. A missing file is fatal
    /// for the whole invocation, so the error carries the path.
    pub fn load(path: &Path) -> Result<Table> {
        let reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .from_path(path)
            .with_context(|| format!("File not found: {}", path.display()))?;
        Self::from_csv(reader)
    }

    pub fn from_reader<R: Read>(input: R) -> Result<Table> {
        let reader = ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .from_reader(input);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Table> {
        let columns: Vec<String> = reader
            .headers()
            .context("failed to read CSV header")?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (idx, result) in reader.deserialize().enumerate() {
            let fields: BTreeMap<String, String> =
                result.with_context(|| format!("failed to read CSV row {}", idx + 2))?;
            let record = Record::from_fields(&fields)
                .with_context(|| format!("failed to parse CSV row {}", idx + 2))?;
            rows.push(record);
        }

        debug!("loaded {} rows, columns: {columns:?}", rows.len());
        Ok(Table { rows, columns })
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    fn remove_column(&mut self, name: &str) {
        self.columns.retain(|c| c != name);
    }

    /// Keep only rows whose `field` value is in `allowed`. An empty list
    /// means "no filter".
    pub fn retain_matching(&mut self, field: Field, allowed: &[String]) {
        if allowed.is_empty() {
            return;
        }
        self.rows.retain(|r| {
            r.field_value(field)
                .is_some_and(|v| allowed.iter().any(|a| *a == v))
        });
    }

    /// Drop a column: its values disappear from every row and it no longer
    /// participates in legends, titles or grouping keys.
    pub fn delete_column(&mut self, field: Field) {
        for row in &mut self.rows {
            row.clear_field(field);
        }
        self.remove_column(field.as_str());
    }

    /// Columns whose value is identical across all rows.
    pub fn constant_columns(&self) -> Vec<String> {
        let Some(first) = self.rows.first() else {
            return self.columns.clone();
        };
        self.columns
            .iter()
            .filter(|c| {
                let reference = first.value_of(c);
                self.rows.iter().all(|r| r.value_of(c) == reference)
            })
            .cloned()
            .collect()
    }

    /// Summary of the fixed experimental parameters, used as a plot title.
    /// Placeholder values the benchmark writes for unset parameters are
    /// skipped.
    pub fn constants_text(&self) -> String {
        let Some(first) = self.rows.first() else {
            return String::new();
        };
        self.constant_columns()
            .iter()
            .filter_map(|c| first.value_of(c).map(|v| (c.clone(), v)))
            .filter(|(_, v)| v != "none" && v != "nan")
            .map(|(c, v)| format!("{c}={v}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Derive the speedup column against the minimum single-thread time of
    /// each (dim, kernel[, iterations]) group. Iterations drop out of the
    /// key when that column was deleted beforehand.
    pub fn derive_speedup(&mut self, ref_variants: &[String], keep_ref_time: bool) -> Result<()> {
        let use_iterations = self.has_column("iterations");

        let mut references: BTreeMap<(Option<u64>, Option<String>, Option<u64>), f64> =
            BTreeMap::new();
        for row in &self.rows {
            if row.threads != Some(1) {
                continue;
            }
            if !ref_variants.is_empty()
                && !row
                    .variant
                    .as_ref()
                    .is_some_and(|v| ref_variants.iter().any(|rv| rv == v))
            {
                continue;
            }
            let key = (
                row.dim,
                row.kernel.clone(),
                if use_iterations { row.iterations } else { None },
            );
            let entry = references.entry(key).or_insert(f64::INFINITY);
            if row.time < *entry {
                *entry = row.time;
            }
        }

        if references.is_empty() {
            bail!("No reference to compute speedup");
        }
        debug!("speedup references: {references:?}");

        for row in &mut self.rows {
            let key = (
                row.dim,
                row.kernel.clone(),
                if use_iterations { row.iterations } else { None },
            );
            // Rows outside every baseline group keep a zero reference, and
            // therefore a zero speedup.
            let reference = references.get(&key).copied().unwrap_or(0.0);
            row.ref_time = Some(reference);
            row.speedup = Some(reference / row.time);
        }

        self.columns.push("speedup".to_string());
        if keep_ref_time {
            if !self.has_column("ref") {
                self.columns.push("ref".to_string());
            }
        } else {
            self.remove_column("ref");
            for row in &mut self.rows {
                row.ref_time = None;
            }
        }
        Ok(())
    }

    /// Derive the throughput column: dim² × iterations / time.
    pub fn derive_throughput(&mut self) -> Result<()> {
        for row in &mut self.rows {
            let (Some(dim), Some(iterations)) = (row.dim, row.iterations) else {
                bail!("throughput needs the 'dim' and 'iterations' columns");
            };
            row.throughput = Some((dim * dim) as f64 * iterations as f64 / row.time);
        }
        self.columns.push("throughput".to_string());
        Ok(())
    }
}
