use crate::table::{Record, Table};

/// Columns that should label distinct series: everything that is neither a
/// plot axis, nor constant across the table, nor one of the raw timing
/// columns. Falls back to the kernel name when nothing varies.
pub fn free_columns(table: &Table, axis_columns: &[String]) -> Vec<String> {
    let constants = table.constant_columns();
    let free: Vec<String> = table
        .columns
        .iter()
        .filter(|c| {
            c.as_str() != "time"
                && c.as_str() != "ref"
                && !axis_columns.contains(c)
                && !constants.contains(c)
        })
        .cloned()
        .collect();

    if free.is_empty() {
        vec!["kernel".to_string()]
    } else {
        free
    }
}

/// Legend string for one row: `name=value` for every free column, in column
/// order, space-separated.
pub fn legend_for(row: &Record, free: &[String]) -> String {
    free.iter()
        .filter_map(|c| row.value_of(c).map(|v| format!("{c}={v}")))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    const SAMPLE: &str = "\
kernel;variant;threads;dim;iterations;time
mandel;omp;1;1024;10;2000
mandel;omp;2;1024;10;1100
mandel;omp_tiled;2;1024;10;900
mandel;omp_tiled;4;1024;10;500
";

    fn strs(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_free_columns_skip_axes_and_constants() {
        let table = Table::from_reader(SAMPLE.as_bytes()).unwrap();
        // kernel, dim and iterations are constant; threads and time are the
        // axes: only variant should remain free
        let free = free_columns(&table, &strs(&["threads", "time"]));
        assert_eq!(free, strs(&["variant"]));
    }

    #[test]
    fn test_legend_string_contents() {
        let table = Table::from_reader(SAMPLE.as_bytes()).unwrap();
        let free = free_columns(&table, &strs(&["threads", "speedup"]));
        let legend = legend_for(&table.rows[2], &free);
        assert!(legend.contains("variant=omp_tiled"));
        assert!(!legend.contains("kernel="));
        assert!(!legend.contains("threads="));
        assert!(!legend.contains("speedup="));
    }

    #[test]
    fn test_kernel_fallback_when_nothing_varies() {
        let csv = "\
kernel;threads;time
mandel;1;2000
mandel;2;1100
";
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        let free = free_columns(&table, &strs(&["threads", "time"]));
        assert_eq!(free, strs(&["kernel"]));
        assert_eq!(legend_for(&table.rows[0], &free), "kernel=mandel");
    }

    #[test]
    fn test_multi_column_legend_order() {
        let csv = "\
kernel;variant;schedule;threads;time
mandel;omp;static;2;1100
mandel;omp_tiled;dynamic;2;900
heat;omp;static;4;500
";
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        let free = free_columns(&table, &strs(&["threads", "time"]));
        assert_eq!(free, strs(&["kernel", "variant", "schedule"]));
        assert_eq!(
            legend_for(&table.rows[1], &free),
            "kernel=mandel variant=omp_tiled schedule=dynamic"
        );
    }
}
