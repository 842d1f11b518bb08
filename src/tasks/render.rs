use std::cmp::Ordering;

use anyhow::{anyhow, Result};
use log::debug;
use plotters::coord::cartesian::Cartesian2d;
use plotters::coord::ranged1d::{Ranged, ValueFormatter};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::legend;
use crate::table::{Field, Record, Table};
use crate::tasks::plot::{CatKind, PlotArgs, PlotType};

/// Horizontal placement of x values: straight numeric interpretation when
/// every value parses, category slots otherwise (and always for catplots).
enum XAxis {
    Numeric,
    Categories(Vec<String>),
}

impl XAxis {
    fn build(rows: &[&Record], field: Field, force_categorical: bool) -> XAxis {
        if !force_categorical && rows.iter().all(|r| r.field_number(field).is_some()) {
            return XAxis::Numeric;
        }
        let mut values: Vec<String> = rows.iter().filter_map(|r| r.field_value(field)).collect();
        values.sort_by(|a, b| compare_values(a, b));
        values.dedup();
        XAxis::Categories(values)
    }

    fn position(&self, row: &Record, field: Field) -> Option<f64> {
        match self {
            XAxis::Numeric => row.field_number(field),
            XAxis::Categories(cats) => {
                let value = row.field_value(field)?;
                cats.iter().position(|c| *c == value).map(|i| i as f64)
            }
        }
    }

    fn tick_label(&self, v: f64) -> String {
        match self {
            XAxis::Numeric => fmt_tick(v),
            XAxis::Categories(cats) => {
                let idx = v.round();
                if idx < 0.0 || (v - idx).abs() > 0.25 {
                    return String::new();
                }
                cats.get(idx as usize).cloned().unwrap_or_default()
            }
        }
    }

    fn categories(&self) -> &[String] {
        match self {
            XAxis::Numeric => &[],
            XAxis::Categories(cats) => cats,
        }
    }
}

/// Order values numerically when both sides parse, lexically otherwise.
fn compare_values(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

fn fmt_tick(v: f64) -> String {
    if v == 0.0 {
        return "0".to_string();
    }
    if (v - v.round()).abs() < 1e-6 && v.abs() < 1e7 {
        format!("{}", v.round() as i64)
    } else if v.abs() >= 0.01 && v.abs() < 1e7 {
        let s = format!("{v:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        format!("{v:e}")
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

/// Collapse repeated measurements at the same x into (x, mean, std),
/// ordered along x.
fn aggregate_points(points: &[(f64, f64)]) -> Vec<(f64, f64, f64)> {
    let mut pts = points.to_vec();
    pts.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let mut out = Vec::new();
    let mut i = 0;
    while i < pts.len() {
        let x = pts[i].0;
        let mut ys = Vec::new();
        while i < pts.len() && (pts[i].0 - x).abs() < 1e-9 {
            ys.push(pts[i].1);
            i += 1;
        }
        let (mean, std) = mean_std(&ys);
        out.push((x, mean, std));
    }
    out
}

/// min, q1, median, q3, max with linear interpolation. `values` must not be
/// empty.
fn quartiles(values: &[f64]) -> (f64, f64, f64, f64, f64) {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let q = |p: f64| {
        let idx = p * (v.len() - 1) as f64;
        let lo = idx.floor() as usize;
        let hi = idx.ceil() as usize;
        v[lo] + (v[hi] - v[lo]) * (idx - lo as f64)
    };
    (v[0], q(0.25), q(0.5), q(0.75), v[v.len() - 1])
}

fn series_color(idx: usize) -> RGBAColor {
    Palette99::pick(idx).to_rgba()
}

fn axis_range(min: f64, max: f64, log: bool) -> (f64, f64) {
    if log {
        let lo = if min > 0.0 { min / 1.3 } else { 1e-12 };
        let hi = if max > 0.0 { max * 1.3 } else { 1.0 };
        (lo, hi)
    } else {
        let span = if max > min {
            max - min
        } else {
            max.abs().max(1.0) * 0.1
        };
        (min - 0.05 * span, max + 0.08 * span)
    }
}

/// A row resolved to grid coordinates and plot position.
struct PlotPoint {
    grid_row: usize,
    grid_col: usize,
    legend_idx: usize,
    x: f64,
    y: f64,
}

fn facet_values(rows: &[&Record], field: Option<Field>) -> Vec<Option<String>> {
    let Some(field) = field else {
        return vec![None];
    };
    let mut values: Vec<String> = rows
        .iter()
        .map(|r| r.field_value(field).unwrap_or_else(|| "none".to_string()))
        .collect();
    values.sort_by(|a, b| compare_values(a, b));
    values.dedup();
    values.into_iter().map(Some).collect()
}

fn facet_index(row: &Record, field: Option<Field>, values: &[Option<String>]) -> usize {
    let Some(field) = field else {
        return 0;
    };
    let value = row.field_value(field).unwrap_or_else(|| "none".to_string());
    values
        .iter()
        .position(|v| v.as_deref() == Some(value.as_str()))
        .unwrap_or(0)
}

pub fn render(table: &Table, args: &PlotArgs) -> Result<()> {
    // Rows are sorted by descending y before plotting; legend order follows
    // first appearance in that order.
    let mut ordered: Vec<&Record> = table.rows.iter().collect();
    ordered.sort_by(|a, b| {
        let ya = a.measure(args.y).unwrap_or(f64::NAN);
        let yb = b.measure(args.y).unwrap_or(f64::NAN);
        yb.partial_cmp(&ya).unwrap_or(Ordering::Equal)
    });

    let axes = args.axis_columns();
    let free = legend::free_columns(table, &axes);
    debug!("legend columns: {free:?}");

    let mut legends: Vec<String> = Vec::new();
    let legend_indices: Vec<usize> = ordered
        .iter()
        .map(|r| {
            let text = legend::legend_for(r, &free);
            match legends.iter().position(|l| *l == text) {
                Some(idx) => idx,
                None => {
                    legends.push(text);
                    legends.len() - 1
                }
            }
        })
        .collect();

    let row_values = facet_values(&ordered, args.row);
    let col_values = facet_values(&ordered, args.col);
    let (n_rows, n_cols) = (row_values.len(), col_values.len());

    let x_axis = XAxis::build(&ordered, args.x, args.plottype == PlotType::Catplot);

    let mut points: Vec<PlotPoint> = Vec::new();
    for (record, legend_idx) in ordered.iter().zip(&legend_indices) {
        let (Some(x), Some(y)) = (x_axis.position(record, args.x), record.measure(args.y)) else {
            continue;
        };
        points.push(PlotPoint {
            grid_row: facet_index(record, args.row, &row_values),
            grid_col: facet_index(record, args.col, &col_values),
            legend_idx: *legend_idx,
            x,
            y,
        });
    }

    let x_log = args.xscale.is_log() && matches!(x_axis, XAxis::Numeric);
    let y_log = args.yscale.is_log();

    // Facets in the same grid column share x, facets in the same row share y
    let mut x_ranges = Vec::with_capacity(n_cols);
    for ci in 0..n_cols {
        match &x_axis {
            XAxis::Categories(cats) => {
                x_ranges.push((-0.5, cats.len() as f64 - 0.5));
            }
            XAxis::Numeric => {
                let xs: Vec<f64> = points
                    .iter()
                    .filter(|p| p.grid_col == ci)
                    .map(|p| p.x)
                    .collect();
                let min = xs.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = xs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let (mut lo, hi) = if xs.is_empty() {
                    (0.0, 1.0)
                } else {
                    axis_range(min, max, x_log)
                };
                if args.x == Field::Threads && !x_log {
                    lo = 0.0;
                }
                x_ranges.push((lo, hi));
            }
        }
    }

    let mut y_ranges = Vec::with_capacity(n_rows);
    for ri in 0..n_rows {
        let ys: Vec<f64> = points
            .iter()
            .filter(|p| p.grid_row == ri)
            .map(|p| p.y)
            .collect();
        let min = ys.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = ys.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let (mut lo, hi) = if ys.is_empty() {
            (0.0, 1.0)
        } else {
            axis_range(min, max, y_log)
        };
        if args.plottype == PlotType::Catplot && args.kind == CatKind::Bar && !y_log {
            lo = lo.min(0.0);
        }
        y_ranges.push((lo, hi));
    }

    // Figure geometry
    let cell_w = (100.0 * args.height * args.aspect).round() as u32;
    let cell_h = (100.0 * args.height).round() as u32;
    let legend_w = if args.legend_inside || legends.is_empty() {
        0
    } else {
        let longest = legends.iter().map(|l| l.len()).max().unwrap_or(0);
        (longest as f64 * 7.0 * args.font_scale + 60.0).round() as u32
    };
    let title_h = if args.show_parameters {
        ((1.0 - args.adjust_top).clamp(0.05, 0.5) * cell_h as f64 * n_rows as f64).round() as u32
    } else {
        0
    };
    let width = cell_w * n_cols as u32 + legend_w;
    let height = cell_h * n_rows as u32 + title_h;

    let title = if table.constant_columns().is_empty() {
        format!("{} vs {}", args.y, args.x)
    } else {
        table.constants_text()
    };

    let root = SVGBackend::new(&args.output, (width, height)).into_drawing_area();
    root.fill(&WHITE)
        .map_err(|e| anyhow!("failed to fill canvas: {e}"))?;

    let (title_area, body) = root.split_vertically(title_h as i32);
    if args.show_parameters {
        let style = ("sans-serif", 15.0 * args.font_scale)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Center));
        title_area
            .draw(&Text::new(
                title.clone(),
                (width as i32 / 2, title_h as i32 / 2),
                style,
            ))
            .map_err(|e| anyhow!("failed to draw title: {e}"))?;
    } else {
        println!("{title}");
    }

    let (panel_area, legend_area) = body.split_horizontally((width - legend_w) as i32);
    let cells = panel_area.split_evenly((n_rows, n_cols));

    for ri in 0..n_rows {
        for ci in 0..n_cols {
            let area = &cells[ri * n_cols + ci];

            let mut caption_parts = Vec::new();
            if let (Some(field), Some(value)) = (args.col, &col_values[ci]) {
                caption_parts.push(format!("{field}={value}"));
            }
            if let (Some(field), Some(value)) = (args.row, &row_values[ri]) {
                caption_parts.push(format!("{field}={value}"));
            }

            let cell_points: Vec<&PlotPoint> = points
                .iter()
                .filter(|p| p.grid_row == ri && p.grid_col == ci)
                .collect();

            let mut builder = ChartBuilder::on(area);
            builder
                .margin(8)
                .x_label_area_size(35)
                .y_label_area_size(50);
            if !caption_parts.is_empty() {
                builder.caption(
                    caption_parts.join(" | "),
                    ("sans-serif", 13.0 * args.font_scale),
                );
            }

            let xr = x_ranges[ci];
            let yr = y_ranges[ri];

            match args.plottype {
                PlotType::Lineplot => {
                    // One (x, mean, std) polyline per legend series
                    let mut series: Vec<(usize, Vec<(f64, f64, f64)>)> = Vec::new();
                    for legend_idx in 0..legends.len() {
                        let raw: Vec<(f64, f64)> = cell_points
                            .iter()
                            .filter(|p| p.legend_idx == legend_idx)
                            .map(|p| (p.x, p.y))
                            .collect();
                        if !raw.is_empty() {
                            series.push((legend_idx, aggregate_points(&raw)));
                        }
                    }

                    match (x_log, y_log) {
                        (false, false) => {
                            let mut chart =
                                builder.build_cartesian_2d(xr.0..xr.1, yr.0..yr.1)
                                    .map_err(|e| anyhow!("failed to build chart: {e}"))?;
                            draw_line_cell(&mut chart, &series, &x_axis, args, y_log)?;
                        }
                        (false, true) => {
                            let mut chart = builder
                                .build_cartesian_2d(xr.0..xr.1, (yr.0..yr.1).log_scale())
                                .map_err(|e| anyhow!("failed to build chart: {e}"))?;
                            draw_line_cell(&mut chart, &series, &x_axis, args, y_log)?;
                        }
                        (true, false) => {
                            let mut chart = builder
                                .build_cartesian_2d((xr.0..xr.1).log_scale(), yr.0..yr.1)
                                .map_err(|e| anyhow!("failed to build chart: {e}"))?;
                            draw_line_cell(&mut chart, &series, &x_axis, args, y_log)?;
                        }
                        (true, true) => {
                            let mut chart = builder
                                .build_cartesian_2d(
                                    (xr.0..xr.1).log_scale(),
                                    (yr.0..yr.1).log_scale(),
                                )
                                .map_err(|e| anyhow!("failed to build chart: {e}"))?;
                            draw_line_cell(&mut chart, &series, &x_axis, args, y_log)?;
                        }
                    }
                }
                PlotType::Catplot => {
                    // Per legend series, the sample values of each category
                    let n_cats = x_axis.categories().len();
                    let mut groups: Vec<(usize, Vec<Vec<f64>>)> = Vec::new();
                    for legend_idx in 0..legends.len() {
                        let mut per_cat = vec![Vec::new(); n_cats];
                        for p in cell_points.iter().filter(|p| p.legend_idx == legend_idx) {
                            let cat = p.x.round() as usize;
                            if cat < n_cats {
                                per_cat[cat].push(p.y);
                            }
                        }
                        if per_cat.iter().any(|v| !v.is_empty()) {
                            groups.push((legend_idx, per_cat));
                        }
                    }

                    if y_log {
                        let mut chart = builder
                            .build_cartesian_2d(xr.0..xr.1, (yr.0..yr.1).log_scale())
                            .map_err(|e| anyhow!("failed to build chart: {e}"))?;
                        draw_cat_cell(&mut chart, &groups, &x_axis, args, yr.0)?;
                    } else {
                        let mut chart = builder
                            .build_cartesian_2d(xr.0..xr.1, yr.0..yr.1)
                            .map_err(|e| anyhow!("failed to build chart: {e}"))?;
                        draw_cat_cell(&mut chart, &groups, &x_axis, args, yr.0)?;
                    }
                }
            }
        }
    }

    // Legend entries are drawn by hand, either inside the first panel or in
    // the reserved right-hand strip
    if !legends.is_empty() {
        if args.legend_inside {
            draw_legend_entries(&cells[0], &legends, args.font_scale, 60, 30)?;
        } else {
            draw_legend_entries(&legend_area, &legends, args.font_scale, 10, 25)?;
        }
    }

    root.present()
        .map_err(|e| anyhow!("failed to write plot: {e}"))?;
    println!("perfxp: generated plot at: {}", args.output.display());
    Ok(())
}

fn draw_legend_entries(
    area: &DrawingArea<SVGBackend, Shift>,
    legends: &[String],
    font_scale: f64,
    x0: i32,
    y0: i32,
) -> Result<()> {
    let step = (22.0 * font_scale).round() as i32;
    for (idx, text) in legends.iter().enumerate() {
        let y = y0 + idx as i32 * step;
        let color = series_color(idx);
        area.draw(&PathElement::new(
            vec![(x0, y), (x0 + 18, y)],
            color.stroke_width(3),
        ))
        .map_err(|e| anyhow!("failed to draw legend: {e}"))?;
        area.draw(&Text::new(
            text.clone(),
            (x0 + 24, y - 6),
            ("sans-serif", 12.0 * font_scale),
        ))
        .map_err(|e| anyhow!("failed to draw legend: {e}"))?;
    }
    Ok(())
}

fn draw_line_cell<X, Y>(
    chart: &mut ChartContext<SVGBackend, Cartesian2d<X, Y>>,
    series: &[(usize, Vec<(f64, f64, f64)>)],
    x_axis: &XAxis,
    args: &PlotArgs,
    y_log: bool,
) -> Result<()>
where
    X: Ranged<ValueType = f64> + ValueFormatter<f64>,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    chart
        .configure_mesh()
        .x_desc(args.x.to_string())
        .y_desc(args.y.axis_label())
        .x_label_formatter(&|v: &f64| x_axis.tick_label(*v))
        .label_style(("sans-serif", 12.0 * args.font_scale))
        .axis_desc_style(("sans-serif", 13.0 * args.font_scale))
        .x_labels(8)
        .y_labels(6)
        .draw()
        .map_err(|e| anyhow!("failed to draw mesh: {e}"))?;

    for (legend_idx, points) in series {
        let color = series_color(*legend_idx);

        chart
            .draw_series(LineSeries::new(
                points.iter().map(|p| (p.0, p.1)),
                color.stroke_width(2),
            ))
            .map_err(|e| anyhow!("failed to draw line: {e}"))?;

        chart
            .draw_series(points.iter().filter(|p| p.2 > 0.0).map(|p| {
                let lower = if y_log {
                    (p.1 - p.2).max(p.1 * 1e-3)
                } else {
                    p.1 - p.2
                };
                ErrorBar::new_vertical(p.0, lower, p.1, p.1 + p.2, color.stroke_width(1), 6)
            }))
            .map_err(|e| anyhow!("failed to draw error bars: {e}"))?;

        chart
            .draw_series(
                points
                    .iter()
                    .map(|p| Circle::new((p.0, p.1), 3, color.filled())),
            )
            .map_err(|e| anyhow!("failed to draw markers: {e}"))?;
    }
    Ok(())
}

fn draw_cat_cell<Y>(
    chart: &mut ChartContext<SVGBackend, Cartesian2d<RangedCoordf64, Y>>,
    groups: &[(usize, Vec<Vec<f64>>)],
    x_axis: &XAxis,
    args: &PlotArgs,
    y_base: f64,
) -> Result<()>
where
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let n_cats = x_axis.categories().len().max(1);

    chart
        .configure_mesh()
        .x_desc(args.x.to_string())
        .y_desc(args.y.axis_label())
        .x_label_formatter(&|v: &f64| x_axis.tick_label(*v))
        .label_style(("sans-serif", 12.0 * args.font_scale))
        .axis_desc_style(("sans-serif", 13.0 * args.font_scale))
        .x_labels(n_cats)
        .y_labels(6)
        .draw()
        .map_err(|e| anyhow!("failed to draw mesh: {e}"))?;

    let n_series = groups.len().max(1);
    let slot = 0.8 / n_series as f64;

    for (series_idx, (legend_idx, per_cat)) in groups.iter().enumerate() {
        let color = series_color(*legend_idx);
        let center_of = |cat: usize| cat as f64 - 0.4 + (series_idx as f64 + 0.5) * slot;

        match args.kind {
            CatKind::Bar => {
                for (cat, values) in per_cat.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
                    let (mean, _) = mean_std(values);
                    let cx = center_of(cat);
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(cx - slot * 0.45, y_base), (cx + slot * 0.45, mean)],
                            color.filled(),
                        )))
                        .map_err(|e| anyhow!("failed to draw bar: {e}"))?;
                }
            }
            CatKind::Box => {
                for (cat, values) in per_cat.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
                    let (min, q1, median, q3, max) = quartiles(values);
                    let cx = center_of(cat);
                    let half = slot * 0.4;
                    let outline = ShapeStyle {
                        color,
                        filled: false,
                        stroke_width: 1,
                    };
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(cx - half, q1), (cx + half, q3)],
                            color.mix(0.35).filled(),
                        )))
                        .map_err(|e| anyhow!("failed to draw box: {e}"))?;
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(cx - half, q1), (cx + half, q3)],
                            outline,
                        )))
                        .map_err(|e| anyhow!("failed to draw box: {e}"))?;
                    chart
                        .draw_series(std::iter::once(PathElement::new(
                            vec![(cx - half, median), (cx + half, median)],
                            color.stroke_width(2),
                        )))
                        .map_err(|e| anyhow!("failed to draw box: {e}"))?;
                    // Whiskers with end caps
                    for (from, to) in [(q3, max), (min, q1)] {
                        chart
                            .draw_series(std::iter::once(PathElement::new(
                                vec![(cx, from), (cx, to)],
                                color.stroke_width(1),
                            )))
                            .map_err(|e| anyhow!("failed to draw box: {e}"))?;
                    }
                    for cap in [min, max] {
                        chart
                            .draw_series(std::iter::once(PathElement::new(
                                vec![(cx - half * 0.5, cap), (cx + half * 0.5, cap)],
                                color.stroke_width(1),
                            )))
                            .map_err(|e| anyhow!("failed to draw box: {e}"))?;
                    }
                }
            }
            CatKind::Point => {
                let mut means = Vec::new();
                for (cat, values) in per_cat.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
                    let (mean, std) = mean_std(values);
                    means.push((center_of(cat), mean, std));
                }
                chart
                    .draw_series(LineSeries::new(
                        means.iter().map(|p| (p.0, p.1)),
                        color.stroke_width(1),
                    ))
                    .map_err(|e| anyhow!("failed to draw points: {e}"))?;
                chart
                    .draw_series(means.iter().filter(|p| p.2 > 0.0).map(|p| {
                        ErrorBar::new_vertical(
                            p.0,
                            p.1 - p.2,
                            p.1,
                            p.1 + p.2,
                            color.stroke_width(1),
                            6,
                        )
                    }))
                    .map_err(|e| anyhow!("failed to draw points: {e}"))?;
                chart
                    .draw_series(
                        means
                            .iter()
                            .map(|p| Circle::new((p.0, p.1), 4, color.filled())),
                    )
                    .map_err(|e| anyhow!("failed to draw points: {e}"))?;
            }
            CatKind::Strip => {
                for (cat, values) in per_cat.iter().enumerate().filter(|(_, v)| !v.is_empty()) {
                    let cx = center_of(cat);
                    chart
                        .draw_series(values.iter().enumerate().map(|(i, v)| {
                            // Deterministic jitter inside the series slot
                            let jitter = ((i % 5) as f64 - 2.0) * slot * 0.08;
                            Circle::new((cx + jitter, *v), 3, color.filled())
                        }))
                        .map_err(|e| anyhow!("failed to draw strip: {e}"))?;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Table;

    #[test]
    fn test_compare_values_numeric_aware() {
        assert_eq!(compare_values("2", "10"), Ordering::Less);
        assert_eq!(compare_values("omp", "seq"), Ordering::Less);
        assert_eq!(compare_values("10", "10"), Ordering::Equal);
    }

    #[test]
    fn test_fmt_tick() {
        assert_eq!(fmt_tick(0.0), "0");
        assert_eq!(fmt_tick(8.0), "8");
        assert_eq!(fmt_tick(0.25), "0.25");
        assert_eq!(fmt_tick(1024.0), "1024");
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[2.0, 4.0, 6.0]);
        assert_eq!(mean, 4.0);
        assert!((std - 2.0).abs() < 1e-9);
        assert_eq!(mean_std(&[5.0]), (5.0, 0.0));
    }

    #[test]
    fn test_aggregate_points_groups_and_orders() {
        let pts = [(4.0, 10.0), (2.0, 3.0), (4.0, 14.0), (2.0, 5.0)];
        let agg = aggregate_points(&pts);
        assert_eq!(agg.len(), 2);
        assert_eq!(agg[0].0, 2.0);
        assert_eq!(agg[0].1, 4.0);
        assert_eq!(agg[1].0, 4.0);
        assert_eq!(agg[1].1, 12.0);
    }

    #[test]
    fn test_quartiles() {
        let (min, q1, median, q3, max) = quartiles(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!((min, q1, median, q3, max), (1.0, 2.0, 3.0, 4.0, 5.0));
    }

    #[test]
    fn test_axis_range_log_stays_positive() {
        let (lo, hi) = axis_range(0.5, 100.0, true);
        assert!(lo > 0.0);
        assert!(hi > 100.0);
    }

    fn sample_rows() -> Table {
        let csv = "\
kernel;variant;threads;time
mandel;omp;1;2000
mandel;omp;2;1100
mandel;seq;4;600
";
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_x_axis_numeric_for_threads() {
        let table = sample_rows();
        let rows: Vec<&Record> = table.rows.iter().collect();
        let axis = XAxis::build(&rows, Field::Threads, false);
        assert!(matches!(axis, XAxis::Numeric));
        assert_eq!(axis.position(rows[1], Field::Threads), Some(2.0));
    }

    #[test]
    fn test_x_axis_categorical_for_variant() {
        let table = sample_rows();
        let rows: Vec<&Record> = table.rows.iter().collect();
        let axis = XAxis::build(&rows, Field::Variant, false);
        assert_eq!(axis.categories(), ["omp", "seq"]);
        assert_eq!(axis.position(rows[2], Field::Variant), Some(1.0));
        assert_eq!(axis.tick_label(0.0), "omp");
        assert_eq!(axis.tick_label(0.5), "");
    }

    #[test]
    fn test_facet_values_sorted_and_deduped() {
        let csv = "\
kernel;dim;threads;time
mandel;2048;1;2000
mandel;512;2;1100
mandel;512;4;600
";
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        let rows: Vec<&Record> = table.rows.iter().collect();
        let values = facet_values(&rows, Some(Field::Dim));
        assert_eq!(
            values,
            vec![Some("512".to_string()), Some("2048".to_string())]
        );
        assert_eq!(facet_index(rows[0], Some(Field::Dim), &values), 1);
        assert_eq!(facet_values(&rows, None), vec![None]);
    }
}
