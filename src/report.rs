//! Text charts and CSV export of sweep results.

use csv::Writer;
use std::path::Path;

use crate::analysis::SweepReport;
use crate::error::Result;

/// Horizontal bar chart of a `(q, value)` sequence. Missing values print
/// as `n/a`; negative values grow to the left of the axis.
pub fn plot_series_text(points: &[(usize, Option<f64>)], name: &str, max_width: usize) -> String {
    let mut result = format!("\n{} (n={}):\n", name, points.len());
    result.push_str(&"-".repeat(max_width * 2 + 20));
    result.push('\n');

    let max_val = points
        .iter()
        .filter_map(|(_, v)| *v)
        .filter(|v| v.is_finite())
        .map(f64::abs)
        .fold(0.0, f64::max);
    let has_negative = points.iter().any(|(_, v)| v.map_or(false, |x| x < 0.0));

    for &(q, value) in points {
        let line = match value {
            Some(v) if v.is_finite() => {
                let bar_len = if max_val > 0.0 {
                    ((v.abs() / max_val) * max_width as f64).round() as usize
                } else {
                    0
                };
                let (left, right) = if v < 0.0 {
                    (
                        format!("{}{}", " ".repeat(max_width - bar_len), "#".repeat(bar_len)),
                        String::new(),
                    )
                } else if has_negative {
                    (" ".repeat(max_width), "#".repeat(bar_len))
                } else {
                    (String::new(), "#".repeat(bar_len))
                };
                format!("{:>4} | {:>10.4} |{}|{}", q, v, left, right)
            }
            _ => format!("{:>4} | {:>10} |", q, "n/a"),
        };
        result.push_str(line.trim_end());
        result.push('\n');
    }

    result
}

/// `(q, sigma(q))` pairs ready for [`plot_series_text`]
pub fn volatility_points(report: &SweepReport) -> Vec<(usize, Option<f64>)> {
    report
        .points
        .iter()
        .map(|p| (p.q, p.scaled_volatility))
        .collect()
}

/// `(q, z(q))` pairs, q = 1 excluded
pub fn z_points(report: &SweepReport) -> Vec<(usize, Option<f64>)> {
    report
        .points
        .iter()
        .filter(|p| p.q >= 2)
        .map(|p| (p.q, p.z_statistic))
        .collect()
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Write one row per q; missing values are empty cells.
pub fn save_sweep_csv(path: &Path, report: &SweepReport) -> Result<()> {
    let mut writer = Writer::from_path(path)?;
    writer.write_record([
        "q",
        "variance",
        "variance_ratio",
        "z_statistic",
        "z_star",
        "p_value",
        "scaled_volatility",
    ])?;

    for p in &report.points {
        writer.write_record([
            p.q.to_string(),
            cell(p.variance),
            cell(p.variance_ratio),
            cell(p.z_statistic),
            cell(p.z_star),
            cell(p.p_value),
            cell(p.scaled_volatility),
        ])?;
    }

    writer.flush()?;
    Ok(())
}
