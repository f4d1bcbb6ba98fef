//! Plain-text rendering of column distributions.

use std::fmt::Write;

use super::distribution::Distribution;

const BAR_WIDTH: usize = 40;

/// Title, summary, box-plot line and histogram for one column.
#[must_use]
pub fn render_distribution(dist: &Distribution) -> String {
    let mut out = String::new();
    let skew = dist
        .skew
        .map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}"));
    let std_dev = dist
        .std_dev
        .map_or_else(|| "n/a".to_string(), |s| format!("{s:.2}"));
    let s = &dist.summary;

    let _ = writeln!(out, "{}, Skew: {}", dist.column, skew);
    let _ = writeln!(
        out,
        "  count {}  mean {:.2}  std {}  min {}  q1 {}  median {}  q3 {}  max {}",
        dist.count,
        dist.mean,
        std_dev,
        fmt_num(s.min),
        fmt_num(s.q1),
        fmt_num(s.median),
        fmt_num(s.q3),
        fmt_num(s.max)
    );
    let _ = writeln!(
        out,
        "  box: whiskers [{}, {}] (k = {}), {} outlier(s)",
        fmt_num(dist.whiskers.0),
        fmt_num(dist.whiskers.1),
        dist.whisker_multiplier,
        dist.outliers.len()
    );

    let tallest = dist.histogram.counts.iter().copied().max().unwrap_or(0).max(1);
    let labels: Vec<String> = dist
        .histogram
        .edges
        .windows(2)
        .map(|edge| format!("[{}, {})", fmt_num(edge[0]), fmt_num(edge[1])))
        .collect();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0);

    for (label, count) in labels.iter().zip(&dist.histogram.counts) {
        let bar = "#".repeat(count * BAR_WIDTH / tallest);
        let _ = writeln!(out, "  {label:>label_width$} | {bar} {count}");
    }

    out
}

fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::distribution::BinRule;

    #[test]
    fn test_render_distribution() {
        let dist = Distribution::from_values(
            "actual_arr_delay_mins",
            vec![1.0, 2.0, 3.0, 4.0, 10.0],
            BinRule::Auto,
            1.5,
        )
        .unwrap();
        let text = render_distribution(&dist);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "actual_arr_delay_mins, Skew: 1.70");
        assert!(lines[1].contains("median 3"));
        assert!(lines[2].contains("whiskers [1, 4]"));
        assert!(lines[2].contains("1 outlier(s)"));
        assert_eq!(lines.len(), 3 + 4);
        assert!(lines[3].ends_with(&format!("| {} 3", "#".repeat(40))));
        assert!(lines[5].ends_with("|  0"));
    }

    #[test]
    fn test_small_sample_shows_na() {
        let dist = Distribution::from_values("x", vec![2.0, 2.5], BinRule::Fixed(1), 1.5).unwrap();
        let text = render_distribution(&dist);
        assert!(text.starts_with("x, Skew: n/a"));
        assert!(text.contains("[2, 2.50)"));
    }
}
