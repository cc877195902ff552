//! Text (terminal) reporter
//!
//! Layout:
//!
//! ```text
//! Assessor     alpha             beta         Winner
//! ───────────  ────────────────  ───────────  ──────
//! Readability  8.00              6.00         alpha
//! Security     2.00 ±0.5 (x0.5)  4.50 (x0.5)  beta
//!
//! TOTAL SCORE  10.00             10.50        beta
//! ```
//!
//! followed by the summary sentence and, in verbose mode, a per-assessor
//! breakdown of the first few detail lines.

use crate::engine::{CodebaseResults, ComparisonReport, ComparisonRow};
use crate::models::Winner;
use console::{measure_text_width, pad_str, style, Alignment};

/// Detail lines shown per codebase in verbose mode
const MAX_DETAILS: usize = 5;
/// Normalized-score difference below which an area counts as even
const SIMILAR_THRESHOLD: f64 = 0.5;

/// Render report as formatted terminal output
pub fn render(report: &ComparisonReport, verbose: bool) -> String {
    let (label1, label2) = labels(report);
    let mut out = String::new();

    out.push_str(&format!(
        "\n{} {} {} {}\n\n",
        style("Comparing").bold(),
        style(&label1).magenta().bold(),
        style("vs").dim(),
        style(&label2).green().bold()
    ));

    for (side, label) in [(&report.first, &label1), (&report.second, &label2)] {
        if side.appears_empty() {
            out.push_str(&format!(
                "{}\n",
                style(format!(
                    "Warning: {} appears to be empty or has no analyzable code.",
                    label
                ))
                .yellow()
            ));
        }
    }

    out.push_str(&render_table(report, &label1, &label2));
    out.push('\n');
    out.push_str(&summary_sentence(report, &label1, &label2));
    out.push('\n');

    if verbose {
        out.push_str(&render_breakdown(report, &label1, &label2));
    }
    out
}

/// Directory names, or full paths when both names are the same.
fn labels(report: &ComparisonReport) -> (String, String) {
    let (a, b) = (report.first.label(), report.second.label());
    if a == b {
        (
            report.first.path.display().to_string(),
            report.second.path.display().to_string(),
        )
    } else {
        (a, b)
    }
}

fn format_weight(weight: f64) -> String {
    if weight.fract() == 0.0 {
        format!("{:.1}", weight)
    } else {
        format!("{}", weight)
    }
}

/// Weighted score, with the weighted interval half-width when known.
fn score_cell(side: &CodebaseResults, row: &ComparisonRow, weighted: f64) -> String {
    let mut cell = format!("{:.2}", weighted);
    if let Some(outcome) = side.outcomes.get(&row.name).filter(|o| o.has_interval()) {
        let (low, high) = outcome.confidence_interval;
        cell.push_str(&format!(" ±{:.1}", (high - low) / 2.0 * row.weight));
    }
    if row.weight != 1.0 {
        cell.push_str(&format!(" (x{})", format_weight(row.weight)));
    }
    cell
}

fn winner_cell(winner: Winner, label1: &str, label2: &str) -> String {
    match winner {
        Winner::First => style(label1).magenta().to_string(),
        Winner::Second => style(label2).green().to_string(),
        Winner::Tie => style("Tie").yellow().to_string(),
    }
}

fn render_table(report: &ComparisonReport, label1: &str, label2: &str) -> String {
    let rows: Vec<[String; 4]> = report
        .rows
        .iter()
        .map(|row| {
            [
                style(&row.name).cyan().to_string(),
                score_cell(&report.first, row, row.weighted1),
                score_cell(&report.second, row, row.weighted2),
                winner_cell(row.winner, label1, label2),
            ]
        })
        .collect();
    let total = [
        style("TOTAL SCORE").bold().to_string(),
        style(format!("{:.2}", report.first.total)).magenta().bold().to_string(),
        style(format!("{:.2}", report.second.total)).green().bold().to_string(),
        style(winner_cell(report.winner, label1, label2)).bold().to_string(),
    ];
    let header = [
        "Assessor".to_string(),
        label1.to_string(),
        label2.to_string(),
        "Winner".to_string(),
    ];

    let mut widths = [0usize; 4];
    for cells in std::iter::once(&header).chain(rows.iter()).chain(std::iter::once(&total)) {
        for (width, cell) in widths.iter_mut().zip(cells.iter()) {
            *width = (*width).max(measure_text_width(cell));
        }
    }

    let line = |cells: &[String; 4]| -> String {
        let padded: Vec<_> = cells
            .iter()
            .zip(widths.iter())
            .map(|(cell, &w)| pad_str(cell, w, Alignment::Left, None).into_owned())
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let mut out = line(&header.clone().map(|h| style(h).bold().to_string()));
    let rule = widths.map(|w| style("─".repeat(w)).dim().to_string());
    out.push_str(&line(&rule));
    for cells in &rows {
        out.push_str(&line(cells));
    }
    out.push('\n');
    out.push_str(&line(&total));
    out
}

fn summary_sentence(report: &ComparisonReport, label1: &str, label2: &str) -> String {
    let (t1, t2) = (report.first.total, report.second.total);
    let (winner, loser) = match report.winner {
        Winner::First => (label1, label2),
        Winner::Second => (label2, label1),
        Winner::Tie => {
            return format!(
                "{} and {} are tied at {:.2}.\n",
                style(label1).bold(),
                style(label2).bold(),
                t1
            )
        }
    };
    let phrase = report.assessment_phrase();
    let comparison = if phrase.ends_with("better") {
        format!("{} than", phrase)
    } else {
        phrase.to_string()
    };
    format!(
        "{} is {} {} ({:.2} vs {:.2}).\n",
        style(winner).bold(),
        style(comparison).bold(),
        loser,
        t1,
        t2
    )
}

fn render_breakdown(report: &ComparisonReport, label1: &str, label2: &str) -> String {
    let mut out = format!("\n{}\n", style("Detailed Analysis").bold().underlined());

    for row in &report.rows {
        out.push_str(&format!("\n{}\n", style(format!("{} Analysis", row.name)).cyan().bold()));
        let mut normalized = [0.0; 2];
        for (i, (side, label)) in [(&report.first, label1), (&report.second, label2)]
            .into_iter()
            .enumerate()
        {
            let score = side.normalized_scores.get(&row.name).copied().unwrap_or(0.0);
            normalized[i] = score;
            out.push_str(&format!("  {} - Score: {}\n", label, style(format!("{:.2}", score)).bold()));

            let details = side
                .outcomes
                .get(&row.name)
                .map(|o| o.details.as_slice())
                .unwrap_or_default();
            if details.is_empty() {
                out.push_str("    • No issues found.\n");
            }
            for detail in details.iter().take(MAX_DETAILS) {
                out.push_str(&format!("    • {}\n", detail));
            }
            if details.len() > MAX_DETAILS {
                out.push_str(&format!(
                    "    {}\n",
                    style(format!("... and {} more items", details.len() - MAX_DETAILS)).dim()
                ));
            }
        }

        let [s1, s2] = normalized;
        let interpretation = if (s1 - s2).abs() < SIMILAR_THRESHOLD {
            "Both codebases perform similarly in this area.".to_string()
        } else if s1 > s2 {
            format!("{} outperforms {} by {:.1} points.", label1, label2, s1 - s2)
        } else {
            format!("{} outperforms {} by {:.1} points.", label2, label1, s2 - s1)
        };
        out.push_str(&format!("  {}\n", style(interpretation).dim()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;

    fn plain(report: &ComparisonReport, verbose: bool) -> String {
        console::strip_ansi_codes(&render(report, verbose)).into_owned()
    }

    #[test]
    fn test_table_rows() {
        let (_root, report) = test_report();
        let out = plain(&report, false);
        let readability = out.lines().find(|l| l.starts_with("Readability")).unwrap();
        assert!(readability.contains("8.00"));
        assert!(readability.contains("6.00"));
        assert!(readability.trim_end().ends_with("alpha"));

        let security = out.lines().find(|l| l.starts_with("Security")).unwrap();
        assert!(security.contains("2.00 ±0.5 (x0.5)"));
        assert!(security.contains("4.50 (x0.5)"));
        assert!(security.trim_end().ends_with("beta"));

        let total = out.lines().find(|l| l.starts_with("TOTAL SCORE")).unwrap();
        assert!(total.contains("10.00"));
        assert!(total.contains("10.50"));
    }

    #[test]
    fn test_summary_sentence() {
        let (_root, report) = test_report();
        let out = plain(&report, false);
        assert!(out.contains("beta is very similar to alpha (10.00 vs 10.50)."));
        assert!(!out.contains("Warning"));
        assert!(!out.contains("Detailed Analysis"));
    }

    #[test]
    fn test_verbose_breakdown() {
        let (_root, report) = test_report();
        let out = plain(&report, true);
        assert!(out.contains("Readability Analysis"));
        assert!(out.contains("alpha - Score: 8.00"));
        assert!(out.contains("• finding 5"));
        assert!(!out.contains("• finding 6"));
        assert!(out.contains("... and 2 more items"));
        assert!(out.contains("alpha outperforms beta by 2.0 points."));
        // beta's security outcome has no details
        assert!(out.contains("• No issues found."));
        assert!(out.contains("beta outperforms alpha by 5.0 points."));
    }

    #[test]
    fn test_format_weight() {
        assert_eq!(format_weight(2.0), "2.0");
        assert_eq!(format_weight(1.25), "1.25");
        assert_eq!(format_weight(0.0), "0.0");
    }
}
