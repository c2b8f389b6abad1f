//! Markdown study report generator.

use bubblelab_core::summary::BubbleSummary;
use bubblelab_stats::{OlsFit, TTestResult, WalkForwardReport};
use serde::Serialize;

/// Everything the report can render; optional sections are skipped when
/// their input is absent. Also serializable, so the same bundle backs the
/// `models.json` artifact.
#[derive(Debug, Default, Serialize)]
pub struct StudyReportInputs<'a> {
    pub summaries: &'a [BubbleSummary],
    pub regression: Option<&'a OlsFit>,
    pub flagged_returns: Option<&'a TTestResult>,
    pub walk_forward: Option<&'a WalkForwardReport>,
}

pub struct StudyReportGenerator;

impl StudyReportGenerator {
    pub fn generate(&self, inputs: &StudyReportInputs<'_>) -> String {
        let mut report = String::from("# Bubble Study Report\n");

        report.push_str("\n## Bubble Windows\n\n");
        if inputs.summaries.is_empty() {
            report.push_str("No window overlapped the available history.\n");
        } else {
            report.push_str(
                "| Window | Peak | Peak CAPE | Run-up 12m | Run-up 24m | Max Drawdown | Months to Trough |\n",
            );
            report.push_str(
                "|--------|------|-----------|------------|------------|--------------|------------------|\n",
            );
            for s in inputs.summaries {
                report.push_str(&format!(
                    "| {} | {} | {} | {} | {} | {} | {} |\n",
                    s.window,
                    s.peak_month,
                    num(s.peak_valuation, 1),
                    pct(s.runup_12m),
                    pct(s.runup_24m),
                    pct(s.max_drawdown),
                    s.months_to_trough,
                ));
            }
        }

        if let Some(fit) = inputs.regression {
            report.push_str("\n## Valuation vs Forward Return\n\n");
            report.push_str(&format!(
                "OLS of forward annualized return on CAPE over {} months.\n\n",
                fit.nobs
            ));
            report.push_str("| Term | Coef | Std Err | t | P>\\|t\\| |\n");
            report.push_str("|------|------|---------|---|-------|\n");
            for i in 0..fit.names.len() {
                report.push_str(&format!(
                    "| {} | {:.6} | {:.6} | {:.3} | {:.4} |\n",
                    fit.names[i],
                    fit.params[i],
                    fit.std_errors[i],
                    fit.t_values[i],
                    fit.p_values[i],
                ));
            }
            report.push_str(&format!("\nR^2: {:.4}\n", fit.r_squared));
        }

        if let Some(test) = inputs.flagged_returns {
            report.push_str("\n## Flagged vs Normal Months\n\n");
            report.push_str(&format!(
                "- Flagged mean monthly return: {} ({} months)\n",
                pct(test.mean_a),
                test.n_a
            ));
            report.push_str(&format!(
                "- Normal mean monthly return: {} ({} months)\n",
                pct(test.mean_b),
                test.n_b
            ));
            report.push_str(&format!("- t-statistic: {:.3}\n", test.t_stat));
            report.push_str(&format!("- p-value: {:.4}\n", test.p_value));
        }

        if let Some(wf) = inputs.walk_forward {
            report.push_str("\n## Walk-Forward Forecast\n\n");
            report.push_str(&format!(
                "- Train/test split: {} / {} months\n",
                wf.train_len, wf.test_len
            ));
            report.push_str(&format!(
                "- Directional accuracy: {:.1}%\n",
                wf.directional_accuracy * 100.0
            ));
            report.push_str(&format!("- Mean absolute error: {:.5}\n", wf.mae));
        }

        report.push_str(
            "\n## Notes\n- Chart panels (index, valuation, dot-com, housing, volatility) are exported alongside this report.\n",
        );

        report
    }
}

fn pct(value: f64) -> String {
    if value.is_finite() {
        format!("{:+.2}%", value * 100.0)
    } else {
        "n/a".to_string()
    }
}

fn num(value: f64, decimals: usize) -> String {
    if value.is_finite() {
        format!("{value:.decimals$}")
    } else {
        "n/a".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubblelab_core::domain::Month;

    fn sample_summary() -> BubbleSummary {
        BubbleSummary {
            window: "dot_com".to_string(),
            peak_month: Month::new(2000, 8),
            peak_valuation: 42.9,
            runup_12m: 0.14,
            runup_24m: 0.37,
            max_drawdown: -0.45,
            months_to_trough: 26,
        }
    }

    #[test]
    fn summary_table_renders() {
        let summaries = vec![sample_summary()];
        let report = StudyReportGenerator.generate(&StudyReportInputs {
            summaries: &summaries,
            ..Default::default()
        });

        assert!(report.contains("| dot_com | 2000-08 | 42.9 | +14.00% | +37.00% | -45.00% | 26 |"));
        // Optional sections are absent without inputs.
        assert!(!report.contains("Walk-Forward"));
    }

    #[test]
    fn empty_history_is_called_out() {
        let report = StudyReportGenerator.generate(&StudyReportInputs::default());
        assert!(report.contains("No window overlapped the available history."));
    }

    #[test]
    fn nan_cells_render_as_not_available() {
        let mut summary = sample_summary();
        summary.peak_valuation = f64::NAN;
        let summaries = vec![summary];
        let report = StudyReportGenerator.generate(&StudyReportInputs {
            summaries: &summaries,
            ..Default::default()
        });
        assert!(report.contains("| n/a |"));
    }
}
