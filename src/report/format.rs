//! Formatted terminal output.
//!
//! Formatting lives in one place so the fitting code stays free of
//! presentation concerns and output changes stay localized.

use crate::app::pipeline::{RunOutput, SpecimenFit};
use crate::domain::{AucKind, CurveParameters, FitConfig};

/// Format the run summary: plate, controls, one row per specimen.
pub fn format_run_summary(run: &RunOutput, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== dcurve - Dilution Curve Fit ===\n");
    out.push_str(&format!("Plate: {}\n", run.plate));
    out.push_str(&format!(
        "Fit: {} | direction: {}\n",
        config.fit_type.label(),
        if config.assume_decreasing { "decreasing" } else { "increasing" }
    ));
    out.push_str(&format!(
        "Controls: cell={:.4} virus={:.4}\n",
        run.neutralization.cell(),
        run.neutralization.virus()
    ));
    out.push('\n');

    out.push_str(&format_table(&run.fits, &config.cutoffs, config.auc));

    if !run.failures.is_empty() {
        out.push_str("\nNot fitted:\n");
        for f in &run.failures {
            out.push_str(&format!("- {}: {}\n", f.group, f.reason));
        }
    }

    out
}

/// Format the fitted parameters of each specimen.
pub fn format_parameters(run: &RunOutput) -> String {
    let mut out = String::new();
    for fit in &run.fits {
        let line = match fit.curve.parameters() {
            CurveParameters::Logistic(p) => format!(
                "min={:.2} max={:.2} ec50={:.4} slope={:.4} asym={:.4}",
                p.min, p.max, p.ec50, p.slope, p.asymmetry
            ),
            CurveParameters::Polynomial(p) => format!("coefficients={}", fmt_vec(&p.coefficients)),
            CurveParameters::None => "no fit".to_string(),
        };
        out.push_str(&format!("{:<24} {line}\n", truncate(&fit.group, 24)));
    }
    out
}

fn format_table(rows: &[SpecimenFit], cutoffs: &[f64], auc: Option<AucKind>) -> String {
    let mut out = String::new();

    let mut header = format!("{:<24} {:>9}", "specimen", "fit_err");
    let mut rule = format!("{:-<24} {:-<9}", "", "");
    for c in cutoffs {
        let label = format!("IC{:.0}", c * 100.0);
        header.push_str(&format!(" {:>12} {:>12}", format!("{label} curve"), format!("{label} data")));
        rule.push_str(&format!(" {:-<12} {:-<12}", "", ""));
    }
    if let Some(kind) = auc {
        header.push_str(&format!(" {:>9}", kind.label()));
        rule.push_str(&format!(" {:-<9}", ""));
    }
    out.push_str(header.trim_end());
    out.push('\n');
    out.push_str(rule.trim_end());
    out.push('\n');

    for r in rows {
        let mut line = format!("{:<24} {:>9.3}", truncate(&r.group, 24), r.curve.fit_error());
        for c in &r.cutoffs {
            line.push_str(&format!(
                " {:>12} {:>12}",
                fmt_dilution(c.curve_dilution),
                fmt_dilution(c.interpolated_dilution)
            ));
        }
        if let Some(area) = r.auc {
            line.push_str(&format!(" {area:>9.4}"));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }

    out
}

/// Finite dilutions print as numbers; a cutoff that was never crossed prints
/// as out of range.
fn fmt_dilution(d: Option<f64>) -> String {
    match d {
        Some(v) => format!("{v:.1}"),
        None => "out of range".to_string(),
    }
}

fn fmt_vec(v: &[f64]) -> String {
    let joined = v.iter().map(|x| format!("{x:.6}")).collect::<Vec<_>>().join(", ");
    format!("[{joined}]")
}

/// Cut `s` to `max` characters, marking the cut with a trailing `.`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_fit;
    use crate::data::generate_sample;

    #[test]
    fn summary_lists_every_specimen() {
        let config = FitConfig {
            sample_specimens: 2,
            ..FitConfig::default()
        };
        let sample = generate_sample(&config).unwrap();
        let run = run_fit(&sample.plate, &sample.controls, &config).unwrap();
        let text = format_run_summary(&run, &config);
        assert!(text.contains("Fit: Four Parameter"));
        assert!(text.contains("IC50 curve"));
        assert!(text.contains("IC80 data"));
        assert!(text.contains("Specimen 1"));
        assert!(text.contains("Specimen 2"));

        assert!(!text.contains("pAUC"));

        let with_auc = FitConfig {
            auc: Some(AucKind::Positive),
            ..config.clone()
        };
        let run_auc = run_fit(&sample.plate, &sample.controls, &with_auc).unwrap();
        assert!(format_run_summary(&run_auc, &with_auc).contains("pAUC"));

        let params = format_parameters(&run);
        assert_eq!(params.lines().count(), 2);
        assert!(params.contains("ec50="));
    }

    #[test]
    fn truncate_marks_cut_names() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd.");
    }
}
