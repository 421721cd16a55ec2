use crate::vulnerability_updates::domain::Severity;
use std::collections::HashMap;

/// SeverityPolicy decides the severity band recorded for a vulnerability.
///
/// Priority order:
/// 1. CVSS v3 vector (base score computed from the vector)
/// 2. database-specific severity label ("CRITICAL", "HIGH", "MODERATE", ...)
/// 3. `Severity::Unknown`
pub struct SeverityPolicy;

impl SeverityPolicy {
    pub fn classify<'a>(
        cvss_vectors: impl IntoIterator<Item = &'a str>,
        database_severity: Option<&str>,
    ) -> Severity {
        cvss_vectors
            .into_iter()
            .filter(|v| v.starts_with("CVSS:3"))
            .find_map(Self::cvss_v3_base_score)
            .map(Severity::from_cvss_score)
            .or_else(|| database_severity.and_then(Self::parse_label))
            .unwrap_or(Severity::Unknown)
    }

    /// Computes the CVSS v3.x base score of a vector such as
    /// `CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H`.
    ///
    /// Returns `None` when a base metric is missing or has an unknown value.
    pub fn cvss_v3_base_score(vector: &str) -> Option<f64> {
        let metrics: HashMap<&str, &str> = vector
            .split('/')
            .skip(1)
            .filter_map(|part| part.split_once(':'))
            .collect();

        let scope_changed = match *metrics.get("S")? {
            "U" => false,
            "C" => true,
            _ => return None,
        };

        let av = match *metrics.get("AV")? {
            "N" => 0.85,
            "A" => 0.62,
            "L" => 0.55,
            "P" => 0.2,
            _ => return None,
        };
        let ac = match *metrics.get("AC")? {
            "L" => 0.77,
            "H" => 0.44,
            _ => return None,
        };
        let pr = match (*metrics.get("PR")?, scope_changed) {
            ("N", _) => 0.85,
            ("L", false) => 0.62,
            ("L", true) => 0.68,
            ("H", false) => 0.27,
            ("H", true) => 0.5,
            _ => return None,
        };
        let ui = match *metrics.get("UI")? {
            "N" => 0.85,
            "R" => 0.62,
            _ => return None,
        };

        let impact_metric = |key: &str| -> Option<f64> {
            match *metrics.get(key)? {
                "N" => Some(0.0),
                "L" => Some(0.22),
                "H" => Some(0.56),
                _ => None,
            }
        };
        let c = impact_metric("C")?;
        let i = impact_metric("I")?;
        let a = impact_metric("A")?;

        let iss = 1.0 - ((1.0 - c) * (1.0 - i) * (1.0 - a));
        let impact = if scope_changed {
            7.52 * (iss - 0.029) - 3.25 * (iss - 0.02_f64).powi(15)
        } else {
            6.42 * iss
        };
        let exploitability = 8.22 * av * ac * pr * ui;

        let base = if impact <= 0.0 {
            0.0
        } else if scope_changed {
            f64::min(1.08 * (impact + exploitability), 10.0)
        } else {
            f64::min(impact + exploitability, 10.0)
        };

        Some(round_up(base))
    }

    /// Maps a database-specific severity label; unrecognised labels yield `None`.
    pub fn parse_label(label: &str) -> Option<Severity> {
        match label.trim().to_uppercase().as_str() {
            "CRITICAL" => Some(Severity::Critical),
            "HIGH" => Some(Severity::High),
            "MODERATE" | "MEDIUM" => Some(Severity::Medium),
            "LOW" => Some(Severity::Low),
            "NONE" => Some(Severity::None),
            _ => None,
        }
    }
}

/// CVSS "round up" to one decimal, done on integers to avoid float drift.
fn round_up(value: f64) -> f64 {
    let scaled = (value * 100_000.0).round() as i64;
    if scaled % 10_000 == 0 {
        scaled as f64 / 100_000.0
    } else {
        ((scaled / 10_000) + 1) as f64 / 10.0
    }
}
