use crate::shared::error::UpdateError;
use crate::vulnerability_updates::domain::{
    AffectedPackage, Fingerprint, UpdateOperationSet, UpdaterName, Vulnerability,
};
use crate::vulnerability_updates::policies::SeverityPolicy;
use serde::Deserialize;

// OSV schema subset (https://ossf.github.io/osv-schema/)

#[derive(Debug, Deserialize)]
struct OsvRecord {
    id: String,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    withdrawn: Option<String>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    database_specific: Option<DatabaseSpecific>,
    #[serde(default)]
    affected: Vec<OsvAffected>,
}

#[derive(Debug, Deserialize)]
struct OsvSeverity {
    #[serde(rename = "type")]
    severity_type: String,
    score: String,
}

#[derive(Debug, Deserialize)]
struct DatabaseSpecific {
    #[serde(default)]
    severity: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsvAffected {
    #[serde(default)]
    package: Option<OsvPackage>,
    #[serde(default)]
    severity: Vec<OsvSeverity>,
    #[serde(default)]
    ranges: Vec<OsvRange>,
}

#[derive(Debug, Deserialize)]
struct OsvPackage {
    name: String,
    #[serde(default)]
    ecosystem: String,
}

#[derive(Debug, Deserialize)]
struct OsvRange {
    #[serde(default)]
    events: Vec<OsvEvent>,
}

#[derive(Debug, Deserialize)]
struct OsvEvent {
    #[serde(default)]
    introduced: Option<String>,
    #[serde(default)]
    fixed: Option<String>,
}

/// Parses a JSON array of OSV records into an update operation set.
///
/// Each (record, affected package) pair becomes one operation, in document
/// order. Withdrawn records and affected entries without a package are
/// skipped. With `ecosystem` set, only packages of that ecosystem
/// (case-insensitive) are kept.
pub fn parse_osv_feed(
    bytes: &[u8],
    updater: &UpdaterName,
    fingerprint: Fingerprint,
    ecosystem: Option<&str>,
) -> Result<UpdateOperationSet, UpdateError> {
    let records: Vec<OsvRecord> = serde_json::from_slice(bytes)
        .map_err(|e| UpdateError::parse(format!("invalid OSV feed: {}", e)))?;

    let mut vulnerabilities = Vec::new();
    for record in records {
        if record.withdrawn.is_some() {
            tracing::debug!(updater = %updater, id = %record.id, "skipping withdrawn record");
            continue;
        }

        let record_vectors: Vec<&str> = cvss_vectors(&record.severity);
        let database_severity = record
            .database_specific
            .as_ref()
            .and_then(|db| db.severity.as_deref());

        for affected in &record.affected {
            let Some(package) = &affected.package else {
                continue;
            };
            if let Some(wanted) = ecosystem {
                if !package.ecosystem.eq_ignore_ascii_case(wanted) {
                    continue;
                }
            }

            let vectors = cvss_vectors(&affected.severity)
                .into_iter()
                .chain(record_vectors.iter().copied());
            let severity = SeverityPolicy::classify(vectors, database_severity);

            let events = affected.ranges.iter().flat_map(|r| r.events.iter());
            let introduced = events.clone().find_map(|e| e.introduced.clone());
            let fixed = events.clone().find_map(|e| e.fixed.clone());

            let affected_package = AffectedPackage::new(
                package.name.clone(),
                package.ecosystem.clone(),
                introduced,
                fixed,
            )
            .map_err(|e| UpdateError::parse(format!("{}: {}", record.id, e)))?;

            let vulnerability = Vulnerability::new(
                record.id.clone(),
                record.summary.clone(),
                severity,
                affected_package,
            )
            .map_err(|e| UpdateError::parse(e.to_string()))?;
            vulnerabilities.push(vulnerability);
        }
    }

    Ok(UpdateOperationSet::new(
        updater.clone(),
        fingerprint,
        vulnerabilities,
    ))
}

fn cvss_vectors(severities: &[OsvSeverity]) -> Vec<&str> {
    severities
        .iter()
        .filter(|s| s.severity_type == "CVSS_V3")
        .map(|s| s.score.as_str())
        .collect()
}
