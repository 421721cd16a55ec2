use crate::shared::Result;
use serde::{Deserialize, Serialize};

/// Severity band of a vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    None,
    Low,
    Medium,
    High,
    Critical,
    Unknown,
}

impl Severity {
    /// Maps a CVSS base score onto the qualitative rating scale.
    ///
    /// 0.0 => None, 0.1-3.9 => Low, 4.0-6.9 => Medium, 7.0-8.9 => High,
    /// 9.0-10.0 => Critical.
    pub fn from_cvss_score(score: f64) -> Self {
        if score >= 9.0 {
            Severity::Critical
        } else if score >= 7.0 {
            Severity::High
        } else if score >= 4.0 {
            Severity::Medium
        } else if score > 0.0 {
            Severity::Low
        } else {
            Severity::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The package (and version range) a vulnerability applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedPackage {
    name: String,
    ecosystem: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    introduced: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fixed: Option<String>,
}

impl AffectedPackage {
    pub fn new(
        name: String,
        ecosystem: String,
        introduced: Option<String>,
        fixed: Option<String>,
    ) -> Result<Self> {
        if name.is_empty() {
            anyhow::bail!("Affected package name cannot be empty");
        }
        Ok(Self {
            name,
            ecosystem,
            introduced,
            fixed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ecosystem(&self) -> &str {
        &self.ecosystem
    }

    pub fn introduced(&self) -> Option<&str> {
        self.introduced.as_deref()
    }

    pub fn fixed(&self) -> Option<&str> {
        self.fixed.as_deref()
    }
}

/// One vulnerability record as it applies to one affected package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    summary: Option<String>,
    severity: Severity,
    package: AffectedPackage,
}

impl Vulnerability {
    pub fn new(
        id: String,
        summary: Option<String>,
        severity: Severity,
        package: AffectedPackage,
    ) -> Result<Self> {
        if id.trim().is_empty() {
            anyhow::bail!("Vulnerability ID cannot be empty");
        }
        Ok(Self {
            id,
            summary,
            severity,
            package,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn package(&self) -> &AffectedPackage {
        &self.package
    }
}
