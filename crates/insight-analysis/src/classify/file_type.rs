//! File types, risk tiers, and the fixed per-type detector compatibility table.

use serde::{Deserialize, Serialize};

use super::language_detect::Language;

define_level!(
    /// How sensitive a file is. Ordered so that `Critical` is the maximum.
    RiskTier
);

/// Semantic file type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Source,
    Test,
    Config,
    Env,
    Secret,
    Infrastructure,
    Migration,
    Schema,
    Documentation,
    Asset,
    BuildArtifact,
    Log,
    Diagnostic,
    Coverage,
    Report,
}

const SOURCE_DETECTORS: &[&str] = &[
    "typescript",
    "eslint",
    "python-types",
    "python-security",
    "security",
    "complexity",
    "performance",
    "import",
    "circular",
];

const TEST_DETECTORS: &[&str] = &[
    "typescript",
    "eslint",
    "python-types",
    "security",
    "import",
];

impl FileType {
    pub const ALL: [FileType; 15] = [
        Self::Source,
        Self::Test,
        Self::Config,
        Self::Env,
        Self::Secret,
        Self::Infrastructure,
        Self::Migration,
        Self::Schema,
        Self::Documentation,
        Self::Asset,
        Self::BuildArtifact,
        Self::Log,
        Self::Diagnostic,
        Self::Coverage,
        Self::Report,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Test => "test",
            Self::Config => "config",
            Self::Env => "env",
            Self::Secret => "secret",
            Self::Infrastructure => "infrastructure",
            Self::Migration => "migration",
            Self::Schema => "schema",
            Self::Documentation => "documentation",
            Self::Asset => "asset",
            Self::BuildArtifact => "build_artifact",
            Self::Log => "log",
            Self::Diagnostic => "diagnostic",
            Self::Coverage => "coverage",
            Self::Report => "report",
        }
    }

    /// Generated or runtime output. Never analyzed, whatever the caller asks for.
    pub fn is_analyzable(&self) -> bool {
        !matches!(
            self,
            Self::BuildArtifact | Self::Log | Self::Diagnostic | Self::Coverage | Self::Report
        )
    }

    pub fn risk(&self) -> RiskTier {
        match self {
            Self::Env | Self::Secret => RiskTier::Critical,
            Self::Infrastructure | Self::Migration => RiskTier::High,
            Self::Config | Self::Source | Self::Schema => RiskTier::Medium,
            Self::Test
            | Self::Documentation
            | Self::Asset
            | Self::BuildArtifact
            | Self::Log
            | Self::Diagnostic
            | Self::Coverage
            | Self::Report => RiskTier::Low,
        }
    }

    /// Fixed detector list for this type, before any language gating.
    pub fn compatible_detectors(&self) -> &'static [&'static str] {
        match self {
            Self::Env | Self::Secret | Self::Config | Self::Schema => &["security"],
            Self::Infrastructure => &["security", "infrastructure"],
            Self::Migration => &["security", "database"],
            Self::Source => SOURCE_DETECTORS,
            Self::Test => TEST_DETECTORS,
            Self::Documentation
            | Self::Asset
            | Self::BuildArtifact
            | Self::Log
            | Self::Diagnostic
            | Self::Coverage
            | Self::Report => &[],
        }
    }

    /// Compatible detectors with language-specific tooling removed when the
    /// language does not match.
    pub fn detectors_for(&self, language: Option<Language>) -> Vec<&'static str> {
        self.compatible_detectors()
            .iter()
            .copied()
            .filter(|d| language_allows(d, language))
            .collect()
    }
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether some file type lists `detector` as compatible.
pub fn is_routable_detector(detector: &str) -> bool {
    FileType::ALL
        .iter()
        .any(|t| t.compatible_detectors().contains(&detector))
}

fn language_allows(detector: &str, language: Option<Language>) -> bool {
    match detector {
        "typescript" | "eslint" => language.is_some_and(|l| l.is_js_family()),
        "python-types" | "python-security" => language == Some(Language::Python),
        _ => true,
    }
}
