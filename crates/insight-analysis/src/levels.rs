//! `define_level!` macro for the four-step ordered scales (severity, risk).

/// Defines a `Low < Medium < High < Critical` enum with lowercase serde
/// names, `name()` and `Display`.
macro_rules! define_level {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            Low,
            Medium,
            High,
            Critical,
        }

        impl $name {
            pub fn name(&self) -> &'static str {
                match self {
                    Self::Critical => "critical",
                    Self::High => "high",
                    Self::Medium => "medium",
                    Self::Low => "low",
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::classify::RiskTier;
    use crate::detectors::Severity;

    #[test]
    fn risk_and_severity_share_names_and_order() {
        let risks = [RiskTier::Low, RiskTier::Medium, RiskTier::High, RiskTier::Critical];
        let severities = [Severity::Low, Severity::Medium, Severity::High, Severity::Critical];
        for (risk, severity) in risks.iter().zip(&severities) {
            assert_eq!(risk.name(), severity.name());
            assert_eq!(risk.to_string(), severity.to_string());
        }
        assert!(risks.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(serde_json::to_string(&RiskTier::Critical).unwrap(), "\"critical\"");
        assert_eq!(serde_json::from_str::<Severity>("\"high\"").unwrap(), Severity::High);
    }
}
