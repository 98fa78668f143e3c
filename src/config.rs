//! Processing options.

/// Tunable knobs exposed to external collaborators. Defaults match the
/// documented contract; the core never reads configuration files or the
/// environment.
#[derive(Debug, Clone)]
pub struct Options {
    /// Decisions below this confidence are flagged for review in the report
    pub confidence_threshold: f64,
    /// Plans scoring below this are refused by the safe modifier
    pub safety_threshold: f64,
    /// Field count above which a `LargeForm` warning is emitted
    pub large_form_threshold: usize,
    /// Per-document wall-clock budget in seconds
    pub time_budget_seconds: u64,
    /// Whether preservation analysis runs before generation
    pub preservation_mode: bool,
    /// Minimum exact-match support that justifies preserving or adopting
    /// a trained name outright
    pub exact_match_min_support: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.8,
            safety_threshold: 0.5,
            large_form_threshold: 1000,
            time_budget_seconds: 120,
            preservation_mode: true,
            exact_match_min_support: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = Options::default();
        assert_eq!(options.confidence_threshold, 0.8);
        assert_eq!(options.safety_threshold, 0.5);
        assert_eq!(options.large_form_threshold, 1000);
        assert_eq!(options.time_budget_seconds, 120);
        assert!(options.preservation_mode);
        assert_eq!(options.exact_match_min_support, 2);
    }
}
