/// Knobs for [`crate::stage::Stage`], grounded on `CompileConfig`'s
/// "plain struct with `Default`, passed by value into the entry point"
/// shape (SPEC_FULL §4.9).
#[derive(Debug, Clone)]
pub struct StageOptions {
    /// Upper bound on variant-selection and inherits/internal-ref re-apply
    /// passes (§4.3.1 step 1, step 6) before giving up on convergence. A
    /// layer with `N` variant selections is guaranteed to converge in ≤ `N`
    /// iterations (§8 property 6); this is a safety net against authoring
    /// mistakes that would otherwise loop forever.
    pub max_fixpoint_iterations: usize,

    /// When set, any [`pcp_diagnostic::CompositionWarning`] is promoted to
    /// a hard error instead of being collected — useful for test harnesses
    /// that want to fail fast on unexpected composition shape.
    pub fatal_warnings: bool,
}

impl Default for StageOptions {
    fn default() -> Self {
        Self { max_fixpoint_iterations: 64, fatal_warnings: false }
    }
}
