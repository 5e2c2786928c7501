//! Knobs for one lowering session.

/// Lowering configuration.
///
/// The defaults match what callers want in practice; tests flip individual
/// switches to exercise the stricter paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LowerOptions {
    /// Run a second overload-resolution pass that may insert
    /// tensor-to-number and string-to-device conversions.
    pub implicit_conversions: bool,
    /// Share one entry-block constant per distinct int or float literal.
    pub intern_constants: bool,
    /// Upper bound on iterations of a statically unrolled `for` loop.
    pub max_unroll: usize,
}

impl Default for LowerOptions {
    fn default() -> Self {
        LowerOptions {
            implicit_conversions: true,
            intern_constants: true,
            max_unroll: 1024,
        }
    }
}

impl LowerOptions {
    #[must_use]
    pub fn without_implicit_conversions(mut self) -> Self {
        self.implicit_conversions = false;
        self
    }

    #[must_use]
    pub fn without_constant_interning(mut self) -> Self {
        self.intern_constants = false;
        self
    }

    #[must_use]
    pub fn with_max_unroll(mut self, max_unroll: usize) -> Self {
        self.max_unroll = max_unroll;
        self
    }
}
