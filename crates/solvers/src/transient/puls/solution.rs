/// Indicates how the modified-Puls iteration terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every state settled within its tolerance.
    Converged { iterations: usize },

    /// The iteration cap was reached first.
    NotConverged,
}

impl Status {
    /// Returns `true` if the iteration converged.
    #[must_use]
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }
}

/// The result of one modified-Puls step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution<const N: usize> {
    pub status: Status,

    /// States at the end of the step, within bounds.
    pub state: [f64; N],

    /// Rates computed at the last trial state.
    pub rates: [f64; N],
}
