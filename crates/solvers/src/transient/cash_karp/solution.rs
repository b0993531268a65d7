/// Indicates how the integrator terminated.
///
/// Only [`Status::Complete`] and [`Status::StoppedByObserver`] write the
/// integrated state back to the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Reached the end of the interval.
    Complete,

    /// The step size shrank until it no longer advanced `x`.
    StepSizeUnderflow,

    /// Took the maximum number of steps without reaching the end.
    MaxStepsExceeded,

    /// Stopped early due to an observer action.
    StoppedByObserver,
}

/// The result of a Cash-Karp integration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Solution {
    /// How the integrator terminated.
    pub status: Status,

    /// Value of the independent variable reached.
    pub x: f64,

    /// Number of accepted steps.
    pub steps: usize,

    /// Number of trial steps rejected for excessive error.
    pub rejected: usize,

    /// Step size the controller would try next.
    pub h_next: f64,
}

impl Solution {
    /// Returns `true` if the whole interval was integrated.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == Status::Complete
    }
}
