/// Event emitted by the Cash-Karp integrator after each accepted step.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a> {
    /// Accepted step number, starting at 1.
    pub step: usize,

    /// Independent variable at the end of the step.
    pub x: f64,

    /// Size of the step just taken.
    pub h: f64,

    /// State at `x`.
    pub y: &'a [f64],
}
