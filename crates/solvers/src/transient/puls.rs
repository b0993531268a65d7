//! Bounded modified-Puls integration over a single time step.
//!
//! Each state is advanced by a blend of its previous-step rate and a rate
//! recomputed at the current trial state:
//!
//! ```text
//! x = clamp(x_old + (ω·q_old + (1 − ω)·q(x))·dt, x_min, x_max)
//! ```
//!
//! With `ω > 0` the update is repeated until no state moves by more than
//! its tolerance between passes. With `ω = 0` the update is explicit Euler
//! and a single pass is final.

mod config;
mod solution;

pub use config::{Config, ConfigError};
pub use solution::{Solution, Status};

/// Per-state limits and convergence tolerances.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<const N: usize> {
    pub min: [f64; N],
    pub max: [f64; N],
    pub tol: [f64; N],
}

impl<const N: usize> Bounds<N> {
    /// Creates unbounded limits (`[0, ∞)`) with a uniform tolerance.
    #[must_use]
    pub fn non_negative(tol: f64) -> Self {
        Self {
            min: [0.0; N],
            max: [f64::MAX; N],
            tol: [tol; N],
        }
    }

    fn clamp(&self, i: usize, value: f64) -> f64 {
        value.min(self.max[i]).max(self.min[i])
    }
}

/// Advances `x_old` over one step of length `dt`.
///
/// `rates(x)` returns the rate of change of every state at trial state `x`.
/// `q_old` holds the rates from the previous step and is only read when
/// `config.omega() > 0`.
///
/// The returned solution always carries the last trial state, clamped to
/// `bounds`, and the rates computed for it, even when the iteration did not
/// converge.
pub fn solve<const N: usize, F>(
    x_old: &[f64; N],
    q_old: &[f64; N],
    bounds: &Bounds<N>,
    dt: f64,
    config: &Config,
    mut rates: F,
) -> Solution<N>
where
    F: FnMut(&[f64; N]) -> [f64; N],
{
    let omega = config.omega();
    let mut x = *x_old;
    let mut q = [0.0; N];

    for iteration in 1..=config.max_iters() {
        q = rates(&x);

        let mut settled = true;
        for i in 0..N {
            let trial = bounds.clamp(i, x_old[i] + (omega * q_old[i] + (1.0 - omega) * q[i]) * dt);
            if omega > 0.0 && (trial - x[i]).abs() > bounds.tol[i] {
                settled = false;
            }
            x[i] = trial;
        }

        if settled {
            return Solution {
                status: Status::Converged { iterations: iteration },
                state: x,
                rates: q,
            };
        }
    }

    log::debug!(
        "modified Puls did not converge in {} iterations",
        config.max_iters()
    );
    Solution {
        status: Status::NotConverged,
        state: x,
        rates: q,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn explicit_euler_takes_one_pass() {
        let mut calls = 0;
        let bounds = Bounds::<2>::non_negative(1e-3);

        let solution = solve(&[1.0, 2.0], &[0.0; 2], &bounds, 0.5, &Config::euler(), |x| {
            calls += 1;
            [-x[0], 1.0]
        });

        assert_eq!(calls, 1);
        assert_eq!(solution.status, Status::Converged { iterations: 1 });
        assert_relative_eq!(solution.state[0], 0.5);
        assert_relative_eq!(solution.state[1], 2.5);
        assert_relative_eq!(solution.rates[0], -1.0);
    }

    #[test]
    fn trapezoidal_iteration_converges_on_linear_decay() {
        // dx/dt = -x with omega = 0.5 converges to the Crank-Nicolson update
        // x = x_old (1 - dt/2) / (1 + dt/2) when q_old = -x_old.
        let bounds = Bounds::<1>::non_negative(1e-9);
        let config = Config::new(100, 0.5).unwrap();
        let dt = 0.2;

        let solution = solve(&[1.0], &[-1.0], &bounds, dt, &config, |x| [-x[0]]);

        assert!(solution.status.is_converged());
        assert_relative_eq!(solution.state[0], 0.9 / 1.1, epsilon = 1e-8);
    }

    #[test]
    fn clamps_to_bounds() {
        let bounds = Bounds {
            min: [0.1],
            max: [0.4],
            tol: [1e-3],
        };

        let drained = solve(&[0.2], &[0.0], &bounds, 1.0, &Config::euler(), |_| [-5.0]);
        assert_relative_eq!(drained.state[0], 0.1);

        let filled = solve(&[0.2], &[0.0], &bounds, 1.0, &Config::euler(), |_| [5.0]);
        assert_relative_eq!(filled.state[0], 0.4);
    }

    #[test]
    fn keeps_last_trial_state_when_not_converged() {
        // The rate flips sign with the state, so trapezoidal passes oscillate.
        let bounds = Bounds {
            min: [-10.0],
            max: [10.0],
            tol: [1e-6],
        };
        let config = Config::new(4, 0.5).unwrap();

        let solution = solve(&[0.0], &[0.0], &bounds, 1.0, &config, |x| {
            if x[0] > 0.0 { [-2.0] } else { [2.0] }
        });

        assert_eq!(solution.status, Status::NotConverged);
        assert!(solution.state[0].abs() <= 1.0);
    }
}
