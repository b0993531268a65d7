//! Adaptive Runge-Kutta-Cash-Karp integrator.
//!
//! Each step evaluates the six-stage Cash-Karp tableau, which yields a
//! fifth-order solution and an embedded fourth-order error estimate. The
//! error is scaled per component by `|y| + |h·dy/dx|` so that the target
//! accuracy is relative.
//!
//! ```text
//! errmax = max_i |yerr_i / yscal_i| / accuracy
//! reject (errmax > 1):  h ← max(0.9·h·errmax^-0.25, h/10)
//! accept:               h_next = 0.9·h·errmax^-0.2, at most 5·h
//! ```
//!
//! # Example
//!
//! ```
//! use sluice_solvers::transient::cash_karp::{self, Config};
//!
//! let mut y = [1.0];
//! let config = Config::new(1e-6, 0.1).unwrap();
//! let solution =
//!     cash_karp::solve_unobserved(&mut y, 0.0, 1.0, &config, |_x, y, dydx| dydx[0] = -y[0])
//!         .unwrap();
//!
//! assert!(solution.is_complete());
//! assert!((y[0] - (-1.0_f64).exp()).abs() < 1e-6);
//! ```

mod action;
mod config;
mod error;
mod event;
mod solution;

pub use action::Action;
pub use config::Config;
pub use error::{ConfigError, Error};
pub use event::Event;
pub use solution::{Solution, Status};

use sluice_core::Observer;

const SAFETY: f64 = 0.9;
const PGROW: f64 = -0.2;
const PSHRNK: f64 = -0.25;
/// `(5 / SAFETY)^(1 / PGROW)`: below this error the step grows by the 5× cap.
const ERRCON: f64 = 1.89e-4;
const TINY: f64 = 1.0e-30;

const A2: f64 = 0.2;
const A3: f64 = 0.3;
const A4: f64 = 0.6;
const A5: f64 = 1.0;
const A6: f64 = 0.875;
const B21: f64 = 0.2;
const B31: f64 = 3.0 / 40.0;
const B32: f64 = 9.0 / 40.0;
const B41: f64 = 0.3;
const B42: f64 = -0.9;
const B43: f64 = 1.2;
const B51: f64 = -11.0 / 54.0;
const B52: f64 = 2.5;
const B53: f64 = -70.0 / 27.0;
const B54: f64 = 35.0 / 27.0;
const B61: f64 = 1631.0 / 55296.0;
const B62: f64 = 175.0 / 512.0;
const B63: f64 = 575.0 / 13824.0;
const B64: f64 = 44275.0 / 110_592.0;
const B65: f64 = 253.0 / 4096.0;
const C1: f64 = 37.0 / 378.0;
const C3: f64 = 250.0 / 621.0;
const C4: f64 = 125.0 / 594.0;
const C6: f64 = 512.0 / 1771.0;
const DC1: f64 = C1 - 2825.0 / 27648.0;
const DC3: f64 = C3 - 18575.0 / 48384.0;
const DC4: f64 = C4 - 13525.0 / 55296.0;
const DC5: f64 = -277.0 / 14336.0;
const DC6: f64 = C6 - 0.25;

/// Integrates `y` from `x1` to `x2`.
///
/// `derivs(x, y, dydx)` must fill `dydx` with the derivatives at `(x, y)`.
/// It is called with slices of the same length as `y`.
///
/// On [`Status::Complete`] or [`Status::StoppedByObserver`], `y` holds the
/// state at [`Solution::x`]. On the failure statuses `y` is left unchanged.
///
/// # Observer
///
/// The observer receives an [`Event`] after each accepted step and may
/// return [`Action::StopEarly`].
///
/// # Errors
///
/// Returns an error if the interval or the initial state is not finite.
pub fn solve<F, Obs>(
    y: &mut [f64],
    x1: f64,
    x2: f64,
    config: &Config,
    mut derivs: F,
    mut observer: Obs,
) -> Result<Solution, Error>
where
    F: FnMut(f64, &[f64], &mut [f64]),
    Obs: for<'a> Observer<Event<'a>, Action>,
{
    if !x1.is_finite() || !x2.is_finite() {
        return Err(Error::NonFiniteInterval { x1, x2 });
    }
    if let Some(index) = y.iter().position(|v| !v.is_finite()) {
        return Err(Error::NonFiniteState { index });
    }

    let mut stepper = Stepper::new(y);
    let direction = if x2 >= x1 { 1.0 } else { -1.0 };
    let mut x = x1;
    let mut h = direction * config.initial_step();
    let mut rejected = 0;

    #[allow(clippy::float_cmp)]
    if x1 == x2 {
        return Ok(Solution {
            status: Status::Complete,
            x,
            steps: 0,
            rejected,
            h_next: h,
        });
    }

    for step in 1..=config.max_steps() {
        derivs(x, &stepper.y, &mut stepper.dydx);
        for i in 0..stepper.y.len() {
            stepper.yscal[i] = stepper.y[i].abs() + (stepper.dydx[i] * h).abs() + TINY;
        }

        // Don't step past the end of the interval.
        if (x + h - x2) * (x + h - x1) > 0.0 {
            h = x2 - x;
        }

        let Some(taken) = stepper.quality_step(&mut x, h, config.accuracy(), &mut derivs) else {
            log::debug!("cash-karp step size underflow at x = {x}");
            return Ok(Solution {
                status: Status::StepSizeUnderflow,
                x,
                steps: step - 1,
                rejected: rejected + stepper.rejected,
                h_next: 0.0,
            });
        };
        rejected += std::mem::take(&mut stepper.rejected);

        let event = Event {
            step,
            x,
            h: taken.h_did,
            y: &stepper.y,
        };
        let stop = matches!(observer.observe(&event), Some(Action::StopEarly));

        if stop || (x - x2) * (x2 - x1) >= 0.0 {
            y.copy_from_slice(&stepper.y);
            return Ok(Solution {
                status: if stop {
                    Status::StoppedByObserver
                } else {
                    Status::Complete
                },
                x,
                steps: step,
                rejected,
                h_next: taken.h_next,
            });
        }

        if taken.h_next.abs() <= 0.0 || !taken.h_next.is_finite() {
            log::debug!("cash-karp proposed a non-positive step at x = {x}");
            return Ok(Solution {
                status: Status::StepSizeUnderflow,
                x,
                steps: step,
                rejected,
                h_next: taken.h_next,
            });
        }
        h = taken.h_next;
    }

    log::debug!(
        "cash-karp exceeded {} steps before reaching x = {x2}",
        config.max_steps()
    );
    Ok(Solution {
        status: Status::MaxStepsExceeded,
        x,
        steps: config.max_steps(),
        rejected,
        h_next: h,
    })
}

/// Integrates `y` from `x1` to `x2` without observation.
///
/// # Errors
///
/// Returns an error if the interval or the initial state is not finite.
pub fn solve_unobserved<F>(
    y: &mut [f64],
    x1: f64,
    x2: f64,
    config: &Config,
    derivs: F,
) -> Result<Solution, Error>
where
    F: FnMut(f64, &[f64], &mut [f64]),
{
    solve(y, x1, x2, config, derivs, ())
}

/// Step sizes from an accepted quality-controlled step.
struct Taken {
    h_did: f64,
    h_next: f64,
}

/// Work buffers for one integration, sized to the state.
struct Stepper {
    y: Vec<f64>,
    dydx: Vec<f64>,
    yscal: Vec<f64>,
    ytemp: Vec<f64>,
    yerr: Vec<f64>,
    ak: [Vec<f64>; 5],
    rejected: usize,
}

impl Stepper {
    fn new(y: &[f64]) -> Self {
        let n = y.len();
        Self {
            y: y.to_vec(),
            dydx: vec![0.0; n],
            yscal: vec![0.0; n],
            ytemp: vec![0.0; n],
            yerr: vec![0.0; n],
            ak: std::array::from_fn(|_| vec![0.0; n]),
            rejected: 0,
        }
    }

    /// Takes one step of at most `h`, shrinking it until the error is
    /// acceptable. Returns `None` if the step underflows.
    fn quality_step<F>(&mut self, x: &mut f64, mut h: f64, accuracy: f64, derivs: &mut F) -> Option<Taken>
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        let x_old = *x;
        loop {
            self.cash_karp_step(x_old, h, derivs);

            let errmax = self
                .yerr
                .iter()
                .zip(&self.yscal)
                .map(|(err, scale)| (err / scale).abs())
                .fold(0.0, |worst: f64, e| if e.is_nan() || e > worst { e } else { worst })
                / accuracy;

            if errmax.is_finite() && errmax <= 1.0 {
                let h_next = if errmax > ERRCON {
                    SAFETY * h * errmax.powf(PGROW)
                } else {
                    5.0 * h
                };
                *x = x_old + h;
                std::mem::swap(&mut self.y, &mut self.ytemp);
                return Some(Taken { h_did: h, h_next });
            }

            self.rejected += 1;
            let shrunk = if errmax.is_finite() {
                SAFETY * h * errmax.powf(PSHRNK)
            } else {
                0.1 * h
            };
            h = if h >= 0.0 {
                shrunk.max(0.1 * h)
            } else {
                shrunk.min(0.1 * h)
            };

            #[allow(clippy::float_cmp)]
            if x_old + h == x_old {
                return None;
            }
        }
    }

    /// Evaluates the Cash-Karp tableau from `(x, y)` with step `h`, filling
    /// `ytemp` with the fifth-order solution and `yerr` with the error estimate.
    fn cash_karp_step<F>(&mut self, x: f64, h: f64, derivs: &mut F)
    where
        F: FnMut(f64, &[f64], &mut [f64]),
    {
        let n = self.y.len();
        let (y, dydx, ytemp) = (&self.y, &self.dydx, &mut self.ytemp);
        let [ak2, ak3, ak4, ak5, ak6] = &mut self.ak;

        for i in 0..n {
            ytemp[i] = y[i] + B21 * h * dydx[i];
        }
        derivs(x + A2 * h, ytemp, ak2);
        for i in 0..n {
            ytemp[i] = y[i] + h * (B31 * dydx[i] + B32 * ak2[i]);
        }
        derivs(x + A3 * h, ytemp, ak3);
        for i in 0..n {
            ytemp[i] = y[i] + h * (B41 * dydx[i] + B42 * ak2[i] + B43 * ak3[i]);
        }
        derivs(x + A4 * h, ytemp, ak4);
        for i in 0..n {
            ytemp[i] = y[i] + h * (B51 * dydx[i] + B52 * ak2[i] + B53 * ak3[i] + B54 * ak4[i]);
        }
        derivs(x + A5 * h, ytemp, ak5);
        for i in 0..n {
            ytemp[i] = y[i]
                + h * (B61 * dydx[i] + B62 * ak2[i] + B63 * ak3[i] + B64 * ak4[i] + B65 * ak5[i]);
        }
        derivs(x + A6 * h, ytemp, ak6);
        for i in 0..n {
            ytemp[i] = y[i] + h * (C1 * dydx[i] + C3 * ak3[i] + C4 * ak4[i] + C6 * ak6[i]);
            self.yerr[i] = h
                * (DC1 * dydx[i] + DC3 * ak3[i] + DC4 * ak4[i] + DC5 * ak5[i] + DC6 * ak6[i]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn decay(_x: f64, y: &[f64], dydx: &mut [f64]) {
        dydx[0] = -y[0];
    }

    #[test]
    fn exponential_decay_matches_analytic_solution() {
        let mut y = [1.0];
        let config = Config::new(1e-6, 0.01).unwrap();

        let solution = solve_unobserved(&mut y, 0.0, 5.0, &config, decay).unwrap();

        assert_eq!(solution.status, Status::Complete);
        assert_relative_eq!(solution.x, 5.0);
        assert_abs_diff_eq!(y[0], (-5.0_f64).exp(), epsilon = 1e-4);
    }

    #[test]
    fn harmonic_oscillator_conserves_phase() {
        // y0' = y1, y1' = -y0 with y(0) = (0, 1) gives y0 = sin(x).
        let mut y = [0.0, 1.0];
        let config = Config::new(1e-8, 0.1).unwrap();

        let solution = solve_unobserved(&mut y, 0.0, std::f64::consts::PI, &config, |_, y, dydx| {
            dydx[0] = y[1];
            dydx[1] = -y[0];
        })
        .unwrap();

        assert!(solution.is_complete());
        assert_abs_diff_eq!(y[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(y[1], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn integrates_backwards() {
        let mut y = [(-2.0_f64).exp()];
        let config = Config::new(1e-8, 0.05).unwrap();

        let solution = solve_unobserved(&mut y, 2.0, 0.0, &config, decay).unwrap();

        assert!(solution.is_complete());
        assert_abs_diff_eq!(y[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn empty_interval_is_complete_without_steps() {
        let mut y = [3.0];
        let config = Config::new(1e-6, 0.1).unwrap();

        let solution = solve_unobserved(&mut y, 1.0, 1.0, &config, decay).unwrap();

        assert_eq!(solution.steps, 0);
        assert_relative_eq!(y[0], 3.0);
    }

    #[test]
    fn reports_max_steps_and_leaves_state_untouched() {
        let mut y = [1.0];
        let config = Config::new(1e-10, 1e-3)
            .unwrap()
            .with_max_steps(3)
            .unwrap();

        let solution = solve_unobserved(&mut y, 0.0, 100.0, &config, decay).unwrap();

        assert_eq!(solution.status, Status::MaxStepsExceeded);
        assert_eq!(solution.steps, 3);
        assert_relative_eq!(y[0], 1.0);
    }

    #[test]
    fn reports_step_size_underflow() {
        // A derivative that is NaN away from the start can never satisfy the
        // error test, so the step shrinks until it stops advancing x.
        let mut y = [1.0];
        let config = Config::new(1e-6, 0.5).unwrap();

        let solution = solve_unobserved(&mut y, 0.0, 1.0, &config, |x, _y, dydx| {
            dydx[0] = if x > 0.0 { f64::NAN } else { 1.0 };
        })
        .unwrap();

        assert_eq!(solution.status, Status::StepSizeUnderflow);
        assert_relative_eq!(y[0], 1.0);
    }

    #[test]
    fn observer_can_stop_early() {
        let mut y = [1.0];
        let config = Config::new(1e-6, 0.01).unwrap();
        let mut seen = Vec::new();

        let solution = solve(&mut y, 0.0, 5.0, &config, decay, |event: &Event<'_>| {
            seen.push(event.step);
            (event.step == 3).then_some(Action::StopEarly)
        })
        .unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(seen, vec![1, 2, 3]);
        assert!(solution.x < 5.0);
        assert_abs_diff_eq!(y[0], (-solution.x).exp(), epsilon = 1e-6);
    }

    #[test]
    fn rejects_invalid_inputs() {
        let config = Config::new(1e-6, 0.1).unwrap();
        assert_eq!(
            solve_unobserved(&mut [f64::NAN], 0.0, 1.0, &config, decay),
            Err(Error::NonFiniteState { index: 0 })
        );
        assert!(solve_unobserved(&mut [1.0], 0.0, f64::INFINITY, &config, decay).is_err());
        assert_eq!(Config::new(0.0, 0.1), Err(ConfigError::Accuracy));
        assert_eq!(Config::new(1e-6, -1.0), Err(ConfigError::InitialStep));
    }
}
