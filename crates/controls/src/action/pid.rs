use sluice_core::TINY;

use crate::premise::ControlSignal;

/// Error changes and setting updates smaller than this are treated as zero.
const TOLERANCE: f64 = 1.0e-4;

/// A PID controller in recursive (velocity) form.
///
/// Each update adds `kp (p + i + d)` to the link's current target setting,
/// where the terms are built from the relative error between the set point
/// and the controlled value at the last three evaluations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pid {
    kp: f64,
    /// Integral time (minutes).
    ki: f64,
    /// Derivative time (minutes).
    kd: f64,
    e1: f64,
    e2: f64,
}

impl Pid {
    /// Creates a controller with gain `kp` and integral and derivative
    /// times `ki` and `kd` in minutes. An integral time of zero disables
    /// the integral term.
    #[must_use]
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self {
            kp,
            ki,
            kd,
            e1: 0.0,
            e2: 0.0,
        }
    }

    #[must_use]
    pub fn gains(&self) -> (f64, f64, f64) {
        (self.kp, self.ki, self.kd)
    }

    /// Returns the errors from the previous two updates, newest first.
    #[must_use]
    pub fn errors(&self) -> (f64, f64) {
        (self.e1, self.e2)
    }

    /// Returns the next setting for a link currently targeting `current`.
    ///
    /// The result is never negative, and is capped at 1 unless the link is
    /// a pump.
    pub(crate) fn next_setting(
        &mut self,
        current: f64,
        is_pump: bool,
        signal: ControlSignal,
        step_days: f64,
    ) -> f64 {
        let dt = step_days * 1440.0;

        let mut e0 = signal.set_point - signal.value;
        if e0.abs() > TINY {
            e0 /= if signal.set_point == 0.0 {
                signal.value
            } else {
                signal.set_point
            };
        }

        // A stalled error resets the controller's memory.
        if (e0 - self.e1).abs() < TOLERANCE {
            self.e1 = 0.0;
            self.e2 = 0.0;
        }

        let p = e0 - self.e1;
        let i = if self.ki == 0.0 { 0.0 } else { e0 * dt / self.ki };
        let d = self.kd * (e0 - 2.0 * self.e1 + self.e2) / dt;
        let mut update = self.kp * (p + i + d);
        if update.abs() < TOLERANCE {
            update = 0.0;
        }

        self.e2 = self.e1;
        self.e1 = e0;

        let setting = (current + update).max(0.0);
        if is_pump { setting } else { setting.min(1.0) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    const FIVE_MINUTES: f64 = 5.0 / 1440.0;

    fn signal(value: f64, set_point: f64) -> ControlSignal {
        ControlSignal { value, set_point }
    }

    #[test]
    fn proportional_step_toward_set_point() {
        let mut pid = Pid::new(1.0, 0.0, 0.0);

        // Depth 3 against a set point of 2 closes a half-open gate.
        let setting = pid.next_setting(0.5, false, signal(3.0, 2.0), FIVE_MINUTES);
        assert_relative_eq!(setting, 0.0);
        assert_relative_eq!(pid.errors().0, -0.5);
    }

    #[test]
    fn integral_term_scales_with_step() {
        let mut pid = Pid::new(0.5, 10.0, 0.0);

        // e0 = 0.2, p = 0.2, i = 0.2 * 5 / 10 = 0.1
        let setting = pid.next_setting(0.2, false, signal(0.8, 1.0), FIVE_MINUTES);
        assert_relative_eq!(setting, 0.2 + 0.5 * 0.3, epsilon = 1e-12);
    }

    #[test]
    fn zero_set_point_normalizes_by_value() {
        let mut pid = Pid::new(1.0, 0.0, 0.0);
        let setting = pid.next_setting(1.0, true, signal(4.0, 0.0), FIVE_MINUTES);

        // e0 = -4 / 4
        assert_relative_eq!(setting, 0.0);
        assert_relative_eq!(pid.errors().0, -1.0);
    }

    #[test]
    fn pumps_are_not_capped_at_one() {
        let mut gate = Pid::new(2.0, 0.0, 0.0);
        let mut pump = Pid::new(2.0, 0.0, 0.0);

        let low = signal(1.0, 2.0);
        assert_relative_eq!(gate.next_setting(0.9, false, low, FIVE_MINUTES), 1.0);
        assert_relative_eq!(pump.next_setting(0.9, true, low, FIVE_MINUTES), 1.9);
    }

    #[test]
    fn stalled_error_resets_memory() {
        let mut pid = Pid::new(1.0, 0.0, 1.0);
        let steady = signal(1.5, 2.0);

        pid.next_setting(0.5, false, steady, FIVE_MINUTES);
        assert_eq!(pid.errors(), (0.25, 0.0));

        // Same error again: the memory resets, so p = e0 and d is based
        // on e0 alone.
        let setting = pid.next_setting(0.5, false, steady, FIVE_MINUTES);
        assert_relative_eq!(setting, (0.5_f64 + 0.25 + 0.25 / 5.0).min(1.0));
        assert_eq!(pid.errors(), (0.25, 0.0));
    }
}
