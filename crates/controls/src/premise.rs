//! Conditions tested by a rule's IF, AND, and OR clauses.

use crate::{Attribute, EngineError, Variable, variable::StateView};

/// A relational operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl Relation {
    /// Looks up an operator symbol: `=`, `<>`, `<`, `<=`, `>`, or `>=`.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "=" => Some(Self::Eq),
            "<>" => Some(Self::Ne),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            _ => None,
        }
    }

    /// Tests `lhs <op> rhs` exactly.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn holds(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
        }
    }

    /// Tests a relation between two times, treating times within
    /// `[rhs - half_step, rhs + half_step)` as equal.
    #[must_use]
    pub fn holds_within(self, lhs: f64, rhs: f64, half_step: f64) -> bool {
        let within = lhs >= rhs - half_step && lhs < rhs + half_step;
        match self {
            Self::Eq => within,
            Self::Ne => !within,
            _ => self.holds(lhs, rhs),
        }
    }
}

/// The right-hand side of a condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Value(f64),
    Variable(Variable),
}

/// The controller value and set point published by the most recently
/// evaluated condition, read by curve and PID actions.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct ControlSignal {
    pub value: f64,
    pub set_point: f64,
}

/// A comparison such as `NODE Wet DEPTH > 5`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    lhs: Variable,
    relation: Relation,
    rhs: Operand,
}

impl Condition {
    #[must_use]
    pub fn new(lhs: Variable, relation: Relation, rhs: Operand) -> Self {
        Self { lhs, relation, rhs }
    }

    /// Compares a variable against a fixed value.
    #[must_use]
    pub fn value(lhs: Variable, relation: Relation, rhs: f64) -> Self {
        Self::new(lhs, relation, Operand::Value(rhs))
    }

    #[must_use]
    pub fn lhs(&self) -> &Variable {
        &self.lhs
    }

    #[must_use]
    pub fn relation(&self) -> Relation {
        self.relation
    }

    #[must_use]
    pub fn rhs(&self) -> &Operand {
        &self.rhs
    }

    /// Evaluates the condition, publishing the compared values to `signal`.
    ///
    /// A condition on an undefined value is false and publishes nothing.
    pub(crate) fn evaluate(
        &self,
        view: &StateView<'_>,
        signal: &mut ControlSignal,
    ) -> Result<bool, EngineError> {
        let Some(lhs) = self.lhs.value(view)? else {
            return Ok(false);
        };
        let rhs = match &self.rhs {
            Operand::Value(value) => Some(*value),
            Operand::Variable(variable) => variable.value(view)?,
        };
        let Some(rhs) = rhs else {
            return Ok(false);
        };

        let half_step = view.step_days / 2.0;
        let attribute = self.lhs.attribute();
        if !attribute.is_time() {
            *signal = ControlSignal {
                value: lhs,
                set_point: rhs,
            };
            return Ok(self.relation.holds(lhs, rhs));
        }

        // Ordering comparisons on times publish like any other value.
        if !matches!(self.relation, Relation::Eq | Relation::Ne) {
            *signal = ControlSignal {
                value: lhs,
                set_point: rhs,
            };
        }
        let result = self.relation.holds_within(lhs, rhs, half_step);
        if matches!(attribute, Attribute::TimeOpen | Attribute::TimeClosed) {
            // Link timers drive controllers in hours.
            signal.value = lhs * 24.0;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use sluice_core::{FlowUnits, Link, LinkKind, Network, Node, NodeKind};

    use crate::Object;

    fn network() -> Network {
        let mut gate = Link::new("G1", LinkKind::Orifice, 0, 1).with_setting(0.5);
        gate.time_last_set = 10.0;
        Network::new(
            vec![
                Node::new("A", NodeKind::Junction).with_depth(3.0),
                Node::new("B", NodeKind::Junction).with_depth(4.0),
            ],
            vec![gate],
        )
        .unwrap()
    }

    fn view(network: &Network) -> StateView<'_> {
        StateView {
            network,
            flow_units: FlowUnits::Cfs,
            now_days: 10.5,
            elapsed_days: 0.5,
            // One hour.
            step_days: 1.0 / 24.0,
        }
    }

    #[test]
    fn operators() {
        assert_eq!(Relation::from_symbol("<>"), Some(Relation::Ne));
        assert_eq!(Relation::from_symbol("=>"), None);
        assert!(Relation::Le.holds(2.0, 2.0));
        assert!(!Relation::Lt.holds(2.0, 2.0));
        assert!(Relation::Ne.holds(1.0, 2.0));
    }

    #[test]
    fn time_equality_uses_a_half_step_window() {
        let half = 0.5;
        assert!(Relation::Eq.holds_within(9.5, 10.0, half));
        assert!(Relation::Eq.holds_within(10.49, 10.0, half));
        assert!(!Relation::Eq.holds_within(10.5, 10.0, half));
        assert!(Relation::Ne.holds_within(10.5, 10.0, half));
        assert!(Relation::Gt.holds_within(10.1, 10.0, half));
    }

    #[test]
    fn publishes_compared_values() {
        let network = network();
        let view = view(&network);
        let mut signal = ControlSignal::default();

        let depth = Variable::node(0, Attribute::Depth).unwrap();
        let condition = Condition::value(depth, Relation::Gt, 2.0);
        assert!(condition.evaluate(&view, &mut signal).unwrap());
        assert_eq!(
            signal,
            ControlSignal {
                value: 3.0,
                set_point: 2.0
            }
        );
    }

    #[test]
    fn compares_two_variables() {
        let network = network();
        let view = view(&network);
        let mut signal = ControlSignal::default();

        let a = Variable::node(0, Attribute::Depth).unwrap();
        let b = Variable::node(1, Attribute::Depth).unwrap();
        let condition = Condition::new(a, Relation::Lt, Operand::Variable(b));
        assert!(condition.evaluate(&view, &mut signal).unwrap());
        assert_relative_eq!(signal.set_point, 4.0);
    }

    #[test]
    fn clock_time_matches_within_half_a_step() {
        let network = network();
        let view = view(&network);
        let mut signal = ControlSignal::default();

        let clock = Variable::simulation(Attribute::ClockTime).unwrap();
        let noon = Condition::value(clock, Relation::Eq, 0.5 + 0.4 / 24.0);
        let one_pm = Condition::value(clock, Relation::Eq, 0.5 + 1.0 / 24.0);
        assert!(noon.evaluate(&view, &mut signal).unwrap());
        assert!(!one_pm.evaluate(&view, &mut signal).unwrap());
        assert_eq!(signal, ControlSignal::default());
    }

    #[test]
    fn time_open_publishes_hours() {
        let network = network();
        let view = view(&network);
        let mut signal = ControlSignal::default();

        let open = Variable::link(Object::Orifice, 0, Attribute::TimeOpen).unwrap();
        let condition = Condition::value(open, Relation::Ge, 0.25);
        assert!(condition.evaluate(&view, &mut signal).unwrap());
        assert_relative_eq!(signal.value, 12.0);
        assert_relative_eq!(signal.set_point, 0.25);

        let closed = Variable::link(Object::Orifice, 0, Attribute::TimeClosed).unwrap();
        let condition = Condition::value(closed, Relation::Ge, 0.0);
        assert!(!condition.evaluate(&view, &mut signal).unwrap());
    }
}
