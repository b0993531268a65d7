//! Per-step evaluation of control rules.

mod action_list;

use jiff::civil::DateTime;
use sluice_core::{FlowUnits, Network, RoutingStep, Tables, time::calendar};

use crate::{EngineError, Rule, premise::ControlSignal, variable::StateView};

use action_list::{ActionList, PendingAction};

/// The simulation instant rules are evaluated at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepTime {
    /// Current date-time in decimal days.
    pub now_days: f64,
    /// Elapsed simulation time in decimal days.
    pub elapsed_days: f64,
    /// The routing step about to be taken.
    pub step: RoutingStep,
}

/// A fixed-value action that changed a link's target setting.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionReport {
    pub time: DateTime,
    pub rule: String,
    pub link: String,
    pub value: f64,
}

/// The outcome of evaluating the rules for one step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    /// How many links had their target setting changed.
    pub actions_taken: usize,
    /// Changes made by non-modulated actions, when reporting is enabled.
    pub reports: Vec<ActionReport>,
}

/// Evaluates a fixed set of rules against the network each routing step.
///
/// The controller value and set point published by conditions carry over
/// from rule to rule and from step to step, so a curve or PID action reads
/// whatever the last evaluated condition compared.
#[derive(Debug, Clone)]
pub struct ControlEngine {
    rules: Vec<Rule>,
    actions: ActionList,
    signal: ControlSignal,
    flow_units: FlowUnits,
    report_actions: bool,
}

impl ControlEngine {
    /// Creates an engine over `rules`, evaluated in the given order.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self {
            rules,
            actions: ActionList::default(),
            signal: ControlSignal::default(),
            flow_units: FlowUnits::default(),
            report_actions: false,
        }
    }

    /// Sets the units that flow and volume conditions are written in.
    #[must_use]
    pub fn with_flow_units(mut self, flow_units: FlowUnits) -> Self {
        self.flow_units = flow_units;
        self
    }

    /// Enables [`ActionReport`]s for executed fixed-value actions.
    #[must_use]
    pub fn with_action_reporting(mut self, enabled: bool) -> Self {
        self.report_actions = enabled;
        self
    }

    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Evaluates every rule and applies the winning actions.
    ///
    /// Each rule's premises select its `THEN` or `ELSE` actions, whose values
    /// are resolved before they compete for their link. A link keeps the
    /// action of the highest-priority rule, or of the first rule on a tie.
    /// The survivors are written to the links' target settings; only
    /// settings that actually change are counted.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] if a rule refers to a node, link, curve,
    /// or time series that does not exist, a lookup fails, or the current
    /// time cannot be expressed as a calendar date.
    pub fn evaluate(
        &mut self,
        network: &mut Network,
        tables: &Tables,
        time: StepTime,
    ) -> Result<Evaluation, EngineError> {
        if self.rules.is_empty() {
            return Ok(Evaluation::default());
        }
        self.actions.clear();

        let view = StateView {
            network: &*network,
            flow_units: self.flow_units,
            now_days: time.now_days,
            elapsed_days: time.elapsed_days,
            step_days: time.step.days(),
        };
        for (index, rule) in self.rules.iter_mut().enumerate() {
            let fired = rule.premises_hold(&view, &mut self.signal)?;
            let priority = rule.priority();
            for action in rule.actions_mut(fired) {
                action.update_value(&view, self.signal, tables)?;
                self.actions.offer(
                    action.link(),
                    PendingAction {
                        rule: index,
                        priority,
                        value: action.value(),
                        modulated: action.is_modulated(),
                    },
                );
            }
        }

        self.execute(network, time.now_days)
    }

    fn execute(&self, network: &mut Network, now_days: f64) -> Result<Evaluation, EngineError> {
        let mut evaluation = Evaluation::default();
        for (link_index, pending) in self.actions.iter() {
            let link = network
                .links_mut()
                .get_mut(link_index)
                .ok_or(EngineError::UnknownLink(link_index))?;
            #[allow(clippy::float_cmp)]
            if link.target_setting == pending.value {
                continue;
            }
            link.target_setting = pending.value;
            evaluation.actions_taken += 1;

            let rule = self.rules[pending.rule].name();
            log::debug!(
                "rule {rule} sets link {} to {} at day {now_days}",
                link.name,
                pending.value
            );
            if self.report_actions && !pending.modulated {
                evaluation.reports.push(ActionReport {
                    time: calendar::from_decimal_days(now_days)?,
                    rule: rule.to_owned(),
                    link: link.name.clone(),
                    value: pending.value,
                });
            }
        }
        Ok(evaluation)
    }
}

#[cfg(test)]
mod tests;
