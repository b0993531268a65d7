//! Changes a rule makes to a link's status or setting.

mod pid;

use sluice_core::{LinkKind, Network, Tables};

use crate::{
    Attribute, EngineError, Object, RuleError, premise::ControlSignal, variable::StateView,
};

pub use pid::Pid;

/// How an action's new value is determined.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Setting {
    /// A fixed status or setting.
    Value(f64),
    /// A curve, by index, of setting versus the controller value.
    Curve(usize),
    /// A time series, by index, of setting versus date-time.
    TimeSeries(usize),
    /// A PID controller driving the controller value to its set point.
    Pid(Pid),
}

/// A change to one link's status or setting.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    link: usize,
    setting: Setting,
    value: f64,
}

impl Action {
    /// Creates an action on the link at index `link`.
    ///
    /// `object` must name the link's kind; the generic `LINK` keyword is
    /// only valid in conditions. Conduits take a status of 0 (closed) or 1
    /// (open). Pumps take a status of 0 (off) or 1 (on), or any setting.
    /// Orifices, weirs, and outlets take a setting, which must lie in
    /// `[0, 1]` when fixed.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleError`] if the link does not exist, `object` is not a
    /// controllable link kind or does not match the link, the attribute is
    /// wrong for the link, or a fixed value is out of range.
    pub fn new(
        network: &Network,
        object: Object,
        link: usize,
        attribute: Attribute,
        setting: Setting,
    ) -> Result<Self, RuleError> {
        let target = network.link(link).ok_or(RuleError::UnknownLink(link))?;
        if !object.is_link() || object == Object::Link {
            return Err(RuleError::NotControllable(object));
        }
        if !object.matches(&target.kind) {
            return Err(RuleError::WrongLinkKind {
                link: target.name.clone(),
                object,
            });
        }

        let invalid = RuleError::InvalidAttribute { object, attribute };
        match (target.kind, attribute) {
            (LinkKind::Conduit { .. } | LinkKind::Pump { .. }, Attribute::Status) => {
                match setting {
                    Setting::Value(status) if status == 0.0 || status == 1.0 => {}
                    Setting::Value(status) => return Err(RuleError::InvalidStatus(status)),
                    _ => return Err(invalid),
                }
            }
            (LinkKind::Pump { .. }, Attribute::Setting) => {}
            (LinkKind::Orifice | LinkKind::Weir | LinkKind::Outlet, Attribute::Setting) => {
                if let Setting::Value(value) = setting {
                    if !(0.0..=1.0).contains(&value) {
                        return Err(RuleError::SettingOutOfRange(value));
                    }
                }
            }
            _ => return Err(invalid),
        }

        let value = match setting {
            Setting::Value(value) => value,
            _ => 0.0,
        };
        Ok(Self {
            link,
            setting,
            value,
        })
    }

    #[must_use]
    pub fn link(&self) -> usize {
        self.link
    }

    #[must_use]
    pub fn setting(&self) -> &Setting {
        &self.setting
    }

    /// Returns the value most recently resolved for this action.
    #[must_use]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Returns `true` if the value is recomputed each step rather than fixed.
    #[must_use]
    pub fn is_modulated(&self) -> bool {
        !matches!(self.setting, Setting::Value(_))
    }

    /// Recomputes a modulated action's value for the current step.
    pub(crate) fn update_value(
        &mut self,
        view: &StateView<'_>,
        signal: ControlSignal,
        tables: &Tables,
    ) -> Result<(), EngineError> {
        match &mut self.setting {
            Setting::Value(_) => {}
            Setting::Curve(index) => {
                let curve = tables
                    .curve(*index)
                    .ok_or(EngineError::UnknownCurve(*index))?;
                self.value = curve.lookup(signal.value)?;
            }
            Setting::TimeSeries(index) => {
                let series = tables
                    .series(*index)
                    .ok_or(EngineError::UnknownSeries(*index))?;
                self.value = series.value_at(view.now_days)?;
            }
            Setting::Pid(pid) => {
                let link = view.link(self.link)?;
                self.value =
                    pid.next_setting(link.target_setting, link.is_pump(), signal, view.step_days);
            }
        }
        Ok(())
    }
}
