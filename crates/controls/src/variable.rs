//! Quantities a rule premise can test.

use std::fmt;

use sluice_core::{FlowUnits, Link, LinkKind, Network, Node, time::calendar};

use crate::{EngineError, RuleError};

/// The kinds of object a rule clause can name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Object {
    Node,
    /// Any link, regardless of its kind.
    Link,
    Conduit,
    Pump,
    Orifice,
    Weir,
    Outlet,
    Simulation,
}

impl Object {
    const WORDS: [(&'static str, Self); 8] = [
        ("NODE", Self::Node),
        ("LINK", Self::Link),
        ("CONDUIT", Self::Conduit),
        ("PUMP", Self::Pump),
        ("ORIFICE", Self::Orifice),
        ("WEIR", Self::Weir),
        ("OUTLET", Self::Outlet),
        ("SIMULATION", Self::Simulation),
    ];

    /// Looks up an object keyword, ignoring case.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        find_word(&Self::WORDS, word)
    }

    /// Returns `true` for the link object kinds.
    #[must_use]
    pub fn is_link(self) -> bool {
        !matches!(self, Self::Node | Self::Simulation)
    }

    /// Returns `true` if `kind` is a link this object may name.
    #[must_use]
    pub fn matches(self, kind: &LinkKind) -> bool {
        match self {
            Self::Link => true,
            Self::Conduit => matches!(kind, LinkKind::Conduit { .. }),
            Self::Pump => matches!(kind, LinkKind::Pump { .. }),
            Self::Orifice => matches!(kind, LinkKind::Orifice),
            Self::Weir => matches!(kind, LinkKind::Weir),
            Self::Outlet => matches!(kind, LinkKind::Outlet),
            Self::Node | Self::Simulation => false,
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(word_of(&Self::WORDS, *self))
    }
}

/// An attribute of a node, link, or the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    Depth,
    Head,
    Volume,
    Inflow,
    Flow,
    Status,
    Setting,
    /// Time since a link was last opened.
    TimeOpen,
    /// Time since a link was last closed.
    TimeClosed,
    /// Elapsed simulation time.
    Time,
    Date,
    /// Time of day.
    ClockTime,
    DayOfYear,
    /// Day of week, with Sunday = 1.
    Day,
    Month,
}

impl Attribute {
    const WORDS: [(&'static str, Self); 15] = [
        ("DEPTH", Self::Depth),
        ("HEAD", Self::Head),
        ("VOLUME", Self::Volume),
        ("INFLOW", Self::Inflow),
        ("FLOW", Self::Flow),
        ("STATUS", Self::Status),
        ("SETTING", Self::Setting),
        ("TIMEOPEN", Self::TimeOpen),
        ("TIMECLOSED", Self::TimeClosed),
        ("TIME", Self::Time),
        ("DATE", Self::Date),
        ("CLOCKTIME", Self::ClockTime),
        ("DAYOFYEAR", Self::DayOfYear),
        ("DAY", Self::Day),
        ("MONTH", Self::Month),
    ];

    /// Looks up an attribute keyword, ignoring case.
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        find_word(&Self::WORDS, word)
    }

    /// Returns `true` if this attribute may be tested on `object`.
    #[must_use]
    pub fn is_valid_for(self, object: Object) -> bool {
        use Attribute as A;
        match object {
            Object::Node => matches!(self, A::Depth | A::Head | A::Volume | A::Inflow),
            _ if object.is_link() && matches!(self, A::TimeOpen | A::TimeClosed) => true,
            Object::Link | Object::Conduit => matches!(self, A::Status | A::Depth | A::Flow),
            Object::Pump => matches!(self, A::Status | A::Flow),
            Object::Orifice | Object::Weir | Object::Outlet => self == A::Setting,
            Object::Simulation => matches!(
                self,
                A::Time | A::Date | A::ClockTime | A::Day | A::Month | A::DayOfYear
            ),
        }
    }

    /// Returns `true` for attributes compared with a half-step time window.
    #[must_use]
    pub fn is_time(self) -> bool {
        matches!(
            self,
            Self::Time | Self::ClockTime | Self::TimeOpen | Self::TimeClosed
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(word_of(&Self::WORDS, *self))
    }
}

/// What a variable is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Node(usize),
    Link(usize),
    Simulation,
}

/// An attribute of a specific node, link, or the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Variable {
    subject: Subject,
    attribute: Attribute,
}

impl Variable {
    /// Creates a node variable, such as the depth at node 3.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidAttribute`] if nodes have no such attribute.
    pub fn node(index: usize, attribute: Attribute) -> Result<Self, RuleError> {
        Self::checked(Object::Node, Subject::Node(index), attribute)
    }

    /// Creates a link variable.
    ///
    /// The `object` keyword only restricts which attributes are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidAttribute`] if `object` is not a link
    /// object or has no such attribute.
    pub fn link(object: Object, index: usize, attribute: Attribute) -> Result<Self, RuleError> {
        if !object.is_link() {
            return Err(RuleError::InvalidAttribute { object, attribute });
        }
        Self::checked(object, Subject::Link(index), attribute)
    }

    /// Creates a simulation clock variable.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::InvalidAttribute`] if the clock has no such attribute.
    pub fn simulation(attribute: Attribute) -> Result<Self, RuleError> {
        Self::checked(Object::Simulation, Subject::Simulation, attribute)
    }

    fn checked(object: Object, subject: Subject, attribute: Attribute) -> Result<Self, RuleError> {
        if attribute.is_valid_for(object) {
            Ok(Self { subject, attribute })
        } else {
            Err(RuleError::InvalidAttribute { object, attribute })
        }
    }

    #[must_use]
    pub fn subject(&self) -> Subject {
        self.subject
    }

    #[must_use]
    pub fn attribute(&self) -> Attribute {
        self.attribute
    }

    /// Reads the variable's current value in user units.
    ///
    /// Returns `None` when the value is undefined, such as the time open of
    /// a closed link or the status of a weir.
    pub(crate) fn value(&self, view: &StateView<'_>) -> Result<Option<f64>, EngineError> {
        use Attribute as A;

        let length = view.flow_units.unit_system().length();
        let volume = view.flow_units.unit_system().volume();
        let flow = view.flow_units.factor();

        let value = match (self.subject, self.attribute) {
            (Subject::Simulation, attribute) => Some(view.clock_value(attribute)?),

            (Subject::Node(i), attribute) => {
                let node = view.node(i)?;
                match attribute {
                    A::Depth => Some(node.new_depth * length),
                    A::Head => Some(node.head() * length),
                    A::Volume => Some(node.new_volume * volume),
                    A::Inflow => Some(node.new_lat_flow * flow),
                    _ => None,
                }
            }

            (Subject::Link(j), attribute) => {
                let link = view.link(j)?;
                match attribute {
                    A::Status => match link.kind {
                        LinkKind::Conduit { .. } | LinkKind::Pump { .. } => Some(link.setting),
                        _ => None,
                    },
                    A::Setting => match link.kind {
                        LinkKind::Orifice | LinkKind::Weir | LinkKind::Outlet => {
                            Some(link.setting)
                        }
                        _ => None,
                    },
                    A::Flow => Some(link.direction * link.new_flow * flow),
                    A::Depth => Some(link.new_depth * length),
                    A::TimeOpen if link.setting > 0.0 => Some(view.now_days - link.time_last_set),
                    A::TimeClosed if link.setting <= 0.0 => {
                        Some(view.now_days - link.time_last_set)
                    }
                    _ => None,
                }
            }
        };
        Ok(value)
    }
}

/// A read-only view of the state rules are evaluated against.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StateView<'a> {
    pub network: &'a Network,
    pub flow_units: FlowUnits,
    /// Current date-time in decimal days.
    pub now_days: f64,
    /// Elapsed simulation time in decimal days.
    pub elapsed_days: f64,
    /// Current routing step in decimal days.
    pub step_days: f64,
}

impl StateView<'_> {
    fn node(&self, index: usize) -> Result<&Node, EngineError> {
        self.network
            .node(index)
            .ok_or(EngineError::UnknownNode(index))
    }

    pub(crate) fn link(&self, index: usize) -> Result<&Link, EngineError> {
        self.network
            .link(index)
            .ok_or(EngineError::UnknownLink(index))
    }

    fn clock_value(&self, attribute: Attribute) -> Result<f64, EngineError> {
        let date = self.now_days.floor();
        Ok(match attribute {
            Attribute::Time => self.elapsed_days,
            Attribute::Date => date,
            Attribute::ClockTime => self.now_days - date,
            Attribute::Day => f64::from(calendar::day_of_week(date)?),
            Attribute::Month => f64::from(calendar::month_of_year(date)?),
            Attribute::DayOfYear => f64::from(calendar::day_of_year(date)?),
            _ => f64::NAN,
        })
    }
}

fn find_word<T: Copy>(words: &[(&str, T)], word: &str) -> Option<T> {
    words
        .iter()
        .find(|(keyword, _)| keyword.eq_ignore_ascii_case(word))
        .map(|&(_, value)| value)
}

fn word_of<T: Copy + PartialEq>(words: &[(&'static str, T)], value: T) -> &'static str {
    words
        .iter()
        .find(|&&(_, v)| v == value)
        .map_or("?", |&(keyword, _)| keyword)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use sluice_core::NodeKind;

    fn network() -> Network {
        let mut wet = Node::new("Wet", NodeKind::Storage)
            .with_invert(10.0)
            .with_depth(2.0);
        wet.new_volume = 500.0;
        wet.new_lat_flow = 1.5;

        let mut weir = Link::new("W1", LinkKind::Weir, 0, 1).with_setting(0.0);
        weir.time_last_set = 100.0;

        Network::new(
            vec![wet, Node::new("Out", NodeKind::Outfall { routes_to: None })],
            vec![weir, Link::new("P1", LinkKind::pump(), 0, 1)],
        )
        .unwrap()
    }

    fn view(network: &Network, flow_units: FlowUnits) -> StateView<'_> {
        StateView {
            network,
            flow_units,
            now_days: 100.25,
            elapsed_days: 1.25,
            step_days: 30.0 / 86_400.0,
        }
    }

    #[test]
    fn keywords_ignore_case() {
        assert_eq!(Object::from_keyword("pump"), Some(Object::Pump));
        assert_eq!(Attribute::from_keyword("ClockTime"), Some(Attribute::ClockTime));
        assert_eq!(Attribute::from_keyword("DAY"), Some(Attribute::Day));
        assert_eq!(Object::from_keyword("pipe"), None);
        assert_eq!(Attribute::TimeOpen.to_string(), "TIMEOPEN");
    }

    #[test]
    fn attributes_must_belong_to_their_object() {
        assert!(Variable::node(0, Attribute::Head).is_ok());
        assert!(Variable::link(Object::Weir, 0, Attribute::TimeClosed).is_ok());
        assert_eq!(
            Variable::link(Object::Pump, 1, Attribute::Depth),
            Err(RuleError::InvalidAttribute {
                object: Object::Pump,
                attribute: Attribute::Depth,
            })
        );
        assert!(Variable::simulation(Attribute::Flow).is_err());
        assert!(Variable::link(Object::Node, 0, Attribute::Flow).is_err());
    }

    #[test]
    fn node_values_use_user_units() {
        let network = network();

        let us = view(&network, FlowUnits::Cfs);
        let head = Variable::node(0, Attribute::Head).unwrap();
        assert_eq!(head.value(&us).unwrap(), Some(12.0));

        let si = view(&network, FlowUnits::Lps);
        let depth = Variable::node(0, Attribute::Depth).unwrap();
        assert_relative_eq!(depth.value(&si).unwrap().unwrap(), 2.0 * 0.3048);
        let inflow = Variable::node(0, Attribute::Inflow).unwrap();
        assert_relative_eq!(inflow.value(&si).unwrap().unwrap(), 1.5 * 28.317);
    }

    #[test]
    fn link_timers_are_missing_in_the_wrong_state() {
        let network = network();
        let view = view(&network, FlowUnits::Cfs);

        let closed = Variable::link(Object::Weir, 0, Attribute::TimeClosed).unwrap();
        let open = Variable::link(Object::Weir, 0, Attribute::TimeOpen).unwrap();
        assert_relative_eq!(closed.value(&view).unwrap().unwrap(), 0.25);
        assert_eq!(open.value(&view).unwrap(), None);

        // A pump has a status but no setting attribute to read.
        let status = Variable::link(Object::Link, 1, Attribute::Status).unwrap();
        assert_eq!(status.value(&view).unwrap(), Some(1.0));
    }

    #[test]
    fn clock_values() {
        let network = network();
        let mut view = view(&network, FlowUnits::Cfs);
        // 2024-01-07 was a Sunday.
        view.now_days = calendar::date_to_days(jiff::civil::date(2024, 1, 7)) + 0.75;

        let read = |attribute| {
            Variable::simulation(attribute)
                .unwrap()
                .value(&view)
                .unwrap()
                .unwrap()
        };
        assert_relative_eq!(read(Attribute::ClockTime), 0.75);
        assert_relative_eq!(read(Attribute::Time), 1.25);
        assert_relative_eq!(read(Attribute::Day), 1.0);
        assert_relative_eq!(read(Attribute::Month), 1.0);
        assert_relative_eq!(read(Attribute::DayOfYear), 7.0);
    }

    #[test]
    fn missing_objects_are_errors() {
        let network = network();
        let view = view(&network, FlowUnits::Cfs);
        let depth = Variable::node(9, Attribute::Depth).unwrap();
        assert!(matches!(depth.value(&view), Err(EngineError::UnknownNode(9))));
    }
}
