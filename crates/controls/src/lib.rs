//! Rule-based control of links in a drainage network.
//!
//! A control rule tests conditions on nodes, links, and the simulation clock
//! and, depending on the outcome, sets a link's status or setting:
//!
//! ```text
//! RULE R1
//! IF NODE Wet DEPTH > 5
//! AND SIMULATION CLOCKTIME >= 08:00
//! THEN PUMP P1 STATUS = ON
//! ELSE PUMP P1 STATUS = OFF
//! PRIORITY 2
//! ```
//!
//! Rules are assembled clause by clause with a [`RuleBuilder`], which
//! enforces the clause order `RULE`, `IF`, `AND`/`OR`, `THEN`, `AND`,
//! `ELSE`, `AND`, `PRIORITY`. [`parse_rules`] drives the builder from rule
//! text, resolving object names against a [`Network`] and [`Tables`].
//!
//! Each routing step the [`ControlEngine`] evaluates every rule, resolves
//! the value of each triggered action (a fixed value, a curve or time series
//! lookup, or a PID update), keeps the highest-priority action per link, and
//! writes the survivors into the links' target settings.
//!
//! [`Network`]: sluice_core::Network
//! [`Tables`]: sluice_core::Tables

pub mod action;
pub mod engine;
pub mod parse;
pub mod premise;
pub mod rule;
pub mod variable;

mod error;

pub use action::{Action, Pid, Setting};
pub use engine::{ActionReport, ControlEngine, Evaluation, StepTime};
pub use error::{EngineError, RuleError};
pub use parse::{ParseError, Parsed, RuleParser, parse_rules};
pub use premise::{Condition, Operand, Relation};
pub use rule::{Keyword, Rule, RuleBuilder};
pub use variable::{Attribute, Object, Variable};
