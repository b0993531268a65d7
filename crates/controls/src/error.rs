use sluice_core::{TableError, time::CalendarError};
use thiserror::Error;

use crate::{Attribute, Keyword, Object};

/// Errors raised while building a rule.
///
/// A rule that fails to build is discarded; other rules are unaffected.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuleError {
    #[error("{0} clause is out of sequence")]
    OutOfSequence(Keyword),

    #[error("rule has no THEN clause")]
    Incomplete,

    #[error("unrecognized keyword `{0}`")]
    UnknownKeyword(String),

    #[error("no {kind} named `{name}`")]
    UnknownName { kind: &'static str, name: String },

    #[error("no link at index {0}")]
    UnknownLink(usize),

    #[error("{attribute} is not an attribute of {object}")]
    InvalidAttribute { object: Object, attribute: Attribute },

    #[error("link `{link}` is not a {object}")]
    WrongLinkKind { link: String, object: Object },

    #[error("{0} objects cannot be controlled by an action")]
    NotControllable(Object),

    #[error("invalid number `{0}`")]
    InvalidNumber(String),

    #[error("invalid date or time `{0}`")]
    InvalidDateTime(String),

    #[error("status must be 0 or 1, got {0}")]
    InvalidStatus(f64),

    #[error("setting {0} lies outside [0, 1]")]
    SettingOutOfRange(f64),

    #[error("too few items in clause")]
    TooFewItems,

    #[error("unexpected `{0}` after clause")]
    TrailingItems(String),

    #[error("out of memory while adding a clause")]
    OutOfMemory,
}

/// Errors raised while evaluating rules against the network.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("rule refers to missing node index {0}")]
    UnknownNode(usize),

    #[error("rule refers to missing link index {0}")]
    UnknownLink(usize),

    #[error("action refers to missing curve index {0}")]
    UnknownCurve(usize),

    #[error("action refers to missing time series index {0}")]
    UnknownSeries(usize),

    #[error(transparent)]
    Table(#[from] TableError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}
