//! Control rules and the clause grammar they are built from.

mod builder;

use std::fmt;

use crate::{Action, Condition, EngineError, premise::ControlSignal, variable::StateView};

pub use builder::RuleBuilder;

/// The keyword that opens a rule clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Rule,
    If,
    And,
    Or,
    Then,
    Else,
    Priority,
}

impl Keyword {
    const WORDS: [(&'static str, Self); 7] = [
        ("RULE", Self::Rule),
        ("IF", Self::If),
        ("AND", Self::And),
        ("OR", Self::Or),
        ("THEN", Self::Then),
        ("ELSE", Self::Else),
        ("PRIORITY", Self::Priority),
    ];

    /// Looks up a clause keyword, ignoring case.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        Self::WORDS
            .iter()
            .find(|(keyword, _)| keyword.eq_ignore_ascii_case(word))
            .map(|&(_, keyword)| keyword)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let word = Self::WORDS
            .iter()
            .find(|&&(_, keyword)| keyword == *self)
            .map_or("?", |&(word, _)| word);
        f.write_str(word)
    }
}

/// How a premise combines with the premises before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Join {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Premise {
    pub join: Join,
    pub condition: Condition,
}

/// A named if/then/else control rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    name: String,
    premises: Vec<Premise>,
    then_actions: Vec<Action>,
    else_actions: Vec<Action>,
    priority: f64,
}

impl Rule {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn priority(&self) -> f64 {
        self.priority
    }

    /// Returns the rule's conditions in clause order.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.premises.iter().map(|premise| &premise.condition)
    }

    #[must_use]
    pub fn then_actions(&self) -> &[Action] {
        &self.then_actions
    }

    #[must_use]
    pub fn else_actions(&self) -> &[Action] {
        &self.else_actions
    }

    /// Folds the premises left to right.
    ///
    /// Once the result is false, an AND premise ends the fold and an OR
    /// premise is evaluated to possibly revive it. While the result is true,
    /// OR premises are skipped.
    pub(crate) fn premises_hold(
        &self,
        view: &StateView<'_>,
        signal: &mut ControlSignal,
    ) -> Result<bool, EngineError> {
        let mut result = true;
        for premise in &self.premises {
            match premise.join {
                Join::Or if !result => result = premise.condition.evaluate(view, signal)?,
                Join::Or => {}
                Join::And if !result => break,
                Join::And => result = premise.condition.evaluate(view, signal)?,
            }
        }
        Ok(result)
    }

    /// Returns the actions to take given the outcome of the premises.
    pub(crate) fn actions_mut(&mut self, fired: bool) -> &mut [Action] {
        if fired {
            &mut self.then_actions
        } else {
            &mut self.else_actions
        }
    }
}
