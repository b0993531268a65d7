use crate::{Action, Condition, Keyword, RuleError};

use super::{Join, Premise, Rule};

/// Where a rule under construction is in its clause sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Stage {
    Rule,
    If,
    Then,
    Else,
    Priority,
}

/// Assembles a [`Rule`] one clause at a time.
///
/// Clauses must arrive in the order
/// `IF (AND|OR)* THEN AND* [ELSE AND*] [PRIORITY]`; a clause out of that
/// order is rejected and leaves the builder unchanged.
#[derive(Debug, Clone)]
pub struct RuleBuilder {
    rule: Rule,
    stage: Stage,
}

impl RuleBuilder {
    /// Starts a rule with priority 0.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            rule: Rule {
                name: name.into(),
                premises: Vec::new(),
                then_actions: Vec::new(),
                else_actions: Vec::new(),
                priority: 0.0,
            },
            stage: Stage::Rule,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.rule.name
    }

    /// Returns `true` once the rule has moved on to its actions, where an
    /// `AND` clause adds an action rather than a premise.
    #[must_use]
    pub fn accepts_actions(&self) -> bool {
        matches!(self.stage, Stage::Then | Stage::Else)
    }

    /// Adds an `IF`, `AND`, or `OR` premise.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::OutOfSequence`] if the clause is not allowed
    /// here, or [`RuleError::OutOfMemory`] if the premise cannot be stored.
    pub fn condition(&mut self, keyword: Keyword, condition: Condition) -> Result<(), RuleError> {
        let join = match (keyword, self.stage) {
            (Keyword::If, Stage::Rule) | (Keyword::And, Stage::If) => Join::And,
            (Keyword::Or, Stage::If) => Join::Or,
            _ => return Err(RuleError::OutOfSequence(keyword)),
        };

        let premises = &mut self.rule.premises;
        premises.try_reserve(1).map_err(|_| RuleError::OutOfMemory)?;
        premises.push(Premise { join, condition });
        self.stage = Stage::If;
        Ok(())
    }

    /// Adds a `THEN`, `ELSE`, or `AND` action.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::OutOfSequence`] if the clause is not allowed
    /// here, or [`RuleError::OutOfMemory`] if the action cannot be stored.
    pub fn action(&mut self, keyword: Keyword, action: Action) -> Result<(), RuleError> {
        let stage = match (keyword, self.stage) {
            (Keyword::Then, Stage::If) | (Keyword::And, Stage::Then) => Stage::Then,
            (Keyword::Else, Stage::Then) | (Keyword::And, Stage::Else) => Stage::Else,
            _ => return Err(RuleError::OutOfSequence(keyword)),
        };

        let actions = if stage == Stage::Then {
            &mut self.rule.then_actions
        } else {
            &mut self.rule.else_actions
        };
        actions.try_reserve(1).map_err(|_| RuleError::OutOfMemory)?;
        actions.push(action);
        self.stage = stage;
        Ok(())
    }

    /// Sets the rule's `PRIORITY`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::OutOfSequence`] unless the rule has reached its
    /// actions, or [`RuleError::InvalidNumber`] if `priority` is not finite.
    pub fn priority(&mut self, priority: f64) -> Result<(), RuleError> {
        if !matches!(self.stage, Stage::Then | Stage::Else) {
            return Err(RuleError::OutOfSequence(Keyword::Priority));
        }
        if !priority.is_finite() {
            return Err(RuleError::InvalidNumber(priority.to_string()));
        }
        self.rule.priority = priority;
        self.stage = Stage::Priority;
        Ok(())
    }

    /// Finishes the rule.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Incomplete`] if no `THEN` clause was added.
    pub fn build(self) -> Result<Rule, RuleError> {
        if self.stage < Stage::Then {
            return Err(RuleError::Incomplete);
        }
        Ok(self.rule)
    }
}
