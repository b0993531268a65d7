//! Reading rules from text.
//!
//! Each clause sits on its own line and starts with its keyword. Tokens are
//! separated by whitespace, may be double-quoted, and `;` starts a comment.
//! Object names are resolved against the network and tables.

mod value;

use sluice_core::{Network, Tables};
use thiserror::Error;

use crate::{
    Action, Attribute, Condition, Keyword, Object, Operand, Pid, Relation, Rule, RuleBuilder,
    RuleError, Setting, Variable,
};

/// A clause that could not be added to its rule.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("line {line}: {source}")]
pub struct ParseError {
    pub line: usize,
    /// The rule being built, if the clause followed a `RULE` line.
    pub rule: Option<String>,
    pub source: RuleError,
}

/// The rules read from text and the errors that discarded others.
#[derive(Debug, Clone, Default)]
pub struct Parsed {
    pub rules: Vec<Rule>,
    pub errors: Vec<ParseError>,
}

/// Parses every rule in `text`.
///
/// A rule with any bad clause is dropped and its first error recorded;
/// parsing resumes at the next `RULE` line.
#[must_use]
pub fn parse_rules(text: &str, network: &Network, tables: &Tables) -> Parsed {
    let mut parser = RuleParser::new(network, tables);
    for (index, line) in text.lines().enumerate() {
        parser.parse_line(index + 1, line);
    }
    parser.finish()
}

/// Builds rules from clause lines fed one at a time.
pub struct RuleParser<'a> {
    network: &'a Network,
    tables: &'a Tables,
    current: Option<Pending>,
    parsed: Parsed,
}

#[derive(Debug)]
struct Pending {
    builder: RuleBuilder,
    line: usize,
    failed: bool,
}

impl<'a> RuleParser<'a> {
    #[must_use]
    pub fn new(network: &'a Network, tables: &'a Tables) -> Self {
        Self {
            network,
            tables,
            current: None,
            parsed: Parsed::default(),
        }
    }

    /// Adds one line of rule text. Blank and comment lines are skipped.
    pub fn parse_line(&mut self, line: usize, text: &str) {
        let tokens = tokenize(text);
        let Some((&first, rest)) = tokens.split_first() else {
            return;
        };

        let Some(keyword) = Keyword::from_word(first) else {
            self.fail(line, RuleError::UnknownKeyword(first.to_owned()));
            return;
        };

        if keyword == Keyword::Rule {
            self.close_rule();
            let name = rest.first().copied().unwrap_or_default();
            self.current = Some(Pending {
                builder: RuleBuilder::new(name),
                line,
                failed: false,
            });
            match rest {
                [] => self.fail(line, RuleError::TooFewItems),
                [_] => {}
                [_, extra, ..] => self.fail(line, RuleError::TrailingItems((*extra).to_owned())),
            }
            return;
        }

        let Some(pending) = self.current.as_mut() else {
            self.fail(line, RuleError::OutOfSequence(keyword));
            return;
        };
        if pending.failed {
            return;
        }
        let added = add_clause(self.network, self.tables, &mut pending.builder, keyword, rest);
        if let Err(source) = added {
            self.fail(line, source);
        }
    }

    /// Finishes the last rule and returns everything parsed.
    #[must_use]
    pub fn finish(mut self) -> Parsed {
        self.close_rule();
        self.parsed
    }

    fn close_rule(&mut self) {
        let Some(pending) = self.current.take() else {
            return;
        };
        if pending.failed {
            return;
        }
        let name = pending.builder.name().to_owned();
        match pending.builder.build() {
            Ok(rule) => self.parsed.rules.push(rule),
            Err(source) => self.parsed.errors.push(ParseError {
                line: pending.line,
                rule: Some(name),
                source,
            }),
        }
    }

    fn fail(&mut self, line: usize, source: RuleError) {
        let rule = self.current.as_mut().map(|pending| {
            pending.failed = true;
            pending.builder.name().to_owned()
        });
        log::debug!("discarding rule {rule:?}: line {line}: {source}");
        self.parsed.errors.push(ParseError { line, rule, source });
    }
}

fn add_clause(
    network: &Network,
    tables: &Tables,
    builder: &mut RuleBuilder,
    keyword: Keyword,
    tokens: &[&str],
) -> Result<(), RuleError> {
    let mut cursor = Cursor::new(tokens);
    match keyword {
        Keyword::Priority => {
            let priority = value::number(cursor.next()?)?;
            cursor.finish()?;
            builder.priority(priority)
        }
        Keyword::Then | Keyword::Else => {
            let action = parse_action(network, tables, &mut cursor)?;
            builder.action(keyword, action)
        }
        Keyword::And if builder.accepts_actions() => {
            let action = parse_action(network, tables, &mut cursor)?;
            builder.action(keyword, action)
        }
        _ => {
            let condition = parse_condition(network, &mut cursor)?;
            builder.condition(keyword, condition)
        }
    }
}

fn parse_condition(network: &Network, cursor: &mut Cursor<'_>) -> Result<Condition, RuleError> {
    let lhs = parse_variable(network, cursor)?;

    let symbol = cursor.next()?;
    let relation =
        Relation::from_symbol(symbol).ok_or_else(|| RuleError::UnknownKeyword(symbol.to_owned()))?;

    let rhs = if Object::from_keyword(cursor.peek()?).is_some() {
        let rhs = parse_variable(network, cursor)?;
        if rhs.attribute() != lhs.attribute() {
            log::warn!(
                "comparing {} with {} in a rule condition",
                lhs.attribute(),
                rhs.attribute()
            );
        }
        Operand::Variable(rhs)
    } else {
        Operand::Value(value::premise_value(cursor.next()?, lhs.attribute())?)
    };

    cursor.finish()?;
    Ok(Condition::new(lhs, relation, rhs))
}

fn parse_variable(network: &Network, cursor: &mut Cursor<'_>) -> Result<Variable, RuleError> {
    let object = parse_object(cursor.next()?)?;
    match object {
        Object::Simulation => Variable::simulation(parse_attribute(cursor.next()?)?),
        Object::Node => {
            let index = find_node(network, cursor.next()?)?;
            Variable::node(index, parse_attribute(cursor.next()?)?)
        }
        _ => {
            let index = find_link(network, cursor.next()?)?;
            Variable::link(object, index, parse_attribute(cursor.next()?)?)
        }
    }
}

fn parse_action(
    network: &Network,
    tables: &Tables,
    cursor: &mut Cursor<'_>,
) -> Result<Action, RuleError> {
    let object = parse_object(cursor.next()?)?;
    let link = find_link(network, cursor.next()?)?;
    let attribute = parse_attribute(cursor.next()?)?;
    let equals = cursor.next()?;
    if equals != "=" {
        return Err(RuleError::UnknownKeyword(equals.to_owned()));
    }

    let word = cursor.next()?;
    let setting = if attribute == Attribute::Status {
        Setting::Value(value::status(word, object)?)
    } else if word.eq_ignore_ascii_case("CURVE") {
        let name = cursor.next()?;
        let index = tables.find_curve(name).ok_or_else(|| unknown("curve", name))?;
        Setting::Curve(index)
    } else if word.eq_ignore_ascii_case("TIMESERIES") {
        let name = cursor.next()?;
        let index = tables.find_series(name).ok_or_else(|| unknown("time series", name))?;
        Setting::TimeSeries(index)
    } else if word.eq_ignore_ascii_case("PID") {
        let kp = value::number(cursor.next()?)?;
        let ki = value::number(cursor.next()?)?;
        let kd = value::number(cursor.next()?)?;
        Setting::Pid(Pid::new(kp, ki, kd))
    } else {
        Setting::Value(value::number(word)?)
    };

    cursor.finish()?;
    Action::new(network, object, link, attribute, setting)
}

fn parse_object(word: &str) -> Result<Object, RuleError> {
    Object::from_keyword(word).ok_or_else(|| RuleError::UnknownKeyword(word.to_owned()))
}

fn parse_attribute(word: &str) -> Result<Attribute, RuleError> {
    Attribute::from_keyword(word).ok_or_else(|| RuleError::UnknownKeyword(word.to_owned()))
}

fn find_node(network: &Network, name: &str) -> Result<usize, RuleError> {
    network.find_node(name).ok_or_else(|| unknown("node", name))
}

fn find_link(network: &Network, name: &str) -> Result<usize, RuleError> {
    network.find_link(name).ok_or_else(|| unknown("link", name))
}

fn unknown(kind: &'static str, name: &str) -> RuleError {
    RuleError::UnknownName {
        kind,
        name: name.to_owned(),
    }
}

/// Walks the tokens of one clause.
struct Cursor<'t> {
    tokens: &'t [&'t str],
    position: usize,
}

impl<'t> Cursor<'t> {
    fn new(tokens: &'t [&'t str]) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    fn peek(&self) -> Result<&'t str, RuleError> {
        self.tokens
            .get(self.position)
            .copied()
            .ok_or(RuleError::TooFewItems)
    }

    fn next(&mut self) -> Result<&'t str, RuleError> {
        let token = self.peek()?;
        self.position += 1;
        Ok(token)
    }

    fn finish(&self) -> Result<(), RuleError> {
        match self.tokens.get(self.position) {
            Some(extra) => Err(RuleError::TrailingItems((*extra).to_owned())),
            None => Ok(()),
        }
    }
}

/// Splits a line into tokens, dropping any `;` comment.
fn tokenize(line: &str) -> Vec<&str> {
    let code = line.split_once(';').map_or(line, |(code, _)| code);

    let mut tokens = Vec::new();
    let mut rest = code.trim_start();
    while !rest.is_empty() {
        let (token, tail) = match rest.strip_prefix('"') {
            Some(quoted) => quoted.split_once('"').unwrap_or((quoted, "")),
            None => rest.split_at(rest.find(char::is_whitespace).unwrap_or(rest.len())),
        };
        tokens.push(token);
        rest = tail.trim_start();
    }
    tokens
}

#[cfg(test)]
mod tests;
