use super::*;

use approx::assert_relative_eq;
use jiff::civil::date;
use sluice_core::{Curve, Link, LinkKind, Node, NodeKind};

use crate::{Setting, parse_rules};

const PUMP: usize = 0;
const GATE: usize = 1;

fn network(pump_setting: f64) -> Network {
    Network::new(
        vec![
            Node::new("Tank", NodeKind::Storage).with_depth(3.0),
            Node::new("Out", NodeKind::Outfall { routes_to: None }),
        ],
        vec![
            Link::new("P1", LinkKind::pump(), 0, 1).with_setting(pump_setting),
            Link::new("O1", LinkKind::Orifice, 0, 1).with_setting(0.5),
        ],
    )
    .unwrap()
}

fn tables() -> Tables {
    let mut tables = Tables::new();
    tables.add_curve(Curve::new("Gate", vec![0.0, 10.0], vec![0.0, 1.0]).unwrap());
    tables
}

fn engine(text: &str, network: &Network, tables: &Tables) -> ControlEngine {
    let parsed = parse_rules(text, network, tables);
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
    ControlEngine::new(parsed.rules)
}

fn at_noon() -> StepTime {
    StepTime {
        now_days: calendar::date_to_days(date(2024, 7, 4)) + 0.5,
        elapsed_days: 0.5,
        step: RoutingStep::from_seconds(300.0).unwrap(),
    }
}

#[test]
fn a_false_first_premise_selects_else_actions() {
    let mut network = network(1.0);
    let tables = tables();
    let mut engine = engine(
        "RULE R1
         IF NODE Tank DEPTH > 10
         AND NODE Tank DEPTH > 0
         THEN PUMP P1 STATUS = ON
         ELSE PUMP P1 STATUS = OFF",
        &network,
        &tables,
    );

    let evaluation = engine.evaluate(&mut network, &tables, at_noon()).unwrap();

    assert_eq!(evaluation.actions_taken, 1);
    assert_relative_eq!(network.links()[PUMP].target_setting, 0.0);
    // Only the target moves; the scheduler realizes it.
    assert_relative_eq!(network.links()[PUMP].setting, 1.0);
}

#[test]
fn an_or_premise_revives_a_false_chain() {
    let mut network = network(0.0);
    let tables = tables();
    let mut engine = engine(
        "RULE R1
         IF NODE Tank DEPTH > 10
         OR NODE Tank DEPTH > 2
         THEN PUMP P1 STATUS = ON
         ELSE PUMP P1 STATUS = OFF",
        &network,
        &tables,
    );

    engine.evaluate(&mut network, &tables, at_noon()).unwrap();
    assert_relative_eq!(network.links()[PUMP].target_setting, 1.0);
}

#[test]
fn higher_priority_wins_regardless_of_order() {
    let rules = [
        "RULE A\nIF NODE Tank DEPTH > 0\nTHEN PUMP P1 STATUS = OFF\nPRIORITY 1",
        "RULE B\nIF NODE Tank DEPTH > 0\nTHEN PUMP P1 STATUS = ON\nPRIORITY 5",
    ];
    let tables = tables();

    for text in [rules.join("\n"), format!("{}\n{}", rules[1], rules[0])] {
        let mut network = network(0.0);
        let mut engine = engine(&text, &network, &tables);
        engine.evaluate(&mut network, &tables, at_noon()).unwrap();
        assert_relative_eq!(network.links()[PUMP].target_setting, 1.0);
    }
}

#[test]
fn equal_priorities_keep_the_first_rule() {
    let mut network = network(1.0);
    let tables = tables();
    let mut engine = engine(
        "RULE A\nIF NODE Tank DEPTH > 0\nTHEN PUMP P1 STATUS = OFF\nPRIORITY 2
         RULE B\nIF NODE Tank DEPTH > 0\nTHEN PUMP P1 STATUS = ON\nPRIORITY 2",
        &network,
        &tables,
    );

    engine.evaluate(&mut network, &tables, at_noon()).unwrap();
    assert_relative_eq!(network.links()[PUMP].target_setting, 0.0);
}

#[test]
fn pid_closes_the_gate_toward_the_set_point() {
    let mut network = network(0.0);
    let tables = tables();
    let mut engine = engine(
        "RULE Level
         IF NODE Tank DEPTH <> 2.0
         THEN ORIFICE O1 SETTING = PID 1 0 0",
        &network,
        &tables,
    );

    let evaluation = engine.evaluate(&mut network, &tables, at_noon()).unwrap();

    assert_eq!(evaluation.actions_taken, 1);
    assert_relative_eq!(network.links()[GATE].target_setting, 0.0);
    let pid = match engine.rules()[0].then_actions()[0].setting() {
        Setting::Pid(pid) => *pid,
        other => panic!("expected a PID setting, got {other:?}"),
    };
    assert_relative_eq!(pid.errors().0, -0.5);
}

#[test]
fn curve_actions_read_the_last_compared_value() {
    let mut network = network(0.0);
    let tables = tables();
    let mut engine = engine(
        "RULE Gate
         IF NODE Tank DEPTH > 1
         THEN ORIFICE O1 SETTING = CURVE Gate",
        &network,
        &tables,
    );

    engine.evaluate(&mut network, &tables, at_noon()).unwrap();
    assert_relative_eq!(network.links()[GATE].target_setting, 0.3);
}

#[test]
fn reports_only_fixed_value_changes() {
    let mut network = network(0.0);
    let tables = tables();
    let mut engine = engine(
        "RULE Start
         IF NODE Tank DEPTH > 1
         THEN PUMP P1 STATUS = ON
         AND ORIFICE O1 SETTING = CURVE Gate",
        &network,
        &tables,
    )
    .with_action_reporting(true);

    let evaluation = engine.evaluate(&mut network, &tables, at_noon()).unwrap();

    assert_eq!(evaluation.actions_taken, 2);
    assert_eq!(
        evaluation.reports,
        vec![ActionReport {
            time: date(2024, 7, 4).at(12, 0, 0, 0),
            rule: "Start".to_owned(),
            link: "P1".to_owned(),
            value: 1.0,
        }]
    );
}

#[test]
fn unchanged_targets_are_not_counted() {
    let mut network = network(0.0);
    let tables = tables();
    let mut engine = engine(
        "RULE Start\nIF NODE Tank DEPTH > 1\nTHEN PUMP P1 STATUS = ON",
        &network,
        &tables,
    )
    .with_action_reporting(true);

    assert_eq!(
        engine.evaluate(&mut network, &tables, at_noon()).unwrap().actions_taken,
        1
    );
    let again = engine.evaluate(&mut network, &tables, at_noon()).unwrap();
    assert_eq!(again, Evaluation::default());
}

#[test]
fn an_engine_without_rules_does_nothing() {
    let mut network = network(1.0);
    let mut engine = ControlEngine::new(Vec::new());
    assert!(engine.is_empty());

    let evaluation = engine.evaluate(&mut network, &tables(), at_noon()).unwrap();
    assert_eq!(evaluation, Evaluation::default());
    assert_relative_eq!(network.links()[PUMP].target_setting, 1.0);
}
