use super::*;

use sluice_core::{Curve, Link, LinkKind, Node, NodeKind, TimeSeries};

use crate::variable::Subject;

fn network() -> Network {
    Network::new(
        vec![
            Node::new("Wet Well", NodeKind::Storage),
            Node::new("J1", NodeKind::Junction),
            Node::new("Out", NodeKind::Outfall { routes_to: None }),
        ],
        vec![
            Link::new("P1", LinkKind::pump(), 0, 1),
            Link::new("C1", LinkKind::conduit(), 1, 2),
            Link::new("G1", LinkKind::Orifice, 0, 1),
        ],
    )
    .unwrap()
}

fn tables() -> Tables {
    let mut tables = Tables::new();
    tables.add_curve(Curve::new("GateCurve", vec![0.0, 10.0], vec![0.0, 1.0]).unwrap());
    tables.add_series(TimeSeries::new("Schedule", vec![0.0, 1.0], vec![0.0, 1.0]).unwrap());
    tables
}

#[test]
fn reads_a_complete_rule() {
    let text = r#"
        ; Pump control
        RULE R1
        IF NODE "Wet Well" DEPTH > 5.5
        OR SIMULATION CLOCKTIME = 08:00     ; morning flush
        THEN PUMP P1 STATUS = ON
        AND CONDUIT C1 STATUS = OPEN
        ELSE PUMP P1 STATUS = OFF
        PRIORITY 4
    "#;

    let parsed = parse_rules(text, &network(), &tables());
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);

    let rule = &parsed.rules[0];
    assert_eq!(rule.name(), "R1");
    assert_eq!(rule.priority(), 4.0);

    let conditions: Vec<_> = rule.conditions().collect();
    assert_eq!(conditions.len(), 2);
    assert_eq!(conditions[0].lhs().subject(), Subject::Node(0));
    assert_eq!(conditions[0].rhs(), &Operand::Value(5.5));
    assert_eq!(conditions[1].lhs().attribute(), Attribute::ClockTime);
    assert_eq!(conditions[1].rhs(), &Operand::Value(8.0 / 24.0));

    assert_eq!(rule.then_actions().len(), 2);
    assert_eq!(rule.then_actions()[1].link(), 1);
    assert_eq!(rule.else_actions()[0].setting(), &Setting::Value(0.0));
}

#[test]
fn reads_modulated_settings() {
    let text = "
        RULE R1
        IF NODE J1 DEPTH >= NODE \"Wet Well\" DEPTH
        THEN ORIFICE G1 SETTING = CURVE gatecurve
        ELSE ORIFICE G1 SETTING = TIMESERIES Schedule

        RULE R2
        IF LINK G1 TIMEOPEN >= 1:30
        THEN PUMP P1 SETTING = PID 0.5 10 0
    ";

    let parsed = parse_rules(text, &network(), &tables());
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
    assert_eq!(parsed.rules.len(), 2);

    let first = &parsed.rules[0];
    let condition = first.conditions().next().unwrap();
    let rhs = Variable::node(0, Attribute::Depth).unwrap();
    assert_eq!(condition.rhs(), &Operand::Variable(rhs));
    assert_eq!(first.then_actions()[0].setting(), &Setting::Curve(0));
    assert_eq!(first.else_actions()[0].setting(), &Setting::TimeSeries(0));

    let second = &parsed.rules[1];
    assert_eq!(
        second.conditions().next().unwrap().rhs(),
        &Operand::Value(1.5 / 24.0)
    );
    assert_eq!(
        second.then_actions()[0].setting(),
        &Setting::Pid(Pid::new(0.5, 10.0, 0.0))
    );
}

#[test]
fn a_bad_clause_drops_only_its_rule() {
    let text = "
        RULE Bad
        IF NODE Nowhere DEPTH > 1
        THEN PUMP P1 STATUS = ON

        RULE Good
        IF NODE J1 DEPTH > 1
        THEN PUMP P1 STATUS = ON
    ";

    let parsed = parse_rules(text, &network(), &tables());

    assert_eq!(parsed.rules.len(), 1);
    assert_eq!(parsed.rules[0].name(), "Good");
    assert_eq!(
        parsed.errors,
        vec![ParseError {
            line: 3,
            rule: Some("Bad".to_owned()),
            source: RuleError::UnknownName {
                kind: "node",
                name: "Nowhere".to_owned(),
            },
        }]
    );
}

#[test]
fn reports_grammar_errors() {
    let cases = [
        (
            "THEN PUMP P1 STATUS = ON",
            RuleError::OutOfSequence(Keyword::Then),
        ),
        (
            "RULE R\nTHEN PUMP P1 STATUS = ON",
            RuleError::OutOfSequence(Keyword::Then),
        ),
        (
            "RULE R\nIF NODE J1 DEPTH > 1 THEN PUMP P1 STATUS = ON",
            RuleError::TrailingItems("THEN".to_owned()),
        ),
        ("RULE R\nIF NODE J1 DEPTH >", RuleError::TooFewItems),
        (
            "RULE R\nIF NODE J1 FLOW > 1",
            RuleError::InvalidAttribute {
                object: Object::Node,
                attribute: Attribute::Flow,
            },
        ),
        (
            "RULE R\nIF NODE J1 DEPTH => 1",
            RuleError::UnknownKeyword("=>".to_owned()),
        ),
        (
            "RULE R\nIF SIMULATION MONTH = 13",
            RuleError::InvalidDateTime("13".to_owned()),
        ),
        (
            "RULE R\nIF NODE J1 DEPTH > 1\nTHEN ORIFICE G1 SETTING = 1.5",
            RuleError::SettingOutOfRange(1.5),
        ),
        (
            "RULE R\nIF NODE J1 DEPTH > 1\nTHEN WEIR G1 SETTING = 0.5",
            RuleError::WrongLinkKind {
                link: "G1".to_owned(),
                object: Object::Weir,
            },
        ),
        (
            "RULE R\nIF NODE J1 DEPTH > 1\nTHEN PUMP P1 STATUS = OPEN",
            RuleError::UnknownKeyword("OPEN".to_owned()),
        ),
        (
            "RULE R\nIF NODE J1 DEPTH > 1\nTHEN ORIFICE G1 SETTING = CURVE Missing",
            RuleError::UnknownName {
                kind: "curve",
                name: "Missing".to_owned(),
            },
        ),
        (
            "RULE R\nIF NODE J1 DEPTH > 1\nTHEN PUMP P1 STATUS = ON\nPRIORITY high",
            RuleError::InvalidNumber("high".to_owned()),
        ),
        ("RULE R\nIF NODE J1 DEPTH > 1", RuleError::Incomplete),
        ("RULE", RuleError::TooFewItems),
        ("WHEN NODE J1 DEPTH > 1", RuleError::UnknownKeyword("WHEN".to_owned())),
    ];

    let network = network();
    let tables = tables();
    for (text, expected) in cases {
        let parsed = parse_rules(text, &network, &tables);
        assert!(parsed.rules.is_empty(), "{text}");
        assert_eq!(parsed.errors.len(), 1, "{text}");
        assert_eq!(parsed.errors[0].source, expected, "{text}");
    }
}

#[test]
fn feeds_lines_incrementally() {
    let network = network();
    let tables = tables();
    let mut parser = RuleParser::new(&network, &tables);

    parser.parse_line(1, "RULE R1");
    parser.parse_line(2, "IF SIMULATION DAY = 1");
    parser.parse_line(3, "THEN CONDUIT C1 STATUS = CLOSED");
    parser.parse_line(4, "RULE R2");
    parser.parse_line(5, "IF SIMULATION DATE = 07/04/2024");
    parser.parse_line(6, "THEN CONDUIT C1 STATUS = OPEN");

    let parsed = parser.finish();
    assert!(parsed.errors.is_empty(), "{:?}", parsed.errors);
    assert_eq!(parsed.rules.len(), 2);
}

#[test]
fn tokenizer_handles_quotes_and_comments() {
    assert_eq!(
        tokenize(r#"  IF NODE "Wet Well" DEPTH > 1 ; note"#),
        ["IF", "NODE", "Wet Well", "DEPTH", ">", "1"]
    );
    assert!(tokenize("   ; only a comment").is_empty());
    assert_eq!(tokenize("\"open"), ["open"]);
}
