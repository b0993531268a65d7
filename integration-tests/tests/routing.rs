use std::thread;

use approx::assert_relative_eq;
use integration_tests::{router::TankRouter, scenario::Scenario};
use sluice_core::{Link, LinkKind, Network, NodeKind, Tables};
use sluice_routing::{DryWeatherInflow, Inflows, Model, Pattern, Simulation};

const JUNCTION: usize = 0;

/// Depth (ft) at which the junction drains exactly 1.5 cfs: 4 √d = 1.5.
const EQUILIBRIUM_DEPTH: f64 = 0.140_625;

fn simulation(text: &str) -> Simulation<TankRouter> {
    simulation_from_depth(text, 0.0)
}

/// A junction draining through a conduit to an outfall, fed 1.5 cfs of
/// dry-weather flow in July, with the junction initially at `depth`.
fn simulation_from_depth(text: &str, depth: f64) -> Simulation<TankRouter> {
    let scenario = Scenario::load(text);
    let router = TankRouter {
        area: 500.0,
        coefficient: 4.0,
        pump_rate: 0.0,
    };
    let network = Network::new(
        vec![
            router.tank("J1", NodeKind::Junction, depth),
            router.tank("Out", NodeKind::Outfall { routes_to: None }, 0.0),
        ],
        vec![Link::new("C1", LinkKind::conduit(), 0, 1)],
    )
    .unwrap();

    let mut monthly = [1.0; 12];
    monthly[6] = 1.5;
    let inflows = Inflows {
        patterns: vec![Pattern::Monthly(monthly)],
        dry_weather: vec![DryWeatherInflow {
            monthly: Some(0),
            ..DryWeatherInflow::new(JUNCTION, 1.0)
        }],
        ..Inflows::default()
    };

    let model = Model::new(network, Tables::new(), inflows).unwrap();
    Simulation::new(model, router, scenario.options)
}

fn run_to_end(sim: &mut Simulation<TankRouter>) {
    sim.start().unwrap();
    while sim.step().unwrap() > 0.0 {}
}

#[test]
fn a_day_of_dry_weather_flow_balances() {
    let mut sim = simulation(
        r#"
        [options]
        start = "2024-07-01T00:00:00"
        end = "2024-07-02T00:00:00"
        routing_step = 60
        "#,
    );
    run_to_end(&mut sim);
    let summary = sim.end().unwrap();

    assert_eq!(summary.stats.steps, 1440);
    assert_relative_eq!(summary.totals.dry_weather, 1.5 * 86_400.0, max_relative = 1e-3);
    assert!(summary.routing_error.abs() < 0.1, "{}", summary.routing_error);
    let depth = sim.model().network.nodes()[JUNCTION].new_depth;
    assert_relative_eq!(depth, EQUILIBRIUM_DEPTH, max_relative = 1e-2);
}

#[test]
fn routing_events_limit_when_flow_is_routed() {
    let mut sim = simulation(
        r#"
        [options]
        start = "2024-07-01T00:00:00"
        end = "2024-07-01T12:00:00"
        routing_step = 60
        report_step = 900

        [[options.events]]
        start = "2024-07-01T06:00:00"
        end = "2024-07-01T09:00:00"
        "#,
    );
    run_to_end(&mut sim);
    let summary = sim.end().unwrap();

    let stats = &summary.stats;
    assert!(stats.idle_steps > 0);
    assert!(stats.steps < 400, "{} steps", stats.steps);
    assert_relative_eq!(
        summary.totals.dry_weather,
        1.5 * 3.0 * 3600.0,
        max_relative = 0.05
    );
    assert!(summary.routing_error.abs() < 1.0, "{}", summary.routing_error);
}

const STEADY_SKIPPING: &str = r#"
    [options]
    start = "2024-07-01T00:00:00"
    end = "2024-07-01T12:00:00"
    routing_step = 60
    skip_steady_state = true
"#;

#[test]
fn steady_state_skipping_keeps_the_balance() {
    let mut sim = simulation_from_depth(STEADY_SKIPPING, EQUILIBRIUM_DEPTH);
    run_to_end(&mut sim);
    let summary = sim.end().unwrap();

    // Only the first two steps see a change in inflow.
    assert_eq!(summary.stats.steady_steps, summary.stats.steps - 2);
    assert!(summary.routing_error.abs() < 0.1, "{}", summary.routing_error);
    let depth = sim.model().network.nodes()[JUNCTION].new_depth;
    assert_relative_eq!(depth, EQUILIBRIUM_DEPTH, max_relative = 1e-9);
}

#[test]
fn steady_state_skipping_from_a_filling_tank_costs_some_continuity() {
    let mut sim = simulation(STEADY_SKIPPING);
    run_to_end(&mut sim);
    let summary = sim.end().unwrap();

    // Steps skipped while the junction is still filling leave its storage
    // change out of the balance.
    assert!(summary.stats.steady_steps > 0);
    assert!(summary.routing_error.abs() < 2.5, "{}", summary.routing_error);
}

#[test]
fn lateral_inflow_can_be_coupled_from_another_thread() {
    let mut sim = simulation(
        r#"
        [options]
        start = "2024-07-01T00:00:00"
        end = "2024-07-01T01:00:00"
        routing_step = 60
        "#,
    );
    sim.start().unwrap();

    let coupling = sim.coupling();
    thread::spawn(move || coupling.set_lateral_inflow(JUNCTION, 2.0))
        .join()
        .unwrap();
    sim.step().unwrap();

    let junction = &sim.model().network.nodes()[JUNCTION];
    assert_relative_eq!(junction.new_lat_flow, 3.5);
    let rates = sim.scheduler().unwrap().mass_balance().step_rates();
    assert_relative_eq!(rates.external, 2.0);
    assert_relative_eq!(rates.dry_weather, 1.5);

    // Clearing zeroes the coupled inflow without removing it.
    sim.coupling().clear();
    sim.step().unwrap();
    assert_relative_eq!(sim.model().network.nodes()[JUNCTION].new_lat_flow, 1.5);
    assert_eq!(sim.coupling().lateral_inflow(JUNCTION), Some(0.0));
}
