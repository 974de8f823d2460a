//! Force-node velocities reaching the solver through the coupler.

mod common;

use gale_comm::SingleProcess;
use gale_core::{NodeType, TurbineId, Vec3};
use gale_engine::{Coupler, InflowConfig};
use gale_test_utils::{CallLog, MockConfig, MockSolverFactory, SolverCall};

const T: TurbineId = TurbineId(0);

fn coupler(log: &CallLog) -> Coupler {
    let factory = MockSolverFactory::new(
        MockConfig {
            blade_span: 10.0,
            ..MockConfig::default()
        },
        log.clone(),
    );
    let mut config = common::config(1);
    config.inflow = InflowConfig::External;
    config.t_max = 0.3;
    let mut coupler = Coupler::from_config(config, &SingleProcess, &factory).unwrap();
    coupler.init().unwrap();
    coupler.solution0().unwrap();
    coupler
}

fn last_velocities(log: &CallLog) -> Vec<Vec3> {
    log.for_turbine(T)
        .into_iter()
        .rev()
        .find_map(|c| match c {
            SolverCall::Step { inputs, .. } => Some(inputs.velocities),
            _ => None,
        })
        .unwrap()
}

#[test]
fn blade_velocities_interpolated_along_span() {
    let log = CallLog::new();
    let mut coupler = coupler(&log);

    // blade 0 force nodes sit 0, 5 and 10 m from the root
    assert_eq!(coupler.force_node_type(T, 1).unwrap(), NodeType::Blade(0));
    coupler.set_force_node_velocity(T, 0, [7.0, 0.0, 0.0]).unwrap();
    for (node, u) in [(1, 1.0), (2, 2.0), (3, 3.0)] {
        coupler.set_force_node_velocity(T, node, [u, 0.0, 0.0]).unwrap();
    }
    coupler.step().unwrap();

    let v = last_velocities(&log);
    assert_eq!(v[0], [7.0, 0.0, 0.0]);
    let blade0: Vec<f64> = v[1..6].iter().map(|u| u[0]).collect();
    for (got, want) in blade0.iter().zip([1.0, 1.5, 2.0, 2.5, 3.0]) {
        assert!((got - want).abs() < 1e-9, "{blade0:?}");
    }
    // untouched blades and tower interpolate zeros
    assert!(v[6..].iter().all(|u| *u == [0.0; 3]));
    assert_eq!(coupler.velocity_node_type(T, 2).unwrap(), NodeType::Blade(0));
}

#[test]
fn directly_set_velocities_survive_without_new_force_data() {
    let log = CallLog::new();
    let mut coupler = coupler(&log);

    coupler.set_force_node_velocity(T, 2, [4.0, 0.0, 0.0]).unwrap();
    coupler.step().unwrap();
    coupler.set_velocity(T, 3, [9.0, 9.0, 9.0]).unwrap();
    coupler.step().unwrap();

    let v = last_velocities(&log);
    assert_eq!(v[3], [9.0, 9.0, 9.0]);
    assert!((v[2][0] - 2.0).abs() < 1e-9);
}

#[test]
fn forces_and_moments_returned_negated() {
    let log = CallLog::new();
    let mut coupler = coupler(&log);
    coupler.step().unwrap();

    // the mock publishes [step, node, 0.5] and [0, 0, 0.25]
    assert_eq!(coupler.force(T, 2).unwrap(), [-1.0, -2.0, -0.5]);
    assert_eq!(coupler.moment(T, 2).unwrap(), [0.0, 0.0, -0.25]);
    assert_eq!(coupler.chord(T, 0).unwrap(), 0.0);
    assert_eq!(coupler.chord(T, 1).unwrap(), 3.0);
}
