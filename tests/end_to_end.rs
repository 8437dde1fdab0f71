//! Seed-pinned end-to-end scenarios.
//!
//! Each test below fixes a grid size, seed, and (where relevant) config
//! knob, and asserts a specific outcome of a full simulation run rather
//! than just "it doesn't panic".

use std::collections::HashMap;

use swarmnet::config::SimConfig;
use swarmnet::grid::Grid;
use swarmnet::protocol::custom::Custom;
use swarmnet::protocol::Engine;
use swarmnet::simulation::{ProtocolKind, Simulation};

#[test]
fn aodv_and_olsr_finish_on_a_mid_sized_swarm() {
    let grid = Grid::new(20, Some(1)).unwrap();
    let sim = Simulation::with_seed(grid, SimConfig::default(), Some(1)).unwrap();
    let end = sim.end();
    assert!(end[&ProtocolKind::Aodv].finished, "aodv did not finish");
    assert!(end[&ProtocolKind::Olsr].finished, "olsr did not finish");
}

#[test]
fn custom_accrues_overhead_and_never_decreases_graph_nums() {
    let mut grid = Grid::new(10, Some(7)).unwrap();
    let config = SimConfig::default();
    let node_ids: Vec<_> = grid.devices().iter().map(|n| n.id()).collect();

    // Drive a handful of mutations directly and confirm the movement
    // deltas the driver would fold into Custom's graph_nums are never
    // negative (they're counts, so this is really just "well-formed").
    let mut cumulative: HashMap<u32, u64> = node_ids.iter().map(|&id| (id, 0)).collect();
    for _ in 0..20 {
        let deltas = grid.mutate();
        for (&id, &before) in cumulative.clone().iter() {
            let after = before + deltas[id as usize] as u64;
            assert!(after >= before);
            cumulative.insert(id, after);
        }
    }

    let sim = Simulation::with_seed(grid, config, Some(7)).unwrap();
    let end = sim.end();
    assert!(
        end[&ProtocolKind::Custom].overhead > 0,
        "custom engine reported zero overhead"
    );
    assert!(
        end[&ProtocolKind::Custom].finished,
        "custom engine did not finish"
    );
}

#[test]
fn custom_falls_back_to_broadcast_once_its_reply_path_goes_stale() {
    // A size-30, seed-42 swarm supplies the node ids; the topology each
    // slot is driven explicitly to force the branch deterministically
    // rather than hoping a handful of `Grid::mutate` calls happen to sever
    // the right link.
    let grid = Grid::new(30, Some(42)).unwrap();
    let node_ids: Vec<_> = grid.devices().iter().map(|n| n.id()).collect();
    let relay_a = node_ids[0];
    let relay_b = node_ids[1];
    let target = node_ids[2];
    let source = node_ids[3];
    let stranded = node_ids[4];

    let config = SimConfig::default();
    let mut custom = Custom::new(source, target, &node_ids, &config);
    assert!(!custom.broken_path());

    let connected: HashMap<u32, Vec<u32>> = HashMap::from([
        (source, vec![relay_a]),
        (relay_a, vec![relay_b, source]),
        (relay_b, vec![target, relay_a]),
        (target, vec![relay_b]),
    ]);
    custom.step(0, &connected, &[source]);
    custom.step(1, &connected, &[relay_a]);
    custom.step(2, &connected, &[relay_b]);
    assert!(!custom.broken_path());

    // relay_b's link to relay_a (the reply's recorded next hop) has gone
    // out of range; its only remaining neighbor is an unrelated node.
    let severed: HashMap<u32, Vec<u32>> =
        HashMap::from([(target, vec![relay_b]), (relay_b, vec![stranded])]);
    custom.step(3, &severed, &[target]);
    custom.step(4, &severed, &[relay_b]);

    assert!(
        custom.broken_path(),
        "a stale next hop should have forced the broadcast fallback"
    );
    assert!(
        custom.result().overhead > 0,
        "the broadcast fallback should still be counted as overhead"
    );
}

#[test]
fn single_swarm_holds_after_a_hundred_mutations_on_a_small_grid() {
    let mut grid = Grid::new(5, Some(0)).unwrap();
    for _ in 0..100 {
        grid.mutate();
        assert!(grid.is_single_swarm());
    }
}

#[test]
fn sparsity_rises_monotonically_with_radio_radius() {
    let narrow = Grid::with_radii(20, Some(42), 3.0, 3.0).unwrap();
    let wide = Grid::with_radii(20, Some(42), 7.0, 7.0).unwrap();
    assert!(wide.sparsity() >= narrow.sparsity());
}

#[test]
fn flood_test_small_queue_high_transmission_probability_stays_bounded() {
    let grid = Grid::new(15, Some(3)).unwrap();
    let config = SimConfig {
        queue_capacity: 2,
        tx_probability: (0.9, 0.9),
        max_timeslots: 1000,
        ..SimConfig::default()
    };

    let sim = Simulation::with_seed(grid, config, Some(3)).unwrap();
    let end = sim.end();
    for (protocol, result) in &end {
        assert!(
            result.queue_usage_percent <= 100.0,
            "{protocol:?} queue usage exceeded capacity: {result:?}"
        );
    }
}

#[test]
fn a_one_cell_grid_places_no_nodes_and_finishes_trivially() {
    let grid = Grid::new(1, Some(1)).unwrap();
    assert!(grid.devices().is_empty());
    let sim = Simulation::new(grid, SimConfig::default()).unwrap();
    for (_, result) in sim.end() {
        assert!(result.finished);
        assert_eq!(result.timeslots, 0);
        assert_eq!(result.overhead, 0);
    }
}
