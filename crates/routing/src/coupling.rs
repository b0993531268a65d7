//! Values injected into a running model from outside the simulation loop.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use sluice_core::Network;

use crate::{InflowCategory, MassBalance};

#[derive(Debug, Default)]
struct CouplingCache {
    node_depths: HashMap<usize, f64>,
    lateral_inflows: HashMap<usize, f64>,
    rainfall: HashMap<usize, f64>,
}

/// A cloneable handle to one model's coupling cache.
///
/// Every clone refers to the same cache, so another thread can set node
/// depths, lateral inflows, or subcatchment rainfall while the simulation
/// advances. Entries are keyed by node or subcatchment index.
#[derive(Debug, Clone, Default)]
pub struct Coupling {
    cache: Arc<Mutex<CouplingCache>>,
}

impl Coupling {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CouplingCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overrides a node's depth (ft) from the next step on.
    pub fn set_node_depth(&self, node: usize, depth: f64) {
        self.lock().node_depths.insert(node, depth);
    }

    #[must_use]
    pub fn node_depth(&self, node: usize) -> Option<f64> {
        self.lock().node_depths.get(&node).copied()
    }

    #[must_use]
    pub fn has_node_depth(&self, node: usize) -> bool {
        self.lock().node_depths.contains_key(&node)
    }

    pub fn remove_node_depth(&self, node: usize) -> Option<f64> {
        self.lock().node_depths.remove(&node)
    }

    /// Sets a lateral inflow (cfs) added to a node's other inflows.
    pub fn set_lateral_inflow(&self, node: usize, flow: f64) {
        self.lock().lateral_inflows.insert(node, flow);
    }

    #[must_use]
    pub fn lateral_inflow(&self, node: usize) -> Option<f64> {
        self.lock().lateral_inflows.get(&node).copied()
    }

    #[must_use]
    pub fn has_lateral_inflow(&self, node: usize) -> bool {
        self.lock().lateral_inflows.contains_key(&node)
    }

    pub fn remove_lateral_inflow(&self, node: usize) -> Option<f64> {
        self.lock().lateral_inflows.remove(&node)
    }

    /// Overrides a subcatchment's rainfall rate, read by the runoff model.
    pub fn set_rainfall(&self, subcatchment: usize, rate: f64) {
        self.lock().rainfall.insert(subcatchment, rate);
    }

    #[must_use]
    pub fn rainfall(&self, subcatchment: usize) -> Option<f64> {
        self.lock().rainfall.get(&subcatchment).copied()
    }

    #[must_use]
    pub fn has_rainfall(&self, subcatchment: usize) -> bool {
        self.lock().rainfall.contains_key(&subcatchment)
    }

    pub fn remove_rainfall(&self, subcatchment: usize) -> Option<f64> {
        self.lock().rainfall.remove(&subcatchment)
    }

    /// Zeroes every lateral inflow and drops every depth and rainfall override.
    pub fn clear(&self) {
        let mut cache = self.lock();
        cache.lateral_inflows.values_mut().for_each(|flow| *flow = 0.0);
        cache.node_depths.clear();
        cache.rainfall.clear();
    }

    /// Writes depth overrides into the network and flags those nodes.
    ///
    /// Nodes without an override have their flag cleared.
    pub(crate) fn apply_node_depths(&self, network: &mut Network) {
        let cache = self.lock();
        for (index, node) in network.nodes_mut().iter_mut().enumerate() {
            match cache.node_depths.get(&index) {
                Some(&depth) => {
                    node.old_depth = depth;
                    node.new_depth = depth;
                    node.depth_set_externally = true;
                }
                None => node.depth_set_externally = false,
            }
        }
    }

    /// Adds lateral inflow overrides to node inflows and books them as
    /// external inflow.
    pub(crate) fn apply_lateral_inflows(&self, network: &mut Network, massbal: &mut MassBalance) {
        let cache = self.lock();
        for (&index, &flow) in &cache.lateral_inflows {
            if let Some(node) = network.nodes_mut().get_mut(index) {
                node.new_lat_flow += flow;
                massbal.add_inflow(InflowCategory::External, flow);
            }
        }
    }
}
