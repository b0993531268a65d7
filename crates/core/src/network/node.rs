/// The role a node plays in the network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeKind {
    Junction,
    Storage,
    /// A system outlet. Outflow may be routed onto a subcatchment.
    Outfall { routes_to: Option<usize> },
    Divider,
}

/// A junction, storage unit, outfall, or divider and its hydraulic state.
///
/// Depths are in feet, volumes in cubic feet, and flows in cfs. `old_*`
/// fields hold the state at the start of the current routing step and
/// `new_*` fields the state being computed.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    pub invert_elev: f64,
    pub full_depth: f64,

    pub old_depth: f64,
    pub new_depth: f64,
    pub old_volume: f64,
    pub new_volume: f64,

    pub old_lat_flow: f64,
    pub new_lat_flow: f64,

    /// Total inflow computed by the flow router.
    pub inflow: f64,
    /// Total inflow at the end of the previous routing step.
    pub old_flow_inflow: f64,
    /// Flow lost to flooding when the node overflows.
    pub overflow: f64,

    /// Evaporation volume lost over the current step (storage nodes).
    pub evap_loss: f64,
    /// Exfiltration volume lost over the current step (storage nodes).
    pub exfil_loss: f64,

    /// Set when an external coupling source supplied this step's depth.
    pub depth_set_externally: bool,

    /// Volume routed from an outfall onto a subcatchment over the step.
    pub routed_volume: f64,

    /// Number of links leaving this node.
    pub degree: usize,
}

impl Node {
    /// Creates a dry node of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            invert_elev: 0.0,
            full_depth: 0.0,
            old_depth: 0.0,
            new_depth: 0.0,
            old_volume: 0.0,
            new_volume: 0.0,
            old_lat_flow: 0.0,
            new_lat_flow: 0.0,
            inflow: 0.0,
            old_flow_inflow: 0.0,
            overflow: 0.0,
            evap_loss: 0.0,
            exfil_loss: 0.0,
            depth_set_externally: false,
            routed_volume: 0.0,
            degree: 0,
        }
    }

    /// Sets the invert elevation.
    #[must_use]
    pub fn with_invert(mut self, invert_elev: f64) -> Self {
        self.invert_elev = invert_elev;
        self
    }

    /// Sets the full depth.
    #[must_use]
    pub fn with_full_depth(mut self, full_depth: f64) -> Self {
        self.full_depth = full_depth;
        self
    }

    /// Sets both old and new depth, as for an initial condition.
    #[must_use]
    pub fn with_depth(mut self, depth: f64) -> Self {
        self.old_depth = depth;
        self.new_depth = depth;
        self
    }

    /// Returns `true` for outfall nodes.
    #[must_use]
    pub fn is_outfall(&self) -> bool {
        matches!(self.kind, NodeKind::Outfall { .. })
    }

    /// Returns `true` for storage nodes.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(self.kind, NodeKind::Storage)
    }

    /// Returns the hydraulic head (depth plus invert elevation).
    #[must_use]
    pub fn head(&self) -> f64 {
        self.new_depth + self.invert_elev
    }

    /// Returns the flow leaving the system at this node and whether it is flooding.
    ///
    /// Outfalls discharge their total inflow, which is negative under reverse
    /// flow. Other nodes discharge only their overflow.
    #[must_use]
    pub fn system_outflow(&self) -> (f64, bool) {
        if self.is_outfall() {
            (self.inflow, false)
        } else if self.overflow > 0.0 {
            (self.overflow, true)
        } else {
            (0.0, false)
        }
    }

    /// Copies new state into old state at the start of a routing step.
    pub fn save_state(&mut self) {
        self.old_depth = self.new_depth;
        self.old_volume = self.new_volume;
        self.old_flow_inflow = self.inflow;
    }
}
