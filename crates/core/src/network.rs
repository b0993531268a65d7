//! Nodes, links, and the network that owns them.

mod link;
mod node;

use thiserror::Error;

pub use link::{Link, LinkKind};
pub use node::{Node, NodeKind};

/// Errors raised when assembling a [`Network`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("link `{link}` refers to node index {node}, but the network has {count} nodes")]
    UnknownNode {
        link: String,
        node: usize,
        count: usize,
    },

    #[error("duplicate {kind} name `{name}`")]
    DuplicateName { kind: &'static str, name: String },
}

/// A drainage network: nodes connected by links.
///
/// Nodes and links are addressed by their index in insertion order, which is
/// the index used by rules, inflow sources, and the coupling cache.
#[derive(Debug, Clone, Default)]
pub struct Network {
    nodes: Vec<Node>,
    links: Vec<Link>,
}

impl Network {
    /// Builds a network and computes each node's degree.
    ///
    /// # Errors
    ///
    /// Returns an error if a link refers to a missing node or if two nodes
    /// or two links share a name.
    pub fn new(mut nodes: Vec<Node>, links: Vec<Link>) -> Result<Self, NetworkError> {
        check_unique("node", nodes.iter().map(|n| n.name.as_str()))?;
        check_unique("link", links.iter().map(|l| l.name.as_str()))?;

        for node in &mut nodes {
            node.degree = 0;
        }
        for link in &links {
            for index in [link.node1, link.node2] {
                if index >= nodes.len() {
                    return Err(NetworkError::UnknownNode {
                        link: link.name.clone(),
                        node: index,
                        count: nodes.len(),
                    });
                }
            }
            nodes[link.node1].degree += 1;
        }

        Ok(Self { nodes, links })
    }

    /// Returns all nodes.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns all nodes mutably.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    /// Returns all links.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Returns all links mutably.
    pub fn links_mut(&mut self) -> &mut [Link] {
        &mut self.links
    }

    /// Returns the node at `index`.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Returns the link at `index`.
    #[must_use]
    pub fn link(&self, index: usize) -> Option<&Link> {
        self.links.get(index)
    }

    /// Returns the index of the node named `name` (case-insensitive).
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.name.eq_ignore_ascii_case(name))
    }

    /// Returns the index of the link named `name` (case-insensitive).
    #[must_use]
    pub fn find_link(&self, name: &str) -> Option<usize> {
        self.links
            .iter()
            .position(|l| l.name.eq_ignore_ascii_case(name))
    }

    /// Computes every link's target setting before rules are evaluated.
    ///
    /// A pump with a shutoff depth stops when its inlet node drains below
    /// it. A pump with a startup depth starts once its inlet node rises
    /// above it. All other links keep their current setting as the target.
    pub fn update_target_settings(&mut self) {
        for link in &mut self.links {
            link.target_setting = link.setting;
            if let LinkKind::Pump {
                startup_depth,
                shutoff_depth,
            } = link.kind
            {
                let inlet_depth = self.nodes[link.node1].new_depth;
                if shutoff_depth > 0.0 && link.setting > 0.0 && inlet_depth < shutoff_depth {
                    link.target_setting = 0.0;
                }
                if startup_depth > 0.0 && link.setting == 0.0 && inlet_depth > startup_depth {
                    link.target_setting = 1.0;
                }
            }
        }
    }

    /// Moves each link's setting to its target and returns how many changed.
    ///
    /// A change that opens a closed link or closes an open one stamps the
    /// link's `time_last_set` with `now_days`.
    pub fn realize_target_settings(&mut self, now_days: f64) -> usize {
        let mut changed = 0;
        for link in &mut self.links {
            #[allow(clippy::float_cmp)]
            if link.target_setting != link.setting {
                if link.target_setting * link.setting == 0.0 {
                    link.time_last_set = now_days;
                }
                link.setting = link.target_setting;
                changed += 1;
            }
        }
        changed
    }

    /// Copies every node's and link's new state into its old state.
    pub fn save_hydraulic_state(&mut self) {
        self.nodes.iter_mut().for_each(Node::save_state);
        self.links.iter_mut().for_each(Link::save_state);
    }

    /// Returns the total volume currently stored at nodes.
    #[must_use]
    pub fn node_storage(&self) -> f64 {
        self.nodes.iter().map(|n| n.new_volume).sum()
    }
}

fn check_unique<'a>(
    kind: &'static str,
    names: impl Iterator<Item = &'a str>,
) -> Result<(), NetworkError> {
    let mut seen: Vec<String> = Vec::new();
    for name in names {
        let key = name.to_ascii_uppercase();
        if seen.contains(&key) {
            return Err(NetworkError::DuplicateName {
                kind,
                name: name.to_owned(),
            });
        }
        seen.push(key);
    }
    Ok(())
}
