//! # Graph Model
//!
//! Star topology handed to the renderer: the first host of the inventory is the
//! root and every other host hangs off it.

use serde::Serialize;

use crate::network::host::{HostInventory, HostRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphModel {
    nodes: HostInventory,
    edges: Vec<Edge>,
}

impl GraphModel {
    /// Links every non-root host to `inventory[0]`. Edge order follows node order.
    pub fn star(inventory: HostInventory) -> Self {
        let edges: Vec<Edge> = match inventory.split_first() {
            Some((root, rest)) => rest
                .iter()
                .map(|host| Edge {
                    source: root.address().to_string(),
                    target: host.address().to_string(),
                })
                .collect(),
            None => Vec::new(),
        };

        Self {
            nodes: inventory,
            edges,
        }
    }

    pub fn nodes(&self) -> &[HostRecord] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn root(&self) -> Option<&HostRecord> {
        self.nodes.first()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
