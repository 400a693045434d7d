use scanmap_common::graph::GraphModel;
use scanmap_common::network::host::HostInventory;
use tracing::debug;

/// Turns the inventory into the star graph handed to the renderer.
pub fn build(inventory: &HostInventory) -> GraphModel {
    let graph = GraphModel::star(inventory.clone());
    debug!(
        nodes = graph.nodes().len(),
        edges = graph.edges().len(),
        "graph model built"
    );
    graph
}
