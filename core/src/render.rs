//! Visualization artifact.
//!
//! [`HtmlRenderer`] writes one self-contained page: the graph is inlined as a
//! JSON literal and drawn by a D3 force simulation loaded from the D3 CDN.

use std::fmt::Debug;
use std::io;
use std::path::Path;

use async_trait::async_trait;
use scanmap_common::error::StageError;
use scanmap_common::graph::GraphModel;
use tracing::debug;

#[async_trait]
pub trait Renderer: Send + Sync + Debug {
    async fn render(&self, graph: &GraphModel, path: &Path) -> Result<(), StageError>;
}

const GRAPH_PLACEHOLDER: &str = "__GRAPH_JSON__";

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Network Visualization</title>
    <script src="https://d3js.org/d3.v7.min.js"></script>
    <style>
        .node {
            stroke: #fff;
            stroke-width: 1.5px;
        }
        .link {
            stroke: #999;
            stroke-opacity: 0.6;
        }
    </style>
</head>
<body>
    <svg width="960" height="600"></svg>
    <script>
        const graph = __GRAPH_JSON__;

        const svg = d3.select("svg"),
              width = +svg.attr("width"),
              height = +svg.attr("height");

        const simulation = d3.forceSimulation()
            .force("link", d3.forceLink().id(d => d.address))
            .force("charge", d3.forceManyBody().strength(-100))
            .force("center", d3.forceCenter(width / 2, height / 2));

        const links = graph.edges.map(e => ({ source: e.source, target: e.target }));

        const link = svg.append("g")
            .attr("class", "links")
            .selectAll("line")
            .data(links)
            .enter().append("line")
            .attr("class", "link");

        const node = svg.append("g")
            .attr("class", "nodes")
            .selectAll("circle")
            .data(graph.nodes)
            .enter().append("circle")
            .attr("class", "node")
            .attr("r", 5)
            .call(d3.drag()
                .on("start", dragstarted)
                .on("drag", dragged)
                .on("end", dragended));

        node.append("title")
            .text(d => d.hostname + " (" + d.address + ")");

        simulation
            .nodes(graph.nodes)
            .on("tick", ticked);

        simulation.force("link")
            .links(links);

        function ticked() {
            link
                .attr("x1", d => d.source.x)
                .attr("y1", d => d.source.y)
                .attr("x2", d => d.target.x)
                .attr("y2", d => d.target.y);

            node
                .attr("cx", d => d.x)
                .attr("cy", d => d.y);
        }

        function dragstarted(event, d) {
            if (!event.active) simulation.alphaTarget(0.3).restart();
            d.fx = d.x;
            d.fy = d.y;
        }

        function dragged(event, d) {
            d.fx = event.x;
            d.fy = event.y;
        }

        function dragended(event, d) {
            if (!event.active) simulation.alphaTarget(0);
            d.fx = null;
            d.fy = null;
        }
    </script>
</body>
</html>
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlRenderer;

impl HtmlRenderer {
    /// The full page for `graph`.
    pub fn page(graph: &GraphModel) -> Result<String, serde_json::Error> {
        // A hostname containing `</script>` must not end the script block.
        let json = serde_json::to_string(graph)?.replace("</", "<\\/");
        Ok(PAGE_TEMPLATE.replace(GRAPH_PLACEHOLDER, &json))
    }
}

#[async_trait]
impl Renderer for HtmlRenderer {
    async fn render(&self, graph: &GraphModel, path: &Path) -> Result<(), StageError> {
        let artifact_error = |source: io::Error| StageError::ArtifactWrite {
            path: path.to_path_buf(),
            source,
        };

        let page = Self::page(graph).map_err(|e| artifact_error(io::Error::other(e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(artifact_error)?;
        }
        tokio::fs::write(path, page).await.map_err(artifact_error)?;

        debug!(artifact = %path.display(), nodes = graph.nodes().len(), "artifact written");
        Ok(())
    }
}
