pub mod collection_graph;
pub mod force_graph;
mod graph_panels;
