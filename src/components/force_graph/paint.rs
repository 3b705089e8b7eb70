//! Draw parameters derived from a snapshot and the interaction state.
//!
//! Everything here is a pure function; `render` turns the results into
//! canvas calls.

use super::interaction::InteractionState;
use super::types::{EntityKey, GraphEdge, GraphNode, GraphSnapshot};
use crate::config::Theme;

/// Ceiling on a node's painted radius.
pub const NODE_MAX: u32 = 24;
pub const NODE_STROKE_WIDTH: f64 = 0.5;
pub const NODE_STROKE: &str = "#fff";
pub const LABEL_COLOR: &str = "#fff";
pub const LABEL_FONT_MAX: i32 = 16;
const LABEL_OFFSET: f64 = 2.0;
/// Particles travelling along each highlighted link.
pub const LINK_PARTICLES: usize = 2;

const COLORS: &[&str] = &[
	"#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
	"#bcbd22", "#17becf",
];

pub fn background(theme: Theme) -> &'static str {
	match theme {
		Theme::Light => "#fafafa",
		Theme::Dark => "#1a1a2e",
	}
}

fn is_key_active(state: &InteractionState, entity_type: Option<&str>) -> bool {
	state
		.active_entity_types()
		.iter()
		.any(|k| k.as_deref() == entity_type)
}

/// Untyped nodes are always shown; typed ones follow the filter.
pub fn node_visible(node: &GraphNode, state: &InteractionState) -> bool {
	match node.entity_type() {
		None => true,
		Some(t) => is_key_active(state, Some(t)),
	}
}

/// Both endpoints must exist and both of their groups must be switched on.
pub fn link_visible(snapshot: &GraphSnapshot, edge: &GraphEdge, state: &InteractionState) -> bool {
	let (Some(source), Some(target)) = (snapshot.node(&edge.source), snapshot.node(&edge.target))
	else {
		return false;
	};
	is_key_active(state, source.entity_type()) && is_key_active(state, target.entity_type())
}

pub fn node_radius(node: &GraphNode) -> f64 {
	node.value.min(NODE_MAX) as f64
}

pub fn node_paint_size(node: &GraphNode, state: &InteractionState) -> f64 {
	let hovered = state.hovered_node() == Some(node.id.as_str());
	node_radius(node) + if hovered { 1.0 } else { 0.0 }
}

/// Stable categorical color per entity type.
pub fn entity_color(key: &EntityKey) -> &'static str {
	let name = key.as_deref().unwrap_or("");
	COLORS[(fnv1a(name.as_bytes()) % COLORS.len() as u64) as usize]
}

fn fnv1a(bytes: &[u8]) -> u64 {
	bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
		(hash ^ *b as u64).wrapping_mul(0x0100_0000_01b3)
	})
}

/// Grayscale variant used for nodes outside the focused neighbourhood.
pub fn muted_color(hex: &str, theme: Theme) -> String {
	let Some((r, g, b)) = parse_hex(hex) else {
		return hex.to_string();
	};
	let luma = (0.3 * r as f64 + 0.59 * g as f64 + 0.11 * b as f64) / 255.0;
	let lightness = match theme {
		Theme::Light => luma * 1.6,
		Theme::Dark => luma * 0.7,
	}
	.clamp(0.0, 1.0);
	let v = (lightness * 255.0).round() as u8;
	format!("rgb({v}, {v}, {v})")
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
	let hex = hex.strip_prefix('#')?;
	if hex.len() != 6 {
		return None;
	}
	let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
	Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Full color when nothing is focused or the node is part of the focus;
/// muted otherwise.
pub fn node_fill(node: &GraphNode, state: &InteractionState, theme: Theme) -> String {
	let color = entity_color(&node.entity_key());
	let focused = state.highlighted_nodes();
	if focused.is_empty() || focused.contains(&node.id) {
		color.to_string()
	} else {
		muted_color(color, theme)
	}
}

pub fn link_color(highlighted: bool, theme: Theme) -> &'static str {
	match (theme, highlighted) {
		(Theme::Dark, true) => "#585858",
		(Theme::Dark, false) => "#383838",
		(Theme::Light, true) => "#bbb",
		(Theme::Light, false) => "#ddd",
	}
}

pub fn link_width(highlighted: bool) -> f64 {
	if highlighted { 2.0 } else { 1.0 }
}

pub fn link_particle_width(highlighted: bool) -> f64 {
	if highlighted { 3.0 } else { 0.0 }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelFit {
	pub font_size: f64,
	/// Measured text width at `font_size`.
	pub width: f64,
}

/// Shrinks the label one pixel at a time until it fits inside `radius`.
/// Never drops below 1px; the label is always drawn.
pub fn fit_label(text: &str, radius: f64, mut measure: impl FnMut(&str, f64) -> f64) -> LabelFit {
	let mut font_size = LABEL_FONT_MAX;
	let mut width;
	loop {
		font_size -= 1;
		width = measure(text, font_size as f64) - LABEL_OFFSET;
		if !(width > radius && font_size > 0) {
			break;
		}
	}
	if font_size <= 0 {
		font_size = 1;
		width = measure(text, font_size as f64) - LABEL_OFFSET;
	}
	LabelFit {
		font_size: font_size as f64,
		width: width + LABEL_OFFSET,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::force_graph::loader::LoadedGraph;

	fn graph() -> LoadedGraph {
		LoadedGraph::from_raw(
			serde_json::from_value(json!({
				"nodes": [
					{"id": "alice", "properties": {"entity_type": "person"}},
					{"id": "acme", "properties": {"entity_type": "org"}},
					{"id": "bob", "properties": {"entity_type": "person"}},
					{"id": "misc", "properties": {}},
				],
				"edges": [
					{"source": "alice", "target": "acme"},
					{"source": "alice", "target": "bob"},
					{"source": "bob", "target": "ghost"},
					{"source": "misc", "target": "bob"},
				],
			}))
			.unwrap(),
		)
	}

	fn person_only(g: &LoadedGraph) -> InteractionState {
		let mut s = InteractionState::default();
		s.sync_snapshot(&g.snapshot, &g.groups);
		s.toggle_entity_type(&Some("org".into()));
		s.toggle_entity_type(&None);
		s
	}

	#[test]
	fn filtered_type_hides_nodes_and_their_links() {
		let g = graph();
		let s = person_only(&g);
		let snap = &g.snapshot;

		assert!(node_visible(snap.node("alice").unwrap(), &s));
		assert!(!node_visible(snap.node("acme").unwrap(), &s));
		assert!(!link_visible(snap, &snap.edges[0], &s));
		assert!(link_visible(snap, &snap.edges[1], &s));
	}

	#[test]
	fn untyped_node_visible_but_its_links_follow_untyped_group() {
		let g = graph();
		let s = person_only(&g);
		let snap = &g.snapshot;
		assert!(node_visible(snap.node("misc").unwrap(), &s));
		assert!(!link_visible(snap, &snap.edges[3], &s));

		let mut all = InteractionState::default();
		all.sync_snapshot(snap, &g.groups);
		assert!(link_visible(snap, &snap.edges[3], &all));
	}

	#[test]
	fn dangling_edge_is_never_visible() {
		let g = graph();
		let mut s = InteractionState::default();
		s.sync_snapshot(&g.snapshot, &g.groups);
		assert!(!link_visible(&g.snapshot, &g.snapshot.edges[2], &s));
	}

	#[test]
	fn paint_size_is_capped_and_grows_on_hover() {
		let g = graph();
		let mut heavy = g.snapshot.node("alice").unwrap().clone();
		heavy.value = 40;
		let s = InteractionState::default();
		assert_eq!(node_paint_size(&heavy, &s), NODE_MAX as f64);

		let mut hovering = InteractionState::default();
		hovering.set_hovered_node(&g.snapshot, Some("alice"));
		assert_eq!(node_paint_size(&heavy, &hovering), NODE_MAX as f64 + 1.0);
		let bob = g.snapshot.node("bob").unwrap();
		assert_eq!(node_paint_size(bob, &hovering), 7.0);
	}

	#[test]
	fn entity_colors_are_stable_per_type() {
		let person = Some("person".to_string());
		assert_eq!(entity_color(&person), entity_color(&person.clone()));
		assert!(COLORS.contains(&entity_color(&None)));
	}

	#[test]
	fn nodes_outside_focus_are_muted() {
		let g = graph();
		let mut s = InteractionState::default();
		let acme = g.snapshot.node("acme").unwrap();
		let bob = g.snapshot.node("bob").unwrap();
		assert_eq!(node_fill(bob, &s, Theme::Light), entity_color(&bob.entity_key()));

		s.set_active_node(&g.snapshot, Some("acme"));
		assert_eq!(node_fill(acme, &s, Theme::Light), entity_color(&acme.entity_key()));
		assert!(node_fill(bob, &s, Theme::Light).starts_with("rgb("));
	}

	#[test]
	fn background_follows_theme() {
		assert_ne!(background(Theme::Light), background(Theme::Dark));
		assert!(background(Theme::Dark).starts_with('#'));
	}

	#[test]
	fn link_hover_leaves_node_colors_alone() {
		let g = graph();
		let mut s = InteractionState::default();
		s.set_hovered_link(&g.snapshot, Some(1));
		assert!(s.highlighted_links().contains(&1));
		let acme = g.snapshot.node("acme").unwrap();
		assert_eq!(node_fill(acme, &s, Theme::Light), entity_color(&acme.entity_key()));
	}

	#[test]
	fn muted_color_is_gray_and_theme_dependent() {
		// luma of #1f77b4 is 99.31 / 255
		assert_eq!(muted_color("#1f77b4", Theme::Light), "rgb(159, 159, 159)");
		assert_eq!(muted_color("#1f77b4", Theme::Dark), "rgb(70, 70, 70)");
		assert_eq!(muted_color("not-a-color", Theme::Dark), "not-a-color");
	}

	#[test]
	fn label_shrinks_until_it_fits() {
		let measure = |text: &str, size: f64| text.len() as f64 * size * 0.5;
		let fit = fit_label("abcd", 10.0, measure);
		// 4 * size * 0.5 - 2 <= 10  =>  size <= 6
		assert_eq!(fit.font_size, 6.0);
		assert_eq!(fit.width, 12.0);
	}

	#[test]
	fn label_never_disappears() {
		let fit = fit_label("a very long entity name", 0.5, |t, s| t.len() as f64 * s);
		assert_eq!(fit.font_size, 1.0);
		assert!(fit.width > 0.0);
	}
}
