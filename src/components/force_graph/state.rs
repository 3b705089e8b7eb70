use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use super::interaction::{CameraCommand, Hover};
use super::types::{EdgeIdx, GraphSnapshot, NodeId};

pub const ZOOM_MIN: f64 = 0.1;
pub const ZOOM_MAX: f64 = 10.0;
/// Pointer travel (screen px) below which a press-release counts as a click.
const CLICK_SLOP: f64 = 3.0;
const SEED_RADIUS: f64 = 100.0;
/// Screen distance within which the pointer is on a link.
const LINK_HIT_PX: f64 = 4.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: NodeId,
	/// Position of the node in `GraphSnapshot::nodes`.
	pub slot: usize,
}

#[derive(Clone, Copy, Debug)]
pub struct LayoutEdge {
	pub source: DefaultNodeIdx,
	pub target: DefaultNodeIdx,
	pub edge: EdgeIdx,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub center_start_x: f64,
	pub center_start_y: f64,
}

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

#[derive(Clone, Copy, Debug)]
struct Tween {
	from: f64,
	to: f64,
	elapsed_ms: f64,
	duration_ms: f64,
}

impl Tween {
	fn new(from: f64, to: f64, duration_ms: f64) -> Self {
		Self {
			from,
			to,
			elapsed_ms: 0.0,
			duration_ms,
		}
	}

	fn advance(&mut self, dt_ms: f64) -> f64 {
		self.elapsed_ms += dt_ms;
		if self.is_done() {
			return self.to;
		}
		let t = ease_out_cubic(self.elapsed_ms / self.duration_ms);
		self.from + (self.to - self.from) * t
	}

	fn is_done(&self) -> bool {
		self.duration_ms <= 0.0 || self.elapsed_ms >= self.duration_ms
	}
}

/// Viewport in graph coordinates: the point shown at the canvas centre and
/// the zoom factor. `center_at` and `zoom` animate towards their targets.
#[derive(Clone, Debug)]
pub struct Camera {
	pub center_x: f64,
	pub center_y: f64,
	pub k: f64,
	center_tween: Option<(Tween, Tween)>,
	zoom_tween: Option<Tween>,
}

impl Default for Camera {
	fn default() -> Self {
		Self {
			center_x: 0.0,
			center_y: 0.0,
			k: 1.0,
			center_tween: None,
			zoom_tween: None,
		}
	}
}

impl Camera {
	pub fn center_at(&mut self, x: f64, y: f64, duration_ms: f64) {
		self.center_tween = Some((
			Tween::new(self.center_x, x, duration_ms),
			Tween::new(self.center_y, y, duration_ms),
		));
		if duration_ms <= 0.0 {
			self.tick(0.0);
		}
	}

	pub fn zoom(&mut self, k: f64, duration_ms: f64) {
		self.zoom_tween = Some(Tween::new(self.k, k.clamp(ZOOM_MIN, ZOOM_MAX), duration_ms));
		if duration_ms <= 0.0 {
			self.tick(0.0);
		}
	}

	/// Stops any running animation; manual pan or zoom takes over.
	pub fn halt(&mut self) {
		self.center_tween = None;
		self.zoom_tween = None;
	}

	pub fn tick(&mut self, dt_ms: f64) {
		if let Some((tx, ty)) = &mut self.center_tween {
			self.center_x = tx.advance(dt_ms);
			self.center_y = ty.advance(dt_ms);
			if tx.is_done() {
				self.center_tween = None;
			}
		}
		if let Some(tk) = &mut self.zoom_tween {
			self.k = tk.advance(dt_ms);
			if tk.is_done() {
				self.zoom_tween = None;
			}
		}
	}
}

/// Force-directed layout plus viewport and pointer bookkeeping.
pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub camera: Camera,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	pointer: Hover,
	id_to_idx: HashMap<NodeId, DefaultNodeIdx>,
	edges: Vec<LayoutEdge>,
}

fn simulation() -> ForceGraph<NodeInfo, ()> {
	ForceGraph::new(SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	})
}

impl ForceGraphState {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			graph: simulation(),
			camera: Camera::default(),
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			flow_time: 0.0,
			pointer: Hover::Nothing,
			id_to_idx: HashMap::new(),
			edges: Vec::new(),
		}
	}

	/// Rebuilds the simulation for `snapshot`. Nodes that survive from the
	/// previous snapshot keep their position and pin state.
	pub fn load(&mut self, snapshot: &GraphSnapshot) {
		let mut previous: HashMap<NodeId, (f32, f32, bool)> = HashMap::new();
		self.graph.visit_nodes(|node| {
			previous.insert(
				node.data.user_data.id.clone(),
				(node.x(), node.y(), node.data.is_anchor),
			);
		});

		let mut graph = simulation();
		let mut id_to_idx = HashMap::new();
		let count = snapshot.nodes.len().max(1) as f64;

		for (slot, node) in snapshot.nodes.iter().enumerate() {
			let (x, y, is_anchor) = previous.get(&node.id).copied().unwrap_or_else(|| {
				let angle = slot as f64 * 2.0 * PI / count;
				(
					(SEED_RADIUS * angle.cos()) as f32,
					(SEED_RADIUS * angle.sin()) as f32,
					false,
				)
			});
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: 10.0,
				is_anchor,
				user_data: NodeInfo {
					id: node.id.clone(),
					slot,
				},
			});
			id_to_idx.insert(node.id.clone(), idx);
		}

		let mut edges = Vec::new();
		for (edge_idx, edge) in snapshot.edges.iter().enumerate() {
			if let (Some(&source), Some(&target)) =
				(id_to_idx.get(&edge.source), id_to_idx.get(&edge.target))
			{
				graph.add_edge(source, target, EdgeData::default());
				edges.push(LayoutEdge {
					source,
					target,
					edge: edge_idx,
				});
			}
		}

		self.graph = graph;
		self.id_to_idx = id_to_idx;
		self.edges = edges;
		self.drag = DragState::default();
		self.pointer = Hover::Nothing;
	}

	pub fn edges(&self) -> &[LayoutEdge] {
		&self.edges
	}

	pub fn transform(&self) -> ViewTransform {
		let k = self.camera.k;
		ViewTransform {
			x: self.width / 2.0 - self.camera.center_x * k,
			y: self.height / 2.0 - self.camera.center_y * k,
			k,
		}
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		let t = self.transform();
		((sx - t.x) / t.k, (sy - t.y) / t.k)
	}

	pub fn positions(&self) -> HashMap<DefaultNodeIdx, (f64, f64)> {
		let mut out = HashMap::with_capacity(self.id_to_idx.len());
		self.graph.visit_nodes(|node| {
			out.insert(node.index(), (node.x() as f64, node.y() as f64));
		});
		out
	}

	pub fn node_position(&self, id: &str) -> Option<(f64, f64)> {
		let idx = *self.id_to_idx.get(id)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some((node.x() as f64, node.y() as f64));
			}
		});
		found
	}

	/// Topmost node under the pointer. `radius` returns the painted radius
	/// of a node, or `None` for nodes that are currently hidden.
	pub fn node_at_position(
		&self,
		sx: f64,
		sy: f64,
		radius: impl Fn(&NodeInfo) -> Option<f64>,
	) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let Some(r) = radius(&node.data.user_data) else {
				return;
			};
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			if (dx * dx + dy * dy).sqrt() < r {
				found = Some(node.index());
			}
		});
		found
	}

	/// Closest visible link within [`LINK_HIT_PX`] of the pointer.
	pub fn link_at_position(
		&self,
		sx: f64,
		sy: f64,
		visible: impl Fn(EdgeIdx) -> bool,
	) -> Option<EdgeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let tolerance = LINK_HIT_PX / self.camera.k;
		let positions = self.positions();
		self.edges
			.iter()
			.filter(|link| visible(link.edge))
			.filter_map(|link| {
				let (&a, &b) = (positions.get(&link.source)?, positions.get(&link.target)?);
				Some((link.edge, segment_distance((gx, gy), a, b)))
			})
			.filter(|&(_, d)| d <= tolerance)
			.min_by(|x, y| x.1.total_cmp(&y.1))
			.map(|(edge, _)| edge)
	}

	fn node_id(&self, idx: DefaultNodeIdx) -> Option<NodeId> {
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some(node.data.user_data.id.clone());
			}
		});
		found
	}

	pub fn pointer_down(&mut self, x: f64, y: f64, radius: impl Fn(&NodeInfo) -> Option<f64>) {
		if let Some(idx) = self.node_at_position(x, y, radius) {
			self.drag = DragState {
				active: true,
				moved: false,
				node_idx: Some(idx),
				start_x: x,
				start_y: y,
				..DragState::default()
			};
			self.graph.visit_nodes(|node| {
				if node.index() == idx {
					self.drag.node_start_x = node.x();
					self.drag.node_start_y = node.y();
				}
			});
		} else {
			self.camera.halt();
			self.pan = PanState {
				active: true,
				start_x: x,
				start_y: y,
				center_start_x: self.camera.center_x,
				center_start_y: self.camera.center_y,
			};
		}
	}

	/// Moves a dragged node or pans. When neither is in progress, tracks what
	/// is under the pointer (nodes before links) and returns it if it changed.
	pub fn pointer_move(
		&mut self,
		x: f64,
		y: f64,
		radius: impl Fn(&NodeInfo) -> Option<f64>,
		link_visible: impl Fn(EdgeIdx) -> bool,
	) -> Option<Hover> {
		let k = self.camera.k;
		if self.drag.active {
			let (sdx, sdy) = (x - self.drag.start_x, y - self.drag.start_y);
			if !self.drag.moved && (sdx * sdx + sdy * sdy).sqrt() < CLICK_SLOP {
				return None;
			}
			self.drag.moved = true;
			if let Some(idx) = self.drag.node_idx {
				let (nx, ny) = (
					self.drag.node_start_x + (sdx / k) as f32,
					self.drag.node_start_y + (sdy / k) as f32,
				);
				self.graph.visit_nodes_mut(|node| {
					if node.index() == idx {
						node.data.x = nx;
						node.data.y = ny;
						node.data.is_anchor = true;
					}
				});
			}
			return None;
		}
		if self.pan.active {
			self.camera.center_x = self.pan.center_start_x - (x - self.pan.start_x) / k;
			self.camera.center_y = self.pan.center_start_y - (y - self.pan.start_y) / k;
			return None;
		}

		let hovered = match self.node_at_position(x, y, radius) {
			Some(idx) => self.node_id(idx).map_or(Hover::Nothing, Hover::Node),
			None => self
				.link_at_position(x, y, link_visible)
				.map_or(Hover::Nothing, Hover::Link),
		};
		if hovered == self.pointer {
			return None;
		}
		self.pointer = hovered.clone();
		Some(hovered)
	}

	/// Ends a drag or pan. A press and release on a node without moving is a
	/// click on that node.
	pub fn pointer_up(&mut self) -> Option<NodeId> {
		let clicked = match (&self.drag, self.drag.node_idx) {
			(d, Some(idx)) if d.active && !d.moved => self.node_id(idx),
			_ => None,
		};
		self.drag = DragState::default();
		self.pan.active = false;
		clicked
	}

	/// Pointer left the canvas. Returns true when a hover was in progress.
	pub fn pointer_leave(&mut self) -> bool {
		self.drag = DragState::default();
		self.pan.active = false;
		std::mem::take(&mut self.pointer) != Hover::Nothing
	}

	/// Zooms by one wheel step, keeping the graph point under the pointer
	/// fixed on screen.
	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
		self.camera.halt();
		let (gx, gy) = self.screen_to_graph(x, y);
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let k = (self.camera.k * factor).clamp(ZOOM_MIN, ZOOM_MAX);
		self.camera.k = k;
		self.camera.center_x = gx - (x - self.width / 2.0) / k;
		self.camera.center_y = gy - (y - self.height / 2.0) / k;
	}

	pub fn apply_camera(&mut self, command: &CameraCommand) {
		match command {
			CameraCommand::CenterOnNode {
				node,
				zoom,
				center_ms,
				zoom_ms,
			} => {
				if let Some((x, y)) = self.node_position(node) {
					self.camera.center_at(x, y, *center_ms);
				}
				self.camera.zoom(*zoom, *zoom_ms);
			}
			CameraCommand::CenterOnOrigin {
				zoom,
				center_ms,
				zoom_ms,
			} => {
				self.camera.center_at(0.0, 0.0, *center_ms);
				self.camera.zoom(*zoom, *zoom_ms);
			}
		}
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);
		self.flow_time += dt as f64;
		self.camera.tick(dt as f64 * 1000.0);
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
	let (dx, dy) = (b.0 - a.0, b.1 - a.1);
	let len2 = dx * dx + dy * dy;
	let t = if len2 == 0.0 {
		0.0
	} else {
		(((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len2).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
	((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}
