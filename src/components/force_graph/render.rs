use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::interaction::InteractionState;
use super::paint;
use super::state::ForceGraphState;
use super::types::GraphSnapshot;
use crate::config::Theme;

/// Everything a frame depends on besides the layout.
pub struct Frame<'a> {
	pub snapshot: &'a GraphSnapshot,
	pub interaction: &'a InteractionState,
	pub theme: Theme,
}

/// Paints the background only, wiping whatever the last frame drew.
pub fn clear(state: &ForceGraphState, theme: Theme, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(paint::background(theme));
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
}

pub fn render(state: &ForceGraphState, frame: &Frame<'_>, ctx: &CanvasRenderingContext2d) {
	clear(state, frame.theme, ctx);
	ctx.save();
	let t = state.transform();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	draw_links(state, frame, ctx);
	draw_nodes(state, frame, ctx);
	ctx.restore();
}

fn draw_links(state: &ForceGraphState, frame: &Frame<'_>, ctx: &CanvasRenderingContext2d) {
	let positions = state.positions();
	let k = state.transform().k;

	for link in state.edges() {
		let Some(edge) = frame.snapshot.edges.get(link.edge) else {
			continue;
		};
		if !paint::link_visible(frame.snapshot, edge, frame.interaction) {
			continue;
		}
		let (Some(&(x1, y1)), Some(&(x2, y2))) =
			(positions.get(&link.source), positions.get(&link.target))
		else {
			continue;
		};

		let highlighted = frame.interaction.highlighted_links().contains(&link.edge);
		ctx.set_stroke_style_str(paint::link_color(highlighted, frame.theme));
		ctx.set_line_width(paint::link_width(highlighted) / k);
		ctx.begin_path();
		ctx.move_to(x1, y1);
		ctx.line_to(x2, y2);
		ctx.stroke();

		let particle = paint::link_particle_width(highlighted);
		if particle <= 0.0 {
			continue;
		}
		// particles run source -> target, evenly spaced, one lap per second
		ctx.set_fill_style_str(paint::link_color(true, frame.theme));
		for i in 0..paint::LINK_PARTICLES {
			let phase = (state.flow_time + i as f64 / paint::LINK_PARTICLES as f64).fract();
			let (px, py) = (x1 + (x2 - x1) * phase, y1 + (y2 - y1) * phase);
			ctx.begin_path();
			let _ = ctx.arc(px, py, particle / 2.0, 0.0, 2.0 * PI);
			ctx.fill();
		}
	}
}

fn draw_nodes(state: &ForceGraphState, frame: &Frame<'_>, ctx: &CanvasRenderingContext2d) {
	state.graph.visit_nodes(|layout_node| {
		let Some(node) = frame.snapshot.nodes.get(layout_node.data.user_data.slot) else {
			return;
		};
		if !paint::node_visible(node, frame.interaction) {
			return;
		}
		let (x, y) = (layout_node.x() as f64, layout_node.y() as f64);
		let size = paint::node_paint_size(node, frame.interaction);

		ctx.begin_path();
		let _ = ctx.arc(x, y, size, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(&paint::node_fill(node, frame.interaction, frame.theme));
		ctx.fill();
		ctx.set_line_width(paint::NODE_STROKE_WIDTH);
		ctx.set_stroke_style_str(paint::NODE_STROKE);
		ctx.stroke();

		let fit = paint::fit_label(&node.id, size, |text, font_size| {
			ctx.set_font(&format!("{font_size}px Arial"));
			ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0)
		});
		ctx.set_font(&format!("{}px Arial", fit.font_size));
		ctx.set_fill_style_str(paint::LABEL_COLOR);
		let _ = ctx.fill_text(&node.id, x - fit.width / 2.0, y + fit.font_size / 2.0);
	});
}
