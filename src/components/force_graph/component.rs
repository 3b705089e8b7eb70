use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use leptos::prelude::*;
use log::error;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent};

use super::interaction::{CameraCommand, Hover, InteractionState};
use super::paint;
use super::render::{self, Frame};
use super::state::{ForceGraphState, NodeInfo};
use super::types::{EdgeIdx, GraphSnapshot, NodeId};
use crate::config::Theme;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

fn detach_resize(listener: &mut Option<Closure<dyn FnMut()>>) {
	let (Some(cb), Some(window)) = (listener.take(), web_sys::window()) else {
		return;
	};
	let _ = window.remove_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
}

fn container_size(canvas: &HtmlCanvasElement) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|(w, h)| *w > 0.0 && *h > 0.0)
		.unwrap_or((800.0, 600.0))
}

fn pointer_position(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get_untracked()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	))
}

/// Canvas view of a graph snapshot.
///
/// Owns the layout and viewport only. Focus and filters live in the
/// `interaction` signal owned by the caller; pointer clicks and hover
/// changes (node or link) are reported through the callbacks, and camera
/// moves arrive through `camera`.
#[component]
pub fn ForceGraphCanvas(
	#[prop(into)] snapshot: Signal<Option<Arc<GraphSnapshot>>>,
	interaction: RwSignal<InteractionState>,
	#[prop(into)] camera: Signal<Option<CameraCommand>>,
	#[prop(into)] on_node_click: Callback<NodeId>,
	#[prop(into)] on_hover: Callback<Hover>,
	#[prop(into)] theme: Signal<Theme>,
	#[prop(into)] fullscreen: Signal<bool>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<ForceGraphState>>> = Rc::new(RefCell::new(None));
	let animate: FrameCallback = Rc::new(RefCell::new(None));
	// Held outside the effects so it outlives them until the listener is removed.
	let resize_listener = StoredValue::new_local(None::<Closure<dyn FnMut()>>);
	let alive = Arc::new(AtomicBool::new(true));

	let alive_cleanup = alive.clone();
	on_cleanup(move || {
		alive_cleanup.store(false, Ordering::Relaxed);
		resize_listener.try_update_value(detach_resize);
	});

	// Painted radius of a visible node, `None` for hidden ones.
	let hit_radius = move |info: &NodeInfo| -> Option<f64> {
		snapshot.with_untracked(|snap| {
			let node = snap.as_ref()?.nodes.get(info.slot)?;
			interaction.with_untracked(|ix| {
				paint::node_visible(node, ix).then(|| paint::node_paint_size(node, ix))
			})
		})
	};

	let link_hit = move |idx: EdgeIdx| -> bool {
		snapshot.with_untracked(|snap| {
			let Some(snap) = snap.as_ref() else {
				return false;
			};
			snap.edges.get(idx).is_some_and(|edge| {
				interaction.with_untracked(|ix| paint::link_visible(snap, edge, ix))
			})
		})
	};

	let (state_init, animate_init) = (state.clone(), animate.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = container_size(&canvas);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
		{
			Some(ctx) => ctx,
			None => {
				error!("canvas 2d context unavailable");
				return;
			}
		};

		let mut layout = ForceGraphState::new(w, h);
		if let Some(snap) = snapshot.get_untracked() {
			layout.load(&snap);
		}
		*state_init.borrow_mut() = Some(layout);

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		let on_resize = Closure::<dyn FnMut()>::new(move || {
			let (nw, nh) = container_size(&canvas_resize);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		});
		let _ =
			window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
		resize_listener.update_value(|listener| {
			detach_resize(listener);
			*listener = Some(on_resize);
		});

		let (state_anim, animate_inner, alive_anim) =
			(state_init.clone(), animate_init.clone(), alive.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if !alive_anim.load(Ordering::Relaxed) {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(0.016);
				snapshot.with_untracked(|snap| match snap {
					Some(snap) => interaction.with_untracked(|ix| {
						let frame = Frame {
							snapshot: snap,
							interaction: ix,
							theme: theme.get_untracked(),
						};
						render::render(s, &frame, &ctx);
					}),
					None => render::clear(s, theme.get_untracked(), &ctx),
				});
			}
			if let (Some(cb), Some(win)) = (animate_inner.borrow().as_ref(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let state_load = state.clone();
	Effect::new(move |_| {
		let snap = snapshot.get();
		if let (Some(s), Some(snap)) = (state_load.borrow_mut().as_mut(), snap) {
			s.load(&snap);
		}
	});

	let state_camera = state.clone();
	Effect::new(move |_| {
		let Some(command) = camera.get() else {
			return;
		};
		if let Some(ref mut s) = *state_camera.borrow_mut() {
			s.apply_camera(&command);
		}
	});

	// Container size changes with the fullscreen toggle, not only with the window.
	Effect::new(move |_| {
		fullscreen.track();
		resize_listener.try_with_value(|listener| {
			if let Some(cb) = listener {
				let _ = cb.as_ref().unchecked_ref::<js_sys::Function>().call0(&JsValue::NULL);
			}
		});
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.pointer_down(x, y, hit_radius);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		let hover = match *state_mm.borrow_mut() {
			Some(ref mut s) => s.pointer_move(x, y, hit_radius, link_hit),
			None => None,
		};
		if let Some(hover) = hover {
			on_hover.run(hover);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let clicked = match *state_mu.borrow_mut() {
			Some(ref mut s) => s.pointer_up(),
			None => None,
		};
		if let Some(id) = clicked {
			on_node_click.run(id);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		let was_hovering = match *state_ml.borrow_mut() {
			Some(ref mut s) => s.pointer_leave(),
			None => false,
		};
		if was_hovering {
			on_hover.run(Hover::Nothing);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some((x, y)) = pointer_position(canvas_ref, &ev) else {
			return;
		};
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			s.wheel(x, y, ev.delta_y());
		}
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="force-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
