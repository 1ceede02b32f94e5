//! A region of a parent [`Ui`] that runs its own, fully independent egui
//! pass. The nested pass sees input remapped into its local coordinates and
//! its tessellated output is spliced back into the parent's paint list under
//! an offset and uniform scale, which gives smoothly zoomable sub-canvases
//! that can host anything, nested graph editors included.

use std::collections::HashMap;
use std::time::Duration;

use egui::epaint::{ClippedPrimitive, ClippedShape, Primitive, TextureId};
use egui::TexturesDelta;
use egui::*;

use crate::ui_state::key_pressed_once;

/// Wheel movement, in points, treated as one notch.
const POINTS_PER_NOTCH: f32 = 50.0;
/// Remaining zoom delta under which smoothing snaps to the target, before
/// dividing by the smoothness.
const SNAP_EPSILON: f32 = 0.015;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "persistence", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualCanvasConfig {
    /// Size of the region. An axis set to zero or less fills the available
    /// space on that axis.
    pub size: Vec2,
    pub background: Color32,
    pub zoom_enabled: bool,
    pub zoom_min: f32,
    pub zoom_max: f32,
    /// Wheel notches needed to change the zoom by 1.
    pub zoom_divisions: f32,
    /// How many frames, roughly, a zoom change is spread over. 0 applies it
    /// immediately.
    pub zoom_smoothness: f32,
    pub default_zoom: f32,
    /// Resets the zoom to `default_zoom` while the region is hovered.
    pub reset_zoom_key: Option<Key>,
    /// Dragging with this button pans the content.
    pub scroll_button: Option<PointerButton>,
}

impl Default for VirtualCanvasConfig {
    fn default() -> Self {
        Self {
            size: Vec2::ZERO,
            background: Color32::WHITE,
            zoom_enabled: true,
            zoom_min: 0.3,
            zoom_max: 2.0,
            zoom_divisions: 10.0,
            zoom_smoothness: 5.0,
            default_zoom: 1.0,
            reset_zoom_key: Some(Key::R),
            scroll_button: Some(PointerButton::Middle),
        }
    }
}

/// Current and goal zoom. The goal is always clamped to the configured
/// bounds, and the current scale only ever moves toward it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    pub scale: f32,
    pub target: f32,
}

impl ZoomState {
    pub fn new(config: &VirtualCanvasConfig) -> Self {
        let scale = config.default_zoom.clamp(config.zoom_min, config.zoom_max);
        Self {
            scale,
            target: scale,
        }
    }

    /// Moves the goal by `notches / zoom_divisions`.
    pub fn apply_wheel(&mut self, notches: f32, config: &VirtualCanvasConfig) {
        self.target = (self.target + notches / config.zoom_divisions)
            .clamp(config.zoom_min, config.zoom_max);
    }

    pub fn reset(&mut self, config: &VirtualCanvasConfig) {
        self.target = config.default_zoom.clamp(config.zoom_min, config.zoom_max);
    }

    /// Pulls both values back in bounds after the config changed.
    pub fn clamp_to(&mut self, config: &VirtualCanvasConfig) {
        self.scale = self.scale.clamp(config.zoom_min, config.zoom_max);
        self.target = self.target.clamp(config.zoom_min, config.zoom_max);
    }

    pub fn is_settled(&self) -> bool {
        self.scale == self.target
    }

    /// Advances `scale` one frame toward `target` and returns the scroll
    /// correction that keeps the content under `pivot` in place. `pivot` is
    /// relative to the region origin, in parent points.
    pub fn step(&mut self, pivot: Vec2, smoothness: f32) -> Vec2 {
        let mut correction = Vec2::ZERO;
        if smoothness <= 0.0 {
            if !self.is_settled() {
                correction += pivot / self.target - pivot / self.scale;
                self.scale = self.target;
            }
            return correction;
        }

        let epsilon = SNAP_EPSILON / smoothness;
        if (self.target - self.scale).abs() >= epsilon {
            let step = (self.target - self.scale) / smoothness;
            correction += pivot / (self.scale + step) - pivot / self.scale;
            self.scale += step;

            if (self.target - self.scale).abs() < epsilon {
                correction += pivot / self.target - pivot / self.scale;
                self.scale = self.target;
            }
        }
        correction
    }
}

/// Maps between the parent's screen space and the nested pass's logical
/// space: `screen = local * scale + origin`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransform {
    pub origin: Pos2,
    pub scale: f32,
}

impl CanvasTransform {
    pub fn new(origin: Pos2, scale: f32) -> Self {
        Self { origin, scale }
    }

    pub fn to_local(&self, screen: Pos2) -> Pos2 {
        ((screen - self.origin) / self.scale).to_pos2()
    }

    pub fn to_screen(&self, local: Pos2) -> Pos2 {
        self.origin + local.to_vec2() * self.scale
    }

    pub fn rect_to_local(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.to_local(rect.min), self.to_local(rect.max))
    }

    pub fn rect_to_screen(&self, rect: Rect) -> Rect {
        Rect::from_min_max(self.to_screen(rect.min), self.to_screen(rect.max))
    }
}

/// Rewrites every absolute position in `event` into nested logical space.
pub fn remap_event(event: &Event, transform: &CanvasTransform) -> Event {
    let mut event = event.clone();
    match &mut event {
        Event::PointerMoved(pos) | Event::PointerButton { pos, .. } | Event::Touch { pos, .. } => {
            *pos = transform.to_local(*pos);
        }
        _ => {}
    }
    event
}

/// Vertical wheel movement this frame, in notches.
pub fn wheel_notches(events: &[Event]) -> f32 {
    events
        .iter()
        .map(|event| match event {
            Event::MouseWheel { unit, delta, .. } => match unit {
                MouseWheelUnit::Point => delta.y / POINTS_PER_NOTCH,
                MouseWheelUnit::Line | MouseWheelUnit::Page => delta.y,
            },
            _ => 0.0,
        })
        .sum()
}

/// Re-homes the nested context's textures (its font atlas in particular) in
/// the parent's texture manager.
#[derive(Default)]
struct TextureBridge {
    /// Nested texture id to parent texture id.
    map: HashMap<TextureId, TextureId>,
    parent: Option<Context>,
}

impl TextureBridge {
    fn forward(&mut self, parent: &Context, delta: TexturesDelta) {
        if delta.is_empty() {
            return;
        }
        self.parent = Some(parent.clone());
        let tex_manager = parent.tex_manager();
        let mut tex_manager = tex_manager.write();
        for (id, image_delta) in delta.set {
            if let Some(parent_id) = self.map.get(&id) {
                tex_manager.set(*parent_id, image_delta);
            } else if image_delta.is_whole() {
                let parent_id = tex_manager.alloc(
                    format!("virtual canvas {id:?}"),
                    image_delta.image,
                    image_delta.options,
                );
                self.map.insert(id, parent_id);
            } else {
                log::warn!("partial update for unknown nested texture {:?} dropped", id);
            }
        }
        for id in delta.free {
            if let Some(parent_id) = self.map.remove(&id) {
                tex_manager.free(parent_id);
            }
        }
    }

    /// User textures are shared with the parent and keep their id.
    fn remap(&self, id: TextureId) -> TextureId {
        self.map.get(&id).copied().unwrap_or(id)
    }
}

impl Drop for TextureBridge {
    fn drop(&mut self) {
        if let Some(parent) = self.parent.take() {
            let tex_manager = parent.tex_manager();
            let mut tex_manager = tex_manager.write();
            for (_, parent_id) in self.map.drain() {
                tex_manager.free(parent_id);
            }
        }
    }
}

/// Turns the nested pass's tessellated output into parent shapes: vertex
/// positions and clip rects go through `transform`, uv and colour are kept,
/// and texture ids go through `remap`.
///
/// Consecutive meshes sharing a clip rect and texture are merged, with the
/// later mesh's indices offset by the vertex count already in the merged
/// mesh.
pub fn splice_primitives(
    primitives: Vec<ClippedPrimitive>,
    transform: CanvasTransform,
    remap: impl Fn(TextureId) -> TextureId,
) -> Vec<ClippedShape> {
    let mut spliced: Vec<ClippedShape> = Vec::with_capacity(primitives.len());
    for ClippedPrimitive {
        clip_rect,
        primitive,
    } in primitives
    {
        let clip_rect = transform.rect_to_screen(clip_rect);
        match primitive {
            Primitive::Mesh(mut mesh) => {
                mesh.texture_id = remap(mesh.texture_id);
                for vertex in &mut mesh.vertices {
                    vertex.pos = transform.to_screen(vertex.pos);
                }

                if let Some(ClippedShape {
                    clip_rect: last_clip,
                    shape: Shape::Mesh(last),
                }) = spliced.last_mut()
                {
                    if *last_clip == clip_rect && last.texture_id == mesh.texture_id {
                        let base = last.vertices.len() as u32;
                        last.indices.extend(mesh.indices.iter().map(|i| i + base));
                        last.vertices.extend(mesh.vertices);
                        continue;
                    }
                }
                spliced.push(ClippedShape {
                    clip_rect,
                    shape: Shape::Mesh(mesh),
                });
            }
            Primitive::Callback(mut callback) => {
                callback.rect = transform.rect_to_screen(callback.rect);
                spliced.push(ClippedShape {
                    clip_rect,
                    shape: Shape::Callback(callback),
                });
            }
        }
    }
    spliced
}

/// A zoomable, pannable region running its own egui [`Context`].
pub struct VirtualCanvas {
    pub config: VirtualCanvasConfig,
    ctx: Option<Context>,
    textures: TextureBridge,
    zoom: ZoomState,
    scroll: Vec2,
    origin: Pos2,
    size: Vec2,
    hovered: bool,
}

impl Default for VirtualCanvas {
    fn default() -> Self {
        Self::new(VirtualCanvasConfig::default())
    }
}

impl VirtualCanvas {
    pub fn new(config: VirtualCanvasConfig) -> Self {
        Self {
            zoom: ZoomState::new(&config),
            config,
            ctx: None,
            textures: TextureBridge::default(),
            scroll: Vec2::ZERO,
            origin: Pos2::ZERO,
            size: Vec2::ZERO,
            hovered: false,
        }
    }

    pub fn scale(&self) -> f32 {
        self.zoom.scale
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    /// Content pan, in nested logical units.
    pub fn scroll(&self) -> Vec2 {
        self.scroll
    }

    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.scroll = scroll;
    }

    /// Screen-space top-left of the region, from the last `begin`.
    pub fn origin(&self) -> Pos2 {
        self.origin
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Whether the pointer was over the region, and not over one of the
    /// nested pass's own windows, at the last `end`.
    pub fn hovered(&self) -> bool {
        self.hovered
    }

    pub fn transform(&self) -> CanvasTransform {
        CanvasTransform::new(self.origin, self.zoom.scale)
    }

    /// The nested context, once the first `begin` created it.
    pub fn raw_context(&self) -> Option<&Context> {
        self.ctx.as_ref()
    }

    /// Opens the region in `ui` and starts a nested frame. The returned scope
    /// ends the nested frame and splices its output when dropped.
    pub fn begin<'a>(&'a mut self, ui: &'a mut Ui) -> VirtualCanvasScope<'a> {
        let available = ui.available_size();
        let size = vec2(
            if self.config.size.x > 0.0 {
                self.config.size.x
            } else {
                available.x
            },
            if self.config.size.y > 0.0 {
                self.config.size.y
            } else {
                available.y
            },
        );
        let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
        ui.painter().rect_filled(rect, 0.0, self.config.background);
        self.origin = rect.min;
        self.size = rect.size();
        self.zoom.clamp_to(&self.config);

        // The wheel belongs to the region while the pointer is over it.
        let pointer_inside = ui.rect_contains_pointer(rect);
        let wheel = if pointer_inside {
            let notches = ui.input(|i| wheel_notches(&i.events));
            ui.ctx().input_mut(|i| {
                i.smooth_scroll_delta = Vec2::ZERO;
                i.raw_scroll_delta = Vec2::ZERO;
            });
            notches
        } else {
            0.0
        };

        let ctx = self.ctx.get_or_insert_with(Context::default).clone();
        ctx.set_style(ui.style().clone());

        let transform = self.transform();
        let clip = rect.intersect(ui.clip_rect());
        let raw_input = ui.input(|i| {
            let mut raw = RawInput {
                screen_rect: Some(Rect::from_min_size(Pos2::ZERO, self.size / transform.scale)),
                max_texture_side: Some(i.max_texture_side),
                time: Some(i.time),
                predicted_dt: i.predicted_dt,
                modifiers: i.modifiers,
                events: i
                    .events
                    .iter()
                    .filter(|event| pointer_inside || !is_press_or_wheel(event))
                    .map(|event| remap_event(event, &transform))
                    .collect(),
                focused: i.focused,
                ..Default::default()
            };
            raw.viewports.insert(
                ViewportId::ROOT,
                ViewportInfo {
                    native_pixels_per_point: Some(i.pixels_per_point),
                    ..Default::default()
                },
            );
            raw
        });
        ctx.begin_pass(raw_input);

        VirtualCanvasScope {
            canvas: self,
            ui,
            ctx,
            rect,
            clip,
            local_clip: transform.rect_to_local(clip),
            wheel,
            shown: false,
            ended: false,
        }
    }

    /// Runs `add_contents` inside the region for one frame.
    pub fn show<R>(&mut self, ui: &mut Ui, add_contents: impl FnOnce(&mut Ui) -> R) -> R {
        let mut scope = self.begin(ui);
        let inner = scope.run_contents(add_contents);
        scope.end();
        inner
    }
}

/// Presses and wheel turns outside the region must not reach the nested pass;
/// moves and releases still do so that drags started inside can end.
fn is_press_or_wheel(event: &Event) -> bool {
    matches!(
        event,
        Event::PointerButton { pressed: true, .. } | Event::MouseWheel { .. }
    )
}

/// An open nested frame. Ends the frame and paints it into the parent on
/// [`VirtualCanvasScope::end`] or when dropped.
pub struct VirtualCanvasScope<'a> {
    canvas: &'a mut VirtualCanvas,
    ui: &'a mut Ui,
    ctx: Context,
    rect: Rect,
    clip: Rect,
    local_clip: Rect,
    wheel: f32,
    shown: bool,
    ended: bool,
}

impl<'a> VirtualCanvasScope<'a> {
    /// The nested context, for anything beyond a single root panel (windows,
    /// areas, popups of its own).
    pub fn ctx(&self) -> &Context {
        &self.ctx
    }

    /// Lays out the region's root content. Content is offset by the canvas
    /// scroll and clipped to the visible part of the region. Only the first
    /// call in a frame runs `add_contents`.
    pub fn show<R>(&mut self, add_contents: impl FnOnce(&mut Ui) -> R) -> Option<R> {
        if self.shown {
            log::warn!("virtual canvas content shown twice in one frame, ignoring");
            return None;
        }
        Some(self.run_contents(add_contents))
    }

    fn run_contents<R>(&mut self, add_contents: impl FnOnce(&mut Ui) -> R) -> R {
        self.shown = true;
        let scroll = self.canvas.scroll;
        let local_clip = self.local_clip;
        CentralPanel::default()
            .frame(Frame::none())
            .show(&self.ctx, |ui| {
                let max_rect = ui.max_rect().translate(scroll);
                let builder = UiBuilder::new().max_rect(max_rect).layout(*ui.layout());
                let mut content = ui.new_child(builder);
                content.set_clip_rect(local_clip);
                add_contents(&mut content)
            })
            .inner
    }

    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        self.ended = true;
        let ctx = self.ctx.clone();
        let parent = self.ui.ctx().clone();

        let overlay_hovered = ctx
            .input(|i| i.pointer.hover_pos())
            .and_then(|pos| ctx.layer_id_at(pos))
            .is_some_and(|layer| layer.order != Order::Background);
        let any_item_active = ctx.is_using_pointer();

        let output = ctx.end_pass();
        let canvas = &mut *self.canvas;
        canvas.textures.forward(&parent, output.textures_delta);

        let primitives = ctx.tessellate(output.shapes, output.pixels_per_point);
        let textures = &canvas.textures;
        let spliced = splice_primitives(primitives, canvas.transform(), |id| textures.remap(id));
        let painter = self.ui.painter().with_clip_rect(self.clip);
        for ClippedShape { clip_rect, shape } in spliced {
            painter.with_clip_rect(clip_rect).add(shape);
        }

        let platform = output.platform_output;
        if platform.cursor_icon != CursorIcon::Default {
            parent.set_cursor_icon(platform.cursor_icon);
        }
        if !platform.copied_text.is_empty() {
            parent.copy_text(platform.copied_text);
        }
        if let Some(viewport) = output.viewport_output.get(&ViewportId::ROOT) {
            if viewport.repaint_delay == Duration::ZERO {
                parent.request_repaint();
            } else if viewport.repaint_delay < Duration::MAX {
                parent.request_repaint_after(viewport.repaint_delay);
            }
        }

        canvas.hovered = self.ui.rect_contains_pointer(self.rect) && !overlay_hovered;

        let (pointer, pointer_delta, reset_pressed, scroll_down) = self.ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.pointer.delta(),
                canvas
                    .config
                    .reset_zoom_key
                    .is_some_and(|key| key_pressed_once(i, key)),
                canvas
                    .config
                    .scroll_button
                    .is_some_and(|button| i.pointer.button_down(button)),
            )
        });

        if canvas.config.zoom_enabled && canvas.hovered && self.wheel != 0.0 {
            canvas.zoom.apply_wheel(self.wheel, &canvas.config);
        }
        if canvas.hovered && reset_pressed {
            canvas.zoom.reset(&canvas.config);
        }
        let pivot = pointer.unwrap_or_else(|| self.rect.center()) - canvas.origin;
        canvas.scroll += canvas.zoom.step(pivot, canvas.config.zoom_smoothness);
        if !canvas.zoom.is_settled() {
            parent.request_repaint();
        }

        if canvas.hovered && !any_item_active && scroll_down {
            canvas.scroll += pointer_delta / canvas.zoom.scale;
        }
    }
}

impl<'a> Drop for VirtualCanvasScope<'a> {
    fn drop(&mut self) {
        // Ending a frame while unwinding would only pile a second panic on
        // top of the first.
        if !self.ended && !std::thread::panicking() {
            self.finish();
        }
    }
}
