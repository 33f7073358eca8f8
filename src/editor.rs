use std::fmt;
use std::path::PathBuf;
use std::sync::mpsc;

use eframe::egui;
use egui::{CursorIcon, Rect, Response, Sense, Ui, Vec2};
use image::RgbaImage;
use uuid::Uuid;

use crate::compositor::{Compositor, ObjectFit};
use crate::geometry::{Point, SurfaceGeometry};
use crate::interaction::{self, InteractionState, Mode, Outcome};
use crate::surface::Surface;
use crate::zone::{Zone, ZoneRect};
use crate::{log_err, log_info};

/// Conventional warning red, used for zones and the draw preview unless the
/// host configures another color.
pub const DEFAULT_ZONE_COLOR: [u8; 4] = [255, 0, 0, 255];

/// Widget size shown while the first image load is still in flight.
const PLACEHOLDER_SIZE: Vec2 = Vec2::new(320.0, 180.0);

/// Where the editor's image comes from. Decoding happens off-thread; see
/// [`ZoneEditor::set_image_source`].
#[derive(Clone)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    fn decode(&self) -> Result<RgbaImage, String> {
        match self {
            ImageSource::Path(path) => image::open(path)
                .map(|img| img.into_rgba8())
                .map_err(|e| format!("could not open {}: {}", path.display(), e)),
            ImageSource::Bytes(bytes) => image::load_from_memory(bytes)
                .map(|img| img.into_rgba8())
                .map_err(|e| format!("could not decode {} in-memory bytes: {}", bytes.len(), e)),
        }
    }
}

impl fmt::Debug for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => write!(f, "ImageSource::Path({})", path.display()),
            ImageSource::Bytes(bytes) => write!(f, "ImageSource::Bytes({} bytes)", bytes.len()),
        }
    }
}

struct LoadResult {
    generation: u64,
    result: Result<RgbaImage, String>,
}

type ZonesListener = Box<dyn FnMut(&[Zone])>;
type PointerListener = Box<dyn FnMut(Point)>;

/// The embeddable redaction editor.
///
/// Owns the zone collection, the image reference, and the surface; wires
/// pointer events through the interaction state machine; and exposes the
/// imperative operations (`reset`, `export_to_blob`, `export_to_data_uri`)
/// plus a zone-update notification. Call [`ZoneEditor::ui`] once per frame
/// to show the widget.
pub struct ZoneEditor {
    source: ImageSource,
    image: Option<RgbaImage>,
    surface: Option<Surface>,
    compositor: Compositor,
    state: InteractionState,
    zones: Vec<Zone>,

    size_override: Option<(u32, u32)>,
    pixel_ratio: f32,

    load_tx: mpsc::Sender<LoadResult>,
    load_rx: mpsc::Receiver<LoadResult>,
    load_generation: u64,
    loading: bool,
    load_error: Option<String>,

    zones_listener: Option<ZonesListener>,
    on_pointer_down: Option<PointerListener>,
    on_pointer_up: Option<PointerListener>,
    on_pointer_move: Option<PointerListener>,
    on_pointer_leave: Option<PointerListener>,
    on_double_click: Option<PointerListener>,

    /// Last pointer position in surface space, used to finish a gesture when
    /// the pointer disappears (left the window) before release.
    last_point: Option<Point>,
}

impl ZoneEditor {
    /// Create an editor and start loading `source` in the background. The
    /// widget stays inert (and paints a placeholder) until the decode lands.
    pub fn new(source: ImageSource) -> Self {
        let (load_tx, load_rx) = mpsc::channel();
        let mut editor = Self {
            source,
            image: None,
            surface: None,
            compositor: Compositor::new(ObjectFit::default(), DEFAULT_ZONE_COLOR),
            state: InteractionState::new(),
            zones: Vec::new(),
            size_override: None,
            pixel_ratio: 1.0,
            load_tx,
            load_rx,
            load_generation: 0,
            loading: false,
            load_error: None,
            zones_listener: None,
            on_pointer_down: None,
            on_pointer_up: None,
            on_pointer_move: None,
            on_pointer_leave: None,
            on_double_click: None,
            last_point: None,
        };
        editor.start_load();
        editor
    }

    // ---- construction-time options ----------------------------------------

    /// Seed the collection with pre-existing zones.
    pub fn with_zones(mut self, rects: Vec<ZoneRect>) -> Self {
        self.zones = rects.into_iter().map(Zone::new).collect();
        self
    }

    pub fn with_zone_color(mut self, color: [u8; 4]) -> Self {
        self.compositor.set_zone_color(color);
        self
    }

    /// Explicit surface size, overriding the natural image size.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size_override = Some((width.max(1), height.max(1)));
        self
    }

    pub fn with_object_fit(mut self, fit: ObjectFit) -> Self {
        self.compositor.set_object_fit(fit);
        self
    }

    /// Backing-buffer scale factor for high-density displays (default 1.0;
    /// pass the host's pixels-per-point for a sharper composite).
    pub fn with_pixel_ratio(mut self, ratio: f32) -> Self {
        self.pixel_ratio = if ratio > 0.0 { ratio } else { 1.0 };
        self
    }

    // ---- listeners ---------------------------------------------------------

    /// Called with the full ordered collection after every committed
    /// mutation: zone create, each move step, delete, reset. Never called
    /// for transient draw-preview frames. Each entry carries the zone's
    /// stable id alongside its rectangle.
    pub fn on_zones_changed(&mut self, listener: impl FnMut(&[Zone]) + 'static) {
        self.zones_listener = Some(Box::new(listener));
    }

    /// Host pointer callbacks, invoked after internal handling of the
    /// matching event — in addition to, never instead of, the editor's own
    /// logic.
    pub fn on_pointer_down(&mut self, listener: impl FnMut(Point) + 'static) {
        self.on_pointer_down = Some(Box::new(listener));
    }

    pub fn on_pointer_up(&mut self, listener: impl FnMut(Point) + 'static) {
        self.on_pointer_up = Some(Box::new(listener));
    }

    pub fn on_pointer_move(&mut self, listener: impl FnMut(Point) + 'static) {
        self.on_pointer_move = Some(Box::new(listener));
    }

    pub fn on_pointer_leave(&mut self, listener: impl FnMut(Point) + 'static) {
        self.on_pointer_leave = Some(Box::new(listener));
    }

    pub fn on_double_click(&mut self, listener: impl FnMut(Point) + 'static) {
        self.on_double_click = Some(Box::new(listener));
    }

    // ---- imperative surface ------------------------------------------------

    /// Replace the image source. Any in-flight load is superseded; its
    /// eventual completion is discarded by the generation guard.
    pub fn set_image_source(&mut self, source: ImageSource) {
        self.source = source;
        self.start_load();
    }

    /// Clear the entire zone collection, repaint, and notify the listener
    /// with the now-empty collection.
    pub fn reset(&mut self) {
        self.zones.clear();
        self.redraw(None);
        self.notify_zones_changed();
    }

    /// PNG-encode the committed surface contents (image + zones, no
    /// preview). `None` until the image has loaded.
    pub fn export_to_blob(&mut self) -> Option<Vec<u8>> {
        self.redraw(None);
        let surface = self.surface.as_ref()?;
        match surface.to_png_bytes() {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log_err!("PNG export failed: {}", e);
                None
            }
        }
    }

    /// `data:image/png;base64,…` form of [`ZoneEditor::export_to_blob`],
    /// under the same precondition.
    pub fn export_to_data_uri(&mut self) -> Option<String> {
        self.redraw(None);
        let surface = self.surface.as_ref()?;
        match surface.to_data_uri() {
            Ok(uri) => Some(uri),
            Err(e) => {
                log_err!("data-URI export failed: {}", e);
                None
            }
        }
    }

    /// Remove one zone by id, as the double-click gesture does. Returns
    /// `false` (and stays quiet) when no zone has that id.
    pub fn delete_zone(&mut self, id: Uuid) -> bool {
        let before = self.zones.len();
        self.zones.retain(|zone| zone.id != id);
        if self.zones.len() == before {
            return false;
        }
        self.redraw(None);
        self.notify_zones_changed();
        true
    }

    // ---- accessors ---------------------------------------------------------

    /// The committed collection, in z-order.
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// The composited pixels (e.g. for clipboard hand-off). `None` until the
    /// image has loaded.
    pub fn composited(&self) -> Option<&RgbaImage> {
        self.surface.as_ref().map(|s| s.pixels())
    }

    pub fn object_fit(&self) -> ObjectFit {
        self.compositor.object_fit()
    }

    pub fn set_object_fit(&mut self, fit: ObjectFit) {
        self.compositor.set_object_fit(fit);
        self.redraw(None);
    }

    pub fn zone_color(&self) -> [u8; 4] {
        self.compositor.zone_color()
    }

    pub fn set_zone_color(&mut self, color: [u8; 4]) {
        self.compositor.set_zone_color(color);
        self.redraw(None);
    }

    // ---- widget ------------------------------------------------------------

    /// Show the editor and run one frame of interaction handling.
    pub fn ui(&mut self, ui: &mut Ui) -> Response {
        self.poll_loads();

        let desired = match &self.surface {
            Some(surface) => surface.rendered_size(),
            None => self
                .size_override
                .map(|(w, h)| Vec2::new(w as f32, h as f32))
                .unwrap_or(PLACEHOLDER_SIZE),
        };
        let (rect, response) = ui.allocate_exact_size(desired, Sense::click_and_drag());

        if self.surface.is_none() {
            // Not loaded yet: placeholder, no interaction.
            if ui.is_rect_visible(rect) {
                let painter = ui.painter_at(rect);
                painter.rect_filled(rect, 2.0, ui.visuals().extreme_bg_color);
                let message = match &self.load_error {
                    Some(e) => format!("image failed to load: {}", e),
                    None => "loading image…".to_string(),
                };
                painter.text(
                    rect.center(),
                    egui::Align2::CENTER_CENTER,
                    message,
                    egui::FontId::default(),
                    ui.visuals().weak_text_color(),
                );
            }
            if self.loading {
                // Decode not ready yet — request another repaint so we poll
                // again next frame
                ui.ctx().request_repaint();
            }
            return response;
        }

        self.handle_pointer(ui, rect, &response);

        if let Some(surface) = self.surface.as_mut() {
            surface.update_texture(ui.ctx());
            if ui.is_rect_visible(rect) {
                surface.paint(&ui.painter_at(rect), rect);
            }
        }

        response
    }

    // ---- internals ---------------------------------------------------------

    fn handle_pointer(&mut self, ui: &Ui, rect: Rect, response: &Response) {
        let (backing, default_cursor) = match &self.surface {
            Some(surface) => (surface.backing_size(), surface.default_cursor),
            None => return,
        };
        let geometry = SurfaceGeometry::new(rect, backing);

        let pointer_pos = ui.input(|i| i.pointer.interact_pos());
        let surface_point = pointer_pos.map(|p| geometry.to_surface_space(p));
        let pointer_moved = ui.input(|i| i.pointer.delta()) != Vec2::ZERO;
        let primary_pressed = ui.input(|i| i.pointer.primary_pressed());
        let primary_released = ui.input(|i| i.pointer.primary_released());

        let mut outcome = Outcome::Quiet;

        // Gesture start: only presses that land on the widget count.
        if primary_pressed
            && response.hovered()
            && let Some(p) = surface_point
        {
            outcome = outcome.max(self.state.pointer_down(p, &self.zones));
            self.last_point = Some(p);
            Self::emit(&mut self.on_pointer_down, p);
        }

        if pointer_moved
            && let Some(p) = surface_point
            && (self.state.gesture_active() || response.hovered())
        {
            outcome = outcome.max(self.state.pointer_move(p, &mut self.zones));
            self.last_point = Some(p);
            Self::emit(&mut self.on_pointer_move, p);
        }

        // Gesture end: release anywhere, or the pointer leaving the surface.
        let gesture_was_active = self.state.gesture_active();
        if primary_released && (gesture_was_active || response.hovered()) {
            if let Some(p) = surface_point.or(self.last_point) {
                outcome = outcome.max(self.state.pointer_up(p, &mut self.zones));
                Self::emit(&mut self.on_pointer_up, p);
            }
        } else if gesture_was_active && !pointer_pos.is_some_and(|p| rect.contains(p)) {
            if let Some(p) = surface_point.or(self.last_point) {
                outcome = outcome.max(self.state.pointer_leave(p, &mut self.zones));
                Self::emit(&mut self.on_pointer_leave, p);
            }
        }

        // Deletion check runs after the release handling above, so the two
        // click cycles of the double-click have already unwound to Idle.
        if response.double_clicked()
            && let Some(p) = surface_point
        {
            outcome = outcome.max(self.state.double_click(p, &mut self.zones));
            Self::emit(&mut self.on_double_click, p);
        }

        // Cursor affordance reflects the post-transition mode.
        if response.hovered() || self.state.gesture_active() {
            let cursor = match self.state.mode() {
                Mode::Moving { .. } => CursorIcon::Grabbing,
                Mode::Drawing { .. } => CursorIcon::Crosshair,
                Mode::Idle => match surface_point {
                    Some(p) if interaction::hit_test(&self.zones, p).is_some() => CursorIcon::Move,
                    _ => default_cursor,
                },
            };
            ui.ctx().set_cursor_icon(cursor);
        }

        match outcome {
            Outcome::Quiet => {}
            Outcome::Preview => {
                let preview = surface_point.and_then(|p| self.state.preview_rect(p));
                self.redraw(preview);
            }
            Outcome::Repaint => self.redraw(None),
            Outcome::ZonesChanged => {
                self.redraw(None);
                self.notify_zones_changed();
            }
        }
    }

    fn emit(listener: &mut Option<PointerListener>, p: Point) {
        if let Some(f) = listener.as_mut() {
            f(p);
        }
    }

    fn start_load(&mut self) {
        self.load_generation += 1;
        self.loading = true;
        self.load_error = None;

        let generation = self.load_generation;
        let source = self.source.clone();
        let tx = self.load_tx.clone();
        std::thread::spawn(move || {
            let result = source.decode();
            let _ = tx.send(LoadResult { generation, result });
        });
    }

    fn poll_loads(&mut self) {
        while let Ok(load) = self.load_rx.try_recv() {
            // A completion from a superseded source must never overwrite the
            // newer image.
            if load.generation != self.load_generation {
                log_info!(
                    "discarding stale image load (generation {} != {})",
                    load.generation,
                    self.load_generation
                );
                continue;
            }
            self.loading = false;
            match load.result {
                Ok(image) => self.apply_image(image),
                Err(e) => {
                    log_err!("image load failed: {}", e);
                    self.load_error = Some(e);
                }
            }
        }
    }

    /// Install a freshly decoded image: prepare the surface for the target
    /// size and run the first paint.
    fn apply_image(&mut self, image: RgbaImage) {
        log_info!("image loaded ({}x{})", image.width(), image.height());
        let (target_w, target_h) = self
            .size_override
            .unwrap_or((image.width(), image.height()));
        self.image = Some(image);
        self.surface = Some(Surface::prepare(target_w, target_h, self.pixel_ratio));
        self.compositor.invalidate();
        self.redraw(None);
    }

    /// Full repaint — the surface is always a pure function of
    /// `{image, zones, preview}`.
    fn redraw(&mut self, preview: Option<Rect>) {
        if let (Some(surface), Some(image)) = (self.surface.as_mut(), self.image.as_ref()) {
            self.compositor.redraw(surface, image, &self.zones, preview);
        }
    }

    fn notify_zones_changed(&mut self) {
        if let Some(listener) = self.zones_listener.as_mut() {
            listener(&self.zones);
        }
    }
}
