use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use eframe::egui;
use rfd::FileDialog;

use redactpad::{ImageSource, ObjectFit, Zone, ZoneEditor, log_info};

/// Demo host application: one editor, a control strip, and a live zone list.
pub struct RedactPadApp {
    editor: Option<ZoneEditor>,
    image_path: Option<PathBuf>,
    /// Snapshot kept current by the editor's zone-update notification.
    zones_live: Rc<RefCell<Vec<Zone>>>,
    zone_color: [u8; 3],
    object_fit: ObjectFit,
    status: String,
}

impl RedactPadApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, initial_image: Option<PathBuf>) -> Self {
        let mut app = Self {
            editor: None,
            image_path: None,
            zones_live: Rc::new(RefCell::new(Vec::new())),
            zone_color: [255, 0, 0],
            object_fit: ObjectFit::Contain,
            status: "Open an image to begin.".to_string(),
        };
        if let Some(path) = initial_image {
            app.open_image(path);
        }
        app
    }

    fn open_image(&mut self, path: PathBuf) {
        log_info!("opening {}", path.display());
        let [r, g, b] = self.zone_color;
        let mut editor = ZoneEditor::new(ImageSource::Path(path.clone()))
            .with_zone_color([r, g, b, 255])
            .with_object_fit(self.object_fit);

        let sink = Rc::clone(&self.zones_live);
        editor.on_zones_changed(move |zones| *sink.borrow_mut() = zones.to_vec());
        editor.on_double_click(|p| log_info!("double-click at ({:.0}, {:.0})", p.x, p.y));

        self.zones_live.borrow_mut().clear();
        self.status = format!("Editing {}", path.display());
        self.image_path = Some(path);
        self.editor = Some(editor);
    }

    fn copy_image_to_clipboard(&mut self) {
        let Some(pixels) = self.editor.as_ref().and_then(|e| e.composited()) else {
            self.status = "Nothing to copy yet.".to_string();
            return;
        };
        let data = arboard::ImageData {
            width: pixels.width() as usize,
            height: pixels.height() as usize,
            bytes: std::borrow::Cow::Owned(pixels.as_raw().clone()),
        };
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_image(data)) {
            Ok(()) => self.status = "Composited image copied to clipboard.".to_string(),
            Err(e) => self.status = format!("Clipboard copy failed: {}", e),
        }
    }

    fn export_png(&mut self) {
        let Some(bytes) = self.editor.as_mut().and_then(|e| e.export_to_blob()) else {
            self.status = "Nothing to export yet.".to_string();
            return;
        };
        let suggested = self
            .image_path
            .as_ref()
            .and_then(|p| p.file_stem())
            .map(|s| format!("{}_redacted.png", s.to_string_lossy()))
            .unwrap_or_else(|| "redacted.png".to_string());
        if let Some(path) = FileDialog::new()
            .add_filter("PNG image", &["png"])
            .set_file_name(suggested)
            .save_file()
        {
            match std::fs::write(&path, bytes) {
                Ok(()) => self.status = format!("Exported {}", path.display()),
                Err(e) => self.status = format!("Export failed: {}", e),
            }
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        if ui.button("Open image…").clicked()
            && let Some(path) = FileDialog::new()
                .add_filter("Images", &["png", "jpg", "jpeg", "webp", "bmp"])
                .pick_file()
        {
            self.open_image(path);
        }

        ui.separator();

        let prev_fit = self.object_fit;
        egui::ComboBox::from_label("Object fit")
            .selected_text(self.object_fit.label())
            .show_ui(ui, |ui| {
                for fit in ObjectFit::all() {
                    ui.selectable_value(&mut self.object_fit, *fit, fit.label());
                }
            });
        if prev_fit != self.object_fit
            && let Some(editor) = self.editor.as_mut()
        {
            editor.set_object_fit(self.object_fit);
        }

        ui.horizontal(|ui| {
            ui.label("Zone color");
            if ui.color_edit_button_srgb(&mut self.zone_color).changed()
                && let Some(editor) = self.editor.as_mut()
            {
                let [r, g, b] = self.zone_color;
                editor.set_zone_color([r, g, b, 255]);
            }
        });

        ui.separator();

        if ui.button("Reset zones").clicked()
            && let Some(editor) = self.editor.as_mut()
        {
            editor.reset();
        }
        if ui.button("Export PNG…").clicked() {
            self.export_png();
        }
        if ui.button("Copy image").clicked() {
            self.copy_image_to_clipboard();
        }
        if ui.button("Copy data URI").clicked() {
            match self.editor.as_mut().and_then(|e| e.export_to_data_uri()) {
                Some(uri) => {
                    match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(uri)) {
                        Ok(()) => self.status = "Data URI copied to clipboard.".to_string(),
                        Err(e) => self.status = format!("Clipboard copy failed: {}", e),
                    }
                }
                None => self.status = "Nothing to export yet.".to_string(),
            }
        }

        ui.separator();
        self.zone_list(ui);
    }

    fn zone_list(&mut self, ui: &mut egui::Ui) {
        let mut to_delete = None;
        {
            let zones = self.zones_live.borrow();
            ui.label(format!("Zones: {}", zones.len()));
            ui.small("Drag to draw, drag a zone to move, double-click to delete.");
            egui::ScrollArea::vertical().show(ui, |ui| {
                for (i, z) in zones.iter().enumerate() {
                    ui.horizontal(|ui| {
                        ui.monospace(format!(
                            "#{:<2} x{:>5.0} y{:>5.0} w{:>5.0} h{:>5.0}",
                            i + 1,
                            z.x,
                            z.y,
                            z.width,
                            z.height
                        ));
                        if ui.small_button("✕").clicked() {
                            to_delete = Some(z.id);
                        }
                    });
                }
            });
        }
        // Deleting notifies the editor's listener, which re-borrows
        // zones_live — so the snapshot borrow above must be released first.
        if let Some(id) = to_delete
            && let Some(editor) = self.editor.as_mut()
        {
            editor.delete_zone(id);
        }
    }
}

impl eframe::App for RedactPadApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls")
            .default_width(230.0)
            .show(ctx, |ui| {
                ui.heading("RedactPad");
                ui.separator();
                self.controls(ui);
            });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            match self.editor.as_mut() {
                Some(editor) => {
                    egui::ScrollArea::both().show(ui, |ui| {
                        editor.ui(ui);
                    });
                }
                None => {
                    ui.centered_and_justified(|ui| {
                        ui.label("Open an image to begin.");
                    });
                }
            }
        });
    }
}
