//! RedactPad — an embeddable image-redaction surface for egui.
//!
//! Drop a [`ZoneEditor`] into any egui container to let users draw, move,
//! and delete opaque rectangular redaction zones over an image, then export
//! the composited result as PNG bytes or a `data:image/png;base64,` URI:
//!
//! ```no_run
//! use redactpad::{ImageSource, ZoneEditor};
//!
//! let mut editor = ZoneEditor::new(ImageSource::Path("photo.png".into()));
//! // each frame:
//! // editor.ui(ui);
//! // on demand:
//! // let png = editor.export_to_blob();
//! ```
//!
//! Gestures: drag on empty space to draw a zone, drag an existing zone to
//! move it (it follows the pointer center), double-click a zone to delete
//! it. The surface is repainted in full from `{image, zones, preview}` after
//! every change.

#![allow(clippy::too_many_arguments)]

pub mod compositor;
pub mod editor;
pub mod geometry;
pub mod interaction;
pub mod logger;
pub mod surface;
pub mod zone;

pub use compositor::{Compositor, ObjectFit, fit_rect};
pub use editor::{DEFAULT_ZONE_COLOR, ImageSource, ZoneEditor};
pub use geometry::{Point, SurfaceGeometry};
pub use interaction::{InteractionState, Mode, Outcome};
pub use surface::Surface;
pub use zone::{Zone, ZoneRect};
