// ============================================================================
// RedactPad CLI — headless redaction via command-line arguments
// ============================================================================
//
// Usage examples:
//   redactpad --input photo.png --zones zones.json --output redacted.png
//   redactpad -i photo.jpg -z zones.json --fit cover --color 202020
//   redactpad -i photo.png -z zones.json --data-uri        (URI on stdout)
//
// zones.json is an array of rectangles in surface pixel space:
//   [{"x": 10, "y": 20, "width": 100, "height": 40}]
//
// No GUI is opened in CLI mode; the image is composited through the same
// surface/compositor pipeline the editor widget uses.

use std::path::{Path, PathBuf};

use clap::Parser;

use redactpad::{Compositor, ObjectFit, Surface, Zone, ZoneRect};

/// RedactPad headless redactor.
///
/// Apply a JSON list of redaction zones to an image and write the composited
/// PNG — no GUI required.
#[derive(Parser, Debug)]
#[command(
    name = "redactpad",
    about = "RedactPad headless image redactor",
    long_about = "Burn rectangular redaction zones into an image without opening\n\
                  the GUI.\n\n\
                  Example:\n  \
                  redactpad --input photo.png --zones zones.json --output redacted.png"
)]
pub struct CliArgs {
    /// Input image (PNG, JPEG, WEBP, BMP).
    #[arg(short, long, required = true)]
    pub input: PathBuf,

    /// JSON file with the zone rectangles to apply.
    #[arg(short, long, value_name = "ZONES.json")]
    pub zones: PathBuf,

    /// Output PNG path. Defaults to `<input stem>_redacted.png` next to the
    /// input.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print a data:image/png;base64 URI to stdout instead of writing a file.
    #[arg(long)]
    pub data_uri: bool,

    /// Zone fill color as RRGGBB or RRGGBBAA hex (default: ff0000).
    #[arg(short, long, value_name = "HEX")]
    pub color: Option<String>,

    /// Fit policy when the surface size differs from the image: contain or
    /// cover.
    #[arg(long, default_value = "contain", value_name = "POLICY")]
    pub fit: String,

    /// Surface width override (default: natural image width).
    #[arg(long)]
    pub width: Option<u32>,

    /// Surface height override (default: natural image height).
    #[arg(long)]
    pub height: Option<u32>,
}

impl CliArgs {
    /// Returns `true` when any CLI-mode flag is present in the real process
    /// arguments. Used by `main()` to route before creating a window.
    pub fn is_cli_mode() -> bool {
        std::env::args().any(|a| a == "--input" || a == "-i")
    }
}

/// Run the headless pipeline and return an OS exit code (0 = success).
pub fn run(args: CliArgs) -> i32 {
    match run_inner(&args) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

fn run_inner(args: &CliArgs) -> Result<(), String> {
    let image = image::open(&args.input)
        .map_err(|e| format!("could not open {}: {}", args.input.display(), e))?
        .into_rgba8();

    let zones = load_zones(&args.zones)?;
    let color = match &args.color {
        Some(hex) => parse_color(hex)?,
        None => redactpad::DEFAULT_ZONE_COLOR,
    };
    let fit = match args.fit.to_lowercase().as_str() {
        "cover" => ObjectFit::Cover,
        "contain" => ObjectFit::Contain,
        other => return Err(format!("unknown fit policy '{}' (use contain or cover)", other)),
    };

    let target_w = args.width.unwrap_or(image.width());
    let target_h = args.height.unwrap_or(image.height());
    let mut surface = Surface::prepare(target_w, target_h, 1.0);
    let mut compositor = Compositor::new(fit, color);
    compositor.redraw(&mut surface, &image, &zones, None);

    if args.data_uri {
        let uri = surface
            .to_data_uri()
            .map_err(|e| format!("PNG encode failed: {}", e))?;
        println!("{}", uri);
        return Ok(());
    }

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let bytes = surface
        .to_png_bytes()
        .map_err(|e| format!("PNG encode failed: {}", e))?;
    std::fs::write(&output, bytes)
        .map_err(|e| format!("could not write {}: {}", output.display(), e))?;
    println!(
        "{} → {} ({} zones)",
        args.input.display(),
        output.display(),
        zones.len()
    );
    Ok(())
}

fn load_zones(path: &Path) -> Result<Vec<Zone>, String> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| format!("could not read {}: {}", path.display(), e))?;
    let rects: Vec<ZoneRect> = serde_json::from_str(&text)
        .map_err(|e| format!("invalid zone file {}: {}", path.display(), e))?;
    Ok(rects.into_iter().map(Zone::new).collect())
}

/// Parse RRGGBB or RRGGBBAA hex into RGBA bytes.
fn parse_color(hex: &str) -> Result<[u8; 4], String> {
    let hex = hex.trim_start_matches('#');
    if hex.len() != 6 && hex.len() != 8 {
        return Err(format!("invalid color '{}' (expected RRGGBB or RRGGBBAA)", hex));
    }
    let byte = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| format!("invalid color '{}' (bad hex digit)", hex))
    };
    Ok([
        byte(0)?,
        byte(2)?,
        byte(4)?,
        if hex.len() == 8 { byte(6)? } else { 255 },
    ])
}

/// `photo.png` → `photo_redacted.png`, next to the input — never silently
/// overwrites the source.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{}_redacted.png", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color_rgb() {
        assert_eq!(parse_color("ff0000").unwrap(), [255, 0, 0, 255]);
        assert_eq!(parse_color("#00ff7f").unwrap(), [0, 255, 127, 255]);
    }

    #[test]
    fn test_parse_color_rgba() {
        assert_eq!(parse_color("11223344").unwrap(), [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn test_parse_color_rejects_garbage() {
        assert!(parse_color("red").is_err());
        assert!(parse_color("zzzzzz").is_err());
    }

    #[test]
    fn test_default_output_path_appends_suffix() {
        let out = default_output_path(Path::new("/tmp/photo.png"));
        assert_eq!(out, PathBuf::from("/tmp/photo_redacted.png"));
    }
}
