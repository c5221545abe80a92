//! Font discovery for overlay labels.
//!
//! Preferred faces are tried first, then any TrueType/OpenType file found
//! under the platform font directories. Missing fonts are not an error: the
//! overlay falls back to a monospace face compiled into the binary.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use ab_glyph::{FontRef, FontVec};
use walkdir::WalkDir;

/// DejaVu Sans Mono, see `assets/fonts/LICENSE-DejaVu`.
const EMBEDDED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

/// Font file names tried before any other system font, in order.
const PREFERRED_FONTS: &[&str] = &[
    "DejaVuSans-Bold.ttf",
    "DejaVuSans.ttf",
    "arialbd.ttf",
    "Arial Bold.ttf",
    "arial.ttf",
    "Arial.ttf",
    "LiberationSans-Bold.ttf",
    "LiberationSans-Regular.ttf",
    "Helvetica.ttc",
];

const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc"];

/// How deep to descend into each font directory.
const MAX_SCAN_DEPTH: usize = 4;

/// Directories searched for fonts on this platform.
#[must_use]
pub fn font_dirs() -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = dirs::font_dir().into_iter().collect();
    if let Some(windir) = std::env::var_os("WINDIR") {
        roots.push(PathBuf::from(windir).join("Fonts"));
    }
    roots.extend(
        [
            "/usr/share/fonts",
            "/usr/local/share/fonts",
            "/Library/Fonts",
            "/System/Library/Fonts",
        ]
        .into_iter()
        .map(PathBuf::from),
    );
    roots.retain(|d| d.is_dir());
    roots
}

/// Load the best available system font, or `None` if no font can be read.
///
/// Callers fall back to [`embedded_font`] on `None`.
#[must_use]
pub fn load_overlay_font() -> Option<FontVec> {
    let font = load_first_font(&font_dirs());
    if font.is_none() {
        log::warn!("no usable system font found; using the built-in face");
    }
    font
}

/// The built-in overlay face, parsed once.
#[must_use]
pub fn embedded_font() -> Option<&'static FontRef<'static>> {
    static FONT: OnceLock<Option<FontRef<'static>>> = OnceLock::new();
    FONT.get_or_init(|| match FontRef::try_from_slice(EMBEDDED_FONT) {
        Ok(font) => Some(font),
        Err(e) => {
            log::error!("built-in overlay font is corrupt: {e}");
            None
        }
    })
    .as_ref()
}

/// Load the first readable font under `roots`, preferred faces first.
#[must_use]
pub fn load_first_font(roots: &[PathBuf]) -> Option<FontVec> {
    font_candidates(roots).iter().find_map(|p| load_font_file(p))
}

/// Read and parse a single font file.
#[must_use]
pub fn load_font_file(path: &Path) -> Option<FontVec> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            log::debug!("cannot read font {}: {e}", path.display());
            return None;
        }
    };
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            log::debug!("overlay font: {}", path.display());
            Some(font)
        }
        Err(e) => {
            log::debug!("cannot parse font {}: {e}", path.display());
            None
        }
    }
}

fn font_candidates(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = roots
        .iter()
        .flat_map(|dir| {
            WalkDir::new(dir)
                .max_depth(MAX_SCAN_DEPTH)
                .follow_links(true)
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .filter(|p| is_font_file(p))
        })
        .collect();

    found.sort_by(|a, b| preference(a).cmp(&preference(b)).then_with(|| a.cmp(b)));
    found
}

fn preference(path: &Path) -> usize {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    PREFERRED_FONTS
        .iter()
        .position(|p| p.eq_ignore_ascii_case(name))
        .unwrap_or(PREFERRED_FONTS.len())
}

fn is_font_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| FONT_EXTENSIONS.iter().any(|f| f.eq_ignore_ascii_case(ext)))
}
