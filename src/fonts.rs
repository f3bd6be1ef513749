use ab_glyph::FontVec;
use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Fallbacks tried after the configured `FONT_PATH`.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu-sans-fonts/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
];

pub fn candidates(configured: &Path) -> Vec<PathBuf> {
    std::iter::once(configured.to_path_buf())
        .chain(SYSTEM_FONTS.iter().map(PathBuf::from))
        .collect()
}

/// Loads the first candidate that reads and parses as a font.
pub fn load_first(candidates: &[PathBuf]) -> Result<(PathBuf, FontVec)> {
    for path in candidates {
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %path.display(), "font not readable: {e}");
                continue;
            }
        };
        match FontVec::try_from_vec(data) {
            Ok(font) => {
                info!(path = %path.display(), "font loaded");
                return Ok((path.clone(), font));
            }
            Err(e) => debug!(path = %path.display(), "not a usable font: {e}"),
        }
    }
    let tried: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
    bail!("no usable font found; set FONT_PATH (tried {})", tried.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_path_is_tried_first() {
        let list = candidates(Path::new("assets/font.ttf"));
        assert_eq!(list[0], PathBuf::from("assets/font.ttf"));
        assert_eq!(list.len(), SYSTEM_FONTS.len() + 1);
    }

    #[test]
    fn missing_and_invalid_files_are_skipped_then_reported() {
        let dir = tempfile::tempdir().unwrap();
        let bogus = dir.path().join("bogus.ttf");
        std::fs::write(&bogus, b"not a font").unwrap();
        let missing = dir.path().join("missing.ttf");

        let err = load_first(&[missing, bogus]).unwrap_err().to_string();
        assert!(err.contains("missing.ttf"), "{err}");
        assert!(err.contains("bogus.ttf"), "{err}");
    }
}
