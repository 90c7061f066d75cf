//! Locating test fonts.
//!
//! Label rendering needs a TrueType font, which is not checked into the
//! repository. Font-dependent tests locate one through [`find_test_font`]
//! and skip when none is installed.

use std::path::PathBuf;

/// Returns the workspace root directory.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .parent() // crates/
        .and_then(|p| p.parent()) // workspace root
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(manifest_dir))
}

/// Looks for `name` under `TEST_DATA_DIR` (if set), then `testdata/` at the
/// workspace root.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(dir) = std::env::var("TEST_DATA_DIR") {
        candidates.push(PathBuf::from(dir).join(name));
    }
    candidates.push(workspace_root().join("testdata").join(name));
    candidates.into_iter().find(|path| path.exists())
}

/// Well-known font locations on CI images and developer machines.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSansMono.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
];

/// Finds a TrueType font usable for label tests.
pub fn find_test_font() -> Option<PathBuf> {
    find_test_file("DejaVuSans.ttf").or_else(|| {
        SYSTEM_FONTS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    })
}
