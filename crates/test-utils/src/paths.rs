//! Output path helpers for tests that write shapefiles and figures.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Fresh temporary output directory, removed on drop.
pub fn output_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix("nc2shp-test-")
        .tempdir()
        .unwrap_or_else(|e| panic!("cannot create temp dir: {}", e))
}

/// The `.shp`, `.shx` and `.dbf` paths sharing the stem of `shp_path`.
pub fn shapefile_triplet(shp_path: &Path) -> [PathBuf; 3] {
    [
        shp_path.with_extension("shp"),
        shp_path.with_extension("shx"),
        shp_path.with_extension("dbf"),
    ]
}

/// Whether any member of the triplet exists.
pub fn any_triplet_file_exists(shp_path: &Path) -> bool {
    shapefile_triplet(shp_path).iter().any(|p| p.exists())
}
