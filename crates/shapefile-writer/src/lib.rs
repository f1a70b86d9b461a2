//! Shapefile output for contour paths.
//!
//! Every contour path becomes one polyline record whose attribute row holds
//! the originating level. [`read_contour_records`] loads a written file back.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub mod reader;
pub mod writer;

pub use reader::{read_contour_records, ContourRecord};
pub use writer::{write_contours, ShapefileOptions, ShapefileSummary};

/// Attribute holding the contour level.
pub const LEVEL_FIELD: &str = "level";

/// Attribute flagging closed paths.
pub const CLOSED_FIELD: &str = "closed";

/// Extensions of the shapefile members this crate writes.
const MEMBER_EXTENSIONS: [&str; 3] = ["shp", "shx", "dbf"];

/// The `.shp` member for `path`.
///
/// A `.shp`, `.shx` or `.dbf` extension is replaced. Anything else is part of
/// the stem, so `pm25_2020.01.01` becomes `pm25_2020.01.01.shp`.
pub fn shp_path(path: &Path) -> PathBuf {
    let is_member = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MEMBER_EXTENSIONS
                .iter()
                .any(|member| ext.eq_ignore_ascii_case(member))
        });
    if is_member {
        return path.with_extension("shp");
    }
    let mut name = OsString::from(path.as_os_str());
    name.push(".shp");
    PathBuf::from(name)
}
