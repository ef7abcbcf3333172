//! Registry of export formats and the family each belongs to.
//!
//! Export formats come in two families with different requirements: CAD
//! drafting formats are written file-by-file and need a file extension, while
//! tabular/interchange formats are written into an output folder.
//!
//! # Examples
//!
//! ```
//! use geoclip_core::formats::{FormatFamily, find_format};
//!
//! let dwg = find_format("DWG_R2010").expect("DWG_R2010 should exist");
//! assert_eq!(dwg.family, FormatFamily::Cad);
//! assert!(dwg.accepts_extension("dxf"));
//!
//! assert!(find_format("UNKNOWN").is_none());
//! ```

/// File extensions accepted for CAD exports.
pub const CAD_EXTENSIONS: &[&str] = &["dwg", "dxf"];

/// The output family of an export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    /// CAD drafting formats, exported to `<folder>/<name>.<extension>`.
    Cad,
    /// GIS tabular/interchange formats, exported into an output folder.
    Interchange,
}

impl FormatFamily {
    /// Returns the string representation of this family.
    ///
    /// # Examples
    ///
    /// ```
    /// use geoclip_core::formats::FormatFamily;
    ///
    /// assert_eq!(FormatFamily::Cad.as_str(), "CAD");
    /// assert_eq!(FormatFamily::Interchange.as_str(), "Interchange");
    /// ```
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            FormatFamily::Cad => "CAD",
            FormatFamily::Interchange => "Interchange",
        }
    }
}

/// Export format definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFormat {
    /// Token passed to the engine (e.g. `"DWG_R2010"`, `"MITAB"`).
    pub short_name: &'static str,
    /// Long descriptive name for display purposes.
    pub long_name: &'static str,
    /// Family that decides validation and dispatch.
    pub family: FormatFamily,
}

impl ExportFormat {
    /// Creates a new format definition.
    #[must_use]
    pub const fn new(
        short_name: &'static str,
        long_name: &'static str,
        family: FormatFamily,
    ) -> Self {
        Self {
            short_name,
            long_name,
            family,
        }
    }

    /// Returns the file extensions this format can be written with.
    ///
    /// Interchange formats pick their own file names, so they accept none.
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self.family {
            FormatFamily::Cad => CAD_EXTENSIONS,
            FormatFamily::Interchange => &[],
        }
    }

    /// Returns `true` if `extension` is one of the CAD file extensions.
    ///
    /// Any CAD format accepts any CAD extension, so `DWG_R2010` with `dxf`
    /// is accepted.
    #[must_use]
    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.extensions().contains(&extension)
    }
}

/// Returns the complete registry of export formats.
#[must_use]
pub fn get_formats() -> Vec<ExportFormat> {
    use FormatFamily::{Cad, Interchange};

    vec![
        ExportFormat::new("DWG_R2010", "AutoCAD Drawing (release 2010)", Cad),
        ExportFormat::new("DXF_R2010", "AutoCAD Drawing Exchange (release 2010)", Cad),
        ExportFormat::new("MITAB", "MapInfo TAB", Interchange),
        ExportFormat::new("MIF", "MapInfo Interchange Format", Interchange),
        ExportFormat::new("SHAPE", "ESRI Shapefile", Interchange),
    ]
}

/// Finds a format by its exact token.
///
/// Tokens are matched case-sensitively because they are passed verbatim to
/// the engine.
#[must_use]
pub fn find_format(name: &str) -> Option<ExportFormat> {
    get_formats().into_iter().find(|f| f.short_name == name)
}

/// Returns all format tokens of a family, in registry order.
#[must_use]
pub fn format_names(family: FormatFamily) -> Vec<&'static str> {
    get_formats()
        .iter()
        .filter(|f| f.family == family)
        .map(|f| f.short_name)
        .collect()
}
