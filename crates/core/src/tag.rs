//! Type tags and reserved markers
//!
//! A `TypeTag` is the stable string identity of an extension type, persisted
//! next to encoded bytes so the fetch path can pick the right decoder. Tags
//! are assigned explicitly by the host application when it registers a
//! serializer; there is no reflection or import-by-path mechanism. A tag
//! that no longer resolves in the registry is treated as absent and the
//! value decodes through the generic codec instead.
//!
//! ## Contract
//!
//! - Tags have the shape `<module>.<name>`, e.g. `"frame.Frame"`
//! - Both segments must be non-empty and free of NUL bytes
//! - Tags must never collide with the reserved composite markers; any
//!   string of marker shape (`__…__`) is rejected outright

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Marker for element-wise encoded tuples
pub const MARKER_TUPLE: &str = "__tuple__";
/// Marker for element-wise encoded lists
pub const MARKER_LIST: &str = "__list__";
/// Marker for element-wise encoded sets
pub const MARKER_SET: &str = "__set__";
/// Marker for element-wise encoded maps
pub const MARKER_DICT: &str = "__dict__";
/// Sentinel marker for values stored through the generic fallback codec
pub const MARKER_GENERIC: &str = "__generic__";

/// The markers that always route a fetch to the composite codec
pub const COMPOSITE_MARKERS: [&str; 4] = [MARKER_TUPLE, MARKER_LIST, MARKER_SET, MARKER_DICT];

/// Check whether a string is of reserved marker shape (`__…__`)
///
/// This covers the four composite markers, the generic sentinel, and any
/// marker a future format revision might add.
pub fn is_marker_shaped(s: &str) -> bool {
    s.len() > 4 && s.starts_with("__") && s.ends_with("__")
}

/// Stable string identifier for a registered extension type
///
/// Stored on disk as the record marker and inside composite manifests.
/// Two tags are the same type iff the strings are equal; dispatch is by
/// exact tag, never by any notion of subtyping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeTag(String);

impl TypeTag {
    /// Create a tag from a module path and a type name
    ///
    /// # Examples
    ///
    /// ```
    /// use recall_core::tag::TypeTag;
    ///
    /// let tag = TypeTag::new("frame", "Frame").unwrap();
    /// assert_eq!(tag.as_str(), "frame.Frame");
    /// ```
    pub fn new(module: &str, name: &str) -> Result<Self, TagError> {
        if module.is_empty() || name.is_empty() {
            return Err(TagError::Empty);
        }
        Self::parse(&format!("{}.{}", module, name))
    }

    /// Parse a full `<module>.<name>` tag string
    ///
    /// # Errors
    ///
    /// Rejects empty strings, strings without a `.` separator, NUL bytes,
    /// and anything of reserved marker shape.
    pub fn parse(s: &str) -> Result<Self, TagError> {
        if s.is_empty() {
            return Err(TagError::Empty);
        }
        if s.contains('\x00') {
            return Err(TagError::ContainsNul);
        }
        if is_marker_shaped(s) {
            return Err(TagError::ReservedMarker(s.to_string()));
        }
        match s.rsplit_once('.') {
            Some((module, name)) if !module.is_empty() && !name.is_empty() => {
                Ok(TypeTag(s.to_string()))
            }
            _ => Err(TagError::MissingSeparator),
        }
    }

    /// The full tag string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The module segment (everything before the last `.`)
    pub fn module(&self) -> &str {
        self.0.rsplit_once('.').map(|(m, _)| m).unwrap_or("")
    }

    /// The type name segment (everything after the last `.`)
    pub fn name(&self) -> &str {
        self.0.rsplit_once('.').map(|(_, n)| n).unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tag validation errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TagError {
    /// Tag or a segment of it is empty
    #[error("Type tag segments cannot be empty")]
    Empty,

    /// Tag has no `<module>.<name>` separator
    #[error("Type tag must be of the form <module>.<name>")]
    MissingSeparator,

    /// Tag contains a NUL byte
    #[error("Type tag cannot contain NUL bytes")]
    ContainsNul,

    /// Tag collides with the reserved marker namespace
    #[error("'{0}' is reserved marker syntax")]
    ReservedMarker(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_valid_tag() {
        let tag = TypeTag::new("frame", "Frame").unwrap();
        assert_eq!(tag.as_str(), "frame.Frame");
        assert_eq!(tag.module(), "frame");
        assert_eq!(tag.name(), "Frame");
    }

    #[test]
    fn test_parse_nested_module_path() {
        let tag = TypeTag::parse("mylib.types.Widget").unwrap();
        assert_eq!(tag.module(), "mylib.types");
        assert_eq!(tag.name(), "Widget");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(TypeTag::parse(""), Err(TagError::Empty));
    }

    #[test]
    fn test_parse_rejects_missing_separator() {
        assert_eq!(TypeTag::parse("Frame"), Err(TagError::MissingSeparator));
        assert_eq!(TypeTag::parse(".Frame"), Err(TagError::MissingSeparator));
        assert_eq!(TypeTag::parse("frame."), Err(TagError::MissingSeparator));
    }

    #[test]
    fn test_parse_rejects_nul() {
        assert_eq!(TypeTag::parse("a\x00b.c"), Err(TagError::ContainsNul));
    }

    #[test]
    fn test_parse_rejects_reserved_markers() {
        for marker in COMPOSITE_MARKERS {
            assert_eq!(
                TypeTag::parse(marker),
                Err(TagError::ReservedMarker(marker.to_string()))
            );
        }
        assert!(TypeTag::parse(MARKER_GENERIC).is_err());
        // Any marker-shaped string is rejected, not just the known set
        assert!(TypeTag::parse("__future.marker__").is_err());
    }

    #[test]
    fn test_new_rejects_empty_segments() {
        assert_eq!(TypeTag::new("", "Frame"), Err(TagError::Empty));
        assert_eq!(TypeTag::new("frame", ""), Err(TagError::Empty));
    }

    #[test]
    fn test_is_marker_shaped() {
        assert!(is_marker_shaped("__tuple__"));
        assert!(is_marker_shaped("__generic__"));
        assert!(!is_marker_shaped("frame.Frame"));
        assert!(!is_marker_shaped("____")); // too short to carry a name
        assert!(!is_marker_shaped("__x"));
    }

    #[test]
    fn test_tag_display_and_equality() {
        let a = TypeTag::new("frame", "Frame").unwrap();
        let b = TypeTag::parse("frame.Frame").unwrap();
        assert_eq!(a, b);
        assert_eq!(format!("{}", a), "frame.Frame");
    }

    #[test]
    fn test_tag_serde_transparent() {
        let tag = TypeTag::new("frame", "Frame").unwrap();
        let json = serde_json::to_string(&tag).unwrap();
        assert_eq!(json, "\"frame.Frame\"");
        let back: TypeTag = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tag);
    }
}
