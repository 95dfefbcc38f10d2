//! Type-option catalog and element type sets
//!
//! The catalog is the fixed list of request-type identifiers accepted in the
//! option part of a filter. Rules and queries carry sets of these tags as
//! `ElementTypes` bit masks.

use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};

// =============================================================================
// Type Options
// =============================================================================

/// One entry of the type-option catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TypeOption {
    Script = 0,
    Image = 1,
    Stylesheet = 2,
    Object = 3,
    XmlHttpRequest = 4,
    /// `object-subrequest`
    ObjectSubrequest = 5,
    /// `object_subrequest`, the non-standard spelling some lists use
    ObjectSubrequestAlt = 6,
    Subdocument = 7,
    Document = 8,
    Elemhide = 9,
    Popup = 10,
    ThirdParty = 11,
    Collapse = 12,
    Background = 13,
    Xbl = 14,
    Dtd = 15,
    Media = 16,
    Other = 17,
}

impl TypeOption {
    /// Every catalog entry, in catalog order.
    pub const ALL: [TypeOption; 18] = [
        Self::Script,
        Self::Image,
        Self::Stylesheet,
        Self::Object,
        Self::XmlHttpRequest,
        Self::ObjectSubrequest,
        Self::ObjectSubrequestAlt,
        Self::Subdocument,
        Self::Document,
        Self::Elemhide,
        Self::Popup,
        Self::ThirdParty,
        Self::Collapse,
        Self::Background,
        Self::Xbl,
        Self::Dtd,
        Self::Media,
        Self::Other,
    ];

    /// Identifier as written in filter options.
    pub const fn id(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Image => "image",
            Self::Stylesheet => "stylesheet",
            Self::Object => "object",
            Self::XmlHttpRequest => "xmlhttprequest",
            Self::ObjectSubrequest => "object-subrequest",
            Self::ObjectSubrequestAlt => "object_subrequest",
            Self::Subdocument => "subdocument",
            Self::Document => "document",
            Self::Elemhide => "elemhide",
            Self::Popup => "popup",
            Self::ThirdParty => "third-party",
            Self::Collapse => "collapse",
            Self::Background => "background",
            Self::Xbl => "xbl",
            Self::Dtd => "dtd",
            Self::Media => "media",
            Self::Other => "other",
        }
    }

    /// Human readable description for help output.
    pub const fn description(self) -> &'static str {
        match self {
            Self::Script => "external scripts loaded via HTML script tag",
            Self::Image => "regular images, typically loaded via HTML img tag",
            Self::Stylesheet => "external CSS stylesheet files",
            Self::Object => "content handled by browser plugins, e.g. Flash or Java",
            Self::XmlHttpRequest => "requests started by the XMLHttpRequest object",
            Self::ObjectSubrequest => "requests started plugins like Flash",
            Self::ObjectSubrequestAlt => {
                "requests started plugins like Flash (non-standard form used in some lists)"
            }
            Self::Subdocument => "embedded pages, usually included via HTML frames",
            Self::Document => "the page itself (only exception rules can be applied to the page)",
            Self::Elemhide => {
                "for exception rules only, similar to document but only disables element \
                 hiding rules on the page rather than all filter rules"
            }
            Self::Popup => "unsupported option used in some files",
            Self::ThirdParty => {
                "restriction to third-party/first-party requests: if the third-party option \
                 is specified, the filter is only applied to requests from a different origin \
                 than the currently viewed page; ~third-party restricts the filter to requests \
                 from the same origin as the currently viewed page"
            }
            Self::Collapse => {
                "overrides the global \"hide placeholders of blocked elements\" option and \
                 makes sure the filter always hides the element; ~collapse makes sure the \
                 filter never hides the element"
            }
            Self::Background | Self::Xbl | Self::Dtd => {
                "the type options background, xbl, ping and dtd are outdated and should no \
                 longer be used"
            }
            Self::Media => "unknown option rarely used",
            Self::Other => "types of requests not covered in the list above",
        }
    }

    /// Look up a catalog entry by its exact identifier.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|opt| opt.id() == id)
    }

    /// Single-bit set for this entry.
    #[inline]
    pub const fn flag(self) -> ElementTypes {
        ElementTypes::from_bits_retain(1 << self as u32)
    }
}

impl fmt::Display for TypeOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl Serialize for TypeOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.id())
    }
}

// =============================================================================
// Element Type Sets
// =============================================================================

bitflags::bitflags! {
    /// Set of type tags, one bit per catalog entry.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ElementTypes: u32 {
        const SCRIPT = 1 << 0;
        const IMAGE = 1 << 1;
        const STYLESHEET = 1 << 2;
        const OBJECT = 1 << 3;
        const XMLHTTPREQUEST = 1 << 4;
        const OBJECT_SUBREQUEST = 1 << 5;
        const OBJECT_SUBREQUEST_ALT = 1 << 6;
        const SUBDOCUMENT = 1 << 7;
        const DOCUMENT = 1 << 8;
        const ELEMHIDE = 1 << 9;
        const POPUP = 1 << 10;
        const THIRD_PARTY = 1 << 11;
        const COLLAPSE = 1 << 12;
        const BACKGROUND = 1 << 13;
        const XBL = 1 << 14;
        const DTD = 1 << 15;
        const MEDIA = 1 << 16;
        const OTHER = 1 << 17;

        /// Tags that qualify a request rather than name its kind
        const MODIFIERS = Self::THIRD_PARTY.bits() | Self::COLLAPSE.bits();
    }
}

impl ElementTypes {
    /// The request-kind part of the set, without modifier tags.
    #[inline]
    pub fn request_kinds(self) -> Self {
        self.difference(Self::MODIFIERS)
    }

    /// Build a set from catalog identifiers. Returns the first unknown id on failure.
    pub fn from_ids<'s, I>(ids: I) -> Result<Self, &'s str>
    where
        I: IntoIterator<Item = &'s str>,
    {
        let mut set = Self::empty();
        for id in ids {
            let opt = TypeOption::from_id(id).ok_or(id)?;
            set |= opt.flag();
        }
        Ok(set)
    }

    /// Iterate the catalog entries contained in this set, in catalog order.
    pub fn options(self) -> impl Iterator<Item = TypeOption> {
        TypeOption::ALL
            .into_iter()
            .filter(move |opt| self.contains(opt.flag()))
    }
}

impl From<TypeOption> for ElementTypes {
    fn from(opt: TypeOption) -> Self {
        opt.flag()
    }
}

impl FromIterator<TypeOption> for ElementTypes {
    fn from_iter<I: IntoIterator<Item = TypeOption>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), |set, opt| set | opt.flag())
    }
}

impl fmt::Display for ElementTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for opt in self.options() {
            if !first {
                f.write_str(",")?;
            }
            f.write_str(opt.id())?;
            first = false;
        }
        Ok(())
    }
}

impl Serialize for ElementTypes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.bits().count_ones() as usize))?;
        for opt in self.options() {
            seq.serialize_element(opt.id())?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_eighteen_unique_ids() {
        let mut ids: Vec<&str> = TypeOption::ALL.iter().map(|opt| opt.id()).collect();
        assert_eq!(ids.len(), 18);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 18);
    }

    #[test]
    fn flag_bits_line_up_with_named_constants() {
        assert_eq!(TypeOption::Script.flag(), ElementTypes::SCRIPT);
        assert_eq!(TypeOption::ObjectSubrequest.flag(), ElementTypes::OBJECT_SUBREQUEST);
        assert_eq!(TypeOption::ObjectSubrequestAlt.flag(), ElementTypes::OBJECT_SUBREQUEST_ALT);
        assert_eq!(TypeOption::Other.flag(), ElementTypes::OTHER);
        assert_eq!(ElementTypes::all().bits().count_ones(), 18);
    }

    #[test]
    fn request_kinds_drop_modifiers() {
        let set = ElementTypes::THIRD_PARTY | ElementTypes::SCRIPT | ElementTypes::COLLAPSE;
        assert_eq!(set.request_kinds(), ElementTypes::SCRIPT);
        assert!(ElementTypes::THIRD_PARTY.request_kinds().is_empty());
    }

    #[test]
    fn from_id_is_exact() {
        assert_eq!(TypeOption::from_id("third-party"), Some(TypeOption::ThirdParty));
        assert_eq!(TypeOption::from_id("object_subrequest"), Some(TypeOption::ObjectSubrequestAlt));
        assert_eq!(TypeOption::from_id("Script"), None);
        assert_eq!(TypeOption::from_id("font"), None);
    }

    #[test]
    fn from_ids_reports_unknown() {
        let set = ElementTypes::from_ids(["script", "image"]).unwrap();
        assert_eq!(set, ElementTypes::SCRIPT | ElementTypes::IMAGE);
        assert_eq!(ElementTypes::from_ids(["script", "websocket"]), Err("websocket"));
    }

    #[test]
    fn display_and_serialize_use_catalog_ids() {
        let set = ElementTypes::IMAGE | ElementTypes::SCRIPT | ElementTypes::OTHER;
        assert_eq!(set.to_string(), "script,image,other");
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["script","image","other"]"#);
    }
}
