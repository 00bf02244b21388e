//! Intermediate representation of extracted kernel resources
//!
//! The resource identification stage emits a flat list of JSON records:
//!
//! ```json
//! [
//!   {"type": "struct", "name": "udphdr", "origin_file": "net/ipv4/udp.c",
//!    "fields": [{"name": "source", "type": "u16"}, {"name": "dest", "type": "u16"}]},
//!   {"type": "typedef", "name": "sctp_assoc_t", "base_type": "__s32"},
//!   {"type": "const", "name": "SCTP_SNDRCV", "value": 1}
//! ]
//! ```
//!
//! [`IntermediateRepresentation`] turns those records into typed resources.
//! Names are unique keys: a later record with the same name replaces the
//! earlier one (last write wins), whatever kinds the two records have.

use crate::type_mapper::split_array;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Origin recorded for resources that carry no `origin_file`
pub const UNKNOWN_ORIGIN: &str = "unknown";

/// Discriminator of a resource record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Struct,
    TypeDef,
    Constant,
}

impl ResourceKind {
    /// Parse the `type` tag of a raw record
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "struct" => Some(Self::Struct),
            "typedef" => Some(Self::TypeDef),
            "const" => Some(Self::Constant),
            _ => None,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            Self::Struct => "struct",
            Self::TypeDef => "typedef",
            Self::Constant => "const",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Raw record as produced by the extractor
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub name: Option<String>,
    pub origin_file: Option<String>,
    #[serde(default)]
    pub fields: Vec<RawField>,
    pub base_type: Option<String>,
    pub value: Option<serde_json::Value>,
}

/// Raw struct member; both keys are mandatory
#[derive(Debug, Clone, Deserialize)]
pub struct RawField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Classify a field type as a reference to a user-defined type
///
/// Strips every `*` and any `[]` / `[N]` array suffixes, trims, and accepts
/// the rest only when it is a single word. Multi-word spellings are
/// rejected, which excludes builtins such as `unsigned int` but also
/// `struct foo` spellings; single-word builtins such as `u16` are accepted
/// and simply never resolve to a struct.
pub fn custom_type_name(type_name: &str) -> Option<String> {
    let stripped = type_name.replace('*', "");
    let mut base = stripped.trim();
    while let Some((element, _)) = split_array(base) {
        base = element.trim();
    }

    if base.is_empty() || base.contains(char::is_whitespace) {
        return None;
    }

    Some(base.to_string())
}

/// A struct member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// Source type text, unmodified
    pub type_name: String,
    pub is_pointer: bool,
    pub is_array: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        let type_name = type_name.into();
        Self {
            name: name.into(),
            is_pointer: type_name.contains('*'),
            is_array: split_array(type_name.trim()).is_some(),
            type_name,
        }
    }
}

/// A struct definition together with the type names its fields reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Struct {
    pub name: String,
    pub origin_file: String,
    pub fields: Vec<Field>,
    /// Candidate user-defined types referenced by fields (never `name` itself)
    pub dependencies: BTreeSet<String>,
}

impl Struct {
    pub fn new(name: impl Into<String>, origin_file: impl Into<String>, fields: Vec<Field>) -> Self {
        let name = name.into();
        let dependencies = fields
            .iter()
            .filter_map(|f| custom_type_name(&f.type_name))
            .filter(|dep| *dep != name)
            .collect();

        Self {
            name,
            origin_file: origin_file.into(),
            fields,
            dependencies,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub name: String,
    pub origin_file: String,
    pub base_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constant {
    pub name: String,
    pub origin_file: String,
    /// Textual form of the value (JSON numbers are rendered as written)
    pub value: Option<String>,
}

/// Any resource known to the IR
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    Struct(Struct),
    TypeDef(TypeDef),
    Constant(Constant),
}

impl Resource {
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(s) => &s.name,
            Self::TypeDef(t) => &t.name,
            Self::Constant(c) => &c.name,
        }
    }

    pub fn origin_file(&self) -> &str {
        match self {
            Self::Struct(s) => &s.origin_file,
            Self::TypeDef(t) => &t.origin_file,
            Self::Constant(c) => &c.origin_file,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Struct(_) => ResourceKind::Struct,
            Self::TypeDef(_) => ResourceKind::TypeDef,
            Self::Constant(_) => ResourceKind::Constant,
        }
    }

    pub fn as_struct(&self) -> Option<&Struct> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }

    /// Build a resource from a raw record
    ///
    /// Returns `None` for records without a name or with an unknown kind.
    pub fn from_record(record: RawRecord) -> Option<Self> {
        let name = record.name.filter(|n| !n.is_empty())?;
        let kind = ResourceKind::from_tag(record.kind.as_deref()?)?;
        let origin_file = record
            .origin_file
            .unwrap_or_else(|| UNKNOWN_ORIGIN.to_string());

        let resource = match kind {
            ResourceKind::Struct => {
                let fields = record
                    .fields
                    .into_iter()
                    .map(|f| Field::new(f.name, f.type_name))
                    .collect();
                Self::Struct(Struct::new(name, origin_file, fields))
            }
            ResourceKind::TypeDef => Self::TypeDef(TypeDef {
                name,
                origin_file,
                base_type: record.base_type,
            }),
            ResourceKind::Constant => Self::Constant(Constant {
                name,
                origin_file,
                value: record.value.map(|v| match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                }),
            }),
        };

        Some(resource)
    }
}

/// Typed view over all resources of one generation run
#[derive(Debug, Clone, Default)]
pub struct IntermediateRepresentation {
    resources: BTreeMap<String, Resource>,
}

impl IntermediateRepresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from undecoded JSON records
    ///
    /// Records that do not decode (for example a struct field without a
    /// `type`) are logged and skipped.
    pub fn from_values(values: Vec<serde_json::Value>) -> Self {
        let records = values
            .into_iter()
            .enumerate()
            .filter_map(|(idx, value)| match serde_json::from_value::<RawRecord>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Skipping malformed IR record #{}: {}", idx, e);
                    None
                }
            });

        Self::from_records(records)
    }

    pub fn from_records<I: IntoIterator<Item = RawRecord>>(records: I) -> Self {
        let mut ir = Self::new();
        for record in records {
            if let Some(resource) = Resource::from_record(record) {
                ir.insert(resource);
            }
        }
        ir
    }

    /// Insert a resource, replacing any earlier resource with the same name
    pub fn insert(&mut self, resource: Resource) -> Option<Resource> {
        let previous = self.resources.insert(resource.name().to_string(), resource);
        if let Some(prev) = &previous {
            tracing::debug!(
                "Resource '{}' redefined; keeping the later definition (was {})",
                prev.name(),
                prev.kind()
            );
        }
        previous
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn get_resource(&self, name: &str) -> Option<&Resource> {
        self.resources.get(name)
    }

    pub fn get_struct(&self, name: &str) -> Option<&Struct> {
        self.resources.get(name).and_then(Resource::as_struct)
    }

    /// All resources, ordered by name
    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.values()
    }

    pub fn structs(&self) -> impl Iterator<Item = &Struct> {
        self.resources.values().filter_map(Resource::as_struct)
    }

    pub fn typedefs(&self) -> impl Iterator<Item = &TypeDef> {
        self.resources.values().filter_map(|r| match r {
            Resource::TypeDef(t) => Some(t),
            _ => None,
        })
    }

    pub fn constants(&self) -> impl Iterator<Item = &Constant> {
        self.resources.values().filter_map(|r| match r {
            Resource::Constant(c) => Some(c),
            _ => None,
        })
    }

    pub fn struct_count(&self) -> usize {
        self.structs().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn udphdr() -> serde_json::Value {
        json!({
            "type": "struct",
            "name": "udphdr",
            "origin_file": "net/ipv4/udp.c",
            "fields": [
                {"name": "source", "type": "u16"},
                {"name": "dest", "type": "u16"},
                {"name": "len", "type": "u16"},
                {"name": "check", "type": "sum16"}
            ]
        })
    }

    #[test]
    fn test_custom_type_name_strips_pointer_and_array() {
        assert_eq!(custom_type_name("struct_a *"), Some("struct_a".to_string()));
        assert_eq!(custom_type_name(" u8[] "), Some("u8".to_string()));
        assert_eq!(custom_type_name("foo **"), Some("foo".to_string()));
    }

    #[test]
    fn test_custom_type_name_strips_sized_array() {
        assert_eq!(custom_type_name("in6_addr[2]"), Some("in6_addr".to_string()));
        assert_eq!(custom_type_name("z_inner [16]"), Some("z_inner".to_string()));
        assert_eq!(custom_type_name("u8[4][8]"), Some("u8".to_string()));
        assert_eq!(custom_type_name("u8[N]"), Some("u8[N]".to_string()));
    }

    #[test]
    fn test_custom_type_name_rejects_multi_word() {
        assert_eq!(custom_type_name("unsigned int"), None);
        assert_eq!(custom_type_name("struct sock *"), None);
        assert_eq!(custom_type_name("  "), None);
        assert_eq!(custom_type_name("*"), None);
    }

    #[test]
    fn test_field_flags() {
        let f = Field::new("data", "u8[]");
        assert!(f.is_array);
        assert!(!f.is_pointer);

        assert!(Field::new("addrs", "in6_addr[2]").is_array);

        let p = Field::new("next", "node *");
        assert!(p.is_pointer);
        assert!(!p.is_array);
    }

    #[test]
    fn test_struct_dependencies_exclude_self() {
        let s = Struct::new(
            "node",
            "net/core/x.c",
            vec![
                Field::new("next", "node *"),
                Field::new("payload", "payload_hdr"),
                Field::new("count", "unsigned int"),
                Field::new("flags", "u32"),
            ],
        );

        let deps: Vec<_> = s.dependencies.iter().cloned().collect();
        assert_eq!(deps, vec!["payload_hdr".to_string(), "u32".to_string()]);
    }

    #[test]
    fn test_parse_struct_record() {
        let ir = IntermediateRepresentation::from_values(vec![udphdr()]);
        let s = ir.get_struct("udphdr").unwrap();

        assert_eq!(s.fields.len(), 4);
        assert_eq!(s.fields[3].name, "check");
        assert_eq!(s.fields[3].type_name, "sum16");
        assert_eq!(s.origin_file, "net/ipv4/udp.c");
    }

    #[test]
    fn test_origin_defaults_to_unknown() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "typedef", "name": "sctp_assoc_t", "base_type": "__s32"}),
        ]);
        let r = ir.get_resource("sctp_assoc_t").unwrap();
        assert_eq!(r.origin_file(), UNKNOWN_ORIGIN);
        assert_eq!(r.kind(), ResourceKind::TypeDef);
    }

    #[test]
    fn test_constant_value_rendering() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "const", "name": "A", "value": 7}),
            json!({"type": "const", "name": "B", "value": "0x10"}),
            json!({"type": "const", "name": "C"}),
        ]);

        let values: Vec<_> = ir.constants().map(|c| c.value.clone()).collect();
        assert_eq!(
            values,
            vec![Some("7".to_string()), Some("0x10".to_string()), None]
        );
    }

    #[test]
    fn test_nameless_and_unknown_records_skipped() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "struct", "fields": []}),
            json!({"type": "enum", "name": "e"}),
            json!({"name": "no_type"}),
            udphdr(),
        ]);
        assert_eq!(ir.len(), 1);
    }

    #[test]
    fn test_malformed_record_skipped() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "struct", "name": "broken", "fields": [{"name": "x"}]}),
            json!("not an object"),
            udphdr(),
        ]);
        assert_eq!(ir.len(), 1);
        assert!(ir.get_struct("broken").is_none());
    }

    #[test]
    fn test_last_write_wins_same_kind() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "struct", "name": "s", "fields": [{"name": "a", "type": "u8"}]}),
            json!({"type": "struct", "name": "s", "fields": [{"name": "b", "type": "u16"}]}),
        ]);
        let s = ir.get_struct("s").unwrap();
        assert_eq!(s.fields[0].name, "b");
    }

    #[test]
    fn test_last_write_wins_across_kinds() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "struct", "name": "s", "fields": []}),
            json!({"type": "typedef", "name": "s", "base_type": "int"}),
        ]);

        assert_eq!(ir.len(), 1);
        assert!(ir.get_struct("s").is_none());
        assert_eq!(ir.struct_count(), 0);
        assert_eq!(ir.typedefs().count(), 1);
    }

    #[test]
    fn test_kind_tag_roundtrip() {
        for kind in [ResourceKind::Struct, ResourceKind::TypeDef, ResourceKind::Constant] {
            assert_eq!(ResourceKind::from_tag(kind.as_tag()), Some(kind));
        }
        assert_eq!(ResourceKind::from_tag("union"), None);
    }
}
