//! Kernel C type to syzlang type mapping
//!
//! The mapping is deliberately small: fixed-width integer spellings, `char`,
//! `size_t`, the common pointer/string shorthands and one known typedef.
//! Anything else is assumed to name a struct or typedef defined elsewhere and
//! is passed through unchanged.

use std::collections::HashMap;

/// Whole-type spellings that are looked up before pointer stripping
const POINTER_TYPES: &[(&str, &str)] = &[
    ("void*", "ptr"),
    ("void *", "ptr"),
    ("char*", "string"),
    ("char *", "string"),
    ("const char*", "string"),
    ("const char *", "string"),
];

const BASE_TYPES: &[(&str, &str)] = &[
    ("__u8", "int8"),
    ("__s8", "int8"),
    ("u8", "int8"),
    ("s8", "int8"),
    ("char", "int8"),
    ("__u16", "int16"),
    ("__s16", "int16"),
    ("u16", "int16"),
    ("s16", "int16"),
    ("short", "int16"),
    ("__u32", "int32"),
    ("__s32", "int32"),
    ("u32", "int32"),
    ("s32", "int32"),
    ("int", "int32"),
    ("unsigned int", "int32"),
    ("__u64", "int64"),
    ("__s64", "int64"),
    ("u64", "int64"),
    ("s64", "int64"),
    ("long", "int64"),
    ("unsigned long", "int64"),
    ("size_t", "intptr"),
    ("sctp_assoc_t", "int32"),
];

/// Output tokens that already denote a pointer and are never wrapped again
const POINTER_LIKE: &[&str] = &["ptr", "string"];

/// Maps C-like kernel type strings to syzlang type tokens
#[derive(Debug, Clone)]
pub struct TypeMapper {
    mapping: HashMap<&'static str, &'static str>,
}

impl Default for TypeMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeMapper {
    pub fn new() -> Self {
        Self {
            mapping: POINTER_TYPES.iter().chain(BASE_TYPES).copied().collect(),
        }
    }

    /// Convert a C type string into a syzlang type
    ///
    /// ```
    /// use pacaller::type_mapper::TypeMapper;
    ///
    /// let mapper = TypeMapper::new();
    /// assert_eq!(mapper.to_syz_type("__u16"), "int16");
    /// assert_eq!(mapper.to_syz_type("int *"), "ptr[in, int32]");
    /// assert_eq!(mapper.to_syz_type("char *"), "string");
    /// assert_eq!(mapper.to_syz_type("sctp_sndrcvinfo"), "sctp_sndrcvinfo");
    /// ```
    pub fn to_syz_type(&self, c_type: &str) -> String {
        let c_type = c_type.trim();

        if let Some(mapped) = self.mapping.get(c_type) {
            if POINTER_LIKE.contains(mapped) {
                return (*mapped).to_string();
            }
        }

        if let Some((element, len)) = split_array(c_type) {
            let element = self.to_syz_type(element);
            return match len {
                Some(len) => format!("array[{}, {}]", element, len),
                None => format!("array[{}]", element),
            };
        }

        let is_pointer = c_type.ends_with('*');
        let base = c_type.replace('*', "");
        let base = base.trim();

        let syz_base = self.mapping.get(base).copied().unwrap_or(base);

        if is_pointer {
            if POINTER_LIKE.contains(&syz_base) {
                return syz_base.to_string();
            }
            return format!("ptr[in, {}]", syz_base);
        }

        syz_base.to_string()
    }
}

/// Split `T[]` / `T[N]` into element type and optional decimal length
pub(crate) fn split_array(c_type: &str) -> Option<(&str, Option<&str>)> {
    let inner = c_type.strip_suffix(']')?;
    let open = inner.rfind('[')?;
    let (element, len) = (inner[..open].trim_end(), &inner[open + 1..]);

    if element.is_empty() {
        return None;
    }
    if len.is_empty() {
        return Some((element, None));
    }
    if len.chars().all(|c| c.is_ascii_digit()) {
        return Some((element, Some(len)));
    }
    None
}
