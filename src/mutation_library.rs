//! Heuristic mutation operators for packet fields
//!
//! A static lookup: substrings of the field name and of the field type select
//! operator names. Matching is case-insensitive.

/// Field-name fragments and the operators they suggest
const NAME_HEURISTICS: &[(&[&str], &[&str])] = &[
    (
        &["checksum", "csum"],
        &["invalid_checksum", "zero_checksum", "random_checksum"],
    ),
    (
        &["len", "length"],
        &["zero_length", "small_length", "large_length", "mismatched_length"],
    ),
    (
        &["flags"],
        &["zero_flags", "all_flags_set", "random_flags", "invalid_flag_combination"],
    ),
    (
        &["port"],
        &["zero_port", "well_known_port", "ephemeral_port", "max_port"],
    ),
    (&["seq", "ack"], &["random_seq", "zero_seq", "max_seq"]),
];

/// Field-type fragments and the operators they suggest
const TYPE_HEURISTICS: &[(&[&str], &[&str])] = &[(
    &["int"],
    &["boundary_value_min", "boundary_value_max", "random_int"],
)];

/// Suggest mutation operators for a field
///
/// The result holds each operator once, in table order.
///
/// ```
/// use pacaller::mutation_library::heuristic_mutations;
///
/// let ops = heuristic_mutations("checksum", "u32");
/// assert_eq!(ops, vec!["invalid_checksum", "zero_checksum", "random_checksum"]);
/// ```
pub fn heuristic_mutations(field_name: &str, field_type: &str) -> Vec<String> {
    let name = field_name.to_ascii_lowercase();
    let ty = field_type.to_ascii_lowercase();

    let by_name = NAME_HEURISTICS
        .iter()
        .filter(|(fragments, _)| fragments.iter().any(|f| name.contains(f)));
    let by_type = TYPE_HEURISTICS
        .iter()
        .filter(|(fragments, _)| fragments.iter().any(|f| ty.contains(f)));

    let mut mutations: Vec<String> = Vec::new();
    for (_, ops) in by_name.chain(by_type) {
        for op in ops.iter() {
            if !mutations.iter().any(|m| m == op) {
                mutations.push(op.to_string());
            }
        }
    }
    mutations
}
