//! Packet mutation models
//!
//! For every struct that looks like a protocol header, a model records the
//! raw field layout plus the mutation operators suggested for each field:
//!
//! ```json
//! {
//!   "base_model": {"name": "tcp_opt_hdr", "fields": [{"name": "checksum", "type": "u32"}]},
//!   "mutation_targets": [
//!     {"field_name": "checksum", "mutations": ["invalid_checksum", "zero_checksum", "random_checksum"]}
//!   ]
//! }
//! ```
//!
//! Field types are kept as written in the C sources, not mapped to syzlang.

use crate::config::GeneratorConfig;
use crate::ir::{IntermediateRepresentation, Struct};
use crate::mutation_library::heuristic_mutations;
use serde::{Deserialize, Serialize};

/// Field of a base model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Structural description of a header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseModel {
    pub name: String,
    pub fields: Vec<ModelField>,
}

/// Mutation operators suggested for one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationTarget {
    pub field_name: String,
    pub mutations: Vec<String>,
}

/// Complete packet model artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketModel {
    pub base_model: BaseModel,
    pub mutation_targets: Vec<MutationTarget>,
}

impl PacketModel {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn mutations_for(&self, field_name: &str) -> Option<&[String]> {
        self.mutation_targets
            .iter()
            .find(|t| t.field_name == field_name)
            .map(|t| t.mutations.as_slice())
    }
}

/// Selects header-like structs and builds their models
#[derive(Debug, Clone)]
pub struct PacketModelBuilder {
    header_markers: Vec<String>,
    model_extension: String,
}

impl PacketModelBuilder {
    pub fn new(config: &GeneratorConfig) -> Self {
        Self {
            header_markers: config
                .header_markers
                .iter()
                .map(|m| m.to_ascii_lowercase())
                .collect(),
            model_extension: config.model_extension.clone(),
        }
    }

    fn is_header_name(&self, name: &str) -> bool {
        let name = name.to_ascii_lowercase();
        self.header_markers.iter().any(|m| name.contains(m.as_str()))
    }

    /// Structs to model
    ///
    /// Structs whose name contains a header marker; every struct when none
    /// does.
    pub fn select_candidates<'ir>(&self, ir: &'ir IntermediateRepresentation) -> Vec<&'ir Struct> {
        let candidates: Vec<&Struct> = ir.structs().filter(|s| self.is_header_name(&s.name)).collect();

        if candidates.is_empty() && ir.struct_count() > 0 {
            tracing::warn!(
                "No potential packet headers found based on naming conventions. Generating for all structs."
            );
            return ir.structs().collect();
        }

        candidates
    }

    pub fn base_model(&self, struct_def: &Struct) -> BaseModel {
        BaseModel {
            name: struct_def.name.clone(),
            fields: struct_def
                .fields
                .iter()
                .map(|f| ModelField {
                    name: f.name.clone(),
                    type_name: f.type_name.clone(),
                })
                .collect(),
        }
    }

    /// Fields with at least one suggested operator
    pub fn mutation_targets(&self, struct_def: &Struct) -> Vec<MutationTarget> {
        struct_def
            .fields
            .iter()
            .filter_map(|f| {
                let mutations = heuristic_mutations(&f.name, &f.type_name);
                (!mutations.is_empty()).then(|| MutationTarget {
                    field_name: f.name.clone(),
                    mutations,
                })
            })
            .collect()
    }

    pub fn build(&self, struct_def: &Struct) -> PacketModel {
        PacketModel {
            base_model: self.base_model(struct_def),
            mutation_targets: self.mutation_targets(struct_def),
        }
    }

    /// Build models for all candidates, paired with their file names
    pub fn build_all(&self, ir: &IntermediateRepresentation) -> Vec<(String, PacketModel)> {
        self.select_candidates(ir)
            .into_iter()
            .map(|s| {
                tracing::info!("Generating packet model for: {}", s.name);
                (self.file_name(s), self.build(s))
            })
            .collect()
    }

    pub fn file_name(&self, struct_def: &Struct) -> String {
        format!("{}{}", struct_def.name, self.model_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> PacketModelBuilder {
        PacketModelBuilder::new(&GeneratorConfig::default())
    }

    #[test]
    fn test_tcp_opt_hdr_checksum_targets() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "struct", "name": "tcp_opt_hdr", "fields": [{"name": "checksum", "type": "u32"}]}),
            json!({"type": "struct", "name": "sock_state", "fields": [{"name": "len", "type": "u32"}]}),
        ]);

        let candidates = builder().select_candidates(&ir);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "tcp_opt_hdr");

        let model = builder().build(candidates[0]);
        let ops = model.mutations_for("checksum").unwrap();
        for expected in ["invalid_checksum", "zero_checksum", "random_checksum"] {
            assert!(ops.iter().any(|o| o == expected));
        }
    }

    #[test]
    fn test_header_marker_case_insensitive() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "struct", "name": "IPv6Header", "fields": []}),
            json!({"type": "struct", "name": "other", "fields": []}),
        ]);
        let names: Vec<_> = builder().select_candidates(&ir).iter().map(|s| s.name.clone()).collect();
        assert_eq!(names, vec!["IPv6Header"]);
    }

    #[test]
    fn test_fallback_to_all_structs() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "struct", "name": "sock_a", "fields": []}),
            json!({"type": "struct", "name": "sock_b", "fields": []}),
            json!({"type": "const", "name": "X_HDR_LEN"}),
        ]);
        assert_eq!(builder().select_candidates(&ir).len(), 2);
    }

    #[test]
    fn test_base_model_keeps_source_types() {
        let ir = IntermediateRepresentation::from_values(vec![json!({
            "type": "struct",
            "name": "udphdr",
            "fields": [{"name": "source", "type": "__be16"}, {"name": "data", "type": "char *"}]
        })]);
        let model = builder().build(ir.get_struct("udphdr").unwrap());

        assert_eq!(model.base_model.fields[0].type_name, "__be16");
        assert_eq!(model.base_model.fields[1].type_name, "char *");
    }

    #[test]
    fn test_fields_without_mutations_omitted() {
        let ir = IntermediateRepresentation::from_values(vec![json!({
            "type": "struct",
            "name": "icmphdr",
            "fields": [{"name": "code", "type": "__u8"}, {"name": "checksum", "type": "__sum16"}]
        })]);
        let model = builder().build(ir.get_struct("icmphdr").unwrap());

        assert_eq!(model.mutation_targets.len(), 1);
        assert_eq!(model.mutation_targets[0].field_name, "checksum");
    }

    #[test]
    fn test_json_shape() {
        let ir = IntermediateRepresentation::from_values(vec![json!({
            "type": "struct",
            "name": "igmphdr",
            "fields": [{"name": "csum", "type": "__sum16"}]
        })]);
        let model = builder().build(ir.get_struct("igmphdr").unwrap());
        let value: serde_json::Value = serde_json::from_str(&model.to_json_pretty().unwrap()).unwrap();

        assert_eq!(value["base_model"]["name"], "igmphdr");
        assert_eq!(value["base_model"]["fields"][0]["type"], "__sum16");
        assert_eq!(value["mutation_targets"][0]["field_name"], "csum");
        assert!(value["mutation_targets"][0]["mutations"].is_array());
    }

    #[test]
    fn test_build_all_file_names() {
        let ir = IntermediateRepresentation::from_values(vec![
            json!({"type": "struct", "name": "dccp_hdr", "fields": []}),
        ]);
        let models = builder().build_all(&ir);
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].0, "dccp_hdr.json");
    }
}
