//! Provenance descriptors attached to computed values

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lineage record for a value derived by a formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceDescriptor {
    /// Always `"derived"`
    pub method: String,
    /// The formula, with whitespace collapsed
    pub definition: String,
    pub source: ProvenanceSource,
    pub agent: ProvenanceAgent,
}

/// Where a derived value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceSource {
    /// Always `"formula"`
    pub system: String,
    /// The formula as registered
    pub formula: String,
    /// Fields the formula reads, sorted
    pub dependencies: Vec<String>,
}

/// Who produced a derived value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceAgent {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Build the provenance descriptor for a value computed by `formula`
pub fn describe(formula: &str, dependencies: &BTreeSet<String>) -> ProvenanceDescriptor {
    ProvenanceDescriptor {
        method: "derived".to_string(),
        definition: formula.split_whitespace().collect::<Vec<_>>().join(" "),
        source: ProvenanceSource {
            system: "formula".to_string(),
            formula: formula.to_string(),
            dependencies: dependencies.iter().cloned().collect(),
        },
        agent: ProvenanceAgent {
            kind: "system".to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_describe() {
        let deps: BTreeSet<String> = ["Quantity", "Price"].iter().map(|s| s.to_string()).collect();
        let desc = describe("  {Price} *\n   {Quantity} ", &deps);

        assert_eq!(desc.method, "derived");
        assert_eq!(desc.definition, "{Price} * {Quantity}");
        assert_eq!(desc.source.system, "formula");
        assert_eq!(desc.source.formula, "  {Price} *\n   {Quantity} ");
        assert_eq!(desc.source.dependencies, vec!["Price", "Quantity"]);
        assert_eq!(desc.agent.kind, "system");
    }

    #[test]
    fn test_descriptor_json_shape() {
        let desc = describe("{A} + 1", &BTreeSet::from(["A".to_string()]));
        let json = serde_json::to_value(&desc).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "method": "derived",
                "definition": "{A} + 1",
                "source": {
                    "system": "formula",
                    "formula": "{A} + 1",
                    "dependencies": ["A"]
                },
                "agent": { "type": "system" }
            })
        );
    }
}
