use serde::{Deserialize, Serialize};

/// One entry of a contract ABI array.
///
/// The `type` tag selects the variant; anything outside the four known
/// entry kinds is a deserialization error, so malformed registries are
/// rejected at parse time instead of surfacing later during lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AbiEntry {
    Function {
        name: String,
        #[serde(default)]
        inputs: Vec<AbiParam>,
        #[serde(default)]
        outputs: Vec<AbiParam>,
        #[serde(rename = "stateMutability")]
        state_mutability: StateMutability,
    },
    Event {
        // Anonymous events may omit the name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(default)]
        inputs: Vec<AbiParam>,
        #[serde(default)]
        anonymous: bool,
    },
    Error {
        name: String,
        #[serde(default)]
        inputs: Vec<AbiParam>,
    },
    Constructor {
        #[serde(default)]
        inputs: Vec<AbiParam>,
        #[serde(rename = "stateMutability")]
        state_mutability: StateMutability,
    },
}

impl AbiEntry {
    /// Entry name, if the entry kind carries one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Function { name, .. } | Self::Error { name, .. } => Some(name),
            Self::Event { name, .. } => name.as_deref(),
            Self::Constructor { .. } => None,
        }
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Self::Function { .. })
    }

    pub fn is_event(&self) -> bool {
        matches!(self, Self::Event { .. })
    }
}

/// A typed input or output parameter of an ABI entry.
///
/// `components` recurses for tuple types; `indexed` is only present on
/// event parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbiParam {
    #[serde(rename = "internalType", skip_serializing_if = "Option::is_none")]
    pub internal_type: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<AbiParam>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed: Option<bool>,
}

/// Mutability classification of a function or constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StateMutability {
    Pure,
    View,
    Nonpayable,
    Payable,
}

impl StateMutability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pure => "pure",
            Self::View => "view",
            Self::Nonpayable => "nonpayable",
            Self::Payable => "payable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_function_entry() {
        let entry: AbiEntry = serde_json::from_str(
            r#"{
                "inputs": [
                    { "internalType": "address", "name": "user", "type": "address" }
                ],
                "name": "balance",
                "outputs": [
                    { "internalType": "uint256", "name": "", "type": "uint256" }
                ],
                "stateMutability": "view",
                "type": "function"
            }"#,
        )
        .unwrap();

        match &entry {
            AbiEntry::Function {
                name,
                inputs,
                outputs,
                state_mutability,
            } => {
                assert_eq!(name, "balance");
                assert_eq!(inputs.len(), 1);
                assert_eq!(outputs[0].ty, "uint256");
                assert_eq!(*state_mutability, StateMutability::View);
            }
            other => panic!("Expected function entry, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_event_with_indexed_params() {
        let entry: AbiEntry = serde_json::from_str(
            r#"{
                "anonymous": false,
                "inputs": [
                    { "indexed": true, "internalType": "address", "name": "staker", "type": "address" },
                    { "indexed": false, "internalType": "uint256", "name": "amount", "type": "uint256" }
                ],
                "name": "Staked",
                "type": "event"
            }"#,
        )
        .unwrap();

        assert!(entry.is_event());
        assert_eq!(entry.name(), Some("Staked"));
        match entry {
            AbiEntry::Event {
                inputs, anonymous, ..
            } => {
                assert!(!anonymous);
                assert_eq!(inputs[0].indexed, Some(true));
                assert_eq!(inputs[1].indexed, Some(false));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_parse_tuple_components() {
        let entry: AbiEntry = serde_json::from_str(
            r#"{
                "inputs": [],
                "name": "epoch",
                "outputs": [
                    {
                        "components": [
                            { "internalType": "uint256", "name": "epochLength", "type": "uint256" },
                            { "internalType": "uint256", "name": "number", "type": "uint256" }
                        ],
                        "internalType": "struct LibStakingStorage.Epoch",
                        "name": "",
                        "type": "tuple"
                    }
                ],
                "stateMutability": "view",
                "type": "function"
            }"#,
        )
        .unwrap();

        match entry {
            AbiEntry::Function { outputs, .. } => {
                let components = outputs[0].components.as_ref().unwrap();
                assert_eq!(components.len(), 2);
                assert_eq!(components[0].name, "epochLength");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_unknown_entry_type_rejected() {
        let result: Result<AbiEntry, _> = serde_json::from_str(
            r#"{ "stateMutability": "payable", "type": "fallback" }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_state_mutability_rejected() {
        let result: Result<AbiEntry, _> = serde_json::from_str(
            r#"{ "inputs": [], "name": "f", "outputs": [], "stateMutability": "magic", "type": "function" }"#,
        );
        assert!(result.is_err());
    }
}
