//! Documentation snapshot of an engine's registries
//!
//! Serializes to:
//!
//! ```json
//! {
//!   "macros": [{"name": "fruit", "type": "string", "param": {"allow": false, "list": null}, "details": ""}],
//!   "modifiers": [{"name": "upper", "in_type": "string|int|float|bool|null", "out_type": "string", "details": ""}]
//! }
//! ```

use crate::macros::Macro;
use crate::modifiers::Modifier;
use serde::{Deserialize, Serialize};

/// Immutable view of every registered macro and modifier, in registration order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Documentation {
    pub macros: Vec<MacroDoc>,
    pub modifiers: Vec<ModifierDoc>,
}

impl Documentation {
    /// Looks up a macro entry by name
    pub fn macro_doc(&self, name: &str) -> Option<&MacroDoc> {
        self.macros.iter().find(|doc| doc.name == name)
    }

    /// Looks up a modifier entry by name
    pub fn modifier_doc(&self, name: &str) -> Option<&ModifierDoc> {
        self.modifiers.iter().find(|doc| doc.name == name)
    }
}

/// Documentation entry of one registered macro
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub output_type: String,
    pub param: MacroParam,
    pub details: String,
}

impl MacroDoc {
    pub(crate) fn describe(name: &str, item: &dyn Macro) -> Self {
        Self {
            name: name.to_string(),
            output_type: item.output_type().to_string(),
            param: MacroParam {
                allow: item.has_parameter(),
                list: item.allowed_parameter_values().map(<[String]>::to_vec),
            },
            details: item.documentation().to_string(),
        }
    }
}

/// Parameter facet of a macro entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroParam {
    /// Whether the macro accepts a parameter
    pub allow: bool,
    /// Permitted values, `None` when unrestricted
    pub list: Option<Vec<String>>,
}

/// Documentation entry of one registered modifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierDoc {
    pub name: String,
    pub in_type: String,
    pub out_type: String,
    pub details: String,
}

impl ModifierDoc {
    pub(crate) fn describe(name: &str, item: &dyn Modifier) -> Self {
        Self {
            name: name.to_string(),
            in_type: item.input_type().to_string(),
            out_type: item.output_type().to_string(),
            details: item.documentation().to_string(),
        }
    }
}
