use crate::extract::FieldKind;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Flat user profile handed in by the data-loading layer; opaque key/value
/// data as far as the pipeline is concerned.
pub type Profile = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Default for Confidence {
    fn default() -> Self {
        Confidence::Low
    }
}

impl<'de> Deserialize<'de> for Confidence {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.trim().to_lowercase().as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            _ => Confidence::Low,
        })
    }
}

/// One field-to-value assignment from the model. Every attribute is
/// tolerant of omission - the reply is model output, not trusted input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappedField {
    #[serde(default)]
    pub field_index: Option<usize>,
    #[serde(default)]
    pub field_label: String,
    #[serde(default = "default_kind")]
    pub field_kind: FieldKind,
    #[serde(default)]
    pub selector: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub value: String,
    #[serde(default)]
    pub confidence: Confidence,
    #[serde(default)]
    pub reasoning: String,
}

fn default_kind() -> FieldKind {
    FieldKind::Other
}

/// Models occasionally return booleans or numbers where a string was
/// asked for; coerce scalars instead of rejecting the whole mapping.
fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(b) => b.to_string(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitButton {
    #[serde(default)]
    pub selector: String,
    #[serde(default)]
    pub text: String,
}

impl SubmitButton {
    /// Substituted whenever the model omits or empties the submit locator.
    pub fn generic() -> Self {
        Self {
            selector: "button[type='submit'], input[type='submit']".to_string(),
            text: "Submit".to_string(),
        }
    }
}

/// The AI's field-to-value assignment for one extraction pass. Consumed
/// by the fill dispatcher and retained only until the next pass (the
/// submit selector is needed for the late submit action).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormMapping {
    pub fields: Vec<MappedField>,
    #[serde(default = "SubmitButton::generic")]
    pub submit_button: SubmitButton,
}

impl FormMapping {
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_coerces_bool_number_and_null() {
        let raw = r##"{"fields":[
            {"selector":"#a","value":true},
            {"selector":"#b","value":42},
            {"selector":"#c","value":null},
            {"selector":"#d","value":"plain"}
        ]}"##;
        let mapping: FormMapping = serde_json::from_str(raw).unwrap();
        let values: Vec<&str> = mapping.fields.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["true", "42", "", "plain"]);
    }

    #[test]
    fn unknown_confidence_degrades_to_low() {
        let raw = r##"{"fields":[{"selector":"#a","value":"x","confidence":"certain"}]}"##;
        let mapping: FormMapping = serde_json::from_str(raw).unwrap();
        assert_eq!(mapping.fields[0].confidence, Confidence::Low);
    }

    #[test]
    fn missing_submit_button_gets_the_generic_fallback() {
        let raw = r#"{"fields":[]}"#;
        let mapping: FormMapping = serde_json::from_str(raw).unwrap();
        assert_eq!(
            mapping.submit_button.selector,
            "button[type='submit'], input[type='submit']"
        );
    }

    #[test]
    fn fields_must_be_a_list() {
        let raw = r#"{"fields":"not-a-list"}"#;
        assert!(serde_json::from_str::<FormMapping>(raw).is_err());
    }

    #[test]
    fn unknown_field_kind_degrades_to_other() {
        let raw = r##"{"fields":[{"selector":"#a","value":"x","fieldKind":"slider"}]}"##;
        let mapping: FormMapping = serde_json::from_str(raw).unwrap();
        assert_eq!(mapping.fields[0].field_kind, FieldKind::Other);
    }
}
