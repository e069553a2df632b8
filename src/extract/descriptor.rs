use serde::{Deserialize, Deserializer, Serialize};

/// Broad control category the fill dispatcher switches on. The original
/// `type` attribute is kept in `raw_type`; every text-entry input kind
/// (text, email, tel, url, password, search, number) collapses to `Text`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
    Date,
    Other,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Textarea => "textarea",
            FieldKind::Select => "select",
            FieldKind::Radio => "radio",
            FieldKind::Checkbox => "checkbox",
            FieldKind::Date => "date",
            FieldKind::Other => "other",
        }
    }

    /// Model replies echo the kind back as free text; anything
    /// unrecognized degrades to `Other` instead of failing the parse.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "text" | "email" | "tel" | "url" | "password" | "search" | "number" => FieldKind::Text,
            "textarea" => FieldKind::Textarea,
            "select" => FieldKind::Select,
            "radio" => FieldKind::Radio,
            "checkbox" => FieldKind::Checkbox,
            "date" => FieldKind::Date,
            _ => FieldKind::Other,
        }
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(FieldKind::parse_lenient(&raw))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RadioOption {
    pub value: String,
    pub label: String,
}

/// One DOM-derived candidate form control, created fresh on every
/// extraction pass and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub index: usize,
    pub kind: FieldKind,
    pub raw_type: String,
    pub name: String,
    pub dom_id: String,
    pub placeholder: String,
    pub current_value: String,
    pub required: bool,
    /// Best-effort inferred label; empty when no inference source matched.
    pub label_text: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub options: Vec<SelectOption>,
    /// Shared radio `name`; empty string means "ungrouped, identify by label".
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub radio_group_key: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub radio_group_options: Vec<RadioOption>,
    /// Selector sufficient to re-locate the element at fill time.
    pub selector: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub pattern: Option<String>,
}

impl FieldDescriptor {
    pub fn new(index: usize, kind: FieldKind, raw_type: String) -> Self {
        Self {
            index,
            kind,
            raw_type,
            name: String::new(),
            dom_id: String::new(),
            placeholder: String::new(),
            current_value: String::new(),
            required: false,
            label_text: String::new(),
            options: Vec::new(),
            radio_group_key: String::new(),
            radio_group_options: Vec::new(),
            selector: String::new(),
            min: None,
            max: None,
            pattern: None,
        }
    }

    /// Key used to drop duplicate controls within one pass: first
    /// non-empty of name, id, placeholder, then the class signature.
    pub fn dedup_key(&self, class_signature: &str) -> String {
        if !self.name.is_empty() {
            format!("name:{}", self.name)
        } else if !self.dom_id.is_empty() {
            format!("id:{}", self.dom_id)
        } else if !self.placeholder.is_empty() {
            format!("placeholder:{}", self.placeholder)
        } else {
            format!("class:{}", class_signature)
        }
    }
}
