use crate::errors::{AutoFillError, Result};
use crate::extract::FieldDescriptor;
use crate::mapping::{CompletionClient, FormMapping, Profile, SubmitButton};
use tracing::{debug, warn};

/// Turns descriptors + profile into one model request and defensively
/// parses the reply. The reply is never trusted to be well-formed: models
/// wrap output in fences, prepend commentary, and truncate long JSON.
pub struct MappingRequester<'a, C: CompletionClient> {
    client: &'a C,
}

impl<'a, C: CompletionClient> MappingRequester<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    pub async fn request(
        &self,
        descriptors: &[FieldDescriptor],
        profile: &Profile,
        custom_instruction: Option<&str>,
    ) -> Result<FormMapping> {
        let prompt = build_prompt(descriptors, profile, custom_instruction)?;
        debug!(fields = descriptors.len(), "requesting field mapping");
        let reply = self.client.complete(&prompt).await?;
        parse_reply(&reply, descriptors)
    }
}

pub fn build_prompt(
    descriptors: &[FieldDescriptor],
    profile: &Profile,
    custom_instruction: Option<&str>,
) -> Result<String> {
    let profile_json = serde_json::to_string_pretty(profile)?;
    let fields_json = serde_json::to_string_pretty(descriptors)?;

    let mut prompt = format!(
        "You are filling a web form on behalf of a user.\n\n\
         USER PROFILE:\n{}\n\n\
         DETECTED FORM FIELDS:\n{}\n",
        profile_json, fields_json
    );

    if let Some(instruction) = custom_instruction {
        if !instruction.trim().is_empty() {
            prompt.push_str(&format!("\nCUSTOM INSTRUCTION:\n{}\n", instruction.trim()));
        }
    }

    prompt.push_str(
        "\nMap the profile onto the fields and reply with exactly one JSON object of this shape:\n\
         {\"fields\":[{\"fieldIndex\":0,\"fieldLabel\":\"...\",\"fieldKind\":\"text\",\
         \"selector\":\"...\",\"value\":\"...\",\"confidence\":\"high\",\"reasoning\":\"...\"}],\
         \"submitButton\":{\"selector\":\"...\",\"text\":\"...\"}}\n\n\
         Rules:\n\
         1. Use each field's own \"selector\" value exactly as provided.\n\
         2. For select fields return the exact option \"value\" attribute, not its display text.\n\
         3. For radio fields prefer matching by the option's label text.\n\
         4. For checkbox fields return the string \"true\" or \"false\".\n\
         5. For date fields return ISO format YYYY-MM-DD.\n\
         6. If no profile data matches a field, return an empty string value - do not omit the field.\n\
         7. Always include the \"submitButton\" object.\n\
         8. Return one JSON object only - no markdown, no commentary.\n",
    );

    Ok(prompt)
}

/// Three-stage defensive parse: strip fences, slice the outermost object,
/// strict parse; then a bracket-balancing repair pass before giving up.
pub fn parse_reply(raw: &str, descriptors: &[FieldDescriptor]) -> Result<FormMapping> {
    let cleaned = strip_code_fences(raw);
    let sliced = slice_json_object(cleaned).ok_or_else(|| {
        AutoFillError::MappingUnavailable("no JSON object in model reply".to_string())
    })?;

    let mapping = match serde_json::from_str::<FormMapping>(sliced) {
        Ok(mapping) => mapping,
        Err(strict_err) => {
            let repaired = balance_brackets(sliced);
            warn!(error = %strict_err, "strict mapping parse failed, attempting repair");
            serde_json::from_str::<FormMapping>(&repaired).map_err(|_| {
                AutoFillError::MappingUnavailable(format!(
                    "model reply unparsable even after repair: {}",
                    strict_err
                ))
            })?
        }
    };

    Ok(validate(mapping, descriptors))
}

/// Backfill empty selectors from the descriptor the entry points at, drop
/// entries that still have none, and guarantee a usable submit locator.
fn validate(mut mapping: FormMapping, descriptors: &[FieldDescriptor]) -> FormMapping {
    for field in &mut mapping.fields {
        if field.selector.trim().is_empty() {
            if let Some(index) = field.field_index {
                if let Some(descriptor) = descriptors.iter().find(|d| d.index == index) {
                    field.selector = descriptor.selector.clone();
                }
            }
        }
    }
    let before = mapping.fields.len();
    mapping.fields.retain(|f| !f.selector.trim().is_empty());
    if mapping.fields.len() < before {
        warn!(
            dropped = before - mapping.fields.len(),
            "dropped mapping entries without a usable selector"
        );
    }

    if mapping.submit_button.selector.trim().is_empty() {
        mapping.submit_button = SubmitButton::generic();
    }
    mapping
}

pub fn strip_code_fences(s: &str) -> &str {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix("```json") {
        if let Some(end) = rest.strip_suffix("```") {
            return end.trim();
        }
    }
    if let Some(rest) = s.strip_prefix("```") {
        if let Some(end) = rest.strip_suffix("```") {
            return end.trim();
        }
    }
    s
}

/// Slice from the first `{` to the last `}`, discarding any prose the
/// model wrapped around the object. Without a closing brace the tail from
/// the first `{` is returned so the repair pass can complete it.
pub fn slice_json_object(s: &str) -> Option<&str> {
    let start = s.find('{')?;
    match s.rfind('}') {
        Some(end) if end >= start => Some(&s[start..=end]),
        _ => Some(&s[start..]),
    }
}

/// Close whatever `[`/`{` the model left open, in opening order. A no-op
/// on balanced input. String contents are honored so braces inside values
/// do not confuse the scan.
pub fn balance_brackets(s: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in s.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                if stack.last() == Some(&c) {
                    stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut repaired = s.to_string();
    // an unterminated string must be closed before any brackets
    if in_string {
        repaired.push('"');
    }
    while let Some(closer) = stack.pop() {
        repaired.push(closer);
    }
    repaired
}
