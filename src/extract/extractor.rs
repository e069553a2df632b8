use crate::extract::{FieldDescriptor, FieldKind, RadioOption, SelectOption};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;

/// Derive the ordered candidate-field list from a captured HTML snapshot.
///
/// This is a pure read over the snapshot: a malformed page degrades to
/// empty strings and lists, never to an error.
pub fn extract_fields(html: &str) -> Vec<FieldDescriptor> {
    let document = Html::parse_document(html);
    let container = find_form_container(&document);

    let mut descriptors = Vec::new();
    let mut seen_keys: HashSet<String> = HashSet::new();

    let candidate_sel = match Selector::parse(
        "input, textarea, select, [role='radio'], [role='checkbox']",
    ) {
        Ok(sel) => sel,
        Err(_) => return descriptors,
    };

    for element in container.select(&candidate_sel) {
        let tag = element.value().name().to_lowercase();
        let raw_type = raw_type_of(&element, &tag);

        // Non-fillable input machinery is not a candidate field.
        if tag == "input"
            && matches!(
                raw_type.as_str(),
                "hidden" | "submit" | "button" | "reset" | "image"
            )
        {
            continue;
        }

        let kind = classify(&element, &tag, &raw_type);
        let mut descriptor = FieldDescriptor::new(descriptors.len(), kind, raw_type.clone());

        descriptor.name = attr_string(&element, "name");
        descriptor.dom_id = attr_string(&element, "id");
        descriptor.placeholder = attr_string(&element, "placeholder");
        descriptor.current_value = attr_string(&element, "value");
        descriptor.required = element.value().attr("required").is_some();
        descriptor.min = element.value().attr("min").map(str::to_string);
        descriptor.max = element.value().attr("max").map(str::to_string);
        descriptor.pattern = element.value().attr("pattern").map(str::to_string);
        descriptor.label_text = infer_label(&document, element);
        descriptor.selector = build_selector(&element, &tag, &raw_type);

        let class_signature = class_signature(&element, &tag);
        let key = descriptor.dedup_key(&class_signature);
        if !seen_keys.insert(key) {
            continue;
        }

        if kind == FieldKind::Select {
            descriptor.options = collect_options(element);
        }

        if kind == FieldKind::Radio {
            descriptor.radio_group_key = descriptor.name.clone();
            descriptor.radio_group_options = collect_radio_group(&document, container, &descriptor);
        }

        descriptors.push(descriptor);
    }

    descriptors
}

/// First `<form>`, else the first element whose class hints at a form,
/// else the document body, else the document root.
fn find_form_container(document: &Html) -> ElementRef<'_> {
    if let Ok(sel) = Selector::parse("form") {
        if let Some(form) = document.select(&sel).next() {
            return form;
        }
    }

    if let Ok(sel) = Selector::parse("[class]") {
        for element in document.select(&sel) {
            // a control with a "form-control"-style class is not a container
            if matches!(element.value().name(), "input" | "textarea" | "select") {
                continue;
            }
            let hints_form = element
                .value()
                .attr("class")
                .map(|c| c.to_lowercase().contains("form"))
                .unwrap_or(false);
            if hints_form {
                return element;
            }
        }
    }

    if let Ok(sel) = Selector::parse("body") {
        if let Some(body) = document.select(&sel).next() {
            return body;
        }
    }

    document.root_element()
}

fn raw_type_of(element: &ElementRef, tag: &str) -> String {
    if tag == "input" {
        let ty = element
            .value()
            .attr("type")
            .map(|t| t.trim().to_lowercase())
            .unwrap_or_default();
        if ty.is_empty() {
            "text".to_string()
        } else {
            ty
        }
    } else if let Some(role) = element.value().attr("role") {
        role.to_lowercase()
    } else {
        tag.to_string()
    }
}

fn classify(element: &ElementRef, tag: &str, raw_type: &str) -> FieldKind {
    match tag {
        "textarea" => FieldKind::Textarea,
        "select" => FieldKind::Select,
        "input" => match raw_type {
            "radio" => FieldKind::Radio,
            "checkbox" => FieldKind::Checkbox,
            "date" => FieldKind::Date,
            "" | "text" | "email" | "tel" | "url" | "password" | "search" | "number" => {
                FieldKind::Text
            }
            _ => FieldKind::Other,
        },
        _ => match element.value().attr("role") {
            Some("radio") => FieldKind::Radio,
            Some("checkbox") => FieldKind::Checkbox,
            _ => FieldKind::Other,
        },
    }
}

fn attr_string(element: &ElementRef, name: &str) -> String {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .unwrap_or("")
        .to_string()
}

fn class_signature(element: &ElementRef, tag: &str) -> String {
    let classes: Vec<&str> = element.value().classes().collect();
    if classes.is_empty() {
        tag.to_string()
    } else {
        format!("{}.{}", tag, classes.join("."))
    }
}

/// Label inference, most explicit source first. Returns an empty string
/// when nothing matches; extraction never fails over a missing label.
fn infer_label(document: &Html, element: ElementRef) -> String {
    // label[for=id]
    let dom_id = element.value().attr("id").unwrap_or("");
    if !dom_id.is_empty() {
        if let Ok(sel) = Selector::parse("label[for]") {
            for label in document.select(&sel) {
                if label.value().attr("for") == Some(dom_id) {
                    let text = clean_text(label);
                    if !text.is_empty() {
                        return text;
                    }
                }
            }
        }
    }

    // ancestor <label>
    for ancestor in element.ancestors() {
        if let Some(el) = ElementRef::wrap(ancestor) {
            if el.value().name() == "label" {
                let text = clean_text(el);
                if !text.is_empty() {
                    return text;
                }
            }
        }
    }

    // immediately preceding sibling <label>
    if let Some(prev) = element.prev_siblings().find_map(ElementRef::wrap) {
        if prev.value().name() == "label" {
            let text = clean_text(prev);
            if !text.is_empty() {
                return text;
            }
        }
    }

    // following sibling with short text
    if let Some(next) = element.next_siblings().find_map(ElementRef::wrap) {
        let text = clean_text(next);
        if !text.is_empty() && text.len() < 50 {
            return text;
        }
    }

    // ancestor whose class mentions "label"
    for ancestor in element.ancestors() {
        if let Some(el) = ElementRef::wrap(ancestor) {
            let class_hints_label = el
                .value()
                .attr("class")
                .map(|c| c.to_lowercase().contains("label"))
                .unwrap_or(false);
            if class_hints_label {
                let text = clean_text(el);
                if !text.is_empty() && text.len() < 100 {
                    return text;
                }
            }
        }
    }

    // aria-labelledby target
    if let Some(ids) = element.value().attr("aria-labelledby") {
        if let Some(first_id) = ids.split_whitespace().next() {
            if let Ok(sel) = Selector::parse("[id]") {
                for candidate in document.select(&sel) {
                    if candidate.value().attr("id") == Some(first_id) {
                        let text = clean_text(candidate);
                        if !text.is_empty() {
                            return text;
                        }
                    }
                }
            }
        }
    }

    String::new()
}

/// Selector preference: `#id`, then `[name=]`, then `[placeholder=]`,
/// then class+type composite, then bare tag+type.
fn build_selector(element: &ElementRef, tag: &str, raw_type: &str) -> String {
    let id = element.value().attr("id").unwrap_or("");
    if !id.is_empty() {
        return format!("#{}", css_escape(id));
    }

    let name = element.value().attr("name").unwrap_or("");
    if !name.is_empty() {
        return format!("{}[name=\"{}\"]", tag, attr_escape(name));
    }

    let placeholder = element.value().attr("placeholder").unwrap_or("");
    if !placeholder.is_empty() {
        return format!("{}[placeholder=\"{}\"]", tag, attr_escape(placeholder));
    }

    let classes: Vec<String> = element.value().classes().map(css_escape).collect();
    if !classes.is_empty() {
        if tag == "input" {
            return format!("{}.{}[type=\"{}\"]", tag, classes.join("."), raw_type);
        }
        return format!("{}.{}", tag, classes.join("."));
    }

    if tag == "input" {
        format!("{}[type=\"{}\"]", tag, raw_type)
    } else {
        tag.to_string()
    }
}

fn collect_options(element: ElementRef) -> Vec<SelectOption> {
    let mut options = Vec::new();
    if let Ok(sel) = Selector::parse("option") {
        for option in element.select(&sel) {
            let text = clean_text(option);
            let value = option
                .value()
                .attr("value")
                .map(str::to_string)
                .unwrap_or_else(|| text.clone());
            options.push(SelectOption { value, text });
        }
    }
    options
}

/// Resolve the full sibling group for a radio control. A shared `name`
/// collects every same-named radio in the container; a nameless radio is
/// its own one-member group identified by label.
fn collect_radio_group(
    document: &Html,
    container: ElementRef,
    descriptor: &FieldDescriptor,
) -> Vec<RadioOption> {
    if descriptor.radio_group_key.is_empty() {
        return vec![RadioOption {
            value: descriptor.current_value.clone(),
            label: descriptor.label_text.clone(),
        }];
    }

    let mut group = Vec::new();
    if let Ok(sel) = Selector::parse("input[type='radio']") {
        for radio in container.select(&sel) {
            if radio.value().attr("name") == Some(descriptor.radio_group_key.as_str()) {
                group.push(RadioOption {
                    value: attr_string(&radio, "value"),
                    label: infer_label(document, radio),
                });
            }
        }
    }
    if group.is_empty() {
        group.push(RadioOption {
            value: descriptor.current_value.clone(),
            label: descriptor.label_text.clone(),
        });
    }
    group
}

fn clean_text(element: ElementRef) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

// Helper to escape CSS identifiers
fn css_escape(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' => "\\ ".to_string(),
            '.' => "\\.".to_string(),
            '#' => "\\#".to_string(),
            ':' => "\\:".to_string(),
            '[' => "\\[".to_string(),
            ']' => "\\]".to_string(),
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\'' => "\\'".to_string(),
            '"' => "\\\"".to_string(),
            _ => c.to_string(),
        })
        .collect()
}

fn attr_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_keeps_first_occurrence_in_document_order() {
        let html = r#"
            <form>
                <input type="text" name="email" placeholder="first">
                <input type="email" name="email" placeholder="second">
            </form>
        "#;
        let fields = extract_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].placeholder, "first");
    }

    #[test]
    fn explicit_label_for_wins_over_sibling_and_ancestor_sources() {
        let html = r#"
            <form>
                <label for="fname">Explicit First Name</label>
                <label>Ancestor <input type="text" id="fname" name="fname"> <span>Sibling text</span></label>
            </form>
        "#;
        let fields = extract_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].label_text, "Explicit First Name");
    }

    #[test]
    fn ancestor_label_used_when_no_explicit_for() {
        let html = r#"
            <form>
                <label>Phone number <input type="tel" name="phone"></label>
            </form>
        "#;
        let fields = extract_fields(html);
        assert_eq!(fields[0].label_text, "Phone number");
    }

    #[test]
    fn label_defaults_to_empty_never_fails() {
        let html = r#"<form><input type="text" name="mystery"></form>"#;
        let fields = extract_fields(html);
        assert_eq!(fields[0].label_text, "");
    }

    #[test]
    fn selector_prefers_id_then_name_then_placeholder() {
        let html = r#"
            <form>
                <input type="text" id="a" name="one">
                <input type="text" name="two">
                <input type="text" placeholder="three">
                <input type="text" class="fancy wide">
                <input type="text">
            </form>
        "#;
        let fields = extract_fields(html);
        let selectors: Vec<&str> = fields.iter().map(|f| f.selector.as_str()).collect();
        assert_eq!(selectors[0], "#a");
        assert_eq!(selectors[1], "input[name=\"two\"]");
        assert_eq!(selectors[2], "input[placeholder=\"three\"]");
        assert_eq!(selectors[3], "input.fancy.wide[type=\"text\"]");
        assert_eq!(selectors[4], "input[type=\"text\"]");
    }

    #[test]
    fn radio_group_collapses_to_one_descriptor_with_options() {
        let html = r#"
            <form>
                <label for="r1">1 Year</label><input type="radio" id="r1" name="plan" value="1y">
                <label for="r2">2 Years</label><input type="radio" id="r2" name="plan" value="2y">
            </form>
        "#;
        let fields = extract_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].kind, FieldKind::Radio);
        assert_eq!(fields[0].radio_group_key, "plan");
        assert_eq!(fields[0].radio_group_options.len(), 2);
        assert_eq!(fields[0].radio_group_options[0].label, "1 Year");
        assert_eq!(fields[0].radio_group_options[1].value, "2y");
    }

    #[test]
    fn nameless_radio_is_a_one_member_group_keyed_by_label() {
        let html = r#"
            <form>
                <label>Accept terms <input type="radio" value="yes"></label>
            </form>
        "#;
        let fields = extract_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].radio_group_key, "");
        assert_eq!(fields[0].radio_group_options.len(), 1);
        assert_eq!(fields[0].radio_group_options[0].label, "Accept terms");
    }

    #[test]
    fn fields_outside_the_form_container_are_ignored() {
        let html = r#"
            <body>
                <input type="text" name="outside">
                <form><input type="text" name="inside"></form>
            </body>
        "#;
        let fields = extract_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "inside");
    }

    #[test]
    fn class_hinted_container_used_when_no_form_element() {
        let html = r#"
            <body>
                <input type="text" name="stray">
                <div class="contact-form">
                    <input type="text" name="inner">
                </div>
            </body>
        "#;
        let fields = extract_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "inner");
    }

    #[test]
    fn select_options_carry_value_and_text() {
        let html = r#"
            <form>
                <select name="plan">
                    <option value="basic">Basic cover</option>
                    <option value="full">Full cover</option>
                </select>
            </form>
        "#;
        let fields = extract_fields(html);
        assert_eq!(fields[0].kind, FieldKind::Select);
        assert_eq!(fields[0].options.len(), 2);
        assert_eq!(fields[0].options[1].value, "full");
        assert_eq!(fields[0].options[1].text, "Full cover");
    }

    #[test]
    fn hidden_and_submit_inputs_are_skipped() {
        let html = r#"
            <form>
                <input type="hidden" name="csrf" value="tok">
                <input type="submit" value="Send">
                <input type="text" name="kept">
            </form>
        "#;
        let fields = extract_fields(html);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "kept");
    }

    #[test]
    fn constraints_and_required_are_captured() {
        let html = r#"
            <form>
                <input type="number" name="age" min="18" max="99" required>
                <input type="text" name="code" pattern="[A-Z]{3}">
            </form>
        "#;
        let fields = extract_fields(html);
        assert!(fields[0].required);
        assert_eq!(fields[0].min.as_deref(), Some("18"));
        assert_eq!(fields[0].max.as_deref(), Some("99"));
        assert_eq!(fields[1].pattern.as_deref(), Some("[A-Z]{3}"));
    }

    #[test]
    fn malformed_markup_degrades_instead_of_failing() {
        let fields = extract_fields("<form><input name=broken <<< <div>");
        // whatever survives parsing is fine; the call itself must not panic
        assert!(fields.len() <= 1);
    }

    #[test]
    fn indexes_are_stable_and_ordered() {
        let html = r#"
            <form>
                <input type="text" name="a">
                <input type="text" name="b">
                <textarea name="c"></textarea>
            </form>
        "#;
        let fields = extract_fields(html);
        let indexes: Vec<usize> = fields.iter().map(|f| f.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(fields[2].kind, FieldKind::Textarea);
    }
}
