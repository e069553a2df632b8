use crate::core::{BrowserDriver, FillConfig};
use crate::errors::{AutoFillError, Result};
use crate::extract::{FieldDescriptor, FieldKind};
use crate::fill::{FieldOutcome, FillReport, FillStatus};
use crate::gate::detect_verification;
use crate::mapping::{FormMapping, MappedField};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

/// Per-field progress callback: (fields attempted, total, field label).
pub type ProgressFn<'a> = dyn Fn(usize, usize, &str) + Send + Sync + 'a;

/// Applies a mapping to the live page, one field at a time, with a
/// type-specific strategy per field kind. A single field's failure is
/// recorded and never aborts the remaining fields. Once every field has
/// been attempted the page is inspected for a verification gate - filling
/// is never cut short by detection.
pub struct FillDispatcher<'a, B: BrowserDriver> {
    browser: &'a B,
    page: &'a B::PageHandle,
    config: &'a FillConfig,
}

impl<'a, B: BrowserDriver> FillDispatcher<'a, B> {
    pub fn new(browser: &'a B, page: &'a B::PageHandle, config: &'a FillConfig) -> Self {
        Self {
            browser,
            page,
            config,
        }
    }

    pub async fn fill(
        &self,
        mapping: &FormMapping,
        descriptors: &[FieldDescriptor],
        progress: Option<&ProgressFn<'_>>,
    ) -> Result<FillReport> {
        let total = mapping.fields.len();
        let mut outcomes = Vec::with_capacity(total);

        for (position, field) in mapping.fields.iter().enumerate() {
            if let Some(callback) = progress {
                callback(position + 1, total, &field.field_label);
            }

            // empty is a valid "no opinion" signal from the mapper
            if field.value.is_empty() {
                debug!(label = %field.field_label, "skipping field with empty value");
                outcomes.push(FieldOutcome {
                    field_label: field.field_label.clone(),
                    selector: field.selector.clone(),
                    status: FillStatus::SkippedEmpty,
                    detail: None,
                });
                continue;
            }

            let outcome = match self.fill_one(field, descriptors).await {
                Ok(()) => FieldOutcome {
                    field_label: field.field_label.clone(),
                    selector: field.selector.clone(),
                    status: FillStatus::Filled,
                    detail: None,
                },
                Err(error) => {
                    warn!(label = %field.field_label, %error, "field fill failed, continuing");
                    FieldOutcome {
                        field_label: field.field_label.clone(),
                        selector: field.selector.clone(),
                        status: FillStatus::SkippedError,
                        detail: Some(error.to_string()),
                    }
                }
            };
            outcomes.push(outcome);

            tokio::time::sleep(Duration::from_millis(self.config.field_pause_ms)).await;
        }

        let html = self.browser.page_html(self.page).await?;
        let gate = detect_verification(&html);

        Ok(FillReport { outcomes, gate })
    }

    async fn fill_one(&self, field: &MappedField, descriptors: &[FieldDescriptor]) -> Result<()> {
        let descriptor = field
            .field_index
            .and_then(|index| descriptors.iter().find(|d| d.index == index));
        let kind = effective_kind(field, descriptor);

        match kind {
            FieldKind::Radio => self.fill_radio(field, descriptor).await,
            FieldKind::Select => {
                self.await_visible(&field.selector).await?;
                self.scroll_into_view(&field.selector).await?;
                self.fill_select(field).await
            }
            FieldKind::Checkbox => {
                self.await_visible(&field.selector).await?;
                self.scroll_into_view(&field.selector).await?;
                self.set_checkbox(field).await
            }
            // text-like, textarea, date, and anything unclassified all take
            // the clear-then-set path
            _ => {
                self.await_visible(&field.selector).await?;
                self.scroll_into_view(&field.selector).await?;
                self.fill_text(field).await
            }
        }
    }

    /// Bounded poll for a visible match; a selector that never resolves
    /// surfaces as this field's own failure, not a global timeout.
    async fn await_visible(&self, selector: &str) -> Result<()> {
        let script = format!(
            r#"
            (function() {{
                const els = document.querySelectorAll({selector});
                for (const el of els) {{
                    if (el.offsetParent !== null || el.getClientRects().length > 0) {{
                        return {{ ok: true }};
                    }}
                }}
                return {{ ok: false, found: els.length > 0 }};
            }})()
            "#,
            selector = js_string(selector)
        );

        let mut waited = 0u64;
        loop {
            let result = self.browser.execute_script(self.page, &script).await?;
            if script_ok(&result) {
                return Ok(());
            }
            if waited >= self.config.field_timeout_ms {
                return Err(AutoFillError::FieldFillFailed(format!(
                    "timed out waiting for visible element: {}",
                    selector
                )));
            }
            tokio::time::sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
            waited += self.config.poll_interval_ms;
        }
    }

    /// Scroll the first match into view and let layout settle. Target
    /// pages animate on scroll; writing before the settle pause loses
    /// keystrokes to re-renders.
    async fn scroll_into_view(&self, selector: &str) -> Result<()> {
        let script = format!(
            r#"
            (function() {{
                const el = document.querySelector({selector});
                if (el) {{
                    el.scrollIntoView({{ behavior: 'smooth', block: 'center' }});
                }}
                return {{ ok: true }};
            }})()
            "#,
            selector = js_string(selector)
        );
        self.browser.execute_script(self.page, &script).await?;
        tokio::time::sleep(Duration::from_millis(self.config.scroll_settle_ms)).await;
        Ok(())
    }

    /// Clear, pause, then set - two round trips on purpose: pages with
    /// input masks need to observe the cleared state first. Operates on
    /// the first visible match so heuristic selectors that resolve to
    /// several elements still work.
    async fn fill_text(&self, field: &MappedField) -> Result<()> {
        let clear_script = format!(
            r#"
            (function() {{
                const els = Array.from(document.querySelectorAll({selector}));
                const el = els.find(e => e.offsetParent !== null) || els[0];
                if (!el) return {{ ok: false, error: 'element not found' }};
                el.focus();
                el.value = '';
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return {{ ok: true }};
            }})()
            "#,
            selector = js_string(&field.selector)
        );
        self.exec_expect_ok(&clear_script, &field.selector).await?;

        tokio::time::sleep(Duration::from_millis(self.config.clear_settle_ms)).await;

        let set_script = format!(
            r#"
            (function() {{
                const els = Array.from(document.querySelectorAll({selector}));
                const el = els.find(e => e.offsetParent !== null) || els[0];
                if (!el) return {{ ok: false, error: 'element not found' }};
                el.value = {value};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                el.blur();
                return {{ ok: true, finalValue: el.value }};
            }})()
            "#,
            selector = js_string(&field.selector),
            value = js_string(&field.value)
        );
        self.exec_expect_ok(&set_script, &field.selector).await
    }

    /// Native option-by-value selection first; when no option carries the
    /// requested value, fall back to assigning the control directly and
    /// synthesizing the change notification.
    async fn fill_select(&self, field: &MappedField) -> Result<()> {
        let native_script = format!(
            r#"
            (function() {{
                const els = Array.from(document.querySelectorAll({selector}));
                const el = els.find(e => e.offsetParent !== null) || els[0];
                if (!el) return {{ ok: false, error: 'element not found' }};
                const option = Array.from(el.options || []).find(o => o.value === {value});
                if (!option) return {{ ok: false, error: 'no option with that value' }};
                el.value = option.value;
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ ok: true }};
            }})()
            "#,
            selector = js_string(&field.selector),
            value = js_string(&field.value)
        );
        let result = self.browser.execute_script(self.page, &native_script).await?;
        if script_ok(&result) {
            return Ok(());
        }
        debug!(selector = %field.selector, "native select failed, assigning value directly");

        let fallback_script = format!(
            r#"
            (function() {{
                const el = document.querySelector({selector});
                if (!el) return {{ ok: false, error: 'element not found' }};
                el.value = {value};
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return {{ ok: true }};
            }})()
            "#,
            selector = js_string(&field.selector),
            value = js_string(&field.value)
        );
        self.exec_expect_ok(&fallback_script, &field.selector).await
    }

    async fn set_checkbox(&self, field: &MappedField) -> Result<()> {
        let desired = is_truthy_checkbox_value(&field.value);
        let script = format!(
            r#"
            (function() {{
                const els = Array.from(document.querySelectorAll({selector}));
                const el = els.find(e => e.offsetParent !== null) || els[0];
                if (!el) return {{ ok: false, error: 'element not found' }};
                el.checked = {desired};
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return {{ ok: true }};
            }})()
            "#,
            selector = js_string(&field.selector),
            desired = desired
        );
        self.exec_expect_ok(&script, &field.selector).await
    }

    /// Three-tier radio resolution, first success wins:
    /// label-text match, then same-named group value match, then the raw
    /// selector (retried without `:nth-of-type` indexing).
    async fn fill_radio(
        &self,
        field: &MappedField,
        descriptor: Option<&FieldDescriptor>,
    ) -> Result<()> {
        // best effort: the selector may be unreliable, tiers do the real work
        let _ = self.scroll_into_view(&field.selector).await;

        if self.radio_by_label(&field.value).await? {
            return Ok(());
        }
        if !field.field_label.is_empty() && field.field_label != field.value {
            if self.radio_by_label(&field.field_label).await? {
                return Ok(());
            }
        }

        if let Some(group_key) = descriptor
            .map(|d| d.radio_group_key.as_str())
            .filter(|key| !key.is_empty())
        {
            let group_script = format!(
                r#"
                (function() {{
                    const radios = Array.from(
                        document.querySelectorAll('input[type="radio"]')
                    ).filter(r => r.name === {group});
                    const target = radios.find(r => r.value === {value});
                    if (!target) return {{ ok: false, error: 'no value match in group' }};
                    target.checked = true;
                    target.dispatchEvent(new Event('change', {{ bubbles: true }}));
                    target.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    return {{ ok: true, tier: 'group' }};
                }})()
                "#,
                group = js_string(group_key),
                value = js_string(&field.value)
            );
            let result = self.browser.execute_script(self.page, &group_script).await?;
            if script_ok(&result) {
                return Ok(());
            }
        }

        let selector_script = format!(
            r#"
            (function() {{
                let el = document.querySelector({selector});
                if (!el) {{
                    const base = {selector}.replace(/:nth-of-type\(\d+\)/g, '');
                    el = document.querySelector(base);
                }}
                if (!el) return {{ ok: false, error: 'selector did not resolve' }};
                el.checked = true;
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return {{ ok: true, tier: 'selector' }};
            }})()
            "#,
            selector = js_string(&field.selector)
        );
        let result = self
            .browser
            .execute_script(self.page, &selector_script)
            .await?;
        if script_ok(&result) {
            return Ok(());
        }

        Err(AutoFillError::FieldFillFailed(format!(
            "no radio resolution tier matched for '{}'",
            field.field_label
        )))
    }

    /// Tier one: exact or substring match against every label on the
    /// page, control located through `for` or nesting.
    async fn radio_by_label(&self, wanted: &str) -> Result<bool> {
        if wanted.trim().is_empty() {
            return Ok(false);
        }
        let script = format!(
            r#"
            (function() {{
                const wanted = {wanted}.trim().toLowerCase();
                const labels = Array.from(document.querySelectorAll('label'));
                const label = labels.find(l => {{
                    const text = (l.textContent || '').trim().toLowerCase();
                    return text.length > 0 && (text === wanted || text.includes(wanted));
                }});
                if (!label) return {{ ok: false, error: 'no label match' }};
                let input = null;
                const forId = label.getAttribute('for');
                if (forId) input = document.getElementById(forId);
                if (!input) input = label.querySelector('input[type="radio"]');
                if (!input) return {{ ok: false, error: 'label has no radio control' }};
                input.checked = true;
                input.dispatchEvent(new Event('change', {{ bubbles: true }}));
                input.dispatchEvent(new Event('input', {{ bubbles: true }}));
                return {{ ok: true, tier: 'label' }};
            }})()
            "#,
            wanted = js_string(wanted)
        );
        let result = self.browser.execute_script(self.page, &script).await?;
        Ok(script_ok(&result))
    }

    async fn exec_expect_ok(&self, script: &str, selector: &str) -> Result<()> {
        let result = self.browser.execute_script(self.page, script).await?;
        if script_ok(&result) {
            Ok(())
        } else {
            Err(AutoFillError::FieldFillFailed(format!(
                "{}: {}",
                selector,
                script_error(&result)
            )))
        }
    }
}

fn effective_kind(field: &MappedField, descriptor: Option<&FieldDescriptor>) -> FieldKind {
    // the descriptor saw the real DOM; trust it over the model's echo
    descriptor.map(|d| d.kind).unwrap_or(field.field_kind)
}

/// Checkbox truthiness contract: `"true"`, boolean true (already coerced
/// to `"true"`), and `"1"` check the box; every other string unchecks.
pub fn is_truthy_checkbox_value(value: &str) -> bool {
    value == "true" || value == "1"
}

fn script_ok(value: &Value) -> bool {
    value.get("ok").and_then(Value::as_bool).unwrap_or(false)
}

fn script_error(value: &Value) -> String {
    value
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or("script reported failure")
        .to_string()
}

fn js_string(s: &str) -> String {
    format!(
        "'{}'",
        s.replace('\\', "\\\\")
            .replace('\'', "\\'")
            .replace('\n', "\\n")
            .replace('\r', "\\r")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_fields;
    use crate::mapping::{Confidence, FormMapping, SubmitButton};
    use crate::testing::{fast_config, MockBrowser};

    const FORM_HTML: &str = r#"
        <form>
            <input type="text" id="first" name="your-first-name">
            <input type="text" id="last" name="your-last-name">
            <input type="email" id="email" name="your-email">
            <input type="tel" id="phone" name="your-phone">
            <textarea id="msg" name="your-message"></textarea>
        </form>
    "#;

    const RADIO_HTML: &str = r#"
        <form>
            <label for="r1">1 Year</label>
            <input type="radio" id="r1" name="plan" value="1y">
            <label for="r2">2 Years</label>
            <input type="radio" id="r2" name="plan" value="2y">
        </form>
    "#;

    fn mapped(
        index: Option<usize>,
        label: &str,
        kind: FieldKind,
        selector: &str,
        value: &str,
    ) -> MappedField {
        MappedField {
            field_index: index,
            field_label: label.to_string(),
            field_kind: kind,
            selector: selector.to_string(),
            value: value.to_string(),
            confidence: Confidence::High,
            reasoning: String::new(),
        }
    }

    fn mapping_of(fields: Vec<MappedField>) -> FormMapping {
        FormMapping {
            fields,
            submit_button: SubmitButton::generic(),
        }
    }

    #[tokio::test]
    async fn five_text_fields_report_filled_and_a_negative_gate() {
        let mock = MockBrowser::new(FORM_HTML);
        let config = fast_config();
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let descriptors = extract_fields(FORM_HTML);

        let mapping = mapping_of(vec![
            mapped(Some(0), "First Name", FieldKind::Text, "#first", "John"),
            mapped(Some(1), "Last Name", FieldKind::Text, "#last", "Doe"),
            mapped(Some(2), "Email", FieldKind::Text, "#email", "john.doe@example.com"),
            mapped(Some(3), "Phone", FieldKind::Text, "#phone", "+919810375969"),
            mapped(Some(4), "Message", FieldKind::Textarea, "#msg", "Hello there"),
        ]);

        let report = dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(report.filled_count(), 5);
        assert_eq!(report.skipped_error_count(), 0);
        assert!(!report.gate.is_blocking());
    }

    #[tokio::test]
    async fn empty_value_is_skipped_without_any_page_mutation() {
        let mock = MockBrowser::new(FORM_HTML);
        let config = fast_config();
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let descriptors = extract_fields(FORM_HTML);

        let mapping = mapping_of(vec![
            mapped(Some(2), "Email", FieldKind::Text, "#email", ""),
            mapped(Some(0), "First Name", FieldKind::Text, "#first", "John"),
        ]);

        let report = dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(report.outcomes[0].status, FillStatus::SkippedEmpty);
        assert_eq!(report.outcomes[1].status, FillStatus::Filled);
        // no script ever touched the skipped field
        assert_eq!(mock.scripts_containing("#email"), 0);
        assert!(mock.scripts_containing("#first") > 0);
    }

    #[tokio::test]
    async fn one_failing_field_does_not_abort_the_rest() {
        let mock = MockBrowser::with_fail_selectors(FORM_HTML, &["#phone"]);
        let config = fast_config();
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let descriptors = extract_fields(FORM_HTML);

        let mapping = mapping_of(vec![
            mapped(Some(0), "First Name", FieldKind::Text, "#first", "John"),
            mapped(Some(3), "Phone", FieldKind::Text, "#phone", "12345"),
            mapped(Some(2), "Email", FieldKind::Text, "#email", "a@b.c"),
        ]);

        let report = dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(report.outcomes[0].status, FillStatus::Filled);
        assert_eq!(report.outcomes[1].status, FillStatus::SkippedError);
        assert!(report.outcomes[1].detail.is_some());
        assert_eq!(report.outcomes[2].status, FillStatus::Filled);
    }

    #[tokio::test]
    async fn radio_resolves_through_the_label_tier_first() {
        let mock = MockBrowser::new(RADIO_HTML);
        let config = fast_config();
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let descriptors = extract_fields(RADIO_HTML);

        let mapping = mapping_of(vec![mapped(
            Some(0),
            "1 Year",
            FieldKind::Radio,
            "input[name=\"plan\"]",
            "1 Year",
        )]);

        let report = dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(report.filled_count(), 1);
        assert_eq!(mock.scripts_containing("tier: 'label'"), 1);
        assert_eq!(mock.scripts_containing("tier: 'group'"), 0);
        assert_eq!(mock.scripts_containing("tier: 'selector'"), 0);
    }

    #[tokio::test]
    async fn radio_falls_back_to_the_group_value_tier() {
        let mock = MockBrowser::with_radio_tiers(RADIO_HTML, false, true, true);
        let config = fast_config();
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let descriptors = extract_fields(RADIO_HTML);

        let mapping = mapping_of(vec![mapped(
            Some(0),
            "Plan",
            FieldKind::Radio,
            "input[name=\"plan\"]",
            "2y",
        )]);

        let report = dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(report.filled_count(), 1);
        assert!(mock.scripts_containing("tier: 'label'") >= 1);
        assert_eq!(mock.scripts_containing("tier: 'group'"), 1);
        assert_eq!(mock.scripts_containing("tier: 'selector'"), 0);
    }

    #[tokio::test]
    async fn radio_with_no_matching_tier_is_a_field_level_failure() {
        let mock = MockBrowser::with_radio_tiers(RADIO_HTML, false, false, false);
        let config = fast_config();
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let descriptors = extract_fields(RADIO_HTML);

        let mapping = mapping_of(vec![mapped(
            Some(0),
            "Plan",
            FieldKind::Radio,
            "input[name=\"plan\"]",
            "5y",
        )]);

        let report = dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(report.outcomes[0].status, FillStatus::SkippedError);
        // every tier was tried in order
        assert!(mock.scripts_containing("tier: 'label'") >= 1);
        assert_eq!(mock.scripts_containing("tier: 'group'"), 1);
        assert_eq!(mock.scripts_containing("tier: 'selector'"), 1);
    }

    #[tokio::test]
    async fn select_falls_back_to_direct_assignment() {
        let html = r#"
            <form>
                <select id="plan" name="plan">
                    <option value="basic">Basic</option>
                    <option value="full">Full</option>
                </select>
            </form>
        "#;
        let mock = MockBrowser::with_select_fallback(html);
        let config = fast_config();
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let descriptors = extract_fields(html);

        let mapping = mapping_of(vec![mapped(
            Some(0),
            "Plan",
            FieldKind::Select,
            "#plan",
            "full",
        )]);

        let report = dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(report.filled_count(), 1);
        assert_eq!(mock.scripts_containing("el.options"), 1);
    }

    #[tokio::test]
    async fn checkbox_values_drive_the_checked_state() {
        let html = r#"<form><input type="checkbox" id="terms" name="terms"></form>"#;
        let descriptors = extract_fields(html);
        let config = fast_config();

        let mock = MockBrowser::new(html);
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let mapping = mapping_of(vec![mapped(
            Some(0),
            "Terms",
            FieldKind::Checkbox,
            "#terms",
            "1",
        )]);
        dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(mock.scripts_containing("el.checked = true"), 1);

        let mock = MockBrowser::new(html);
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let mapping = mapping_of(vec![mapped(
            Some(0),
            "Terms",
            FieldKind::Checkbox,
            "#terms",
            "false",
        )]);
        dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(mock.scripts_containing("el.checked = false"), 1);
    }

    #[tokio::test]
    async fn descriptor_kind_overrides_the_model_echo() {
        // the model mislabels a checkbox as text; the descriptor wins
        let html = r#"<form><input type="checkbox" id="news" name="news"></form>"#;
        let mock = MockBrowser::new(html);
        let config = fast_config();
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let descriptors = extract_fields(html);

        let mapping = mapping_of(vec![mapped(
            Some(0),
            "Newsletter",
            FieldKind::Text,
            "#news",
            "true",
        )]);
        dispatcher.fill(&mapping, &descriptors, None).await.unwrap();
        assert_eq!(mock.scripts_containing("el.checked = true"), 1);
    }

    #[tokio::test]
    async fn progress_callback_sees_every_field_in_order() {
        let mock = MockBrowser::new(FORM_HTML);
        let config = fast_config();
        let dispatcher = FillDispatcher::new(&mock, &(), &config.fill);
        let descriptors = extract_fields(FORM_HTML);

        let mapping = mapping_of(vec![
            mapped(Some(0), "First Name", FieldKind::Text, "#first", "John"),
            mapped(Some(2), "Email", FieldKind::Text, "#email", ""),
        ]);

        let seen = std::sync::Mutex::new(Vec::new());
        let progress = |done: usize, total: usize, label: &str| {
            seen.lock().unwrap().push((done, total, label.to_string()));
        };
        let progress: &ProgressFn<'_> = &progress;
        dispatcher
            .fill(&mapping, &descriptors, Some(progress))
            .await
            .unwrap();

        let seen = seen.into_inner().unwrap();
        assert_eq!(
            seen,
            vec![
                (1, 2, "First Name".to_string()),
                (2, 2, "Email".to_string())
            ]
        );
    }

    #[test]
    fn checkbox_truthiness_contract() {
        assert!(is_truthy_checkbox_value("true"));
        assert!(is_truthy_checkbox_value("1"));
        for falsy in ["false", "0", "", "yes", "TRUE ", "checked"] {
            assert!(!is_truthy_checkbox_value(falsy), "{:?} must uncheck", falsy);
        }
    }

    #[test]
    fn js_string_escapes_quotes_and_backslashes() {
        assert_eq!(js_string("it's"), r"'it\'s'");
        assert_eq!(js_string(r"a\b"), r"'a\\b'");
        assert_eq!(js_string("line\nbreak"), r"'line\nbreak'");
    }

    #[test]
    fn script_ok_requires_an_explicit_true() {
        assert!(script_ok(&serde_json::json!({"ok": true})));
        assert!(!script_ok(&serde_json::json!({"ok": false})));
        assert!(!script_ok(&serde_json::json!({})));
        assert!(!script_ok(&serde_json::Value::Null));
    }
}
