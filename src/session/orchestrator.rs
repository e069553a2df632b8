use crate::core::{BrowserDriver, Config};
use crate::errors::{AutoFillError, Result};
use crate::extract::{snapshot_page, ExtractionPass};
use crate::fill::{FillDispatcher, ProgressFn};
use crate::gate::OtpFieldHint;
use crate::mapping::{CompletionClient, FormMapping, MappingRequester, Profile, SubmitButton};
use crate::session::{HumanGate, SessionEvent, SessionPhase};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

/// Selector chain tried when the gate detector saw an OTP step but could
/// not pin down the input.
const OTP_FALLBACK_SELECTOR: &str =
    "input[autocomplete='one-time-code'], input[name*='otp'], input[id*='otp']";

/// Drives extract -> map -> fill -> gate-check cycles against one page.
///
/// All mutable automation state (page handle, current mapping, current
/// extraction pass) lives on this struct; one instance is one session,
/// and `start` refuses to run before the previous session finished or
/// was stopped.
pub struct FormSession<B: BrowserDriver, C: CompletionClient> {
    browser: B,
    client: C,
    profile: Profile,
    config: Config,
    session_id: String,
    phase: SessionPhase,
    page: Option<B::PageHandle>,
    extraction: Option<ExtractionPass>,
    mapping: Option<FormMapping>,
    otp_hint: Option<OtpFieldHint>,
    custom_instruction: Option<String>,
    events: UnboundedSender<SessionEvent>,
}

impl<B: BrowserDriver, C: CompletionClient> FormSession<B, C> {
    pub fn new(
        browser: B,
        client: C,
        profile: Profile,
        config: Config,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Self {
            browser,
            client,
            profile,
            config,
            session_id: uuid::Uuid::new_v4().to_string(),
            phase: SessionPhase::Idle,
            page: None,
            extraction: None,
            mapping: None,
            otp_hint: None,
            custom_instruction: None,
            events,
        };
        (session, receiver)
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn current_mapping(&self) -> Option<&FormMapping> {
        self.mapping.as_ref()
    }

    /// Open the target page and run the first cycle. Any cycle-level
    /// error is reported as a status event and tears the session down to
    /// idle; a fresh `start` is the only way to retry.
    pub async fn start(&mut self, target_url: &str, custom_instruction: Option<&str>) -> Result<()> {
        if self.phase != SessionPhase::Idle {
            return Err(AutoFillError::InvalidPhase {
                action: "start",
                phase: self.phase.to_string(),
            });
        }
        info!(session = %self.session_id, url = target_url, "starting automation");
        self.phase = SessionPhase::Running;
        self.custom_instruction = custom_instruction.map(str::to_string);

        match self.run_first_cycle(target_url).await {
            Ok(()) => Ok(()),
            Err(error) => {
                self.status(&format!("Error: {}", error), 0, false);
                self.cleanup().await;
                Err(error)
            }
        }
    }

    /// Stop from any phase: release handles, discard the mapping, return
    /// to idle.
    pub async fn stop(&mut self) -> Result<()> {
        info!(session = %self.session_id, "stopping automation");
        self.cleanup().await;
        self.status("Automation stopped", 0, false);
        Ok(())
    }

    /// The human solved the captcha; surface the filled mapping for
    /// review and move to ready-to-submit.
    pub async fn resume_after_human(&mut self) -> Result<()> {
        if self.phase != SessionPhase::AwaitingHuman(HumanGate::Captcha) {
            return Err(AutoFillError::InvalidPhase {
                action: "resume_after_human",
                phase: self.phase.to_string(),
            });
        }
        self.phase = SessionPhase::ReadyToSubmit;
        self.emit_preview();
        self.status("Verification cleared - review and submit", 80, true);
        Ok(())
    }

    /// Inject the externally supplied one-time code into the detected OTP
    /// field. On failure the session stays parked so the caller can retry
    /// with a corrected code.
    pub async fn submit_otp(&mut self, code: &str) -> Result<()> {
        if self.phase != SessionPhase::AwaitingHuman(HumanGate::Otp) {
            return Err(AutoFillError::InvalidPhase {
                action: "submit_otp",
                phase: self.phase.to_string(),
            });
        }
        self.inject_otp(code).await?;
        self.phase = SessionPhase::ReadyToSubmit;
        self.emit_preview();
        self.status("Code entered - review and submit", 80, true);
        Ok(())
    }

    /// Approve the previewed mapping, optionally with user-edited values
    /// that are re-applied to the page first, then submit.
    pub async fn approve_and_submit(&mut self, edited: Option<FormMapping>) -> Result<()> {
        if self.phase != SessionPhase::ReadyToSubmit {
            return Err(AutoFillError::InvalidPhase {
                action: "approve_and_submit",
                phase: self.phase.to_string(),
            });
        }

        if let Some(edited) = edited {
            let descriptors = self
                .extraction
                .as_ref()
                .map(|pass| pass.descriptors.clone())
                .unwrap_or_default();
            {
                let page = self.page.as_ref().ok_or(AutoFillError::NoActivePage)?;
                let dispatcher = FillDispatcher::new(&self.browser, page, &self.config.fill);
                dispatcher.fill(&edited, &descriptors, None).await?;
            }
            self.mapping = Some(edited);
            self.status("Edited values applied", 80, true);
        }

        self.final_submit().await
    }

    /// Click the mapping's submit control (with the generic fallback
    /// chain) and either loop into the next form page or tear down.
    pub async fn final_submit(&mut self) -> Result<()> {
        if self.phase != SessionPhase::ReadyToSubmit {
            return Err(AutoFillError::InvalidPhase {
                action: "final_submit",
                phase: self.phase.to_string(),
            });
        }

        if let Err(error) = self.click_submit().await {
            // stay in ready-to-submit so the caller can retry
            self.status(&format!("Submit error: {}", error), 75, true);
            return Err(error);
        }

        self.phase = SessionPhase::Submitted;
        self.status("Form submitted successfully", 100, false);
        tokio::time::sleep(Duration::from_millis(self.config.session.post_submit_wait_ms)).await;

        if self.detect_next_page().await.unwrap_or(false) {
            info!(session = %self.session_id, "next form page detected, continuing");
            self.mapping = None;
            self.extraction = None;
            self.otp_hint = None;
            self.phase = SessionPhase::Running;
            self.status("Next form page detected - continuing", 15, false);
            if let Err(error) = self.run_cycle().await {
                self.status(&format!("Error: {}", error), 0, false);
                self.cleanup().await;
                return Err(error);
            }
        } else {
            self.cleanup().await;
        }
        Ok(())
    }

    async fn run_first_cycle(&mut self, target_url: &str) -> Result<()> {
        let page = self.open_target(target_url).await?;
        self.page = Some(page);
        self.status("Page loaded", 10, false);
        tokio::time::sleep(Duration::from_millis(self.config.session.page_settle_ms)).await;
        self.status("Connected to form page", 15, false);

        self.scroll_to_form().await?;
        self.status("Scrolled to form", 20, false);

        self.run_cycle().await
    }

    /// One extract -> map -> fill -> gate-check pass over the current page.
    async fn run_cycle(&mut self) -> Result<()> {
        let pass = {
            let page = self.page.as_ref().ok_or(AutoFillError::NoActivePage)?;
            snapshot_page(&self.browser, page).await?
        };
        info!(
            session = %self.session_id,
            fields = pass.field_count(),
            "extraction pass complete"
        );

        self.phase = SessionPhase::AwaitingMapping;
        self.status(
            &format!("Analyzing {} detected fields", pass.field_count()),
            25,
            false,
        );

        let mapping = {
            let requester = MappingRequester::new(&self.client);
            requester
                .request(
                    &pass.descriptors,
                    &self.profile,
                    self.custom_instruction.as_deref(),
                )
                .await?
        };

        self.phase = SessionPhase::Filling;
        let report = {
            let page = self.page.as_ref().ok_or(AutoFillError::NoActivePage)?;
            let dispatcher = FillDispatcher::new(&self.browser, page, &self.config.fill);
            let events = self.events.clone();
            let progress_cb = move |done: usize, total: usize, label: &str| {
                let percent = 20.0 + (done as f64 / total.max(1) as f64) * 50.0;
                let message = if label.is_empty() {
                    format!("Filling field {}/{}", done, total)
                } else {
                    format!("Filling: {}", label)
                };
                let _ = events.send(SessionEvent::StatusUpdate {
                    message,
                    progress_percent: percent.round() as u8,
                    needs_approval: false,
                });
            };
            let progress: &ProgressFn<'_> = &progress_cb;
            dispatcher
                .fill(&mapping, &pass.descriptors, Some(progress))
                .await?
        };
        info!(
            session = %self.session_id,
            filled = report.filled_count(),
            skipped = report.skipped_empty_count(),
            failed = report.skipped_error_count(),
            "fill pass complete"
        );

        self.extraction = Some(pass);
        self.mapping = Some(mapping);

        let gate = report.gate;
        if gate.has_captcha {
            self.phase = SessionPhase::AwaitingHuman(HumanGate::Captcha);
            self.emit(SessionEvent::CaptchaDetected {
                kind: gate.captcha_kind,
                message: gate.message.clone(),
            });
            self.status(&gate.message, 75, true);
        } else if gate.has_otp {
            self.otp_hint = gate.otp_field_hint.clone();
            self.phase = SessionPhase::AwaitingHuman(HumanGate::Otp);
            self.emit(SessionEvent::OtpRequired {
                hint: gate.otp_field_hint,
            });
            self.status(&gate.message, 75, true);
        } else {
            self.phase = SessionPhase::ReadyToSubmit;
            self.emit_preview();
            self.status("Form filled - review and submit", 75, true);
        }
        Ok(())
    }

    async fn open_target(&mut self, url: &str) -> Result<B::PageHandle> {
        if let Some(ws_url) = self.config.browser.attach_ws_url.clone() {
            self.browser.attach(&ws_url).await?;
            let fragment = page_fragment(url);
            self.browser.find_page(&fragment).await
        } else {
            let browser_config = self.config.browser.clone();
            self.browser.launch(&browser_config).await?;
            self.browser.open_page(url).await
        }
    }

    async fn scroll_to_form(&self) -> Result<()> {
        let page = self.page.as_ref().ok_or(AutoFillError::NoActivePage)?;
        let script = r#"
            (function() {
                const form = document.querySelector('form')
                    || document.querySelector('[class*="form"]');
                if (form) {
                    form.scrollIntoView({ behavior: 'smooth', block: 'start' });
                }
                return { ok: true };
            })()
        "#;
        self.browser.execute_script(page, script).await?;
        tokio::time::sleep(Duration::from_millis(
            self.config.session.form_scroll_settle_ms,
        ))
        .await;
        Ok(())
    }

    async fn inject_otp(&self, code: &str) -> Result<()> {
        let page = self.page.as_ref().ok_or(AutoFillError::NoActivePage)?;
        let selector = self
            .otp_hint
            .as_ref()
            .and_then(|hint| hint.selector.clone())
            .unwrap_or_else(|| OTP_FALLBACK_SELECTOR.to_string());

        let script = format!(
            r#"
            (function() {{
                const els = Array.from(document.querySelectorAll({selector}));
                const el = els.find(e => e.offsetParent !== null) || els[0];
                if (!el) return {{ ok: false, error: 'OTP field not found' }};
                el.focus();
                el.value = {code};
                el.dispatchEvent(new Event('input', {{ bubbles: true }}));
                el.dispatchEvent(new Event('change', {{ bubbles: true }}));
                return {{ ok: true }};
            }})()
            "#,
            selector = js_string(&selector),
            code = js_string(code)
        );
        let result = self.browser.execute_script(page, &script).await?;
        if script_ok(&result) {
            Ok(())
        } else {
            Err(AutoFillError::FieldFillFailed(format!(
                "OTP injection failed for {}",
                selector
            )))
        }
    }

    async fn click_submit(&self) -> Result<()> {
        let page = self.page.as_ref().ok_or(AutoFillError::NoActivePage)?;
        let selector = self
            .mapping
            .as_ref()
            .map(|m| m.submit_button.selector.clone())
            .unwrap_or_else(|| SubmitButton::generic().selector);

        let script = format!(
            r#"
            (function() {{
                const tryClick = (el) => {{
                    if (!el) return false;
                    el.scrollIntoView({{ block: 'center' }});
                    el.click();
                    return true;
                }};
                if (tryClick(document.querySelector({selector}))) {{
                    return {{ ok: true, used: 'mapping' }};
                }}
                if (tryClick(document.querySelector(
                    'button[type="submit"], input[type="submit"]'
                ))) {{
                    return {{ ok: true, used: 'type' }};
                }}
                const byText = Array.from(
                    document.querySelectorAll('button, input[type="button"]')
                ).find(b => {{
                    const t = (b.textContent || b.value || '').trim().toLowerCase();
                    return t.includes('submit') || t.includes('continue');
                }});
                if (tryClick(byText)) return {{ ok: true, used: 'text' }};
                return {{ ok: false, error: 'no submit control found' }};
            }})()
            "#,
            selector = js_string(&selector)
        );
        let result = self.browser.execute_script(page, &script).await?;
        if script_ok(&result) {
            Ok(())
        } else {
            Err(AutoFillError::SubmitFailed(script_error(&result)))
        }
    }

    /// Heuristic check for a paginated flow: a Next/Continue control or a
    /// pagination class hook present after submission.
    async fn detect_next_page(&self) -> Result<bool> {
        let page = self.page.as_ref().ok_or(AutoFillError::NoActivePage)?;
        let script = r#"
            (function() {
                const byText = Array.from(
                    document.querySelectorAll('button, a, input[type="button"], input[type="submit"]')
                ).some(el => {
                    const t = (el.textContent || el.value || '').trim().toLowerCase();
                    return t === 'next' || t === 'continue' || t.startsWith('next ');
                });
                const byClass = document.querySelector(
                    '.next-step, .btn-next, [class*="next-page"]'
                ) !== null;
                return { ok: true, next: byText || byClass };
            })()
        "#;
        let result = self.browser.execute_script(page, script).await?;
        Ok(result.get("next").and_then(|v| v.as_bool()).unwrap_or(false))
    }

    /// Release page/browser handles and discard per-cycle state. Teardown
    /// failures are logged, never propagated.
    async fn cleanup(&mut self) {
        if let Err(error) = self.browser.close().await {
            warn!(session = %self.session_id, %error, "browser close failed during cleanup");
        }
        self.page = None;
        self.extraction = None;
        self.mapping = None;
        self.otp_hint = None;
        self.custom_instruction = None;
        self.phase = SessionPhase::Idle;
    }

    fn emit_preview(&self) {
        if let Some(mapping) = self.mapping.clone() {
            self.emit(SessionEvent::FormPreview { mapping });
        }
    }

    fn status(&self, message: &str, progress_percent: u8, needs_approval: bool) {
        info!(
            session = %self.session_id,
            progress = progress_percent,
            "{}",
            message
        );
        self.emit(SessionEvent::StatusUpdate {
            message: message.to_string(),
            progress_percent,
            needs_approval,
        });
    }

    fn emit(&self, event: SessionEvent) {
        // a detached UI is not an error; events simply go unobserved
        let _ = self.events.send(event);
    }
}

/// Host + path fragment used to recognize the target page among the
/// pages already open in an attached browser.
fn page_fragment(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(parsed) => format!(
            "{}{}",
            parsed.host_str().unwrap_or(""),
            parsed.path().trim_end_matches('/')
        ),
        Err(_) => url.to_string(),
    }
}

fn script_ok(value: &serde_json::Value) -> bool {
    value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false)
}

fn script_error(value: &serde_json::Value) -> String {
    value
        .get("error")
        .and_then(|v| v.as_str())
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
