use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CaptchaKind {
    #[serde(rename = "reCAPTCHA")]
    ReCaptcha,
    #[serde(rename = "hCaptcha")]
    HCaptcha,
    #[serde(rename = "Turnstile")]
    Turnstile,
    #[serde(rename = "genericImage")]
    GenericImage,
    #[serde(rename = "none")]
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpFieldHint {
    pub selector: Option<String>,
    pub placeholder: Option<String>,
    pub max_length: Option<u32>,
}

/// Outcome of one post-fill page inspection. Detection short-circuits on
/// the first matched category, so a page with both an hCaptcha widget and
/// an OTP input reports only the captcha.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationGateResult {
    pub has_captcha: bool,
    pub captcha_kind: CaptchaKind,
    pub has_otp: bool,
    pub otp_field_hint: Option<OtpFieldHint>,
    pub message: String,
}

impl VerificationGateResult {
    fn captcha(kind: CaptchaKind, message: &str) -> Self {
        Self {
            has_captcha: true,
            captcha_kind: kind,
            has_otp: false,
            otp_field_hint: None,
            message: message.to_string(),
        }
    }

    fn otp(hint: Option<OtpFieldHint>, message: &str) -> Self {
        Self {
            has_captcha: false,
            captcha_kind: CaptchaKind::None,
            has_otp: true,
            otp_field_hint: hint,
            message: message.to_string(),
        }
    }

    fn clear() -> Self {
        Self {
            has_captcha: false,
            captcha_kind: CaptchaKind::None,
            has_otp: false,
            otp_field_hint: None,
            message: "No blocking verification detected".to_string(),
        }
    }

    pub fn is_blocking(&self) -> bool {
        self.has_captcha || self.has_otp
    }
}

const RECAPTCHA_SIGNATURES: &[&str] = &[
    "iframe[src*=\"recaptcha\"]",
    "div.g-recaptcha",
    ".grecaptcha-badge",
    "textarea[name=\"g-recaptcha-response\"]",
];

const HCAPTCHA_SIGNATURES: &[&str] = &["iframe[src*=\"hcaptcha.com\"]", "div.h-captcha"];

const TURNSTILE_SIGNATURES: &[&str] = &[
    "iframe[src*=\"turnstile\"]",
    ".cf-turnstile",
    "input[name=\"cf-turnstile-response\"]",
];

const OTP_PHRASES: &[&str] = &[
    "enter otp",
    "verification code",
    "enter the code",
    "verify your",
];

/// Fixed, ordered battery of structural checks over a page snapshot.
/// Returns at the first positive match; this is a one-shot read invoked
/// only after filling has completed.
pub fn detect_verification(html: &str) -> VerificationGateResult {
    let document = Html::parse_document(html);

    if matches_any(&document, RECAPTCHA_SIGNATURES) {
        return VerificationGateResult::captcha(
            CaptchaKind::ReCaptcha,
            "reCAPTCHA detected - please solve it to continue",
        );
    }

    if matches_any(&document, HCAPTCHA_SIGNATURES) {
        return VerificationGateResult::captcha(
            CaptchaKind::HCaptcha,
            "hCaptcha detected - please solve it to continue",
        );
    }

    if matches_any(&document, TURNSTILE_SIGNATURES) {
        return VerificationGateResult::captcha(
            CaptchaKind::Turnstile,
            "Cloudflare Turnstile detected - please solve it to continue",
        );
    }

    if has_captcha_image(&document) {
        return VerificationGateResult::captcha(
            CaptchaKind::GenericImage,
            "Image captcha detected - please solve it to continue",
        );
    }

    if let Some(hint) = find_otp_input(&document) {
        return VerificationGateResult::otp(
            Some(hint),
            "One-time code required - enter the code you received",
        );
    }

    if page_text_mentions_otp(&document) {
        return VerificationGateResult::otp(
            None,
            "Page asks for a verification code - enter the code you received",
        );
    }

    VerificationGateResult::clear()
}

fn matches_any(document: &Html, signatures: &[&str]) -> bool {
    signatures.iter().any(|signature| {
        Selector::parse(signature)
            .map(|sel| document.select(&sel).next().is_some())
            .unwrap_or(false)
    })
}

fn has_captcha_image(document: &Html) -> bool {
    let sel = match Selector::parse("img") {
        Ok(sel) => sel,
        Err(_) => return false,
    };
    document.select(&sel).any(|img| {
        let alt = img.value().attr("alt").unwrap_or("").to_lowercase();
        let src = img.value().attr("src").unwrap_or("").to_lowercase();
        alt.contains("captcha") || src.contains("captcha")
    })
}

/// OTP-named input heuristic. Postal/zip/pin-named fields look similar
/// ("pincode" is an address field in several locales) and are excluded
/// before the positive match runs.
fn find_otp_input(document: &Html) -> Option<OtpFieldHint> {
    let include = regex::Regex::new(
        r"(?i)(otp|one[\s_-]?time|verif|auth[\s_-]?code|security[\s_-]?code|sms[\s_-]?code|2fa)",
    )
    .ok()?;
    let exclude = regex::Regex::new(r"(?i)(postal|zip|pin)").ok()?;

    let sel = Selector::parse("input").ok()?;
    for input in document.select(&sel) {
        let ty = input.value().attr("type").unwrap_or("text").to_lowercase();
        if !matches!(ty.as_str(), "text" | "number" | "tel" | "password") {
            continue;
        }

        let identity = [
            input.value().attr("name").unwrap_or(""),
            input.value().attr("id").unwrap_or(""),
            input.value().attr("placeholder").unwrap_or(""),
            input.value().attr("aria-label").unwrap_or(""),
            input.value().attr("autocomplete").unwrap_or(""),
        ]
        .join(" ");

        if exclude.is_match(&identity) {
            continue;
        }
        if !include.is_match(&identity) {
            continue;
        }

        let selector = {
            let id = input.value().attr("id").unwrap_or("");
            let name = input.value().attr("name").unwrap_or("");
            if !id.is_empty() {
                Some(format!("#{}", id))
            } else if !name.is_empty() {
                Some(format!("input[name=\"{}\"]", name))
            } else {
                input
                    .value()
                    .attr("placeholder")
                    .map(|p| format!("input[placeholder=\"{}\"]", p))
            }
        };

        return Some(OtpFieldHint {
            selector,
            placeholder: input.value().attr("placeholder").map(str::to_string),
            max_length: input
                .value()
                .attr("maxlength")
                .and_then(|m| m.parse().ok()),
        });
    }
    None
}

fn page_text_mentions_otp(document: &Html) -> bool {
    let sel = match Selector::parse("body") {
        Ok(sel) => sel,
        Err(_) => return false,
    };
    let Some(body) = document.select(&sel).next() else {
        return false;
    };
    let text = body.text().collect::<Vec<_>>().join(" ").to_lowercase();
    OTP_PHRASES.iter().any(|phrase| text.contains(phrase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recaptcha_iframe_is_detected_first() {
        let html = r#"<body><iframe src="https://www.google.com/recaptcha/api2/anchor"></iframe></body>"#;
        let result = detect_verification(html);
        assert!(result.has_captcha);
        assert_eq!(result.captcha_kind, CaptchaKind::ReCaptcha);
        assert!(!result.has_otp);
    }

    #[test]
    fn hcaptcha_div_is_detected() {
        let html = r#"<body><div class="h-captcha" data-sitekey="x"></div></body>"#;
        let result = detect_verification(html);
        assert_eq!(result.captcha_kind, CaptchaKind::HCaptcha);
    }

    #[test]
    fn turnstile_widget_is_detected() {
        let html = r#"<body><div class="cf-turnstile"></div></body>"#;
        let result = detect_verification(html);
        assert_eq!(result.captcha_kind, CaptchaKind::Turnstile);
    }

    #[test]
    fn captcha_image_alt_heuristic() {
        let html = r#"<body><img alt="Captcha challenge" src="/challenge.png"></body>"#;
        let result = detect_verification(html);
        assert_eq!(result.captcha_kind, CaptchaKind::GenericImage);
    }

    #[test]
    fn otp_named_input_yields_hint() {
        let html = r#"<body><input type="text" name="otp_code" id="otp" placeholder="6-digit code" maxlength="6"></body>"#;
        let result = detect_verification(html);
        assert!(result.has_otp);
        assert!(!result.has_captcha);
        let hint = result.otp_field_hint.unwrap();
        assert_eq!(hint.selector.as_deref(), Some("#otp"));
        assert_eq!(hint.max_length, Some(6));
    }

    #[test]
    fn autocomplete_one_time_code_is_an_otp_signal() {
        let html = r#"<body><input type="text" name="code_entry" autocomplete="one-time-code"></body>"#;
        let result = detect_verification(html);
        assert!(result.has_otp);
    }

    #[test]
    fn postal_zip_and_pin_fields_are_not_otp() {
        for name in ["postal_code", "zip_verification", "pincode"] {
            let html =
                format!(r#"<body><input type="text" name="{}" placeholder="code"></body>"#, name);
            let result = detect_verification(&html);
            assert!(!result.has_otp, "{} misdetected as OTP", name);
        }
    }

    #[test]
    fn phrase_scan_catches_text_only_otp_pages() {
        let html = r#"<body><p>Please enter the code we sent to your phone.</p></body>"#;
        let result = detect_verification(html);
        assert!(result.has_otp);
        assert!(result.otp_field_hint.is_none());
    }

    #[test]
    fn captcha_wins_over_otp_by_priority() {
        let html = r#"
            <body>
                <iframe src="https://hcaptcha.com/challenge"></iframe>
                <input type="text" name="otp" placeholder="Enter OTP">
            </body>
        "#;
        let result = detect_verification(html);
        assert!(result.has_captcha);
        assert_eq!(result.captcha_kind, CaptchaKind::HCaptcha);
        assert!(!result.has_otp);
        assert!(result.otp_field_hint.is_none());
    }

    #[test]
    fn clean_page_reports_all_negative() {
        let html = r#"<body><form><input type="text" name="email"></form></body>"#;
        let result = detect_verification(html);
        assert!(!result.has_captcha);
        assert_eq!(result.captcha_kind, CaptchaKind::None);
        assert!(!result.has_otp);
        assert!(!result.is_blocking());
    }

    #[test]
    fn captcha_kind_serializes_with_provider_names() {
        let result = detect_verification(
            r#"<body><iframe src="https://hcaptcha.com/x"></iframe></body>"#,
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["captchaKind"], "hCaptcha");
        assert_eq!(json["hasCaptcha"], true);
    }
}
