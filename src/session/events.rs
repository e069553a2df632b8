use crate::gate::{CaptchaKind, OtpFieldHint};
use crate::mapping::FormMapping;
use serde::{Deserialize, Serialize};

/// Which human step the session is parked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HumanGate {
    Captcha,
    Otp,
}

/// Session lifecycle. Owned exclusively by the orchestrator; every
/// transition happens inside one of its control methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    AwaitingMapping,
    Filling,
    AwaitingHuman(HumanGate),
    ReadyToSubmit,
    Submitted,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionPhase::Idle => "idle",
            SessionPhase::Running => "running",
            SessionPhase::AwaitingMapping => "awaiting-mapping",
            SessionPhase::Filling => "filling",
            SessionPhase::AwaitingHuman(HumanGate::Captcha) => "awaiting-human(captcha)",
            SessionPhase::AwaitingHuman(HumanGate::Otp) => "awaiting-human(otp)",
            SessionPhase::ReadyToSubmit => "ready-to-submit",
            SessionPhase::Submitted => "submitted",
        };
        f.write_str(name)
    }
}

/// Asynchronous status surface consumed by the shell/UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SessionEvent {
    StatusUpdate {
        message: String,
        progress_percent: u8,
        needs_approval: bool,
    },
    FormPreview {
        mapping: FormMapping,
    },
    CaptchaDetected {
        kind: CaptchaKind,
        message: String,
    },
    OtpRequired {
        hint: Option<OtpFieldHint>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_camel_case_tags() {
        let event = SessionEvent::StatusUpdate {
            message: "Page loaded".to_string(),
            progress_percent: 10,
            needs_approval: false,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "statusUpdate");
        assert_eq!(json["progressPercent"], 10);
        assert_eq!(json["needsApproval"], false);
    }

    #[test]
    fn captcha_event_carries_the_provider_kind() {
        let event = SessionEvent::CaptchaDetected {
            kind: CaptchaKind::HCaptcha,
            message: "solve it".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "captchaDetected");
        assert_eq!(json["kind"], "hCaptcha");
    }

    #[test]
    fn phase_display_matches_lifecycle_names() {
        assert_eq!(SessionPhase::ReadyToSubmit.to_string(), "ready-to-submit");
        assert_eq!(
            SessionPhase::AwaitingHuman(HumanGate::Otp).to_string(),
            "awaiting-human(otp)"
        );
    }
}
