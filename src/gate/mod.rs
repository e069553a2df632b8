pub mod detector;

pub use detector::{detect_verification, CaptchaKind, OtpFieldHint, VerificationGateResult};
