pub mod browser;
pub mod core;
pub mod errors;
pub mod extract;
pub mod fill;
pub mod gate;
pub mod mapping;
pub mod session;
pub mod testing;

pub use browser::ChromeBrowser;
pub use core::{BrowserDriver, Config};
pub use errors::{AutoFillError, Result};
pub use extract::{extract_fields, ExtractionPass, FieldDescriptor, FieldKind};
pub use fill::{FillDispatcher, FillReport, FillStatus};
pub use gate::{detect_verification, CaptchaKind, VerificationGateResult};
pub use mapping::{CompletionClient, FormMapping, GeminiClient, MappingRequester, Profile};
pub use session::{FormSession, SessionEvent, SessionPhase};
