pub mod descriptor;
pub mod extractor;
pub mod state;

pub use descriptor::{FieldDescriptor, FieldKind, RadioOption, SelectOption};
pub use extractor::extract_fields;
pub use state::{snapshot_page, ExtractionPass};
