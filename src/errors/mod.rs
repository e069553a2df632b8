pub mod types;

pub use types::{AutoFillError, Result};
