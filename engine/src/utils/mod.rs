pub mod error;

pub use error::{FormatError, FormatResult};
