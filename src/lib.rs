// Export modules for use in tests
pub mod highlight;
pub mod panic_handler;
pub mod pdf;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use highlight::{HighlightClickPayload, ReaderAction};
pub use pdf::{Link, ReaderMount, mount_with};
