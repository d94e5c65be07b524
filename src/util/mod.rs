//! Utility functions for common operations.
//!
//! This module provides reusable helpers for:
//!
//! - **Formatting**: relative timestamps and compact URL display for story rows
//! - **Link safety**: scheme validation before handing a URL to the system browser
//!
//! # Examples
//!
//! ```
//! use sift::util::host_for_display;
//!
//! assert_eq!(host_for_display("https://www.rust-lang.org/tools"), "rust-lang.org");
//! ```

mod format;
mod links;

pub use format::{host_for_display, relative_time};
pub use links::{browser_url, LinkError};
