//! macOS adapters: AXUIElement, NSPasteboard and CGEventTap.

mod accessibility;
mod input;
mod pasteboard;

use std::ffi::CStr;
use std::sync::Arc;

use cocoa::base::{id, nil};
use objc::{msg_send, sel, sel_impl};

use super::{AccessibilityProvider, PlatformSet, ResolverError};

pub use accessibility::MacAccessibility;
pub use input::MacInputSource;
pub use pasteboard::MacPasteboard;

/// Build the macOS platform set.
pub fn connect() -> Result<PlatformSet, ResolverError> {
    let accessibility = MacAccessibility::new();
    if !accessibility.is_trusted() {
        tracing::warn!("process is not trusted for accessibility; acquisition will fail");
    }
    Ok(PlatformSet {
        accessibility: Arc::new(accessibility),
        pasteboard: Arc::new(MacPasteboard::general()?),
        input: Arc::new(MacInputSource),
    })
}

/// Copy an `NSString` into an owned `String`. `nil` reads as `None`.
///
/// # Safety
///
/// `string` must be `nil` or a valid `NSString`.
pub(crate) unsafe fn ns_string(string: id) -> Option<String> {
    if string == nil {
        return None;
    }
    let utf8: *const std::os::raw::c_char = unsafe { msg_send![string, UTF8String] };
    if utf8.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(utf8) }.to_string_lossy().into_owned())
}
