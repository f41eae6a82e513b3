//! AXUIElement-backed accessibility provider.

use std::fmt;
use std::ptr;
use std::sync::Arc;

use accessibility_sys::{
    AXError as RawAxError, AXIsProcessTrusted, AXUIElementCopyAttributeValue,
    AXUIElementCopyParameterizedAttributeValue, AXUIElementCreateApplication,
    AXUIElementGetTypeID, AXUIElementPerformAction, AXUIElementRef, kAXErrorAPIDisabled,
    kAXErrorActionUnsupported, kAXErrorAttributeUnsupported, kAXErrorCannotComplete,
    kAXErrorInvalidUIElement, kAXErrorNoValue, kAXErrorSuccess,
};
use cocoa::base::{id, nil};
use core_foundation::array::{CFArray, CFArrayGetTypeID};
use core_foundation::attributed_string::{CFAttributedStringGetString, CFAttributedStringGetTypeID};
use core_foundation::base::{
    CFCopyTypeIDDescription, CFGetTypeID, CFRelease, CFRetain, CFType, CFTypeRef, TCFType,
};
use core_foundation::boolean::{CFBoolean, CFBooleanGetTypeID};
use core_foundation::number::{CFNumber, CFNumberGetTypeID};
use core_foundation::string::{CFString, CFStringGetTypeID, CFStringRef};
use objc::rc::autoreleasepool;
use objc::{class, msg_send, sel, sel_impl};

use super::ns_string;
use crate::resolver::accessibility::{
    AccessibilityProvider, Application, AxElement, AxError, AxValue, ElementRef, MarkerRange,
};

/// Owned `AXUIElementRef`.
pub struct MacElement {
    raw: AXUIElementRef,
}

// AXUIElement calls are thread-safe; the ref itself is an immutable
// CF object.
unsafe impl Send for MacElement {}
unsafe impl Sync for MacElement {}

impl MacElement {
    /// Take ownership of a ref obtained under the create rule.
    unsafe fn from_create(raw: AXUIElementRef) -> Self {
        Self { raw }
    }

    /// Retain a ref obtained under the get rule.
    unsafe fn from_get(raw: AXUIElementRef) -> Self {
        unsafe { CFRetain(raw as CFTypeRef) };
        Self { raw }
    }
}

impl Drop for MacElement {
    fn drop(&mut self) {
        unsafe { CFRelease(self.raw as CFTypeRef) };
    }
}

impl fmt::Debug for MacElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MacElement({:p})", self.raw)
    }
}

impl AxElement for MacElement {
    fn attribute(&self, name: &str) -> Result<AxValue, AxError> {
        let attribute = CFString::new(name);
        let mut value: CFTypeRef = ptr::null();
        let code = unsafe {
            AXUIElementCopyAttributeValue(
                self.raw,
                attribute.as_concrete_TypeRef(),
                &mut value,
            )
        };
        check(code, name)?;
        if value.is_null() {
            return Err(AxError::NoValue(name.to_string()));
        }
        Ok(unsafe { convert_owned(value) })
    }

    fn parameterized_attribute(
        &self,
        name: &str,
        parameter: &AxValue,
    ) -> Result<AxValue, AxError> {
        let attribute = CFString::new(name);
        let string_param;
        let param: CFTypeRef = match parameter {
            AxValue::MarkerRange(range) => match range.downcast_ref::<CfToken>() {
                Some(token) => token.0,
                None => return Err(AxError::AttributeUnsupported(name.to_string())),
            },
            AxValue::String(s) => {
                string_param = CFString::new(s);
                string_param.as_CFTypeRef()
            }
            _ => return Err(AxError::AttributeUnsupported(name.to_string())),
        };
        let mut value: CFTypeRef = ptr::null();
        let code = unsafe {
            AXUIElementCopyParameterizedAttributeValue(
                self.raw,
                attribute.as_concrete_TypeRef(),
                param,
                &mut value,
            )
        };
        check(code, name)?;
        if value.is_null() {
            return Err(AxError::NoValue(name.to_string()));
        }
        Ok(unsafe { convert_owned(value) })
    }

    fn perform_action(&self, action: &str) -> Result<(), AxError> {
        let action_name = CFString::new(action);
        let code = unsafe { AXUIElementPerformAction(self.raw, action_name.as_concrete_TypeRef()) };
        match code {
            kAXErrorAttributeUnsupported | kAXErrorActionUnsupported => {
                Err(AxError::ActionUnsupported(action.to_string()))
            }
            _ => check(code, action),
        }
    }
}

/// Retained CF object of a type the crate does not model, kept so it
/// can be passed back as a query parameter.
struct CfToken(CFTypeRef);

unsafe impl Send for CfToken {}
unsafe impl Sync for CfToken {}

impl Drop for CfToken {
    fn drop(&mut self) {
        unsafe { CFRelease(self.0) };
    }
}

fn check(code: RawAxError, name: &str) -> Result<(), AxError> {
    match code {
        kAXErrorSuccess => Ok(()),
        kAXErrorAttributeUnsupported => Err(AxError::AttributeUnsupported(name.to_string())),
        kAXErrorNoValue => Err(AxError::NoValue(name.to_string())),
        kAXErrorActionUnsupported => Err(AxError::ActionUnsupported(name.to_string())),
        kAXErrorAPIDisabled => Err(AxError::ApiDisabled),
        kAXErrorCannotComplete => Err(AxError::CannotComplete),
        kAXErrorInvalidUIElement => Err(AxError::InvalidElement),
        other => Err(AxError::Other(other)),
    }
}

/// Convert a value obtained under the create rule. Consumes the
/// reference.
unsafe fn convert_owned(value: CFTypeRef) -> AxValue {
    let type_id = unsafe { CFGetTypeID(value) };
    unsafe {
        if type_id == CFStringGetTypeID() {
            AxValue::String(CFString::wrap_under_create_rule(value as CFStringRef).to_string())
        } else if type_id == CFAttributedStringGetTypeID() {
            let plain = CFAttributedStringGetString(value as _);
            let text = CFString::wrap_under_get_rule(plain).to_string();
            CFRelease(value);
            AxValue::AttributedString(text)
        } else if type_id == CFBooleanGetTypeID() {
            AxValue::Bool(CFBoolean::wrap_under_create_rule(value as _).into())
        } else if type_id == CFNumberGetTypeID() {
            let number = CFNumber::wrap_under_create_rule(value as _);
            AxValue::Number(number.to_f64().unwrap_or_default())
        } else if type_id == AXUIElementGetTypeID() {
            AxValue::Element(Arc::new(MacElement::from_create(value as AXUIElementRef)))
        } else if type_id == CFArrayGetTypeID() {
            let array = CFArray::<CFType>::wrap_under_create_rule(value as _);
            let elements = array
                .iter()
                .filter(|item| CFGetTypeID(item.as_CFTypeRef()) == AXUIElementGetTypeID())
                .map(|item| {
                    Arc::new(MacElement::from_get(item.as_CFTypeRef() as AXUIElementRef))
                        as ElementRef
                })
                .collect();
            AxValue::Elements(elements)
        } else {
            let name = CFString::wrap_under_create_rule(CFCopyTypeIDDescription(type_id)).to_string();
            if name.contains("AXTextMarkerRange") {
                AxValue::MarkerRange(MarkerRange::new(CfToken(value)))
            } else {
                CFRelease(value);
                AxValue::Other(name)
            }
        }
    }
}

/// Accessibility provider over the system-wide AX API and
/// `NSWorkspace`.
#[derive(Debug, Default)]
pub struct MacAccessibility;

impl MacAccessibility {
    pub fn new() -> Self {
        Self
    }
}

impl AccessibilityProvider for MacAccessibility {
    fn is_trusted(&self) -> bool {
        unsafe { AXIsProcessTrusted() }
    }

    fn frontmost_application(&self) -> Option<Application> {
        autoreleasepool(|| unsafe {
            let workspace: id = msg_send![class!(NSWorkspace), sharedWorkspace];
            let app: id = msg_send![workspace, frontmostApplication];
            if app == nil {
                return None;
            }
            let pid: i32 = msg_send![app, processIdentifier];
            if pid <= 0 {
                return None;
            }
            let name_ref: id = msg_send![app, localizedName];
            let bundle_ref: id = msg_send![app, bundleIdentifier];
            let element = AXUIElementCreateApplication(pid);
            if element.is_null() {
                return None;
            }
            Some(Application {
                name: ns_string(name_ref).unwrap_or_default(),
                bundle_id: ns_string(bundle_ref),
                pid,
                element: Arc::new(MacElement::from_create(element)),
            })
        })
    }
}
