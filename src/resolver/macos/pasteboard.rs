//! NSPasteboard-backed pasteboard provider.

use cocoa::base::{BOOL, NO, id, nil};
use cocoa::foundation::{NSString, NSUInteger};
use objc::rc::autoreleasepool;
use objc::{class, msg_send, sel, sel_impl};

use super::ns_string;
use crate::resolver::ResolverError;
use crate::resolver::pasteboard::{PLAIN_TEXT, PasteboardItem, PasteboardProvider, Representation};

/// The general pasteboard.
#[derive(Debug)]
pub struct MacPasteboard {
    _private: (),
}

impl MacPasteboard {
    pub fn general() -> Result<Self, ResolverError> {
        let reachable = autoreleasepool(|| unsafe {
            let pasteboard: id = msg_send![class!(NSPasteboard), generalPasteboard];
            pasteboard != nil
        });
        if !reachable {
            return Err(ResolverError::Pasteboard(
                "general pasteboard unavailable".into(),
            ));
        }
        Ok(Self { _private: () })
    }
}

/// Fetch the general pasteboard. Must be called inside an autorelease
/// pool.
unsafe fn general_pasteboard() -> Result<id, ResolverError> {
    let pasteboard: id = unsafe { msg_send![class!(NSPasteboard), generalPasteboard] };
    if pasteboard == nil {
        return Err(ResolverError::Pasteboard(
            "general pasteboard unavailable".into(),
        ));
    }
    Ok(pasteboard)
}

unsafe fn ns_str(s: &str) -> id {
    unsafe {
        let string = NSString::alloc(nil).init_str(s);
        msg_send![string, autorelease]
    }
}

unsafe fn data_bytes(data: id) -> Vec<u8> {
    unsafe {
        let length: NSUInteger = msg_send![data, length];
        if length == 0 {
            return Vec::new();
        }
        let bytes: *const u8 = msg_send![data, bytes];
        std::slice::from_raw_parts(bytes, length as usize).to_vec()
    }
}

impl PasteboardProvider for MacPasteboard {
    fn change_count(&self) -> Result<i64, ResolverError> {
        autoreleasepool(|| unsafe {
            let pasteboard = general_pasteboard()?;
            let count: i64 = msg_send![pasteboard, changeCount];
            Ok(count)
        })
    }

    fn read_items(&self) -> Result<Vec<PasteboardItem>, ResolverError> {
        autoreleasepool(|| unsafe {
            let pasteboard = general_pasteboard()?;
            let items: id = msg_send![pasteboard, pasteboardItems];
            if items == nil {
                return Ok(Vec::new());
            }
            let count: NSUInteger = msg_send![items, count];
            let mut out = Vec::with_capacity(count as usize);
            for i in 0..count {
                let item: id = msg_send![items, objectAtIndex: i];
                let types: id = msg_send![item, types];
                let type_count: NSUInteger = if types == nil {
                    0
                } else {
                    msg_send![types, count]
                };
                let mut representations = Vec::with_capacity(type_count as usize);
                for j in 0..type_count {
                    let kind_ref: id = msg_send![types, objectAtIndex: j];
                    let kind = ns_string(kind_ref).unwrap_or_default();
                    let data: id = msg_send![item, dataForType: kind_ref];
                    if data == nil {
                        return Err(ResolverError::Pasteboard(format!(
                            "item {i} has no data for {kind}"
                        )));
                    }
                    representations.push(Representation {
                        kind,
                        data: data_bytes(data),
                    });
                }
                out.push(PasteboardItem { representations });
            }
            Ok(out)
        })
    }

    fn replace_items(&self, items: &[PasteboardItem]) -> Result<(), ResolverError> {
        autoreleasepool(|| unsafe {
            let pasteboard = general_pasteboard()?;
            let _: i64 = msg_send![pasteboard, clearContents];
            if items.is_empty() {
                return Ok(());
            }
            let objects: id = msg_send![class!(NSMutableArray), arrayWithCapacity: items.len()];
            for item in items {
                let ns_item: id = msg_send![class!(NSPasteboardItem), new];
                let ns_item: id = msg_send![ns_item, autorelease];
                for rep in &item.representations {
                    let data: id = msg_send![
                        class!(NSData),
                        dataWithBytes: rep.data.as_ptr()
                        length: rep.data.len()
                    ];
                    let ok: BOOL = msg_send![ns_item, setData: data forType: ns_str(&rep.kind)];
                    if ok == NO {
                        return Err(ResolverError::Pasteboard(format!(
                            "rejected representation {}",
                            rep.kind
                        )));
                    }
                }
                let _: () = msg_send![objects, addObject: ns_item];
            }
            let ok: BOOL = msg_send![pasteboard, writeObjects: objects];
            if ok == NO {
                return Err(ResolverError::Pasteboard("write rejected".into()));
            }
            Ok(())
        })
    }

    fn read_string(&self) -> Result<Option<String>, ResolverError> {
        autoreleasepool(|| unsafe {
            let pasteboard = general_pasteboard()?;
            let string: id = msg_send![pasteboard, stringForType: ns_str(PLAIN_TEXT)];
            Ok(ns_string(string))
        })
    }
}
