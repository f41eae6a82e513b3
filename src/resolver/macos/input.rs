//! CGEventTap-backed input source.
//!
//! Each global tap lives on its own thread running a CFRunLoop. The
//! returned handle stops that run loop and joins the thread, which
//! tears the tap down.

use std::sync::mpsc as std_mpsc;
use std::thread;

use core_foundation::runloop::{CFRunLoop, kCFRunLoopCommonModes};
use core_graphics::event::{
    CGEvent, CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
    EventField,
};
use tokio::sync::mpsc::UnboundedSender;

use crate::input::{Point, RawEventKind, RawInputEvent, epoch_millis};
use crate::resolver::ResolverError;
use crate::resolver::input::{InputSource, MonitorHandle, MonitorScope};

/// Installs listen-only session taps.
#[derive(Debug, Default)]
pub struct MacInputSource;

struct RunLoopRef(CFRunLoop);

// Only used to call CFRunLoopStop, which is safe from any thread.
unsafe impl Send for RunLoopRef {}

impl InputSource for MacInputSource {
    fn start(
        &self,
        scope: MonitorScope,
        events: UnboundedSender<RawInputEvent>,
    ) -> Result<MonitorHandle, ResolverError> {
        if scope == MonitorScope::Local {
            return Err(ResolverError::Input(
                "local monitoring needs an application event loop".into(),
            ));
        }

        let (ready_tx, ready_rx) = std_mpsc::channel::<Result<RunLoopRef, ResolverError>>();
        let thread = thread::Builder::new()
            .name("xpop-event-tap".into())
            .spawn(move || run_tap(events, ready_tx))
            .map_err(|e| ResolverError::Input(format!("spawn tap thread: {e}")))?;

        let run_loop = match ready_rx.recv() {
            Ok(Ok(run_loop)) => run_loop,
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(ResolverError::Input("tap thread exited".into()));
            }
        };

        tracing::debug!("global event tap installed");
        Ok(MonitorHandle::new(move || {
            run_loop.0.stop();
            let _ = thread.join();
            tracing::debug!("global event tap removed");
        }))
    }
}

fn run_tap(
    events: UnboundedSender<RawInputEvent>,
    ready: std_mpsc::Sender<Result<RunLoopRef, ResolverError>>,
) {
    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::ListenOnly,
        vec![
            CGEventType::LeftMouseDown,
            CGEventType::LeftMouseDragged,
            CGEventType::LeftMouseUp,
            CGEventType::MouseMoved,
            CGEventType::ScrollWheel,
            CGEventType::KeyDown,
            CGEventType::KeyUp,
        ],
        move |_proxy, event_type, event| {
            let kind = raw_kind(event_type);
            if kind != RawEventKind::Other {
                let _ = events.send(convert(kind, event));
            }
            None
        },
    );
    let tap = match tap {
        Ok(tap) => tap,
        Err(()) => {
            let _ = ready.send(Err(ResolverError::Input(
                "event tap refused; check Input Monitoring permission".into(),
            )));
            return;
        }
    };

    let source = match tap.mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            let _ = ready.send(Err(ResolverError::Input(
                "event tap run loop source".into(),
            )));
            return;
        }
    };

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }
    tap.enable();

    if ready.send(Ok(RunLoopRef(run_loop))).is_err() {
        return;
    }
    CFRunLoop::run_current();
}

fn raw_kind(event_type: CGEventType) -> RawEventKind {
    match event_type {
        CGEventType::LeftMouseDown => RawEventKind::LeftMouseDown,
        CGEventType::LeftMouseDragged => RawEventKind::LeftMouseDragged,
        CGEventType::LeftMouseUp => RawEventKind::LeftMouseUp,
        CGEventType::MouseMoved => RawEventKind::MouseMoved,
        CGEventType::ScrollWheel => RawEventKind::ScrollWheel,
        CGEventType::KeyDown => RawEventKind::KeyDown,
        CGEventType::KeyUp => RawEventKind::KeyUp,
        _ => RawEventKind::Other,
    }
}

fn convert(kind: RawEventKind, event: &CGEvent) -> RawInputEvent {
    let location = event.location();
    RawInputEvent {
        kind,
        location: Point::new(location.x, location.y),
        timestamp: epoch_millis(),
        click_count: event.get_integer_value_field(EventField::MOUSE_EVENT_CLICK_STATE),
        modifiers: event.get_flags().bits(),
    }
}
