//! Process-wide policy for unhandled panics inside spawned tasks.
//!
//! The spawn wrapper (`go`/`spawn` in the facade crate) catches every
//! panic at the task boundary and routes the payload here. The default
//! policy logs it and ends the process, matching a spawned task's failure
//! being treated as fatal unless the application installs its own handler.

use crate::kerror;
use std::any::Any;
use std::sync::Mutex;

/// A process-wide panic handler: receives the `catch_unwind` payload of an
/// unhandled panic from a spawned task.
pub type PanicHandler = Box<dyn Fn(Box<dyn Any + Send>) + Send + Sync>;

static HANDLER: Mutex<Option<PanicHandler>> = Mutex::new(None);

/// Install a replacement panic handler. Applications that want a failed
/// task to do something other than terminate the process call this once
/// at startup.
pub fn set_panic_handler(handler: PanicHandler) {
    *HANDLER.lock().unwrap() = Some(handler);
}

/// Reset to the default handler. Mainly useful for tests.
pub fn reset_panic_handler() {
    *HANDLER.lock().unwrap() = None;
}

/// Route a panic payload to the installed handler, or the default one.
pub fn invoke_panic_handler(payload: Box<dyn Any + Send>) {
    let handler = HANDLER.lock().unwrap();
    match handler.as_ref() {
        Some(h) => h(payload),
        None => {
            drop(handler);
            default_panic_handler(payload);
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

fn default_panic_handler(payload: Box<dyn Any + Send>) {
    kerror!("unhandled panic in spawned task: {}", panic_message(payload.as_ref()));
    std::process::exit(101);
}
