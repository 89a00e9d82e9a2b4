use parking_lot::Mutex;

use super::{
    connection::{Connection, WindowChanges},
    error::ProtocolError,
    window::WindowId,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Request {
    Configure(WindowId, WindowChanges),
    Warp(WindowId, i32, i32),
}

type FailWhen = Box<dyn Fn(WindowId, &WindowChanges) -> bool + Send + Sync>;

/// Fake window server that records every request it receives.
pub struct RecordingConnection {
    requests: Mutex<Vec<Request>>,
    fail_configure: Mutex<Option<FailWhen>>,
    fail_warp: Mutex<bool>,
    pointer: Mutex<(i32, i32)>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            fail_configure: Mutex::new(None),
            fail_warp: Mutex::new(false),
            pointer: Mutex::new((0, 0)),
        }
    }

    pub fn fail_configure_when<F>(&self, pred: F)
    where
        F: Fn(WindowId, &WindowChanges) -> bool + Send + Sync + 'static,
    {
        *self.fail_configure.lock() = Some(Box::new(pred));
    }

    pub fn fail_warp(&self) {
        *self.fail_warp.lock() = true;
    }

    pub fn move_pointer(&self, x: i32, y: i32) {
        *self.pointer.lock() = (x, y);
    }

    pub fn take(&self) -> Vec<Request> {
        std::mem::take(&mut *self.requests.lock())
    }

    pub fn configures(&self) -> Vec<(WindowId, WindowChanges)> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| match r {
                Request::Configure(w, c) => Some((*w, *c)),
                Request::Warp(..) => None,
            })
            .collect()
    }
}

impl Connection for RecordingConnection {
    fn configure(&self, window: WindowId, changes: &WindowChanges) -> Result<(), ProtocolError> {
        self.requests
            .lock()
            .push(Request::Configure(window, *changes));

        match &*self.fail_configure.lock() {
            Some(pred) if pred(window, changes) => Err(ProtocolError::Request {
                request: "ConfigureWindow",
                window,
                code: 3,
            }),
            _ => Ok(()),
        }
    }

    fn warp_pointer(&self, window: WindowId, x: i32, y: i32) -> Result<(), ProtocolError> {
        self.requests.lock().push(Request::Warp(window, x, y));

        if *self.fail_warp.lock() {
            return Err(ProtocolError::Request {
                request: "WarpPointer",
                window,
                code: 3,
            });
        }

        Ok(())
    }

    fn pointer_position(&self) -> Result<(i32, i32), ProtocolError> {
        Ok(*self.pointer.lock())
    }
}
