use anyhow::{anyhow, Result};
use parking_lot::Mutex;
use std::{
    env,
    ffi::CString,
    os::raw::c_int,
    sync::atomic::{AtomicU8, Ordering},
};
use x11::{xinerama, xlib};

use crate::core::{
    connection::{Connection, WindowChanges},
    error::ProtocolError,
    window::{Rect, WindowId},
};

/// Error code of the most recent failed request, 0 when none.
static LAST_ERROR: AtomicU8 = AtomicU8::new(0);

/// Xlib connection shared by the event loop and the workspace tasks.
///
/// Requests are serialised by `requests` and synced one at a time, so an X
/// error observed right after a request belongs to that request.
pub struct Display {
    raw: *mut xlib::Display,
    root: xlib::Window,
    requests: Mutex<()>,
}

// Xlib is initialised with XInitThreads before the display is opened.
unsafe impl Send for Display {}
unsafe impl Sync for Display {}

impl Display {
    pub fn new() -> Result<Self> {
        unsafe {
            if xlib::XInitThreads() == 0 {
                return Err(anyhow!("Xlib has no thread support"));
            }
            xlib::XSetErrorHandler(Some(Self::error_handler));
        }

        let display_name = env::var("DISPLAY").unwrap_or_else(|_| String::from(":0"));
        let c_display_name =
            CString::new(display_name).map_err(|_| anyhow!("Invalid DISPLAY variable"))?;
        let raw = unsafe { xlib::XOpenDisplay(c_display_name.as_ptr()) };

        if raw.is_null() {
            return Err(anyhow!("Failed to open X display"));
        }

        let root = unsafe {
            xlib::XSynchronize(raw, 1);
            xlib::XDefaultRootWindow(raw)
        };

        LAST_ERROR.store(0, Ordering::SeqCst);
        unsafe {
            xlib::XSelectInput(
                raw,
                root,
                xlib::SubstructureRedirectMask | xlib::SubstructureNotifyMask,
            );
            xlib::XSync(raw, 0);
        }
        if LAST_ERROR.swap(0, Ordering::SeqCst) != 0 {
            return Err(anyhow!("Another window manager is already running"));
        }

        Ok(Self {
            raw,
            root,
            requests: Mutex::new(()),
        })
    }

    pub fn root(&self) -> WindowId {
        WindowId(self.root)
    }

    /// One extent per Xinerama screen, or the whole default screen when
    /// Xinerama is unavailable.
    pub fn screens(&self) -> Vec<Rect> {
        let _guard = self.requests.lock();

        unsafe {
            let mut count = 0;
            let infos = xinerama::XineramaQueryScreens(self.raw, &mut count);

            if !infos.is_null() && count > 0 {
                let screens = std::slice::from_raw_parts(infos, count as usize)
                    .iter()
                    .map(|s| {
                        Rect::new(
                            i32::from(s.x_org),
                            i32::from(s.y_org),
                            s.width as u32,
                            s.height as u32,
                        )
                    })
                    .collect();
                xlib::XFree(infos as *mut _);
                screens
            } else {
                let screen = xlib::XDefaultScreen(self.raw);
                vec![Rect::new(
                    0,
                    0,
                    xlib::XDisplayWidth(self.raw, screen) as u32,
                    xlib::XDisplayHeight(self.raw, screen) as u32,
                )]
            }
        }
    }

    /// Runs `f` as one synchronous request and reports any X error it raised.
    fn checked<F>(
        &self,
        request: &'static str,
        window: WindowId,
        f: F,
    ) -> Result<(), ProtocolError>
    where
        F: FnOnce(*mut xlib::Display),
    {
        let _guard = self.requests.lock();

        LAST_ERROR.store(0, Ordering::SeqCst);
        unsafe {
            f(self.raw);
            xlib::XSync(self.raw, 0);
        }

        match LAST_ERROR.swap(0, Ordering::SeqCst) {
            0 => Ok(()),
            code => Err(ProtocolError::Request {
                request,
                window,
                code,
            }),
        }
    }

    pub fn grab_key(&self, keycode: u8, modifiers: u32) -> Result<(), ProtocolError> {
        let root = self.root;
        self.checked("GrabKey", self.root(), |d| unsafe {
            xlib::XGrabKey(
                d,
                c_int::from(keycode),
                modifiers,
                root,
                1,
                xlib::GrabModeAsync,
                xlib::GrabModeAsync,
            );
        })
    }

    /// Keycode producing `keysym`, 0 when no key on the keyboard does.
    pub fn keycode(&self, keysym: u64) -> u8 {
        let _guard = self.requests.lock();
        unsafe { xlib::XKeysymToKeycode(self.raw, keysym) }
    }

    /// Maps a newly managed window and subscribes to pointer-enter events.
    pub fn manage(
        &self,
        window: WindowId,
        border_width: u32,
        border_color: u64,
    ) -> Result<(), ProtocolError> {
        self.checked("MapWindow", window, |d| unsafe {
            xlib::XSelectInput(
                d,
                window.raw(),
                xlib::EnterWindowMask | xlib::StructureNotifyMask,
            );
            xlib::XSetWindowBorderWidth(d, window.raw(), border_width);
            xlib::XSetWindowBorder(d, window.raw(), border_color);
            xlib::XMapWindow(d, window.raw());
        })
    }

    pub fn set_border_color(&self, window: WindowId, color: u64) -> Result<(), ProtocolError> {
        self.checked("ChangeWindowAttributes", window, |d| unsafe {
            xlib::XSetWindowBorder(d, window.raw(), color);
        })
    }

    pub fn focus(&self, window: WindowId) -> Result<(), ProtocolError> {
        self.checked("SetInputFocus", window, |d| unsafe {
            xlib::XSetInputFocus(
                d,
                window.raw(),
                xlib::RevertToPointerRoot,
                xlib::CurrentTime,
            );
        })
    }

    pub fn focused_window(&self) -> Option<WindowId> {
        let _guard = self.requests.lock();

        let mut focused: xlib::Window = 0;
        let mut revert_to: c_int = 0;
        unsafe {
            xlib::XGetInputFocus(self.raw, &mut focused, &mut revert_to);
        }

        match focused {
            0 | 1 => None,
            w if w == self.root => None,
            w => Some(WindowId(w)),
        }
    }

    /// Grants an unmanaged window the geometry it asked for.
    pub fn forward_configure(
        &self,
        request: &xlib::XConfigureRequestEvent,
    ) -> Result<(), ProtocolError> {
        let mut changes = xlib::XWindowChanges {
            x: request.x,
            y: request.y,
            width: request.width,
            height: request.height,
            border_width: request.border_width,
            sibling: request.above,
            stack_mode: request.detail,
        };

        self.checked("ConfigureWindow", WindowId(request.window), |d| unsafe {
            xlib::XConfigureWindow(d, request.window, request.value_mask as u32, &mut changes);
        })
    }

    /// Asks `window` to close through WM_DELETE_WINDOW, destroying it when
    /// the client does not speak that protocol.
    pub fn close(&self, window: WindowId) -> Result<(), ProtocolError> {
        self.checked("CloseWindow", window, |d| unsafe {
            let wm_protocols = xlib::XInternAtom(d, c"WM_PROTOCOLS".as_ptr(), 0);
            let wm_delete_window = xlib::XInternAtom(d, c"WM_DELETE_WINDOW".as_ptr(), 0);

            let mut protocols: *mut xlib::Atom = std::ptr::null_mut();
            let mut num_protocols: c_int = 0;
            let supports_delete = if xlib::XGetWMProtocols(
                d,
                window.raw(),
                &mut protocols,
                &mut num_protocols,
            ) != 0
            {
                let found = std::slice::from_raw_parts(protocols, num_protocols as usize)
                    .contains(&wm_delete_window);
                xlib::XFree(protocols as *mut _);
                found
            } else {
                false
            };

            if supports_delete {
                let mut data: xlib::ClientMessageData = std::mem::zeroed();
                data.set_long(0, wm_delete_window as i64);

                let mut event = xlib::XEvent {
                    client_message: xlib::XClientMessageEvent {
                        type_: xlib::ClientMessage,
                        serial: 0,
                        send_event: 1,
                        display: d,
                        window: window.raw(),
                        message_type: wm_protocols,
                        format: 32,
                        data,
                    },
                };
                xlib::XSendEvent(d, window.raw(), 0, 0, &mut event);
            } else {
                xlib::XDestroyWindow(d, window.raw());
            }
        })
    }

    /// Blocks until the next event arrives.
    pub fn next_event(&self) -> xlib::XEvent {
        let mut event: xlib::XEvent = unsafe { std::mem::zeroed() };
        unsafe {
            xlib::XNextEvent(self.raw, &mut event);
        }
        event
    }

    unsafe extern "C" fn error_handler(
        display: *mut xlib::Display,
        e: *mut xlib::XErrorEvent,
    ) -> i32 {
        let mut error_text = [0i8; 1024];
        xlib::XGetErrorText(
            display,
            (*e).error_code as i32,
            error_text.as_mut_ptr(),
            error_text.len() as i32,
        );

        let error_msg = std::ffi::CStr::from_ptr(error_text.as_ptr())
            .to_string_lossy()
            .into_owned();

        log::error!(
            "X11 Error: {} (code: {}, resource id: {}, request code: {})",
            error_msg,
            (*e).error_code,
            (*e).resourceid,
            (*e).request_code
        );

        LAST_ERROR.store((*e).error_code, Ordering::SeqCst);

        0
    }
}

impl Connection for Display {
    fn configure(&self, window: WindowId, changes: &WindowChanges) -> Result<(), ProtocolError> {
        let mut values: xlib::XWindowChanges = unsafe { std::mem::zeroed() };
        let mut mask: u32 = 0;

        if let Some(x) = changes.x {
            values.x = x;
            mask |= xlib::CWX as u32;
        }
        if let Some(y) = changes.y {
            values.y = y;
            mask |= xlib::CWY as u32;
        }
        if let Some(width) = changes.width {
            values.width = width as c_int;
            mask |= xlib::CWWidth as u32;
        }
        if let Some(height) = changes.height {
            values.height = height as c_int;
            mask |= xlib::CWHeight as u32;
        }
        if let Some(border_width) = changes.border_width {
            values.border_width = border_width as c_int;
            mask |= xlib::CWBorderWidth as u32;
        }
        if changes.raise {
            values.stack_mode = xlib::Above;
            mask |= xlib::CWStackMode as u32;
        }

        log::debug!("ConfigureWindow {} {:?}", window, changes);

        self.checked("ConfigureWindow", window, |d| unsafe {
            xlib::XConfigureWindow(d, window.raw(), mask, &mut values);
        })
    }

    fn warp_pointer(&self, window: WindowId, x: i32, y: i32) -> Result<(), ProtocolError> {
        self.checked("WarpPointer", window, |d| unsafe {
            xlib::XWarpPointer(d, 0, window.raw(), 0, 0, 0, 0, x, y);
        })
    }

    fn pointer_position(&self) -> Result<(i32, i32), ProtocolError> {
        let _guard = self.requests.lock();

        let mut root_return: xlib::Window = 0;
        let mut child_return: xlib::Window = 0;
        let mut root_x: c_int = 0;
        let mut root_y: c_int = 0;
        let mut win_x: c_int = 0;
        let mut win_y: c_int = 0;
        let mut mask_return: u32 = 0;

        let same_screen = unsafe {
            xlib::XQueryPointer(
                self.raw,
                self.root,
                &mut root_return,
                &mut child_return,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask_return,
            )
        };

        if same_screen == 0 {
            return Err(ProtocolError::Request {
                request: "QueryPointer",
                window: self.root(),
                code: xlib::BadWindow as u8,
            });
        }

        Ok((root_x, root_y))
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        unsafe {
            xlib::XCloseDisplay(self.raw);
        }
    }
}
