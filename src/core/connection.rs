use super::{error::ProtocolError, window::WindowId};

/// Partial geometry update, mirroring the value mask of an X ConfigureWindow
/// request: only the fields that are set are sent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowChanges {
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub border_width: Option<u32>,
    /// Restack the window above all its siblings.
    pub raise: bool,
}

impl WindowChanges {
    pub fn geometry(x: i32, y: i32, width: u32, height: u32, border_width: u32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            width: Some(width),
            height: Some(height),
            border_width: Some(border_width),
            raise: false,
        }
    }

    pub fn border(border_width: u32) -> Self {
        Self {
            border_width: Some(border_width),
            ..Self::default()
        }
    }

    pub fn raised(mut self) -> Self {
        self.raise = true;
        self
    }
}

/// Requests the tiling core issues against the window server. Every call is
/// a synchronous round trip.
pub trait Connection: Send + Sync {
    fn configure(&self, window: WindowId, changes: &WindowChanges) -> Result<(), ProtocolError>;

    /// Moves the pointer to `(x, y)` relative to `window`.
    fn warp_pointer(&self, window: WindowId, x: i32, y: i32) -> Result<(), ProtocolError>;

    /// Pointer position in root coordinates.
    fn pointer_position(&self) -> Result<(i32, i32), ProtocolError>;
}
