use log::warn;

use super::{
    connection::{Connection, WindowChanges},
    error::ProtocolError,
    window::{Rect, WindowId},
};

/// A vertical strip of the screen. Windows are stacked top to bottom in
/// list order and share the strip's height evenly.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Column {
    pub windows: Vec<WindowId>,
    /// Pixels added to (or taken from) this column's share of an even split.
    pub size_delta: i32,
}

impl Column {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_windows(windows: impl IntoIterator<Item = WindowId>) -> Self {
        Self {
            windows: windows.into_iter().collect(),
            size_delta: 0,
        }
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.windows.contains(&window)
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn remove(&mut self, window: WindowId) -> bool {
        match self.windows.iter().position(|&w| w == window) {
            Some(idx) => {
                self.windows.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Outer rectangles (border included) for every window in the column.
    /// The last window absorbs the rounding remainder of the height split.
    pub fn layout(&self, area: Rect) -> Vec<(WindowId, Rect)> {
        let count = self.windows.len() as u32;
        if count == 0 {
            return Vec::new();
        }

        let base = area.height / count;

        self.windows
            .iter()
            .enumerate()
            .map(|(i, &window)| {
                let i = i as u32;
                let height = if i + 1 == count {
                    area.height - base * i
                } else {
                    base
                };
                let y = area.y + (base * i) as i32;
                (window, Rect::new(area.x, y, area.width, height))
            })
            .collect()
    }

    /// Positions every window of the column inside `area`. A failing window
    /// does not stop the rest from being placed; the first error is returned.
    pub fn tile<C>(&self, conn: &C, area: Rect, border_width: u32) -> Result<(), ProtocolError>
    where
        C: Connection + ?Sized,
    {
        let border_offset = border_width * 2;
        let mut first_err = None;

        for (window, rect) in self.layout(area) {
            let changes = WindowChanges::geometry(
                rect.x,
                rect.y,
                rect.width.saturating_sub(border_offset).max(1),
                rect.height.saturating_sub(border_offset).max(1),
                border_width,
            );

            if let Err(e) = conn.configure(window, &changes) {
                warn!("Failed to place window {}: {}", window, e);
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
