use log::{debug, warn};
use parking_lot::{Mutex, MutexGuard};

use super::{
    column::Column,
    connection::{Connection, WindowChanges},
    error::WmError,
    window::{Rect, WindowId},
};

/// A logical desktop bound to one screen. All layout state lives behind a
/// single per-workspace lock; nothing here is shared between workspaces.
pub struct Workspace {
    index: usize,
    border_width: u32,
    state: Mutex<WorkspaceState>,
}

#[derive(Debug, Default)]
pub struct WorkspaceState {
    pub(crate) screen: Option<Rect>,
    pub(crate) columns: Vec<Column>,
    /// When set, names a window held by exactly one of `columns`.
    pub(crate) maximized: Option<WindowId>,
    pub(crate) focused: Option<WindowId>,
}

impl Workspace {
    pub fn new(index: usize, border_width: u32) -> Self {
        Self {
            index,
            border_width,
            state: Mutex::new(WorkspaceState::default()),
        }
    }

    pub fn with_screen(index: usize, border_width: u32, screen: Rect) -> Self {
        let workspace = Self::new(index, border_width);
        workspace.attach_screen(screen);
        workspace
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn border_width(&self) -> u32 {
        self.border_width
    }

    pub fn attach_screen(&self, screen: Rect) {
        self.state.lock().screen = Some(screen);
    }

    pub fn screen(&self) -> Option<Rect> {
        self.state.lock().screen
    }

    pub fn maximized(&self) -> Option<WindowId> {
        self.state.lock().maximized
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.state.lock().focused
    }

    pub fn columns(&self) -> Vec<Column> {
        self.state.lock().columns.clone()
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.state.lock().column_of(window).is_some()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, WorkspaceState> {
        self.state.lock()
    }

    /// A workspace is active while the pointer is on its screen. Evaluated
    /// fresh on every call.
    pub fn is_active<C>(&self, conn: &C) -> bool
    where
        C: Connection + ?Sized,
    {
        let Some(screen) = self.screen() else {
            return false;
        };

        match conn.pointer_position() {
            Ok((x, y)) => screen.contains(x, y),
            Err(e) => {
                warn!("Workspace {}: failed to query pointer: {}", self.index, e);
                false
            }
        }
    }

    pub fn tile_windows<C>(&self, conn: &C) -> Result<(), WmError>
    where
        C: Connection + ?Sized,
    {
        self.state.lock().tile(conn, self.border_width)
    }

    /// Drops `window` from its column, clearing the maximized and focused
    /// references if they name it. Does not re-tile.
    pub fn remove_window(&self, window: WindowId) -> Result<(), WmError> {
        self.state.lock().remove(window)
    }

    /// Places a new window: a fresh column while fewer than `max_columns`
    /// exist, otherwise the bottom of the last column. Returns false if the
    /// window was already managed here.
    pub fn add_window(&self, window: WindowId, max_columns: usize) -> bool {
        self.state.lock().add(window, max_columns)
    }

    /// Marks a managed window as the workspace's active window.
    pub fn set_focused(&self, window: WindowId) -> Result<(), WmError> {
        let mut state = self.state.lock();
        if state.column_of(window).is_none() {
            return Err(WmError::WindowNotManaged(window));
        }
        state.focused = Some(window);
        Ok(())
    }
}

impl WorkspaceState {
    pub(crate) fn column_of(&self, window: WindowId) -> Option<usize> {
        self.columns.iter().position(|c| c.contains(window))
    }

    pub(crate) fn tile<C>(&self, conn: &C, border_width: u32) -> Result<(), WmError>
    where
        C: Connection + ?Sized,
    {
        let screen = self.screen.ok_or(WmError::NoScreenAttached)?;

        if let Some(window) = self.maximized {
            debug!("Maximizing {} over {:?}", window, screen);
            let changes =
                WindowChanges::geometry(screen.x, screen.y, screen.width, screen.height, 0)
                    .raised();
            return conn.configure(window, &changes).map_err(WmError::from);
        }

        if self.columns.is_empty() {
            return Err(WmError::NoColumns);
        }

        let count = self.columns.len() as i64;
        let total_delta: i64 = self.columns.iter().map(|c| i64::from(c.size_delta)).sum();
        let base = (i64::from(screen.width) - total_delta) / count;

        let mut first_err = None;
        let mut preceding_delta = 0i64;
        let mut focused_rect = None;

        for (i, column) in self.columns.iter().enumerate() {
            let x = i64::from(screen.x) + base * i as i64 + preceding_delta;
            let width = (base + i64::from(column.size_delta)).max(1);
            preceding_delta += i64::from(column.size_delta);

            let area = Rect::new(x as i32, screen.y, width as u32, screen.height);

            if let Some(focused) = self.focused.filter(|&w| column.contains(w)) {
                focused_rect = column
                    .layout(area)
                    .into_iter()
                    .find(|&(w, _)| w == focused);
            }

            if let Err(e) = column.tile(conn, area, border_width) {
                warn!("Column {} failed to tile: {}", i, e);
                first_err.get_or_insert(e);
            }
        }

        if let Some((window, rect)) = focused_rect {
            let (x, y) = ((rect.width / 2) as i32, (rect.height / 2) as i32);
            if let Err(e) = conn.warp_pointer(window, x, y) {
                warn!("Failed to warp pointer to {}: {}", window, e);
            }
        }

        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    pub(crate) fn remove(&mut self, window: WindowId) -> Result<(), WmError> {
        let idx = self
            .column_of(window)
            .ok_or(WmError::WindowNotManaged(window))?;

        self.columns[idx].remove(window);
        if self.columns[idx].is_empty() {
            self.columns.remove(idx);
        }

        if self.maximized == Some(window) {
            debug!("Maximized window {} went away", window);
            self.maximized = None;
        }
        if self.focused == Some(window) {
            self.focused = None;
        }

        Ok(())
    }

    pub(crate) fn add(&mut self, window: WindowId, max_columns: usize) -> bool {
        if self.column_of(window).is_some() {
            return false;
        }

        let full = self.columns.len() >= max_columns.max(1);
        match self.columns.last_mut() {
            Some(last) if full => last.windows.push(window),
            _ => self.columns.push(Column::with_windows([window])),
        }

        self.focused = Some(window);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{RecordingConnection, Request};

    const SCREEN: Rect = Rect {
        x: 0,
        y: 0,
        width: 1000,
        height: 800,
    };

    fn workspace(columns: Vec<Column>) -> Workspace {
        let ws = Workspace::with_screen(0, 2, SCREEN);
        ws.lock().columns = columns;
        ws
    }

    fn two_columns() -> Workspace {
        workspace(vec![
            Column::with_windows([WindowId(1)]),
            Column::with_windows([WindowId(2)]),
        ])
    }

    #[test]
    fn no_screen_is_an_error() {
        let ws = Workspace::new(0, 2);
        ws.lock().columns.push(Column::with_windows([WindowId(1)]));

        let conn = RecordingConnection::new();
        assert_eq!(ws.tile_windows(&conn), Err(WmError::NoScreenAttached));
        assert!(conn.take().is_empty());
    }

    #[test]
    fn no_columns_is_an_error() {
        let conn = RecordingConnection::new();
        assert_eq!(workspace(vec![]).tile_windows(&conn), Err(WmError::NoColumns));
    }

    #[test]
    fn even_split_over_two_columns() {
        let conn = RecordingConnection::new();
        two_columns().tile_windows(&conn).unwrap();

        assert_eq!(
            conn.configures(),
            vec![
                (WindowId(1), WindowChanges::geometry(0, 0, 496, 796, 2)),
                (WindowId(2), WindowChanges::geometry(500, 0, 496, 796, 2)),
            ]
        );
    }

    #[test]
    fn size_deltas_shift_offsets() {
        let mut left = Column::with_windows([WindowId(1)]);
        left.size_delta = 100;
        let mut middle = Column::with_windows([WindowId(2)]);
        middle.size_delta = -40;
        let right = Column::with_windows([WindowId(3)]);

        let conn = RecordingConnection::new();
        workspace(vec![left, middle, right])
            .tile_windows(&conn)
            .unwrap();

        // base = (1000 - 60) / 3 = 313
        let placed: Vec<_> = conn
            .configures()
            .into_iter()
            .map(|(w, c)| (w, c.x.unwrap(), c.width.unwrap() + 4))
            .collect();
        assert_eq!(
            placed,
            vec![
                (WindowId(1), 0, 413),
                (WindowId(2), 413, 273),
                (WindowId(3), 686, 313),
            ]
        );
    }

    #[test]
    fn screen_origin_offsets_columns() {
        let ws = Workspace::with_screen(1, 0, Rect::new(1920, 0, 1000, 600));
        ws.lock().columns = vec![
            Column::with_windows([WindowId(1)]),
            Column::with_windows([WindowId(2)]),
        ];

        let conn = RecordingConnection::new();
        ws.tile_windows(&conn).unwrap();

        let xs: Vec<_> = conn.configures().iter().map(|(_, c)| c.x).collect();
        assert_eq!(xs, vec![Some(1920), Some(2420)]);
    }

    #[test]
    fn maximized_window_gets_single_fullscreen_request() {
        let ws = two_columns();
        ws.lock().maximized = Some(WindowId(1));

        let conn = RecordingConnection::new();
        ws.tile_windows(&conn).unwrap();

        assert_eq!(
            conn.take(),
            vec![Request::Configure(
                WindowId(1),
                WindowChanges::geometry(0, 0, 1000, 800, 0).raised()
            )]
        );
    }

    #[test]
    fn maximized_request_error_is_returned() {
        let ws = two_columns();
        ws.lock().maximized = Some(WindowId(2));

        let conn = RecordingConnection::new();
        conn.fail_configure_when(|_, _| true);

        assert!(matches!(
            ws.tile_windows(&conn),
            Err(WmError::Protocol(_))
        ));
        assert_eq!(conn.configures().len(), 1);
    }

    #[test]
    fn failing_column_does_not_stop_others() {
        let ws = workspace(vec![
            Column::with_windows([WindowId(1)]),
            Column::with_windows([WindowId(2)]),
            Column::with_windows([WindowId(3)]),
        ]);

        let conn = RecordingConnection::new();
        conn.fail_configure_when(|w, _| w == WindowId(2) || w == WindowId(3));

        let err = ws.tile_windows(&conn).unwrap_err();

        assert!(matches!(
            err,
            WmError::Protocol(crate::core::error::ProtocolError::Request {
                window: WindowId(2),
                ..
            })
        ));
        assert_eq!(conn.configures().len(), 3);
    }

    #[test]
    fn tiling_warps_to_focused_window() {
        let ws = workspace(vec![
            Column::with_windows([WindowId(1)]),
            Column::with_windows([WindowId(2), WindowId(3)]),
        ]);
        ws.set_focused(WindowId(3)).unwrap();

        let conn = RecordingConnection::new();
        ws.tile_windows(&conn).unwrap();

        assert_eq!(conn.take().last(), Some(&Request::Warp(WindowId(3), 250, 200)));
    }

    #[test]
    fn warp_failure_is_swallowed() {
        let ws = two_columns();
        ws.set_focused(WindowId(1)).unwrap();

        let conn = RecordingConnection::new();
        conn.fail_warp();

        assert_eq!(ws.tile_windows(&conn), Ok(()));
    }

    #[test]
    fn removing_maximized_window_clears_reference() {
        let ws = workspace(vec![
            Column::with_windows([WindowId(1), WindowId(3)]),
            Column::with_windows([WindowId(2)]),
        ]);
        ws.lock().maximized = Some(WindowId(1));

        assert_eq!(ws.remove_window(WindowId(1)), Ok(()));
        assert_eq!(ws.maximized(), None);

        let conn = RecordingConnection::new();
        ws.tile_windows(&conn).unwrap();

        let windows: Vec<_> = conn.configures().into_iter().map(|(w, _)| w).collect();
        assert_eq!(windows, vec![WindowId(3), WindowId(2)]);
    }

    #[test]
    fn removing_unmanaged_window_changes_nothing() {
        let ws = two_columns();
        ws.lock().maximized = Some(WindowId(2));
        ws.set_focused(WindowId(1)).unwrap();
        let before = ws.columns();

        assert_eq!(
            ws.remove_window(WindowId(9)),
            Err(WmError::WindowNotManaged(WindowId(9)))
        );
        assert_eq!(ws.columns(), before);
        assert_eq!(ws.maximized(), Some(WindowId(2)));
        assert_eq!(ws.focused(), Some(WindowId(1)));
    }

    #[test]
    fn removing_last_window_of_column_drops_column() {
        let ws = two_columns();
        ws.remove_window(WindowId(1)).unwrap();

        assert_eq!(ws.columns(), vec![Column::with_windows([WindowId(2)])]);
    }

    #[test]
    fn add_fills_columns_then_stacks() {
        let ws = workspace(vec![]);
        assert!(ws.add_window(WindowId(1), 2));
        assert!(ws.add_window(WindowId(2), 2));
        assert!(ws.add_window(WindowId(3), 2));
        assert!(!ws.add_window(WindowId(2), 2));

        assert_eq!(
            ws.columns(),
            vec![
                Column::with_windows([WindowId(1)]),
                Column::with_windows([WindowId(2), WindowId(3)]),
            ]
        );
        assert_eq!(ws.focused(), Some(WindowId(3)));
    }

    #[test]
    fn active_follows_pointer() {
        let ws = Workspace::with_screen(0, 2, Rect::new(1000, 0, 1000, 800));
        let conn = RecordingConnection::new();

        conn.move_pointer(10, 10);
        assert!(!ws.is_active(&conn));

        conn.move_pointer(1500, 10);
        assert!(ws.is_active(&conn));

        assert!(!Workspace::new(1, 2).is_active(&conn));
    }
}
