use log::{debug, warn};

use super::{
    connection::{Connection, WindowChanges},
    error::WmError,
    window::WindowId,
    workspace::Workspace,
};

/// Flips `workspace` between normal tiling and showing one window over the
/// whole screen, then re-tiles. The state change and the re-tile happen
/// under one hold of the workspace lock.
///
/// When a window is already maximized it is restored no matter which
/// `window` is passed in. Restoring its border is best effort: the maximized
/// reference is cleared even if that request fails.
pub fn toggle_maximize<C>(
    workspace: &Workspace,
    conn: &C,
    window: WindowId,
) -> Result<(), WmError>
where
    C: Connection + ?Sized,
{
    let border_width = workspace.border_width();
    let mut state = workspace.lock();

    match state.maximized.take() {
        None => {
            if state.column_of(window).is_none() {
                return Err(WmError::WindowNotManaged(window));
            }
            debug!("Workspace {}: maximizing {}", workspace.index(), window);
            state.maximized = Some(window);
        }
        Some(previous) => {
            debug!("Workspace {}: restoring {}", workspace.index(), previous);
            if let Err(e) = conn.configure(previous, &WindowChanges::border(border_width)) {
                warn!("Failed to restore border of {}: {}", previous, e);
            }
        }
    }

    state.tile(conn, border_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        column::Column,
        testing::{RecordingConnection, Request},
        window::Rect,
    };

    fn workspace() -> Workspace {
        let ws = Workspace::with_screen(0, 2, Rect::new(0, 0, 1000, 700));
        ws.lock().columns = vec![
            Column::with_windows([WindowId(1), WindowId(3)]),
            Column::with_windows([WindowId(2)]),
        ];
        ws
    }

    #[test]
    fn toggle_round_trip_restores_layout() {
        let ws = workspace();
        let conn = RecordingConnection::new();

        ws.tile_windows(&conn).unwrap();
        let before = conn.take();
        let columns = ws.columns();

        toggle_maximize(&ws, &conn, WindowId(1)).unwrap();
        assert_eq!(ws.maximized(), Some(WindowId(1)));
        assert_eq!(
            conn.take(),
            vec![Request::Configure(
                WindowId(1),
                WindowChanges::geometry(0, 0, 1000, 700, 0).raised()
            )]
        );

        toggle_maximize(&ws, &conn, WindowId(1)).unwrap();
        assert_eq!(ws.maximized(), None);

        let mut after = conn.take();
        assert_eq!(
            after.remove(0),
            Request::Configure(WindowId(1), WindowChanges::border(2))
        );
        assert_eq!(after, before);
        assert_eq!(ws.columns(), columns);
    }

    #[test]
    fn scenario_half_split_maximize_and_back() {
        let ws = Workspace::with_screen(0, 0, Rect::new(0, 0, 1000, 600));
        ws.lock().columns = vec![
            Column::with_windows([WindowId(10)]),
            Column::with_windows([WindowId(20)]),
        ];
        let conn = RecordingConnection::new();

        ws.tile_windows(&conn).unwrap();
        let split = vec![
            Request::Configure(WindowId(10), WindowChanges::geometry(0, 0, 500, 600, 0)),
            Request::Configure(WindowId(20), WindowChanges::geometry(500, 0, 500, 600, 0)),
        ];
        assert_eq!(conn.take(), split);

        toggle_maximize(&ws, &conn, WindowId(10)).unwrap();
        assert_eq!(conn.configures().len(), 1);
        conn.take();

        toggle_maximize(&ws, &conn, WindowId(10)).unwrap();
        assert_eq!(ws.maximized(), None);
        assert_eq!(conn.take()[1..], split[..]);
    }

    #[test]
    fn unmaximize_ignores_passed_window() {
        let ws = workspace();
        let conn = RecordingConnection::new();

        toggle_maximize(&ws, &conn, WindowId(2)).unwrap();
        conn.take();

        toggle_maximize(&ws, &conn, WindowId(3)).unwrap();
        assert_eq!(ws.maximized(), None);
        assert_eq!(
            conn.take()[0],
            Request::Configure(WindowId(2), WindowChanges::border(2))
        );
    }

    #[test]
    fn failed_border_restore_still_unmaximizes() {
        let ws = workspace();
        let conn = RecordingConnection::new();
        toggle_maximize(&ws, &conn, WindowId(1)).unwrap();

        conn.fail_configure_when(|_, c| c.x.is_none() && c.border_width.is_some());

        assert_eq!(toggle_maximize(&ws, &conn, WindowId(1)), Ok(()));
        assert_eq!(ws.maximized(), None);
    }

    #[test]
    fn unmanaged_window_is_rejected() {
        let ws = workspace();
        let conn = RecordingConnection::new();

        assert_eq!(
            toggle_maximize(&ws, &conn, WindowId(99)),
            Err(WmError::WindowNotManaged(WindowId(99)))
        );
        assert_eq!(ws.maximized(), None);
        assert!(conn.take().is_empty());
    }

    #[test]
    fn failed_fullscreen_request_keeps_maximized_state() {
        let ws = workspace();
        let conn = RecordingConnection::new();
        conn.fail_configure_when(|_, c| c.raise);

        assert!(toggle_maximize(&ws, &conn, WindowId(1)).is_err());
        assert_eq!(ws.maximized(), Some(WindowId(1)));
    }
}
