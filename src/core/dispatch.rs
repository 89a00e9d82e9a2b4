use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};

use log::{debug, error, warn};

use super::{
    connection::Connection, error::WmError, maximize::toggle_maximize, window::WindowId,
    workspace::Workspace,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// Maximize hotkey pressed while `window` had input focus.
    ToggleMaximize(WindowId),
    Mapped(WindowId),
    Destroyed(WindowId),
    /// Pointer entered `window`.
    Entered(WindowId),
}

/// Routes window manager events to the workspaces. Cloning is cheap; every
/// clone shares the same workspaces and connection.
pub struct Dispatcher<C> {
    conn: Arc<C>,
    workspaces: Arc<[Workspace]>,
    max_columns: usize,
}

impl<C> Clone for Dispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            workspaces: Arc::clone(&self.workspaces),
            max_columns: self.max_columns,
        }
    }
}

impl<C> Dispatcher<C>
where
    C: Connection + 'static,
{
    pub fn new(conn: Arc<C>, workspaces: Vec<Workspace>, max_columns: usize) -> Self {
        Self {
            conn,
            workspaces: workspaces.into(),
            max_columns,
        }
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Handles `event` on a thread of its own.
    ///
    /// Membership changes from `Mapped` and `Destroyed` are applied before
    /// this returns, so they land in the order events are submitted; only the
    /// re-tile that follows runs on the new thread.
    pub fn spawn(&self, event: Event) -> JoinHandle<Result<(), WmError>> {
        let this = self.clone();
        let recorded = match event {
            Event::Mapped(_) | Event::Destroyed(_) => Some(self.record(event)),
            Event::ToggleMaximize(_) | Event::Entered(_) => None,
        };

        thread::spawn(move || {
            let result = match recorded {
                Some(recorded) => recorded.and_then(|ws| this.retile(ws)),
                None => this.handle(event),
            };
            match &result {
                Ok(()) => (),
                Err(WmError::WindowNotManaged(w)) => debug!("{:?}: {} is not managed", event, w),
                Err(e) => warn!("{:?} failed: {}", event, e),
            }
            result
        })
    }

    pub fn handle(&self, event: Event) -> Result<(), WmError> {
        debug!("Handling {:?}", event);

        match event {
            Event::ToggleMaximize(window) => self
                .for_each_active(|ws| toggle_maximize(ws, &*self.conn, window))
                .into_iter()
                .collect(),
            Event::Mapped(_) | Event::Destroyed(_) => {
                let ws = self.record(event)?;
                self.retile(ws)
            }
            Event::Entered(window) => self
                .workspaces
                .iter()
                .find_map(|ws| ws.set_focused(window).ok())
                .ok_or(WmError::WindowNotManaged(window)),
        }
    }

    /// Applies the membership change of a `Mapped` or `Destroyed` event and
    /// returns the index of the workspace that needs re-tiling, if any.
    fn record(&self, event: Event) -> Result<Option<usize>, WmError> {
        match event {
            Event::Mapped(window) => Ok(self.place(window)),
            Event::Destroyed(window) => self.remove(window).map(Some),
            Event::ToggleMaximize(_) | Event::Entered(_) => Ok(None),
        }
    }

    fn retile(&self, workspace: Option<usize>) -> Result<(), WmError> {
        let Some(workspace) = workspace.and_then(|i| self.workspaces.get(i)) else {
            return Ok(());
        };

        match workspace.tile_windows(&*self.conn) {
            Err(WmError::NoColumns) => Ok(()),
            result => result,
        }
    }

    /// Runs `action` on every workspace that reports itself active, one
    /// thread per workspace. Each thread checks activity itself when it runs.
    fn for_each_active<F>(&self, action: F) -> Vec<Result<(), WmError>>
    where
        F: Fn(&Workspace) -> Result<(), WmError> + Sync,
    {
        let conn = &*self.conn;
        let action = &action;

        thread::scope(|s| {
            let handles: Vec<_> = self
                .workspaces
                .iter()
                .map(|ws| {
                    s.spawn(move || {
                        if !ws.is_active(conn) {
                            return None;
                        }
                        Some(action(ws))
                    })
                })
                .collect();

            handles
                .into_iter()
                .filter_map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(_) => {
                        error!("Workspace task panicked");
                        None
                    }
                })
                .collect()
        })
    }

    fn place(&self, window: WindowId) -> Option<usize> {
        let conn = &*self.conn;

        if self.workspaces.iter().any(|ws| ws.contains(window)) {
            return None;
        }

        let Some(index) = self
            .workspaces
            .iter()
            .position(|ws| ws.is_active(conn))
            .or_else(|| (!self.workspaces.is_empty()).then_some(0))
        else {
            warn!("No workspace to place {} on", window);
            return None;
        };

        self.workspaces[index]
            .add_window(window, self.max_columns)
            .then_some(index)
    }

    fn remove(&self, window: WindowId) -> Result<usize, WmError> {
        for (i, workspace) in self.workspaces.iter().enumerate() {
            match workspace.remove_window(window) {
                Ok(()) => return Ok(i),
                Err(WmError::WindowNotManaged(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(WmError::WindowNotManaged(window))
    }
}
