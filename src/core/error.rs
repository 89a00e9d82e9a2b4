use thiserror::Error;

use super::window::WindowId;

/// Failure of a single request to the X server.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("X request {request} on window {window} failed with error code {code}")]
    Request {
        request: &'static str,
        window: WindowId,
        code: u8,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WmError {
    #[error("workspace has no screen attached")]
    NoScreenAttached,

    #[error("workspace has no columns to tile")]
    NoColumns,

    #[error("window {0} is not managed by this workspace")]
    WindowNotManaged(WindowId),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
