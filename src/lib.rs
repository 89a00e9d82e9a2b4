pub mod core {
    pub mod column;
    pub mod connection;
    pub mod dispatch;
    pub mod error;
    pub mod maximize;
    pub mod window;
    pub mod wm;
    pub mod workspace;

    #[cfg(test)]
    pub(crate) mod testing;
}

pub mod utils {
    pub mod x11;
}

pub mod config {
    pub mod appearance;
    pub mod command;
    pub mod keybind;
    pub mod loader;
}

pub use config::loader::Config;
pub use core::{
    dispatch::{Dispatcher, Event},
    error::{ProtocolError, WmError},
    window::WindowId,
    wm::WindowManager,
    workspace::Workspace,
};
