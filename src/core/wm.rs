use anyhow::Result;
use log::{debug, error, info, warn};
use std::{
    process::{Command as ProcessCommand, Stdio},
    sync::Arc,
};
use x11::xlib;

use crate::{
    config::{
        keybind::{lock_variants, Command, MODIFIER_MASK},
        loader::Config,
    },
    utils::x11::Display,
};

use super::{
    dispatch::{Dispatcher, Event},
    window::WindowId,
    workspace::Workspace,
};

struct KeyAction {
    keycode: u8,
    modifiers: u32,
    command: Command,
}

pub struct WindowManager {
    display: Arc<Display>,
    dispatcher: Dispatcher<Display>,
    config: Config,
    keys: Vec<KeyAction>,
    focused: Option<WindowId>,
    running: bool,
}

impl WindowManager {
    pub fn new(config: Config) -> Result<Self> {
        info!("Initializing window manager");

        let display = Arc::new(Display::new()?);

        let border_width = config.appearance.border_width;
        let workspaces: Vec<_> = display
            .screens()
            .into_iter()
            .enumerate()
            .map(|(i, screen)| {
                info!("Workspace {} on screen {:?}", i, screen);
                Workspace::with_screen(i, border_width, screen)
            })
            .collect();

        let dispatcher = Dispatcher::new(
            Arc::clone(&display),
            workspaces,
            config.appearance.columns,
        );

        let keys = Self::setup_key_bindings(&display, &config);

        Ok(Self {
            display,
            dispatcher,
            config,
            keys,
            focused: None,
            running: true,
        })
    }

    fn setup_key_bindings(display: &Display, config: &Config) -> Vec<KeyAction> {
        let mut keys = Vec::with_capacity(config.binds.len());

        for bind in &config.binds {
            let Some(keysym) = config.get_keysym_for_key(&bind.key) else {
                warn!("Unknown key {:?} in bind, skipping", bind.key);
                continue;
            };
            let keycode = display.keycode(keysym);
            if keycode == 0 {
                warn!("No keycode for {:?} on this keyboard, skipping", bind.key);
                continue;
            }
            let modifiers = config.modifier_for(bind);

            let grabbed = lock_variants(modifiers)
                .into_iter()
                .map(|mask| display.grab_key(keycode, mask))
                .collect::<Result<Vec<_>, _>>();
            if let Err(e) = grabbed {
                error!("Failed to grab {:?}: {}", bind.key, e);
                continue;
            }

            keys.push(KeyAction {
                keycode,
                modifiers,
                command: bind.command.clone(),
            });
        }

        keys
    }

    pub fn run(&mut self) -> Result<()> {
        while self.running {
            let event = self.display.next_event();

            match event.get_type() {
                xlib::KeyPress => self.handle_keypress(event),
                xlib::MapRequest => self.handle_map_request(event),
                xlib::ConfigureRequest => self.handle_configure_request(event),
                xlib::DestroyNotify => self.handle_destroy_notify(event),
                xlib::EnterNotify => self.handle_enter_notify(event),
                _ => (),
            }
        }

        info!("Exiting");
        Ok(())
    }

    fn handle_keypress(&mut self, event: xlib::XEvent) {
        let key_event: xlib::XKeyEvent = From::from(event);
        let state = key_event.state & MODIFIER_MASK;

        let Some(command) = self
            .keys
            .iter()
            .find(|k| k.keycode as u32 == key_event.keycode && k.modifiers == state)
            .map(|k| k.command.clone())
        else {
            return;
        };

        debug!("Key command {:?}", command);

        match command {
            Command::Exit => self.running = false,
            Command::Close => {
                if let Some(window) = self.display.focused_window() {
                    if let Err(e) = self.display.close(window) {
                        warn!("Failed to close {}: {}", window, e);
                    }
                }
            }
            Command::Maximize => match self.display.focused_window() {
                Some(window) => {
                    self.dispatcher.spawn(Event::ToggleMaximize(window));
                }
                None => debug!("Nothing focused to maximize"),
            },
            Command::Spawn(cmd) => {
                let mut parts = cmd.split_whitespace();
                let Some(program) = parts.next() else {
                    return;
                };
                if let Err(e) = ProcessCommand::new(program)
                    .args(parts)
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .spawn()
                {
                    error!("Failed to spawn {}: {}", cmd, e);
                }
            }
        }
    }

    fn handle_map_request(&mut self, event: xlib::XEvent) {
        let map_event: xlib::XMapRequestEvent = From::from(event);
        let window = WindowId(map_event.window);

        if let Err(e) = self.display.manage(
            window,
            self.config.appearance.border_width,
            self.config.get_border_color(),
        ) {
            warn!("Failed to map {}: {}", window, e);
            return;
        }

        self.dispatcher.spawn(Event::Mapped(window));
    }

    /// Unmanaged windows get what they ask for; managed ones are tiled.
    fn handle_configure_request(&mut self, event: xlib::XEvent) {
        let request: xlib::XConfigureRequestEvent = From::from(event);
        let window = WindowId(request.window);

        if self
            .dispatcher
            .workspaces()
            .iter()
            .any(|ws| ws.contains(window))
        {
            return;
        }

        if let Err(e) = self.display.forward_configure(&request) {
            debug!("Failed to forward configure request of {}: {}", window, e);
        }
    }

    fn handle_destroy_notify(&mut self, event: xlib::XEvent) {
        let destroy_event: xlib::XDestroyWindowEvent = From::from(event);
        let window = WindowId(destroy_event.window);

        if self.focused == Some(window) {
            self.focused = None;
        }

        self.dispatcher.spawn(Event::Destroyed(window));
    }

    fn handle_enter_notify(&mut self, event: xlib::XEvent) {
        let crossing: xlib::XCrossingEvent = From::from(event);
        let window = WindowId(crossing.window);

        if self.focused == Some(window) {
            return;
        }

        if let Some(previous) = self.focused.take() {
            if let Err(e) = self
                .display
                .set_border_color(previous, self.config.get_border_color())
            {
                debug!("Failed to reset border of {}: {}", previous, e);
            }
        }

        if let Err(e) = self.display.focus(window) {
            warn!("Failed to focus {}: {}", window, e);
            return;
        }
        if let Err(e) = self
            .display
            .set_border_color(window, self.config.get_focused_border_color())
        {
            debug!("Failed to highlight {}: {}", window, e);
        }

        self.focused = Some(window);
        self.dispatcher.spawn(Event::Entered(window));
    }
}
