mod autostart;
mod color;
mod commands;
mod config;
mod decimal;
mod display;
mod errors;
mod frame;
mod hook;
mod ipc;
mod keys;
mod mouse;
mod newtypes;
mod object;
mod rect;
mod rules;
mod settings;
mod stack;
mod states;
mod theme;
mod x11;

#[cfg(test)]
mod tests;

use std::time::Duration;

use anyhow::Context;
use flexi_logger::{colored_default_format, Logger, WriteMode};
use polling::{Event, Poller};
use structopt::StructOpt;

use config::Config;
use ipc::Server;
use states::WMState;
use x11::X11Display;

/// Poller key of the X connection
const X11_KEY: usize = 0;
/// Exited children and attribute watchers are checked at least this often
const IDLE_TIMEOUT: Duration = Duration::from_millis(500);

fn main() -> anyhow::Result<()> {
    let config = Config::from_args();
    let _logger = Logger::try_with_env_or_str(config.log_spec())?
        .format(colored_default_format)
        .write_mode(WriteMode::Async)
        .start()
        .context("Failed to set up logging")?;

    let mut display = X11Display::connect()?;
    // We are the window manager!
    display
        .scan_windows()
        .context("Error while looking for pre-existing windows")?;
    let x11_fd = display.fd();

    let socket = common::socket_path();
    let mut server = Server::bind(&socket)?;
    // the autostart and everything spawned finds us through this
    std::env::set_var(common::SOCKET_ENV, &socket);

    let mut state = WMState::new(
        Box::new(display),
        config.autostart_path(),
        !config.no_tag_import,
    );
    state.settings.verbose = config.verbose;
    if config.locked {
        state.lock();
    }
    state.run_autostart();

    let poller = Poller::new().context("Failed to create the poller")?;
    poller.add(x11_fd, Event::readable(X11_KEY))?;
    server.register(&poller)?;
    // events from poller go here
    let mut events = Vec::new();

    while state.running {
        // Replies to our own requests can carry events along, drain them all before sleeping
        loop {
            let display_events = state.display.next_events();
            if display_events.is_empty() {
                break;
            }
            state.handle_events(display_events);
        }
        state.reap_children();
        let hooks = state.take_hooks();
        server.broadcast(&hooks, &poller);
        state.display.flush();

        events.clear();
        poller.wait(&mut events, Some(IDLE_TIMEOUT))?;
        // Sources are oneshot, each has to be re-armed after it fired
        for ev in &events {
            if ev.key == X11_KEY {
                poller.modify(x11_fd, Event::readable(X11_KEY))?;
            } else if let Err(e) = server.handle(ev.key, &mut state, &poller) {
                log::warn!("socket error: {}", e);
            }
        }
    }

    log::info!("shutting down");
    Ok(())
}
