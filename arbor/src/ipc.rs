//! The unix socket `arborc` talks to. A connection either sends commands and reads the replies
//! or subscribes to hooks with an idle request.

use std::{
    collections::HashMap,
    io::{self, ErrorKind, Read, Write},
    os::unix::net::{UnixListener, UnixStream},
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use polling::{Event, Poller};

use common::{encode_hook, Request, RequestDecoder};

use crate::states::WMState;

/// Poller key of the listening socket, connections get the keys after it
pub(crate) const LISTENER_KEY: usize = 1;

struct Connection {
    stream: UnixStream,
    decoder: RequestDecoder,
    /// Subscribed to hooks
    idle: bool,
}

impl Connection {
    /// Replies are small, a blocking write keeps them in one piece
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.set_nonblocking(false)?;
        let result = self.stream.write_all(bytes);
        self.stream.set_nonblocking(true)?;
        result
    }
}

pub(crate) struct Server {
    listener: UnixListener,
    path: PathBuf,
    connections: HashMap<usize, Connection>,
    next_key: usize,
}

impl Server {
    /// Listen at `path`. A stale socket is replaced, a live one means another instance runs.
    pub(crate) fn bind(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            if UnixStream::connect(path).is_ok() {
                bail!("Another instance is already listening at {:?}", path);
            }
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove the stale socket {:?}", path))?;
        }
        let listener = UnixListener::bind(path)
            .with_context(|| format!("Failed to listen at {:?}", path))?;
        listener.set_nonblocking(true)?;
        log::info!("listening at {:?}", path);
        Ok(Self {
            listener,
            path: path.to_path_buf(),
            connections: HashMap::new(),
            next_key: LISTENER_KEY + 1,
        })
    }

    pub(crate) fn register(&self, poller: &Poller) -> io::Result<()> {
        poller.add(&self.listener, Event::readable(LISTENER_KEY))
    }

    /// Something happened on the source with `key`, the listener or one of the connections
    pub(crate) fn handle(
        &mut self,
        key: usize,
        state: &mut WMState,
        poller: &Poller,
    ) -> io::Result<()> {
        if key == LISTENER_KEY {
            self.accept(poller)?;
            return poller.modify(&self.listener, Event::readable(LISTENER_KEY));
        }
        if self.serve(key, state) {
            if let Some(conn) = self.connections.get(&key) {
                poller.modify(&conn.stream, Event::readable(key))?;
            }
        } else if let Some(conn) = self.connections.remove(&key) {
            poller.delete(&conn.stream)?;
        }
        Ok(())
    }

    fn accept(&mut self, poller: &Poller) -> io::Result<()> {
        loop {
            let stream = match self.listener.accept() {
                Ok((stream, _)) => stream,
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                Err(e) => return Err(e),
            };
            stream.set_nonblocking(true)?;
            let key = self.next_key;
            self.next_key += 1;
            poller.add(&stream, Event::readable(key))?;
            self.connections.insert(
                key,
                Connection {
                    stream,
                    decoder: RequestDecoder::new(),
                    idle: false,
                },
            );
        }
    }

    /// Read what the connection sent and answer the complete requests. Returns false once the
    /// connection is done.
    fn serve(&mut self, key: usize, state: &mut WMState) -> bool {
        let conn = match self.connections.get_mut(&key) {
            Some(conn) => conn,
            None => return false,
        };
        let mut open = true;
        let mut chunk = [0; 4096];
        loop {
            match conn.stream.read(&mut chunk) {
                Ok(0) => {
                    open = false;
                    break;
                }
                Ok(n) => conn.decoder.feed(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::debug!("reading from a client failed: {}", e);
                    return false;
                }
            }
        }
        loop {
            match conn.decoder.next_request() {
                Ok(Some(Request::Call(args))) => {
                    let reply = state.call(&args);
                    if let Err(e) = conn.send(&reply.encode()) {
                        log::debug!("client went away before the reply: {}", e);
                        return false;
                    }
                }
                Ok(Some(Request::Idle)) => conn.idle = true,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("dropping a client: {}", e);
                    return false;
                }
            }
        }
        if !open && conn.decoder.has_partial() {
            log::debug!("client closed the connection in the middle of a request");
        }
        // idle clients stay until they hang up, callers until they stop sending
        open
    }

    /// Hand the hooks to every idle subscriber, subscribers that can't take them are dropped
    pub(crate) fn broadcast(&mut self, hooks: &[Vec<String>], poller: &Poller) {
        if hooks.is_empty() {
            return;
        }
        let mut gone = Vec::new();
        for (key, conn) in self.connections.iter_mut().filter(|(_, c)| c.idle) {
            for hook in hooks {
                if conn.send(&encode_hook(hook)).is_err() {
                    gone.push(*key);
                    break;
                }
            }
        }
        for key in gone {
            if let Some(conn) = self.connections.remove(&key) {
                let _ = poller.delete(&conn.stream);
            }
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("failed to remove {:?}: {}", self.path, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        io::{BufRead, BufReader},
        time::Duration,
    };

    use common::{decode_hook, read_reply};

    use super::*;
    use crate::{display::mock::MockDisplay, rect::Rect};

    fn socket(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("arbor-test-{}-{}.sock", name, std::process::id()))
    }

    fn state() -> WMState {
        let display = MockDisplay::new(vec![Rect::new(0, 0, 800, 600)]);
        WMState::new(Box::new(display), PathBuf::from("/nonexistent"), false)
    }

    /// Run the server until nothing happens for a while
    fn pump(server: &mut Server, state: &mut WMState, poller: &Poller) {
        let mut events = Vec::new();
        loop {
            events.clear();
            poller
                .wait(&mut events, Some(Duration::from_millis(200)))
                .unwrap();
            if events.is_empty() {
                break;
            }
            for ev in &events {
                server.handle(ev.key, state, poller).unwrap();
            }
            let hooks = state.take_hooks();
            server.broadcast(&hooks, poller);
        }
    }

    #[test]
    fn calls_get_replies() {
        let path = socket("call");
        let mut server = Server::bind(&path).unwrap();
        let poller = Poller::new().unwrap();
        server.register(&poller).unwrap();
        let mut state = state();

        let mut client = UnixStream::connect(&path).unwrap();
        let args = vec!["echo".to_string(), "hello".to_string()];
        client.write_all(&Request::Call(args).encode()).unwrap();
        pump(&mut server, &mut state, &poller);

        let reply = read_reply(&mut client).unwrap();
        assert_eq!(reply.stdout, "hello\n");
        assert_eq!(reply.status, 0);
    }

    #[test]
    fn idle_clients_hear_hooks() {
        let path = socket("idle");
        let mut server = Server::bind(&path).unwrap();
        let poller = Poller::new().unwrap();
        server.register(&poller).unwrap();
        let mut state = state();

        let mut idle = UnixStream::connect(&path).unwrap();
        idle.write_all(&Request::Idle.encode()).unwrap();
        pump(&mut server, &mut state, &poller);

        let mut caller = UnixStream::connect(&path).unwrap();
        let args = ["emit_hook", "ping", "pong"].map(String::from).to_vec();
        caller.write_all(&Request::Call(args).encode()).unwrap();
        pump(&mut server, &mut state, &poller);
        assert_eq!(read_reply(&mut caller).unwrap().status, 0);

        idle.set_read_timeout(Some(Duration::from_secs(1))).unwrap();
        let hook = BufReader::new(idle)
            .lines()
            .map(|line| decode_hook(&line.unwrap()))
            .find(|hook| hook[0] == "ping");
        assert_eq!(hook, Some(vec!["ping".to_string(), "pong".to_string()]));
    }

    #[test]
    fn live_sockets_are_not_taken_over() {
        let path = socket("live");
        let _server = Server::bind(&path).unwrap();
        assert!(Server::bind(&path).is_err());
    }
}
