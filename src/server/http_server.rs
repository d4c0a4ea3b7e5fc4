use super::connection::handle_connection;
use crate::ids::ConnectionId;
use crate::router::Router;
use crate::static_files::FileStore;
use may::coroutine::{self, JoinHandle};
use may::net::{TcpListener, TcpStream};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Settings fixed for the lifetime of a running server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Base directory for `/files/` reads and writes
    pub files_dir: PathBuf,
    /// Read deadline applied to every accepted socket; `None` waits forever
    pub read_timeout: Option<Duration>,
    /// Stack size for connection coroutines in bytes
    pub stack_size: usize,
}

impl ServerConfig {
    pub fn new<P: Into<PathBuf>>(files_dir: P) -> Self {
        Self {
            files_dir: files_dir.into(),
            read_timeout: None,
            stack_size: crate::runtime_config::DEFAULT_STACK_SIZE,
        }
    }
}

/// Accept loop that hands each connection to its own coroutine.
///
/// Workers share nothing but the read-only router and the file store root.
pub struct HttpServer {
    router: Arc<Router>,
    store: Arc<FileStore>,
    config: ServerConfig,
}

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it,
/// or joining the listener coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<io::Result<()>>,
}

impl ServerHandle {
    /// Address the listener is actually bound to (resolves port `0`).
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// Polls the server address by attempting TCP connections until successful.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` error if the server doesn't become ready within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if std::net::TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop the server
    ///
    /// Cancels the listener coroutine and waits for it to finish. Connections
    /// already handed to workers run to completion.
    pub fn stop(self) {
        // SAFETY: may::CoroutineHandle::coroutine().cancel() is marked unsafe by the may runtime.
        // The handle is valid (we own it) and cancellation is the intended shutdown path.
        unsafe {
            self.handle.coroutine().cancel();
        }
        let _ = self.handle.join();
    }

    /// Block until the listener coroutine exits.
    ///
    /// # Errors
    ///
    /// Returns the accept error that stopped the listener, or an error if the
    /// listener coroutine panicked.
    pub fn join(self) -> io::Result<()> {
        self.handle
            .join()
            .map_err(|e| io::Error::other(format!("listener panicked: {e:?}")))?
    }
}

impl HttpServer {
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            router: Arc::new(Router::new()),
            store: Arc::new(FileStore::new(config.files_dir.clone())),
            config,
        }
    }

    /// Bind `addr` and start accepting connections
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be resolved or bound, or the
    /// listener coroutine cannot be spawned.
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "invalid address"))?;
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;

        info!(
            addr = %addr,
            files_dir = %self.config.files_dir.display(),
            read_timeout = ?self.config.read_timeout,
            "starting server on {addr}"
        );

        // SAFETY: may::coroutine::Builder::spawn() is marked unsafe by the may runtime.
        // The closure owns everything it touches (Send + 'static) and the runtime
        // is configured before start() is called.
        let handle = unsafe {
            coroutine::Builder::new()
                .name("minihttpd-listener".to_string())
                .spawn(move || self.accept_loop(listener))
        }?;

        Ok(ServerHandle { addr, handle })
    }

    /// Accept until the listener fails. An accept error is fatal to the
    /// server and is returned through [`ServerHandle::join`].
    fn accept_loop(self, listener: TcpListener) -> io::Result<()> {
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => self.spawn_worker(stream),
                Err(e) => {
                    error!(error = %e, "Error accepting connection");
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn spawn_worker(&self, stream: TcpStream) {
        let connection_id = ConnectionId::new();
        let peer = stream.peer_addr().ok();

        if let Err(e) = stream.set_read_timeout(self.config.read_timeout) {
            warn!(connection_id = %connection_id, error = %e, "Failed to set read timeout");
        }

        let router = Arc::clone(&self.router);
        let store = Arc::clone(&self.store);

        // SAFETY: see `start`; the worker owns the stream, router and store handles.
        let spawned = unsafe {
            coroutine::Builder::new()
                .stack_size(self.config.stack_size)
                .spawn(move || {
                    debug!(connection_id = %connection_id, peer = ?peer, "Connection accepted");
                    match handle_connection(stream, &router, &store, connection_id) {
                        Ok(()) => {}
                        Err(err) if err.is_protocol_error() => {
                            warn!(
                                connection_id = %connection_id,
                                state = %err.state(),
                                error = %err,
                                "Malformed request, closing connection"
                            );
                        }
                        Err(err) => {
                            error!(
                                connection_id = %connection_id,
                                state = %err.state(),
                                error = %err,
                                "error handling connection"
                            );
                        }
                    }
                    debug!(connection_id = %connection_id, "Connection closed");
                })
        };

        // The closure (and the stream it owns) is dropped on failure, which
        // closes the connection.
        if let Err(e) = spawned {
            error!(
                connection_id = %connection_id,
                error = %e,
                stack_size = self.config.stack_size,
                "Failed to spawn connection coroutine"
            );
        }
    }
}
