pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Write raw bytes, then read until the server closes the socket.
    pub fn send_raw(addr: &SocketAddr, req: &[u8]) -> Vec<u8> {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        buf
    }

    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        String::from_utf8_lossy(&send_raw(addr, req.as_bytes())).to_string()
    }
}

pub mod test_server {
    use minihttpd::server::{HttpServer, ServerConfig, ServerHandle};
    use std::net::SocketAddr;
    use std::sync::Once;
    use std::time::Duration;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// Test fixture with automatic teardown: stops the server and removes
    /// the scratch directory on drop.
    pub struct TestServer {
        handle: Option<ServerHandle>,
        pub addr: SocketAddr,
        pub dir: tempfile::TempDir,
    }

    impl TestServer {
        pub fn start() -> Self {
            Self::start_with_timeout(None)
        }

        pub fn start_with_timeout(read_timeout: Option<Duration>) -> Self {
            setup_may_runtime();
            let dir = tempfile::tempdir().unwrap();
            let mut config = ServerConfig::new(dir.path());
            config.read_timeout = read_timeout;
            let handle = HttpServer::new(config).start("127.0.0.1:0").unwrap();
            handle.wait_ready().unwrap();
            let addr = handle.local_addr();
            Self {
                handle: Some(handle),
                addr,
                dir,
            }
        }
    }

    impl Drop for TestServer {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }
}
