//! HTTP endpoint serving [`ConsoleStats`] as JSON.
//!
//! Uses `tiny_http` on a background thread. Only `GET /stats` returns data;
//! `/` redirects there and everything else is a 404.

use super::ConsoleStats;
use log::{error, info, warn};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Request, Response, Server};

/// How often the server thread checks for shutdown.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Background HTTP stats server. Dropping it stops the thread.
pub struct StatsServer {
    handle: Option<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    port: u16,
}

impl StatsServer {
    /// Start serving on `bind_addr:port` (`None` binds 0.0.0.0).
    ///
    /// Port 0 picks a free port; see [`StatsServer::port`].
    pub fn start(
        bind_addr: Option<IpAddr>,
        port: u16,
        stats: Arc<ConsoleStats>,
    ) -> Result<Self, std::io::Error> {
        let addr = match bind_addr {
            Some(ip) => format!("{}:{}", ip, port),
            None => format!("0.0.0.0:{}", port),
        };

        let server = Server::http(&addr)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::AddrInUse, e.to_string()))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|a| a.port())
            .unwrap_or(port);

        info!("Stats server listening on port {}", port);

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let handle = thread::spawn(move || Self::run_server(server, stats, shutdown_clone));

        Ok(Self {
            handle: Some(handle),
            shutdown,
            port,
        })
    }

    /// Port the server is bound to.
    pub fn port(&self) -> u16 {
        self.port
    }

    fn run_server(server: Server, stats: Arc<ConsoleStats>, shutdown: Arc<AtomicBool>) {
        let content_type = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
            .expect("static header");
        let location = Header::from_bytes(&b"Location"[..], &b"/stats"[..]).expect("static header");
        let allow_get = Header::from_bytes(&b"Allow"[..], &b"GET"[..]).expect("static header");

        while !shutdown.load(Ordering::Acquire) {
            let request = match server.recv_timeout(POLL_INTERVAL) {
                Ok(Some(request)) => request,
                Ok(None) => continue,
                Err(e) => {
                    error!("Stats server error: {}", e);
                    break;
                }
            };

            if request.method() != &Method::Get {
                let response = Response::from_string("Method Not Allowed")
                    .with_status_code(405)
                    .with_header(allow_get.clone());
                respond(request, response);
                continue;
            }

            let response = match request.url() {
                "/stats" | "/stats/" => Response::from_string(stats.to_json())
                    .with_header(content_type.clone())
                    .with_status_code(200),
                "/" => Response::from_string("See /stats for console statistics")
                    .with_status_code(302)
                    .with_header(location.clone()),
                _ => Response::from_string("Not Found").with_status_code(404),
            };
            respond(request, response);
        }

        info!("Stats server shutting down");
    }

    /// Stop the server and wait for its thread.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn respond<R: std::io::Read>(request: Request, response: Response<R>) {
    if let Err(e) = request.respond(response) {
        warn!("Failed to send stats response: {}", e);
    }
}

impl Drop for StatsServer {
    fn drop(&mut self) {
        self.stop();
    }
}
