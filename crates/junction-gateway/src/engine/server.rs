//! Gateway listener: accepts connections and hands every request to the
//! engine.

use super::handler::Engine;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// The interception surface: every request on this listener goes through
/// the dispatcher.
pub struct GatewayServer {
    listener: TcpListener,
    engine: Arc<Engine>,
}

impl GatewayServer {
    /// Bind the listener up front so address errors surface at startup,
    /// not inside the accept loop.
    pub async fn bind(addr: SocketAddr, engine: Arc<Engine>) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, engine })
    }

    /// The bound address (useful when binding to port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Run the accept loop until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), anyhow::Error> {
        info!("Gateway listening on http://{}", self.listener.local_addr()?);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, _addr)) => {
                            let engine = Arc::clone(&self.engine);
                            tokio::spawn(async move {
                                let io = TokioIo::new(stream);
                                let service = service_fn(move |req| {
                                    let engine = Arc::clone(&engine);
                                    async move {
                                        Ok::<_, Infallible>(engine.handle(req).await)
                                    }
                                });
                                if let Err(e) = http1::Builder::new()
                                    .serve_connection(io, service)
                                    .await
                                {
                                    debug!("Gateway connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Gateway accept error: {}", e);
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Gateway listener shutting down");
                    return Ok(());
                }
            }
        }
    }
}
