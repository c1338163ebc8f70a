//! Admin API server.

use crate::admin::router::route_request;
use crate::rules::RuleStore;
use crate::trace::MemorySink;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// Admin API server for rule-set management and trace inspection.
pub struct AdminServer {
    listener: TcpListener,
    store: Arc<RuleStore>,
    traces: Arc<MemorySink>,
}

impl AdminServer {
    pub async fn bind(
        addr: SocketAddr,
        store: Arc<RuleStore>,
        traces: Arc<MemorySink>,
    ) -> Result<Self, anyhow::Error> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            store,
            traces,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.listener.local_addr()
    }

    /// Run the admin API server until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), anyhow::Error> {
        info!("Admin API listening on http://{}", self.listener.local_addr()?);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let io = TokioIo::new(stream);
                            let store = Arc::clone(&self.store);
                            let traces = Arc::clone(&self.traces);

                            tokio::spawn(async move {
                                let service = service_fn(move |req| {
                                    let store = Arc::clone(&store);
                                    let traces = Arc::clone(&traces);
                                    async move { route_request(req, store, traces).await }
                                });

                                if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                                    debug!("Admin API connection error: {}", e);
                                }
                            });
                        }
                        Err(e) => {
                            error!("Admin API accept error: {}", e);
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!("Admin API shutting down");
                    return Ok(());
                }
            }
        }
    }
}
