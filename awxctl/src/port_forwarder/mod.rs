//! Local TCP listener relaying every accepted connection to one port of a
//! pod, in the manner of `kubectl port-forward`.

mod error;

use std::{future::Future, net::SocketAddr};

use k8s_openapi::api::core::v1::Pod;
use kube::Api;
use snafu::{OptionExt, ResultExt};
use tokio::{
    net::{TcpListener, TcpStream},
    task::JoinSet,
};
use tokio_util::sync::CancellationToken;

pub use self::error::Error;

/// Forwards a local TCP address to `pod_port` of one pod.
pub struct PortForwarder {
    pods: Api<Pod>,
    pod_name: String,
    pod_port: u16,
    local_address: SocketAddr,
}

impl PortForwarder {
    /// Nothing is bound until [`PortForwarder::run`] is called.
    pub fn new(
        pods: Api<Pod>,
        pod_name: impl Into<String>,
        pod_port: u16,
        local_address: SocketAddr,
    ) -> Self {
        Self { pods, pod_name: pod_name.into(), pod_port, local_address }
    }

    /// Accepts connections until `shutdown_signal` resolves, then closes the
    /// open ones and returns.
    ///
    /// `on_ready` is called with the bound address once the listener is up,
    /// which differs from the requested one when port `0` was asked for.
    ///
    /// A failing connection is logged and does not stop the listener.
    ///
    /// # Errors
    ///
    /// Returns `Error::BindTcpSocket` when `local_address` cannot be bound.
    pub async fn run<S, R>(self, shutdown_signal: S, on_ready: R) -> Result<(), Error>
    where
        S: Future<Output = ()> + Send + Unpin + 'static,
        R: FnOnce(SocketAddr),
    {
        let Self { pods, pod_name, pod_port, local_address } = self;

        let listener = TcpListener::bind(local_address)
            .await
            .with_context(|_| error::BindTcpSocketSnafu { socket_address: local_address })?;
        let bound_address = listener
            .local_addr()
            .with_context(|_| error::BindTcpSocketSnafu { socket_address: local_address })?;
        tracing::info!("Forwarding from {bound_address} -> {pod_name}:{pod_port}");
        on_ready(bound_address);

        let cancel_token = CancellationToken::new();
        let mut connections = JoinSet::new();
        let mut shutdown_signal = shutdown_signal;

        loop {
            tokio::select! {
                () = &mut shutdown_signal => break,
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        tracing::info!("Handling connection for {}", bound_address.port());
                        let connection = Connection {
                            pods: pods.clone(),
                            pod_name: pod_name.clone(),
                            pod_port,
                            cancel_token: cancel_token.child_token(),
                        };
                        let _handle = connections.spawn(connection.relay(stream, peer));
                    }
                    Err(err) => tracing::warn!("Failed to accept connection on {bound_address}, error: {err}"),
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    log_finished(finished);
                }
            }
        }

        drop(listener);
        cancel_token.cancel();
        tracing::debug!("Closing {} open connection(s)", connections.len());
        while let Some(finished) = connections.join_next().await {
            log_finished(finished);
        }

        tracing::info!("Stopped forwarding from {bound_address}");
        Ok(())
    }
}

fn log_finished(finished: Result<Result<(), Error>, tokio::task::JoinError>) {
    match finished {
        Ok(Ok(())) => {}
        Ok(Err(err)) => tracing::error!("{err}"),
        Err(err) => tracing::error!("Connection task failed, error: {err}"),
    }
}

struct Connection {
    pods: Api<Pod>,
    pod_name: String,
    pod_port: u16,
    cancel_token: CancellationToken,
}

impl Connection {
    async fn relay(self, mut local: TcpStream, peer: SocketAddr) -> Result<(), Error> {
        let Self { pods, pod_name, pod_port, cancel_token } = self;

        let mut forwarder = pods
            .portforward(&pod_name, &[pod_port])
            .await
            .with_context(|_| error::CreatePodStreamSnafu { pod_name: pod_name.clone(), port: pod_port })?;
        let mut upstream = forwarder
            .take_stream(pod_port)
            .with_context(|| error::MissingPodStreamSnafu { pod_name: pod_name.clone(), port: pod_port })?;

        tokio::select! {
            () = cancel_token.cancelled() => {
                tracing::debug!("Closing connection from {peer}");
            }
            copied = tokio::io::copy_bidirectional(&mut local, &mut upstream) => match copied {
                Ok((sent, received)) => {
                    tracing::debug!("Connection from {peer} closed, {sent} bytes sent, {received} bytes received");
                }
                Err(err) => tracing::debug!("Connection from {peer} closed with error: {err}"),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;

    fn pods() -> Api<Pod> {
        let config = kube::Config::new("http://127.0.0.1:9".parse().unwrap());
        let client = kube::Client::try_from(config).unwrap();
        Api::namespaced(client, "awx")
    }

    fn localhost(port: u16) -> SocketAddr { SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port) }

    #[tokio::test]
    async fn test_reports_bound_address_and_stops_on_shutdown() {
        let (shutdown, signal) = tokio::sync::oneshot::channel::<()>();
        let signal = Box::pin(async move {
            let _unused = signal.await;
        });

        let forwarder = PortForwarder::new(pods(), "awx-demo-web-0", 8052, localhost(0));
        forwarder
            .run(signal, move |address| {
                assert_eq!(address.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
                assert_ne!(address.port(), 0);
                shutdown.send(()).unwrap();
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_port_in_use() {
        let occupied = std::net::TcpListener::bind(localhost(0)).unwrap();
        let address = occupied.local_addr().unwrap();

        let forwarder = PortForwarder::new(pods(), "awx-demo-web-0", 8052, address);
        let err = forwarder.run(Box::pin(std::future::pending()), |_| {}).await.unwrap_err();
        assert!(matches!(err, Error::BindTcpSocket { socket_address, .. } if socket_address == address));
    }
}
