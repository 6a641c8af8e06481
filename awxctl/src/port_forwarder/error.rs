use std::net::SocketAddr;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to bind TCP socket {socket_address}, error: {source}"))]
    BindTcpSocket { socket_address: SocketAddr, source: std::io::Error },

    #[snafu(display("Failed to forward to port {port} of pod {pod_name}, error: {source}"))]
    CreatePodStream {
        pod_name: String,
        port: u16,
        #[snafu(source(from(kube::Error, Box::new)))]
        source: Box<kube::Error>,
    },

    /// The API server accepted the request but handed back no stream.
    #[snafu(display("No stream for port {port} of pod {pod_name}"))]
    MissingPodStream { pod_name: String, port: u16 },
}
