//! Leader-facing and follower-facing RPC surfaces: mTLS-terminated,
//! newline-delimited JSON-RPC. These surfaces authorize the peer
//! certificate before a request is ever handed to the `RpcModule`, which
//! jsonrpsee's own HTTP transport has no hook for — the player-facing
//! surface in `gateway.rs` stays on plain jsonrpsee-over-HTTP since token
//! auth happens inside the handler instead of at the transport layer.

use std::sync::Arc;

use chess_core::{Error, Result};
use jsonrpsee::RpcModule;
use rustls::{ClientConfig, ServerConfig, ServerName};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::{TlsAcceptor, TlsConnector};
use tracing::{info, warn};

use crate::tls::{parse_peer_identity, PeerIdentity};

pub type Authorizer = Arc<dyn Fn(&PeerIdentity) -> Result<()> + Send + Sync>;

pub async fn serve<Ctx: Send + Sync + 'static>(
    addr: String,
    tls_config: Arc<ServerConfig>,
    module: RpcModule<Ctx>,
    authorize: Authorizer,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    let acceptor = TlsAcceptor::from(tls_config);
    info!(%addr, "internal mTLS rpc surface listening");

    loop {
        let (tcp, peer_addr) = listener.accept().await?;
        let acceptor = acceptor.clone();
        let module = module.clone();
        let authorize = Arc::clone(&authorize);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(tcp, acceptor, module, authorize).await {
                warn!(%peer_addr, error = %e, "internal rpc connection ended with an error");
            }
        });
    }
}

async fn handle_connection<Ctx: Send + Sync + 'static>(
    tcp: tokio::net::TcpStream,
    acceptor: TlsAcceptor,
    module: RpcModule<Ctx>,
    authorize: Authorizer,
) -> anyhow::Result<()> {
    let tls_stream = acceptor.accept(tcp).await?;
    let (_, session) = tls_stream.get_ref();

    let peer_certs = session
        .peer_certificates()
        .ok_or_else(|| anyhow::anyhow!("no peer certificate presented"))?;
    let leaf = peer_certs
        .first()
        .ok_or_else(|| anyhow::anyhow!("empty peer certificate chain"))?;
    let identity = parse_peer_identity(&leaf.0)?;
    authorize(&identity).map_err(|e: Error| anyhow::anyhow!("peer rejected: {e}"))?;

    info!(common_name = %identity.common_name, "internal peer authorized");

    let (read_half, mut write_half) = tokio::io::split(tls_stream);
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let (response, _) = module.raw_json_rpc(&line, usize::MAX).await?;
        write_half.write_all(response.as_bytes()).await?;
        write_half.write_all(b"\n").await?;
    }
    Ok(())
}

/// Client side of the same protocol: used by a Follower to call a Leader's
/// leader-facing surface (`AddSlave`, forwarded writes), and could equally
/// dial a Follower's follower-facing surface to push a broadcast.
pub async fn call(
    addr: &str,
    tls_config: Arc<ClientConfig>,
    server_name: &str,
    request_json: &str,
) -> anyhow::Result<String> {
    let tcp = TcpStream::connect(addr).await?;
    let connector = TlsConnector::from(tls_config);
    let name = ServerName::try_from(server_name)
        .map_err(|_| anyhow::anyhow!("invalid tls server name {server_name}"))?;
    let mut stream = connector.connect(name, tcp).await?;

    stream.write_all(request_json.as_bytes()).await?;
    stream.write_all(b"\n").await?;

    let (read_half, _) = tokio::io::split(stream);
    let mut lines = BufReader::new(read_half).lines();
    lines
        .next_line()
        .await?
        .ok_or_else(|| anyhow::anyhow!("connection closed before a response arrived"))
}
