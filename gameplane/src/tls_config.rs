//! Loads the certificate material shared by every internal mTLS surface:
//! each game node presents the same cert/key pair as both a client (when
//! calling a peer) and a server (when accepting a peer's connection), and
//! trusts the same CA bundle to verify the other side.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use rustls::server::AllowAnyAuthenticatedClient;
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore, ServerConfig};

fn load_certs(path: &Path) -> anyhow::Result<Vec<Certificate>> {
    let mut reader = BufReader::new(File::open(path)?);
    Ok(rustls_pemfile::certs(&mut reader)?
        .into_iter()
        .map(Certificate)
        .collect())
}

fn load_private_key(path: &Path) -> anyhow::Result<PrivateKey> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut keys = rustls_pemfile::pkcs8_private_keys(&mut reader)?;
    let key = keys
        .pop()
        .ok_or_else(|| anyhow::anyhow!("no pkcs8 private key found in {}", path.display()))?;
    Ok(PrivateKey(key))
}

fn load_root_store(ca_bundle: &Path) -> anyhow::Result<RootCertStore> {
    let mut store = RootCertStore::empty();
    for cert in load_certs(ca_bundle)? {
        store.add(&cert)?;
    }
    Ok(store)
}

pub fn load_server_config(
    cert: &Path,
    key: &Path,
    ca_bundle: &Path,
) -> anyhow::Result<Arc<ServerConfig>> {
    let certs = load_certs(cert)?;
    let private_key = load_private_key(key)?;
    let roots = load_root_store(ca_bundle)?;
    let verifier = AllowAnyAuthenticatedClient::new(roots);

    let config = ServerConfig::builder()
        .with_safe_defaults()
        .with_client_cert_verifier(Arc::new(verifier))
        .with_single_cert(certs, private_key)?;
    Ok(Arc::new(config))
}

pub fn load_client_config(
    cert: &Path,
    key: &Path,
    ca_bundle: &Path,
) -> anyhow::Result<Arc<ClientConfig>> {
    let certs = load_certs(cert)?;
    let private_key = load_private_key(key)?;
    let roots = load_root_store(ca_bundle)?;

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_client_auth_cert(certs, private_key)?;
    Ok(Arc::new(config))
}
