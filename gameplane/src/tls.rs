use chess_core::{Error, Result};
use x509_parser::prelude::*;

/// The fixed SAN role tags defined by the spec's certificate conventions.
pub mod role {
    pub const GAMESERVER: &str = "gameserver";
    pub const GAMEMASTER: &str = "gamemaster";
    pub const GAMESLAVE: &str = "gameslave";
    pub const PLAYERREGISTRAR: &str = "playerregistrar";
    pub const ADMIN: &str = "admin";
    pub const INTERNAL: &str = "internal";
}

/// What `authorize_peer` needs from an mTLS handshake: the leaf
/// certificate's CN (used as the follower-id / master-id) and the SAN
/// DNSName set (used for role tags and the game-id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    pub common_name: String,
    pub sans: Vec<String>,
}

impl PeerIdentity {
    pub fn has_role(&self, role: &str) -> bool {
        self.sans.iter().any(|s| s == role)
    }

    pub fn has_game_id(&self, game_id: &str) -> bool {
        self.sans.iter().any(|s| s == game_id)
    }
}

/// Parses the leaf certificate of a verified mTLS chain into a
/// `PeerIdentity`. The chain has already passed rustls's own chain
/// verification against the configured CA bundle by the time this runs;
/// this only extracts the fields handlers authorize against.
pub fn parse_peer_identity(leaf_der: &[u8]) -> Result<PeerIdentity> {
    let (_, cert) = X509Certificate::from_der(leaf_der)
        .map_err(|e| Error::Unauthenticated(format!("failed to parse peer certificate: {e}")))?;

    let common_name = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .ok_or_else(|| Error::Unauthenticated("peer certificate has no common name".into()))?
        .to_string();

    let mut sans = Vec::new();
    if let Ok(Some(ext)) = cert.subject_alternative_name() {
        for name in &ext.value.general_names {
            if let GeneralName::DNSName(dns) = name {
                sans.push(dns.to_string());
            }
        }
    }

    Ok(PeerIdentity { common_name, sans })
}

/// Leader-facing authorization: peer must carry the `internal` or
/// `gameslave` role tag, plus a SAN matching this game's id, and a
/// non-empty common name (used as the follower-id).
pub fn authorize_leader_facing(identity: &PeerIdentity, game_id: &str) -> Result<()> {
    if identity.common_name.is_empty() {
        return Err(Error::PermissionDenied(
            "peer certificate common name is empty".into(),
        ));
    }
    if !(identity.has_role(role::INTERNAL) || identity.has_role(role::GAMESLAVE)) {
        return Err(Error::PermissionDenied(
            "peer certificate lacks the internal or gameslave role".into(),
        ));
    }
    if !identity.has_game_id(game_id) {
        return Err(Error::PermissionDenied(format!(
            "peer certificate does not carry game id {game_id}"
        )));
    }
    Ok(())
}

/// Follower-facing authorization: peer common name must equal the
/// master-id this follower recorded during `AddSlave`.
pub fn authorize_follower_facing(identity: &PeerIdentity, expected_master_id: &str) -> Result<()> {
    if identity.common_name != expected_master_id {
        return Err(Error::PermissionDenied(format!(
            "peer common name {} does not match recorded master id {expected_master_id}",
            identity.common_name
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(cn: &str, sans: &[&str]) -> PeerIdentity {
        PeerIdentity {
            common_name: cn.to_string(),
            sans: sans.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn leader_facing_requires_role_and_game_id() {
        let good = identity("follower-1", &[role::INTERNAL, "game-42"]);
        assert!(authorize_leader_facing(&good, "game-42").is_ok());

        let wrong_game = identity("follower-1", &[role::INTERNAL, "game-99"]);
        assert!(authorize_leader_facing(&wrong_game, "game-42").is_err());

        let no_role = identity("follower-1", &["game-42"]);
        assert!(authorize_leader_facing(&no_role, "game-42").is_err());
    }

    #[test]
    fn follower_facing_requires_matching_common_name() {
        let identity = identity("leader-1", &[role::GAMEMASTER]);
        assert!(authorize_follower_facing(&identity, "leader-1").is_ok());
        assert!(authorize_follower_facing(&identity, "leader-2").is_err());
    }
}
