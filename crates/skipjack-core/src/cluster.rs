//! The cluster identity shared read-only by a started node (§3 Cluster).

use std::collections::BTreeSet;

use uuid::Uuid;

/// Cluster identity and the derived wire secret-key.
///
/// Mutable only while the owning [`crate::node::Node`] is in `stop`
/// status (§3); once started it is treated as shared read-only.
#[derive(Clone, Debug)]
pub struct Cluster {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub namespace: String,
    secret_key: [u8; 32],
    pub cluster_size: u64,
    pub tags: BTreeSet<String>,
}

impl Cluster {
    /// Construct a cluster, deriving `secret-key = SHA-256(secret-token)`
    /// (§3, §6).
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        description: impl Into<String>,
        namespace: impl Into<String>,
        secret_token: &[u8],
        cluster_size: u64,
        tags: BTreeSet<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            namespace: namespace.into(),
            secret_key: skipjack_crypto::kdf::derive_secret_key(secret_token),
            cluster_size,
            tags,
        }
    }

    pub fn secret_key(&self) -> &[u8; 32] {
        &self.secret_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_key_is_derived_from_token() {
        let cluster = Cluster::new(
            Uuid::new_v4(),
            "test",
            "",
            "",
            b"s3cr3t",
            3,
            BTreeSet::new(),
        );
        assert_eq!(
            cluster.secret_key(),
            &skipjack_crypto::kdf::derive_secret_key(b"s3cr3t")
        );
    }
}
