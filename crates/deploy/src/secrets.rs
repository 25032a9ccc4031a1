//! Deployer credential resolution.
//!
//! Secrets come from an explicit [`Environment`] value injected at
//! construction time, never from scattered `std::env::var` calls, so unit
//! tests can run against a fake environment. The key material itself is held
//! only in process memory and never appears in errors, logs, or `Debug`
//! output: malformed keys are reported by presence and length alone.

use std::collections::HashMap;

use alloy_core::primitives::{Address, keccak256};
use k256::ecdsa::SigningKey;

use crate::error::DeployError;

/// Environment variable holding the deployer private key: exactly 64 hex
/// characters, no `0x` prefix.
pub const DEPLOYER_KEY_VAR: &str = "CASTOR_DEPLOYER_KEY";
/// Optional block-explorer API key, forwarded to verification tooling.
pub const EXPLORER_KEY_VAR: &str = "CASTOR_EXPLORER_API_KEY";

/// A snapshot of the variables the resolver is allowed to read.
#[derive(Clone, Default)]
pub struct Environment {
    vars: HashMap<String, String>,
}

/// Variable names only; the values may include the deployer key.
impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.vars.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("Environment").field("vars", &names).finish()
    }
}

impl Environment {
    /// Capture the real process environment.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    /// Build an environment from explicit pairs, for tests.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }
}

/// The deployer credential: an opaque signing key plus its derived address.
///
/// Created once per run, dropped at process exit. Only the address is
/// printable.
pub struct Credential {
    signing_key: SigningKey,
    address: Address,
    explorer_api_key: Option<String>,
}

impl Credential {
    /// The signer address derived from the private key.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The raw signing key, for chain clients that sign locally.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Block-explorer API key, if one was configured.
    pub fn explorer_api_key(&self) -> Option<&str> {
        self.explorer_api_key.as_deref()
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("signing_key", &"<redacted>")
            .field("explorer_api_key", &self.explorer_api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Resolves deployer credentials from the injected environment, failing
/// closed on anything missing or malformed.
#[derive(Debug, Clone)]
pub struct SecretResolver {
    env: Environment,
}

impl SecretResolver {
    pub fn new(env: Environment) -> Self {
        Self { env }
    }

    /// Resolve the deployer credential.
    pub fn resolve(&self) -> Result<Credential, DeployError> {
        let raw = self
            .env
            .get(DEPLOYER_KEY_VAR)
            .ok_or_else(|| DeployError::SecretMissing {
                var: DEPLOYER_KEY_VAR.to_string(),
            })?;

        // A 0x prefix fails the length check; the stored form is bare hex.
        if raw.len() != 64 || !raw.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(DeployError::SecretMalformed {
                var: DEPLOYER_KEY_VAR.to_string(),
                length: raw.len(),
            });
        }

        let mut key_bytes = [0u8; 32];
        hex::decode_to_slice(raw, &mut key_bytes).map_err(|_| DeployError::SecretMalformed {
            var: DEPLOYER_KEY_VAR.to_string(),
            length: raw.len(),
        })?;

        let signing_key =
            SigningKey::from_bytes(&key_bytes.into()).map_err(|_| DeployError::SecretMalformed {
                var: DEPLOYER_KEY_VAR.to_string(),
                length: raw.len(),
            })?;

        let address = derive_address(&signing_key);

        let explorer_api_key = self
            .env
            .get(EXPLORER_KEY_VAR)
            .filter(|v| !v.is_empty())
            .map(String::from);

        tracing::debug!(signer = %address, "Resolved deployer credential");

        Ok(Credential {
            signing_key,
            address,
            explorer_api_key,
        })
    }
}

/// Derive the Ethereum address from a signing key: keccak-256 of the
/// uncompressed public key (without the 0x04 marker byte), last 20 bytes.
fn derive_address(signing_key: &SigningKey) -> Address {
    let public_key_point = signing_key.verifying_key().to_encoded_point(false);
    let hash = keccak256(&public_key_point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    // secp256k1 private key 0x...01; its address is a fixed point of the
    // derivation and easy to cross-check with any wallet tool.
    const KEY_ONE: &str = "0000000000000000000000000000000000000000000000000000000000000001";
    const KEY_ONE_ADDRESS: &str = "0x7E5F4552091A69125d5DfCb7b8C2659029395Bdf";

    fn resolver(vars: Vec<(&str, &str)>) -> SecretResolver {
        SecretResolver::new(Environment::from_vars(vars))
    }

    #[test]
    fn test_resolve_derives_signer_address() {
        let credential = resolver(vec![(DEPLOYER_KEY_VAR, KEY_ONE)]).resolve().unwrap();
        assert_eq!(
            credential.address(),
            KEY_ONE_ADDRESS.parse::<Address>().unwrap()
        );
        assert!(credential.explorer_api_key().is_none());
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(
            resolver(vec![]).resolve(),
            Err(DeployError::SecretMissing { .. })
        ));
    }

    #[test]
    fn test_malformed_key_reports_length_only() {
        let prefixed = format!("0x{KEY_ONE}");
        let cases = [
            ("abc123", 6),
            (prefixed.as_str(), 66),
            ("zz5f4552091a69125d5dfcb7b8c2659029395bdf7e5f4552091a69125d5df37f", 64),
        ];

        for (raw, expected_len) in cases {
            let err = resolver(vec![(DEPLOYER_KEY_VAR, raw)]).resolve().unwrap_err();
            let DeployError::SecretMalformed { length, .. } = err else {
                panic!("expected SecretMalformed for '{raw}'");
            };
            assert_eq!(length, expected_len);
        }
    }

    #[test]
    fn test_errors_never_echo_the_secret() {
        let err = resolver(vec![(DEPLOYER_KEY_VAR, "deadbeef")])
            .resolve()
            .unwrap_err();
        assert!(!err.to_string().contains("deadbeef"));
    }

    #[test]
    fn test_debug_output_redacts_key_material() {
        let credential = resolver(vec![
            (DEPLOYER_KEY_VAR, KEY_ONE),
            (EXPLORER_KEY_VAR, "explorer-secret"),
        ])
        .resolve()
        .unwrap();

        let debug = format!("{credential:?}");
        assert!(!debug.contains(KEY_ONE));
        assert!(!debug.contains("explorer-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_environment_debug_lists_names_not_values() {
        let env = Environment::from_vars(vec![
            (DEPLOYER_KEY_VAR, KEY_ONE),
            (EXPLORER_KEY_VAR, "explorer-secret"),
        ]);

        let debug = format!("{env:?}");
        assert!(debug.contains(DEPLOYER_KEY_VAR));
        assert!(!debug.contains(KEY_ONE));
        assert!(!debug.contains("explorer-secret"));
    }

    #[test]
    fn test_empty_explorer_key_treated_as_absent() {
        let credential = resolver(vec![(DEPLOYER_KEY_VAR, KEY_ONE), (EXPLORER_KEY_VAR, "")])
            .resolve()
            .unwrap();
        assert!(credential.explorer_api_key().is_none());
    }
}
