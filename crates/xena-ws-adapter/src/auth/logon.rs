/*
[INPUT]:  API key id, authorized accounts and a LogonSigner
[OUTPUT]: Signed Logon messages for the trading handshake
[POS]:    Auth layer - builds the time-varying login request
[UPDATE]: When the logon payload format changes
*/

use std::sync::Arc;

use crate::codec::{self, KeyMode};
use crate::commands::now_nanos;
use crate::error::Result;
use crate::types::{Logon, MsgType};

use super::signer::LogonSigner;

const AUTH_PREFIX: &str = "AUTH";

/// Payload signed at logon: `"AUTH"` followed by the nanosecond timestamp
pub fn auth_payload(timestamp_nanos: i64) -> String {
    format!("{AUTH_PREFIX}{timestamp_nanos}")
}

/// Produces a fresh signed Logon for every handshake
#[derive(Clone)]
pub struct LogonBuilder {
    api_key: String,
    accounts: Vec<u64>,
    signer: Arc<dyn LogonSigner>,
}

impl std::fmt::Debug for LogonBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogonBuilder")
            .field("api_key", &self.api_key)
            .field("accounts", &self.accounts)
            .finish_non_exhaustive()
    }
}

impl LogonBuilder {
    pub fn new(api_key: impl Into<String>, accounts: Vec<u64>, signer: Arc<dyn LogonSigner>) -> Self {
        Self {
            api_key: api_key.into(),
            accounts,
            signer,
        }
    }

    pub fn build_at(&self, timestamp_nanos: i64) -> Result<Logon> {
        let payload = auth_payload(timestamp_nanos);
        let password = self.signer.sign(payload.as_bytes())?;

        Ok(Logon {
            msg_type: MsgType::Logon,
            username: self.api_key.clone(),
            password,
            raw_data: payload,
            sending_time: timestamp_nanos,
            account: self.accounts.clone(),
            ..Default::default()
        })
    }

    pub fn build(&self) -> Result<Logon> {
        self.build_at(now_nanos())
    }

    /// Compact-encoded logon text, ready to send
    pub fn encode(&self) -> Result<String> {
        codec::encode(&self.build()?, KeyMode::Compact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MockLogonSigner;
    use serde_json::{Value, json};

    #[test]
    fn test_build_at() {
        let builder = LogonBuilder::new("key-id", vec![1, 2], Arc::new(MockLogonSigner::new("sig")));
        let logon = builder.build_at(1_561_000_000_000_000_000).unwrap();
        assert_eq!(logon.raw_data, "AUTH1561000000000000000");
        assert_eq!(logon.sending_time, 1_561_000_000_000_000_000);
        assert_eq!(logon.username, "key-id");
        assert_eq!(logon.password, "sig");
        assert_eq!(logon.account, vec![1, 2]);
    }

    #[test]
    fn test_encode_uses_tags() {
        let builder = LogonBuilder::new("key-id", Vec::new(), Arc::new(MockLogonSigner::new("sig")));
        let value: Value = serde_json::from_str(&builder.encode().unwrap()).unwrap();
        assert_eq!(value["35"], json!("A"));
        assert_eq!(value["553"], json!("key-id"));
        assert_eq!(value["554"], json!("sig"));
        assert!(value["96"].as_str().unwrap().starts_with("AUTH"));
        assert!(value.get("1").is_none());
    }
}
