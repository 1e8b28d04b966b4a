/*
[INPUT]:  API key id, private credential, authorized accounts
[OUTPUT]: Signed Logon messages and signing errors
[POS]:    Auth layer - handles trading session authentication
[UPDATE]: When auth flow or signature methods change
*/

pub mod logon;
pub mod signer;

pub use logon::{LogonBuilder, auth_payload};
pub use signer::{Ed25519LogonSigner, LogonSigner, MockLogonSigner};
