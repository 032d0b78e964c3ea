//! Adding OTP entries, from a scanned URI or from manually typed fields.

use serde::Serialize;

use crate::totp::core;
use crate::totp::messages::Message;
use crate::totp::storage::SharedOtpUriStore;
use crate::totp::types::*;
use crate::totp::uri::{build_otpauth_uri, OtpUriParser};

/// Outcome of an add attempt, carrying a rendered message either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "message", rename_all = "camelCase")]
pub enum AddOtpResult {
    Success(String),
    Error(String),
}

impl AddOtpResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) => m,
        }
    }
}

/// Validates new entries and writes them to the store.
#[derive(Clone)]
pub struct OtpRegistrar {
    parser: OtpUriParser,
    store: SharedOtpUriStore,
}

impl OtpRegistrar {
    pub fn new(parser: OtpUriParser, store: SharedOtpUriStore) -> Self {
        Self { parser, store }
    }

    /// Parse `otp_uri` and store it verbatim if it is valid and its secret
    /// decodes.
    pub async fn add_uri(&self, otp_uri: &str) -> AddOtpResult {
        let params = match self.parser.parse(otp_uri) {
            Ok(params) => params,
            Err(e) => {
                tracing::info!(kind = ?e.kind, "rejected OTP URI");
                return AddOtpResult::Error(e.message);
            }
        };

        if let Err(e) = core::decode_secret(&params.secret) {
            tracing::info!(kind = ?e.kind, "rejected OTP URI secret");
            return AddOtpResult::Error(self.parser.catalog().render(&Message::InvalidSecret));
        }

        if let Err(e) = self.store.lock().await.add(otp_uri) {
            tracing::error!(kind = ?e.kind, "failed to store OTP URI: {}", e);
            return AddOtpResult::Error(e.message);
        }

        tracing::info!(account = %params.name, issuer = ?params.issuer, "added OTP entry");
        AddOtpResult::Success(
            self.parser
                .catalog()
                .render(&Message::ScanSuccess(&params.name)),
        )
    }

    /// Add an entry from typed fields. `raw_key` is the shared secret as
    /// entered; its bytes are Base32-encoded and default parameters apply.
    pub async fn add_manual(&self, name: &str, issuer: &str, raw_key: &str) -> AddOtpResult {
        let (name, issuer, raw_key) = (name.trim(), issuer.trim(), raw_key.trim());
        if name.is_empty() || issuer.is_empty() || raw_key.is_empty() {
            return AddOtpResult::Error(
                self.parser
                    .catalog()
                    .render(&Message::ManualEntryIncomplete),
            );
        }
        if name.contains(':') || issuer.contains(':') {
            return AddOtpResult::Error(self.parser.catalog().render(&Message::ManualEntryColon));
        }

        let params = OtpParameters::new(name, core::encode_secret(raw_key.as_bytes()))
            .with_issuer(issuer);
        self.add_uri(&build_otpauth_uri(&params)).await
    }
}
