//! `otpauth://` URI parsing and generation per the key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Format: `otpauth://totp/ISSUER:NAME?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30`
//!
//! Only the `totp` type is accepted. Absent optional parameters take their
//! defaults; present-but-malformed ones are rejected.

use std::collections::HashMap;
use std::sync::Arc;

use crate::totp::messages::{EnglishCatalog, Message, MessageCatalog};
use crate::totp::types::*;

const OTP_SCHEME: &str = "otpauth";
const TOTP: &str = "totp";
const SECRET: &str = "secret";
const ISSUER: &str = "issuer";
const PERIOD: &str = "period";
const DIGITS: &str = "digits";
const ALGORITHM: &str = "algorithm";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parses `otpauth://totp/...` URIs into [`OtpParameters`], rendering failure
/// messages through the host's [`MessageCatalog`].
#[derive(Clone)]
pub struct OtpUriParser {
    catalog: Arc<dyn MessageCatalog>,
}

impl Default for OtpUriParser {
    fn default() -> Self {
        Self::new(Arc::new(EnglishCatalog))
    }
}

impl OtpUriParser {
    pub fn new(catalog: Arc<dyn MessageCatalog>) -> Self {
        Self { catalog }
    }

    /// Catalog used for error messages; shared with callers that report results.
    pub fn catalog(&self) -> &Arc<dyn MessageCatalog> {
        &self.catalog
    }

    fn error(&self, kind: TotpErrorKind, message: Message<'_>) -> TotpError {
        TotpError::new(kind, self.catalog.render(&message))
    }

    /// Parse an `otpauth://totp/` URI string.
    pub fn parse(&self, otp_uri: &str) -> Result<OtpParameters, TotpError> {
        let url = match url::Url::parse(otp_uri) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                return Err(self.error(TotpErrorKind::MissingScheme, Message::MissingScheme));
            }
            Err(e) => {
                tracing::debug!(error = %e, "otpauth URI failed to parse");
                return Err(self.error(TotpErrorKind::MalformedUri, Message::MalformedUri));
            }
        };

        if url.scheme() != OTP_SCHEME {
            return Err(self.error(
                TotpErrorKind::InvalidScheme,
                Message::InvalidScheme(url.scheme()),
            ));
        }

        match url.host_str() {
            None | Some("") => {
                return Err(self.error(TotpErrorKind::MissingType, Message::MissingType));
            }
            Some(TOTP) => {}
            Some(other) => {
                return Err(self.error(TotpErrorKind::InvalidType, Message::InvalidType(other)));
            }
        }

        let (mut issuer, name) = self.parse_label(url.path())?;

        // First occurrence of each key wins.
        let mut params: HashMap<String, String> = HashMap::new();
        for (key, value) in url.query_pairs() {
            params
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }

        let secret = match params.get(SECRET) {
            Some(secret) if !secret.is_empty() => secret.clone(),
            _ => return Err(self.error(TotpErrorKind::MissingSecret, Message::MissingSecret)),
        };

        if let Some(issuer_param) = params.get(ISSUER) {
            if issuer_param.is_empty() {
                return Err(self.error(TotpErrorKind::MissingIssuer, Message::MissingIssuerArgument));
            }
            match &issuer {
                Some(label_issuer) if label_issuer != issuer_param => {
                    return Err(self.error(TotpErrorKind::IssuerMismatch, Message::IssuerMismatch));
                }
                _ => issuer = Some(issuer_param.clone()),
            }
        }

        let period = match params.get(PERIOD) {
            None => DEFAULT_PERIOD,
            Some(raw) => match raw.parse::<u64>() {
                Ok(p) if p > 0 => p,
                _ => return Err(self.error(TotpErrorKind::InvalidPeriod, Message::InvalidPeriod)),
            },
        };

        let digits = match params.get(DIGITS) {
            None => DEFAULT_DIGITS,
            Some(raw) => match raw.parse::<u32>() {
                Ok(d) if d > 0 && d <= MAX_DIGITS => d,
                _ => return Err(self.error(TotpErrorKind::InvalidDigits, Message::InvalidDigits)),
            },
        };

        let algorithm = match params.get(ALGORITHM) {
            None => Algorithm::default(),
            Some(raw) => Algorithm::from_uri_name(raw).ok_or_else(|| {
                self.error(TotpErrorKind::InvalidAlgorithm, Message::InvalidAlgorithm)
            })?,
        };

        Ok(OtpParameters {
            name,
            issuer,
            secret,
            period,
            digits,
            algorithm,
        })
    }

    /// Split the path into `(issuer, name)`.
    fn parse_label(&self, path: &str) -> Result<(Option<String>, String), TotpError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(self.error(TotpErrorKind::MissingLabel, Message::MissingLabel));
        }
        let decoded = urlencoding::decode(trimmed)
            .map_err(|_| self.error(TotpErrorKind::InvalidLabel, Message::InvalidLabel))?;

        let segments: Vec<&str> = decoded.split(':').collect();
        match segments.as_slice() {
            [name] => Ok((None, (*name).to_string())),
            [issuer, name] => Ok((Some((*issuer).to_string()), (*name).to_string())),
            _ => Err(self.error(TotpErrorKind::InvalidLabel, Message::InvalidLabel)),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build an `otpauth://totp/` URI. Defaults (SHA1, 6 digits, 30 s) are omitted.
///
/// A `:` inside the issuer or name is percent-encoded, but the parser decodes
/// the label before splitting it, so such values do not survive a round trip.
pub fn build_otpauth_uri(params: &OtpParameters) -> String {
    let name = urlencoding::encode(&params.name);
    let label = match &params.issuer {
        Some(iss) if !iss.is_empty() => format!("{}:{}", urlencoding::encode(iss), name),
        _ => name.into_owned(),
    };

    let mut query = vec![format!("{SECRET}={}", urlencoding::encode(&params.secret))];
    if let Some(iss) = params.issuer.as_deref().filter(|i| !i.is_empty()) {
        query.push(format!("{ISSUER}={}", urlencoding::encode(iss)));
    }
    if params.algorithm != Algorithm::Sha1 {
        query.push(format!("{ALGORITHM}={}", params.algorithm.uri_name()));
    }
    if params.digits != DEFAULT_DIGITS {
        query.push(format!("{DIGITS}={}", params.digits));
    }
    if params.period != DEFAULT_PERIOD {
        query.push(format!("{PERIOD}={}", params.period));
    }

    format!("{OTP_SCHEME}://{TOTP}/{label}?{}", query.join("&"))
}
