//! Core types for the TOTP authenticator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default TOTP step length in seconds.
pub const DEFAULT_PERIOD: u64 = 30;
/// Default number of digits in a generated code.
pub const DEFAULT_DIGITS: u32 = 6;
/// A 31-bit truncated HMAC value never has more than ten decimal digits.
pub const MAX_DIGITS: u32 = 10;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for HMAC-based OTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    #[default]
    Sha1,
    Sha256,
    Sha512,
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri_name())
    }
}

impl Algorithm {
    /// Parse the exact `algorithm=` value of an `otpauth://` URI.
    pub fn from_uri_name(s: &str) -> Option<Self> {
        match s {
            "SHA1" => Some(Self::Sha1),
            "SHA256" => Some(Self::Sha256),
            "SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// URI-safe name for `otpauth://` parameters.
    pub fn uri_name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP parameters
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Everything needed to generate codes for one account, as carried by an
/// `otpauth://totp/...` URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpParameters {
    /// Account name (e.g. "user@example.com").
    pub name: String,
    /// Issuer (e.g. "GitHub"), from the label prefix or the `issuer` parameter.
    pub issuer: Option<String>,
    /// Base-32 encoded shared secret.
    pub secret: String,
    /// Time step in seconds.
    pub period: u64,
    /// Number of digits in the generated code.
    pub digits: u32,
    /// Hash algorithm.
    pub algorithm: Algorithm,
}

impl OtpParameters {
    /// Parameters with default period, digits and algorithm.
    pub fn new(name: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            issuer: None,
            secret: secret.into(),
            period: DEFAULT_PERIOD,
            digits: DEFAULT_DIGITS,
            algorithm: Algorithm::default(),
        }
    }

    /// Builder: set issuer.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Builder: set time period.
    pub fn with_period(mut self, period: u64) -> Self {
        self.period = period;
        self
    }

    /// Builder: set digit count.
    pub fn with_digits(mut self, digits: u32) -> Self {
        self.digits = digits;
        self
    }

    /// Builder: set algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Check the `period > 0` and `0 < digits <= 10` invariants.
    pub fn validate(&self) -> Result<(), TotpError> {
        if self.period == 0 {
            return Err(TotpError::new(
                TotpErrorKind::InvalidPeriod,
                "Period must be greater than zero",
            ));
        }
        if self.digits == 0 || self.digits > MAX_DIGITS {
            return Err(TotpError::new(
                TotpErrorKind::InvalidDigits,
                format!("Digits must be between 1 and {MAX_DIGITS}"),
            ));
        }
        Ok(())
    }

    /// Display name: "Issuer (name)" or just "name".
    pub fn display_name(&self) -> String {
        match &self.issuer {
            Some(iss) if !iss.is_empty() => format!("{} ({})", iss, self.name),
            _ => self.name.clone(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TotpErrorKind {
    MalformedUri,
    MissingScheme,
    InvalidScheme,
    MissingType,
    InvalidType,
    MissingLabel,
    InvalidLabel,
    MissingSecret,
    MissingIssuer,
    IssuerMismatch,
    InvalidAlgorithm,
    InvalidPeriod,
    InvalidDigits,
    InvalidSecret,
    InvalidInput,
    Storage,
    Serialization,
}

/// Crate-level error. `message` is already rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{message}")]
pub struct TotpError {
    pub kind: TotpErrorKind,
    pub message: String,
}

impl TotpError {
    pub fn new(kind: TotpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
        }
    }

    /// Whether this error came out of `otpauth://` URI parsing.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self.kind,
            TotpErrorKind::MalformedUri
                | TotpErrorKind::MissingScheme
                | TotpErrorKind::InvalidScheme
                | TotpErrorKind::MissingType
                | TotpErrorKind::InvalidType
                | TotpErrorKind::MissingLabel
                | TotpErrorKind::InvalidLabel
                | TotpErrorKind::MissingSecret
                | TotpErrorKind::MissingIssuer
                | TotpErrorKind::IssuerMismatch
                | TotpErrorKind::InvalidAlgorithm
                | TotpErrorKind::InvalidPeriod
                | TotpErrorKind::InvalidDigits
        )
    }
}

impl From<TotpError> for String {
    fn from(e: TotpError) -> String {
        e.to_string()
    }
}

impl From<std::io::Error> for TotpError {
    fn from(e: std::io::Error) -> Self {
        TotpError::new(TotpErrorKind::Storage, e.to_string())
    }
}

impl From<serde_json::Error> for TotpError {
    fn from(e: serde_json::Error) -> Self {
        TotpError::new(TotpErrorKind::Serialization, e.to_string())
    }
}
