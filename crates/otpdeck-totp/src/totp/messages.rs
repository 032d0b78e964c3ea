//! User-facing text. The host owns the wording (and any localisation) through
//! [`MessageCatalog`]; the rest of the crate only names which message to show.

/// Every message the TOTP subsystem can surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<'a> {
    MalformedUri,
    MissingScheme,
    InvalidScheme(&'a str),
    MissingType,
    InvalidType(&'a str),
    MissingLabel,
    InvalidLabel,
    MissingSecret,
    MissingIssuerArgument,
    IssuerMismatch,
    InvalidAlgorithm,
    InvalidPeriod,
    InvalidDigits,
    /// The secret is not valid Base32.
    InvalidSecret,
    /// An entry for the named account was stored.
    ScanSuccess(&'a str),
    /// Manual entry was submitted with an empty field.
    ManualEntryIncomplete,
    /// Manual entry name or issuer contains the label separator.
    ManualEntryColon,
}

/// Renders [`Message`]s into display strings.
pub trait MessageCatalog: Send + Sync {
    fn render(&self, message: &Message<'_>) -> String;
}

/// Built-in English strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishCatalog;

impl MessageCatalog for EnglishCatalog {
    fn render(&self, message: &Message<'_>) -> String {
        match message {
            Message::MalformedUri => "OTP URI could not be parsed".to_string(),
            Message::MissingScheme => "OTP URI is missing a scheme".to_string(),
            Message::InvalidScheme(scheme) => {
                format!("Invalid OTP URI scheme '{scheme}', expected 'otpauth'")
            }
            Message::MissingType => "OTP URI is missing the OTP type".to_string(),
            Message::InvalidType(kind) => {
                format!("Unsupported OTP type '{kind}', only 'totp' is supported")
            }
            Message::MissingLabel => "OTP URI is missing the account label".to_string(),
            Message::InvalidLabel => {
                "OTP URI label must be 'name' or 'issuer:name'".to_string()
            }
            Message::MissingSecret => "OTP URI is missing the required 'secret' parameter".to_string(),
            Message::MissingIssuerArgument => "OTP URI 'issuer' parameter is empty".to_string(),
            Message::IssuerMismatch => {
                "OTP URI issuer in label does not match the 'issuer' parameter".to_string()
            }
            Message::InvalidAlgorithm => {
                "OTP URI algorithm must be SHA1, SHA256 or SHA512".to_string()
            }
            Message::InvalidPeriod => "OTP URI period must be a positive number of seconds".to_string(),
            Message::InvalidDigits => "OTP URI digits must be a number between 1 and 10".to_string(),
            Message::InvalidSecret => "OTP URI secret is not valid Base32".to_string(),
            Message::ScanSuccess(name) => format!("Added one-time password for {name}"),
            Message::ManualEntryIncomplete => "All fields are required".to_string(),
            Message::ManualEntryColon => "Name and issuer cannot contain ':'".to_string(),
        }
    }
}
