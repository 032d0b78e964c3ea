//! Core OTP generation: RFC 4226 (HOTP) and RFC 6238 (TOTP).
//!
//! HMAC-based one-time passwords with SHA-1, SHA-256 and SHA-512, time-step
//! calculation and Base32 secret handling.

use crate::totp::types::*;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use sha2::{Sha256, Sha512};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Raw HMAC-OTP (RFC 4226 §5.3)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Compute an HOTP code for the given raw key bytes and counter.
pub fn hotp_raw(key: &[u8], counter: u64, digits: u32, algo: Algorithm) -> Result<String, TotpError> {
    let hmac_result = compute_hmac(key, &counter.to_be_bytes(), algo)?;
    Ok(truncate(&hmac_result, digits))
}

fn compute_hmac(key: &[u8], data: &[u8], algo: Algorithm) -> Result<Vec<u8>, TotpError> {
    fn mac_over<M: Mac>(mut mac: M, data: &[u8]) -> Vec<u8> {
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }

    let invalid_key = |_| TotpError::new(TotpErrorKind::InvalidSecret, "HMAC rejected the key");
    Ok(match algo {
        Algorithm::Sha1 => mac_over(Hmac::<Sha1>::new_from_slice(key).map_err(invalid_key)?, data),
        Algorithm::Sha256 => mac_over(Hmac::<Sha256>::new_from_slice(key).map_err(invalid_key)?, data),
        Algorithm::Sha512 => mac_over(Hmac::<Sha512>::new_from_slice(key).map_err(invalid_key)?, data),
    })
}

/// Dynamic truncation per RFC 4226 §5.3.
fn truncate(hmac_result: &[u8], digits: u32) -> String {
    let offset = (hmac_result[hmac_result.len() - 1] & 0x0f) as usize;
    let binary = ((hmac_result[offset] as u64 & 0x7f) << 24)
        | ((hmac_result[offset + 1] as u64) << 16)
        | ((hmac_result[offset + 2] as u64) << 8)
        | (hmac_result[offset + 3] as u64);
    let modulus = 10u64.saturating_pow(digits);
    let code = binary % modulus;
    format!("{:0>width$}", code, width = digits as usize)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TOTP (time-based, RFC 6238)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn zero_period() -> TotpError {
    TotpError::new(TotpErrorKind::InvalidPeriod, "Period must be greater than zero")
}

/// Compute the time-step counter for a given unix timestamp.
pub fn time_step_at(unix_seconds: u64, period: u64) -> Result<u64, TotpError> {
    unix_seconds.checked_div(period).ok_or_else(zero_period)
}

/// Seconds remaining until the step containing `unix_seconds` expires.
pub fn seconds_remaining_at(unix_seconds: u64, period: u64) -> Result<u64, TotpError> {
    let elapsed = unix_seconds.checked_rem(period).ok_or_else(zero_period)?;
    Ok(period - elapsed)
}

/// Generate a TOTP code from already-decoded key bytes.
pub fn totp_with_key(key: &[u8], params: &OtpParameters, unix_seconds: u64) -> Result<String, TotpError> {
    params.validate()?;
    let step = time_step_at(unix_seconds, params.period)?;
    hotp_raw(key, step, params.digits, params.algorithm)
}

/// Generate the TOTP code for `params` at an explicit unix timestamp.
pub fn generate_totp_at(params: &OtpParameters, unix_seconds: u64) -> Result<String, TotpError> {
    let key = decode_secret(&params.secret)?;
    totp_with_key(&key, params, unix_seconds)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Secrets
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode a base-32 secret (spaces/dashes ignored, case-insensitive, padding optional).
pub fn decode_secret(b32: &str) -> Result<Vec<u8>, TotpError> {
    let cleaned: String = b32
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '='))
        .collect::<String>()
        .to_uppercase();
    if cleaned.is_empty() {
        return Err(TotpError::new(TotpErrorKind::InvalidSecret, "Secret is empty"));
    }
    base32::decode(base32::Alphabet::Rfc4648 { padding: false }, &cleaned)
        .filter(|key| !key.is_empty())
        .ok_or_else(|| TotpError::new(TotpErrorKind::InvalidSecret, "Invalid base-32 secret"))
}

/// Encode raw bytes to base-32 (no padding, uppercase).
pub fn encode_secret(bytes: &[u8]) -> String {
    base32::encode(base32::Alphabet::Rfc4648 { padding: false }, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 6238 Appendix B seeds, base-32 encoded.
    const SEED_SHA1: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ";
    const SEED_SHA256: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZA====";
    const SEED_SHA512: &str = "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQGEZDGNA=";

    fn rfc_params(seed: &str, algo: Algorithm) -> OtpParameters {
        OtpParameters::new("rfc", seed).with_digits(8).with_algorithm(algo)
    }

    #[test]
    fn rfc4226_hotp_vectors() {
        let key = decode_secret(SEED_SHA1).unwrap();
        let expected = [
            "755224", "287082", "359152", "969429", "338314",
            "254676", "287922", "162583", "399871", "520489",
        ];
        for (counter, exp) in expected.iter().enumerate() {
            let code = hotp_raw(&key, counter as u64, 6, Algorithm::Sha1).unwrap();
            assert_eq!(&code, exp, "HOTP mismatch at counter {}", counter);
        }
    }

    #[test]
    fn rfc6238_totp_vectors() {
        let cases: [(u64, &str, &str, &str); 6] = [
            (59, "94287082", "46119246", "90693936"),
            (1111111109, "07081804", "68084774", "25091201"),
            (1111111111, "14050471", "67062674", "99943326"),
            (1234567890, "89005924", "91819424", "93441116"),
            (2000000000, "69279037", "90698825", "38618901"),
            (20000000000, "65353130", "77737706", "47863826"),
        ];
        for (t, sha1, sha256, sha512) in cases {
            assert_eq!(generate_totp_at(&rfc_params(SEED_SHA1, Algorithm::Sha1), t).unwrap(), sha1);
            assert_eq!(generate_totp_at(&rfc_params(SEED_SHA256, Algorithm::Sha256), t).unwrap(), sha256);
            assert_eq!(generate_totp_at(&rfc_params(SEED_SHA512, Algorithm::Sha512), t).unwrap(), sha512);
        }
    }

    #[test]
    fn period_boundary_switches_code() {
        let params = OtpParameters::new("alice", "JBSWY3DPEHPK3PXP");
        assert_eq!(generate_totp_at(&params, 0).unwrap(), "282760");
        assert_eq!(generate_totp_at(&params, 29).unwrap(), "282760");
        assert_eq!(generate_totp_at(&params, 30).unwrap(), "996554");
        assert_eq!(generate_totp_at(&params, 59).unwrap(), "996554");
        assert_eq!(generate_totp_at(&params, 60).unwrap(), "602287");
    }

    #[test]
    fn custom_period_changes_step() {
        let params = OtpParameters::new("alice", "JBSWY3DPEHPK3PXP").with_period(60);
        assert_eq!(generate_totp_at(&params, 59).unwrap(), "282760");
        assert_eq!(generate_totp_at(&params, 60).unwrap(), "996554");
    }

    #[test]
    fn generation_is_deterministic() {
        let params = OtpParameters::new("alice", "JBSWY3DPEHPK3PXP");
        let a = generate_totp_at(&params, 1_700_000_000).unwrap();
        let b = generate_totp_at(&params, 1_700_000_000).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "324550");
    }

    #[test]
    fn code_is_zero_padded_to_digits() {
        let params = rfc_params(SEED_SHA1, Algorithm::Sha1);
        let code = generate_totp_at(&params, 1111111109).unwrap();
        assert_eq!(code.len(), 8);
        assert!(code.starts_with('0'));
        let ten = generate_totp_at(&params.with_digits(10), 59).unwrap();
        assert_eq!(ten.len(), 10);
    }

    #[test]
    fn invalid_parameters_rejected() {
        let params = OtpParameters::new("a", "JBSWY3DPEHPK3PXP").with_period(0);
        assert_eq!(
            generate_totp_at(&params, 10).unwrap_err().kind,
            TotpErrorKind::InvalidPeriod
        );
    }

    #[test]
    fn time_helpers() {
        assert_eq!(time_step_at(59, 30).unwrap(), 1);
        assert_eq!(time_step_at(60, 30).unwrap(), 2);
        assert_eq!(seconds_remaining_at(0, 30).unwrap(), 30);
        assert_eq!(seconds_remaining_at(29, 30).unwrap(), 1);
    }

    #[test]
    fn time_helpers_reject_zero_period() {
        assert_eq!(time_step_at(10, 0).unwrap_err().kind, TotpErrorKind::InvalidPeriod);
        assert_eq!(seconds_remaining_at(10, 0).unwrap_err().kind, TotpErrorKind::InvalidPeriod);
    }

    #[test]
    fn decode_secret_is_lenient() {
        let canonical = decode_secret("JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(decode_secret("jbsw y3dp-ehpk 3pxp").unwrap(), canonical);
        assert_eq!(canonical, b"Hello!\xde\xad\xbe\xef".to_vec());
    }

    #[test]
    fn decode_secret_rejects_garbage() {
        assert_eq!(decode_secret("").unwrap_err().kind, TotpErrorKind::InvalidSecret);
        assert_eq!(decode_secret("!!!!").unwrap_err().kind, TotpErrorKind::InvalidSecret);
        assert_eq!(decode_secret("1890").unwrap_err().kind, TotpErrorKind::InvalidSecret);
    }

    #[test]
    fn encode_decode_secret() {
        let raw = b"12345678901234567890";
        assert_eq!(encode_secret(raw), SEED_SHA1);
        assert_eq!(decode_secret(&encode_secret(raw)).unwrap(), raw.to_vec());
    }
}
