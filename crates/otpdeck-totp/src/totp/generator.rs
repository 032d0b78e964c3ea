//! Password generators bound to one account and a time source.

use std::sync::Arc;

use crate::totp::clock::TimeProvider;
use crate::totp::core;
use crate::totp::types::*;

/// Produces the current code for one account.
pub trait PasswordGenerator: Send + Sync {
    fn generate(&self) -> Result<String, TotpError>;
}

/// Creates a [`PasswordGenerator`] for parsed parameters.
pub trait PasswordGeneratorFactory: Send + Sync {
    fn generator_for(&self, params: &OtpParameters) -> Result<Box<dyn PasswordGenerator>, TotpError>;
}

/// RFC 6238 generator. The secret is decoded once, at construction.
pub struct TotpGenerator {
    key: Vec<u8>,
    params: OtpParameters,
    clock: Arc<dyn TimeProvider>,
}

impl std::fmt::Debug for TotpGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TotpGenerator")
            .field("name", &self.params.name)
            .field("period", &self.params.period)
            .field("digits", &self.params.digits)
            .field("algorithm", &self.params.algorithm)
            .finish_non_exhaustive()
    }
}

impl TotpGenerator {
    pub fn new(params: OtpParameters, clock: Arc<dyn TimeProvider>) -> Result<Self, TotpError> {
        params.validate()?;
        let key = core::decode_secret(&params.secret)?;
        Ok(Self { key, params, clock })
    }

    pub fn params(&self) -> &OtpParameters {
        &self.params
    }

    /// Code for an explicit timestamp, ignoring the clock.
    pub fn generate_at(&self, unix_seconds: u64) -> Result<String, TotpError> {
        core::totp_with_key(&self.key, &self.params, unix_seconds)
    }
}

impl PasswordGenerator for TotpGenerator {
    fn generate(&self) -> Result<String, TotpError> {
        self.generate_at(self.clock.now_unix_seconds())
    }
}

/// Builds [`TotpGenerator`]s sharing one clock.
#[derive(Clone)]
pub struct TotpGeneratorFactory {
    clock: Arc<dyn TimeProvider>,
}

impl TotpGeneratorFactory {
    pub fn new(clock: Arc<dyn TimeProvider>) -> Self {
        Self { clock }
    }
}

impl PasswordGeneratorFactory for TotpGeneratorFactory {
    fn generator_for(&self, params: &OtpParameters) -> Result<Box<dyn PasswordGenerator>, TotpError> {
        Ok(Box::new(TotpGenerator::new(params.clone(), Arc::clone(&self.clock))?))
    }
}
