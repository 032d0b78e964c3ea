//! TOTP crate: sub-modules.

pub mod types;
pub mod messages;
pub mod core;
pub mod clock;
pub mod uri;
pub mod generator;
pub mod storage;
pub mod ticker;
pub mod display;
pub mod scan;

// Re-export top-level items for convenience.
pub use types::*;
pub use clock::{FixedClock, SystemClock, TimeProvider};
pub use display::{spawn_refresh_loop, DisplayEvent, DisplayHandle, OtpDisplay, OtpEntry};
pub use generator::{PasswordGenerator, PasswordGeneratorFactory, TotpGenerator, TotpGeneratorFactory};
pub use messages::{EnglishCatalog, Message, MessageCatalog};
pub use scan::{AddOtpResult, OtpRegistrar};
pub use storage::{JsonFileBackend, MemoryBackend, OtpUriStore, SharedOtpUriStore, StoreBackend};
pub use ticker::{Ticker, DEFAULT_REFRESH_PERIOD};
pub use uri::{build_otpauth_uri, OtpUriParser};
