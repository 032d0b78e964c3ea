//! Display model for stored OTP entries and the loop that keeps it fresh.
//!
//! [`OtpDisplay`] owns one generator per stored URI. Events are applied in
//! order: `Refresh` regenerates every code, `Delete` drops an entry and its
//! persisted URI. [`spawn_refresh_loop`] drives the model from a [`Ticker`]
//! plus a command channel and publishes each new snapshot on a `watch`.

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;

use crate::totp::generator::{PasswordGenerator, PasswordGeneratorFactory};
use crate::totp::storage::SharedOtpUriStore;
use crate::totp::ticker::Ticker;
use crate::totp::types::*;
use crate::totp::uri::OtpUriParser;

const EVENT_BUFFER: usize = 32;

/// One row as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpEntry {
    pub code: String,
    pub account: String,
    pub issuer: Option<String>,
    /// Stored URI, the key used for deletion.
    pub uri: String,
}

/// Input to [`OtpDisplay::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Refresh,
    Delete { uri: String },
}

struct DisplayedOtp {
    entry: OtpEntry,
    generator: Box<dyn PasswordGenerator>,
}

/// Ordered list of entries with live generators.
pub struct OtpDisplay {
    store: SharedOtpUriStore,
    entries: Vec<DisplayedOtp>,
}

impl OtpDisplay {
    /// Build entries from the store, in store order, with their first code.
    /// Entries that no longer parse or generate are skipped.
    pub async fn load(
        store: SharedOtpUriStore,
        parser: &OtpUriParser,
        factory: &dyn PasswordGeneratorFactory,
    ) -> Self {
        let uris = store.lock().await.list();
        let mut entries = Vec::with_capacity(uris.len());

        for uri in uris {
            let params = match parser.parse(&uri) {
                Ok(params) => params,
                Err(e) => {
                    tracing::warn!(kind = ?e.kind, "skipping stored OTP URI that no longer parses");
                    continue;
                }
            };
            let prepared = factory
                .generator_for(&params)
                .and_then(|generator| Ok((generator.generate()?, generator)));
            let (code, generator) = match prepared {
                Ok(prepared) => prepared,
                Err(e) => {
                    tracing::warn!(account = %params.name, kind = ?e.kind, "skipping OTP entry: {}", e);
                    continue;
                }
            };
            entries.push(DisplayedOtp {
                entry: OtpEntry {
                    code,
                    account: params.name,
                    issuer: params.issuer,
                    uri,
                },
                generator,
            });
        }

        tracing::debug!(entries = entries.len(), "loaded OTP display");
        Self { store, entries }
    }

    pub async fn apply(&mut self, event: DisplayEvent) -> Result<(), TotpError> {
        match event {
            DisplayEvent::Refresh => {
                for displayed in &mut self.entries {
                    match displayed.generator.generate() {
                        Ok(code) => displayed.entry.code = code,
                        Err(e) => tracing::warn!(
                            account = %displayed.entry.account,
                            "failed to regenerate OTP code: {}", e
                        ),
                    }
                }
                tracing::trace!(entries = self.entries.len(), "refreshed OTP codes");
            }
            DisplayEvent::Delete { uri } => {
                self.entries.retain(|displayed| displayed.entry.uri != uri);
                self.store.lock().await.remove(&uri)?;
            }
        }
        Ok(())
    }

    /// Current entries, in display order.
    pub fn snapshot(&self) -> Vec<OtpEntry> {
        self.entries.iter().map(|d| d.entry.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Refresh loop
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Control side of a running refresh loop. Dropping it stops the loop.
#[derive(Debug)]
pub struct DisplayHandle {
    events: mpsc::Sender<DisplayEvent>,
    snapshots: watch::Receiver<Vec<OtpEntry>>,
}

impl DisplayHandle {
    /// Queue deletion of the entry stored under `uri`.
    pub async fn delete(&self, uri: impl Into<String>) -> Result<(), TotpError> {
        self.send(DisplayEvent::Delete { uri: uri.into() }).await
    }

    /// Queue an out-of-schedule refresh.
    pub async fn refresh(&self) -> Result<(), TotpError> {
        self.send(DisplayEvent::Refresh).await
    }

    /// A receiver that sees every snapshot published from now on.
    pub fn subscribe(&self) -> watch::Receiver<Vec<OtpEntry>> {
        self.snapshots.clone()
    }

    /// Latest published snapshot.
    pub fn current(&self) -> Vec<OtpEntry> {
        self.snapshots.borrow().clone()
    }

    async fn send(&self, event: DisplayEvent) -> Result<(), TotpError> {
        self.events.send(event).await.map_err(|_| {
            TotpError::new(TotpErrorKind::InvalidInput, "OTP display loop is not running")
        })
    }
}

/// Run `display` on a tokio task. Each tick applies a refresh. The loop ends
/// when the returned handle is dropped.
pub fn spawn_refresh_loop(display: OtpDisplay, ticker: Ticker) -> (DisplayHandle, JoinHandle<()>) {
    let (events_tx, mut events_rx) = mpsc::channel(EVENT_BUFFER);
    let (snapshot_tx, snapshot_rx) = watch::channel(display.snapshot());

    let task = tokio::spawn(async move {
        let mut display = display;
        let mut ticks = ticker.into_stream();
        let mut ticking = true;

        loop {
            let event = tokio::select! {
                biased;

                event = events_rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },

                tick = ticks.next(), if ticking => match tick {
                    Some(()) => DisplayEvent::Refresh,
                    None => {
                        tracing::debug!("refresh ticker finished");
                        ticking = false;
                        continue;
                    }
                },
            };

            if let Err(e) = display.apply(event).await {
                tracing::warn!(kind = ?e.kind, "OTP display event failed: {}", e);
            }
            snapshot_tx.send_replace(display.snapshot());
        }

        tracing::debug!("OTP display loop stopped");
    });

    (
        DisplayHandle {
            events: events_tx,
            snapshots: snapshot_rx,
        },
        task,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::totp::clock::{FixedClock, TimeProvider};
    use crate::totp::generator::TotpGeneratorFactory;
    use crate::totp::storage::OtpUriStore;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Time source that advances one step on every read.
    #[derive(Default)]
    struct SteppingClock(AtomicU64);

    impl TimeProvider for SteppingClock {
        fn now_unix_seconds(&self) -> u64 {
            self.0.fetch_add(1, Ordering::SeqCst)
        }
    }

    /// Generator whose code spells out its inputs, so assertions stay readable.
    struct LabelGenerator {
        params: OtpParameters,
        clock: Arc<SteppingClock>,
    }

    impl PasswordGenerator for LabelGenerator {
        fn generate(&self) -> Result<String, TotpError> {
            Ok(expected_code(
                self.clock.now_unix_seconds(),
                &self.params.name,
                self.params.issuer.as_deref().unwrap_or_default(),
                &self.params.secret,
            ))
        }
    }

    struct LabelGeneratorFactory {
        clock: Arc<SteppingClock>,
    }

    impl PasswordGeneratorFactory for LabelGeneratorFactory {
        fn generator_for(&self, params: &OtpParameters) -> Result<Box<dyn PasswordGenerator>, TotpError> {
            Ok(Box::new(LabelGenerator {
                params: params.clone(),
                clock: Arc::clone(&self.clock),
            }))
        }
    }

    fn expected_code(step: u64, name: &str, issuer: &str, secret: &str) -> String {
        format!("{step}-{issuer}-{name}-{secret}")
    }

    fn ten_uris() -> Vec<String> {
        (0..10)
            .map(|i| format!("otpauth://totp/issuer{i}:name{i}?secret=secret{i}"))
            .collect()
    }

    fn store_with(uris: &[String]) -> SharedOtpUriStore {
        let mut store = OtpUriStore::in_memory();
        for uri in uris {
            store.add(uri).unwrap();
        }
        store.into_shared()
    }

    fn expected_entries(first_step: u64, uris: &[String]) -> Vec<OtpEntry> {
        uris.iter()
            .enumerate()
            .map(|(i, uri)| OtpEntry {
                code: expected_code(
                    first_step + i as u64,
                    &format!("name{i}"),
                    &format!("issuer{i}"),
                    &format!("secret{i}"),
                ),
                account: format!("name{i}"),
                issuer: Some(format!("issuer{i}")),
                uri: uri.clone(),
            })
            .collect()
    }

    async fn load(store: SharedOtpUriStore) -> OtpDisplay {
        let factory = LabelGeneratorFactory {
            clock: Arc::new(SteppingClock::default()),
        };
        OtpDisplay::load(store, &OtpUriParser::default(), &factory).await
    }

    #[tokio::test]
    async fn empty_store_yields_empty_display() {
        let display = load(OtpUriStore::in_memory().into_shared()).await;
        assert!(display.is_empty());
        assert!(display.snapshot().is_empty());
    }

    #[tokio::test]
    async fn initial_code_for_single_entry() {
        let uri = "otpauth://totp/issuer:name?secret=secret".to_string();
        let display = load(store_with(&[uri.clone()])).await;
        assert_eq!(
            display.snapshot(),
            vec![OtpEntry {
                code: expected_code(0, "name", "issuer", "secret"),
                account: "name".into(),
                issuer: Some("issuer".into()),
                uri,
            }]
        );
    }

    #[tokio::test]
    async fn initial_codes_for_all_entries() {
        let uris = ten_uris();
        let display = load(store_with(&uris)).await;
        assert_eq!(display.snapshot(), expected_entries(0, &uris));
    }

    #[tokio::test]
    async fn refresh_regenerates_every_code() {
        let uris = ten_uris();
        let mut display = load(store_with(&uris)).await;
        for update in 1..=10u64 {
            display.apply(DisplayEvent::Refresh).await.unwrap();
            assert_eq!(display.snapshot(), expected_entries(update * 10, &uris));
        }
    }

    #[tokio::test]
    async fn delete_removes_entry_and_stored_uri() {
        let uris = ten_uris();
        let store = store_with(&uris);
        let mut display = load(Arc::clone(&store)).await;

        display
            .apply(DisplayEvent::Delete { uri: uris[5].clone() })
            .await
            .unwrap();

        let expected: Vec<OtpEntry> = expected_entries(0, &uris)
            .into_iter()
            .filter(|entry| entry.account != "name5")
            .collect();
        assert_eq!(display.snapshot(), expected);
        assert!(!store.lock().await.contains(&uris[5]));
        assert_eq!(store.lock().await.len(), 9);
    }

    #[tokio::test]
    async fn unparseable_and_undecodable_entries_are_skipped() {
        let good = "otpauth://totp/alice?secret=JBSWY3DPEHPK3PXP".to_string();
        let store = store_with(&[
            "https://example.com".to_string(),
            good.clone(),
            "otpauth://totp/bob?secret=0189".to_string(),
        ]);
        let factory = TotpGeneratorFactory::new(Arc::new(FixedClock::new(0)));
        let display = OtpDisplay::load(store, &OtpUriParser::default(), &factory).await;

        let snapshot = display.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].account, "alice");
        assert_eq!(snapshot[0].code, "282760");
        assert_eq!(snapshot[0].uri, good);
    }

    #[tokio::test]
    async fn refresh_loop_publishes_on_each_tick() {
        tokio::time::pause();
        let uri = "otpauth://totp/alice?secret=JBSWY3DPEHPK3PXP".to_string();
        let clock = Arc::new(FixedClock::new(0));
        let factory = TotpGeneratorFactory::new(clock.clone());
        let display = OtpDisplay::load(store_with(&[uri]), &OtpUriParser::default(), &factory).await;

        let (handle, task) = spawn_refresh_loop(
            display,
            Ticker::new(Duration::from_secs(5)).with_max_ticks(2),
        );
        let mut rx = handle.subscribe();
        assert_eq!(handle.current()[0].code, "282760");

        clock.set(30);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update()[0].code, "996554");

        clock.set(60);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update()[0].code, "602287");

        drop(rx);
        drop(handle);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn refresh_loop_applies_deletes_from_handle() {
        tokio::time::pause();
        let uris = ten_uris();
        let store = store_with(&uris);
        let display = load(Arc::clone(&store)).await;

        let (handle, task) = spawn_refresh_loop(display, Ticker::new(Duration::from_secs(3600)));
        let mut rx = handle.subscribe();

        handle.delete(uris[5].clone()).await.unwrap();
        rx.changed().await.unwrap();
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(snapshot.len(), 9);
        assert!(snapshot.iter().all(|entry| entry.account != "name5"));
        assert!(!store.lock().await.contains(&uris[5]));

        drop(handle);
        task.await.unwrap();
        assert!(rx.changed().await.is_err());
    }

    #[tokio::test]
    async fn handle_reports_stopped_loop() {
        let display = load(OtpUriStore::in_memory().into_shared()).await;
        let (handle, task) = spawn_refresh_loop(display, Ticker::new(Duration::from_secs(5)));
        task.abort();
        let _ = task.await;
        let err = handle.refresh().await.unwrap_err();
        assert_eq!(err.kind, TotpErrorKind::InvalidInput);
    }
}
