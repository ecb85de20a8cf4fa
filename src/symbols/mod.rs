//! Symbol registry — bidirectional symbol ↔ asset index cache.
//!
//! Internal names carry a market-class suffix (`BTC-PERP`, `PURR-SPOT`);
//! exchange names are what the venue uses on the wire (`BTC`, `PURR/USDC`).
//! Perp indices are universe positions `0..N`; spot indices are
//! `10000 + pair index`.
//!
//! Maps are rebuilt in full on every refresh and published with a single
//! atomic swap, so readers never see a half-built table. A failed refresh
//! keeps the previous maps; after `failure_threshold` consecutive failures
//! the periodic refresh stops and health turns [`RegistryHealth::Halted`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use arc_swap::ArcSwap;
use async_lock::Mutex;
use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::domain::info::wire::{PerpMeta, SpotMeta};
use crate::error::SdkError;
use crate::shared::MarketClass;

/// Offset added to spot pair indices.
pub const SPOT_INDEX_OFFSET: u32 = 10_000;

// ─── Metadata source ─────────────────────────────────────────────────────────

/// Where the registry loads market metadata from.
#[async_trait]
pub trait MetaSource: Send + Sync {
    async fn perp_meta(&self) -> Result<PerpMeta, SdkError>;
    async fn spot_meta(&self) -> Result<SpotMeta, SdkError>;
}

#[cfg(feature = "http")]
#[async_trait]
impl MetaSource for crate::http::HttpTransport {
    async fn perp_meta(&self) -> Result<PerpMeta, SdkError> {
        self.post_info(&serde_json::json!({"type": "meta"})).await
    }

    async fn spot_meta(&self) -> Result<SpotMeta, SdkError> {
        self.post_info(&serde_json::json!({"type": "spotMeta"})).await
    }
}

// ─── Types ───────────────────────────────────────────────────────────────────

/// Which way [`SymbolRegistry::convert_symbol`] translates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Exchange name → internal name.
    Forward,
    /// Internal name → exchange name.
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetEntry {
    pub internal_name: String,
    pub exchange_name: String,
    pub index: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllAssets {
    pub perp: Vec<AssetEntry>,
    pub spot: Vec<AssetEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryHealth {
    Healthy,
    /// Last refresh failed; previous maps are still served.
    Degraded { failures: u32 },
    /// Periodic refresh stopped. Call `initialize()` to restart it.
    Halted { failures: u32 },
}

impl RegistryHealth {
    pub fn is_halted(&self) -> bool {
        matches!(self, RegistryHealth::Halted { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// `None` disables periodic refresh.
    pub refresh_interval: Option<Duration>,
    /// Consecutive failures before periodic refresh halts.
    pub failure_threshold: u32,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Some(Duration::from_secs(60)),
            failure_threshold: 5,
        }
    }
}

/// One immutable generation of lookup tables.
#[derive(Debug, Default)]
struct SymbolMaps {
    asset_to_index: HashMap<String, u32>,
    exchange_to_internal: HashMap<String, String>,
    assets: AllAssets,
}

impl SymbolMaps {
    fn build(perp: &PerpMeta, spot: &SpotMeta) -> Self {
        let mut maps = SymbolMaps::default();

        for (i, asset) in perp.universe.iter().enumerate() {
            maps.insert(
                MarketClass::Perp,
                AssetEntry {
                    internal_name: format!("{}{}", asset.name, MarketClass::Perp.suffix()),
                    exchange_name: asset.name.clone(),
                    index: i as u32,
                },
            );
        }

        for token in &spot.tokens {
            let pair = spot
                .universe
                .iter()
                .find(|pair| pair.tokens.first() == Some(&token.index));
            if let Some(pair) = pair {
                maps.insert(
                    MarketClass::Spot,
                    AssetEntry {
                        internal_name: format!("{}{}", token.name, MarketClass::Spot.suffix()),
                        exchange_name: pair.name.clone(),
                        index: SPOT_INDEX_OFFSET + pair.index,
                    },
                );
            }
        }

        maps
    }

    fn insert(&mut self, class: MarketClass, entry: AssetEntry) {
        self.asset_to_index
            .insert(entry.internal_name.clone(), entry.index);
        self.exchange_to_internal
            .insert(entry.exchange_name.clone(), entry.internal_name.clone());
        match class {
            MarketClass::Perp => self.assets.perp.push(entry),
            MarketClass::Spot => self.assets.spot.push(entry),
        }
    }
}

// ─── Registry ────────────────────────────────────────────────────────────────

struct Inner {
    source: Arc<dyn MetaSource>,
    config: RegistryConfig,
    maps: ArcSwap<SymbolMaps>,
    failures: AtomicU32,
    health: watch::Sender<RegistryHealth>,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.refresh_task.get_mut().take() {
            handle.abort();
        }
    }
}

/// Shared symbol cache. Cloning is cheap and clones share state.
#[derive(Clone)]
pub struct SymbolRegistry {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SymbolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let maps = self.inner.maps.load();
        f.debug_struct("SymbolRegistry")
            .field("perp", &maps.assets.perp.len())
            .field("spot", &maps.assets.spot.len())
            .field("health", &self.health())
            .finish()
    }
}

impl SymbolRegistry {
    /// Empty registry. Nothing is fetched until [`initialize`](Self::initialize).
    pub fn new(source: Arc<dyn MetaSource>, config: RegistryConfig) -> Self {
        let (health, _) = watch::channel(RegistryHealth::Healthy);
        Self {
            inner: Arc::new(Inner {
                source,
                config,
                maps: ArcSwap::from_pointee(SymbolMaps::default()),
                failures: AtomicU32::new(0),
                health,
                refresh_task: Mutex::new(None),
            }),
        }
    }

    /// Load metadata and (re)start periodic refresh.
    ///
    /// Resets the failure counter. Fails with `Initialization` if the first
    /// load fails; the timer is not started in that case.
    pub async fn initialize(&self) -> Result<(), SdkError> {
        self.stop_refresh_task().await;
        self.inner.failures.store(0, Ordering::SeqCst);
        self.inner.health.send_replace(RegistryHealth::Healthy);

        if let Err(e) = self.refresh().await {
            return Err(SdkError::initialization(format!(
                "failed to load symbol metadata: {}",
                e
            )));
        }

        if let Some(interval) = self.inner.config.refresh_interval {
            let handle = spawn_refresh_task(Arc::downgrade(&self.inner), interval);
            *self.inner.refresh_task.lock().await = Some(handle);
        }
        Ok(())
    }

    /// Fetch perp and spot metadata concurrently and swap in new maps.
    ///
    /// On failure the previous maps stay in place and the failure counter
    /// advances; reaching the threshold halts periodic refresh and returns
    /// an `Initialization` error.
    pub async fn refresh(&self) -> Result<(), SdkError> {
        let (perp, spot) = tokio::join!(
            self.inner.source.perp_meta(),
            self.inner.source.spot_meta()
        );

        match perp.and_then(|perp| spot.map(|spot| (perp, spot))) {
            Ok((perp, spot)) => {
                let maps = SymbolMaps::build(&perp, &spot);
                tracing::info!(
                    perp = maps.assets.perp.len(),
                    spot = maps.assets.spot.len(),
                    "Symbol registry refreshed"
                );
                self.inner.maps.store(Arc::new(maps));
                self.inner.failures.store(0, Ordering::SeqCst);
                self.inner.health.send_replace(RegistryHealth::Healthy);
                Ok(())
            }
            Err(e) => {
                let failures = self.inner.failures.fetch_add(1, Ordering::SeqCst) + 1;
                let threshold = self.inner.config.failure_threshold;
                if failures >= threshold {
                    tracing::error!(
                        failures,
                        "Symbol refresh halted after repeated failures: {}",
                        e
                    );
                    self.inner
                        .health
                        .send_replace(RegistryHealth::Halted { failures });
                    Err(SdkError::initialization(format!(
                        "symbol refresh halted after {} consecutive failures: {}",
                        failures, e
                    )))
                } else {
                    tracing::warn!(failures, threshold, "Symbol refresh failed: {}", e);
                    self.inner
                        .health
                        .send_replace(RegistryHealth::Degraded { failures });
                    Err(e)
                }
            }
        }
    }

    /// Translate between exchange and internal names.
    ///
    /// Unknown names come back unchanged. With `class_hint`, a forward result
    /// lacking the class suffix gets it appended. Reverse lookup scans the
    /// table linearly.
    pub fn convert_symbol(
        &self,
        name: &str,
        direction: Direction,
        class_hint: Option<MarketClass>,
    ) -> String {
        let maps = self.inner.maps.load();
        match direction {
            Direction::Forward => {
                let mut internal = maps
                    .exchange_to_internal
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| name.to_string());
                if let Some(class) = class_hint {
                    if !internal.ends_with(class.suffix()) {
                        internal.push_str(class.suffix());
                    }
                }
                internal
            }
            Direction::Reverse => maps
                .exchange_to_internal
                .iter()
                .find(|(_, internal)| internal.as_str() == name)
                .map(|(exchange, _)| exchange.clone())
                .unwrap_or_else(|| name.to_string()),
        }
    }

    /// Asset index for an internal name, or for an exchange name that maps
    /// to one.
    pub fn get_asset_index(&self, name: &str) -> Option<u32> {
        let maps = self.inner.maps.load();
        maps.asset_to_index.get(name).copied().or_else(|| {
            maps.exchange_to_internal
                .get(name)
                .and_then(|internal| maps.asset_to_index.get(internal))
                .copied()
        })
    }

    /// Like [`get_asset_index`](Self::get_asset_index), failing on unknown names.
    pub fn resolve_asset(&self, name: &str) -> Result<u32, SdkError> {
        self.get_asset_index(name)
            .ok_or_else(|| SdkError::validation(format!("unknown asset `{}`", name)))
    }

    pub fn get_all_assets(&self) -> AllAssets {
        self.inner.maps.load().assets.clone()
    }

    pub fn health(&self) -> RegistryHealth {
        *self.inner.health.borrow()
    }

    pub fn subscribe_health(&self) -> watch::Receiver<RegistryHealth> {
        self.inner.health.subscribe()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.inner.failures.load(Ordering::SeqCst)
    }

    async fn stop_refresh_task(&self) {
        if let Some(handle) = self.inner.refresh_task.lock().await.take() {
            handle.abort();
        }
    }
}

fn spawn_refresh_task(inner: Weak<Inner>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            let Some(inner) = inner.upgrade() else {
                break;
            };
            let registry = SymbolRegistry { inner };
            if registry.refresh().await.is_err() && registry.health().is_halted() {
                tracing::debug!("Periodic symbol refresh stopped");
                break;
            }
        }
    })
}
