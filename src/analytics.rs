//! The analytics entry point.
//!
//! `Analytics` is an explicit context object: the host creates one (usually
//! at startup, shared through an `Arc`) and every operation goes through it.
//! Tests build their own instance with a headless [`Platform`].

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::identity::DeviceIdentity;
use crate::metadata::{keys, Metadata, MetadataComposer, OutboundMetadata};
use crate::network::{ReceivedResponse, TrackedRequest};
use crate::platform::{Clock, CrashCallback, CrashHookRegistrar, HostDeviceInfo, Platform};
use crate::session::{AnalyticsEvent, EventLog, SessionTracker};
use crate::settings::{get_with_env_fallback, AnalyticsSettings, API_KEY_ENV, APP_NAME_ENV};

/// Events the SDK can record without the host asking each time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceEvent {
    /// Start a session as part of initialization
    Lifecycle,
    /// Record metadata for every request/response passed to
    /// [`Analytics::record_network_exchange`]
    Network,
}

/// Values set by initialization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    pub api_key: Option<String>,
    pub app_name: Option<String>,
}

pub struct Analytics {
    config: RwLock<AnalyticsConfig>,
    device_events: RwLock<HashSet<DeviceEvent>>,
    /// Custom and network events are dropped while false
    enabled: AtomicBool,
    /// Set on first initialization; registrars may only hold it weakly
    crash_callback: OnceLock<CrashCallback>,

    sessions: Arc<SessionTracker>,
    events: Arc<EventLog>,
    identity: Arc<DeviceIdentity>,
    composer: MetadataComposer,

    clock: Arc<dyn Clock>,
    crash_hooks: Arc<dyn CrashHookRegistrar>,
}

impl Analytics {
    pub fn new(platform: Platform) -> Self {
        let events = Arc::new(EventLog::new());
        let identity = Arc::new(DeviceIdentity::new(platform.store.clone()));

        Self {
            config: RwLock::new(AnalyticsConfig::default()),
            device_events: RwLock::new(HashSet::new()),
            enabled: AtomicBool::new(true),
            crash_callback: OnceLock::new(),
            sessions: Arc::new(SessionTracker::new(platform.clock.clone(), events.clone())),
            events,
            composer: MetadataComposer::new(
                platform.device.clone(),
                identity.clone(),
                platform.clock.clone(),
            ),
            identity,
            clock: platform.clock,
            crash_hooks: platform.crash_hooks,
        }
    }

    /// In-memory instance with no process-wide hooks.
    pub fn headless() -> Self {
        Self::new(Platform::headless())
    }

    /// Build an instance from a settings file.
    ///
    /// `storage.path` replaces the platform store with a file store and
    /// `app.bundle_id` replaces the device provider with host detection
    /// plus that bundle identifier. Initialization runs only if both app
    /// name and API key resolve.
    pub fn from_settings(mut platform: Platform, settings: &AnalyticsSettings) -> Self {
        if let Some(path) = settings.storage.path.as_ref().filter(|p| !p.is_empty()) {
            platform = platform.with_store_path(PathBuf::from(path));
        }
        if let Some(bundle_id) = settings.app.bundle_id.as_ref().filter(|b| !b.is_empty()) {
            platform = platform.with_device(Arc::new(
                HostDeviceInfo::detect().with_bundle_identifier(bundle_id.clone()),
            ));
        }

        let analytics = Self::new(platform);
        analytics
            .events
            .set_capacity(settings.tracking.max_buffered_events);
        analytics.set_enabled(settings.tracking.enabled);
        analytics.initialize_from_settings(settings);
        analytics
    }

    /// Configure the app name and API key.
    ///
    /// Ignored if either is empty. With [`DeviceEvent::Lifecycle`] a session
    /// is started immediately.
    pub fn initialize_with_app_name(
        &self,
        app_name: &str,
        api_key: &str,
        device_events: &[DeviceEvent],
    ) {
        if app_name.is_empty() || api_key.is_empty() {
            tracing::debug!("[analytics] Ignoring initialization with empty app name or API key");
            return;
        }

        *self.config.write() = AnalyticsConfig {
            api_key: Some(api_key.to_string()),
            app_name: Some(app_name.to_string()),
        };
        *self.device_events.write() = device_events.iter().copied().collect();

        self.register_crash_hook();

        tracing::info!(
            "[analytics] Initialized for {} (device events: {:?})",
            app_name,
            device_events
        );

        if device_events.contains(&DeviceEvent::Lifecycle) {
            self.log_session_start();
        }
    }

    /// Initialize from settings, with `BMS_ANALYTICS_APP_NAME` /
    /// `BMS_ANALYTICS_API_KEY` filling in unset values.
    pub fn initialize_from_settings(&self, settings: &AnalyticsSettings) {
        let app_name = get_with_env_fallback(&settings.app.app_name, &[APP_NAME_ENV], None);
        let api_key = get_with_env_fallback(&settings.app.api_key, &[API_KEY_ENV], None);

        match (app_name, api_key) {
            (Some(app_name), Some(api_key)) => {
                self.initialize_with_app_name(&app_name, &api_key, &settings.tracking.device_events)
            }
            _ => tracing::debug!("[analytics] Settings lack an app name or API key, not initializing"),
        }
    }

    fn register_crash_hook(&self) {
        if self.crash_callback.get().is_some() {
            return;
        }

        let sessions: Weak<SessionTracker> = Arc::downgrade(&self.sessions);
        let callback: CrashCallback = Arc::new(move |description: &str| {
            if let Some(sessions) = sessions.upgrade() {
                if sessions.end_session_after_crash().is_some() {
                    tracing::warn!("[analytics] Session closed by crash: {}", description);
                }
            }
        });

        if self.crash_callback.set(callback.clone()).is_ok() {
            self.crash_hooks.register(callback);
            tracing::debug!("[analytics] Crash hook registered");
        }
    }

    /// Forget the configuration. Session state is untouched; use
    /// [`SessionTracker::reset`] for that.
    pub fn uninitialize(&self) {
        *self.config.write() = AnalyticsConfig::default();
        self.device_events.write().clear();
        tracing::info!("[analytics] Uninitialized");
    }

    pub fn config(&self) -> AnalyticsConfig {
        self.config.read().clone()
    }

    pub fn api_key(&self) -> Option<String> {
        self.config.read().api_key.clone()
    }

    /// The configured app name, or the bundle identifier when unset.
    pub fn app_name(&self) -> Option<String> {
        let configured = self.config.read().app_name.clone();
        self.composer.resolve_app_name(configured.as_deref())
    }

    pub fn is_tracking(&self, event: DeviceEvent) -> bool {
        self.device_events.read().contains(&event)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::debug!("[analytics] Recording enabled: {}", enabled);
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }

    pub fn log_session_start(&self) -> String {
        self.sessions.log_session_start()
    }

    pub fn log_session_end(&self) -> Option<AnalyticsEvent> {
        self.sessions.log_session_end()
    }

    /// Record a custom analytics event.
    pub fn log(&self, metadata: Metadata) -> Option<AnalyticsEvent> {
        if !self.is_enabled() {
            tracing::debug!("[analytics] Disabled, dropping custom event");
            return None;
        }

        let event = AnalyticsEvent::new(self.clock.now_millis(), metadata);
        self.events.record(event.clone());
        Some(event)
    }

    pub fn unique_device_id(&self) -> Result<String> {
        self.identity.unique_device_id()
    }

    pub fn reset_device_id(&self) -> Result<()> {
        self.identity.reset()
    }

    pub fn outbound_request_metadata(&self) -> Result<OutboundMetadata> {
        let app_name = self.config.read().app_name.clone();
        self.composer.outbound_request_metadata(app_name.as_deref())
    }

    /// JSON outbound metadata for the current configuration. Works before
    /// initialization; `mfpAppName` is then left out.
    pub fn generate_outbound_request_metadata(&self) -> Result<String> {
        let app_name = self.config.read().app_name.clone();
        self.composer
            .generate_outbound_request_metadata(app_name.as_deref())
    }

    /// Set the outbound metadata header on `request`.
    pub fn attach_outbound_metadata(&self, request: &mut dyn TrackedRequest) -> Result<()> {
        let metadata = self.generate_outbound_request_metadata()?;
        request.set_header(keys::OUTBOUND_METADATA_HEADER, metadata);
        Ok(())
    }

    pub fn generate_inbound_response_metadata(
        &self,
        request: &dyn TrackedRequest,
        response: &dyn ReceivedResponse,
        url: &str,
    ) -> Metadata {
        self.composer
            .generate_inbound_response_metadata(request, response, url)
            .to_metadata()
    }

    /// Record inbound metadata for an exchange if network tracking is on.
    pub fn record_network_exchange(
        &self,
        request: &dyn TrackedRequest,
        response: &dyn ReceivedResponse,
        url: &str,
    ) -> Option<AnalyticsEvent> {
        if !self.is_enabled() || !self.is_tracking(DeviceEvent::Network) {
            tracing::trace!("[analytics] Network tracking off, not recording {}", url);
            return None;
        }

        let inbound = self
            .composer
            .generate_inbound_response_metadata(request, response, url);
        let event = AnalyticsEvent::new(inbound.inbound_timestamp, inbound.to_metadata());
        self.events.record(event.clone());
        Some(event)
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Take every recorded event for upload.
    pub fn drain_events(&self) -> Vec<AnalyticsEvent> {
        self.events.drain()
    }
}
