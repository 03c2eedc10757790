//! The dashboard controller: single owner of all dashboard state.
//!
//! RULES:
//!   - Metrics are written only through `apply()`.
//!   - Derived values are recomputed on every read, never stored.
//!   - Reads and writes require an authenticated, allowlisted user.
//!   - Every applied command and every login attempt is logged as an event.

use crate::{
    auth::{AuthProvider, Identity},
    calculator::{quarterly_view, DerivedRecord, PricingPolicy, ProjectionRow},
    command::DashCommand,
    config::DashboardConfig,
    error::{DashError, DashResult},
    event::{DashEvent, EventLogEntry},
    gate::AccessGate,
    metrics::{MetricsRecord, MetricsStore, SetOutcome},
    reference_data::{B2bScenarios, Competitor, CompetitorPricing, FeatureMatrix, ReferenceData, UserCount, VerifiedMarket},
};
use chrono::Utc;
use serde::Serialize;

/// Everything the presentation layer needs for one render.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    pub identity:         Identity,
    pub metrics:          MetricsRecord,
    pub derived:          DerivedRecord,
    pub projection_table: Vec<ProjectionRow>,
    pub market:           VerifiedMarket,
    pub competitors:      Vec<Competitor>,
    pub b2b:              B2bScenarios,
    pub feature_matrix:   FeatureMatrix,
    pub unique_features:  Vec<String>,
}

pub struct Dashboard {
    store:     MetricsStore,
    reference: ReferenceData,
    pricing:   PricingPolicy,
    gate:      AccessGate,
    /// Unbounded: one entry per login attempt, logout or command, kept for
    /// the dashboard's lifetime. Drop the `Dashboard` to release it.
    events:    Vec<EventLogEntry>,
}

impl Dashboard {
    pub fn new(config: &DashboardConfig, provider: Box<dyn AuthProvider>) -> DashResult<Self> {
        let reference = ReferenceData::builtin()?;
        let gate = AccessGate::new(config.allowlist.clone(), provider);
        log::info!(
            "dashboard: ready (auth={}, reference tier={})",
            gate.provider_name(),
            config.pricing.reference_tier
        );
        Ok(Self {
            store: MetricsStore::new(config.seed.clone(), config.ranges.clone()),
            reference,
            pricing: config.pricing.clone(),
            gate,
            events: Vec::new(),
        })
    }

    /// Build with the provider the config selects.
    pub fn build(config: &DashboardConfig) -> DashResult<Self> {
        let provider = config.build_provider()?;
        Self::new(config, provider)
    }

    /// Local-mode dashboard over `DashboardConfig::default_test()`.
    pub fn build_test() -> DashResult<Self> {
        let config = DashboardConfig::default_test()?;
        Self::build(&config)
    }

    // ── Access ─────────────────────────────────────────────────────

    pub fn login(&mut self, email: &str, password: &str) -> DashResult<Identity> {
        match self.gate.login(email, password) {
            Ok(identity) => {
                self.record(DashEvent::LoginSucceeded { email: identity.email.clone() });
                Ok(identity)
            }
            Err(e) => {
                self.record(DashEvent::LoginFailed {
                    email:   email.to_string(),
                    message: e.user_message().to_string(),
                });
                Err(e.into())
            }
        }
    }

    pub fn logout(&mut self) -> DashResult<()> {
        let result = self.gate.logout();
        self.record(DashEvent::LoggedOut);
        result.map_err(DashError::from)
    }

    pub fn is_authenticated(&mut self) -> bool {
        self.gate.sync();
        self.gate.is_authenticated()
    }

    fn require_identity(&mut self) -> DashResult<Identity> {
        self.gate.sync();
        match self.gate.identity() {
            Some(identity) if self.gate.is_authenticated() => Ok(identity),
            _ => Err(DashError::AccessDenied),
        }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    // ── Writes ─────────────────────────────────────────────────────

    pub fn apply(&mut self, command: DashCommand) -> DashResult<DashEvent> {
        self.require_identity()?;

        let kind = command.kind();
        let outcome = match command {
            DashCommand::SetMetric { field, value } => self.store.set(field, value).map(Some),
            DashCommand::SetTierPrice { tier, price } => self.store.set_tier_price(&tier, price).map(Some),
            DashCommand::ResetMetrics => {
                self.store.reset();
                Ok(None)
            }
        };

        let event = match outcome {
            Ok(Some(SetOutcome { field, requested, applied, clamped })) => {
                DashEvent::MetricChanged { field, requested, applied, clamped }
            }
            Ok(None) => DashEvent::MetricsReset,
            Err(e) => {
                log::warn!("dashboard: {kind} rejected: {e}");
                self.record(DashEvent::CommandRejected {
                    command: kind.to_string(),
                    reason:  e.to_string(),
                });
                return Err(e);
            }
        };

        self.record(event.clone());
        Ok(event)
    }

    fn record(&mut self, event: DashEvent) {
        let seq = self.events.len() as u64 + 1;
        self.events.push(EventLogEntry { seq, at: Utc::now(), event });
    }

    // ── Reads ──────────────────────────────────────────────────────

    pub fn metrics(&self) -> &MetricsRecord {
        self.store.record()
    }

    pub fn reference(&self) -> &ReferenceData {
        &self.reference
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.pricing
    }

    pub fn derived(&self) -> DerivedRecord {
        DerivedRecord::compute(self.store.record(), &self.reference, &self.pricing)
    }

    /// Competitor table with our own row filled from live metrics.
    pub fn competitors(&self) -> Vec<Competitor> {
        let record = self.store.record();
        self.reference
            .competitors
            .iter()
            .cloned()
            .map(|mut c| {
                if c.is_self() {
                    c.user_count = Some(UserCount::Count(record.counters.total_users));
                    if let CompetitorPricing::Tiered { tiers } = &mut c.pricing {
                        for (name, price) in tiers.iter_mut() {
                            if let Some(tier) = record.tier(name) {
                                *price = tier.annual_price;
                            }
                        }
                    }
                }
                c
            })
            .collect()
    }

    pub fn snapshot(&mut self) -> DashResult<DashboardSnapshot> {
        let identity = self.require_identity()?;
        let derived = self.derived();
        let projection_table = quarterly_view(&derived.projection)
            .iter()
            .map(|p| p.display())
            .collect();

        Ok(DashboardSnapshot {
            identity,
            metrics: self.store.record().clone(),
            projection_table,
            derived,
            market: self.reference.market.clone(),
            competitors: self.competitors(),
            b2b: self.reference.b2b.clone(),
            feature_matrix: self.reference.feature_matrix.clone(),
            unique_features: self
                .reference
                .feature_matrix
                .unique_features()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })
    }

    /// Every recorded event, oldest first.
    pub fn events(&self) -> &[EventLogEntry] {
        &self.events
    }
}
