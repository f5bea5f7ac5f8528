//! Prometheus metrics collection for gatewarden.
//!
//! Tracks validation verdicts, isolated rule faults, purge activity,
//! override actions, and the number of active lockdowns. Metrics are
//! registered lazily on first use; `render()` produces the text
//! exposition for whatever HTTP surface the embedding process runs.

use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

static EVALUATIONS: OnceLock<IntCounterVec> = OnceLock::new();
static RULE_FAULTS: OnceLock<IntCounterVec> = OnceLock::new();
static PURGE_KICKS: OnceLock<IntCounter> = OnceLock::new();
static OVERRIDE_ACTIONS: OnceLock<IntCounterVec> = OnceLock::new();
static LOCKDOWNS_ACTIVE: OnceLock<IntGauge> = OnceLock::new();

fn evaluations() -> &'static IntCounterVec {
    EVALUATIONS.get_or_init(|| {
        let counter = IntCounterVec::new(
            Opts::new(
                "gatewarden_evaluations_total",
                "Validation evaluations by final verdict",
            ),
            &["verdict"],
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(counter.clone()));
        counter
    })
}

fn rule_faults() -> &'static IntCounterVec {
    RULE_FAULTS.get_or_init(|| {
        let counter = IntCounterVec::new(
            Opts::new(
                "gatewarden_rule_faults_total",
                "Validator faults isolated by the pipeline",
            ),
            &["validator"],
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(counter.clone()));
        counter
    })
}

fn purge_kicks() -> &'static IntCounter {
    PURGE_KICKS.get_or_init(|| {
        let counter = IntCounter::new(
            "gatewarden_purge_kicks_total",
            "Members removed by the purge job",
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(counter.clone()));
        counter
    })
}

fn override_actions() -> &'static IntCounterVec {
    OVERRIDE_ACTIONS.get_or_init(|| {
        let counter = IntCounterVec::new(
            Opts::new(
                "gatewarden_override_actions_total",
                "Manual override actions taken via reactions",
            ),
            &["action"],
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(counter.clone()));
        counter
    })
}

fn lockdowns_active() -> &'static IntGauge {
    LOCKDOWNS_ACTIVE.get_or_init(|| {
        let gauge = IntGauge::new(
            "gatewarden_lockdowns_active",
            "Communities currently under lockdown",
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(gauge.clone()));
        gauge
    })
}

pub fn record_evaluation(approved: bool) {
    let verdict = if approved { "approved" } else { "rejected" };
    evaluations().with_label_values(&[verdict]).inc();
}

pub fn record_rule_fault(validator: &str) {
    rule_faults().with_label_values(&[validator]).inc();
}

pub fn record_purge_kick() {
    purge_kicks().inc();
}

pub fn record_override_action(action: &str) {
    override_actions().with_label_values(&[action]).inc();
}

pub fn set_lockdowns_active(count: i64) {
    lockdowns_active().set(count);
}

/// Render the text exposition format for scraping.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if encoder.encode(&registry().gather(), &mut buffer).is_err() {
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}
