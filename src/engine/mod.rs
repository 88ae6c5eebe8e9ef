//! Auto-response Engine
//!
//! Orchestrates rule evaluation for incoming messages: context check, then
//! trigger match, then cooldown gate, then dispatch. The first rule that
//! clears every gate fires and evaluation stops; a rule that merely sits on
//! cooldown yields to later rules instead of blocking them.

pub mod cooldown;
pub mod dispatch;
pub mod matcher;

use crate::engine::cooldown::CooldownTracker;
use crate::host::{DynChatHost, InboundMessage};
use crate::remote::{self, RemoteImportError};
use crate::rules::{merge_rules, MergeOutcome, Notifier, Rule, RuleStore, StoreError};
use crate::settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// The responder: rule store, cooldown state, and the per-message
/// evaluation loop. Shared across tasks as `Arc<Responder>`.
pub struct Responder {
    host: DynChatHost,
    store: RuleStore,
    cooldowns: CooldownTracker,
    started: Instant,
}

impl Responder {
    pub fn new(host: DynChatHost, rule_path: impl Into<PathBuf>) -> Self {
        Self {
            host,
            store: RuleStore::new(rule_path),
            cooldowns: CooldownTracker::new(),
            started: Instant::now(),
        }
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Current rules in evaluation order, for listing to an operator.
    pub fn rules(&self) -> Vec<Rule> {
        self.store.snapshot()
    }

    /// Milliseconds since engine start; the timebase for cooldown stamps.
    fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Create the default rule file if none exists, then load it.
    pub fn start(&self, notifier: Option<&Notifier>) -> Result<usize, StoreError> {
        self.store.bootstrap()?;
        self.reload_rules(notifier)
    }

    /// Reload rules from disk and clear all cooldown state. The reload entry
    /// point for file-change notifications and explicit reload requests; on
    /// failure the previous rules and their cooldowns stay in effect.
    pub fn reload_rules(&self, notifier: Option<&Notifier>) -> Result<usize, StoreError> {
        let count = self.store.load(notifier)?;
        self.cooldowns.clear();
        Ok(count)
    }

    /// Persist `rules` and swap them in, clearing cooldown state since rule
    /// positions change.
    pub fn replace_rules(
        &self,
        rules: Vec<Rule>,
        notifier: Option<&Notifier>,
    ) -> Result<usize, StoreError> {
        let count = self.store.save(rules, notifier)?;
        self.cooldowns.clear();
        Ok(count)
    }

    /// Fetch rules from `url`, merge them into the current set by identity,
    /// persist the merged set and swap it in. Returns the merge counters.
    /// Durable state is only touched after fetch and validation succeed.
    pub async fn import_rules(
        &self,
        url: &str,
        settings: &Settings,
        notifier: Option<&Notifier>,
    ) -> Result<MergeOutcome, RemoteImportError> {
        let incoming = remote::fetch_rules(url, settings).await?;
        let (merged, outcome) = merge_rules(&self.store.snapshot(), incoming);
        self.replace_rules(merged, None)?;

        let line = format!(
            "imported rules from {}: {} added, {} overwritten",
            url, outcome.added, outcome.overwritten
        );
        tracing::info!("{}", line);
        if let Some(notifier) = notifier {
            notifier(&line);
        }
        Ok(outcome)
    }

    /// Evaluate `message` against the rule set in order. Returns `true` when
    /// a rule fired (its response was sent or scheduled).
    pub async fn handle_message(&self, message: &InboundMessage) -> bool {
        let rules = self.store.snapshot();
        let nick = self
            .host
            .current_nick(&message.server)
            .unwrap_or_default();
        let now = self.now_ms();

        for (index, rule) in rules.iter().enumerate() {
            if !rule.applies_to(&message.server, &message.origin_channel) {
                continue;
            }

            let hit = match matcher::match_trigger(rule, &nick, &message.text) {
                Ok(Some(hit)) => hit,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!(
                        trigger = %rule.trigger_text,
                        error = %err,
                        "skipping rule with invalid trigger pattern"
                    );
                    continue;
                }
            };

            if self.cooldowns.is_on_cooldown(index, rule, now) {
                tracing::debug!(
                    trigger = %rule.trigger_text,
                    "rule on cooldown; trying later rules"
                );
                continue;
            }

            // Destination is resolved before the cooldown is marked: a rule
            // whose destination is unknown never fired, so it must not eat
            // its cooldown.
            let destination = rule
                .response_channel
                .as_deref()
                .unwrap_or(&message.origin_channel);
            let directory = self.host.channel_directory(&message.server);
            let Some(target) = dispatch::resolve_destination(&directory, destination) else {
                tracing::error!(
                    destination = %destination,
                    server = %message.server,
                    "cannot resolve response destination; rule not fired"
                );
                continue;
            };

            let text =
                dispatch::render_response(&rule.response_text, &message.sender_nick, &hit.groups);
            self.cooldowns.mark_fired(index, now);
            tracing::debug!(
                trigger = %rule.trigger_text,
                destination = %destination,
                delay = rule.delay_seconds,
                "rule fired"
            );
            dispatch::send_response(Arc::clone(&self.host), rule.delay_seconds, target, text)
                .await;
            return true;
        }

        false
    }
}
