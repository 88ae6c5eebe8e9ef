//! Rule Store
//!
//! Owns the canonical in-memory rule list and its on-disk file. The file is
//! json5 on read, so operators can hand-edit it with comments and trailing
//! commas, and pretty JSON on write, replaced atomically via a tmp file.

use crate::rules::model::{Rule, RuleIdentity};
use crate::rules::validate::{validate_rules, RuleError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Callback used to surface load/save/import outcomes to an interactive
/// caller, e.g. an admin command echoing into the client window. Outcomes
/// are always logged regardless.
pub type Notifier = Arc<dyn Fn(&str) + Send + Sync>;

/// Errors from rule store operations. `NotFound` is distinct from other
/// I/O errors and from parse failures so callers can message each case.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rule file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read or write rule file: {0}")]
    Io(#[from] std::io::Error),

    #[error("rule file is not valid JSON: {0}")]
    Parse(String),

    #[error(transparent)]
    Invalid(#[from] RuleError),

    #[error("failed to encode rules: {0}")]
    Encode(String),
}

/// Counters describing what an identity merge did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MergeOutcome {
    pub added: usize,
    pub overwritten: usize,
}

/// Merge `incoming` into `existing` by rule identity: an identity hit
/// replaces the existing entry at its position, everything else is appended
/// in incoming order. Pure; callers decide whether to persist or swap in
/// the result, which keeps a preview-before-commit workflow possible for
/// untrusted input.
pub fn merge_rules(existing: &[Rule], incoming: Vec<Rule>) -> (Vec<Rule>, MergeOutcome) {
    let mut merged: Vec<Rule> = existing.to_vec();
    let mut index: HashMap<RuleIdentity, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, rule)| (rule.identity(), i))
        .collect();
    let mut outcome = MergeOutcome::default();

    for rule in incoming {
        match index.get(&rule.identity()) {
            Some(&pos) => {
                merged[pos] = rule;
                outcome.overwritten += 1;
            }
            None => {
                index.insert(rule.identity(), merged.len());
                merged.push(rule);
                outcome.added += 1;
            }
        }
    }

    (merged, outcome)
}

/// The canonical rule list plus its durable file.
pub struct RuleStore {
    path: PathBuf,
    rules: RwLock<Vec<Rule>>,
}

impl RuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            rules: RwLock::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current rules, cloned in evaluation order.
    pub fn snapshot(&self) -> Vec<Rule> {
        self.rules.read().clone()
    }

    pub fn len(&self) -> usize {
        self.rules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.read().is_empty()
    }

    /// Write a starter rule file if none exists yet.
    pub fn bootstrap(&self) -> Result<(), StoreError> {
        if self.path.exists() {
            return Ok(());
        }
        tracing::info!(path = %self.path.display(), "creating default rule file");
        self.write_file(&example_rules())
    }

    /// Reload rules from disk, replacing the in-memory set on success.
    /// The in-memory set is left untouched on any failure. Callers that own
    /// cooldown state must clear it after a successful load.
    pub fn load(&self, notifier: Option<&Notifier>) -> Result<usize, StoreError> {
        match self.read_file() {
            Ok(rules) => {
                let count = rules.len();
                *self.rules.write() = rules;
                let line = format!("loaded {} auto-response rule(s)", count);
                tracing::info!(path = %self.path.display(), "{}", line);
                notify(notifier, &line);
                Ok(count)
            }
            Err(err) => {
                match &err {
                    StoreError::NotFound(path) => {
                        tracing::warn!(path = %path.display(), "rule file not found; keeping current rules");
                    }
                    other => {
                        tracing::error!(path = %self.path.display(), error = %other, "failed to load rules; keeping current rules");
                    }
                }
                notify(notifier, &format!("failed to load rules: {}", err));
                Err(err)
            }
        }
    }

    /// Persist `rules` and make them the in-memory set. On write failure the
    /// in-memory set is left unchanged and stays authoritative; the caller
    /// is told so it can surface the divergence.
    pub fn save(&self, rules: Vec<Rule>, notifier: Option<&Notifier>) -> Result<usize, StoreError> {
        if let Err(err) = self.write_file(&rules) {
            tracing::error!(
                path = %self.path.display(),
                error = %err,
                "failed to save rules; in-memory rules now diverge from disk"
            );
            notify(notifier, &format!("failed to save rules: {}", err));
            return Err(err);
        }
        let count = rules.len();
        *self.rules.write() = rules;
        let line = format!("saved {} auto-response rule(s)", count);
        tracing::info!(path = %self.path.display(), "{}", line);
        notify(notifier, &line);
        Ok(count)
    }

    fn read_file(&self) -> Result<Vec<Rule>, StoreError> {
        let raw = std::fs::read_to_string(&self.path).map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                StoreError::NotFound(self.path.clone())
            } else {
                StoreError::Io(err)
            }
        })?;
        let mut doc: serde_json::Value =
            json5::from_str(&raw).map_err(|err| StoreError::Parse(err.to_string()))?;
        validate_rules(&mut doc)?;
        serde_json::from_value(doc).map_err(|err| StoreError::Parse(err.to_string()))
    }

    /// Whole-file replace: write a sibling tmp file, then rename over the
    /// target so readers never observe a partial write.
    fn write_file(&self, rules: &[Rule]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(rules)
            .map_err(|err| StoreError::Encode(err.to_string()))?;
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp_path)?;
            file.write_all(content.as_bytes())?;
            file.write_all(b"\n")?;
        }
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

fn notify(notifier: Option<&Notifier>, line: &str) {
    if let Some(notifier) = notifier {
        notifier(line);
    }
}

fn example_rules() -> Vec<Rule> {
    vec![Rule {
        server: "libera".to_string(),
        listen_channel: "#riposte".to_string(),
        trigger_text: "^{{me}}[:,] ping$".to_string(),
        trigger_flags: Some("i".to_string()),
        response_text: "{{sender}}: pong".to_string(),
        response_channel: None,
        cooldown_seconds: 5.0,
        delay_seconds: 0.0,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use tempfile::TempDir;

    fn rule(server: &str, channel: &str, trigger: &str, response: &str) -> Rule {
        Rule {
            server: server.to_string(),
            listen_channel: channel.to_string(),
            trigger_text: trigger.to_string(),
            trigger_flags: None,
            response_text: response.to_string(),
            response_channel: None,
            cooldown_seconds: 5.0,
            delay_seconds: 0.0,
        }
    }

    #[test]
    fn test_bootstrap_creates_example_file() {
        let dir = TempDir::new().unwrap();
        let store = RuleStore::new(dir.path().join("rules.json"));
        store.bootstrap().unwrap();

        let count = store.load(None).unwrap();
        assert_eq!(count, 1);
        assert_eq!(store.snapshot()[0].trigger_text, "^{{me}}[:,] ping$");
    }

    #[test]
    fn test_bootstrap_leaves_existing_file_alone() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "[]").unwrap();

        let store = RuleStore::new(&path);
        store.bootstrap().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_load_not_found_is_distinct_and_keeps_rules() {
        let dir = TempDir::new().unwrap();
        let store = RuleStore::new(dir.path().join("rules.json"));
        store
            .save(vec![rule("n", "#a", "ping", "pong")], None)
            .unwrap();
        std::fs::remove_file(store.path()).unwrap();

        let err = store.load(None).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_parse_failure_is_distinct_and_keeps_rules() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        let store = RuleStore::new(&path);
        store
            .save(vec![rule("n", "#a", "ping", "pong")], None)
            .unwrap();

        std::fs::write(&path, "{{{ not json").unwrap();
        let err = store.load(None).unwrap_err();
        assert!(matches!(err, StoreError::Parse(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_load_validation_failure_keeps_rules() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        let store = RuleStore::new(&path);
        store
            .save(vec![rule("n", "#a", "ping", "pong")], None)
            .unwrap();

        std::fs::write(&path, r#"[{"server": "n"}]"#).unwrap();
        let err = store.load(None).unwrap_err();
        assert!(matches!(err, StoreError::Invalid(_)));
        assert_eq!(store.snapshot()[0].trigger_text, "ping");
    }

    #[test]
    fn test_load_accepts_json5_and_numeric_strings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r##"// hand-edited
            [
                {
                    server: "libera",
                    listen_channel: "#rust",
                    trigger_text: "ping",
                    response_text: "pong",
                    cooldown_seconds: "10",
                },
            ]"##,
        )
        .unwrap();

        let store = RuleStore::new(&path);
        assert_eq!(store.load(None).unwrap(), 1);
        assert_eq!(store.snapshot()[0].cooldown_seconds, 10.0);
    }

    #[test]
    fn test_save_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = RuleStore::new(dir.path().join("rules.json"));
        let rules = vec![
            rule("n", "#a", "ping", "pong"),
            rule("n", "#b", "hello", "hi"),
        ];
        store.save(rules.clone(), None).unwrap();

        let reread = RuleStore::new(store.path());
        reread.load(None).unwrap();
        assert_eq!(reread.snapshot(), rules);
    }

    #[test]
    fn test_save_leaves_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let store = RuleStore::new(dir.path().join("rules.json"));
        store
            .save(vec![rule("n", "#a", "ping", "pong")], None)
            .unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("rules.json")]);
    }

    #[test]
    fn test_notifier_receives_outcomes() {
        let dir = TempDir::new().unwrap();
        let store = RuleStore::new(dir.path().join("rules.json"));

        let lines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&lines);
        let notifier: Notifier = Arc::new(move |line| sink.lock().push(line.to_string()));

        store
            .save(vec![rule("n", "#a", "ping", "pong")], Some(&notifier))
            .unwrap();
        store.load(Some(&notifier)).unwrap();
        std::fs::remove_file(store.path()).unwrap();
        let _ = store.load(Some(&notifier));

        let lines = lines.lock();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("saved 1"));
        assert!(lines[1].contains("loaded 1"));
        assert!(lines[2].contains("failed to load"));
    }

    #[test]
    fn test_merge_overwrites_on_identity_hit() {
        let existing = vec![rule("N", "#a", "ping", "pong1")];
        let incoming = vec![rule("N", "#a", "ping", "pong2")];

        let (merged, outcome) = merge_rules(&existing, incoming);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].response_text, "pong2");
        assert_eq!(outcome, MergeOutcome { added: 0, overwritten: 1 });
    }

    #[test]
    fn test_merge_identity_is_channel_case_insensitive() {
        let existing = vec![rule("N", "#A", "ping", "pong1")];
        let incoming = vec![rule("N", "#a", "ping", "pong2")];

        let (merged, outcome) = merge_rules(&existing, incoming);
        assert_eq!(merged.len(), 1);
        assert_eq!(outcome.overwritten, 1);
    }

    #[test]
    fn test_merge_appends_new_rules_preserving_positions() {
        let existing = vec![
            rule("N", "#a", "one", "1"),
            rule("N", "#a", "two", "2"),
        ];
        let incoming = vec![
            rule("N", "#a", "two", "2 updated"),
            rule("N", "#a", "three", "3"),
        ];

        let (merged, outcome) = merge_rules(&existing, incoming);
        assert_eq!(outcome, MergeOutcome { added: 1, overwritten: 1 });
        assert_eq!(merged.len(), 3);
        // overwritten rule keeps its original position
        assert_eq!(merged[1].response_text, "2 updated");
        assert_eq!(merged[2].trigger_text, "three");
    }

    #[test]
    fn test_merge_duplicate_incoming_identities_collapse() {
        let incoming = vec![
            rule("N", "#a", "ping", "first"),
            rule("N", "#a", "ping", "second"),
        ];

        let (merged, outcome) = merge_rules(&[], incoming);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].response_text, "second");
        assert_eq!(outcome, MergeOutcome { added: 1, overwritten: 1 });
    }
}
