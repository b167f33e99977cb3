//! Process-wide registry of actions, policies and bindings
//!
//! Built once at startup from a [`HotbarConfig`]. The whole config is
//! validated before any worker is spawned, so a rejected config leaves
//! nothing running.

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use hotbar_types::{ActionConfig, BindingTarget, ConfirmationMode, HotbarConfig, Rect};
use thiserror::Error;
use tracing::{debug, info};

use crate::action::{ActionId, ActionSettings, ActionState, Phase};
use crate::arbitration::ArbitrationPolicy;
use crate::error::WorkerError;
use crate::ports::{Actuator, VisionProbe};
use crate::router::{Binding, ConditionBoard, ConditionId, TriggerRouter};
use crate::vision::{Image, PatternError};

/// Errors that reject a config at registry construction
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("action '{0}' is defined more than once")]
    DuplicateAction(String),

    #[error("policy '{0}' is defined more than once")]
    DuplicatePolicy(String),

    #[error("{owner} refers to unknown action '{action}'")]
    UnknownAction { owner: String, action: String },

    #[error("binding '{binding}' refers to unknown policy '{policy}'")]
    UnknownPolicy { binding: String, policy: String },

    #[error("policy '{0}' has no actions")]
    EmptyPolicy(String),

    #[error("binding '{0}' has no conditions")]
    NoConditions(String),

    #[error("action '{0}' uses visual_only confirmation but has no icon")]
    MissingIcon(String),

    #[error("action '{action}' has an invalid cooldown of {secs} seconds")]
    InvalidCooldown { action: String, secs: f64 },

    #[error("failed to load icon {path:?} for action '{action}': {source}")]
    Pattern {
        action: String,
        path: PathBuf,
        #[source]
        source: PatternError,
    },

    #[error("failed to start worker for action '{action}': {source}")]
    Spawn {
        action: String,
        #[source]
        source: io::Error,
    },
}

/// Point-in-time view of one action, for status display
#[derive(Debug, Clone, PartialEq)]
pub struct ActionStatus {
    pub id: ActionId,
    pub phase: Phase,
    /// Time left on the cooldown timer
    pub remaining: Duration,
    /// Region the next probe will search
    pub search_region: Rect,
}

/// Every action, policy and binding of one config, with the actions'
/// confirmation workers running.
pub struct ActionRegistry {
    actions: Vec<Arc<ActionState>>,
    index: HashMap<ActionId, usize>,
    policies: HashMap<String, Arc<ArbitrationPolicy>>,
    bindings: Vec<Binding>,
    workers: Vec<(ActionId, JoinHandle<Result<(), WorkerError>>)>,
    poll_interval: Duration,
    startup_delay: Duration,
}

impl ActionRegistry {
    /// Validate `config`, load icons and start one confirmation worker per action.
    pub fn build(
        config: &HotbarConfig,
        actuator: Arc<dyn Actuator>,
        probe: Arc<dyn VisionProbe>,
    ) -> Result<Self, RegistryError> {
        let settings = config
            .actions
            .iter()
            .map(|action| Ok((ActionId::new(&action.id), load_settings(action)?)))
            .collect::<Result<Vec<_>, RegistryError>>()?;

        let mut index = HashMap::with_capacity(settings.len());
        for (i, (id, _)) in settings.iter().enumerate() {
            if index.insert(id.clone(), i).is_some() {
                return Err(RegistryError::DuplicateAction(id.to_string()));
            }
        }

        validate_references(config, &index)?;

        let mut actions = Vec::with_capacity(settings.len());
        let mut workers = Vec::with_capacity(settings.len());
        for (id, settings) in settings {
            let (state, worker) =
                ActionState::new(id.clone(), settings, Arc::clone(&actuator), Arc::clone(&probe));
            let handle = worker.spawn().map_err(|e| RegistryError::Spawn {
                action: id.to_string(),
                source: e,
            })?;
            actions.push(state);
            workers.push((id, handle));
        }

        let resolve = |name: &str| -> Arc<ActionState> {
            // References were checked above
            Arc::clone(&actions[index[&ActionId::new(name)]])
        };

        let policies: HashMap<String, Arc<ArbitrationPolicy>> = config
            .policies
            .iter()
            .map(|p| {
                let candidates = p.actions.iter().map(|a| resolve(a.as_str())).collect();
                (p.name.clone(), Arc::new(ArbitrationPolicy::new(&p.name, candidates)))
            })
            .collect();

        let bindings = config
            .bindings
            .iter()
            .map(|b| {
                let policy = match &b.target {
                    BindingTarget::Policy(name) => Arc::clone(&policies[name]),
                    BindingTarget::Action(id) => Arc::new(ArbitrationPolicy::single(resolve(id.as_str()))),
                };
                let gates = b
                    .when
                    .iter()
                    .filter(|c| !c.trim().is_empty())
                    .map(|c| ConditionId::new(c.as_str()))
                    .collect();
                Binding::new(&b.name, gates, policy)
            })
            .collect::<Vec<_>>();

        info!(
            actions = actions.len(),
            policies = policies.len(),
            bindings = bindings.len(),
            "Registry built"
        );

        Ok(Self {
            actions,
            index,
            policies,
            bindings,
            workers,
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
            startup_delay: Duration::from_millis(config.startup_delay_ms),
        })
    }

    pub fn action(&self, id: &str) -> Option<&Arc<ActionState>> {
        self.index
            .get(&ActionId::new(id))
            .map(|&i| &self.actions[i])
    }

    /// All actions in config order
    pub fn actions(&self) -> &[Arc<ActionState>] {
        &self.actions
    }

    pub fn policy(&self, name: &str) -> Option<&Arc<ArbitrationPolicy>> {
        self.policies.get(name)
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    /// Router carrying every configured binding, listening on `board`.
    pub fn router(&self, board: Arc<ConditionBoard>) -> TriggerRouter {
        let mut router =
            TriggerRouter::new(board, self.poll_interval).with_startup_delay(self.startup_delay);
        for binding in &self.bindings {
            router.bind(binding.clone());
        }
        router
    }

    pub fn snapshot(&self) -> Vec<ActionStatus> {
        self.actions
            .iter()
            .map(|action| ActionStatus {
                id: action.id().clone(),
                phase: action.phase(),
                remaining: action.remaining(),
                search_region: action.search_region(),
            })
            .collect()
    }

    /// Actions whose confirmation worker has exited. Such an action stays
    /// unavailable after its next fire.
    pub fn stopped_workers(&self) -> Vec<&ActionId> {
        self.workers
            .iter()
            .filter(|(_, handle)| handle.is_finished())
            .map(|(id, _)| id)
            .collect()
    }
}

fn load_settings(config: &ActionConfig) -> Result<ActionSettings, RegistryError> {
    // Rejects NaN, negative, infinite and too-large-for-Duration values alike
    if Duration::try_from_secs_f64(config.cooldown_secs).is_err() {
        return Err(RegistryError::InvalidCooldown {
            action: config.id.clone(),
            secs: config.cooldown_secs,
        });
    }

    let pattern = match (&config.icon, config.confirmation) {
        (None, ConfirmationMode::VisualOnly) => {
            return Err(RegistryError::MissingIcon(config.id.clone()));
        }
        (Some(_), ConfirmationMode::TimerOnly) => {
            debug!(action = %config.id, "Icon ignored for timer_only action");
            None
        }
        (Some(path), _) => {
            let image = Image::load_png(path).map_err(|e| RegistryError::Pattern {
                action: config.id.clone(),
                path: path.clone(),
                source: e,
            })?;
            debug!(action = %config.id, pattern = ?image, "Loaded icon");
            Some(Arc::new(image))
        }
        (None, _) => None,
    };

    Ok(ActionSettings::from_config(config, pattern))
}

fn validate_references(
    config: &HotbarConfig,
    actions: &HashMap<ActionId, usize>,
) -> Result<(), RegistryError> {
    let known = |id: &str| actions.contains_key(&ActionId::new(id));

    let mut policies = HashSet::new();
    for policy in &config.policies {
        if !policies.insert(policy.name.as_str()) {
            return Err(RegistryError::DuplicatePolicy(policy.name.clone()));
        }
        if policy.actions.is_empty() {
            return Err(RegistryError::EmptyPolicy(policy.name.clone()));
        }
        if let Some(missing) = policy.actions.iter().find(|a| !known(a)) {
            return Err(RegistryError::UnknownAction {
                owner: format!("policy '{}'", policy.name),
                action: missing.clone(),
            });
        }
    }

    for binding in &config.bindings {
        if binding.when.iter().all(|c| c.trim().is_empty()) {
            return Err(RegistryError::NoConditions(binding.name.clone()));
        }
        match &binding.target {
            BindingTarget::Policy(name) if !policies.contains(name.as_str()) => {
                return Err(RegistryError::UnknownPolicy {
                    binding: binding.name.clone(),
                    policy: name.clone(),
                });
            }
            BindingTarget::Action(id) if !known(id) => {
                return Err(RegistryError::UnknownAction {
                    owner: format!("binding '{}'", binding.name),
                    action: id.clone(),
                });
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::path::Path;

    use hotbar_types::{BindingConfig, PolicyConfig};

    use super::*;
    use crate::testing::{RecordingActuator, ScriptedProbe, ms, wait_for};

    fn write_icon(path: &Path) {
        let file = File::create(path).unwrap();
        let mut encoder = png::Encoder::new(std::io::BufWriter::new(file), 2, 2);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(&[200; 16]).unwrap();
    }

    fn timer_action(id: &str, cooldown_secs: f64) -> ActionConfig {
        let mut action = ActionConfig::new(id);
        action.keys = vec![id.to_string()];
        action.cooldown_secs = cooldown_secs;
        action.confirmation = ConfirmationMode::TimerOnly;
        action.settle_ms = 10;
        action
    }

    fn config(actions: Vec<ActionConfig>) -> HotbarConfig {
        HotbarConfig {
            actions,
            ..HotbarConfig::default()
        }
    }

    fn policy(name: &str, actions: &[&str]) -> PolicyConfig {
        PolicyConfig {
            name: name.to_string(),
            actions: actions.iter().map(|a| a.to_string()).collect(),
        }
    }

    fn build(config: &HotbarConfig) -> Result<ActionRegistry, RegistryError> {
        let probe = ScriptedProbe::new(Rect::new(0, 0, 2, 2), false);
        ActionRegistry::build(config, RecordingActuator::new(), probe)
    }

    #[test]
    fn test_builds_actions_in_config_order() {
        let mut cfg = config(vec![timer_action("b", 1.0), timer_action("a", 2.0)]);
        cfg.policies.push(policy("p", &["a", "b"]));
        cfg.bindings.push(BindingConfig {
            name: "hold".to_string(),
            when: vec!["Key:F1".to_string()],
            target: BindingTarget::Policy("p".to_string()),
        });

        let registry = build(&cfg).unwrap();
        let ids: Vec<_> = registry.actions().iter().map(|a| a.id().as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(registry.action("a").unwrap().tracker().cooldown(), Duration::from_secs(2));
        assert!(registry.action("zzz").is_none());

        let policy = registry.policy("p").unwrap();
        assert_eq!(policy.candidates()[0].id().as_str(), "a");
        assert_eq!(registry.bindings()[0].gates, vec![ConditionId::from("key:f1")]);
        assert!(registry.stopped_workers().is_empty());
    }

    #[test]
    fn test_action_binding_gets_single_policy() {
        let mut cfg = config(vec![timer_action("dash", 0.0)]);
        cfg.bindings.push(BindingConfig {
            name: "dash".to_string(),
            when: vec!["key:space".to_string()],
            target: BindingTarget::Action("dash".to_string()),
        });

        let registry = build(&cfg).unwrap();
        let binding = &registry.bindings()[0];
        assert_eq!(binding.policy.candidates().len(), 1);
        assert!(Arc::ptr_eq(
            &binding.policy.candidates()[0],
            registry.action("dash").unwrap()
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_unknown_references() {
        let cfg = config(vec![timer_action("a", 1.0), timer_action("a", 1.0)]);
        assert!(matches!(build(&cfg), Err(RegistryError::DuplicateAction(id)) if id == "a"));

        let mut cfg = config(vec![timer_action("a", 1.0)]);
        cfg.policies.push(policy("p", &["a", "ghost"]));
        assert!(matches!(
            build(&cfg),
            Err(RegistryError::UnknownAction { action, .. }) if action == "ghost"
        ));

        let mut cfg = config(vec![timer_action("a", 1.0)]);
        cfg.policies.push(policy("p", &["a"]));
        cfg.policies.push(policy("p", &["a"]));
        assert!(matches!(build(&cfg), Err(RegistryError::DuplicatePolicy(_))));

        let mut cfg = config(vec![timer_action("a", 1.0)]);
        cfg.policies.push(policy("empty", &[]));
        assert!(matches!(build(&cfg), Err(RegistryError::EmptyPolicy(_))));

        let mut cfg = config(vec![timer_action("a", 1.0)]);
        cfg.bindings.push(BindingConfig {
            name: "b".to_string(),
            when: vec!["key:f1".to_string()],
            target: BindingTarget::Policy("nope".to_string()),
        });
        assert!(matches!(build(&cfg), Err(RegistryError::UnknownPolicy { .. })));

        let mut cfg = config(vec![timer_action("a", 1.0)]);
        cfg.bindings.push(BindingConfig {
            name: "b".to_string(),
            when: vec![],
            target: BindingTarget::Action("a".to_string()),
        });
        assert!(matches!(build(&cfg), Err(RegistryError::NoConditions(_))));
    }

    #[test]
    fn test_rejects_bad_cooldown() {
        let cfg = config(vec![timer_action("a", -1.0)]);
        assert!(matches!(build(&cfg), Err(RegistryError::InvalidCooldown { .. })));

        let cfg = config(vec![timer_action("a", f64::NAN)]);
        assert!(matches!(build(&cfg), Err(RegistryError::InvalidCooldown { .. })));

        let cfg = config(vec![timer_action("a", f64::INFINITY)]);
        assert!(matches!(build(&cfg), Err(RegistryError::InvalidCooldown { .. })));
    }

    #[test]
    fn test_rejects_cooldown_too_large_for_duration() {
        let cfg = config(vec![timer_action("a", 1e30)]);
        assert!(matches!(
            build(&cfg),
            Err(RegistryError::InvalidCooldown { secs, .. }) if secs == 1e30
        ));

        let registry = build(&config(vec![timer_action("a", 1e9)])).unwrap();
        assert_eq!(
            registry.action("a").unwrap().tracker().cooldown(),
            Duration::from_secs(1_000_000_000)
        );
    }

    #[test]
    fn test_visual_only_requires_icon() {
        let mut action = timer_action("a", 0.0);
        action.confirmation = ConfirmationMode::VisualOnly;
        let cfg = config(vec![action]);
        assert!(matches!(build(&cfg), Err(RegistryError::MissingIcon(_))));
    }

    #[test]
    fn test_loads_icons() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heal.png");
        write_icon(&path);

        let mut action = timer_action("heal", 1.0);
        action.confirmation = ConfirmationMode::VisualPreferred;
        action.icon = Some(path);
        let registry = build(&config(vec![action])).unwrap();

        let pattern = registry.action("heal").unwrap().settings().pattern.clone();
        assert_eq!(pattern.map(|p| (p.width(), p.height())), Some((2, 2)));
    }

    #[test]
    fn test_unreadable_icon_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut action = timer_action("heal", 1.0);
        action.confirmation = ConfirmationMode::VisualPreferred;
        action.icon = Some(dir.path().join("missing.png"));

        let err = build(&config(vec![action])).err().unwrap();
        assert!(matches!(err, RegistryError::Pattern { ref action, .. } if action == "heal"));
    }

    #[test]
    fn test_timer_only_skips_icon_loading() {
        let dir = tempfile::tempdir().unwrap();
        let mut action = timer_action("a", 1.0);
        action.icon = Some(dir.path().join("missing.png"));

        let registry = build(&config(vec![action])).unwrap();
        assert!(registry.action("a").unwrap().settings().pattern.is_none());
    }

    #[test]
    fn test_snapshot_reflects_fires() {
        let registry = build(&config(vec![timer_action("a", 0.5), timer_action("b", 0.5)])).unwrap();
        assert!(registry.action("a").unwrap().attempt().unwrap());

        assert!(wait_for(ms(300), || {
            registry.snapshot()[0].phase == Phase::CoolingDown
        }));
        let snapshot = registry.snapshot();
        assert_eq!(snapshot[0].id.as_str(), "a");
        assert!(snapshot[0].remaining > Duration::ZERO);
        assert_eq!(snapshot[1].phase, Phase::Available);
        assert_eq!(snapshot[1].remaining, Duration::ZERO);
    }

    #[test]
    fn test_router_carries_bindings_and_timing() {
        let mut cfg = config(vec![timer_action("a", 0.0)]);
        cfg.poll_interval_ms = 25;
        cfg.startup_delay_ms = 5;
        cfg.bindings.push(BindingConfig {
            name: "a".to_string(),
            when: vec!["key:a".to_string()],
            target: BindingTarget::Action("a".to_string()),
        });

        let registry = build(&cfg).unwrap();
        let router = registry.router(Arc::new(ConditionBoard::new()));
        assert_eq!(router.bindings().len(), 1);
        assert_eq!(router.bindings()[0].name, "a");
    }
}
