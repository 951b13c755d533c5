//! Static claims used when no live feed answers.

use serde::Deserialize;
use truthguard_core::{Claim, Scope, EMERGENCY_SOURCE_LABEL};

use crate::config::{ConfigError, EmergencySettings};

const BUILTIN_SNAPSHOT: &str = include_str!("../../data/emergency.yaml");

/// Per-scope fallback claims.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct EmergencySnapshot {
    local: Vec<Claim>,
    global: Vec<Claim>,
}

impl EmergencySnapshot {
    /// Snapshot embedded in the binary.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::from_yaml(BUILTIN_SNAPSHOT)
    }

    /// Parse a snapshot document with `local` and `global` claim lists.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let snapshot: Self = serde_yaml::from_str(yaml)?;
        Ok(snapshot.stamped())
    }

    /// Built-in snapshot with any configured scope lists taking its place.
    pub fn from_settings(settings: &EmergencySettings) -> Result<Self, ConfigError> {
        let mut snapshot = Self::builtin()?;
        if !settings.local.is_empty() {
            snapshot.local = settings.local.clone();
        }
        if !settings.global.is_empty() {
            snapshot.global = settings.global.clone();
        }
        Ok(snapshot.stamped())
    }

    /// Claims for a scope, labelled as emergency data.
    pub fn claims(&self, scope: Scope) -> Vec<Claim> {
        match scope {
            Scope::Local => self.local.clone(),
            Scope::Global => self.global.clone(),
        }
    }

    fn stamped(mut self) -> Self {
        for claim in self.local.iter_mut().chain(self.global.iter_mut()) {
            claim.source_label = EMERGENCY_SOURCE_LABEL.to_string();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_has_two_claims_per_scope() {
        let snapshot = EmergencySnapshot::builtin().unwrap();
        for scope in Scope::ALL {
            let claims = snapshot.claims(scope);
            assert!(claims.len() >= 2, "{scope} snapshot too small");
            assert!(claims.iter().all(|c| c.source_label == EMERGENCY_SOURCE_LABEL));
            assert!(claims.iter().all(|c| c.title.chars().count() > 10));
        }
    }

    #[test]
    fn test_settings_override_only_their_scope() {
        let settings = EmergencySettings {
            local: vec![Claim::new("Configured local emergency claim", "https://x.test", "")],
            global: vec![],
        };

        let snapshot = EmergencySnapshot::from_settings(&settings).unwrap();

        let local = snapshot.claims(Scope::Local);
        assert_eq!(local.len(), 1);
        assert_eq!(local[0].source_label, EMERGENCY_SOURCE_LABEL);
        assert_eq!(
            snapshot.claims(Scope::Global),
            EmergencySnapshot::builtin().unwrap().claims(Scope::Global)
        );
    }

    #[test]
    fn test_empty_settings_fall_back_to_builtin() {
        let snapshot = EmergencySnapshot::from_settings(&EmergencySettings::default()).unwrap();
        assert_eq!(snapshot, EmergencySnapshot::builtin().unwrap());
    }
}
