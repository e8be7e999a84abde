//! Learning context: the (task type, energy level) pair that scopes all
//! per-user adaptation.
//!
//! In-memory lookups use [`ContextKey`] directly (derived equality/hash);
//! the `task|energy` string form exists only at the persistence boundary.

use serde::{Deserialize, Serialize};

/// Self-reported energy level for a session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EnergyLevel {
    /// Low energy (e.g., end of day)
    Low,
    /// Medium energy (default)
    Mid,
    /// High energy (e.g., morning)
    High,
    /// User did not report energy
    Unset,
}

impl Default for EnergyLevel {
    fn default() -> Self {
        EnergyLevel::Unset
    }
}

impl EnergyLevel {
    /// Stable string form used in persistence keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Low => "low",
            EnergyLevel::Mid => "mid",
            EnergyLevel::High => "high",
            EnergyLevel::Unset => "unset",
        }
    }

    /// Energy levels strictly below this one in the low < mid < high
    /// hierarchy, highest first. `Unset` stands outside the hierarchy.
    pub fn lower_levels(&self) -> &'static [EnergyLevel] {
        match self {
            EnergyLevel::High => &[EnergyLevel::Mid, EnergyLevel::Low],
            EnergyLevel::Mid => &[EnergyLevel::Low],
            EnergyLevel::Low | EnergyLevel::Unset => &[],
        }
    }
}

/// Key scoping all learned state to one (task type, energy level) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ContextKey {
    /// Free-form task type label (case-sensitive, opaque)
    pub task_type: String,
    /// Self-reported energy level
    pub energy: EnergyLevel,
}

impl ContextKey {
    pub fn new(task_type: impl Into<String>, energy: EnergyLevel) -> Self {
        Self {
            task_type: task_type.into(),
            energy,
        }
    }

    /// Persistence-boundary key, `task_type|energy`.
    pub fn storage_key(&self) -> String {
        format!("{}|{}", self.task_type, self.energy.as_str())
    }

    /// Derived context for break-length learning: same energy, task type
    /// suffixed with `-break` so break arms never mix with focus arms.
    pub fn break_context(&self) -> ContextKey {
        ContextKey {
            task_type: format!("{}-break", self.task_type),
            energy: self.energy,
        }
    }

    /// Same task at a different energy level.
    pub fn with_energy(&self, energy: EnergyLevel) -> ContextKey {
        ContextKey {
            task_type: self.task_type.clone(),
            energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_is_case_sensitive() {
        let a = ContextKey::new("Coding", EnergyLevel::Mid);
        let b = ContextKey::new("coding", EnergyLevel::Mid);
        assert_ne!(a.storage_key(), b.storage_key());
        assert_eq!(a.storage_key(), "Coding|mid");
    }

    #[test]
    fn test_break_context_derivation() {
        let ctx = ContextKey::new("writing", EnergyLevel::High);
        let brk = ctx.break_context();
        assert_eq!(brk.task_type, "writing-break");
        assert_eq!(brk.energy, EnergyLevel::High);
    }

    #[test]
    fn test_lower_levels_hierarchy() {
        assert_eq!(
            EnergyLevel::High.lower_levels(),
            &[EnergyLevel::Mid, EnergyLevel::Low]
        );
        assert_eq!(EnergyLevel::Mid.lower_levels(), &[EnergyLevel::Low]);
        assert!(EnergyLevel::Low.lower_levels().is_empty());
        assert!(EnergyLevel::Unset.lower_levels().is_empty());
    }
}
