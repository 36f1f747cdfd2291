//! One-shot suppression of self-caused structural events.
//!
//! After spawning the menu program, the next window-creation notification
//! belongs to that helper and must not be tracked like a user window. The
//! flag is armed when the spawn happens and consumed by exactly one
//! subsequent structural event.

/// Why suppression was armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    /// The menu program was just spawned; its window is mapped but not
    /// tracked.
    MenuSpawn,
}

/// `Inactive | Active(reason)`, consumed by exactly one structural event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Suppression {
    #[default]
    Inactive,
    Active(SuppressReason),
}

impl Suppression {
    pub fn arm(&mut self, reason: SuppressReason) {
        *self = Suppression::Active(reason);
    }

    /// Take the armed reason, resetting to `Inactive`. Returns `None` when
    /// nothing was armed.
    pub fn consume(&mut self) -> Option<SuppressReason> {
        match std::mem::take(self) {
            Suppression::Inactive => None,
            Suppression::Active(reason) => Some(reason),
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Suppression::Active(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_is_one_shot() {
        let mut s = Suppression::default();
        assert_eq!(s.consume(), None);

        s.arm(SuppressReason::MenuSpawn);
        assert!(s.is_active());
        assert_eq!(s.consume(), Some(SuppressReason::MenuSpawn));

        // A second structural event sees nothing.
        assert!(!s.is_active());
        assert_eq!(s.consume(), None);
    }

    #[test]
    fn test_rearming_replaces_state() {
        let mut s = Suppression::default();
        s.arm(SuppressReason::MenuSpawn);
        s.arm(SuppressReason::MenuSpawn);
        assert_eq!(s.consume(), Some(SuppressReason::MenuSpawn));
        assert_eq!(s.consume(), None);
    }
}
