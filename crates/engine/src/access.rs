//! Access control over a loaded [`Pocket`].
//!
//! Every pocket- or spend-scoped operation goes through [`require_read`] or
//! [`require_write`]. A failed check is [`EngineError::Forbidden`], never
//! `KeyNotFound`: the caller learns the pocket exists, not what is in it.

use serde::{Deserialize, Serialize};

use crate::{EngineError, Pocket, ResultEngine};

/// The single role a user holds on a pocket. Ownership wins over list
/// membership, then editing over watching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Owner,
    Editor,
    Watcher,
    None,
}

impl Role {
    pub fn can_write(self) -> bool {
        matches!(self, Self::Owner | Self::Editor)
    }

    pub fn can_read(self) -> bool {
        self != Self::None
    }
}

pub fn role_of(pocket: &Pocket, user_id: &str) -> Role {
    if pocket.owner_id == user_id {
        Role::Owner
    } else if pocket.editor_ids.contains(user_id) {
        Role::Editor
    } else if pocket.watcher_ids.contains(user_id) {
        Role::Watcher
    } else {
        Role::None
    }
}

pub fn can_write(pocket: &Pocket, user_id: &str) -> bool {
    role_of(pocket, user_id).can_write()
}

pub fn can_read(pocket: &Pocket, user_id: &str) -> bool {
    role_of(pocket, user_id).can_read()
}

pub fn require_read(pocket: &Pocket, user_id: &str) -> ResultEngine<()> {
    if !can_read(pocket, user_id) {
        return Err(EngineError::Forbidden(
            "no read access to pocket".to_string(),
        ));
    }
    Ok(())
}

pub fn require_write(pocket: &Pocket, user_id: &str) -> ResultEngine<()> {
    if !can_write(pocket, user_id) {
        return Err(EngineError::Forbidden(
            "no write access to pocket".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::Currency;

    fn pocket(owner: &str, editors: &[&str], watchers: &[&str]) -> Pocket {
        let now = Utc::now();
        Pocket {
            id: Uuid::nil(),
            owner_id: owner.to_string(),
            editor_ids: editors.iter().map(ToString::to_string).collect(),
            watcher_ids: watchers.iter().map(ToString::to_string).collect(),
            name: "Household".to_string(),
            currency: Currency::Idr,
            icon: String::new(),
            balance: 0,
            level: 1,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn owner_has_full_access_even_outside_lists() {
        let p = pocket("alice", &[], &[]);
        assert_eq!(role_of(&p, "alice"), Role::Owner);
        assert!(can_write(&p, "alice"));
        assert!(can_read(&p, "alice"));
    }

    #[test]
    fn watcher_reads_but_cannot_write() {
        let p = pocket("alice", &["bob"], &["carol"]);
        assert!(can_read(&p, "carol"));
        assert!(!can_write(&p, "carol"));
        assert_eq!(
            require_write(&p, "carol"),
            Err(EngineError::Forbidden("no write access to pocket".to_string()))
        );
    }

    #[test]
    fn stranger_is_forbidden_not_missing() {
        let p = pocket("alice", &["bob"], &["carol"]);
        assert_eq!(role_of(&p, "mallory"), Role::None);
        assert!(matches!(
            require_read(&p, "mallory"),
            Err(EngineError::Forbidden(_))
        ));
    }

    #[test]
    fn exactly_one_role_applies_and_write_implies_read() {
        let p = pocket("alice", &["alice", "bob", "dave"], &["alice", "bob", "carol"]);
        for user in ["alice", "bob", "carol", "dave", "erin"] {
            let role = role_of(&p, user);
            let holds = [
                role == Role::Owner,
                role == Role::Editor,
                role == Role::Watcher,
                role == Role::None,
            ];
            assert_eq!(holds.iter().filter(|h| **h).count(), 1, "user {user}");
            if can_write(&p, user) {
                assert!(can_read(&p, user), "user {user}");
            }
        }
        assert_eq!(role_of(&p, "bob"), Role::Editor);
        assert_eq!(role_of(&p, "carol"), Role::Watcher);
    }
}
