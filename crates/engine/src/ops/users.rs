use sea_orm::{ActiveValue, prelude::*};

use crate::{EngineError, ResultEngine, users, util::normalize_required_name};

use super::Engine;

impl Engine {
    /// Provision a user in the directory. Used by operator tooling; requests
    /// only ever read users.
    pub async fn register_user(&self, user_id: &str, name: &str) -> ResultEngine<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(EngineError::Validation(
                "user id must not be empty".to_string(),
            ));
        }
        let name = normalize_required_name(name, "user")?;
        users::ActiveModel {
            id: ActiveValue::Set(user_id.to_string()),
            name: ActiveValue::Set(name),
        }
        .insert(&self.database)
        .await?;
        tracing::info!(user_id, "user registered");
        Ok(())
    }

    /// Display name of a known user, `None` if the id is not in the directory.
    pub async fn user_name(&self, user_id: &str) -> ResultEngine<Option<String>> {
        let user = users::Entity::find_by_id(user_id.to_string())
            .one(&self.database)
            .await?;
        Ok(user.map(|u| u.name))
    }
}
