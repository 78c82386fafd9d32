use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect,
};

use crate::auth::Actor;
use crate::database::entities::{user_rights, user_sessions, users};
use crate::errors::{CoreError, CoreResult};

/// Resolves request sessions into actors.
#[derive(Clone, Debug)]
pub struct AuthorizationService {
    db: DatabaseConnection,
}

impl AuthorizationService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Actor behind `session_id`. Unknown, inactive and expired sessions,
    /// and deactivated users, resolve to an anonymous actor so the
    /// permission check reports a plain `Unauthorized`.
    pub async fn actor_for_session(&self, session_id: Option<&str>) -> CoreResult<Actor> {
        let Some(session_id) = session_id else {
            return Ok(Actor::anonymous());
        };

        let session = user_sessions::Entity::find()
            .filter(user_sessions::Column::SessionId.eq(session_id))
            .filter(user_sessions::Column::IsActive.eq(true))
            .one(&self.db)
            .await?;

        let Some(session) = session else {
            tracing::debug!("Unknown or inactive session");
            return Ok(Actor::anonymous());
        };

        if session.expires_at <= Utc::now() {
            tracing::debug!(user_id = session.user_id, "Session expired");
            return Ok(Actor::anonymous());
        }

        let user = users::Entity::find_by_id(session.user_id)
            .one(&self.db)
            .await?;

        match user {
            Some(user) if user.is_active => {
                let rights = self.rights_for_user(user.id).await?;
                Ok(Actor::user(user.id).with_rights(rights))
            }
            _ => Ok(Actor::anonymous()),
        }
    }

    pub async fn rights_for_user(&self, user_id: i32) -> CoreResult<Vec<String>> {
        let rights = user_rights::Entity::find()
            .select_only()
            .column(user_rights::Column::RightCode)
            .filter(user_rights::Column::UserId.eq(user_id))
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(rights)
    }

    /// Create a user with the given rights and an open session; returns the
    /// user and the session id.
    pub async fn create_user_with_session(
        &self,
        username: &str,
        rights: &[String],
        ttl: chrono::Duration,
    ) -> CoreResult<(users::Model, String)> {
        if username.trim().is_empty() {
            return Err(CoreError::invalid_field("username", "must not be empty"));
        }

        let existing = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(CoreError::conflict(format!(
                "User '{}' already exists",
                username
            )));
        }

        let user = users::ActiveModel::new(username).insert(&self.db).await?;
        for right in rights {
            user_rights::ActiveModel::grant(user.id, right.clone())
                .insert(&self.db)
                .await?;
        }

        let session = user_sessions::ActiveModel::new(user.id, ttl)
            .insert(&self.db)
            .await?;

        tracing::info!(user_id = user.id, "Created user '{}'", user.username);
        Ok((user, session.session_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use sea_orm::Set;

    #[tokio::test]
    async fn test_missing_session_is_anonymous() {
        let db = setup_test_db().await.unwrap();
        let service = AuthorizationService::new(db);

        assert!(service.actor_for_session(None).await.unwrap().is_anonymous());
        assert!(service
            .actor_for_session(Some("nope"))
            .await
            .unwrap()
            .is_anonymous());
    }

    #[tokio::test]
    async fn test_session_resolves_user_rights() {
        let db = setup_test_db().await.unwrap();
        let service = AuthorizationService::new(db);

        let (user, session_id) = service
            .create_user_with_session(
                "admin",
                &["159001".to_string(), "180001".to_string()],
                chrono::Duration::hours(1),
            )
            .await
            .unwrap();

        let actor = service.actor_for_session(Some(&session_id)).await.unwrap();
        assert_eq!(actor.user_id, Some(user.id));
        assert!(actor.has_right("159001"));
        assert!(actor.has_right("180001"));
        assert!(!actor.has_right("159002"));
    }

    #[tokio::test]
    async fn test_expired_session_is_anonymous() {
        let db = setup_test_db().await.unwrap();
        let service = AuthorizationService::new(db.clone());

        let (_, session_id) = service
            .create_user_with_session("late", &[], chrono::Duration::hours(1))
            .await
            .unwrap();

        let session = user_sessions::Entity::find()
            .filter(user_sessions::Column::SessionId.eq(session_id.as_str()))
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        let mut session: user_sessions::ActiveModel = session.into();
        session.expires_at = Set(Utc::now() - chrono::Duration::minutes(1));
        session.update(&db).await.unwrap();

        let actor = service.actor_for_session(Some(&session_id)).await.unwrap();
        assert!(actor.is_anonymous());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let db = setup_test_db().await.unwrap();
        let service = AuthorizationService::new(db);

        service
            .create_user_with_session("dup", &[], chrono::Duration::hours(1))
            .await
            .unwrap();
        let err = service
            .create_user_with_session("dup", &[], chrono::Duration::hours(1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), crate::errors::CoreErrorKind::Conflict);
    }
}
