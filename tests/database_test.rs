//! Database functionality tests
//!
//! Migrations, history defaults and session lookups against a file database

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use individual::database::entities::*;
use individual::database::setup_database;
use individual::services::AuthorizationService;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tempfile::NamedTempFile;

/// Create a test database connection with migrations
async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, temp_file))
}

#[tokio::test]
async fn test_database_migrations() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    assert!(individuals::Entity::find().all(&db).await?.is_empty());
    assert!(groups::Entity::find().all(&db).await?.is_empty());
    assert!(group_individuals::Entity::find().all(&db).await?.is_empty());
    assert!(individual_data_sources::Entity::find().all(&db).await?.is_empty());
    assert!(individual_data_source_uploads::Entity::find().all(&db).await?.is_empty());
    assert!(mutation_logs::Entity::find().all(&db).await?.is_empty());
    assert!(record_mutations::Entity::find().all(&db).await?.is_empty());
    assert!(users::Entity::find().all(&db).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_new_records_carry_history_defaults() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    let mut individual = individuals::ActiveModel::new(Some(7));
    individual.first_name = Set("Ada".to_string());
    individual.last_name = Set("Lovelace".to_string());
    individual.dob = Set(NaiveDate::from_ymd_opt(1815, 12, 10).unwrap());
    let individual = individual.insert(&db).await?;

    assert_eq!(individual.version, 1);
    assert!(!individual.is_deleted);
    assert_eq!(individual.user_created, Some(7));
    assert!(individual.date_valid_to.is_none());
    assert!(individual.date_valid_from <= Utc::now());

    let stored = individuals::Entity::find_by_id(individual.id)
        .one(&db)
        .await?
        .expect("individual should be stored");
    assert_eq!(stored, individual);

    Ok(())
}

#[tokio::test]
async fn test_upload_and_data_source_relationship() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    let mut upload = individual_data_source_uploads::ActiveModel::new(None);
    upload.source_name = Set("census.csv".to_string());
    upload.source_type = Set("csv".to_string());
    let upload = upload.insert(&db).await?;
    assert_eq!(upload.get_status(), Some(UploadStatus::Pending));

    let mut source = individual_data_sources::ActiveModel::new(None);
    source.upload_id = Set(Some(upload.id));
    source.json_ext = Set(Some(serde_json::json!({"row": 1})));
    source.insert(&db).await?;

    let sources = individual_data_sources::Entity::find()
        .filter(individual_data_sources::Column::UploadId.eq(upload.id))
        .all(&db)
        .await?;
    assert_eq!(sources.len(), 1);
    assert!(sources[0].individual_id.is_none());

    Ok(())
}

#[tokio::test]
async fn test_session_resolves_to_actor_with_rights() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    let auth = AuthorizationService::new(db.clone());

    let rights = vec!["159001".to_string(), "180001".to_string()];
    let (user, session_id) = auth
        .create_user_with_session("clerk", &rights, chrono::Duration::hours(1))
        .await?;

    let actor = auth.actor_for_session(Some(&session_id)).await?;
    assert_eq!(actor.user_id, Some(user.id));
    assert!(actor.has_right("159001"));
    assert!(actor.has_right("180001"));
    assert!(!actor.has_right("159002"));

    let anonymous = auth.actor_for_session(Some("no-such-session")).await?;
    assert!(anonymous.is_anonymous());

    Ok(())
}
