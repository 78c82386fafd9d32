use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use super::group_service::find_live_group;
use super::individual_service::find_live_individual;
use super::mutation_log_service::{
    commit_or_rollback, missing, MutationLogService, MutationMeta, MutationOutcome, TouchedRecord,
};
use super::query::{fetch_page, CommonQueryArgs, Page, PageResult};
use crate::auth::{Actor, Operation};
use crate::config::PermissionConfig;
use crate::database::entities::{group_individuals, EntityKind, GroupRole, RecipientType};
use crate::errors::{CoreError, CoreResult};

#[derive(Clone, Debug, Default)]
pub struct GroupIndividualQueryArgs {
    pub common: CommonQueryArgs,
    pub group_id: Option<Uuid>,
    pub individual_id: Option<Uuid>,
    pub role: Option<GroupRole>,
    pub is_deleted: Option<bool>,
}

/// An individual to add to a group.
#[derive(Clone, Debug)]
pub struct NewMembership {
    pub individual_id: Uuid,
    pub role: Option<GroupRole>,
    pub recipient_type: Option<RecipientType>,
}

#[derive(Clone, Debug)]
pub struct AddIndividualToGroup {
    pub group_id: Uuid,
    pub member: NewMembership,
    pub json_ext: Option<Value>,
}

#[derive(Clone, Debug, Default)]
pub struct EditGroupIndividual {
    pub id: Uuid,
    pub role: Option<GroupRole>,
    pub recipient_type: Option<RecipientType>,
    pub json_ext: Option<Value>,
}

#[derive(Clone, Debug)]
pub struct GroupIndividualService {
    db: DatabaseConnection,
    perms: PermissionConfig,
    mutations: MutationLogService,
}

impl GroupIndividualService {
    pub fn new(db: DatabaseConnection, perms: PermissionConfig) -> Self {
        let mutations = MutationLogService::new(db.clone());
        Self {
            db,
            perms,
            mutations,
        }
    }

    pub async fn query(
        &self,
        actor: &Actor,
        args: &GroupIndividualQueryArgs,
        page: Page,
    ) -> CoreResult<PageResult<group_individuals::Model>> {
        self.perms.check(actor, Operation::GroupSearch)?;
        let filters = self.filters(args);
        fetch_page::<group_individuals::Entity, _>(&self.db, filters, &args.common.order_by, page)
            .await
    }

    pub fn filters(&self, args: &GroupIndividualQueryArgs) -> Vec<Condition> {
        let mut filters = args.common.conditions::<group_individuals::Entity>();

        if let Some(group_id) = args.group_id {
            filters.push(Condition::all().add(group_individuals::Column::GroupId.eq(group_id)));
        }
        if let Some(individual_id) = args.individual_id {
            filters.push(
                Condition::all().add(group_individuals::Column::IndividualId.eq(individual_id)),
            );
        }
        if let Some(role) = args.role {
            filters.push(Condition::all().add(group_individuals::Column::Role.eq(role.as_str())));
        }
        if let Some(is_deleted) = args.is_deleted {
            filters.push(Condition::all().add(group_individuals::Column::IsDeleted.eq(is_deleted)));
        }

        filters
    }

    pub async fn add(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        input: AddIndividualToGroup,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::GroupUpdate)?;
        let log = self.mutations.begin("addIndividualToGroup", meta, actor).await?;

        let txn = self.db.begin().await?;
        let result = add_to_group(&txn, actor, input).await;
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }

    pub async fn edit(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        input: EditGroupIndividual,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::GroupUpdate)?;
        let log = self.mutations.begin("editIndividualInGroup", meta, actor).await?;

        let txn = self.db.begin().await?;
        let result = edit_membership(&txn, actor, input).await;
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }

    pub async fn remove(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        ids: Vec<Uuid>,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::GroupUpdate)?;
        let log = self
            .mutations
            .begin("removeIndividualFromGroup", meta, actor)
            .await?;

        let txn = self.db.begin().await?;
        let result = remove_memberships(&txn, actor, &ids).await;
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }
}

async fn find_live_membership<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> CoreResult<group_individuals::Model> {
    group_individuals::Entity::find_by_id(id)
        .filter(group_individuals::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| missing(EntityKind::GroupIndividual, id))
}

/// Fails when `group_id` already has a live HEAD other than `except`.
async fn ensure_no_other_head<C: ConnectionTrait>(
    db: &C,
    group_id: Uuid,
    except: Option<Uuid>,
) -> CoreResult<()> {
    let mut query = group_individuals::Entity::find()
        .filter(group_individuals::Column::GroupId.eq(group_id))
        .filter(group_individuals::Column::Role.eq(GroupRole::Head.as_str()))
        .filter(group_individuals::Column::IsDeleted.eq(false));
    if let Some(id) = except {
        query = query.filter(group_individuals::Column::Id.ne(id));
    }

    if query.count(db).await? > 0 {
        return Err(CoreError::conflict(format!(
            "Group '{}' already has a HEAD",
            group_id
        )));
    }
    Ok(())
}

/// Inserts a membership after checking the group and individual exist, the
/// individual is not already an active member and the group keeps a single
/// HEAD.
pub(crate) async fn insert_membership<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    group_id: Uuid,
    member: NewMembership,
) -> CoreResult<group_individuals::Model> {
    find_live_group(db, group_id).await?;
    find_live_individual(db, member.individual_id).await?;

    let existing = group_individuals::Entity::find()
        .filter(group_individuals::Column::GroupId.eq(group_id))
        .filter(group_individuals::Column::IndividualId.eq(member.individual_id))
        .filter(group_individuals::Column::IsDeleted.eq(false))
        .count(db)
        .await?;
    if existing > 0 {
        return Err(CoreError::conflict(format!(
            "Individual '{}' is already a member of group '{}'",
            member.individual_id, group_id
        )));
    }

    if member.role == Some(GroupRole::Head) {
        ensure_no_other_head(db, group_id, None).await?;
    }

    let mut model = group_individuals::ActiveModel::new(actor.user_id);
    model.group_id = Set(group_id);
    model.individual_id = Set(member.individual_id);
    model.role = Set(member.role.map(|role| role.as_str().to_string()));
    model.recipient_type = Set(member
        .recipient_type
        .map(|recipient| recipient.as_str().to_string()));
    Ok(model.insert(db).await?)
}

async fn add_to_group<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: AddIndividualToGroup,
) -> CoreResult<Vec<TouchedRecord>> {
    let membership = insert_membership(db, actor, input.group_id, input.member).await?;

    let membership = match input.json_ext {
        Some(json_ext) => {
            let mut model: group_individuals::ActiveModel = membership.into();
            model.json_ext = Set(Some(json_ext));
            model.update(db).await?
        }
        None => membership,
    };

    Ok(vec![TouchedRecord::new(
        EntityKind::GroupIndividual,
        membership.id,
    )])
}

async fn edit_membership<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: EditGroupIndividual,
) -> CoreResult<Vec<TouchedRecord>> {
    let existing = find_live_membership(db, input.id).await?;
    let group_id = existing.group_id;
    let version = existing.version;
    let mut model: group_individuals::ActiveModel = existing.into();

    if let Some(role) = input.role {
        if role == GroupRole::Head {
            ensure_no_other_head(db, group_id, Some(input.id)).await?;
        }
        model.role = Set(Some(role.as_str().to_string()));
    }
    if let Some(recipient_type) = input.recipient_type {
        model.recipient_type = Set(Some(recipient_type.as_str().to_string()));
    }
    if let Some(json_ext) = input.json_ext {
        model.json_ext = Set(Some(json_ext));
    }
    model.version = Set(version + 1);
    model.date_updated = Set(Utc::now());
    model.user_updated = Set(actor.user_id);

    let membership = model.update(db).await?;
    Ok(vec![TouchedRecord::new(
        EntityKind::GroupIndividual,
        membership.id,
    )])
}

async fn remove_memberships<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    ids: &[Uuid],
) -> CoreResult<Vec<TouchedRecord>> {
    if ids.is_empty() {
        return Err(CoreError::invalid_field("ids", "at least one id is required"));
    }

    let now = Utc::now();
    let mut touched = Vec::with_capacity(ids.len());
    for id in ids {
        let existing = find_live_membership(db, *id).await?;
        let version = existing.version;
        let mut model: group_individuals::ActiveModel = existing.into();
        model.is_deleted = Set(true);
        model.version = Set(version + 1);
        model.date_updated = Set(now);
        model.user_updated = Set(actor.user_id);
        model.update(db).await?;
        touched.push(TouchedRecord::new(EntityKind::GroupIndividual, *id));
    }
    Ok(touched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::{groups, individuals, MutationStatus};
    use crate::database::test_utils::setup_test_db;
    use crate::errors::CoreErrorKind;
    use chrono::NaiveDate;

    fn admin() -> Actor {
        Actor::user(1).with_rights(["180001", "180003"])
    }

    async fn seed(db: &DatabaseConnection) -> (Uuid, Uuid, Uuid) {
        let mut group = groups::ActiveModel::new(Some(1));
        group.code = Set("HH-9".to_string());
        let group = group.insert(db).await.unwrap();

        let mut ids = Vec::new();
        for name in ["Ines", "Joao"] {
            let mut model = individuals::ActiveModel::new(Some(1));
            model.first_name = Set(name.to_string());
            model.last_name = Set("Silva".to_string());
            model.dob = Set(NaiveDate::from_ymd_opt(1970, 3, 3).unwrap());
            ids.push(model.insert(db).await.unwrap().id);
        }
        (group.id, ids[0], ids[1])
    }

    fn add(group_id: Uuid, individual_id: Uuid, role: Option<GroupRole>) -> AddIndividualToGroup {
        AddIndividualToGroup {
            group_id,
            member: NewMembership {
                individual_id,
                role,
                recipient_type: Some(RecipientType::Primary),
            },
            json_ext: None,
        }
    }

    #[tokio::test]
    async fn test_membership_mutations_require_group_update_right() {
        let db = setup_test_db().await.unwrap();
        let service = GroupIndividualService::new(db.clone(), PermissionConfig::default());
        let (group_id, ines, _) = seed(&db).await;

        let err = service
            .add(
                &Actor::user(2).with_right("180001"),
                &MutationMeta::default(),
                add(group_id, ines, None),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_individual_is_member_once() {
        let db = setup_test_db().await.unwrap();
        let service = GroupIndividualService::new(db.clone(), PermissionConfig::default());
        let (group_id, ines, _) = seed(&db).await;
        let actor = admin();

        let first = service
            .add(&actor, &MutationMeta::default(), add(group_id, ines, None))
            .await
            .unwrap();
        assert_eq!(first.status, MutationStatus::Success);

        let second = service
            .add(&actor, &MutationMeta::default(), add(group_id, ines, None))
            .await
            .unwrap();
        assert_eq!(second.status, MutationStatus::Error);

        // a removed membership no longer blocks re-adding
        service
            .remove(&actor, &MutationMeta::default(), first.record_ids.clone())
            .await
            .unwrap();
        let third = service
            .add(&actor, &MutationMeta::default(), add(group_id, ines, None))
            .await
            .unwrap();
        assert_eq!(third.status, MutationStatus::Success);
    }

    #[tokio::test]
    async fn test_single_head_per_group() {
        let db = setup_test_db().await.unwrap();
        let service = GroupIndividualService::new(db.clone(), PermissionConfig::default());
        let (group_id, ines, joao) = seed(&db).await;
        let actor = admin();

        service
            .add(
                &actor,
                &MutationMeta::default(),
                add(group_id, ines, Some(GroupRole::Head)),
            )
            .await
            .unwrap();
        let spouse = service
            .add(
                &actor,
                &MutationMeta::default(),
                add(group_id, joao, Some(GroupRole::Spouse)),
            )
            .await
            .unwrap();

        let promoted = service
            .edit(
                &actor,
                &MutationMeta::default(),
                EditGroupIndividual {
                    id: spouse.record_ids[0],
                    role: Some(GroupRole::Head),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(promoted.status, MutationStatus::Error);
        assert!(promoted.error.unwrap().contains("HEAD"));
    }

    #[tokio::test]
    async fn test_query_filters_by_group_and_role() {
        let db = setup_test_db().await.unwrap();
        let service = GroupIndividualService::new(db.clone(), PermissionConfig::default());
        let (group_id, ines, joao) = seed(&db).await;
        let actor = admin();

        service
            .add(
                &actor,
                &MutationMeta::default(),
                add(group_id, ines, Some(GroupRole::Head)),
            )
            .await
            .unwrap();
        service
            .add(
                &actor,
                &MutationMeta::default(),
                add(group_id, joao, Some(GroupRole::Son)),
            )
            .await
            .unwrap();

        let args = GroupIndividualQueryArgs {
            group_id: Some(group_id),
            role: Some(GroupRole::Son),
            ..Default::default()
        };
        let page = service.query(&actor, &args, Page::default()).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].individual_id, joao);
        assert_eq!(page.items[0].get_role(), Some(GroupRole::Son));
    }
}
