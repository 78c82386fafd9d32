use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use super::group_individual_service::{insert_membership, NewMembership};
use super::mutation_log_service::{
    commit_or_rollback, missing, MutationLogService, MutationMeta, MutationOutcome, TouchedRecord,
};
use super::query::{fetch_page, CommonQueryArgs, Page, PageResult};
use super::require_text;
use crate::auth::{Actor, Operation};
use crate::config::PermissionConfig;
use crate::database::entities::{group_individuals, groups, individuals, EntityKind, GroupRole};
use crate::errors::{CoreError, CoreResult};
use crate::filters::custom::{
    BENEFIT_PLAN_OBJECT, GROUP_BENEFICIARY_RELATION, SOCIAL_PROTECTION_MODULE,
};
use crate::filters::lookups::icontains;
use crate::filters::CustomFilterRegistry;

#[derive(Clone, Debug, Default)]
pub struct GroupQueryArgs {
    pub common: CommonQueryArgs,
    /// Groups with a member whose first name contains this value.
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub code_icontains: Option<String>,
    pub is_deleted: Option<bool>,
    /// Custom filters over the group's own `json_ext`.
    pub custom_filters: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct CreateGroup {
    pub code: String,
    pub json_ext: Option<Value>,
}

#[derive(Clone, Debug, Default)]
pub struct UpdateGroup {
    pub id: Uuid,
    pub code: Option<String>,
    pub json_ext: Option<Value>,
}

/// A group created together with its members.
#[derive(Clone, Debug)]
pub struct CreateGroupWithIndividuals {
    pub code: String,
    pub json_ext: Option<Value>,
    pub individuals: Vec<NewMembership>,
}

#[derive(Clone, Debug)]
pub struct GroupService {
    db: DatabaseConnection,
    perms: PermissionConfig,
    custom_filters: Arc<CustomFilterRegistry>,
    mutations: MutationLogService,
}

impl GroupService {
    pub fn new(
        db: DatabaseConnection,
        perms: PermissionConfig,
        custom_filters: Arc<CustomFilterRegistry>,
    ) -> Self {
        let mutations = MutationLogService::new(db.clone());
        Self {
            db,
            perms,
            custom_filters,
            mutations,
        }
    }

    pub async fn query(
        &self,
        actor: &Actor,
        args: &GroupQueryArgs,
        page: Page,
    ) -> CoreResult<PageResult<groups::Model>> {
        self.perms.check(actor, Operation::GroupSearch)?;
        let filters = self.filters(args)?;
        fetch_page::<groups::Entity, _>(&self.db, filters, &args.common.order_by, page).await
    }

    pub fn filters(&self, args: &GroupQueryArgs) -> CoreResult<Vec<Condition>> {
        let mut filters = args.common.conditions::<groups::Entity>();

        if let Some(first_name) = &args.first_name {
            filters.push(groups_with_member_named(individuals::Column::FirstName, first_name));
        }
        if let Some(last_name) = &args.last_name {
            filters.push(groups_with_member_named(individuals::Column::LastName, last_name));
        }
        if let Some(code) = &args.code_icontains {
            let column = Expr::col((groups::Entity, groups::Column::Code));
            filters.push(Condition::all().add(icontains(column, code)));
        }
        if let Some(is_deleted) = args.is_deleted {
            filters.push(Condition::all().add(groups::Column::IsDeleted.eq(is_deleted)));
        }

        let custom = self.custom_filters.build_custom_filters(
            SOCIAL_PROTECTION_MODULE,
            BENEFIT_PLAN_OBJECT,
            &args.custom_filters,
            Expr::col((groups::Entity, groups::Column::JsonExt)).into(),
            Some(GROUP_BENEFICIARY_RELATION),
        )?;
        if let Some(custom) = custom {
            filters.push(custom);
        }

        Ok(filters)
    }

    pub async fn create(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        input: CreateGroup,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::GroupCreate)?;
        let log = self.mutations.begin("createGroup", meta, actor).await?;

        let txn = self.db.begin().await?;
        let result = create_group(&txn, actor, &input.code, input.json_ext)
            .await
            .map(|group| vec![TouchedRecord::new(EntityKind::Group, group.id)]);
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        input: UpdateGroup,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::GroupUpdate)?;
        let log = self.mutations.begin("updateGroup", meta, actor).await?;

        let txn = self.db.begin().await?;
        let result = update_group(&txn, actor, input).await;
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }

    /// Soft-deletes the groups in `ids` together with their memberships.
    pub async fn delete(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        ids: Vec<Uuid>,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::GroupDelete)?;
        let log = self.mutations.begin("deleteGroup", meta, actor).await?;

        let txn = self.db.begin().await?;
        let result = delete_groups(&txn, actor, &ids).await;
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }

    /// Creates a group and all its memberships atomically.
    pub async fn create_with_individuals(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        input: CreateGroupWithIndividuals,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::GroupCreate)?;
        let log = self
            .mutations
            .begin("createGroupIndividuals", meta, actor)
            .await?;

        let txn = self.db.begin().await?;
        let result = create_group_with_individuals(&txn, actor, input).await;
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }
}

/// Groups having a live membership of an individual whose `column`
/// contains `value`, ignoring case. Each group matches once.
fn groups_with_member_named(column: individuals::Column, value: &str) -> Condition {
    let matching = Query::select()
        .column((group_individuals::Entity, group_individuals::Column::GroupId))
        .from(group_individuals::Entity)
        .inner_join(
            individuals::Entity,
            Expr::col((individuals::Entity, individuals::Column::Id)).equals((
                group_individuals::Entity,
                group_individuals::Column::IndividualId,
            )),
        )
        .and_where(group_individuals::Column::IsDeleted.eq(false))
        .and_where(icontains(Expr::col((individuals::Entity, column)), value))
        .to_owned();

    Condition::all().add(groups::Column::Id.in_subquery(matching))
}

pub(crate) async fn find_live_group<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> CoreResult<groups::Model> {
    groups::Entity::find_by_id(id)
        .filter(groups::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| missing(EntityKind::Group, id))
}

async fn ensure_code_available<C: ConnectionTrait>(
    db: &C,
    code: &str,
    except: Option<Uuid>,
) -> CoreResult<()> {
    let mut query = groups::Entity::find()
        .filter(groups::Column::Code.eq(code))
        .filter(groups::Column::IsDeleted.eq(false));
    if let Some(id) = except {
        query = query.filter(groups::Column::Id.ne(id));
    }

    if query.count(db).await? > 0 {
        return Err(CoreError::conflict(format!(
            "Group with code '{}' already exists",
            code
        )));
    }
    Ok(())
}

async fn create_group<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    code: &str,
    json_ext: Option<Value>,
) -> CoreResult<groups::Model> {
    let code = require_text("code", code)?;
    ensure_code_available(db, &code, None).await?;

    let mut model = groups::ActiveModel::new(actor.user_id);
    model.code = Set(code);
    model.json_ext = Set(json_ext);
    Ok(model.insert(db).await?)
}

async fn update_group<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: UpdateGroup,
) -> CoreResult<Vec<TouchedRecord>> {
    let existing = find_live_group(db, input.id).await?;
    let version = existing.version;
    let mut model: groups::ActiveModel = existing.into();

    if let Some(code) = &input.code {
        let code = require_text("code", code)?;
        ensure_code_available(db, &code, Some(input.id)).await?;
        model.code = Set(code);
    }
    if let Some(json_ext) = input.json_ext {
        model.json_ext = Set(Some(json_ext));
    }
    model.version = Set(version + 1);
    model.date_updated = Set(Utc::now());
    model.user_updated = Set(actor.user_id);

    let group = model.update(db).await?;
    Ok(vec![TouchedRecord::new(EntityKind::Group, group.id)])
}

async fn delete_groups<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    ids: &[Uuid],
) -> CoreResult<Vec<TouchedRecord>> {
    if ids.is_empty() {
        return Err(CoreError::invalid_field("ids", "at least one id is required"));
    }

    let now = Utc::now();
    let mut touched = Vec::new();
    for id in ids {
        let existing = find_live_group(db, *id).await?;
        let version = existing.version;
        let mut model: groups::ActiveModel = existing.into();
        model.is_deleted = Set(true);
        model.version = Set(version + 1);
        model.date_updated = Set(now);
        model.user_updated = Set(actor.user_id);
        model.update(db).await?;
        touched.push(TouchedRecord::new(EntityKind::Group, *id));
    }

    let memberships = group_individuals::Entity::find()
        .filter(group_individuals::Column::GroupId.is_in(ids.iter().copied()))
        .filter(group_individuals::Column::IsDeleted.eq(false))
        .all(db)
        .await?;
    for membership in memberships {
        let id = membership.id;
        let version = membership.version;
        let mut model: group_individuals::ActiveModel = membership.into();
        model.is_deleted = Set(true);
        model.version = Set(version + 1);
        model.date_updated = Set(now);
        model.user_updated = Set(actor.user_id);
        model.update(db).await?;
        touched.push(TouchedRecord::new(EntityKind::GroupIndividual, id));
    }

    Ok(touched)
}

async fn create_group_with_individuals<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: CreateGroupWithIndividuals,
) -> CoreResult<Vec<TouchedRecord>> {
    let mut seen = HashSet::new();
    for member in &input.individuals {
        if !seen.insert(member.individual_id) {
            return Err(CoreError::invalid_field(
                "individualsData",
                format!("individual '{}' is listed more than once", member.individual_id),
            ));
        }
    }
    let heads = input
        .individuals
        .iter()
        .filter(|member| member.role == Some(GroupRole::Head))
        .count();
    if heads > 1 {
        return Err(CoreError::invalid_field(
            "individualsData",
            "a group can have only one HEAD",
        ));
    }

    let group = create_group(db, actor, &input.code, input.json_ext).await?;
    let mut touched = vec![TouchedRecord::new(EntityKind::Group, group.id)];

    for member in input.individuals {
        let membership = insert_membership(db, actor, group.id, member).await?;
        touched.push(TouchedRecord::new(EntityKind::GroupIndividual, membership.id));
    }

    tracing::info!(
        group_id = %group.id,
        members = touched.len() - 1,
        "created group with members"
    );
    Ok(touched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::entities::MutationStatus;
    use crate::database::test_utils::setup_test_db;
    use crate::errors::CoreErrorKind;
    use chrono::NaiveDate;
    use serde_json::json;

    fn service(db: DatabaseConnection) -> GroupService {
        let registry = CustomFilterRegistry::from_config(&[]).unwrap();
        GroupService::new(db, PermissionConfig::default(), Arc::new(registry))
    }

    fn admin() -> Actor {
        Actor::user(1).with_rights(["180001", "180002", "180003", "180004"])
    }

    async fn individual(db: &DatabaseConnection, first: &str, last: &str) -> Uuid {
        let mut model = individuals::ActiveModel::new(Some(1));
        model.first_name = Set(first.to_string());
        model.last_name = Set(last.to_string());
        model.dob = Set(NaiveDate::from_ymd_opt(1985, 1, 1).unwrap());
        model.insert(db).await.unwrap().id
    }

    fn member(individual_id: Uuid, role: Option<GroupRole>) -> NewMembership {
        NewMembership {
            individual_id,
            role,
            recipient_type: None,
        }
    }

    #[tokio::test]
    async fn test_group_query_requires_group_search_right() {
        let db = setup_test_db().await.unwrap();
        let service = service(db);

        let err = service
            .query(
                &Actor::user(3).with_right("159001"),
                &GroupQueryArgs::default(),
                Page::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Unauthorized);
    }

    #[tokio::test]
    async fn test_duplicate_code_conflicts() {
        let db = setup_test_db().await.unwrap();
        let service = service(db);
        let actor = admin();
        let input = CreateGroup {
            code: "HH-001".to_string(),
            json_ext: None,
        };

        let first = service
            .create(&actor, &MutationMeta::default(), input.clone())
            .await
            .unwrap();
        assert_eq!(first.status, MutationStatus::Success);

        let second = service
            .create(&actor, &MutationMeta::default(), input)
            .await
            .unwrap();
        assert_eq!(second.status, MutationStatus::Error);
        assert!(second.error.unwrap().contains("HH-001"));
    }

    #[tokio::test]
    async fn test_member_name_filter_returns_each_group_once() {
        let db = setup_test_db().await.unwrap();
        let service = service(db.clone());
        let actor = admin();

        let anna = individual(&db, "Anna", "Smith").await;
        let annabel = individual(&db, "Annabel", "Smith").await;
        let bob = individual(&db, "Bob", "Jones").await;

        service
            .create_with_individuals(
                &actor,
                &MutationMeta::default(),
                CreateGroupWithIndividuals {
                    code: "SMITHS".to_string(),
                    json_ext: None,
                    individuals: vec![
                        member(anna, Some(GroupRole::Head)),
                        member(annabel, Some(GroupRole::Daughter)),
                    ],
                },
            )
            .await
            .unwrap();
        service
            .create_with_individuals(
                &actor,
                &MutationMeta::default(),
                CreateGroupWithIndividuals {
                    code: "JONES".to_string(),
                    json_ext: None,
                    individuals: vec![member(bob, Some(GroupRole::Head))],
                },
            )
            .await
            .unwrap();

        let args = GroupQueryArgs {
            first_name: Some("ann".to_string()),
            ..Default::default()
        };
        let page = service.query(&actor, &args, Page::default()).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].code, "SMITHS");

        let args = GroupQueryArgs {
            last_name: Some("JON".to_string()),
            ..Default::default()
        };
        let page = service.query(&actor, &args, Page::default()).await.unwrap();
        assert_eq!(page.items[0].code, "JONES");
    }

    #[tokio::test]
    async fn test_bulk_create_rejects_two_heads_atomically() {
        let db = setup_test_db().await.unwrap();
        let service = service(db.clone());
        let actor = admin();

        let a = individual(&db, "A", "One").await;
        let b = individual(&db, "B", "Two").await;

        let outcome = service
            .create_with_individuals(
                &actor,
                &MutationMeta::default(),
                CreateGroupWithIndividuals {
                    code: "TWOHEADS".to_string(),
                    json_ext: None,
                    individuals: vec![
                        member(a, Some(GroupRole::Head)),
                        member(b, Some(GroupRole::Head)),
                    ],
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, MutationStatus::Error);

        let groups = groups::Entity::find().count(&db).await.unwrap();
        assert_eq!(groups, 0);
    }

    #[tokio::test]
    async fn test_bulk_create_with_unknown_individual_rolls_back() {
        let db = setup_test_db().await.unwrap();
        let service = service(db.clone());

        let outcome = service
            .create_with_individuals(
                &admin(),
                &MutationMeta::default(),
                CreateGroupWithIndividuals {
                    code: "GHOSTS".to_string(),
                    json_ext: None,
                    individuals: vec![member(Uuid::new_v4(), None)],
                },
            )
            .await
            .unwrap();
        assert_eq!(outcome.status, MutationStatus::Error);
        assert_eq!(groups::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_group_soft_deletes_memberships() {
        let db = setup_test_db().await.unwrap();
        let service = service(db.clone());
        let actor = admin();
        let a = individual(&db, "A", "One").await;

        let created = service
            .create_with_individuals(
                &actor,
                &MutationMeta::default(),
                CreateGroupWithIndividuals {
                    code: "G1".to_string(),
                    json_ext: None,
                    individuals: vec![member(a, None)],
                },
            )
            .await
            .unwrap();
        let group_id = created.record_ids[0];

        let deleted = service
            .delete(&actor, &MutationMeta::default(), vec![group_id])
            .await
            .unwrap();
        assert_eq!(deleted.status, MutationStatus::Success);
        assert_eq!(deleted.record_ids.len(), 2);

        let live_memberships = group_individuals::Entity::find()
            .filter(group_individuals::Column::IsDeleted.eq(false))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(live_memberships, 0);

        let group = groups::Entity::find_by_id(group_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(group.is_deleted);
        assert_eq!(group.version, 2);
    }

    #[tokio::test]
    async fn test_custom_filters_narrow_groups() {
        let db = setup_test_db().await.unwrap();
        let service = service(db);
        let actor = admin();

        for (code, size) in [("HH-1", 6), ("HH-2", 2)] {
            service
                .create(
                    &actor,
                    &MutationMeta::default(),
                    CreateGroup {
                        code: code.to_string(),
                        json_ext: Some(json!({"household_size": size})),
                    },
                )
                .await
                .unwrap();
        }

        let args = GroupQueryArgs {
            custom_filters: vec!["household_size__gt__integer=4".to_string()],
            ..Default::default()
        };
        let page = service.query(&actor, &args, Page::default()).await.unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].code, "HH-1");

        let args = GroupQueryArgs {
            custom_filters: vec!["household_size__gt__bogus=4".to_string()],
            ..Default::default()
        };
        let err = service.query(&actor, &args, Page::default()).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Validation);
    }
}
