use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde_json::Value;
use uuid::Uuid;

use super::mutation_log_service::{
    commit_or_rollback, missing, MutationLogService, MutationMeta, MutationOutcome, TouchedRecord,
};
use super::query::{fetch_page, CommonQueryArgs, Page, PageResult};
use super::require_text;
use crate::auth::{Actor, Operation};
use crate::config::PermissionConfig;
use crate::database::entities::{group_individuals, individuals, EntityKind};
use crate::errors::{CoreError, CoreResult};
use crate::filters::custom::{BENEFICIARY_RELATION, BENEFIT_PLAN_OBJECT, SOCIAL_PROTECTION_MODULE};
use crate::filters::lookups::icontains;
use crate::filters::CustomFilterRegistry;

#[derive(Clone, Debug, Default)]
pub struct IndividualQueryArgs {
    pub common: CommonQueryArgs,
    pub group_id: Option<Uuid>,
    pub custom_filters: Vec<String>,
    pub first_name_icontains: Option<String>,
    pub last_name_icontains: Option<String>,
    pub dob_gte: Option<NaiveDate>,
    pub dob_lte: Option<NaiveDate>,
    pub is_deleted: Option<bool>,
}

#[derive(Clone, Debug)]
pub struct CreateIndividual {
    pub first_name: String,
    pub last_name: String,
    pub dob: NaiveDate,
    pub json_ext: Option<Value>,
}

#[derive(Clone, Debug, Default)]
pub struct UpdateIndividual {
    pub id: Uuid,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub json_ext: Option<Value>,
}

#[derive(Clone, Debug)]
pub struct IndividualService {
    db: DatabaseConnection,
    perms: PermissionConfig,
    custom_filters: Arc<CustomFilterRegistry>,
    mutations: MutationLogService,
}

impl IndividualService {
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
        args: &IndividualQueryArgs,
        page: Page,
    ) -> CoreResult<PageResult<individuals::Model>> {
        self.perms.check(actor, Operation::IndividualSearch)?;
        let filters = self.filters(args)?;
        fetch_page::<individuals::Entity, _>(&self.db, filters, &args.common.order_by, page).await
    }

    pub fn filters(&self, args: &IndividualQueryArgs) -> CoreResult<Vec<Condition>> {
        let mut filters = args.common.conditions::<individuals::Entity>();

        if let Some(group_id) = args.group_id {
            let members = Query::select()
                .column(group_individuals::Column::IndividualId)
                .from(group_individuals::Entity)
                .and_where(group_individuals::Column::GroupId.eq(group_id))
                .and_where(group_individuals::Column::IsDeleted.eq(false))
                .to_owned();
            filters.push(Condition::all().add(individuals::Column::Id.in_subquery(members)));
        }

        let custom = self.custom_filters.build_custom_filters(
            SOCIAL_PROTECTION_MODULE,
            BENEFIT_PLAN_OBJECT,
            &args.custom_filters,
            Expr::col((individuals::Entity, individuals::Column::JsonExt)).into(),
            Some(BENEFICIARY_RELATION),
        )?;
        if let Some(custom) = custom {
            filters.push(custom);
        }

        if let Some(value) = &args.first_name_icontains {
            let column = Expr::col((individuals::Entity, individuals::Column::FirstName));
            filters.push(Condition::all().add(icontains(column, value)));
        }
        if let Some(value) = &args.last_name_icontains {
            let column = Expr::col((individuals::Entity, individuals::Column::LastName));
            filters.push(Condition::all().add(icontains(column, value)));
        }
        if let Some(dob) = args.dob_gte {
            filters.push(Condition::all().add(individuals::Column::Dob.gte(dob)));
        }
        if let Some(dob) = args.dob_lte {
            filters.push(Condition::all().add(individuals::Column::Dob.lte(dob)));
        }
        if let Some(is_deleted) = args.is_deleted {
            filters.push(Condition::all().add(individuals::Column::IsDeleted.eq(is_deleted)));
        }

        Ok(filters)
    }

    pub async fn create(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        input: CreateIndividual,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::IndividualCreate)?;
        let log = self.mutations.begin("createIndividual", meta, actor).await?;

        let txn = self.db.begin().await?;
        let result = create_individual(&txn, actor, input).await;
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }

    pub async fn update(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        input: UpdateIndividual,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::IndividualUpdate)?;
        let log = self.mutations.begin("updateIndividual", meta, actor).await?;

        let txn = self.db.begin().await?;
        let result = update_individual(&txn, actor, input).await;
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }

    /// Soft-deletes `ids` and the memberships of those individuals.
    pub async fn delete(
        &self,
        actor: &Actor,
        meta: &MutationMeta,
        ids: Vec<Uuid>,
    ) -> CoreResult<MutationOutcome> {
        self.perms.check(actor, Operation::IndividualDelete)?;
        let log = self.mutations.begin("deleteIndividual", meta, actor).await?;

        let txn = self.db.begin().await?;
        let result = delete_individuals(&txn, actor, &ids).await;
        let result = commit_or_rollback(txn, result).await;
        self.mutations.finish(log, result).await
    }
}

fn check_dob(dob: NaiveDate) -> CoreResult<NaiveDate> {
    if dob > Utc::now().date_naive() {
        return Err(CoreError::invalid_field("dob", "must not be in the future"));
    }
    Ok(dob)
}

pub(crate) async fn find_live_individual<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> CoreResult<individuals::Model> {
    individuals::Entity::find_by_id(id)
        .filter(individuals::Column::IsDeleted.eq(false))
        .one(db)
        .await?
        .ok_or_else(|| missing(EntityKind::Individual, id))
}

async fn create_individual<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: CreateIndividual,
) -> CoreResult<Vec<TouchedRecord>> {
    let mut model = individuals::ActiveModel::new(actor.user_id);
    model.first_name = Set(require_text("firstName", &input.first_name)?);
    model.last_name = Set(require_text("lastName", &input.last_name)?);
    model.dob = Set(check_dob(input.dob)?);
    model.json_ext = Set(input.json_ext);

    let individual = model.insert(db).await?;
    Ok(vec![TouchedRecord::new(EntityKind::Individual, individual.id)])
}

async fn update_individual<C: ConnectionTrait>(
    db: &C,
    actor: &Actor,
    input: UpdateIndividual,
) -> CoreResult<Vec<TouchedRecord>> {
    let existing = find_live_individual(db, input.id).await?;
    let version = existing.version;
    let mut model: individuals::ActiveModel = existing.into();

    if let Some(first_name) = &input.first_name {
        model.first_name = Set(require_text("firstName", first_name)?);
    }
    if let Some(last_name) = &input.last_name {
        model.last_name = Set(require_text("lastName", last_name)?);
    }
    if let Some(dob) = input.dob {
        model.dob = Set(check_dob(dob)?);
    }
    if let Some(json_ext) = input.json_ext {
        model.json_ext = Set(Some(json_ext));
    }
    model.version = Set(version + 1);
    model.date_updated = Set(Utc::now());
    model.user_updated = Set(actor.user_id);

    let individual = model.update(db).await?;
    Ok(vec![TouchedRecord::new(EntityKind::Individual, individual.id)])
}

async fn delete_individuals<C: ConnectionTrait>(
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
        let existing = find_live_individual(db, *id).await?;
        let version = existing.version;
        let mut model: individuals::ActiveModel = existing.into();
        model.is_deleted = Set(true);
        model.version = Set(version + 1);
        model.date_updated = Set(now);
        model.user_updated = Set(actor.user_id);
        model.update(db).await?;
        touched.push(TouchedRecord::new(EntityKind::Individual, *id));
    }

    let memberships = group_individuals::Entity::find()
        .filter(group_individuals::Column::IndividualId.is_in(ids.iter().copied()))
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
