use chrono::Utc;
use sea_orm::{Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QuerySelect};

use crate::database::entities::HistoryEntity;
use crate::errors::CoreResult;
use crate::filters::{
    all_of, append_validity_filter, apply_ordering, client_mutation_filter, parse_order_by,
    ValidityArgs,
};

/// Offset window of a list query. `limit: None` returns every match.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Page {
    pub offset: u64,
    pub limit: Option<u64>,
}

impl Page {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit: Some(limit),
        }
    }
}

#[derive(Clone, Debug)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
}

/// Arguments every registry query accepts.
#[derive(Clone, Debug, Default)]
pub struct CommonQueryArgs {
    pub validity: ValidityArgs,
    pub client_mutation_id: Option<String>,
    pub order_by: Vec<String>,
}

impl CommonQueryArgs {
    /// The validity filter, followed by the client mutation id filter when
    /// one was supplied.
    pub fn conditions<E: HistoryEntity>(&self) -> Vec<Condition> {
        let mut filters = append_validity_filter::<E>(&self.validity, Utc::now());
        if let Some(client_mutation_id) = &self.client_mutation_id {
            filters.push(client_mutation_filter::<E>(client_mutation_id));
        }
        filters
    }
}

pub async fn fetch_page<E, C>(
    db: &C,
    filters: Vec<Condition>,
    order_by: &[String],
    page: Page,
) -> CoreResult<PageResult<E::Model>>
where
    E: HistoryEntity,
    E::Model: Send + Sync,
    C: ConnectionTrait,
{
    let order = parse_order_by(order_by)?;
    let condition = all_of(filters);

    let total_count = E::find().filter(condition.clone()).count(db).await?;

    let mut select = apply_ordering(E::find().filter(condition), &order)?.offset(page.offset);
    if let Some(limit) = page.limit {
        select = select.limit(limit);
    }
    let items = select.all(db).await?;

    tracing::debug!(
        entity = %E::KIND,
        total_count,
        returned = items.len(),
        "registry query"
    );

    Ok(PageResult { items, total_count })
}
