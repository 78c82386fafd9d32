use std::future::Future;

use async_graphql::connection::{query, Connection, Edge};
use async_graphql::*;

use crate::errors::CoreResult;
use crate::graphql::errors::core_error_to_graphql_error;
use crate::services::{Page, PageResult};

/// Page size when neither `first` nor `last` is given.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Extra connection field carrying the size of the whole result set.
#[derive(SimpleObject, Clone, Copy, Debug)]
pub struct TotalCount {
    pub total_count: u64,
}

pub type RegistryConnection<N> = Connection<usize, N, TotalCount>;

/// Resolves a Relay connection over an offset-paged query. Cursors are
/// record offsets.
pub async fn paginate<M, N, F, Fut>(
    after: Option<String>,
    before: Option<String>,
    first: Option<i32>,
    last: Option<i32>,
    fetch: F,
) -> Result<RegistryConnection<N>>
where
    N: OutputType + From<M>,
    F: Fn(Page) -> Fut,
    Fut: Future<Output = CoreResult<PageResult<M>>>,
{
    query(
        after,
        before,
        first,
        last,
        |after: Option<usize>, before: Option<usize>, first, last| async move {
            let mut end = before;
            if last.is_some() && end.is_none() {
                let counted = fetch(Page::new(0, 0))
                    .await
                    .map_err(core_error_to_graphql_error)?;
                end = Some(counted.total_count as usize);
            }

            let (offset, limit) = window(after, end, first, last);
            let page = fetch(Page {
                offset: offset as u64,
                limit: limit.map(|limit| limit as u64),
            })
            .await
            .map_err(core_error_to_graphql_error)?;

            let has_previous_page = offset > 0;
            let has_next_page = offset + page.items.len() < page.total_count as usize;
            let mut connection = Connection::with_additional_fields(
                has_previous_page,
                has_next_page,
                TotalCount {
                    total_count: page.total_count,
                },
            );
            connection.edges.extend(
                page.items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| Edge::new(offset + index, N::from(item))),
            );
            Ok::<_, Error>(connection)
        },
    )
    .await
}

/// Offset and limit selected by the connection arguments. `end` is the
/// exclusive upper offset (`before`, or the total count when paging from
/// the back).
fn window(
    after: Option<usize>,
    end: Option<usize>,
    first: Option<usize>,
    last: Option<usize>,
) -> (usize, Option<usize>) {
    let mut start = after.map(|after| after + 1).unwrap_or(0);
    let mut end = end;

    if let Some(first) = first {
        let limit = start.saturating_add(first);
        end = Some(end.map_or(limit, |end| end.min(limit)));
    }
    if let (Some(last), Some(bound)) = (last, end) {
        start = start.max(bound.saturating_sub(last));
    }
    if first.is_none() && last.is_none() && end.is_none() {
        end = Some(start + DEFAULT_PAGE_SIZE);
    }

    (start, end.map(|end| end.saturating_sub(start)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_forward() {
        assert_eq!(window(None, None, Some(10), None), (0, Some(10)));
        assert_eq!(window(Some(9), None, Some(10), None), (10, Some(10)));
    }

    #[test]
    fn test_window_backward() {
        assert_eq!(window(None, Some(50), None, Some(5)), (45, Some(5)));
        assert_eq!(window(None, Some(3), None, Some(5)), (0, Some(3)));
    }

    #[test]
    fn test_window_default_size() {
        assert_eq!(window(None, None, None, None), (0, Some(DEFAULT_PAGE_SIZE)));
        assert_eq!(window(Some(4), Some(8), None, None), (5, Some(3)));
    }
}
