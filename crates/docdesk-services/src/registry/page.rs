use serde::Serialize;

/// Fields shown per page on the results and quality views.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// One page of a longer list. `page` is 1-based.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
}

/// Cut `items` into pages of `per_page` and return the requested one.
///
/// There is always at least one page, and `page` is clamped into `1..=total_pages`.
/// A `per_page` of 0 falls back to `DEFAULT_PAGE_SIZE`.
pub fn paginate<T>(items: Vec<T>, page: usize, per_page: usize) -> Page<T> {
    let per_page = if per_page == 0 { DEFAULT_PAGE_SIZE } else { per_page };
    let total_pages = items.len().div_ceil(per_page).max(1);
    let page = page.clamp(1, total_pages);

    let items = items
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        total_pages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_list_has_one_page() {
        let page = paginate(Vec::<u32>::new(), 3, DEFAULT_PAGE_SIZE);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn pages_are_clamped() {
        let items: Vec<u32> = (1..=12).collect();

        let first = paginate(items.clone(), 0, 5);
        assert_eq!(first.page, 1);
        assert_eq!(first.items, vec![1, 2, 3, 4, 5]);
        assert_eq!(first.total_pages, 3);

        let last = paginate(items.clone(), 99, 5);
        assert_eq!(last.page, 3);
        assert_eq!(last.items, vec![11, 12]);

        let default_size = paginate(items, 2, 0);
        assert_eq!(default_size.items, vec![6, 7, 8, 9, 10]);
    }
}
