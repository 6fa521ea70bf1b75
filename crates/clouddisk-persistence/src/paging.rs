//! Page/size/sort requests and their backend-native forms

use sea_orm::sea_query::{Alias, Expr, SimpleExpr};
use sea_orm::{EntityTrait, Order, QueryOrder, QuerySelect, Select};

use crate::mapping::FieldRegistry;
use crate::model::{Backend, EntityKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// `descending` in any case sorts descending, anything else ascending
    pub fn parse(order: Option<&str>) -> Self {
        match order {
            Some(o) if o.eq_ignore_ascii_case("descending") => SortDirection::Desc,
            _ => SortDirection::Asc,
        }
    }
}

/// Sort on a logical field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Desc,
        }
    }
}

/// Paging parameters as they arrive from callers. `page` is 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub page: Option<u64>,
    pub size: Option<u64>,
    pub sort_field: Option<String>,
    pub sort_order: Option<String>,
}

impl PageRequest {
    pub fn new(page: u64, size: u64) -> Self {
        Self {
            page: Some(page),
            size: Some(size),
            ..Default::default()
        }
    }

    pub fn unpaged() -> Self {
        Self::default()
    }

    pub fn sorted_by(mut self, field: impl Into<String>, order: impl Into<String>) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = Some(order.into());
        self
    }

    pub fn to_pageable(&self) -> Pageable {
        Pageable::from_request(self, None)
    }
}

/// Backend-neutral paging decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pageable {
    Unpaged,
    Paged {
        /// 0-based page index
        index: u64,
        size: u64,
        sort: Vec<SortKey>,
    },
}

impl Pageable {
    /// Missing page or size, or a zero size, yields [`Pageable::Unpaged`]
    /// with no sort. `pinned` is placed ahead of the caller's sort.
    pub fn from_request(request: &PageRequest, pinned: Option<SortKey>) -> Self {
        let (page, size) = match (request.page, request.size) {
            (Some(page), Some(size)) if size > 0 => (page, size),
            _ => return Pageable::Unpaged,
        };

        let mut sort = Vec::new();
        if let Some(first) = pinned {
            sort.push(first);
        }
        if let Some(field) = request.sort_field.as_deref().filter(|f| !f.is_empty()) {
            sort.push(SortKey {
                field: field.to_string(),
                direction: SortDirection::parse(request.sort_order.as_deref()),
            });
        }

        Pageable::Paged {
            index: page.saturating_sub(1),
            size,
            sort,
        }
    }

    pub fn is_paged(&self) -> bool {
        matches!(self, Pageable::Paged { .. })
    }

    pub fn offset(&self) -> u64 {
        match self {
            Pageable::Unpaged => 0,
            Pageable::Paged { index, size, .. } => index.saturating_mul(*size),
        }
    }

    pub fn limit(&self) -> Option<u64> {
        match self {
            Pageable::Unpaged => None,
            Pageable::Paged { size, .. } => Some(*size),
        }
    }

    pub fn sort(&self) -> &[SortKey] {
        match self {
            Pageable::Unpaged => &[],
            Pageable::Paged { sort, .. } => sort,
        }
    }

    /// 1-based page number to report back
    pub fn page_number(&self) -> u64 {
        match self {
            Pageable::Unpaged => 1,
            Pageable::Paged { index, .. } => index + 1,
        }
    }

    fn physical_sort(
        &self,
        entity: EntityKind,
        fields: &FieldRegistry,
        backend: Backend,
    ) -> Vec<(String, SortDirection)> {
        self.sort()
            .iter()
            .map(|key| {
                (
                    fields.resolve(entity, &key.field, backend).to_string(),
                    key.direction,
                )
            })
            .collect()
    }
}

/// Document-store paging: skip/limit plus sort keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPage {
    pub skip: u64,
    pub limit: Option<u64>,
    pub sort: Vec<(String, SortDirection)>,
}

impl DocumentPage {
    pub fn from_pageable(pageable: &Pageable, entity: EntityKind, fields: &FieldRegistry) -> Self {
        Self {
            skip: pageable.offset(),
            limit: pageable.limit(),
            sort: pageable.physical_sort(entity, fields, Backend::DocumentStore),
        }
    }
}

/// Relational paging: OFFSET/LIMIT plus ORDER BY
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationalPage {
    pub offset: u64,
    pub limit: Option<u64>,
    pub order: Vec<(String, SortDirection)>,
}

impl RelationalPage {
    pub fn from_pageable(pageable: &Pageable, entity: EntityKind, fields: &FieldRegistry) -> Self {
        Self {
            offset: pageable.offset(),
            limit: pageable.limit(),
            order: pageable.physical_sort(entity, fields, Backend::RelationalStore),
        }
    }

    pub fn apply<E: EntityTrait>(&self, mut select: Select<E>) -> Select<E> {
        for (column, direction) in &self.order {
            let expr: SimpleExpr = Expr::col(Alias::new(column.as_str())).into();
            let order = match direction {
                SortDirection::Asc => Order::Asc,
                SortDirection::Desc => Order::Desc,
            };
            select = select.order_by(expr, order);
        }
        if let Some(limit) = self.limit {
            select = select.offset(self.offset).limit(limit);
        }
        select
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, QueryTrait};

    use super::*;
    use crate::entity::tags;

    #[test]
    fn test_first_page() {
        let pageable = PageRequest::new(1, 20).to_pageable();
        assert_eq!(
            pageable,
            Pageable::Paged {
                index: 0,
                size: 20,
                sort: vec![]
            }
        );
        assert_eq!(pageable.offset(), 0);
    }

    #[test]
    fn test_third_page() {
        let pageable = PageRequest::new(3, 20).to_pageable();
        assert!(matches!(pageable, Pageable::Paged { index: 2, size: 20, .. }));
        assert_eq!(pageable.offset(), 40);
        assert_eq!(pageable.page_number(), 3);
    }

    #[test]
    fn test_page_zero_treated_as_first() {
        let pageable = PageRequest::new(0, 10).to_pageable();
        assert!(matches!(pageable, Pageable::Paged { index: 0, .. }));
    }

    #[test]
    fn test_unpaged_cases() {
        assert_eq!(PageRequest::unpaged().to_pageable(), Pageable::Unpaged);
        assert_eq!(PageRequest::new(1, 0).to_pageable(), Pageable::Unpaged);
        let missing_size = PageRequest {
            page: Some(2),
            ..Default::default()
        };
        assert_eq!(missing_size.to_pageable(), Pageable::Unpaged);

        let sorted = PageRequest::unpaged().sorted_by("name", "descending");
        let pageable = Pageable::from_request(&sorted, Some(SortKey::asc("sort")));
        assert!(pageable.sort().is_empty());
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!(SortDirection::parse(Some("descending")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("DESCENDING")), SortDirection::Desc);
        assert_eq!(SortDirection::parse(Some("desc")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("ascending")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(None), SortDirection::Asc);
    }

    #[test]
    fn test_pinned_sort_is_first() {
        let request = PageRequest::new(1, 10).sorted_by("name", "Descending");
        let pageable = Pageable::from_request(&request, Some(SortKey::asc("sort")));
        assert_eq!(pageable.sort(), &[SortKey::asc("sort"), SortKey::desc("name")]);
    }

    #[test]
    fn test_native_pages_resolve_sort_fields() {
        let fields = FieldRegistry::standard();
        let request = PageRequest::new(2, 5).sorted_by("sort", "ascending");
        let pageable = request.to_pageable();

        let doc = DocumentPage::from_pageable(&pageable, EntityKind::Tag, &fields);
        assert_eq!(doc.skip, 5);
        assert_eq!(doc.limit, Some(5));
        assert_eq!(doc.sort, vec![("sort".to_string(), SortDirection::Asc)]);

        let rel = RelationalPage::from_pageable(&pageable, EntityKind::Tag, &fields);
        assert_eq!(rel.order, vec![("sort_order".to_string(), SortDirection::Asc)]);
        let sql = rel
            .apply(tags::Entity::find())
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(sql.contains(r#"ORDER BY "sort_order" ASC"#), "{}", sql);
        assert!(sql.contains("LIMIT 5 OFFSET 5"), "{}", sql);
    }
}
