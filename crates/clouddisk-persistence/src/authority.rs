//! Permission strings guarding each operation kind

use crate::model::EntityKind;
use crate::operation::{OperationKind, OperationVariant};

/// Permission required to run `kind`
pub fn authority_for(kind: OperationKind) -> &'static str {
    use OperationVariant::*;

    match (kind.entity, kind.variant) {
        (EntityKind::User, Create | CreateAll) => "sys:user:add",
        (EntityKind::User, FindById | FindPage | Count) => "sys:user:list",
        (EntityKind::User, UpdateField | UpdateWhere) => "sys:user:update",
        (EntityKind::User, DeleteById | DeleteAllByIds | DeleteWhere) => "sys:user:delete",

        (EntityKind::Role, Create | CreateAll) => "sys:role:add",
        (EntityKind::Role, FindById | FindPage | Count) => "sys:role:list",
        (EntityKind::Role, UpdateField | UpdateWhere) => "sys:role:update",
        (EntityKind::Role, DeleteById | DeleteAllByIds | DeleteWhere) => "sys:role:delete",

        (EntityKind::Tag, Create | CreateAll) => "website:set:add",
        (EntityKind::Tag, FindById | FindPage | Count) => "website:set:list",
        (EntityKind::Tag, UpdateField | UpdateWhere) => "website:set:update",
        (EntityKind::Tag, DeleteById | DeleteAllByIds | DeleteWhere) => "website:set:delete",

        // Tokens are managed from the user's own settings page
        (EntityKind::AccessToken, FindById | FindPage | Count) => "sys:user:list",
        (EntityKind::AccessToken, _) => "sys:user:update",

        (EntityKind::DirectLink, FindById | FindPage | Count) => "cloud:file:list",
        (EntityKind::DirectLink, _) => "cloud:file:upload",
    }
}

/// Every distinct authority, sorted. Built once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityCatalog {
    authorities: Vec<&'static str>,
}

impl AuthorityCatalog {
    pub fn build() -> Self {
        let mut authorities: Vec<&'static str> = OperationKind::all().map(authority_for).collect();
        authorities.sort_unstable();
        authorities.dedup();
        Self { authorities }
    }

    pub fn contains(&self, authority: &str) -> bool {
        self.authorities
            .binary_search_by(|a| (*a).cmp(authority))
            .is_ok()
    }

    pub fn as_slice(&self) -> &[&'static str] {
        &self.authorities
    }

    pub fn len(&self) -> usize {
        self.authorities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authorities.is_empty()
    }
}

impl Default for AuthorityCatalog {
    fn default() -> Self {
        Self::build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_authorities() {
        let kind = |v| OperationKind::new(EntityKind::User, v);
        assert_eq!(authority_for(kind(OperationVariant::Create)), "sys:user:add");
        assert_eq!(authority_for(kind(OperationVariant::FindPage)), "sys:user:list");
        assert_eq!(authority_for(kind(OperationVariant::UpdateWhere)), "sys:user:update");
        assert_eq!(authority_for(kind(OperationVariant::DeleteAllByIds)), "sys:user:delete");
    }

    #[test]
    fn test_catalog_sorted_and_unique() {
        let catalog = AuthorityCatalog::build();
        let slice = catalog.as_slice();
        assert!(slice.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(catalog.len(), 14);
        assert!(catalog.contains("sys:role:delete"));
        assert!(catalog.contains("cloud:file:upload"));
        assert!(!catalog.contains("sys:menu:add"));
    }

    #[test]
    fn test_every_kind_has_catalogued_authority() {
        let catalog = AuthorityCatalog::build();
        for kind in OperationKind::all() {
            assert!(catalog.contains(authority_for(kind)), "{}", kind);
        }
    }
}
