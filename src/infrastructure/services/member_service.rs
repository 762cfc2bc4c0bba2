//! Member service - cached individual and organization accounts

use std::sync::Arc;

use tracing::info;

use crate::domain::cache::{CacheError, CachePolicy, SortDirection};
use crate::domain::document::{DocumentStore, Query};
use crate::domain::member::{MEMBERS_COLLECTION, Member, MemberField, MemberPatch, MemberType};
use crate::infrastructure::cache::{EntityCache, ListCache};
use crate::infrastructure::document::CollectionSource;

fn member_source(store: Arc<dyn DocumentStore>) -> CollectionSource<Member> {
    CollectionSource::new(store, MEMBERS_COLLECTION)
        .with_query(
            MemberType::Individual.as_str(),
            Query::new().where_present("organization", false),
        )
        .with_query(
            MemberType::Organization.as_str(),
            Query::new().where_present("organization", true),
        )
}

#[derive(Debug)]
pub struct MemberService {
    members: EntityCache<CollectionSource<Member>>,
    lists: ListCache<CollectionSource<Member>>,
}

impl MemberService {
    pub fn new(store: Arc<dyn DocumentStore>, policy: CachePolicy) -> Self {
        let source = Arc::new(member_source(store));

        Self {
            members: EntityCache::new("members", source.clone(), policy),
            lists: ListCache::new("member_lists", source, policy),
        }
    }

    pub async fn members(&self, member_type: MemberType) -> Result<Vec<Member>, CacheError> {
        self.lists.get_all(member_type.as_str()).await
    }

    pub async fn get_member(&self, id: &str) -> Result<Member, CacheError> {
        self.members.get(id).await
    }

    /// Writes through and invalidates both member lists, since the update
    /// may move the member from one account type to the other
    pub async fn update_member(&self, id: &str, patch: MemberPatch) -> Result<(), CacheError> {
        info!(id = %id, "Updating member");

        self.members.write_through(id, patch).await?;
        for member_type in MemberType::ALL {
            self.lists.invalidate(member_type.as_str());
        }
        Ok(())
    }

    pub fn sort(&self, field: MemberField, direction: SortDirection) {
        self.lists.sort(field, direction);
    }

    /// Reloads the list of `member_type`
    pub async fn revalidate(&self, member_type: MemberType) -> Result<Vec<Member>, CacheError> {
        self.lists.invalidate(member_type.as_str());
        self.members(member_type).await
    }

    pub fn lists(&self) -> &ListCache<CollectionSource<Member>> {
        &self.lists
    }
}
