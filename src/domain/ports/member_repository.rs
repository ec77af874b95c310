//! Member lookup port (collaborator interface).

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::Member;

/// Read access to member profiles. Soft-deleted members are invisible.
#[async_trait]
pub trait MemberRepository: Send + Sync {
    async fn get_active(&self, id: i64) -> DomainResult<Option<Member>>;
}
