//! Bulk trust-role propagation.
//!
//! Grants the trust role to every member that lacks it, walking the
//! membership in pages. Used after validation is first configured so
//! existing members are not locked out behind the new role.

use crate::error::EngineError;
use crate::platform::{ChatGateway, CommunityId, RoleId};
use tracing::info;

/// Grant `role` to every member missing it; returns how many members
/// were updated. Grants run sequentially - this is an administrative
/// command, not a hot path, and sequential grants stay under platform
/// rate limits.
pub async fn propagate_role(
    gateway: &dyn ChatGateway,
    community: CommunityId,
    role: RoleId,
    page_size: usize,
) -> Result<u64, EngineError> {
    let mut processed = 0u64;
    let mut updated = 0u64;
    let mut after = None;

    loop {
        let page = gateway
            .members_after(community, after, page_size)
            .await?;
        let Some(last) = page.last() else { break };
        after = Some(last.id);
        let page_len = page.len();

        for member in page {
            processed += 1;
            if member.has_role(role) {
                continue;
            }
            gateway.add_role(community, member.id, role).await?;
            updated += 1;
            if updated % 100 == 0 {
                info!(processed, updated, "Role propagation ongoing");
            }
        }

        if page_len < page_size {
            break;
        }
    }

    info!(community = %community, processed, updated, "Role propagation complete");
    Ok(updated)
}
