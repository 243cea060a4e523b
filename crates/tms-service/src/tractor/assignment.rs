//! Read-only view of the workers assigned to a tractor.

use tracing::debug;

use tms_core::AppResult;
use tms_core::types::{Action, GetOptions, RecordId, RequestContext};
use tms_entity::{Tractor, TractorAssignment};

use crate::record::RecordService;

impl RecordService<Tractor> {
    /// Primary and secondary worker of `tractor_id`. Requires read access
    /// to tractors; nothing is validated or audited.
    pub async fn assignment(
        &self,
        ctx: &RequestContext,
        tractor_id: RecordId,
    ) -> AppResult<TractorAssignment> {
        ctx.within("get tractor assignment", async {
            self.authorize(ctx, Action::Read).await?;
            let tractor = self
                .repo
                .get_by_id(&ctx.tenant, &GetOptions::new(tractor_id))
                .await?;

            debug!(tractor_id = %tractor_id, "Loaded tractor assignment");
            Ok(tractor.assignment())
        })
        .await
    }
}
