//! Locations own two child tables, reconciled on every write.

use async_trait::async_trait;
use sqlx::PgConnection;

use tms_core::AppResult;
use tms_core::traits::DomainRecord;
use tms_entity::{Location, LocationComment, LocationContact};

use super::{ColumnSink, PgChildTable, PgTable};
use crate::repositories::children::{load_children, sync_children};

#[async_trait]
impl PgTable for Location {
    fn bind_columns<'args, S: ColumnSink<'args>>(&self, sink: &mut S) {
        sink.bind("status", self.status)
            .bind("code", self.code.clone())
            .bind("name", self.name.clone())
            .bind("description", self.description.clone())
            .bind("address_line_1", self.address_line_1.clone())
            .bind("address_line_2", self.address_line_2.clone())
            .bind("city", self.city.clone())
            .bind("state", self.state.clone())
            .bind("postal_code", self.postal_code.clone())
            .bind("latitude", self.latitude)
            .bind("longitude", self.longitude);
    }

    async fn load_relations(&mut self, conn: &mut PgConnection) -> AppResult<()> {
        let Some(id) = self.id else {
            return Ok(());
        };
        let tenant = self.tenant();
        self.comments = load_children(conn, id, tenant).await?;
        self.contacts = load_children(conn, id, tenant).await?;
        Ok(())
    }

    async fn save_relations(&mut self, conn: &mut PgConnection) -> AppResult<()> {
        let Some(id) = self.id else {
            return Ok(());
        };
        let tenant = self.tenant();
        let comments = std::mem::take(&mut self.comments);
        self.comments = sync_children(conn, id, tenant, comments).await?;
        let contacts = std::mem::take(&mut self.contacts);
        self.contacts = sync_children(conn, id, tenant, contacts).await?;
        Ok(())
    }
}

impl PgChildTable for LocationComment {
    const TABLE: &'static str = "location_comments";
    const PARENT_COLUMN: &'static str = "location_id";

    fn bind_columns<'args, S: ColumnSink<'args>>(&self, sink: &mut S) {
        sink.bind("user_id", self.user_id)
            .bind("comment", self.comment.clone());
    }
}

impl PgChildTable for LocationContact {
    const TABLE: &'static str = "location_contacts";
    const PARENT_COLUMN: &'static str = "location_id";

    fn bind_columns<'args, S: ColumnSink<'args>>(&self, sink: &mut S) {
        sink.bind("name", self.name.clone())
            .bind("email", self.email.clone())
            .bind("phone_number", self.phone_number.clone());
    }
}
