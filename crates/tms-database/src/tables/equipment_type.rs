use tms_entity::EquipmentType;

use super::{ColumnSink, PgTable};

impl PgTable for EquipmentType {
    fn bind_columns<'args, S: ColumnSink<'args>>(&self, sink: &mut S) {
        sink.bind("status", self.status)
            .bind("code", self.code.clone())
            .bind("description", self.description.clone())
            .bind("class", self.class)
            .bind("color", self.color.clone());
    }
}
