use tms_entity::Commodity;

use super::{ColumnSink, PgTable};

impl PgTable for Commodity {
    fn bind_columns<'args, S: ColumnSink<'args>>(&self, sink: &mut S) {
        sink.bind("status", self.status)
            .bind("name", self.name.clone())
            .bind("description", self.description.clone())
            .bind("min_temperature", self.min_temperature)
            .bind("max_temperature", self.max_temperature)
            .bind("unit_of_measure", self.unit_of_measure.clone())
            .bind("hazardous_material_id", self.hazardous_material_id)
            .bind("stackable", self.stackable)
            .bind("fragile", self.fragile);
    }
}
