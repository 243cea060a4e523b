use tms_entity::Tractor;

use super::{ColumnSink, PgTable};

impl PgTable for Tractor {
    fn bind_columns<'args, S: ColumnSink<'args>>(&self, sink: &mut S) {
        sink.bind("status", self.status)
            .bind("code", self.code.clone())
            .bind("equipment_type_id", self.equipment_type_id)
            .bind("primary_worker_id", self.primary_worker_id)
            .bind("secondary_worker_id", self.secondary_worker_id)
            .bind("vin", self.vin.clone())
            .bind("model", self.model.clone())
            .bind("year", self.year)
            .bind("license_plate_number", self.license_plate_number.clone());
    }
}
