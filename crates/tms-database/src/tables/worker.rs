use tms_entity::Worker;

use super::{ColumnSink, PgTable};

impl PgTable for Worker {
    fn bind_columns<'args, S: ColumnSink<'args>>(&self, sink: &mut S) {
        sink.bind("status", self.status)
            .bind("code", self.code.clone())
            .bind("worker_type", self.worker_type)
            .bind("first_name", self.first_name.clone())
            .bind("last_name", self.last_name.clone())
            .bind("email", self.email.clone())
            .bind("phone_number", self.phone_number.clone());
    }
}
