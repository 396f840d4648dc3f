use async_trait::async_trait;
use docease_core::errors::AppointmentResult;
use mockall::mock;
use uuid::Uuid;

use crate::models::DbAppointment;
use crate::repositories::appointment::{AppointmentChange, AppointmentPair, AppointmentStore};

// Mock store for testing the coordinator and handlers without Postgres
mock! {
    pub AppointmentStore {}

    #[async_trait]
    impl AppointmentStore for AppointmentStore {
        async fn insert_pair(&self, record: &DbAppointment) -> AppointmentResult<Uuid>;

        async fn get_for_patient(
            &self,
            patient_id: Uuid,
            id: Uuid,
        ) -> AppointmentResult<Option<DbAppointment>>;

        async fn list_for_patient(&self, patient_id: Uuid) -> AppointmentResult<Vec<DbAppointment>>;

        async fn update_pair(
            &self,
            patient_id: Uuid,
            id: Uuid,
            change: &AppointmentChange,
        ) -> AppointmentResult<DbAppointment>;

        async fn load_pairs(&self) -> AppointmentResult<Vec<AppointmentPair>>;

        async fn repair_mirror(&self, primary: &DbAppointment) -> AppointmentResult<()>;
    }
}
