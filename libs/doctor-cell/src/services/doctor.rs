use std::sync::Arc;

use tracing::{debug, info};

use shared_database::{decode_all, encode, Collection, Filter, RecordStore, ID_FIELD};
use shared_models::records::Doctor;
use shared_models::responses::{DeleteResult, InsertResult};

use crate::models::DoctorError;

/// Admin-managed doctor catalog.
pub struct DoctorService {
    store: Arc<dyn RecordStore>,
}

impl DoctorService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Doctor>, DoctorError> {
        let rows = self.store.find(Collection::Doctors, &Filter::new()).await?;
        Ok(decode_all(rows)?)
    }

    pub async fn create_doctor(&self, doctor: Doctor) -> Result<InsertResult, DoctorError> {
        debug!("Creating doctor {} ({})", doctor.name, doctor.specialty);

        if doctor.name.trim().is_empty() {
            return Err(DoctorError::Validation("Doctor name is required".to_string()));
        }
        if doctor.specialty.trim().is_empty() {
            return Err(DoctorError::Validation("Doctor specialty is required".to_string()));
        }

        let stored = self.store.insert(Collection::Doctors, encode(&doctor)?).await?;
        let id = stored.get(ID_FIELD).and_then(|v| v.as_str()).map(str::to_string);

        info!("Doctor {} added with id {:?}", doctor.name, id);
        Ok(InsertResult::inserted(id))
    }

    /// Deleting an unknown id is not an error; the count says so.
    pub async fn delete_doctor(&self, id: &str) -> Result<DeleteResult, DoctorError> {
        let deleted_count = self.store.delete_by_id(Collection::Doctors, id).await?;
        info!("Deleted {} doctor record(s) for id {}", deleted_count, id);

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count,
        })
    }
}
