use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ServiceError, ServiceResult};

/// Attribute bundle for registering one medicine unit.
///
/// Arrives from the form layer with strings pre-trimmed; the ledger still
/// re-checks every constraint defensively before touching the chain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitRegistration {
    /// Unique drug/batch identifier — becomes the unit's business key.
    pub drug_id: String,
    pub batch_number: String,
    pub manufacturer_name: String,
    pub drug_name: String,
    pub composition: String,
    pub manufacture_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub manufacturing_location: String,
    /// Actor performing the registration; becomes the initial holder.
    pub registered_by: String,
}

impl UnitRegistration {
    /// Check every required-field and ordering constraint. The first
    /// failing field is named in the error.
    pub fn validate(&self) -> ServiceResult<()> {
        let required = [
            ("drug_id", &self.drug_id),
            ("batch_number", &self.batch_number),
            ("manufacturer_name", &self.manufacturer_name),
            ("drug_name", &self.drug_name),
            ("composition", &self.composition),
            ("manufacturing_location", &self.manufacturing_location),
            ("registered_by", &self.registered_by),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(ServiceError::Validation {
                    field: field.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if self.expiry_date <= self.manufacture_date {
            return Err(ServiceError::Validation {
                field: "expiry_date".to_string(),
                reason: "must be after manufacture_date".to_string(),
            });
        }
        Ok(())
    }
}
