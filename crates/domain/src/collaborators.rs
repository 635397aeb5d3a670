//! Remote services the workflow consults but does not own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Error;

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Medicine {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub recommended_dosage: String,
    #[serde(default)]
    pub timing: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precautions: Option<String>,
}

/// Diagnosis plus the medicines the clinician may choose from.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchOutcome {
    #[serde(default)]
    pub diagnosis: Value,
    #[serde(default)]
    pub medicines: Vec<Medicine>,
}

#[async_trait]
pub trait MedicineCatalog: Send + Sync {
    async fn search(
        &self,
        symptoms: &[String],
        health_conditions: &[String],
    ) -> Result<SearchOutcome, Error>;
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct PrescriptionItem {
    pub medicine_name: String,
    pub dosage: String,
    pub timing: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
}

impl From<&Medicine> for PrescriptionItem {
    fn from(medicine: &Medicine) -> Self {
        Self {
            medicine_name: medicine.name.clone(),
            dosage: medicine.recommended_dosage.clone(),
            timing: medicine.timing.clone(),
            duration: None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Eq, PartialEq)]
pub struct PrescriptionRequest {
    pub patient_name: String,
    pub patient_age: u32,
    pub patient_gender: String,
    pub symptoms: Vec<String>,
    pub health_conditions: Vec<String>,
    pub medicines: Vec<PrescriptionItem>,
    pub doctor_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_registration: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct PrescriptionDocument {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub prescription_html: String,
}

#[async_trait]
pub trait PrescriptionWriter: Send + Sync {
    async fn generate(&self, request: &PrescriptionRequest) -> Result<PrescriptionDocument, Error>;
}
