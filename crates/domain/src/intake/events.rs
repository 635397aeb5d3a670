use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::collaborators::Medicine;

use super::{aggregate::Step, inputs::PatientInfo};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        id: String,
        started_at: DateTime<Utc>,
    },

    PatientUpdated {
        patient: PatientInfo,
    },

    SymptomAdded {
        symptom: String,
    },

    SymptomRemoved {
        index: usize,
        symptom: String,
    },

    ConditionToggled {
        condition: String,
        selected: bool,
    },

    StepChanged {
        from: Step,
        to: Step,
    },

    SearchRecorded {
        diagnosis: Value,
        medicines: Vec<Medicine>,
    },

    MedicineToggled {
        name: String,
        selected: bool,
    },

    MedicinesSelected {
        names: Vec<String>,
    },

    SessionReset,

    SessionClosed,
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::SessionStarted { .. } => "Intake:Started".to_string(),
            Event::PatientUpdated { .. } => "Intake:PatientUpdated".to_string(),
            Event::SymptomAdded { .. } => "Intake:SymptomAdded".to_string(),
            Event::SymptomRemoved { .. } => "Intake:SymptomRemoved".to_string(),
            Event::ConditionToggled { .. } => "Intake:ConditionToggled".to_string(),
            Event::StepChanged { .. } => "Intake:StepChanged".to_string(),
            Event::SearchRecorded { .. } => "Intake:SearchRecorded".to_string(),
            Event::MedicineToggled { .. } => "Intake:MedicineToggled".to_string(),
            Event::MedicinesSelected { .. } => "Intake:MedicinesSelected".to_string(),
            Event::SessionReset => "Intake:Reset".to_string(),
            Event::SessionClosed => "Intake:Closed".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
