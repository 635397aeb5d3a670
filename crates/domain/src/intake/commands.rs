use serde::{Deserialize, Serialize};

use crate::collaborators::SearchOutcome;

use super::inputs::PatientInfo;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Command {
    /// Open a fresh intake pass
    StartSession { id: String },

    /// Replace the patient details (home step)
    UpdatePatient { patient: PatientInfo },

    /// Append a symptom; blank or duplicate text is ignored (home step)
    AddSymptom { text: String },

    /// Drop the symptom at `index` (home step)
    RemoveSymptom { index: usize },

    /// Flip membership of a vocabulary condition (home step)
    ToggleCondition { condition: String },

    /// Move one step forward if the current step's guard holds
    Proceed,

    /// Move one step back
    GoBack,

    /// Store the diagnosis and medicine catalog (medicine-search step)
    RecordSearch { outcome: SearchOutcome },

    /// Flip selection of one catalog medicine (medicine-search step)
    ToggleMedicine { name: String },

    /// Replace the whole selection (medicine-search step)
    SelectMedicines { names: Vec<String> },

    /// Clear all intake data and return home (prescription step)
    Reset,

    /// End the pass for good
    CloseSession,
}
