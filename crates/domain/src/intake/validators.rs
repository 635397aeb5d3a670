//! Side-effect free guards over intake state.

use super::inputs::PatientInfo;

pub fn is_patient_info_complete(info: &PatientInfo) -> bool {
    !info.name.trim().is_empty() && !info.age.is_empty() && info.gender.is_some()
}

pub fn can_proceed_from_home(info: &PatientInfo, symptoms: &[String]) -> bool {
    is_patient_info_complete(info) && !symptoms.is_empty()
}

pub fn is_valid_symptom_entry(text: &str) -> bool {
    !text.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intake::inputs::Gender;

    fn fever() -> Vec<String> {
        vec!["fever".to_string()]
    }

    #[test]
    fn complete_patient_with_symptom_may_proceed() {
        let info = PatientInfo::new("Ravi", "34", Some(Gender::Male));
        assert!(is_patient_info_complete(&info));
        assert!(can_proceed_from_home(&info, &fever()));
    }

    #[test]
    fn any_missing_field_blocks_regardless_of_symptoms() {
        let incomplete = [
            PatientInfo::new("", "34", Some(Gender::Male)),
            PatientInfo::new("   ", "34", Some(Gender::Female)),
            PatientInfo::new("Ravi", "", Some(Gender::Other)),
            PatientInfo::new("Ravi", "34", None),
        ];
        let symptom_lists = [vec![], fever(), vec!["fever".to_string(), "cough".to_string()]];

        for info in &incomplete {
            assert!(!is_patient_info_complete(info), "{:?}", info);
            for symptoms in &symptom_lists {
                assert!(!can_proceed_from_home(info, symptoms));
            }
        }
    }

    #[test]
    fn empty_symptom_list_blocks() {
        let info = PatientInfo::new("Ravi", "34", Some(Gender::Male));
        assert!(!can_proceed_from_home(&info, &[]));
    }

    #[test]
    fn whitespace_is_not_a_symptom() {
        assert!(is_valid_symptom_entry(" headache "));
        assert!(!is_valid_symptom_entry(""));
        assert!(!is_valid_symptom_entry(" \t\n"));
    }
}
