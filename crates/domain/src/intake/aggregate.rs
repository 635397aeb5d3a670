use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{collaborators::Medicine, errors::Error};

use super::{
    conditions::is_known_condition,
    inputs::PatientInfo,
    validators::{can_proceed_from_home, is_valid_symptom_entry},
    Command, Event,
};

/// Authenticated wizard step.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    #[default]
    Home,
    MedicineSearch,
    Prescription,
}

impl Step {
    pub fn as_str(self) -> &'static str {
        match self {
            Step::Home => "home",
            Step::MedicineSearch => "medicine-search",
            Step::Prescription => "prescription",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One wizard pass worth of clinical input.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct IntakeSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub step: Step,

    pub patient: PatientInfo,
    pub symptoms: Vec<String>,
    pub health_conditions: Vec<String>,

    // Filled in by the medicine search collaborator
    pub diagnosis: Option<Value>,
    pub catalog: Vec<Medicine>,
    pub selected_medicines: Vec<String>,

    pub closed: bool,
}

pub const AGGREGATE_TYPE: &str = "Intake";

#[derive(Clone, Default)]
pub struct Services {}

#[async_trait]
impl Aggregate for IntakeSession {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        _services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            Command::StartSession { id } => {
                self.validate_new()?;
                Ok(vec![Event::SessionStarted {
                    id,
                    started_at: Utc::now(),
                }])
            }
            command => {
                self.validate_existing()?;
                self.handle_existing(command)
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::SessionStarted { id, started_at } => {
                *self = Self {
                    id,
                    started_at,
                    ..Default::default()
                };
            }

            Event::PatientUpdated { patient } => {
                self.patient = patient;
            }

            Event::SymptomAdded { symptom } => {
                self.symptoms.push(symptom);
            }

            Event::SymptomRemoved { index, .. } => {
                if index < self.symptoms.len() {
                    self.symptoms.remove(index);
                }
            }

            Event::ConditionToggled { condition, selected } => {
                self.health_conditions.retain(|c| c != &condition);
                if selected {
                    self.health_conditions.push(condition);
                }
            }

            Event::StepChanged { to, .. } => {
                self.step = to;
            }

            Event::SearchRecorded { diagnosis, medicines } => {
                self.diagnosis = Some(diagnosis);
                self.catalog = medicines;
            }

            Event::MedicineToggled { name, selected } => {
                self.selected_medicines.retain(|m| m != &name);
                if selected {
                    self.selected_medicines.push(name);
                }
            }

            Event::MedicinesSelected { names } => {
                self.selected_medicines = names;
            }

            Event::SessionReset => {
                self.clear_intake();
            }

            Event::SessionClosed => {
                self.clear_intake();
                self.closed = true;
            }
        }
    }
}

impl IntakeSession {
    fn handle_existing(&self, command: Command) -> Result<Vec<Event>, Error> {
        match command {
            Command::StartSession { .. } => Err(Error::Uniqueness { field: "id".to_string() }),

            Command::UpdatePatient { patient } => {
                self.require_step(Step::Home)?;
                if patient == self.patient {
                    return Ok(vec![]);
                }
                Ok(vec![Event::PatientUpdated { patient }])
            }

            Command::AddSymptom { text } => {
                self.require_step(Step::Home)?;
                let symptom = text.trim();
                if !is_valid_symptom_entry(symptom) || self.symptoms.iter().any(|s| s == symptom) {
                    tracing::debug!("Ignoring blank or duplicate symptom");
                    return Ok(vec![]);
                }
                Ok(vec![Event::SymptomAdded {
                    symptom: symptom.to_string(),
                }])
            }

            Command::RemoveSymptom { index } => {
                self.require_step(Step::Home)?;
                match self.symptoms.get(index) {
                    Some(symptom) => Ok(vec![Event::SymptomRemoved {
                        index,
                        symptom: symptom.clone(),
                    }]),
                    None => Ok(vec![]),
                }
            }

            Command::ToggleCondition { condition } => {
                self.require_step(Step::Home)?;
                if !is_known_condition(&condition) {
                    return Err(Error::Validation {
                        message: format!("Unknown health condition: {}", condition),
                    });
                }
                let selected = !self.health_conditions.contains(&condition);
                Ok(vec![Event::ConditionToggled { condition, selected }])
            }

            Command::Proceed => match self.step {
                Step::Home if can_proceed_from_home(&self.patient, &self.symptoms) => {
                    Ok(self.move_to(Step::MedicineSearch))
                }
                Step::Home => {
                    tracing::debug!("Home step incomplete, staying put");
                    Ok(vec![])
                }
                Step::MedicineSearch => Ok(self.move_to(Step::Prescription)),
                Step::Prescription => Err(self.no_edge("next")),
            },

            Command::GoBack => match self.step {
                Step::Home => Err(self.no_edge("back")),
                Step::MedicineSearch => Ok(self.move_to(Step::Home)),
                Step::Prescription => Ok(self.move_to(Step::MedicineSearch)),
            },

            Command::RecordSearch { outcome } => {
                self.require_step(Step::MedicineSearch)?;
                if self.diagnosis.is_some() {
                    return Ok(vec![]);
                }
                Ok(vec![Event::SearchRecorded {
                    diagnosis: outcome.diagnosis,
                    medicines: outcome.medicines,
                }])
            }

            Command::ToggleMedicine { name } => {
                self.require_step(Step::MedicineSearch)?;
                self.require_offered(&name)?;
                let selected = !self.selected_medicines.contains(&name);
                Ok(vec![Event::MedicineToggled { name, selected }])
            }

            Command::SelectMedicines { names } => {
                self.require_step(Step::MedicineSearch)?;
                for name in &names {
                    self.require_offered(name)?;
                }
                if names == self.selected_medicines {
                    return Ok(vec![]);
                }
                Ok(vec![Event::MedicinesSelected { names }])
            }

            Command::Reset => {
                if self.step != Step::Prescription {
                    return Err(self.no_edge(Step::Home.as_str()));
                }
                Ok(vec![Event::SessionReset])
            }

            Command::CloseSession => Ok(vec![Event::SessionClosed]),
        }
    }

    /// True when no clinical data has been captured.
    pub fn is_empty(&self) -> bool {
        self.patient == PatientInfo::default()
            && self.symptoms.is_empty()
            && self.health_conditions.is_empty()
            && self.diagnosis.is_none()
            && self.catalog.is_empty()
            && self.selected_medicines.is_empty()
    }

    pub fn can_proceed(&self) -> bool {
        can_proceed_from_home(&self.patient, &self.symptoms)
    }

    /// Catalog entries for the selected names, in selection order.
    pub fn selected_catalog(&self) -> Vec<Medicine> {
        self.selected_medicines
            .iter()
            .filter_map(|name| self.catalog.iter().find(|m| &m.name == name).cloned())
            .collect()
    }

    // Selections only ever come from the recorded search results.
    fn require_offered(&self, name: &str) -> Result<(), Error> {
        if !self.catalog.iter().any(|m| m.name == name) {
            return Err(Error::Validation {
                message: format!("Medicine not in search results: {}", name),
            });
        }
        Ok(())
    }

    // Every intake field is cleared together.
    fn clear_intake(&mut self) {
        self.step = Step::Home;
        self.patient = PatientInfo::default();
        self.symptoms.clear();
        self.health_conditions.clear();
        self.diagnosis = None;
        self.catalog.clear();
        self.selected_medicines.clear();
    }

    fn move_to(&self, to: Step) -> Vec<Event> {
        vec![Event::StepChanged {
            from: self.step,
            to,
        }]
    }

    fn no_edge(&self, to: &str) -> Error {
        Error::InvalidStateTransition {
            from: self.step.to_string(),
            to: to.to_string(),
        }
    }

    fn validate_new(&self) -> Result<(), Error> {
        if !self.id.is_empty() {
            return Err(Error::Uniqueness { field: "id".to_string() });
        }
        Ok(())
    }

    fn validate_existing(&self) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::NotFound { entity: AGGREGATE_TYPE.to_string() });
        }
        if self.closed {
            return Err(Error::Forbidden);
        }
        Ok(())
    }

    fn require_step(&self, expected: Step) -> Result<(), Error> {
        if self.step != expected {
            return Err(Error::StepMismatch {
                expected: expected.to_string(),
                actual: self.step.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{collaborators::SearchOutcome, intake::inputs::Gender};
    use cqrs_es::test::TestFramework;
    use serde_json::json;

    type IntakeTestFramework = TestFramework<IntakeSession>;

    fn started() -> Event {
        Event::SessionStarted {
            id: "01HX".to_string(),
            started_at: Utc::now(),
        }
    }

    fn ravi() -> PatientInfo {
        PatientInfo::new("Ravi", "34", Some(Gender::Male))
    }

    fn at_home_ready() -> Vec<Event> {
        vec![
            started(),
            Event::PatientUpdated { patient: ravi() },
            Event::SymptomAdded { symptom: "fever".to_string() },
        ]
    }

    fn at_search() -> Vec<Event> {
        let mut events = at_home_ready();
        events.push(Event::StepChanged {
            from: Step::Home,
            to: Step::MedicineSearch,
        });
        events
    }

    fn at_prescription() -> Vec<Event> {
        let mut events = at_search();
        events.push(Event::StepChanged {
            from: Step::MedicineSearch,
            to: Step::Prescription,
        });
        events
    }

    #[test]
    fn symptoms_are_trimmed() {
        IntakeTestFramework::with(Services::default())
            .given(vec![started()])
            .when(Command::AddSymptom { text: "  fever \n".to_string() })
            .then_expect_events(vec![Event::SymptomAdded { symptom: "fever".to_string() }]);
    }

    #[test]
    fn blank_and_duplicate_symptoms_are_ignored() {
        IntakeTestFramework::with(Services::default())
            .given(vec![started()])
            .when(Command::AddSymptom { text: "   ".to_string() })
            .then_expect_events(vec![]);

        IntakeTestFramework::with(Services::default())
            .given(at_home_ready())
            .when(Command::AddSymptom { text: " fever".to_string() })
            .then_expect_events(vec![]);
    }

    #[test]
    fn removing_out_of_range_is_a_no_op() {
        IntakeTestFramework::with(Services::default())
            .given(at_home_ready())
            .when(Command::RemoveSymptom { index: 3 })
            .then_expect_events(vec![]);
    }

    #[test]
    fn proceed_with_complete_home_moves_to_search() {
        IntakeTestFramework::with(Services::default())
            .given(at_home_ready())
            .when(Command::Proceed)
            .then_expect_events(vec![Event::StepChanged {
                from: Step::Home,
                to: Step::MedicineSearch,
            }]);
    }

    #[test]
    fn proceed_with_blank_name_is_inert() {
        IntakeTestFramework::with(Services::default())
            .given(vec![
                started(),
                Event::PatientUpdated {
                    patient: PatientInfo::new("", "34", Some(Gender::Male)),
                },
                Event::SymptomAdded { symptom: "fever".to_string() },
            ])
            .when(Command::Proceed)
            .then_expect_events(vec![]);
    }

    #[test]
    fn empty_selection_may_still_proceed() {
        IntakeTestFramework::with(Services::default())
            .given(at_search())
            .when(Command::Proceed)
            .then_expect_events(vec![Event::StepChanged {
                from: Step::MedicineSearch,
                to: Step::Prescription,
            }]);
    }

    #[test]
    fn back_edges() {
        IntakeTestFramework::with(Services::default())
            .given(at_prescription())
            .when(Command::GoBack)
            .then_expect_events(vec![Event::StepChanged {
                from: Step::Prescription,
                to: Step::MedicineSearch,
            }]);

        IntakeTestFramework::with(Services::default())
            .given(at_home_ready())
            .when(Command::GoBack)
            .then_expect_error(Error::InvalidStateTransition {
                from: "home".to_string(),
                to: "back".to_string(),
            });
    }

    #[test]
    fn reset_only_from_prescription() {
        IntakeTestFramework::with(Services::default())
            .given(at_prescription())
            .when(Command::Reset)
            .then_expect_events(vec![Event::SessionReset]);

        IntakeTestFramework::with(Services::default())
            .given(at_search())
            .when(Command::Reset)
            .then_expect_error(Error::InvalidStateTransition {
                from: "medicine-search".to_string(),
                to: "home".to_string(),
            });
    }

    #[test]
    fn home_fields_are_locked_outside_home() {
        IntakeTestFramework::with(Services::default())
            .given(at_search())
            .when(Command::AddSymptom { text: "cough".to_string() })
            .then_expect_error(Error::StepMismatch {
                expected: "home".to_string(),
                actual: "medicine-search".to_string(),
            });
    }

    #[test]
    fn unknown_condition_is_rejected() {
        IntakeTestFramework::with(Services::default())
            .given(vec![started()])
            .when(Command::ToggleCondition { condition: "Scurvy".to_string() })
            .then_expect_error(Error::Validation {
                message: "Unknown health condition: Scurvy".to_string(),
            });
    }

    #[test]
    fn diagnosis_is_recorded_once() {
        let outcome = SearchOutcome {
            diagnosis: json!({"primary_condition": "Jwara"}),
            medicines: vec![],
        };

        IntakeTestFramework::with(Services::default())
            .given(at_search())
            .when(Command::RecordSearch { outcome: outcome.clone() })
            .then_expect_events(vec![Event::SearchRecorded {
                diagnosis: json!({"primary_condition": "Jwara"}),
                medicines: vec![],
            }]);

        let mut recorded = at_search();
        recorded.push(Event::SearchRecorded {
            diagnosis: json!({"primary_condition": "Kasa"}),
            medicines: vec![],
        });
        IntakeTestFramework::with(Services::default())
            .given(recorded)
            .when(Command::RecordSearch { outcome })
            .then_expect_events(vec![]);
    }

    fn with_results(mut events: Vec<Event>) -> Vec<Event> {
        events.push(Event::SearchRecorded {
            diagnosis: json!({"primary_condition": "Jwara"}),
            medicines: vec![Medicine {
                name: "Sudarshan Ghan Vati".to_string(),
                ..Default::default()
            }],
        });
        events
    }

    #[test]
    fn offered_medicines_toggle() {
        IntakeTestFramework::with(Services::default())
            .given(with_results(at_search()))
            .when(Command::ToggleMedicine {
                name: "Sudarshan Ghan Vati".to_string(),
            })
            .then_expect_events(vec![Event::MedicineToggled {
                name: "Sudarshan Ghan Vati".to_string(),
                selected: true,
            }]);
    }

    #[test]
    fn medicines_outside_the_results_are_rejected() {
        IntakeTestFramework::with(Services::default())
            .given(with_results(at_search()))
            .when(Command::ToggleMedicine {
                name: "Invented Pill".to_string(),
            })
            .then_expect_error(Error::Validation {
                message: "Medicine not in search results: Invented Pill".to_string(),
            });

        IntakeTestFramework::with(Services::default())
            .given(with_results(at_search()))
            .when(Command::SelectMedicines {
                names: vec![
                    "Sudarshan Ghan Vati".to_string(),
                    "Invented Pill".to_string(),
                ],
            })
            .then_expect_error(Error::Validation {
                message: "Medicine not in search results: Invented Pill".to_string(),
            });
    }

    #[test]
    fn nothing_is_selectable_before_a_search() {
        IntakeTestFramework::with(Services::default())
            .given(at_search())
            .when(Command::ToggleMedicine {
                name: "Sudarshan Ghan Vati".to_string(),
            })
            .then_expect_error(Error::Validation {
                message: "Medicine not in search results: Sudarshan Ghan Vati".to_string(),
            });

        IntakeTestFramework::with(Services::default())
            .given(at_search())
            .when(Command::SelectMedicines { names: vec![] })
            .then_expect_events(vec![]);
    }

    #[test]
    fn closed_sessions_refuse_commands() {
        IntakeTestFramework::with(Services::default())
            .given(vec![started(), Event::SessionClosed])
            .when(Command::Proceed)
            .then_expect_error(Error::Forbidden);
    }

    #[test]
    fn sessions_start_once() {
        IntakeTestFramework::with(Services::default())
            .given(vec![started()])
            .when(Command::StartSession { id: "again".to_string() })
            .then_expect_error(Error::Uniqueness { field: "id".to_string() });

        IntakeTestFramework::with(Services::default())
            .given_no_previous_events()
            .when(Command::AddSymptom { text: "fever".to_string() })
            .then_expect_error(Error::NotFound { entity: AGGREGATE_TYPE.to_string() });
    }

    fn replay(events: Vec<Event>) -> IntakeSession {
        let mut session = IntakeSession::default();
        for event in events {
            session.apply(event);
        }
        session
    }

    #[tokio::test]
    async fn toggling_a_condition_twice_restores_membership() {
        let mut session = replay(vec![started()]);
        let before = session.health_conditions.clone();
        let toggle = || Command::ToggleCondition {
            condition: "Asthma".to_string(),
        };

        let first = session.handle(toggle(), &Services::default()).await.unwrap();
        assert_eq!(
            first,
            vec![Event::ConditionToggled {
                condition: "Asthma".to_string(),
                selected: true
            }]
        );
        first.into_iter().for_each(|e| session.apply(e));
        assert_eq!(session.health_conditions, vec!["Asthma".to_string()]);

        let second = session.handle(toggle(), &Services::default()).await.unwrap();
        assert_eq!(
            second,
            vec![Event::ConditionToggled {
                condition: "Asthma".to_string(),
                selected: false
            }]
        );
        second.into_iter().for_each(|e| session.apply(e));
        assert_eq!(session.health_conditions, before);
    }

    #[test]
    fn reset_and_close_clear_everything() {
        let mut events = at_prescription();
        events.push(Event::SearchRecorded {
            diagnosis: json!({}),
            medicines: vec![Medicine {
                name: "Triphala Churna".to_string(),
                ..Default::default()
            }],
        });
        events.push(Event::MedicinesSelected {
            names: vec!["Triphala Churna".to_string()],
        });

        let full = replay(events.clone());
        assert!(!full.is_empty());
        assert_eq!(full.selected_catalog()[0].name, "Triphala Churna");

        let mut reset = events.clone();
        reset.push(Event::SessionReset);
        let reset = replay(reset);
        assert!(reset.is_empty());
        assert_eq!(reset.step, Step::Home);
        assert!(!reset.closed);

        events.push(Event::SessionClosed);
        let closed = replay(events);
        assert!(closed.is_empty());
        assert!(closed.closed);
    }
}
