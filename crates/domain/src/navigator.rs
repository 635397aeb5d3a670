//! Drives the whole client: boot, authentication, the intake wizard and
//! logout.

use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use derive_new::new;
use tokio::sync::RwLock;

use crate::{
    auth::{AuthEndpoint, AuthManager, AuthState, Credentials, Registration, UserProfile},
    collaborators::{
        MedicineCatalog, PrescriptionDocument, PrescriptionItem, PrescriptionRequest,
        PrescriptionWriter, SearchOutcome,
    },
    config::Settings,
    errors::Error,
    intake::{Command, Gender, IntakeSession, PatientInfo, Step, Workflow},
    navigation::{route, Route, Screen},
    notify::NotificationChannel,
    store::SessionStore,
};

/// Remote collaborators the navigator talks to.
#[derive(Clone, new)]
pub struct Backend {
    pub auth: Arc<dyn AuthEndpoint>,
    pub catalog: Arc<dyn MedicineCatalog>,
    pub prescriptions: Arc<dyn PrescriptionWriter>,
}

pub struct Navigator {
    auth: AuthManager,
    notifications: Arc<NotificationChannel>,
    catalog: Arc<dyn MedicineCatalog>,
    prescriptions: Arc<dyn PrescriptionWriter>,
    screen: Mutex<Screen>,
    workflow: RwLock<Option<Workflow>>,
    login_handoff: Duration,
}

impl Navigator {
    pub fn new(store: Arc<dyn SessionStore>, backend: Backend, settings: &Settings) -> Self {
        let notifications = Arc::new(NotificationChannel::new(
            settings.success_toast,
            settings.error_toast,
        ));

        Self {
            auth: AuthManager::new(store, backend.auth, notifications.clone()),
            notifications,
            catalog: backend.catalog,
            prescriptions: backend.prescriptions,
            screen: Mutex::new(Screen::Splash),
            workflow: RwLock::new(None),
            login_handoff: settings.login_handoff,
        }
    }

    pub fn screen(&self) -> Screen {
        *self.screen_lock()
    }

    pub fn auth(&self) -> &AuthManager {
        &self.auth
    }

    pub fn notifications(&self) -> &Arc<NotificationChannel> {
        &self.notifications
    }

    /// Snapshot of the current intake pass; empty outside the authenticated
    /// region.
    pub async fn intake(&self) -> IntakeSession {
        match self.workflow.read().await.as_ref() {
            Some(workflow) => workflow.snapshot(),
            None => IntakeSession::default(),
        }
    }

    fn screen_lock(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn go(&self, event: Route) -> Result<Screen, Error> {
        let mut screen = self.screen_lock();
        let next = route(*screen, event)?;
        if next != *screen {
            tracing::info!(from = %*screen, to = %next, "Navigating");
        }
        *screen = next;
        Ok(next)
    }

    fn require_screen(&self, expected: Screen) -> Result<(), Error> {
        let actual = self.screen();
        if actual != expected {
            return Err(Error::StepMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    // ── Boot and authentication ─────────────────────────────

    /// Splash, then a storage-only restore attempt, then `home` or `auth`.
    pub async fn start(&self) -> Result<Screen, Error> {
        self.go(Route::Boot)?;

        match self.auth.restore_session().await {
            AuthState::Authenticated => {
                self.open_workflow().await?;
                self.go(Route::Restored)
            }
            _ => self.go(Route::NoSession),
        }
    }

    pub async fn login(&self, credentials: Credentials) -> Result<Screen, Error> {
        self.require_screen(Screen::Auth)?;
        self.auth.login(credentials).await?;
        self.enter_workflow().await
    }

    pub async fn register(&self, registration: Registration) -> Result<Screen, Error> {
        self.require_screen(Screen::Auth)?;
        self.auth.register(registration).await?;
        self.enter_workflow().await
    }

    async fn enter_workflow(&self) -> Result<Screen, Error> {
        // Lets the success acknowledgement show before the screen changes.
        if !self.login_handoff.is_zero() {
            tokio::time::sleep(self.login_handoff).await;
        }
        if self.auth.state() != AuthState::Authenticated {
            tracing::warn!("Session ended during the login hand-off");
            return Err(Error::Forbidden);
        }
        self.open_workflow().await?;
        self.go(Route::SignedIn)
    }

    async fn open_workflow(&self) -> Result<(), Error> {
        let workflow = Workflow::open().await?;
        *self.workflow.write().await = Some(workflow);
        Ok(())
    }

    /// Only offered from the workflow screens, so a login still handing off
    /// on `auth` cannot be logged out underneath.
    pub fn request_logout(&self) -> Result<(), Error> {
        if !self.screen().is_authenticated() {
            return Err(Error::Forbidden);
        }
        self.auth.request_logout()
    }

    pub fn cancel_logout(&self) {
        self.auth.cancel_logout();
    }

    /// Clears the stored session, discards the intake pass and returns to
    /// `auth`, whichever workflow screen was current.
    pub async fn confirm_logout(&self) -> Result<Screen, Error> {
        self.auth.confirm_logout().await?;

        if let Some(workflow) = self.workflow.write().await.take() {
            if let Err(e) = workflow.execute(Command::CloseSession).await {
                tracing::warn!(session_id = %workflow.id(), "Closing intake session failed: {}", e);
            }
        }
        self.go(Route::SignedOut)
    }

    // ── Intake wizard ───────────────────────────────────────

    async fn execute(&self, command: Command) -> Result<Screen, Error> {
        let step = {
            let guard = self.workflow.read().await;
            let workflow = guard.as_ref().ok_or(Error::Forbidden)?;
            workflow.execute(command).await?;
            workflow.snapshot().step
        };
        self.go(Route::Step(step))
    }

    pub async fn update_patient(&self, patient: PatientInfo) -> Result<Screen, Error> {
        self.execute(Command::UpdatePatient { patient }).await
    }

    pub async fn set_patient_name(&self, name: impl Into<String>) -> Result<Screen, Error> {
        let patient = PatientInfo {
            name: name.into(),
            ..self.intake().await.patient
        };
        self.update_patient(patient).await
    }

    pub async fn set_patient_age(&self, age: impl Into<String>) -> Result<Screen, Error> {
        let patient = PatientInfo {
            age: age.into(),
            ..self.intake().await.patient
        };
        self.update_patient(patient).await
    }

    pub async fn set_patient_gender(&self, gender: Gender) -> Result<Screen, Error> {
        let patient = PatientInfo {
            gender: Some(gender),
            ..self.intake().await.patient
        };
        self.update_patient(patient).await
    }

    pub async fn add_symptom(&self, text: impl Into<String>) -> Result<Screen, Error> {
        self.execute(Command::AddSymptom { text: text.into() }).await
    }

    pub async fn remove_symptom(&self, index: usize) -> Result<Screen, Error> {
        self.execute(Command::RemoveSymptom { index }).await
    }

    pub async fn toggle_condition(&self, condition: impl Into<String>) -> Result<Screen, Error> {
        self.execute(Command::ToggleCondition {
            condition: condition.into(),
        })
        .await
    }

    /// Next step. From `home` this does nothing until the patient details
    /// are complete and at least one symptom is listed.
    pub async fn proceed(&self) -> Result<Screen, Error> {
        self.execute(Command::Proceed).await
    }

    pub async fn back(&self) -> Result<Screen, Error> {
        self.execute(Command::GoBack).await
    }

    /// Starts a new pass from `prescription`, clearing all intake data.
    pub async fn reset(&self) -> Result<Screen, Error> {
        self.execute(Command::Reset).await
    }

    /// Asks the catalog for a diagnosis and candidate medicines. The first
    /// result is kept for the rest of the pass.
    pub async fn search_medicines(&self) -> Result<SearchOutcome, Error> {
        self.require_screen(Screen::MedicineSearch)?;
        let intake = self.intake().await;

        if let Some(diagnosis) = intake.diagnosis {
            return Ok(SearchOutcome {
                diagnosis,
                medicines: intake.catalog,
            });
        }

        let outcome = match self
            .catalog
            .search(&intake.symptoms, &intake.health_conditions)
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Medicine search failed: {}", e);
                self.notifications.error(e.to_string());
                return Err(e);
            }
        };

        tracing::info!(medicines = outcome.medicines.len(), "Medicine search finished");
        self.execute(Command::RecordSearch {
            outcome: outcome.clone(),
        })
        .await?;
        Ok(outcome)
    }

    pub async fn toggle_medicine(&self, name: impl Into<String>) -> Result<Screen, Error> {
        self.execute(Command::ToggleMedicine { name: name.into() }).await
    }

    pub async fn select_medicines(&self, names: Vec<String>) -> Result<Screen, Error> {
        self.execute(Command::SelectMedicines { names }).await
    }

    pub async fn generate_prescription(&self) -> Result<PrescriptionDocument, Error> {
        self.require_screen(Screen::Prescription)?;
        let user = self.auth.user().ok_or(Error::Forbidden)?;
        let request = prescription_request(&self.intake().await, &user)?;

        match self.prescriptions.generate(&request).await {
            Ok(document) => {
                self.notifications.success("Prescription generated");
                Ok(document)
            }
            Err(e) => {
                tracing::warn!("Prescription generation failed: {}", e);
                self.notifications.error(e.to_string());
                Err(e)
            }
        }
    }
}

fn prescription_request(
    intake: &IntakeSession,
    doctor: &UserProfile,
) -> Result<PrescriptionRequest, Error> {
    if intake.step != Step::Prescription {
        return Err(Error::StepMismatch {
            expected: Step::Prescription.to_string(),
            actual: intake.step.to_string(),
        });
    }

    Ok(PrescriptionRequest {
        patient_name: intake.patient.name.trim().to_string(),
        patient_age: intake.patient.age_years()?,
        patient_gender: intake
            .patient
            .gender
            .map(|g| g.to_string())
            .unwrap_or_default(),
        symptoms: intake.symptoms.clone(),
        health_conditions: intake.health_conditions.clone(),
        medicines: intake
            .selected_catalog()
            .iter()
            .map(PrescriptionItem::from)
            .collect(),
        doctor_name: doctor.name.clone(),
        doctor_registration: doctor.registration_number.clone(),
    })
}
