//! Screen-level routing.
//!
//! `route` is the pure transition function over screens. Inside the
//! authenticated region it allows the linear wizard edges only:
//! `home <-> medicine-search <-> prescription`, plus `prescription -> home`
//! on reset. Staying on the current step is always allowed.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{errors::Error, intake::Step};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Screen {
    #[default]
    Splash,
    Loading,
    Auth,
    Home,
    MedicineSearch,
    Prescription,
}

impl Screen {
    pub fn as_str(self) -> &'static str {
        match self {
            Screen::Splash => "splash",
            Screen::Loading => "loading",
            Screen::Auth => "auth",
            Screen::Home => "home",
            Screen::MedicineSearch => "medicine-search",
            Screen::Prescription => "prescription",
        }
    }

    /// Screens only reachable with an authenticated session.
    pub fn is_authenticated(self) -> bool {
        matches!(self, Screen::Home | Screen::MedicineSearch | Screen::Prescription)
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Step> for Screen {
    fn from(step: Step) -> Self {
        match step {
            Step::Home => Screen::Home,
            Step::MedicineSearch => Screen::MedicineSearch,
            Step::Prescription => Screen::Prescription,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Route {
    Boot,
    Restored,
    NoSession,
    SignedIn,
    Step(Step),
    SignedOut,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Boot => f.write_str("boot"),
            Route::Restored => f.write_str("restored"),
            Route::NoSession => f.write_str("no-session"),
            Route::SignedIn => f.write_str("signed-in"),
            Route::Step(step) => f.write_str(step.as_str()),
            Route::SignedOut => f.write_str("signed-out"),
        }
    }
}

pub fn route(current: Screen, event: Route) -> Result<Screen, Error> {
    let next = match (current, event) {
        (Screen::Splash, Route::Boot) => Screen::Loading,
        (Screen::Loading, Route::Restored) => Screen::Home,
        (Screen::Loading, Route::NoSession) => Screen::Auth,
        (Screen::Auth, Route::SignedIn) => Screen::Home,
        (screen, Route::Step(step)) if is_wizard_edge(screen, step.into()) => step.into(),
        (screen, Route::SignedOut) if screen.is_authenticated() => Screen::Auth,
        (from, to) => {
            return Err(Error::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            })
        }
    };
    Ok(next)
}

fn is_wizard_edge(from: Screen, to: Screen) -> bool {
    matches!(
        (from, to),
        (Screen::Home, Screen::Home | Screen::MedicineSearch)
            | (
                Screen::MedicineSearch,
                Screen::Home | Screen::MedicineSearch | Screen::Prescription
            )
            | (
                Screen::Prescription,
                Screen::Home | Screen::MedicineSearch | Screen::Prescription
            )
    )
}
