use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::Error;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, Eq, PartialEq, Hash)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Gender::ALL
            .into_iter()
            .find(|g| g.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Validation {
                message: format!("Unknown gender: {}", s),
            })
    }
}

/// Patient details entered on the home step. Age stays free text until a
/// prescription is generated.
#[derive(Clone, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct PatientInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub age: String,
    #[serde(default)]
    pub gender: Option<Gender>,
}

impl PatientInfo {
    pub fn new(name: impl Into<String>, age: impl Into<String>, gender: Option<Gender>) -> Self {
        Self {
            name: name.into(),
            age: age.into(),
            gender,
        }
    }

    pub fn age_years(&self) -> Result<u32, Error> {
        self.age.trim().parse().map_err(|_| Error::Validation {
            message: format!("Age must be a whole number, got {:?}", self.age),
        })
    }
}
