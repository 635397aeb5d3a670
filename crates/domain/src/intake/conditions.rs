/// Pre-existing conditions a clinician can flag on the home step.
pub const HEALTH_CONDITIONS: [&str; 10] = [
    "Diabetes",
    "Hypertension (High BP)",
    "Hypotension (Low BP)",
    "PCOD/PCOS",
    "Thyroid",
    "Asthma",
    "Arthritis",
    "Gastric Issues",
    "Migraine",
    "Insomnia",
];

pub fn is_known_condition(condition: &str) -> bool {
    HEALTH_CONDITIONS.contains(&condition)
}
