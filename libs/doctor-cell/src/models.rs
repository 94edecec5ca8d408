use serde::{Deserialize, Serialize};

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Doctor {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub specialization: String,
    /// Years in practice.
    #[serde(default)]
    pub experience: u32,
    /// Consultation fee.
    #[serde(default)]
    pub fees: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

impl Doctor {
    pub fn has_specialization(&self, specialization: &str) -> bool {
        self.specialization
            .trim()
            .eq_ignore_ascii_case(specialization.trim())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorSearchFilters {
    pub specialization: Option<String>,
    pub available_only: bool,
}

impl DoctorSearchFilters {
    pub fn specialization(specialization: impl Into<String>) -> Self {
        Self {
            specialization: Some(specialization.into()),
            available_only: false,
        }
    }

    pub fn matches(&self, doctor: &Doctor) -> bool {
        if self.available_only && !doctor.available {
            return false;
        }
        match self.specialization.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(wanted) => doctor.has_specialization(wanted),
        }
    }
}
