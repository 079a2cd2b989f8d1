use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Candidate {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_of_experience: Option<i32>,
    pub education_level: Option<String>,
    pub cv_file_url: Option<String>,
}

/// Partial update of a candidate row.
///
/// `None` means "leave the stored value alone", never "set to NULL".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub years_of_experience: Option<i32>,
    pub education_level: Option<String>,
}

impl CandidateUpdate {
    pub fn is_empty(&self) -> bool {
        self.changed_fields().is_empty()
    }

    /// Names of the fields this update will write, in column order.
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.full_name.is_some() {
            fields.push("full_name");
        }
        if self.email.is_some() {
            fields.push("email");
        }
        if self.phone.is_some() {
            fields.push("phone");
        }
        if self.years_of_experience.is_some() {
            fields.push("years_of_experience");
        }
        if self.education_level.is_some() {
            fields.push("education_level");
        }
        fields
    }

    /// Applies the update to an in-memory candidate, skipping absent fields.
    /// Mirrors the COALESCE update the Postgres store runs.
    #[cfg(test)]
    pub fn apply_to(&self, candidate: &mut Candidate) {
        if let Some(name) = &self.full_name {
            candidate.full_name = name.clone();
        }
        if let Some(email) = &self.email {
            candidate.email = Some(email.clone());
        }
        if let Some(phone) = &self.phone {
            candidate.phone = Some(phone.clone());
        }
        if let Some(years) = self.years_of_experience {
            candidate.years_of_experience = Some(years);
        }
        if let Some(level) = &self.education_level {
            candidate.education_level = Some(level.clone());
        }
    }
}
