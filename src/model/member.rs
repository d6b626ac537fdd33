use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Record;

/// A library member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Absent for members saved before join dates were tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_date: Option<NaiveDate>,
}

impl Member {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            join_date: None,
        }
    }

    /// Set the join date
    pub fn joined(mut self, date: NaiveDate) -> Self {
        self.join_date = Some(date);
        self
    }
}

impl Record for Member {
    const STORE_KEY: &'static str = "library-members";

    fn id(&self) -> &str {
        &self.id
    }
}
