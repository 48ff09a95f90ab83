use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

use super::Contact;
use super::ContactPatch;
use crate::types::new_id;

/// A repair shop or any other third party responsible for units in maintenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id:         String,
    pub name:       String,
    #[serde(default)]
    pub email:      String,
    #[serde(default)]
    pub phone:      String,
    #[serde(default)]
    pub address:    String,
    #[serde(default = "Utc::now", alias = "created_at")]
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn from_contact(contact: Contact) -> Self {
        Self {
            id:         new_id(),
            name:       contact.name,
            email:      contact.email,
            phone:      contact.phone,
            address:    contact.address,
            created_at: Utc::now(),
        }
    }

    pub fn apply(&mut self, patch: ContactPatch) {
        patch.apply_to(&mut self.name, &mut self.email, &mut self.phone, &mut self.address);
    }
}
