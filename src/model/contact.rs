use serde::Deserialize;
use serde::Serialize;

use crate::error::InventoryError;
use crate::error::Result;

/// Contact details shared by customers and companies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub name:    String,
    pub email:   String,
    pub phone:   String,
    pub address: String,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = phone.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(InventoryError::invalid("name must not be empty"));
        }
        Ok(())
    }
}

/// Partial update of contact details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactPatch {
    pub name:    Option<String>,
    pub email:   Option<String>,
    pub phone:   Option<String>,
    pub address: Option<String>,
}

impl ContactPatch {
    pub(crate) fn apply_to(self, name: &mut String, email: &mut String, phone: &mut String, address: &mut String) {
        if let Some(v) = self.name {
            *name = v;
        }
        if let Some(v) = self.email {
            *email = v;
        }
        if let Some(v) = self.phone {
            *phone = v;
        }
        if let Some(v) = self.address {
            *address = v;
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(InventoryError::invalid("name must not be empty"));
        }
        Ok(())
    }
}
