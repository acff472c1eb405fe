//! Newsletter subscription requests.

use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;

/// Body of `POST /api/subscribe`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSubscriber {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
}

impl NewSubscriber {
    /// Trim and lowercase the address, then validate it.
    ///
    /// Addresses are compared case-insensitively, so the stored form is
    /// always lowercase.
    pub fn normalized(mut self) -> Result<Self, CoreError> {
        self.email = self.email.trim().to_lowercase();
        if self.email.is_empty() {
            return Err(CoreError::Validation(
                "Invalid Subscriber: email: Please provide an email address".to_string(),
            ));
        }
        self.validate().map_err(|_| {
            CoreError::Validation(
                "Invalid Subscriber: email: Please provide a valid email address".to_string(),
            )
        })?;
        Ok(self)
    }
}
