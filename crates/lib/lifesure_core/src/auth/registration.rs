//! Registration input and its validation.
//!
//! Raw request bodies deserialize into these types with every field
//! optional, so that missing and malformed fields are reported together.

use serde::Deserialize;

use super::AuthError;
use crate::models::auth::{Gender, NewAdmin, NewUser};
use crate::validation::{self, Problems};

/// User registration body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pin_code: Option<String>,
}

impl UserRegistration {
    /// Validate every field, returning the normalised user and the password.
    pub fn validate(&self) -> Result<(NewUser, String), AuthError> {
        let mut problems = Problems::new();
        let name = problems.check(validation::required("name", self.name.as_deref()));
        let email = problems.check(validation::email(self.email.as_deref()));
        let password = problems.check(validation::password(self.password.as_deref()));
        let phone = problems.check(validation::digits("phone", self.phone.as_deref(), 10));
        let gender = problems.check(
            validation::required("gender", self.gender.as_deref())
                .and_then(|g| g.parse::<Gender>()),
        );
        let dob = problems.check(validation::date("dob", self.dob.as_deref()));
        let city = problems.check(validation::required("city", self.city.as_deref()));
        let state = problems.check(validation::required("state", self.state.as_deref()));
        let pin_code = problems.check(validation::digits("pinCode", self.pin_code.as_deref(), 6));

        match (name, email, password, phone, gender, dob, city, state, pin_code) {
            (
                Some(name),
                Some(email),
                Some(password),
                Some(phone),
                Some(gender),
                Some(dob),
                Some(city),
                Some(state),
                Some(pin_code),
            ) if problems.is_empty() => Ok((
                NewUser {
                    name,
                    email,
                    phone,
                    gender,
                    dob,
                    city,
                    state,
                    pin_code,
                },
                password,
            )),
            _ => Err(AuthError::ValidationError(
                problems
                    .finish()
                    .err()
                    .unwrap_or_else(|| "invalid registration".into()),
            )),
        }
    }
}

/// Administrator registration body.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegistration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub password: Option<String>,
}

impl AdminRegistration {
    pub fn validate(&self) -> Result<(NewAdmin, String), AuthError> {
        let mut problems = Problems::new();
        let name = problems.check(validation::required("name", self.name.as_deref()));
        let email = problems.check(validation::email(self.email.as_deref()));
        let phone_number = problems.check(validation::required(
            "phoneNumber",
            self.phone_number.as_deref(),
        ));
        let password = problems.check(validation::password(self.password.as_deref()));

        match (name, email, phone_number, password) {
            (Some(name), Some(email), Some(phone_number), Some(password)) => Ok((
                NewAdmin {
                    name,
                    email,
                    phone_number,
                },
                password,
            )),
            _ => Err(AuthError::ValidationError(
                problems
                    .finish()
                    .err()
                    .unwrap_or_else(|| "invalid registration".into()),
            )),
        }
    }
}

/// Login body shared by both account kinds.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}
