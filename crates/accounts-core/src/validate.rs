//! Field validation rules.
//!
//! Every rule is pure and total: it maps a raw value to `None` when valid,
//! or to a fixed user-facing message. Lengths are counted in characters.

use std::fmt;

pub const EMAIL_MESSAGE: &str = "Please enter a valid email address";
pub const PASSWORD_MESSAGE: &str = "Password must be at least 3 characters";
pub const NAME_MESSAGE: &str = "Name must be at least 2 characters";
pub const CODE_MESSAGE: &str = "Code must be 6 digits";
pub const CONFIRM_MESSAGE: &str = "Please confirm your password";
pub const MISMATCH_MESSAGE: &str = "Passwords do not match";

const MIN_PASSWORD_LEN: usize = 3;
const MIN_NAME_LEN: usize = 2;
const CODE_LEN: usize = 6;

/// Form fields known to the account screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Email,
    Code,
    FirstName,
    LastName,
    Password,
    ConfirmPassword,
    Phone,
    DateOfBirth,
    Address,
}

impl Field {
    /// Wire/form identifier of the field.
    pub fn name(self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Code => "code",
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
            Field::Phone => "phone",
            Field::DateOfBirth => "dob",
            Field::Address => "address",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Email => "Email Address",
            Field::Code => "Verification Code",
            Field::FirstName => "First Name",
            Field::LastName => "Last Name",
            Field::Password => "Password",
            Field::ConfirmPassword => "Confirm Password",
            Field::Phone => "Phone Number",
            Field::DateOfBirth => "Date of Birth",
            Field::Address => "Address",
        }
    }

    /// Optional fields carry no rule and are always valid.
    pub fn is_optional(self) -> bool {
        matches!(self, Field::Phone | Field::DateOfBirth | Field::Address)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A failed rule for a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.label(), self.message)
    }
}

/// Deliberately weak: only checks for the presence of `@` and `.`.
pub fn validate_email(value: &str) -> Option<&'static str> {
    if value.contains('@') && value.contains('.') {
        None
    } else {
        Some(EMAIL_MESSAGE)
    }
}

pub fn validate_password(value: &str) -> Option<&'static str> {
    (value.chars().count() < MIN_PASSWORD_LEN).then_some(PASSWORD_MESSAGE)
}

pub fn validate_name(value: &str) -> Option<&'static str> {
    (value.trim().chars().count() < MIN_NAME_LEN).then_some(NAME_MESSAGE)
}

/// Exactly six characters; digits are not enforced.
pub fn validate_verification_code(value: &str) -> Option<&'static str> {
    (value.chars().count() != CODE_LEN).then_some(CODE_MESSAGE)
}

/// Validates a password confirmation against the chosen password.
pub fn validate_confirmation(password: &str, confirm: &str) -> Option<&'static str> {
    if password != confirm {
        Some(MISMATCH_MESSAGE)
    } else if confirm.chars().count() < MIN_PASSWORD_LEN {
        Some(CONFIRM_MESSAGE)
    } else {
        None
    }
}

/// Applies the standalone rule for `field`.
///
/// `ConfirmPassword` needs the password for comparison; here it only gets the
/// length rule. Use [`validate_confirmation`] for the full check.
pub fn validate(field: Field, value: &str) -> Option<&'static str> {
    match field {
        Field::Email => validate_email(value),
        Field::Password | Field::ConfirmPassword => validate_password(value),
        Field::FirstName | Field::LastName => validate_name(value),
        Field::Code => validate_verification_code(value),
        Field::Phone | Field::DateOfBirth | Field::Address => None,
    }
}

/// Runs the rules for each `(field, value)` pair and collects the failures.
pub fn collect_errors<'a>(
    fields: impl IntoIterator<Item = (Field, &'a str)>,
) -> Vec<FieldError> {
    fields
        .into_iter()
        .filter_map(|(field, value)| {
            validate(field, value).map(|message| FieldError { field, message })
        })
        .collect()
}
