//! Field validation for client records.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, SalonError};

const MAX_NAME_LEN: usize = 100;
const MAX_PHONE_LEN: usize = 20;
const MAX_EMAIL_LEN: usize = 254;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

static TAX_ID_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{11}$").expect("tax id pattern is valid"));

fn invalid(field: &'static str, reason: impl Into<String>) -> SalonError {
    SalonError::InvalidIdentifier {
        field,
        reason: reason.into(),
    }
}

pub fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(invalid("name", "must not be empty"));
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(invalid("name", format!("must be at most {} characters", MAX_NAME_LEN)));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.len() > MAX_EMAIL_LEN || !EMAIL_RE.is_match(email) {
        return Err(invalid("email", format!("'{}' is not a valid address", email)));
    }
    Ok(())
}

/// Empty is accepted. Otherwise only digits remain once spaces and
/// `+ - ( )` are stripped.
pub fn validate_phone(phone: &str) -> Result<()> {
    if phone.is_empty() {
        return Ok(());
    }
    if phone.chars().count() > MAX_PHONE_LEN {
        return Err(invalid("phone", format!("must be at most {} characters", MAX_PHONE_LEN)));
    }
    let digits: String = phone
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '+' | '-' | '(' | ')'))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(
            "phone",
            "use digits only (may contain +, -, (, ) and spaces)",
        ));
    }
    Ok(())
}

/// Tax ID (CPF): exactly eleven digits, no punctuation.
pub fn validate_tax_id(tax_id: &str) -> Result<()> {
    if !TAX_ID_RE.is_match(tax_id) {
        return Err(invalid("tax_id", "must be exactly 11 numeric digits"));
    }
    Ok(())
}
