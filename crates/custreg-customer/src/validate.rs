// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field validation and the home-loan age rule.
//!
//! Field checks collect every problem into one [`RegistryError::Validation`]
//! message. The age rule is a business rule and reports
//! `AGE_NOT_ELIGIBLE`.

use std::sync::LazyLock;

use chrono::NaiveDate;
use custreg_core::RegistryError;
use regex::Regex;

use crate::dto::{AddressRequest, CustomerRequest, EmploymentRequest, EnquiryRequest};

pub const MIN_AGE: u32 = 21;
pub const MAX_AGE: u32 = 65;
pub const MAX_PAGE_SIZE: u32 = 100;

static PAN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z]{5}[0-9]{4}[A-Z]$").unwrap());
static AADHAAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{12}$").unwrap());
static MOBILE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[6-9]\d{9}$").unwrap());
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap());

/// The identity fields shared by enquiry and full customer requests.
struct Identity<'a> {
    first_name: &'a str,
    last_name: &'a str,
    gender: &'a str,
    date_of_birth: Option<NaiveDate>,
    email: &'a str,
    mobile_number: &'a str,
    pan_number: &'a str,
    aadhaar_number: &'a str,
}

impl<'a> From<&'a EnquiryRequest> for Identity<'a> {
    fn from(r: &'a EnquiryRequest) -> Self {
        Identity {
            first_name: &r.first_name,
            last_name: &r.last_name,
            gender: &r.gender,
            date_of_birth: r.date_of_birth,
            email: &r.email,
            mobile_number: &r.mobile_number,
            pan_number: &r.pan_number,
            aadhaar_number: &r.aadhaar_number,
        }
    }
}

impl<'a> From<&'a CustomerRequest> for Identity<'a> {
    fn from(r: &'a CustomerRequest) -> Self {
        Identity {
            first_name: &r.first_name,
            last_name: &r.last_name,
            gender: &r.gender,
            date_of_birth: r.date_of_birth,
            email: &r.email,
            mobile_number: &r.mobile_number,
            pan_number: &r.pan_number,
            aadhaar_number: &r.aadhaar_number,
        }
    }
}

fn require(errors: &mut Vec<String>, value: &str, field: &str) -> bool {
    if value.trim().is_empty() {
        errors.push(format!("{field} is required"));
        false
    } else {
        true
    }
}

fn check_identity(errors: &mut Vec<String>, id: Identity<'_>, today: NaiveDate) {
    require(errors, id.first_name, "first_name");
    require(errors, id.last_name, "last_name");
    require(errors, id.gender, "gender");

    match id.date_of_birth {
        None => errors.push("date_of_birth is required".to_string()),
        Some(dob) if dob >= today => errors.push("date_of_birth must be in the past".to_string()),
        Some(_) => {}
    }

    if require(errors, id.email, "email") && !EMAIL.is_match(id.email.trim()) {
        errors.push("email has an invalid format".to_string());
    }
    if require(errors, id.mobile_number, "mobile_number") && !MOBILE.is_match(id.mobile_number) {
        errors.push("mobile_number is not a valid Indian mobile number".to_string());
    }
    if require(errors, id.pan_number, "pan_number") && !PAN.is_match(id.pan_number) {
        errors.push("pan_number has an invalid PAN format".to_string());
    }
    if require(errors, id.aadhaar_number, "aadhaar_number") && !AADHAAR.is_match(id.aadhaar_number)
    {
        errors.push("aadhaar_number must be 12 digits".to_string());
    }
}

fn check_address(errors: &mut Vec<String>, address: &AddressRequest) {
    require(errors, &address.house_no, "address.house_no");
    require(errors, &address.city, "address.city");
    require(errors, &address.state, "address.state");
    require(errors, &address.pincode, "address.pincode");
}

fn check_employment(errors: &mut Vec<String>, employment: &EmploymentRequest) {
    require(
        errors,
        &employment.employment_type,
        "employment_details.employment_type",
    );
    require(
        errors,
        &employment.company_name,
        "employment_details.company_name",
    );
    match employment.monthly_income {
        None => errors.push("employment_details.monthly_income is required".to_string()),
        Some(income) if !income.is_finite() || income < 0.0 => errors
            .push("employment_details.monthly_income must be a non-negative number".to_string()),
        Some(_) => {}
    }
}

fn finish(errors: Vec<String>) -> Result<(), RegistryError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(RegistryError::Validation(errors.join("; ")))
    }
}

/// Validate an enquiry. No KYC details are expected.
pub fn validate_enquiry(req: &EnquiryRequest, today: NaiveDate) -> Result<(), RegistryError> {
    let mut errors = Vec::new();
    check_identity(&mut errors, req.into(), today);
    finish(errors)
}

/// Validate a full customer request.
///
/// With `require_details` the address and employment sections must be
/// present. Sections that are present are always validated.
pub fn validate_customer(
    req: &CustomerRequest,
    require_details: bool,
    today: NaiveDate,
) -> Result<(), RegistryError> {
    let mut errors = Vec::new();
    check_identity(&mut errors, req.into(), today);

    match &req.address {
        Some(address) => check_address(&mut errors, address),
        None if require_details => errors.push("address is required".to_string()),
        None => {}
    }
    match &req.employment_details {
        Some(employment) => check_employment(&mut errors, employment),
        None if require_details => errors.push("employment_details is required".to_string()),
        None => {}
    }
    finish(errors)
}

/// Home-loan eligibility: completed years of age must be within
/// [`MIN_AGE`]..=[`MAX_AGE`] on `today`.
pub fn check_age(date_of_birth: NaiveDate, today: NaiveDate) -> Result<(), RegistryError> {
    let age = today.years_since(date_of_birth).unwrap_or(0);
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(RegistryError::BusinessRule {
            code: "AGE_NOT_ELIGIBLE".to_string(),
            message: format!(
                "Age must be between {MIN_AGE} and {MAX_AGE} for home loan eligibility"
            ),
        });
    }
    Ok(())
}

/// Page size must be within 1..=[`MAX_PAGE_SIZE`].
pub fn check_page(size: u32) -> Result<(), RegistryError> {
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(RegistryError::Validation(format!(
            "size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    fn valid_enquiry() -> EnquiryRequest {
        EnquiryRequest {
            first_name: "Asha".into(),
            last_name: "Rao".into(),
            gender: "F".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 4, 12),
            email: "asha@example.com".into(),
            mobile_number: "9876543210".into(),
            pan_number: "ABCDE1234F".into(),
            aadhaar_number: "123456789012".into(),
        }
    }

    fn valid_customer() -> CustomerRequest {
        let e = valid_enquiry();
        CustomerRequest {
            first_name: e.first_name,
            last_name: e.last_name,
            gender: e.gender,
            date_of_birth: e.date_of_birth,
            email: e.email,
            mobile_number: e.mobile_number,
            pan_number: e.pan_number,
            aadhaar_number: e.aadhaar_number,
            address: Some(AddressRequest {
                house_no: "12B".into(),
                city: "Pune".into(),
                state: "MH".into(),
                pincode: "411001".into(),
            }),
            employment_details: Some(EmploymentRequest {
                employment_type: "SALARIED".into(),
                company_name: "Acme".into(),
                monthly_income: Some(85000.0),
                total_experience: Some(8),
            }),
        }
    }

    fn validation_message(result: Result<(), RegistryError>) -> String {
        match result {
            Err(RegistryError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn valid_requests_pass() {
        validate_enquiry(&valid_enquiry(), today()).unwrap();
        validate_customer(&valid_customer(), true, today()).unwrap();
    }

    #[test]
    fn every_bad_field_is_reported() {
        let mut req = valid_enquiry();
        req.first_name = " ".into();
        req.pan_number = "abcde1234f".into();
        req.aadhaar_number = "1234".into();
        req.mobile_number = "5876543210".into();
        req.email = "not-an-email".into();
        let msg = validation_message(validate_enquiry(&req, today()));
        assert!(msg.contains("first_name is required"));
        assert!(msg.contains("invalid PAN format"));
        assert!(msg.contains("12 digits"));
        assert!(msg.contains("Indian mobile"));
        assert!(msg.contains("email has an invalid format"));
    }

    #[test]
    fn date_of_birth_must_be_present_and_past() {
        let mut req = valid_enquiry();
        req.date_of_birth = None;
        assert!(validation_message(validate_enquiry(&req, today())).contains("date_of_birth is required"));

        req.date_of_birth = Some(today());
        assert!(validation_message(validate_enquiry(&req, today())).contains("in the past"));
    }

    #[test]
    fn details_required_only_when_asked() {
        let mut req = valid_customer();
        req.address = None;
        req.employment_details = None;
        validate_customer(&req, false, today()).unwrap();
        let msg = validation_message(validate_customer(&req, true, today()));
        assert!(msg.contains("address is required"));
        assert!(msg.contains("employment_details is required"));
    }

    #[test]
    fn present_details_are_validated() {
        let mut req = valid_customer();
        if let Some(address) = req.address.as_mut() {
            address.city.clear();
        }
        if let Some(employment) = req.employment_details.as_mut() {
            employment.monthly_income = None;
        }
        let msg = validation_message(validate_customer(&req, false, today()));
        assert!(msg.contains("address.city is required"));
        assert!(msg.contains("monthly_income is required"));
    }

    #[test]
    fn age_bounds_are_inclusive() {
        let today = today();
        let just_21 = NaiveDate::from_ymd_opt(2005, 6, 15).unwrap();
        let almost_21 = NaiveDate::from_ymd_opt(2005, 6, 16).unwrap();
        let still_65 = NaiveDate::from_ymd_opt(1960, 6, 16).unwrap();
        let turned_66 = NaiveDate::from_ymd_opt(1960, 6, 15).unwrap();

        check_age(just_21, today).unwrap();
        check_age(still_65, today).unwrap();
        for dob in [almost_21, turned_66] {
            match check_age(dob, today) {
                Err(RegistryError::BusinessRule { code, .. }) => assert_eq!(code, "AGE_NOT_ELIGIBLE"),
                other => panic!("expected business rule error, got {other:?}"),
            }
        }
    }

    #[test]
    fn page_size_bounds() {
        check_page(1).unwrap();
        check_page(MAX_PAGE_SIZE).unwrap();
        assert!(check_page(0).is_err());
        assert!(check_page(MAX_PAGE_SIZE + 1).is_err());
    }
}
