// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request and response shapes of the customer API.
//!
//! Request string fields default to empty so a missing field surfaces as a
//! validation message instead of a deserialization failure.

use chrono::NaiveDate;
use custreg_core::types::{Address, Customer, CustomerStatus, Employment};
use serde::{Deserialize, Serialize};

use crate::masking::{mask_aadhaar, mask_pan};

/// Address type stored for every address captured by this service.
pub const CURRENT_ADDRESS: &str = "CURRENT";

/// Step one: basic registration without KYC details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EnquiryRequest {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub mobile_number: String,
    pub pan_number: String,
    pub aadhaar_number: String,
}

/// Full customer payload used by create, update and KYC completion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerRequest {
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub mobile_number: String,
    pub pan_number: String,
    pub aadhaar_number: String,
    pub address: Option<AddressRequest>,
    pub employment_details: Option<EmploymentRequest>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressRequest {
    pub house_no: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmploymentRequest {
    pub employment_type: String,
    pub company_name: String,
    pub monthly_income: Option<f64>,
    pub total_experience: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: CustomerStatus,
}

impl From<&AddressRequest> for Address {
    fn from(req: &AddressRequest) -> Self {
        Address {
            address_type: CURRENT_ADDRESS.to_string(),
            house_no: req.house_no.trim().to_string(),
            city: req.city.trim().to_string(),
            state: req.state.trim().to_string(),
            pincode: req.pincode.trim().to_string(),
        }
    }
}

impl From<&EmploymentRequest> for Employment {
    fn from(req: &EmploymentRequest) -> Self {
        Employment {
            employment_type: req.employment_type.trim().to_string(),
            company_name: req.company_name.trim().to_string(),
            monthly_income: req.monthly_income.unwrap_or_default(),
            total_experience: req.total_experience,
        }
    }
}

/// Customer as returned by the API. PAN and Aadhaar are masked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub customer_id: i64,
    pub customer_uuid: String,
    pub first_name: String,
    pub last_name: String,
    pub gender: String,
    pub date_of_birth: NaiveDate,
    pub email: String,
    pub mobile_number: String,
    pub pan_number: String,
    pub aadhaar_number: String,
    pub status: CustomerStatus,
    /// `true` only for `ACTIVE` customers.
    pub active: bool,
    pub address: Option<Address>,
    pub employment_details: Option<Employment>,
    pub created_date: String,
    pub updated_date: String,
}

impl From<&Customer> for CustomerResponse {
    fn from(c: &Customer) -> Self {
        CustomerResponse {
            customer_id: c.id,
            customer_uuid: c.customer_uuid.clone(),
            first_name: c.first_name.clone(),
            last_name: c.last_name.clone(),
            gender: c.gender.clone(),
            date_of_birth: c.date_of_birth,
            email: c.email.clone(),
            mobile_number: c.mobile.clone(),
            pan_number: mask_pan(&c.pan_number),
            aadhaar_number: mask_aadhaar(&c.aadhaar_number),
            status: c.status,
            active: c.status == CustomerStatus::Active,
            address: c.address.clone(),
            employment_details: c.employment.clone(),
            created_date: c.created_at.clone(),
            updated_date: c.updated_at.clone(),
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResponse<T> {
    pub content: Vec<T>,
    /// Zero-based page index.
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
    pub first: bool,
    pub last: bool,
}

impl<T> PageResponse<T> {
    pub fn new(content: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(u64::from(size))
        };
        PageResponse {
            content,
            page,
            size,
            total_elements,
            total_pages,
            first: page == 0,
            last: u64::from(page) + 1 >= total_pages,
        }
    }
}
