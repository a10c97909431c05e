// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer registration service.
//!
//! Every mutating operation runs as one unit of work that writes the
//! customer aggregate and exactly one outbox event. Reads never touch the
//! outbox. Responses carry masked PAN and Aadhaar numbers.

pub mod dto;
pub mod masking;
pub mod service;
pub mod validate;

pub use dto::{
    AddressRequest, CustomerRequest, CustomerResponse, EmploymentRequest, EnquiryRequest,
    PageResponse, StatusUpdateRequest,
};
pub use service::CustomerService;
