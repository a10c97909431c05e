// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer registration operations.
//!
//! Mutations validate first, then run one [`Database::transact`] unit of
//! work: uniqueness checks, the aggregate write and the outbox event commit
//! or roll back together. The broker is never called from here.

use chrono::{NaiveDate, Utc};
use custreg_core::types::{now_timestamp, Customer, CustomerEventType, CustomerStatus};
use custreg_core::RegistryError;
use custreg_storage::queries::customers::{self, CustomerFilter, CustomerKey, UniqueField};
use custreg_storage::{Database, OutboxWriter};
use tracing::{debug, info, warn};

use crate::dto::{CustomerRequest, CustomerResponse, EnquiryRequest, PageResponse};
use crate::masking::{mask_aadhaar, mask_pan};
use crate::validate::{check_age, check_page, validate_customer, validate_enquiry};

/// The customer registration service.
#[derive(Clone)]
pub struct CustomerService {
    db: Database,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Fail with `AlreadyExists` if another customer holds any of the unique values.
fn ensure_unique(
    conn: &rusqlite::Connection,
    customer: &Customer,
    exclude_id: Option<i64>,
) -> Result<(), RegistryError> {
    let checks = [
        (
            UniqueField::Pan,
            customer.pan_number.as_str(),
            format!("PAN already registered: {}", mask_pan(&customer.pan_number)),
        ),
        (
            UniqueField::Aadhaar,
            customer.aadhaar_number.as_str(),
            format!(
                "Aadhaar already registered: {}",
                mask_aadhaar(&customer.aadhaar_number)
            ),
        ),
        (
            UniqueField::Email,
            customer.email.as_str(),
            format!("Email already registered: {}", customer.email),
        ),
        (
            UniqueField::Mobile,
            customer.mobile.as_str(),
            format!("Mobile already registered: {}", customer.mobile),
        ),
    ];
    for (field, value, message) in checks {
        if customers::exists_by(conn, field, value, exclude_id)? {
            warn!(?field, pan = %mask_pan(&customer.pan_number), "duplicate customer field");
            return Err(RegistryError::AlreadyExists(message));
        }
    }
    Ok(())
}

fn load(conn: &rusqlite::Connection, id: i64) -> Result<Customer, RegistryError> {
    customers::find(conn, CustomerKey::Id(id))?
        .ok_or_else(|| RegistryError::not_found("customer", id))
}

/// Write `customer` as a new row and record `event` for it.
fn insert_with_event(
    tx: &rusqlite::Transaction<'_>,
    mut customer: Customer,
    event: CustomerEventType,
) -> Result<Customer, RegistryError> {
    ensure_unique(tx, &customer, None)?;
    customer.id = customers::insert(tx, &customer)?;
    OutboxWriter::record(tx, &customer.customer_uuid, event.as_str(), &customer)?;
    Ok(customer)
}

/// Overwrite an existing row and record `event` for it.
fn update_with_event(
    tx: &rusqlite::Transaction<'_>,
    customer: Customer,
    event: CustomerEventType,
) -> Result<Customer, RegistryError> {
    customers::update(tx, &customer)?;
    OutboxWriter::record(tx, &customer.customer_uuid, event.as_str(), &customer)?;
    Ok(customer)
}

/// Copy the identity fields of a full request onto `customer`.
fn apply_identity(customer: &mut Customer, req: &CustomerRequest, date_of_birth: NaiveDate) {
    customer.first_name = req.first_name.trim().to_string();
    customer.last_name = req.last_name.trim().to_string();
    customer.gender = req.gender.trim().to_string();
    customer.date_of_birth = date_of_birth;
    customer.email = req.email.trim().to_string();
    customer.mobile = req.mobile_number.clone();
    customer.pan_number = req.pan_number.clone();
    customer.aadhaar_number = req.aadhaar_number.clone();
}

fn apply_details(customer: &mut Customer, req: &CustomerRequest) {
    if let Some(address) = &req.address {
        customer.address = Some(address.into());
    }
    if let Some(employment) = &req.employment_details {
        customer.employment = Some(employment.into());
    }
}

fn required_dob(date_of_birth: Option<NaiveDate>) -> Result<NaiveDate, RegistryError> {
    date_of_birth.ok_or_else(|| RegistryError::Validation("date_of_birth is required".into()))
}

impl CustomerService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn committed(&self, customer: &Customer, event: CustomerEventType) -> CustomerResponse {
        custreg_prometheus::record_event_recorded(event.as_str());
        info!(
            customer_id = customer.id,
            customer_uuid = %customer.customer_uuid,
            event_type = %event,
            status = %customer.status,
            "customer change committed"
        );
        CustomerResponse::from(customer)
    }

    /// Register a customer from a basic enquiry (`PENDING_KYC`).
    pub async fn create_enquiry(
        &self,
        req: EnquiryRequest,
    ) -> Result<CustomerResponse, RegistryError> {
        info!(pan = %mask_pan(&req.pan_number), "create enquiry");
        validate_enquiry(&req, today())?;
        let date_of_birth = required_dob(req.date_of_birth)?;

        let now = now_timestamp();
        let customer = Customer {
            id: 0,
            customer_uuid: uuid::Uuid::new_v4().to_string(),
            first_name: req.first_name.trim().to_string(),
            last_name: req.last_name.trim().to_string(),
            gender: req.gender.trim().to_string(),
            date_of_birth,
            email: req.email.trim().to_string(),
            mobile: req.mobile_number,
            pan_number: req.pan_number,
            aadhaar_number: req.aadhaar_number,
            status: CustomerStatus::PendingKyc,
            address: None,
            employment: None,
            created_at: now.clone(),
            updated_at: now,
        };

        let event = CustomerEventType::CustomerRegistered;
        let customer = self
            .db
            .transact(move |tx| insert_with_event(tx, customer, event))
            .await?;
        Ok(self.committed(&customer, event))
    }

    /// Register a customer with full details (`PENDING_KYC`).
    pub async fn create_customer(
        &self,
        req: CustomerRequest,
    ) -> Result<CustomerResponse, RegistryError> {
        info!(pan = %mask_pan(&req.pan_number), "create customer");
        let today = today();
        validate_customer(&req, true, today)?;
        let date_of_birth = required_dob(req.date_of_birth)?;
        check_age(date_of_birth, today)?;

        let now = now_timestamp();
        let mut customer = Customer {
            id: 0,
            customer_uuid: uuid::Uuid::new_v4().to_string(),
            first_name: String::new(),
            last_name: String::new(),
            gender: String::new(),
            date_of_birth,
            email: String::new(),
            mobile: String::new(),
            pan_number: String::new(),
            aadhaar_number: String::new(),
            status: CustomerStatus::PendingKyc,
            address: None,
            employment: None,
            created_at: now.clone(),
            updated_at: now,
        };
        apply_identity(&mut customer, &req, date_of_birth);
        apply_details(&mut customer, &req);

        let event = CustomerEventType::CustomerCreated;
        let customer = self
            .db
            .transact(move |tx| insert_with_event(tx, customer, event))
            .await?;
        Ok(self.committed(&customer, event))
    }

    /// Complete KYC: replace identity and details, then activate.
    pub async fn complete_kyc(
        &self,
        id: i64,
        req: CustomerRequest,
    ) -> Result<CustomerResponse, RegistryError> {
        info!(customer_id = id, pan = %mask_pan(&req.pan_number), "complete kyc");
        let today = today();
        validate_customer(&req, true, today)?;
        let date_of_birth = required_dob(req.date_of_birth)?;
        check_age(date_of_birth, today)?;

        let event = CustomerEventType::CustomerKycCompleted;
        let customer = self
            .db
            .transact(move |tx| {
                let mut customer = load(tx, id)?;
                apply_identity(&mut customer, &req, date_of_birth);
                ensure_unique(tx, &customer, Some(id))?;
                customer.address = None;
                customer.employment = None;
                apply_details(&mut customer, &req);
                customer.status = CustomerStatus::Active;
                customer.updated_at = now_timestamp();
                update_with_event(tx, customer, event)
            })
            .await?;
        Ok(self.committed(&customer, event))
    }

    /// Update identity fields. Address and employment are replaced only
    /// when the request carries them. Status is unchanged.
    pub async fn update_customer(
        &self,
        id: i64,
        req: CustomerRequest,
    ) -> Result<CustomerResponse, RegistryError> {
        info!(customer_id = id, pan = %mask_pan(&req.pan_number), "update customer");
        let today = today();
        validate_customer(&req, false, today)?;
        let date_of_birth = required_dob(req.date_of_birth)?;
        check_age(date_of_birth, today)?;

        let event = CustomerEventType::CustomerUpdated;
        let customer = self
            .db
            .transact(move |tx| {
                let mut customer = load(tx, id)?;
                apply_identity(&mut customer, &req, date_of_birth);
                ensure_unique(tx, &customer, Some(id))?;
                apply_details(&mut customer, &req);
                customer.updated_at = now_timestamp();
                update_with_event(tx, customer, event)
            })
            .await?;
        Ok(self.committed(&customer, event))
    }

    pub async fn update_status(
        &self,
        id: i64,
        status: CustomerStatus,
    ) -> Result<CustomerResponse, RegistryError> {
        info!(customer_id = id, %status, "update customer status");
        let event = CustomerEventType::CustomerStatusChanged;
        let customer = self
            .db
            .transact(move |tx| {
                let mut customer = load(tx, id)?;
                customer.status = status;
                customer.updated_at = now_timestamp();
                update_with_event(tx, customer, event)
            })
            .await?;
        Ok(self.committed(&customer, event))
    }

    pub async fn get_by_id(&self, id: i64) -> Result<CustomerResponse, RegistryError> {
        debug!(customer_id = id, "get customer by id");
        let customer = self.db.read(move |conn| load(conn, id)).await?;
        Ok(CustomerResponse::from(&customer))
    }

    pub async fn get_by_uuid(&self, uuid: &str) -> Result<CustomerResponse, RegistryError> {
        let key = uuid.to_string();
        let customer = self
            .db
            .read(move |conn| customers::find(conn, CustomerKey::Uuid(&key)))
            .await?
            .ok_or_else(|| RegistryError::not_found("customer", uuid))?;
        Ok(CustomerResponse::from(&customer))
    }

    /// Lookup by PAN. The PAN is masked in the not-found message.
    pub async fn get_by_pan(&self, pan: &str) -> Result<CustomerResponse, RegistryError> {
        debug!(pan = %mask_pan(pan), "get customer by pan");
        let key = pan.to_string();
        let customer = self
            .db
            .read(move |conn| customers::find(conn, CustomerKey::Pan(&key)))
            .await?
            .ok_or_else(|| RegistryError::not_found("customer", mask_pan(pan)))?;
        Ok(CustomerResponse::from(&customer))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<CustomerResponse, RegistryError> {
        let key = email.to_string();
        let customer = self
            .db
            .read(move |conn| customers::find(conn, CustomerKey::Email(&key)))
            .await?
            .ok_or_else(|| RegistryError::not_found("customer", email))?;
        Ok(CustomerResponse::from(&customer))
    }

    /// All customers, newest first.
    pub async fn list(
        &self,
        page: u32,
        size: u32,
    ) -> Result<PageResponse<CustomerResponse>, RegistryError> {
        self.page(CustomerFilter::All, page, size).await
    }

    /// Customers in one status, newest first.
    pub async fn list_by_status(
        &self,
        status: CustomerStatus,
        page: u32,
        size: u32,
    ) -> Result<PageResponse<CustomerResponse>, RegistryError> {
        self.page(CustomerFilter::Status(status), page, size).await
    }

    /// Search by first/last name (case-insensitive), PAN or e-mail substring.
    pub async fn search(
        &self,
        term: &str,
        page: u32,
        size: u32,
    ) -> Result<PageResponse<CustomerResponse>, RegistryError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(RegistryError::Validation(
                "search term must not be blank".into(),
            ));
        }
        self.page(CustomerFilter::Search(term.to_string()), page, size)
            .await
    }

    async fn page(
        &self,
        filter: CustomerFilter,
        page: u32,
        size: u32,
    ) -> Result<PageResponse<CustomerResponse>, RegistryError> {
        check_page(size)?;
        debug!(?filter, page, size, "list customers");
        let (rows, total) = self
            .db
            .read(move |conn| customers::page(conn, &filter, page, size))
            .await?;
        let content = rows.iter().map(CustomerResponse::from).collect();
        Ok(PageResponse::new(content, page, size, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{AddressRequest, EmploymentRequest};
    use chrono::Datelike;
    use custreg_core::OutboxStatus;
    use custreg_storage::queries::outbox;
    use tempfile::tempdir;

    async fn setup() -> (CustomerService, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (CustomerService::new(db), dir)
    }

    fn dob_years_ago(years: i32) -> NaiveDate {
        NaiveDate::from_ymd_opt(today().year() - years, 1, 1).unwrap()
    }

    fn enquiry(n: u32) -> EnquiryRequest {
        EnquiryRequest {
            first_name: format!("Asha{n}"),
            last_name: "Rao".into(),
            gender: "F".into(),
            date_of_birth: Some(dob_years_ago(30)),
            email: format!("asha{n}@example.com"),
            mobile_number: format!("98765432{n:02}"),
            pan_number: format!("ABCDE12{n:02}F"),
            aadhaar_number: format!("1234567890{n:02}"),
        }
    }

    fn full_request(n: u32) -> CustomerRequest {
        let e = enquiry(n);
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

    async fn events_for(svc: &CustomerService, uuid: &str) -> Vec<custreg_core::OutboxEvent> {
        outbox::list_for_aggregate(svc.database(), uuid).await.unwrap()
    }

    #[tokio::test]
    async fn enquiry_writes_customer_and_one_pending_event() {
        let (svc, _dir) = setup().await;
        let resp = svc.create_enquiry(enquiry(1)).await.unwrap();
        assert_eq!(resp.status, CustomerStatus::PendingKyc);
        assert!(!resp.active);
        assert_eq!(resp.pan_number, "ABC*****F");

        let events = events_for(&svc, &resp.customer_uuid).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "CUSTOMER_REGISTERED");
        assert_eq!(events[0].status, OutboxStatus::Pending);
        assert_eq!(events[0].retry_count, 0);

        let snapshot: Customer = serde_json::from_str(&events[0].payload).unwrap();
        assert_eq!(snapshot.id, resp.customer_id);
        assert_eq!(snapshot.pan_number, "ABCDE1201F");
    }

    #[tokio::test]
    async fn duplicate_fields_are_rejected_without_new_events() {
        let (svc, _dir) = setup().await;
        svc.create_enquiry(enquiry(1)).await.unwrap();

        let mut dup_pan = enquiry(2);
        dup_pan.pan_number = "ABCDE1201F".into();
        let err = svc.create_enquiry(dup_pan).await.unwrap_err();
        match err {
            RegistryError::AlreadyExists(msg) => {
                assert!(msg.contains("PAN"));
                assert!(!msg.contains("ABCDE1201F"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut dup_mobile = enquiry(3);
        dup_mobile.mobile_number = "9876543201".into();
        assert!(matches!(
            svc.create_enquiry(dup_mobile).await.unwrap_err(),
            RegistryError::AlreadyExists(_)
        ));

        let pending = outbox::count_by_status(svc.database(), OutboxStatus::Pending)
            .await
            .unwrap();
        assert_eq!(pending, 1);
    }

    #[tokio::test]
    async fn create_customer_enforces_age_before_writing() {
        let (svc, _dir) = setup().await;
        let mut req = full_request(1);
        req.date_of_birth = Some(dob_years_ago(18));
        match svc.create_customer(req).await.unwrap_err() {
            RegistryError::BusinessRule { code, .. } => assert_eq!(code, "AGE_NOT_ELIGIBLE"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(svc.list(0, 10).await.unwrap().total_elements, 0);
        assert_eq!(
            outbox::count_by_status(svc.database(), OutboxStatus::Pending)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn create_customer_stores_details() {
        let (svc, _dir) = setup().await;
        let resp = svc.create_customer(full_request(1)).await.unwrap();
        assert_eq!(resp.status, CustomerStatus::PendingKyc);
        let address = resp.address.unwrap();
        assert_eq!(address.address_type, "CURRENT");
        assert_eq!(address.city, "Pune");
        assert_eq!(resp.employment_details.unwrap().company_name, "Acme");

        let events = events_for(&svc, &resp.customer_uuid).await;
        assert_eq!(events[0].event_type, "CUSTOMER_CREATED");
    }

    #[tokio::test]
    async fn kyc_activates_and_records_event() {
        let (svc, _dir) = setup().await;
        let created = svc.create_enquiry(enquiry(1)).await.unwrap();

        let kyc = svc
            .complete_kyc(created.customer_id, full_request(1))
            .await
            .unwrap();
        assert_eq!(kyc.status, CustomerStatus::Active);
        assert!(kyc.active);
        assert_eq!(kyc.customer_uuid, created.customer_uuid);
        assert!(kyc.address.is_some());

        let events = events_for(&svc, &created.customer_uuid).await;
        let types: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(types, vec!["CUSTOMER_REGISTERED", "CUSTOMER_KYC_COMPLETED"]);
    }

    #[tokio::test]
    async fn kyc_rejects_values_owned_by_another_customer() {
        let (svc, _dir) = setup().await;
        let first = svc.create_enquiry(enquiry(1)).await.unwrap();
        svc.create_enquiry(enquiry(2)).await.unwrap();

        let mut req = full_request(1);
        req.email = "asha2@example.com".into();
        let err = svc.complete_kyc(first.customer_id, req).await.unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists(_)));

        let unchanged = svc.get_by_id(first.customer_id).await.unwrap();
        assert_eq!(unchanged.status, CustomerStatus::PendingKyc);
        assert_eq!(events_for(&svc, &first.customer_uuid).await.len(), 1);
    }

    #[tokio::test]
    async fn update_keeps_status_and_own_unique_values() {
        let (svc, _dir) = setup().await;
        let created = svc.create_customer(full_request(1)).await.unwrap();

        let mut req = full_request(1);
        req.first_name = "Ashwini".into();
        req.address = None;
        req.employment_details = None;
        let updated = svc
            .update_customer(created.customer_id, req)
            .await
            .unwrap();
        assert_eq!(updated.first_name, "Ashwini");
        assert_eq!(updated.status, CustomerStatus::PendingKyc);
        assert!(updated.address.is_some());
        assert_eq!(events_for(&svc, &created.customer_uuid).await.len(), 2);
    }

    #[tokio::test]
    async fn status_change_records_event() {
        let (svc, _dir) = setup().await;
        let created = svc.create_enquiry(enquiry(1)).await.unwrap();
        let resp = svc
            .update_status(created.customer_id, CustomerStatus::Inactive)
            .await
            .unwrap();
        assert_eq!(resp.status, CustomerStatus::Inactive);

        let events = events_for(&svc, &created.customer_uuid).await;
        assert_eq!(events.last().unwrap().event_type, "CUSTOMER_STATUS_CHANGED");
        let snapshot: Customer = serde_json::from_str(&events.last().unwrap().payload).unwrap();
        assert_eq!(snapshot.status, CustomerStatus::Inactive);
    }

    #[tokio::test]
    async fn missing_customer_is_not_found_and_writes_nothing() {
        let (svc, _dir) = setup().await;
        assert!(matches!(
            svc.update_status(99, CustomerStatus::Active).await.unwrap_err(),
            RegistryError::NotFound { .. }
        ));
        assert!(matches!(
            svc.get_by_id(99).await.unwrap_err(),
            RegistryError::NotFound { .. }
        ));
        let err = svc.get_by_pan("ZZZZZ9999Z").await.unwrap_err();
        assert!(err.to_string().contains("ZZZ*****Z"));
        assert_eq!(
            outbox::count_by_status(svc.database(), OutboxStatus::Pending)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn lookups_by_each_key() {
        let (svc, _dir) = setup().await;
        let created = svc.create_enquiry(enquiry(1)).await.unwrap();
        assert_eq!(
            svc.get_by_uuid(&created.customer_uuid).await.unwrap(),
            created
        );
        assert_eq!(svc.get_by_pan("ABCDE1201F").await.unwrap(), created);
        assert_eq!(
            svc.get_by_email("asha1@example.com").await.unwrap(),
            created
        );
    }

    #[tokio::test]
    async fn listing_search_and_paging() {
        let (svc, _dir) = setup().await;
        for n in 1..=5 {
            svc.create_enquiry(enquiry(n)).await.unwrap();
        }
        let third = svc.get_by_email("asha3@example.com").await.unwrap();
        svc.update_status(third.customer_id, CustomerStatus::Active)
            .await
            .unwrap();

        let page = svc.list(0, 2).await.unwrap();
        assert_eq!(page.total_elements, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.content.len(), 2);

        let active = svc
            .list_by_status(CustomerStatus::Active, 0, 10)
            .await
            .unwrap();
        assert_eq!(active.total_elements, 1);
        assert_eq!(active.content[0].customer_id, third.customer_id);

        let found = svc.search("asha4", 0, 10).await.unwrap();
        assert_eq!(found.total_elements, 1);
        let by_pan = svc.search("E1202", 0, 10).await.unwrap();
        assert_eq!(by_pan.content[0].email, "asha2@example.com");

        assert!(matches!(
            svc.search("  ", 0, 10).await.unwrap_err(),
            RegistryError::Validation(_)
        ));
        assert!(matches!(
            svc.list(0, 0).await.unwrap_err(),
            RegistryError::Validation(_)
        ));
    }
}
