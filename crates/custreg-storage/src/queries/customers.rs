// SPDX-FileCopyrightText: 2026 Custreg Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Customer aggregate persistence.
//!
//! Synchronous functions over a borrowed connection, so the service can
//! compose them with an outbox insert inside one [`crate::Database::transact`].

use chrono::NaiveDate;
use custreg_core::types::{Address, Customer, CustomerStatus, Employment};
use custreg_core::RegistryError;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, ToSql};

use crate::database::sql_err;

const DATE_FORMAT: &str = "%Y-%m-%d";

const SELECT_CUSTOMER: &str = "SELECT c.id, c.customer_uuid, c.first_name, c.last_name, c.gender,
            c.date_of_birth, c.email, c.mobile, c.pan_number, c.aadhaar_number, c.status,
            c.created_at, c.updated_at,
            a.address_type, a.house_no, a.city, a.state, a.pincode,
            e.employment_type, e.company_name, e.monthly_income, e.total_experience
     FROM customers c
     LEFT JOIN customer_addresses a ON a.customer_id = c.id AND a.address_type = 'CURRENT'
     LEFT JOIN customer_employment e ON e.customer_id = c.id";

/// Columns that must be unique across customers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Pan,
    Aadhaar,
    Email,
    Mobile,
}

impl UniqueField {
    fn column(&self) -> &'static str {
        match self {
            UniqueField::Pan => "pan_number",
            UniqueField::Aadhaar => "aadhaar_number",
            UniqueField::Email => "email",
            UniqueField::Mobile => "mobile",
        }
    }
}

/// A single-customer lookup key.
#[derive(Debug, Clone, Copy)]
pub enum CustomerKey<'a> {
    Id(i64),
    Uuid(&'a str),
    Pan(&'a str),
    Email(&'a str),
}

/// Which customers a page query covers.
#[derive(Debug, Clone, PartialEq)]
pub enum CustomerFilter {
    /// Everyone, newest first.
    All,
    /// One lifecycle status, newest first.
    Status(CustomerStatus),
    /// Name (case-insensitive), PAN or e-mail substring, ordered by name.
    Search(String),
}

fn conversion_err(
    idx: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn row_to_customer(row: &rusqlite::Row<'_>) -> rusqlite::Result<Customer> {
    let dob: String = row.get(5)?;
    let date_of_birth =
        NaiveDate::parse_from_str(&dob, DATE_FORMAT).map_err(|e| conversion_err(5, e))?;
    let status: String = row.get(10)?;
    let status = status
        .parse::<CustomerStatus>()
        .map_err(|e| conversion_err(10, e))?;

    let address = match row.get::<_, Option<String>>(13)? {
        Some(address_type) => Some(Address {
            address_type,
            house_no: row.get(14)?,
            city: row.get(15)?,
            state: row.get(16)?,
            pincode: row.get(17)?,
        }),
        None => None,
    };
    let employment = match row.get::<_, Option<String>>(18)? {
        Some(employment_type) => Some(Employment {
            employment_type,
            company_name: row.get(19)?,
            monthly_income: row.get(20)?,
            total_experience: row.get(21)?,
        }),
        None => None,
    };

    Ok(Customer {
        id: row.get(0)?,
        customer_uuid: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        gender: row.get(4)?,
        date_of_birth,
        email: row.get(6)?,
        mobile: row.get(7)?,
        pan_number: row.get(8)?,
        aadhaar_number: row.get(9)?,
        status,
        address,
        employment,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

/// Whether another customer already uses `value` for `field`.
///
/// `exclude_id` skips the customer being updated.
pub fn exists_by(
    conn: &rusqlite::Connection,
    field: UniqueField,
    value: &str,
    exclude_id: Option<i64>,
) -> Result<bool, RegistryError> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM customers WHERE {} = ?1 AND id IS NOT ?2)",
        field.column()
    );
    conn.query_row(&sql, params![value, exclude_id], |row| row.get(0))
        .map_err(sql_err)
}

/// Insert a new customer and its KYC details. Returns the assigned id.
pub fn insert(conn: &rusqlite::Connection, customer: &Customer) -> Result<i64, RegistryError> {
    conn.execute(
        "INSERT INTO customers
             (customer_uuid, first_name, last_name, gender, date_of_birth, email, mobile,
              pan_number, aadhaar_number, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            customer.customer_uuid,
            customer.first_name,
            customer.last_name,
            customer.gender,
            customer.date_of_birth.format(DATE_FORMAT).to_string(),
            customer.email,
            customer.mobile,
            customer.pan_number,
            customer.aadhaar_number,
            customer.status.as_str(),
            customer.created_at,
            customer.updated_at,
        ],
    )
    .map_err(sql_err)?;
    let id = conn.last_insert_rowid();
    replace_details(conn, id, customer.address.as_ref(), customer.employment.as_ref())?;
    Ok(id)
}

/// Overwrite a stored customer (matched by `customer.id`) with `customer`.
pub fn update(conn: &rusqlite::Connection, customer: &Customer) -> Result<(), RegistryError> {
    let changed = conn
        .execute(
            "UPDATE customers
             SET first_name = ?2, last_name = ?3, gender = ?4, date_of_birth = ?5,
                 email = ?6, mobile = ?7, pan_number = ?8, aadhaar_number = ?9,
                 status = ?10, updated_at = ?11
             WHERE id = ?1",
            params![
                customer.id,
                customer.first_name,
                customer.last_name,
                customer.gender,
                customer.date_of_birth.format(DATE_FORMAT).to_string(),
                customer.email,
                customer.mobile,
                customer.pan_number,
                customer.aadhaar_number,
                customer.status.as_str(),
                customer.updated_at,
            ],
        )
        .map_err(sql_err)?;
    if changed == 0 {
        return Err(RegistryError::not_found("customer", customer.id));
    }
    replace_details(
        conn,
        customer.id,
        customer.address.as_ref(),
        customer.employment.as_ref(),
    )
}

fn replace_details(
    conn: &rusqlite::Connection,
    customer_id: i64,
    address: Option<&Address>,
    employment: Option<&Employment>,
) -> Result<(), RegistryError> {
    conn.execute(
        "DELETE FROM customer_addresses WHERE customer_id = ?1",
        params![customer_id],
    )
    .map_err(sql_err)?;
    if let Some(a) = address {
        conn.execute(
            "INSERT INTO customer_addresses
                 (customer_id, address_type, house_no, city, state, pincode)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![customer_id, a.address_type, a.house_no, a.city, a.state, a.pincode],
        )
        .map_err(sql_err)?;
    }

    conn.execute(
        "DELETE FROM customer_employment WHERE customer_id = ?1",
        params![customer_id],
    )
    .map_err(sql_err)?;
    if let Some(e) = employment {
        conn.execute(
            "INSERT INTO customer_employment
                 (customer_id, employment_type, company_name, monthly_income, total_experience)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                customer_id,
                e.employment_type,
                e.company_name,
                e.monthly_income,
                e.total_experience
            ],
        )
        .map_err(sql_err)?;
    }
    Ok(())
}

/// Load one customer.
pub fn find(
    conn: &rusqlite::Connection,
    key: CustomerKey<'_>,
) -> Result<Option<Customer>, RegistryError> {
    let (column, value): (&str, &dyn ToSql) = match &key {
        CustomerKey::Id(id) => ("c.id", id),
        CustomerKey::Uuid(uuid) => ("c.customer_uuid", uuid),
        CustomerKey::Pan(pan) => ("c.pan_number", pan),
        CustomerKey::Email(email) => ("c.email", email),
    };
    conn.query_row(
        &format!("{SELECT_CUSTOMER} WHERE {column} = ?1"),
        &[value] as &[&dyn ToSql],
        row_to_customer,
    )
    .optional()
    .map_err(sql_err)
}

/// Escape LIKE wildcards in user input (used with `ESCAPE '\'`).
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

/// One page of customers plus the total number matching `filter`.
pub fn page(
    conn: &rusqlite::Connection,
    filter: &CustomerFilter,
    page: u32,
    size: u32,
) -> Result<(Vec<Customer>, u64), RegistryError> {
    let (where_clause, order_by, arg) = match filter {
        CustomerFilter::All => ("", "c.created_at DESC, c.id DESC", None),
        CustomerFilter::Status(status) => (
            "WHERE c.status = ?1",
            "c.created_at DESC, c.id DESC",
            Some(status.as_str().to_string()),
        ),
        CustomerFilter::Search(term) => (
            "WHERE LOWER(c.first_name) LIKE LOWER(?1) ESCAPE '\\'
                OR LOWER(c.last_name) LIKE LOWER(?1) ESCAPE '\\'
                OR c.pan_number LIKE ?1 ESCAPE '\\'
                OR c.email LIKE ?1 ESCAPE '\\'",
            "c.first_name ASC, c.last_name ASC, c.id ASC",
            Some(like_pattern(term.trim())),
        ),
    };

    let mut args: Vec<&dyn ToSql> = Vec::new();
    if let Some(arg) = &arg {
        args.push(arg);
    }

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM customers c {where_clause}"),
            args.as_slice(),
            |row| row.get(0),
        )
        .map_err(sql_err)?;

    let limit = i64::from(size);
    let offset = i64::from(page) * limit;
    let next = args.len();
    args.push(&limit);
    args.push(&offset);

    let sql = format!(
        "{SELECT_CUSTOMER} {where_clause} ORDER BY {order_by} LIMIT ?{} OFFSET ?{}",
        next + 1,
        next + 2
    );
    let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
    let customers = stmt
        .query_map(args.as_slice(), row_to_customer)
        .map_err(sql_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(sql_err)?;

    Ok((customers, total.max(0) as u64))
}
