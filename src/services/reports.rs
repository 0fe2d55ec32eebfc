//! Read-only aggregations and cross-table search.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sql_types::{Integer, Text};
use diesel::sqlite::SqliteConnection;

use super::{ServiceError, ServiceResult};
use crate::models::{Case, Client, Document, Payment};
use crate::schema::{cases, clients, documents, payments};

const REPORT_DATE_FORMAT: &str = "%Y-%m-%d";

// Case-sensitive, unlike LIKE on SQLite.
diesel::define_sql_function! {
    fn instr(haystack: Text, needle: Text) -> Integer;
}

pub fn cases_by_lawyer(conn: &mut SqliteConnection) -> ServiceResult<BTreeMap<String, i64>> {
    let rows: Vec<(String, i64)> = cases::table
        .group_by(cases::assigned_lawyer)
        .select((cases::assigned_lawyer, count_star()))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

#[derive(Debug, Clone)]
pub struct PeriodReport {
    pub from: String,
    pub to: String,
    pub total_count: usize,
    pub total_amount: f64,
    pub payments: Vec<Payment>,
}

/// Parses a report bound as midnight of the given calendar day.
pub fn parse_report_date(raw: &str) -> ServiceResult<NaiveDateTime> {
    NaiveDate::parse_from_str(raw.trim(), REPORT_DATE_FORMAT)
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|_| ServiceError::validation("Formato de fecha inválido. Usar YYYY-MM-DD"))
}

/// Payments whose timestamp falls in `[from 00:00:00, to 00:00:00]`.
/// The upper bound is midnight at the start of `to`, so later payments on
/// that day are not counted.
pub fn payments_in_period(
    conn: &mut SqliteConnection,
    from: &str,
    to: &str,
) -> ServiceResult<PeriodReport> {
    let lower = parse_report_date(from)?;
    let upper = parse_report_date(to)?;

    let rows: Vec<Payment> = payments::table
        .filter(payments::paid_at.ge(lower))
        .filter(payments::paid_at.le(upper))
        .order(payments::id.asc())
        .load(conn)?;

    Ok(PeriodReport {
        from: from.to_string(),
        to: to.to_string(),
        total_count: rows.len(),
        total_amount: rows.iter().map(|payment| payment.amount).sum(),
        payments: rows,
    })
}

#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub clients: Vec<Client>,
    pub cases: Vec<Case>,
    pub documents: Vec<Document>,
}

/// Substring match of `term` against client names, case references and
/// descriptions, and document names. Each table is scanned on its own.
pub fn search(conn: &mut SqliteConnection, term: &str) -> ServiceResult<SearchResults> {
    let clients = clients::table
        .filter(instr(clients::name, term).gt(0))
        .order(clients::id.asc())
        .load(conn)?;

    let cases = cases::table
        .filter(
            instr(cases::reference, term)
                .gt(0)
                .or(instr(cases::description, term).gt(0)),
        )
        .order(cases::id.asc())
        .load(conn)?;

    let documents = documents::table
        .filter(instr(documents::name, term).gt(0))
        .order(documents::id.asc())
        .load(conn)?;

    Ok(SearchResults {
        clients,
        cases,
        documents,
    })
}
