use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use tracing::info;

use super::{cases, insert_error, Page, ServiceError, ServiceResult, CASE_NOT_FOUND};
use crate::models::{NewPayment, Payment};
use crate::references::receipt_reference;
use crate::schema::payments;

#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub case_id: i32,
    pub amount: f64,
    pub method: String,
}

/// Records a payment against an existing case. The receipt reference is
/// always generated here.
pub fn register(
    conn: &mut SqliteConnection,
    draft: PaymentDraft,
    now: NaiveDateTime,
) -> ServiceResult<Payment> {
    if !draft.amount.is_finite() || draft.amount < 0.0 {
        return Err(ServiceError::validation(
            "monto must be a non-negative number",
        ));
    }

    let case = cases::get(conn, draft.case_id)?;

    let new_payment = NewPayment {
        case_id: case.id,
        amount: draft.amount,
        paid_at: now,
        method: draft.method,
        receipt_reference: receipt_reference(case.id, now),
    };

    let payment: Payment = diesel::insert_into(payments::table)
        .values(&new_payment)
        .get_result(conn)
        .map_err(|err| {
            insert_error(
                err,
                &format!("El recibo {} ya existe", new_payment.receipt_reference),
                CASE_NOT_FOUND,
            )
        })?;

    info!(
        payment_id = payment.id,
        case_id = payment.case_id,
        receipt = %payment.receipt_reference,
        "payment registered"
    );
    Ok(payment)
}

pub fn list(conn: &mut SqliteConnection, page: Page) -> ServiceResult<Vec<Payment>> {
    let rows = payments::table
        .order(payments::id.asc())
        .offset(page.offset)
        .limit(page.limit)
        .load(conn)?;
    Ok(rows)
}
