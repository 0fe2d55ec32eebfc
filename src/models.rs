use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::schema::*;

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = clients)]
pub struct Client {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub registered_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = clients)]
pub struct NewClient {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub registered_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = cases)]
#[diesel(belongs_to(Client, foreign_key = client_id))]
pub struct Case {
    pub id: i32,
    pub reference: String,
    pub client_id: i32,
    pub description: String,
    pub status: String,
    pub started_at: NaiveDateTime,
    pub assigned_lawyer: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = cases)]
pub struct NewCase {
    pub reference: String,
    pub client_id: i32,
    pub description: String,
    pub status: String,
    pub started_at: NaiveDateTime,
    pub assigned_lawyer: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = payments)]
#[diesel(belongs_to(Case, foreign_key = case_id))]
pub struct Payment {
    pub id: i32,
    pub case_id: i32,
    pub amount: f64,
    pub paid_at: NaiveDateTime,
    pub method: String,
    pub receipt_reference: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = payments)]
pub struct NewPayment {
    pub case_id: i32,
    pub amount: f64,
    pub paid_at: NaiveDateTime,
    pub method: String,
    pub receipt_reference: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = documents)]
#[diesel(belongs_to(Case, foreign_key = case_id))]
pub struct Document {
    pub id: i32,
    pub case_id: i32,
    pub name: String,
    pub doc_type: String,
    pub blob_key: String,
    pub uploaded_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = documents)]
pub struct NewDocument {
    pub case_id: i32,
    pub name: String,
    pub doc_type: String,
    pub blob_key: String,
    pub uploaded_at: NaiveDateTime,
}
