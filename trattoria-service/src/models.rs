use std::fmt;
use std::io::Write;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::{
    admins, course_items, courses, dining_tables, menu_items, menu_types, reservation_items,
    reservations, users,
};

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, PartialEq)]
#[diesel(table_name = admins)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq, Clone)]
#[diesel(table_name = menu_types)]
pub struct MenuType {
    pub id: i32,
    pub name: String,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, PartialEq, Clone)]
#[diesel(belongs_to(MenuType))]
#[diesel(table_name = menu_items)]
pub struct MenuItem {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub orderable: bool,
    pub detail: Option<String>,
    pub menu_type_id: i32,
    pub image_url: Option<String>,
}

#[derive(Insertable, AsChangeset, Debug, PartialEq)]
#[diesel(table_name = menu_items, treat_none_as_null = true)]
pub struct MenuItemChanges {
    pub name: String,
    pub price: BigDecimal,
    pub orderable: bool,
    pub detail: Option<String>,
    pub menu_type_id: i32,
    pub image_url: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq, Clone)]
#[diesel(table_name = courses)]
pub struct Course {
    pub id: i32,
    pub name: String,
    pub price: BigDecimal,
    pub orderable: bool,
    pub detail: Option<String>,
}

#[derive(Insertable, AsChangeset, Debug, PartialEq)]
#[diesel(table_name = courses, treat_none_as_null = true)]
pub struct CourseChanges {
    pub name: String,
    pub price: BigDecimal,
    pub orderable: bool,
    pub detail: Option<String>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, PartialEq)]
#[diesel(belongs_to(Course))]
#[diesel(belongs_to(MenuItem))]
#[diesel(table_name = course_items, primary_key(course_id, menu_item_id))]
pub struct CourseItem {
    pub course_id: i32,
    pub menu_item_id: i32,
}

#[derive(Queryable, Selectable, Identifiable, Debug, PartialEq, Clone)]
#[diesel(table_name = dining_tables)]
pub struct DiningTable {
    pub id: i32,
    pub name: String,
    pub max_capacity: i32,
}

#[derive(
    FromSqlRow, AsExpression, Serialize, Deserialize, PartialEq, Eq, Copy, Clone, Debug,
)]
#[diesel(sql_type = crate::schema::sql_types::ReservationStatus)]
#[serde(rename_all = "lowercase")]
pub enum ReservationStatus {
    Pending,
    Visited,
    Cancelled,
}

impl ToSql<crate::schema::sql_types::ReservationStatus, Pg> for ReservationStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            ReservationStatus::Pending => out.write_all(b"PENDING")?,
            ReservationStatus::Visited => out.write_all(b"VISITED")?,
            ReservationStatus::Cancelled => out.write_all(b"CANCELLED")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::ReservationStatus, Pg> for ReservationStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"PENDING" => Ok(ReservationStatus::Pending),
            b"VISITED" => Ok(ReservationStatus::Visited),
            b"CANCELLED" => Ok(ReservationStatus::Cancelled),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Pending => "pending",
            ReservationStatus::Visited => "visited",
            ReservationStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown reservation status: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for ReservationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(ReservationStatus::Pending),
            "visited" => Ok(ReservationStatus::Visited),
            "cancelled" => Ok(ReservationStatus::Cancelled),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, PartialEq)]
#[diesel(table_name = reservations)]
pub struct Reservation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub reserved_at: DateTime<Utc>,
    pub party_size: i32,
    pub table_id: i32,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, PartialEq)]
#[diesel(belongs_to(Reservation))]
#[diesel(table_name = reservation_items)]
pub struct ReservationItem {
    pub id: i32,
    pub reservation_id: Uuid,
    pub course_id: Option<i32>,
    pub menu_item_id: Option<i32>,
    pub quantity: i32,
}

#[derive(Insertable, Debug, PartialEq)]
#[diesel(table_name = reservation_items)]
pub struct NewReservationItem {
    pub reservation_id: Uuid,
    pub course_id: Option<i32>,
    pub menu_item_id: Option<i32>,
    pub quantity: i32,
}
