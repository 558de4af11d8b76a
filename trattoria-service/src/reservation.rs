//! Seat reservations and the order lines attached to them.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveTime, Utc};
use diesel::{insert_into, prelude::*};
use uuid::Uuid;

use crate::cart::{Cart, CartEntry, CartKind, ItemType};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    DiningTable, NewReservationItem, Reservation, ReservationItem, ReservationStatus,
};
use crate::schema::{courses, dining_tables, menu_items, reservation_items, reservations, users};

#[derive(Debug, Clone, PartialEq)]
pub struct ReservationRequest {
    pub user_id: Uuid,
    pub reserved_at: DateTime<Utc>,
    pub party_size: i32,
    pub table_id: i32,
    pub items: Vec<CartEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItemDetail {
    pub item_type: ItemType,
    pub item_id: i32,
    pub name: String,
    pub quantity: i32,
}

#[derive(Debug, PartialEq)]
pub struct ReservationSummary {
    pub reservation: Reservation,
    pub user_name: String,
    pub table: DiningTable,
    pub items: Vec<LineItemDetail>,
}

pub fn list_tables(conn: &mut PgConnection) -> ServiceResult<Vec<DiningTable>> {
    Ok(dining_tables::table
        .select(DiningTable::as_select())
        .order(dining_tables::id.asc())
        .load(conn)?)
}

/// Checks that need no database access. Returns the merged cart.
pub fn validate_request(request: &ReservationRequest) -> ServiceResult<Cart> {
    if request.party_size < 1 {
        return Err(ServiceError::validation("Party size must be at least 1"));
    }
    let cart = Cart::from_entries(&request.items)?;
    if cart.kind() == CartKind::Mixed {
        return Err(ServiceError::validation(
            "A course and a la carte items cannot be reserved together",
        ));
    }
    check_not_past(request.reserved_at, Utc::now())?;
    Ok(cart)
}

/// Any time from midnight UTC of the current day onward is bookable.
fn check_not_past(reserved_at: DateTime<Utc>, now: DateTime<Utc>) -> ServiceResult<()> {
    let start_of_today = now.date_naive().and_time(NaiveTime::MIN).and_utc();
    if reserved_at < start_of_today {
        return Err(ServiceError::validation(
            "Reservation date cannot be in the past",
        ));
    }
    Ok(())
}

fn ensure_orderable(
    conn: &mut PgConnection,
    item_type: ItemType,
    ids: &BTreeSet<i32>,
) -> ServiceResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let ids_vec = ids.iter().copied().collect::<Vec<_>>();
    let (label, found): (&str, Vec<(i32, bool)>) = match item_type {
        ItemType::Course => (
            "Course",
            courses::table
                .filter(courses::id.eq_any(&ids_vec))
                .select((courses::id, courses::orderable))
                .load(conn)?,
        ),
        ItemType::Menu => (
            "Menu item",
            menu_items::table
                .filter(menu_items::id.eq_any(&ids_vec))
                .select((menu_items::id, menu_items::orderable))
                .load(conn)?,
        ),
    };
    let found: HashMap<i32, bool> = found.into_iter().collect();
    for id in ids {
        match found.get(id) {
            None => {
                return Err(ServiceError::validation(format!(
                    "{label} {id} does not exist"
                )))
            }
            Some(false) => {
                return Err(ServiceError::validation(format!(
                    "{label} {id} is not available for order"
                )))
            }
            Some(true) => {}
        }
    }
    Ok(())
}

/// Stores a reservation and one line item per cart entry in a single
/// transaction. Nothing is written unless every check passes.
pub fn create_reservation(
    conn: &mut PgConnection,
    request: ReservationRequest,
) -> ServiceResult<Reservation> {
    let cart = validate_request(&request)?;
    let entries = cart.entries();

    let (reservation, line_items) = conn.transaction::<_, ServiceError, _>(|conn| {
        let user_exists = diesel::select(diesel::dsl::exists(
            users::table.filter(users::id.eq(request.user_id)),
        ))
        .get_result::<bool>(conn)?;
        if !user_exists {
            return Err(ServiceError::validation("Unknown user"));
        }

        let table = dining_tables::table
            .find(request.table_id)
            .select(DiningTable::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| {
                ServiceError::validation(format!("Table {} does not exist", request.table_id))
            })?;
        if request.party_size > table.max_capacity {
            return Err(ServiceError::validation(format!(
                "{} seats at most {} guests",
                table.name, table.max_capacity
            )));
        }

        for item_type in [ItemType::Course, ItemType::Menu] {
            let ids = entries
                .iter()
                .filter(|e| e.item_type == item_type)
                .map(|e| e.id)
                .collect::<BTreeSet<_>>();
            ensure_orderable(conn, item_type, &ids)?;
        }

        let reservation = insert_into(reservations::table)
            .values(&Reservation {
                id: Uuid::new_v4(),
                user_id: request.user_id,
                reserved_at: request.reserved_at,
                party_size: request.party_size,
                table_id: table.id,
                status: ReservationStatus::Pending,
                created_at: Utc::now(),
            })
            .returning(Reservation::as_returning())
            .get_result(conn)?;

        let rows = entries
            .iter()
            .map(|entry| NewReservationItem {
                reservation_id: reservation.id,
                course_id: (entry.item_type == ItemType::Course).then_some(entry.id),
                menu_item_id: (entry.item_type == ItemType::Menu).then_some(entry.id),
                quantity: entry.quantity,
            })
            .collect::<Vec<_>>();
        let line_items = if rows.is_empty() {
            0
        } else {
            insert_into(reservation_items::table)
                .values(&rows)
                .execute(conn)?
        };

        Ok((reservation, line_items))
    })?;

    tracing::info!(
        reservation_id = %reservation.id,
        table_id = reservation.table_id,
        party_size = reservation.party_size,
        line_items,
        "reservation created"
    );
    Ok(reservation)
}

fn load_line_items(
    conn: &mut PgConnection,
    reservation_ids: &[Uuid],
) -> ServiceResult<HashMap<Uuid, Vec<LineItemDetail>>> {
    let rows = reservation_items::table
        .left_join(courses::table)
        .left_join(menu_items::table)
        .filter(reservation_items::reservation_id.eq_any(reservation_ids))
        .select((
            ReservationItem::as_select(),
            courses::name.nullable(),
            menu_items::name.nullable(),
        ))
        .order(reservation_items::id.asc())
        .load::<(ReservationItem, Option<String>, Option<String>)>(conn)?;

    let mut grouped: HashMap<Uuid, Vec<LineItemDetail>> = HashMap::new();
    for (item, course_name, menu_name) in rows {
        let detail = match (item.course_id, item.menu_item_id) {
            (Some(id), _) => LineItemDetail {
                item_type: ItemType::Course,
                item_id: id,
                name: course_name.unwrap_or_default(),
                quantity: item.quantity,
            },
            (None, Some(id)) => LineItemDetail {
                item_type: ItemType::Menu,
                item_id: id,
                name: menu_name.unwrap_or_default(),
                quantity: item.quantity,
            },
            (None, None) => continue,
        };
        grouped.entry(item.reservation_id).or_default().push(detail);
    }
    Ok(grouped)
}

fn load_summaries(
    conn: &mut PgConnection,
    owner: Option<Uuid>,
) -> ServiceResult<Vec<ReservationSummary>> {
    let mut query = reservations::table
        .inner_join(users::table)
        .inner_join(dining_tables::table)
        .select((
            Reservation::as_select(),
            users::name,
            DiningTable::as_select(),
        ))
        .order((reservations::reserved_at.asc(), reservations::created_at.asc()))
        .into_boxed();
    if let Some(user_id) = owner {
        query = query.filter(reservations::user_id.eq(user_id));
    }
    let rows = query.load::<(Reservation, String, DiningTable)>(conn)?;

    let ids = rows.iter().map(|(r, _, _)| r.id).collect::<Vec<_>>();
    let mut items = load_line_items(conn, &ids)?;

    Ok(rows
        .into_iter()
        .map(|(reservation, user_name, table)| ReservationSummary {
            items: items.remove(&reservation.id).unwrap_or_default(),
            reservation,
            user_name,
            table,
        })
        .collect())
}

/// Every reservation with its guest, table and ordered items.
pub fn list_reservations(conn: &mut PgConnection) -> ServiceResult<Vec<ReservationSummary>> {
    load_summaries(conn, None)
}

pub fn list_user_reservations(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> ServiceResult<Vec<ReservationSummary>> {
    load_summaries(conn, Some(user_id))
}

/// Removes a reservation together with its line items. With `owner` set,
/// only that user's reservation matches.
pub fn delete_reservation(
    conn: &mut PgConnection,
    id: Uuid,
    owner: Option<Uuid>,
) -> ServiceResult<()> {
    conn.transaction::<_, ServiceError, _>(|conn| {
        let mut target = reservations::table
            .filter(reservations::id.eq(id))
            .select(reservations::id)
            .into_boxed();
        if let Some(user_id) = owner {
            target = target.filter(reservations::user_id.eq(user_id));
        }
        if target.first::<Uuid>(conn).optional()?.is_none() {
            return Err(ServiceError::NotFound("Reservation"));
        }

        diesel::delete(reservation_items::table.filter(reservation_items::reservation_id.eq(id)))
            .execute(conn)?;
        diesel::delete(reservations::table.find(id)).execute(conn)?;
        Ok(())
    })?;

    tracing::info!(reservation_id = %id, "reservation deleted");
    Ok(())
}

pub fn update_reservation_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: ReservationStatus,
) -> ServiceResult<Reservation> {
    diesel::update(reservations::table.find(id))
        .set(reservations::status.eq(status))
        .returning(Reservation::as_returning())
        .get_result(conn)
        .optional()?
        .ok_or(ServiceError::NotFound("Reservation"))
}
