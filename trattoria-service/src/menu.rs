use bigdecimal::BigDecimal;
use diesel::{insert_into, prelude::*, result::Error::NotFound};

use crate::error::{still_referenced, ServiceError, ServiceResult};
use crate::models::{MenuItem, MenuItemChanges, MenuType};
use crate::schema::{menu_items, menu_types};

pub const DETAIL_MAX_CHARS: usize = 200;
/// Prices are stored as NUMERIC(10, 2).
pub const PRICE_LIMIT: i64 = 100_000_000;

/// Fields shared by menu registration and update.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuForm {
    pub name: String,
    pub price: BigDecimal,
    pub orderable: bool,
    /// Category name, resolved against `menu_types`.
    pub menu_type: String,
    pub detail: Option<String>,
    pub image_url: Option<String>,
}

impl MenuForm {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::validation("Menu name is required"));
        }
        validate_price(&self.price)?;
        if self.menu_type.trim().is_empty() {
            return Err(ServiceError::validation("Select a category"));
        }
        validate_detail(self.detail.as_deref())
    }
}

pub(crate) fn validate_price(price: &BigDecimal) -> ServiceResult<()> {
    if *price < BigDecimal::from(0) {
        return Err(ServiceError::validation("Price must be 0 or greater"));
    }
    if *price >= BigDecimal::from(PRICE_LIMIT) {
        return Err(ServiceError::validation(format!(
            "Price must be less than {PRICE_LIMIT}"
        )));
    }
    if price.with_scale(2) != *price {
        return Err(ServiceError::validation(
            "Price must have at most 2 decimal places",
        ));
    }
    Ok(())
}

pub(crate) fn validate_detail(detail: Option<&str>) -> ServiceResult<()> {
    match detail {
        Some(d) if d.chars().count() > DETAIL_MAX_CHARS => Err(ServiceError::validation(
            format!("Detail must be at most {DETAIL_MAX_CHARS} characters"),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn normalize_detail(detail: Option<String>) -> Option<String> {
    detail.filter(|d| !d.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct MenuDetail {
    pub item: MenuItem,
    pub menu_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryMenus {
    pub menu_type: MenuType,
    pub items: Vec<MenuItem>,
}

pub fn list_menu_types(conn: &mut PgConnection) -> ServiceResult<Vec<MenuType>> {
    Ok(menu_types::table
        .select(MenuType::as_select())
        .order(menu_types::id.asc())
        .load(conn)?)
}

fn find_menu_type_id(conn: &mut PgConnection, name: &str) -> ServiceResult<i32> {
    menu_types::table
        .filter(menu_types::name.eq(name.trim()))
        .select(menu_types::id)
        .first::<i32>(conn)
        .optional()?
        .ok_or_else(|| ServiceError::validation(format!("Unknown category: {name}")))
}

fn changes_from(conn: &mut PgConnection, form: MenuForm) -> ServiceResult<MenuItemChanges> {
    form.validate()?;
    let menu_type_id = find_menu_type_id(conn, &form.menu_type)?;
    Ok(MenuItemChanges {
        name: form.name.trim().to_string(),
        price: form.price,
        orderable: form.orderable,
        detail: normalize_detail(form.detail),
        menu_type_id,
        image_url: form.image_url.filter(|u| !u.is_empty()),
    })
}

pub fn create_menu(conn: &mut PgConnection, form: MenuForm) -> ServiceResult<MenuDetail> {
    let changes = changes_from(conn, form)?;
    let item = insert_into(menu_items::table)
        .values(&changes)
        .returning(MenuItem::as_returning())
        .get_result(conn)?;
    tracing::info!(menu_item_id = item.id, "menu item created");
    get_menu(conn, item.id)
}

pub fn get_menu(conn: &mut PgConnection, id: i32) -> ServiceResult<MenuDetail> {
    let (item, menu_type) = menu_items::table
        .inner_join(menu_types::table)
        .filter(menu_items::id.eq(id))
        .select((MenuItem::as_select(), menu_types::name))
        .first::<(MenuItem, String)>(conn)
        .map_err(|err| match err {
            NotFound => ServiceError::NotFound("Menu item"),
            err => err.into(),
        })?;
    Ok(MenuDetail { item, menu_type })
}

pub fn list_menus(conn: &mut PgConnection) -> ServiceResult<Vec<MenuDetail>> {
    let rows = menu_items::table
        .inner_join(menu_types::table)
        .select((MenuItem::as_select(), menu_types::name))
        .order(menu_items::id.asc())
        .load::<(MenuItem, String)>(conn)?;
    Ok(rows
        .into_iter()
        .map(|(item, menu_type)| MenuDetail { item, menu_type })
        .collect())
}

pub fn list_menus_by_type(
    conn: &mut PgConnection,
    menu_type_id: i32,
) -> ServiceResult<Vec<MenuDetail>> {
    let rows = menu_items::table
        .inner_join(menu_types::table)
        .filter(menu_items::menu_type_id.eq(menu_type_id))
        .select((MenuItem::as_select(), menu_types::name))
        .order(menu_items::id.asc())
        .load::<(MenuItem, String)>(conn)?;
    Ok(rows
        .into_iter()
        .map(|(item, menu_type)| MenuDetail { item, menu_type })
        .collect())
}

/// Orderable menu items grouped under their category, categories in id order.
/// Categories without orderable items are left out.
pub fn menu_catalog(conn: &mut PgConnection) -> ServiceResult<Vec<CategoryMenus>> {
    let types = list_menu_types(conn)?;
    let items = MenuItem::belonging_to(&types)
        .filter(menu_items::orderable.eq(true))
        .select(MenuItem::as_select())
        .order(menu_items::id.asc())
        .load(conn)?
        .grouped_by(&types);

    Ok(types
        .into_iter()
        .zip(items)
        .filter(|(_, items)| !items.is_empty())
        .map(|(menu_type, items)| CategoryMenus { menu_type, items })
        .collect())
}

pub fn update_menu(conn: &mut PgConnection, id: i32, form: MenuForm) -> ServiceResult<MenuDetail> {
    conn.transaction(|conn| {
        let changes = changes_from(conn, form)?;
        let updated = diesel::update(menu_items::table.find(id))
            .set(&changes)
            .execute(conn)?;
        if updated == 0 {
            return Err(ServiceError::NotFound("Menu item"));
        }
        get_menu(conn, id)
    })
}

pub fn delete_menu(conn: &mut PgConnection, id: i32) -> ServiceResult<()> {
    let deleted = diesel::delete(menu_items::table.find(id))
        .execute(conn)
        .map_err(|err| still_referenced(err, "Menu item"))?;
    if deleted == 0 {
        return Err(ServiceError::NotFound("Menu item"));
    }
    tracing::info!(menu_item_id = id, "menu item deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};

    use super::*;
    use crate::account::register_user;
    use crate::cart::{CartEntry, ItemType};
    use crate::course::{create_course, CourseForm};
    use crate::reservation::{create_reservation, ReservationRequest};
    use crate::schema::dining_tables;
    use crate::test_support::setup_database;

    fn form(name: &str, price: &str) -> MenuForm {
        MenuForm {
            name: name.to_string(),
            price: price.parse().unwrap(),
            orderable: true,
            menu_type: "Pasta".to_string(),
            detail: None,
            image_url: None,
        }
    }

    #[test]
    fn validate_accepts_free_item() {
        assert!(form("Grissini", "0").validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_name_and_negative_price() {
        assert!(matches!(
            form("  ", "10").validate(),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            form("Carbonara", "-1").validate(),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_price_beyond_column() {
        assert!(form("Tartufo", "99999999.99").validate().is_ok());
        assert!(matches!(
            form("Tartufo", "100000000").validate(),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            form("Tartufo", "100000000000").validate(),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_sub_cent_prices() {
        assert!(form("Espresso", "2.50").validate().is_ok());
        assert!(form("Espresso", "2.500").validate().is_ok());
        assert!(matches!(
            form("Espresso", "12.345").validate(),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn validate_counts_detail_in_characters() {
        let mut f = form("Carbonara", "1200");
        f.detail = Some("あ".repeat(DETAIL_MAX_CHARS));
        assert!(f.validate().is_ok());

        f.detail = Some("あ".repeat(DETAIL_MAX_CHARS + 1));
        assert!(matches!(f.validate(), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn validate_requires_category() {
        let mut f = form("Carbonara", "1200");
        f.menu_type = String::new();
        assert!(matches!(f.validate(), Err(ServiceError::Validation(_))));
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_create_and_update_menu() {
        let conn = &mut setup_database();

        let created = create_menu(conn, form("Carbonara", "1200")).unwrap();
        assert_eq!(created.item.name, "Carbonara");
        assert_eq!(created.menu_type, "Pasta");

        let mut changed = form("Amatriciana", "1300");
        changed.menu_type = "Other".to_string();
        changed.detail = Some("Guanciale and pecorino".to_string());
        let updated = update_menu(conn, created.item.id, changed).unwrap();
        assert_eq!(updated.item.name, "Amatriciana");
        assert_eq!(updated.menu_type, "Other");
        assert_eq!(updated.item.detail.as_deref(), Some("Guanciale and pecorino"));
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_create_menu_unknown_category() {
        let conn = &mut setup_database();

        let mut f = form("Carbonara", "1200");
        f.menu_type = "Sushi".to_string();
        assert!(matches!(
            create_menu(conn, f),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_delete_menu_missing() {
        let conn = &mut setup_database();

        assert!(matches!(
            delete_menu(conn, -1),
            Err(ServiceError::NotFound(_))
        ));
    }

    fn reserve(conn: &mut PgConnection, entry: CartEntry) {
        let user = register_user(conn, "Smith", "passwordSA").unwrap();
        let roma = dining_tables::table
            .filter(dining_tables::name.eq("Roma"))
            .select(dining_tables::id)
            .first::<i32>(conn)
            .unwrap();
        create_reservation(
            conn,
            ReservationRequest {
                user_id: user.id,
                reserved_at: Utc::now() + TimeDelta::days(30),
                party_size: 2,
                table_id: roma,
                items: vec![entry],
            },
        )
        .unwrap();
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_delete_reserved_menu_is_rejected() {
        let conn = &mut setup_database();
        let created = create_menu(conn, form("Carbonara", "1200")).unwrap();
        reserve(
            conn,
            CartEntry {
                id: created.item.id,
                item_type: ItemType::Menu,
                quantity: 1,
                name: None,
            },
        );

        assert!(matches!(
            delete_menu(conn, created.item.id),
            Err(ServiceError::Validation(_))
        ));
        assert!(get_menu(conn, created.item.id).is_ok());
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_delete_menu_bundled_in_course_is_rejected() {
        let conn = &mut setup_database();
        let created = create_menu(conn, form("Bruschetta", "800")).unwrap();
        create_course(
            conn,
            CourseForm {
                name: "Pranzo".to_string(),
                price: "5000".parse().unwrap(),
                orderable: true,
                detail: None,
                menu_item_ids: vec![created.item.id],
            },
        )
        .unwrap();

        assert!(matches!(
            delete_menu(conn, created.item.id),
            Err(ServiceError::Validation(_))
        ));
        assert!(get_menu(conn, created.item.id).is_ok());
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_menu_catalog_skips_unorderable() {
        let conn = &mut setup_database();

        create_menu(conn, form("Carbonara", "1200")).unwrap();
        let mut hidden = form("Staff meal", "0");
        hidden.orderable = false;
        create_menu(conn, hidden).unwrap();

        let catalog = menu_catalog(conn).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].menu_type.name, "Pasta");
        assert_eq!(catalog[0].items.len(), 1);
        assert_eq!(catalog[0].items[0].name, "Carbonara");
    }
}
