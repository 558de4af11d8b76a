use std::collections::{BTreeSet, HashMap};

use bigdecimal::BigDecimal;
use diesel::{insert_into, prelude::*, result::Error::NotFound};

use crate::error::{still_referenced, ServiceError, ServiceResult};
use crate::menu::{normalize_detail, validate_detail, validate_price};
use crate::models::{Course, CourseChanges, CourseItem, MenuItem};
use crate::schema::{course_items, courses, menu_items};

#[derive(Debug, Clone, PartialEq)]
pub struct CourseForm {
    pub name: String,
    pub price: BigDecimal,
    pub orderable: bool,
    pub detail: Option<String>,
    pub menu_item_ids: Vec<i32>,
}

impl CourseForm {
    pub fn validate(&self) -> ServiceResult<()> {
        if self.name.trim().is_empty() {
            return Err(ServiceError::validation("Course name is required"));
        }
        validate_price(&self.price)?;
        validate_detail(self.detail.as_deref())
    }

    fn distinct_menu_ids(&self) -> BTreeSet<i32> {
        self.menu_item_ids.iter().copied().collect()
    }

    fn changes(&self) -> CourseChanges {
        CourseChanges {
            name: self.name.trim().to_string(),
            price: self.price.clone(),
            orderable: self.orderable,
            detail: normalize_detail(self.detail.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CourseDetail {
    pub course: Course,
    pub menu_items: Vec<MenuItem>,
}

fn ensure_menu_items_exist(conn: &mut PgConnection, ids: &BTreeSet<i32>) -> ServiceResult<()> {
    if ids.is_empty() {
        return Ok(());
    }
    let found = menu_items::table
        .filter(menu_items::id.eq_any(ids.iter().copied().collect::<Vec<_>>()))
        .select(menu_items::id)
        .load::<i32>(conn)?;
    if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
        return Err(ServiceError::validation(format!(
            "Menu item {missing} does not exist"
        )));
    }
    Ok(())
}

fn replace_course_items(
    conn: &mut PgConnection,
    course_id: i32,
    ids: &BTreeSet<i32>,
) -> ServiceResult<()> {
    diesel::delete(course_items::table.filter(course_items::course_id.eq(course_id)))
        .execute(conn)?;
    let rows = ids
        .iter()
        .map(|&menu_item_id| CourseItem {
            course_id,
            menu_item_id,
        })
        .collect::<Vec<_>>();
    if !rows.is_empty() {
        insert_into(course_items::table)
            .values(&rows)
            .on_conflict_do_nothing()
            .execute(conn)?;
    }
    Ok(())
}

/// Registers a course together with the menu items it bundles, in one
/// transaction.
pub fn create_course(conn: &mut PgConnection, form: CourseForm) -> ServiceResult<CourseDetail> {
    form.validate()?;
    let ids = form.distinct_menu_ids();

    let course = conn.transaction::<_, ServiceError, _>(|conn| {
        ensure_menu_items_exist(conn, &ids)?;
        let course = insert_into(courses::table)
            .values(&form.changes())
            .returning(Course::as_returning())
            .get_result(conn)?;
        replace_course_items(conn, course.id, &ids)?;
        Ok(course)
    })?;

    tracing::info!(course_id = course.id, menu_items = ids.len(), "course created");
    get_course_detail(conn, course.id)
}

pub fn get_course_detail(conn: &mut PgConnection, id: i32) -> ServiceResult<CourseDetail> {
    let course = courses::table
        .find(id)
        .select(Course::as_select())
        .first(conn)
        .map_err(|err| match err {
            NotFound => ServiceError::NotFound("Course"),
            err => err.into(),
        })?;

    let menu_items = CourseItem::belonging_to(&course)
        .inner_join(menu_items::table)
        .select(MenuItem::as_select())
        .order(menu_items::id.asc())
        .load(conn)?;

    Ok(CourseDetail { course, menu_items })
}

pub fn list_courses(
    conn: &mut PgConnection,
    orderable_only: bool,
) -> ServiceResult<Vec<CourseDetail>> {
    let mut query = courses::table
        .select(Course::as_select())
        .order(courses::id.asc())
        .into_boxed();
    if orderable_only {
        query = query.filter(courses::orderable.eq(true));
    }
    let results = query.load(conn)?;

    let course_ids = results.iter().map(|c| c.id).collect::<Vec<_>>();
    let mut grouped: HashMap<i32, Vec<MenuItem>> = HashMap::new();
    for (course_id, item) in course_items::table
        .inner_join(menu_items::table)
        .filter(course_items::course_id.eq_any(&course_ids))
        .select((course_items::course_id, MenuItem::as_select()))
        .order(menu_items::id.asc())
        .load::<(i32, MenuItem)>(conn)?
    {
        grouped.entry(course_id).or_default().push(item);
    }

    Ok(results
        .into_iter()
        .map(|course| CourseDetail {
            menu_items: grouped.remove(&course.id).unwrap_or_default(),
            course,
        })
        .collect())
}

pub fn update_course(
    conn: &mut PgConnection,
    id: i32,
    form: CourseForm,
) -> ServiceResult<CourseDetail> {
    form.validate()?;
    let ids = form.distinct_menu_ids();

    conn.transaction::<_, ServiceError, _>(|conn| {
        let updated = diesel::update(courses::table.find(id))
            .set(&form.changes())
            .execute(conn)?;
        if updated == 0 {
            return Err(ServiceError::NotFound("Course"));
        }
        ensure_menu_items_exist(conn, &ids)?;
        replace_course_items(conn, id, &ids)
    })?;

    get_course_detail(conn, id)
}

pub fn delete_course(conn: &mut PgConnection, id: i32) -> ServiceResult<()> {
    let deleted = diesel::delete(courses::table.find(id))
        .execute(conn)
        .map_err(|err| still_referenced(err, "Course"))?;
    if deleted == 0 {
        return Err(ServiceError::NotFound("Course"));
    }
    tracing::info!(course_id = id, "course deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};

    use super::*;
    use crate::account::register_user;
    use crate::cart::{CartEntry, ItemType};
    use crate::menu::{create_menu, MenuForm};
    use crate::reservation::{create_reservation, ReservationRequest};
    use crate::schema::dining_tables;
    use crate::test_support::setup_database;

    fn menu(conn: &mut PgConnection, name: &str) -> i32 {
        create_menu(
            conn,
            MenuForm {
                name: name.to_string(),
                price: "800".parse().unwrap(),
                orderable: true,
                menu_type: "Appetizer".to_string(),
                detail: None,
                image_url: None,
            },
        )
        .unwrap()
        .item
        .id
    }

    fn form(name: &str, menu_item_ids: Vec<i32>) -> CourseForm {
        CourseForm {
            name: name.to_string(),
            price: "5000".parse().unwrap(),
            orderable: true,
            detail: Some("Chef's selection".to_string()),
            menu_item_ids,
        }
    }

    #[test]
    fn validate_rejects_blank_name() {
        assert!(matches!(
            form(" ", vec![]).validate(),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn duplicate_menu_ids_collapse() {
        let f = form("Pranzo", vec![3, 1, 3]);
        assert_eq!(
            f.distinct_menu_ids().into_iter().collect::<Vec<_>>(),
            vec![1, 3]
        );
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_create_course_with_menus() {
        let conn = &mut setup_database();
        let bruschetta = menu(conn, "Bruschetta");
        let caprese = menu(conn, "Caprese");

        let detail =
            create_course(conn, form("Pranzo", vec![caprese, bruschetta, caprese])).unwrap();
        assert_eq!(detail.course.name, "Pranzo");
        let names: Vec<_> = detail.menu_items.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Bruschetta", "Caprese"]);
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_create_course_unknown_menu_writes_nothing() {
        let conn = &mut setup_database();

        let result = create_course(conn, form("Cena", vec![-5]));
        assert!(matches!(result, Err(ServiceError::Validation(_))));
        assert!(list_courses(conn, false).unwrap().is_empty());
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_update_course_replaces_menus() {
        let conn = &mut setup_database();
        let a = menu(conn, "Bruschetta");
        let b = menu(conn, "Caprese");
        let created = create_course(conn, form("Pranzo", vec![a])).unwrap();

        let mut changed = form("Pranzo speciale", vec![b]);
        changed.orderable = false;
        let updated = update_course(conn, created.course.id, changed).unwrap();

        assert_eq!(updated.course.name, "Pranzo speciale");
        assert!(!updated.course.orderable);
        assert_eq!(updated.menu_items.len(), 1);
        assert_eq!(updated.menu_items[0].id, b);

        assert!(list_courses(conn, true).unwrap().is_empty());
        assert_eq!(list_courses(conn, false).unwrap().len(), 1);
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_delete_course() {
        let conn = &mut setup_database();
        let created = create_course(conn, form("Cena", vec![])).unwrap();

        delete_course(conn, created.course.id).unwrap();
        assert!(matches!(
            get_course_detail(conn, created.course.id),
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            delete_course(conn, created.course.id),
            Err(ServiceError::NotFound(_))
        ));
    }

    #[test]
    #[ignore = "requires a PostgreSQL DATABASE_URL"]
    fn test_delete_reserved_course_is_rejected() {
        let conn = &mut setup_database();
        let a = menu(conn, "Bruschetta");
        let created = create_course(conn, form("Cena", vec![a])).unwrap();
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
                items: vec![CartEntry {
                    id: created.course.id,
                    item_type: ItemType::Course,
                    quantity: 1,
                    name: None,
                }],
            },
        )
        .unwrap();

        assert!(matches!(
            delete_course(conn, created.course.id),
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(
            get_course_detail(conn, created.course.id).unwrap().menu_items[0].id,
            a
        );
    }
}
