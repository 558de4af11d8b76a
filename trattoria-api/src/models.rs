use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use trattoria_service::{
    cart::{CartEntry, ItemType},
    course::CourseDetail,
    menu::{CategoryMenus, MenuDetail},
    models::{DiningTable, MenuItem, MenuType},
    reservation::{LineItemDetail, ReservationSummary},
};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CredentialsRequest {
    /// Account name
    pub name: String,
    /// Plain-text password
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    /// ISO 8601 timestamp when the user was created
    pub created_at: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub id: Uuid,
    pub name: String,
    /// Session lifetime in seconds
    pub expires_in: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminCheckResponse {
    pub authenticated: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuTypeResponse {
    pub id: i32,
    pub name: String,
}

impl From<MenuType> for MenuTypeResponse {
    fn from(menu_type: MenuType) -> Self {
        Self {
            id: menu_type.id,
            name: menu_type.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListMenuTypesResponse {
    pub menu_types: Vec<MenuTypeResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct MenuRequest {
    pub name: String,
    /// Price as a decimal string with at most 2 decimal places, from 0 up to 99999999.99
    pub price: String,
    #[serde(default = "default_orderable")]
    pub orderable: bool,
    /// Category name, e.g. "Pasta"
    pub menu_type: String,
    /// At most 200 characters
    pub detail: Option<String>,
    pub image_url: Option<String>,
}

fn default_orderable() -> bool {
    true
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: i32,
    pub name: String,
    /// Price of the menu item (as string)
    pub price: String,
    pub orderable: bool,
    pub detail: Option<String>,
    pub menu_type_id: i32,
    /// Category name, present when the item is listed on its own
    pub menu_type: Option<String>,
    pub image_url: Option<String>,
}

impl From<MenuItem> for MenuItemResponse {
    fn from(item: MenuItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            price: item.price.to_string(),
            orderable: item.orderable,
            detail: item.detail,
            menu_type_id: item.menu_type_id,
            menu_type: None,
            image_url: item.image_url,
        }
    }
}

impl From<MenuDetail> for MenuItemResponse {
    fn from(detail: MenuDetail) -> Self {
        Self {
            menu_type: Some(detail.menu_type),
            ..MenuItemResponse::from(detail.item)
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListMenusResponse {
    pub menus: Vec<MenuItemResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CourseRequest {
    pub name: String,
    /// Price as a decimal string with at most 2 decimal places, from 0 up to 99999999.99
    pub price: String,
    #[serde(default = "default_orderable")]
    pub orderable: bool,
    pub detail: Option<String>,
    /// Menu items bundled into the course
    #[serde(default)]
    pub menu_item_ids: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CourseResponse {
    pub id: i32,
    pub name: String,
    pub price: String,
    pub orderable: bool,
    pub detail: Option<String>,
    pub menu_items: Vec<MenuItemResponse>,
}

impl From<CourseDetail> for CourseResponse {
    fn from(detail: CourseDetail) -> Self {
        let CourseDetail { course, menu_items } = detail;
        Self {
            id: course.id,
            name: course.name,
            price: course.price.to_string(),
            orderable: course.orderable,
            detail: course.detail,
            menu_items: menu_items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListCoursesResponse {
    pub courses: Vec<CourseResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogCategory {
    pub id: i32,
    pub name: String,
    pub items: Vec<MenuItemResponse>,
}

impl From<CategoryMenus> for CatalogCategory {
    fn from(group: CategoryMenus) -> Self {
        Self {
            id: group.menu_type.id,
            name: group.menu_type.name,
            items: group.items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Everything a guest can currently order.
#[derive(Debug, Serialize, ToSchema)]
pub struct CatalogResponse {
    pub categories: Vec<CatalogCategory>,
    pub courses: Vec<CourseResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableResponse {
    pub id: i32,
    pub name: String,
    pub max_capacity: i32,
}

impl From<DiningTable> for TableResponse {
    fn from(table: DiningTable) -> Self {
        Self {
            id: table.id,
            name: table.name,
            max_capacity: table.max_capacity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListTablesResponse {
    pub tables: Vec<TableResponse>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LineItemType {
    Course,
    Menu,
}

impl From<LineItemType> for ItemType {
    fn from(kind: LineItemType) -> Self {
        match kind {
            LineItemType::Course => ItemType::Course,
            LineItemType::Menu => ItemType::Menu,
        }
    }
}

impl From<ItemType> for LineItemType {
    fn from(kind: ItemType) -> Self {
        match kind {
            ItemType::Course => LineItemType::Course,
            ItemType::Menu => LineItemType::Menu,
        }
    }
}

/// One cart line as kept in the browser.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CartEntryRequest {
    pub id: i32,
    #[serde(rename = "type")]
    pub item_type: LineItemType,
    pub quantity: i32,
    pub name: Option<String>,
}

impl From<CartEntryRequest> for CartEntry {
    fn from(entry: CartEntryRequest) -> Self {
        CartEntry {
            id: entry.id,
            item_type: entry.item_type.into(),
            quantity: entry.quantity,
            name: entry.name,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReservationRequest {
    pub reserved_at: DateTime<Utc>,
    pub party_size: i32,
    pub table_id: i32,
    /// Either all courses or all menu items; may be empty
    #[serde(default)]
    pub items: Vec<CartEntryRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateReservationResponse {
    pub id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineItemResponse {
    #[serde(rename = "type")]
    pub item_type: LineItemType,
    pub id: i32,
    pub name: String,
    pub quantity: i32,
}

impl From<LineItemDetail> for LineItemResponse {
    fn from(item: LineItemDetail) -> Self {
        Self {
            item_type: item.item_type.into(),
            id: item.item_id,
            name: item.name,
            quantity: item.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReservationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub reserved_at: DateTime<Utc>,
    pub party_size: i32,
    pub table: TableResponse,
    /// pending, visited or cancelled
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<LineItemResponse>,
}

impl From<ReservationSummary> for ReservationResponse {
    fn from(summary: ReservationSummary) -> Self {
        let ReservationSummary {
            reservation,
            user_name,
            table,
            items,
        } = summary;
        Self {
            id: reservation.id,
            user_id: reservation.user_id,
            user_name,
            reserved_at: reservation.reserved_at,
            party_size: reservation.party_size,
            table: table.into(),
            status: reservation.status.to_string(),
            created_at: reservation.created_at,
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListReservationsResponse {
    pub reservations: Vec<ReservationResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateReservationStatusRequest {
    /// pending, visited or cancelled
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Error message
    pub error: String,
}

pub fn parse_price(price: &str) -> Result<BigDecimal, ApiError> {
    price
        .trim()
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid price: {price}")))
}
