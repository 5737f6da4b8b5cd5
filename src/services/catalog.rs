use crate::{
    config::AppConfig,
    entities::{category, product, product_color, size_stock, target},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Catalog service: products, color variants, per-size stock units,
/// categories and targets.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    config: Arc<AppConfig>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    /// Generated from the name when omitted
    pub slug: Option<String>,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub category_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProductInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub base_price: Option<Decimal>,
    pub category_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductFilters {
    /// Case-insensitive substring match on the product name
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub target_id: Option<Uuid>,
    /// Admin listings may include inactive products
    pub include_inactive: bool,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateColorInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub hex_code: Option<String>,
    pub position: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSizeStockInput {
    #[validate(length(min = 1, max = 20))]
    pub size: String,
    #[validate(range(min = 0))]
    pub initial_stock: i32,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCategoryInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTargetInput {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateTargetInput {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
}

/// Lowercases, replaces runs of non-alphanumerics with `-`, trims.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_dash = true;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            out.push('-');
            last_dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// SKU layout: first 8 hex chars of the product id, first 8 of the color
/// id, the size label, and a version suffix.
pub fn generate_sku(product_id: Uuid, color_id: Uuid, size: &str, version: i32) -> String {
    let prod = product_id.simple().to_string();
    let color = color_id.simple().to_string();
    format!(
        "{}_{}_{}_v{}",
        &prod[..8],
        &color[..8],
        size.to_ascii_uppercase(),
        version
    )
}

impl CatalogService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            event_sender,
            config,
        }
    }

    fn clamp_limit(&self, limit: u64) -> u64 {
        if limit == 0 {
            self.config.default_page_size
        } else {
            limit.min(self.config.max_page_size)
        }
    }

    // ---- products ----

    #[instrument(skip(self, input))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let slug = input
            .slug
            .clone()
            .unwrap_or_else(|| slugify(&input.name));
        if slug.is_empty() {
            return Err(ServiceError::ValidationError(
                "Product slug cannot be empty".to_string(),
            ));
        }

        let existing = product::Entity::find()
            .filter(product::Column::Slug.eq(slug.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Product slug '{}' already exists",
                slug
            )));
        }

        let now = Utc::now();
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            base_price: Set(input.base_price),
            category_id: Set(input.category_id),
            target_id: Set(input.target_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = model.insert(&*self.db).await?;
        info!(product_id = %created.id, "Product created");
        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_product(
        &self,
        product_id: Uuid,
        input: UpdateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let existing = self.get_product(product_id).await?;
        let mut model: product::ActiveModel = existing.into();

        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }
        if let Some(base_price) = input.base_price {
            model.base_price = Set(base_price);
        }
        if input.category_id.is_some() {
            model.category_id = Set(input.category_id);
        }
        if input.target_id.is_some() {
            model.target_id = Set(input.target_id);
        }
        if let Some(is_active) = input.is_active {
            model.is_active = Set(is_active);
        }
        model.updated_at = Set(Utc::now());

        let updated = model.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(updated.id))
            .await;
        Ok(updated)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    #[instrument(skip(self))]
    pub async fn list_products(
        &self,
        filters: ProductFilters,
        page: u64,
        limit: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let limit = self.clamp_limit(limit);
        let page = page.max(1);

        let mut cond = Condition::all();
        if !filters.include_inactive {
            cond = cond.add(product::Column::IsActive.eq(true));
        }
        if let Some(search) = &filters.search {
            cond = cond.add(product::Column::Name.contains(search));
        }
        if let Some(category_id) = filters.category_id {
            cond = cond.add(product::Column::CategoryId.eq(category_id));
        }
        if let Some(target_id) = filters.target_id {
            cond = cond.add(product::Column::TargetId.eq(target_id));
        }

        let query = product::Entity::find().filter(cond);
        let total = query.clone().count(&*self.db).await?;
        let items = query
            .order_by_desc(product::Column::CreatedAt)
            .offset((page - 1) * limit)
            .limit(limit)
            .all(&*self.db)
            .await?;

        Ok((items, total))
    }

    /// Soft delete: flips `is_active` so existing order history stays
    /// intact.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, product_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_product(product_id).await?;
        let mut model: product::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductDeleted(product_id))
            .await;
        Ok(())
    }

    // ---- colors ----

    #[instrument(skip(self, input))]
    pub async fn add_color(
        &self,
        product_id: Uuid,
        input: CreateColorInput,
    ) -> Result<product_color::Model, ServiceError> {
        input.validate()?;
        // 404s before inserting a color for a product that does not exist
        self.get_product(product_id).await?;

        let now = Utc::now();
        let model = product_color::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product_id),
            name: Set(input.name),
            hex_code: Set(input.hex_code),
            position: Set(input.position.unwrap_or(0)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&*self.db).await?)
    }

    pub async fn list_colors(
        &self,
        product_id: Uuid,
    ) -> Result<Vec<product_color::Model>, ServiceError> {
        self.get_product(product_id).await?;
        Ok(product_color::Entity::find()
            .filter(product_color::Column::ProductId.eq(product_id))
            .filter(product_color::Column::IsActive.eq(true))
            .order_by_asc(product_color::Column::Position)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_color(&self, color_id: Uuid) -> Result<product_color::Model, ServiceError> {
        product_color::Entity::find_by_id(color_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Color {} not found", color_id)))
    }

    /// Retiring a color also retires its size stocks, so none of its SKUs
    /// can be carted or checked out afterwards.
    #[instrument(skip(self))]
    pub async fn remove_color(&self, color_id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get_color(color_id).await?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let mut model: product_color::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.updated_at = Set(now);
        model.update(&txn).await?;

        size_stock::Entity::update_many()
            .col_expr(size_stock::Column::IsActive, Expr::value(false))
            .col_expr(size_stock::Column::UpdatedAt, Expr::value(now))
            .filter(size_stock::Column::ColorId.eq(color_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        Ok(())
    }

    // ---- size stocks ----

    /// Creates the sellable unit for one size of a color. The SKU is
    /// generated, not supplied; duplicate sizes per color are rejected.
    #[instrument(skip(self, input))]
    pub async fn add_size_stock(
        &self,
        color_id: Uuid,
        input: CreateSizeStockInput,
    ) -> Result<size_stock::Model, ServiceError> {
        input.validate()?;
        let color = self.get_color(color_id).await?;

        let duplicate = size_stock::Entity::find()
            .filter(size_stock::Column::ColorId.eq(color_id))
            .filter(size_stock::Column::Size.eq(input.size.clone()))
            .one(&*self.db)
            .await?;
        if duplicate.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Size '{}' already exists for this color",
                input.size
            )));
        }

        let version = 1;
        let sku = generate_sku(color.product_id, color_id, &input.size, version);
        let now = Utc::now();
        let model = size_stock::ActiveModel {
            id: Set(Uuid::new_v4()),
            color_id: Set(color_id),
            size: Set(input.size),
            sku: Set(sku),
            stock: Set(input.initial_stock),
            version: Set(version),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };

        Ok(model.insert(&*self.db).await?)
    }

    pub async fn list_size_stocks(
        &self,
        color_id: Uuid,
    ) -> Result<Vec<size_stock::Model>, ServiceError> {
        self.get_color(color_id).await?;
        Ok(size_stock::Entity::find()
            .filter(size_stock::Column::ColorId.eq(color_id))
            .filter(size_stock::Column::IsActive.eq(true))
            .order_by_asc(size_stock::Column::Size)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn remove_size_stock(&self, size_stock_id: Uuid) -> Result<(), ServiceError> {
        let existing = size_stock::Entity::find_by_id(size_stock_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Size stock {} not found", size_stock_id))
            })?;
        let mut model: size_stock::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;
        Ok(())
    }

    // ---- categories ----

    #[instrument(skip(self, input))]
    pub async fn create_category(
        &self,
        input: CreateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let slug = input.slug.clone().unwrap_or_else(|| slugify(&input.name));

        let existing = category::Entity::find()
            .filter(category::Column::Slug.eq(slug.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category slug '{}' already exists",
                slug
            )));
        }

        let now = Utc::now();
        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            description: Set(input.description),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(&*self.db).await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        input: UpdateCategoryInput,
    ) -> Result<category::Model, ServiceError> {
        input.validate()?;
        let existing = category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;
        let mut model: category::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        if let Some(description) = input.description {
            model.description = Set(Some(description));
        }
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(category::Entity::find()
            .filter(category::Column::IsActive.eq(true))
            .order_by_asc(category::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let existing = category::Entity::find_by_id(category_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))?;
        let mut model: category::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;
        Ok(())
    }

    // ---- targets ----

    #[instrument(skip(self, input))]
    pub async fn create_target(
        &self,
        input: CreateTargetInput,
    ) -> Result<target::Model, ServiceError> {
        input.validate()?;
        let slug = input.slug.clone().unwrap_or_else(|| slugify(&input.name));

        let existing = target::Entity::find()
            .filter(target::Column::Slug.eq(slug.clone()))
            .one(&*self.db)
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Target slug '{}' already exists",
                slug
            )));
        }

        let now = Utc::now();
        let model = target::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            slug: Set(slug),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(model.insert(&*self.db).await?)
    }

    #[instrument(skip(self, input))]
    pub async fn update_target(
        &self,
        target_id: Uuid,
        input: UpdateTargetInput,
    ) -> Result<target::Model, ServiceError> {
        input.validate()?;
        let existing = target::Entity::find_by_id(target_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Target {} not found", target_id)))?;
        let mut model: target::ActiveModel = existing.into();
        if let Some(name) = input.name {
            model.name = Set(name);
        }
        model.updated_at = Set(Utc::now());
        Ok(model.update(&*self.db).await?)
    }

    pub async fn list_targets(&self) -> Result<Vec<target::Model>, ServiceError> {
        Ok(target::Entity::find()
            .filter(target::Column::IsActive.eq(true))
            .order_by_asc(target::Column::Name)
            .all(&*self.db)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_target(&self, target_id: Uuid) -> Result<(), ServiceError> {
        let existing = target::Entity::find_by_id(target_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Target {} not found", target_id)))?;
        let mut model: target::ActiveModel = existing.into();
        model.is_active = Set(false);
        model.updated_at = Set(Utc::now());
        model.update(&*self.db).await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: product::Model,
    pub colors: Vec<ColorWithSizes>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ColorWithSizes {
    #[serde(flatten)]
    pub color: product_color::Model,
    pub sizes: Vec<size_stock::Model>,
}

impl CatalogService {
    /// Full product view: the product plus its active colors and their
    /// size stocks.
    pub async fn get_product_detail(
        &self,
        product_id: Uuid,
    ) -> Result<ProductDetail, ServiceError> {
        let product = self.get_product(product_id).await?;
        let colors = self.list_colors(product_id).await?;

        let mut out = Vec::with_capacity(colors.len());
        for color in colors {
            let sizes = size_stock::Entity::find()
                .filter(size_stock::Column::ColorId.eq(color.id))
                .filter(size_stock::Column::IsActive.eq(true))
                .order_by_asc(size_stock::Column::Size)
                .all(&*self.db)
                .await?;
            out.push(ColorWithSizes {
                color,
                sizes,
            });
        }

        Ok(ProductDetail {
            product,
            colors: out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Summer Shirt", "summer-shirt")]
    #[test_case("  Lots   of Spaces ", "lots-of-spaces")]
    #[test_case("Café-Étoile!!", "caf-toile")]
    #[test_case("UPPER case", "upper-case")]
    fn slugify_cases(input: &str, expected: &str) {
        assert_eq!(slugify(input), expected);
    }

    #[test]
    fn sku_layout() {
        let product = Uuid::parse_str("0f8fad5b-d9cb-469f-a165-70867728950e").unwrap();
        let color = Uuid::parse_str("7c9e6679-7425-40de-944b-e07fc1f90ae7").unwrap();
        let sku = generate_sku(product, color, "m", 1);
        assert_eq!(sku, "0f8fad5b_7c9e6679_M_v1");
    }
}
