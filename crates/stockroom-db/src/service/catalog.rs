//! # Catalog Service
//!
//! Category and product CRUD.
//!
//! Catalog edits never write `stock_quantity`. A new product's opening
//! stock is booked as an IN movement ("Initial stock") in the same
//! transaction that inserts the product, so the ledger explains every unit
//! from the first one.

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info};

use crate::error::{StockError, StockResult};
use crate::pool::Database;
use crate::repository::movement::{MovementRepository, NewMovement};
use crate::repository::product::{generate_product_id, ProductRepository};
use crate::service::adjust_or_reject;
use stockroom_core::validation::{
    validate_barcode, validate_category_name, validate_optional_text, validate_price_cents,
    validate_product_name,
};
use stockroom_core::{
    Category, CategoryInput, MovementType, NewProduct, Product, ProductFilter, ProductUpdate,
    GENERATED_BARCODE_DIGITS, INITIAL_STOCK_NOTE, MAX_MOVEMENT_QUANTITY,
};

/// Attempts before giving up on a unique generated barcode.
const BARCODE_ATTEMPTS: usize = 32;

const MAX_DESCRIPTION_LEN: usize = 2_000;

/// Catalog operations.
#[derive(Debug, Clone)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        CatalogService { db }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn create_category(&self, input: &CategoryInput) -> StockResult<Category> {
        validate_category_name(&input.name)?;
        validate_optional_text("description", input.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        let category = self.db.categories().insert(input).await?;
        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn get_category(&self, id: &str) -> StockResult<Category> {
        self.db
            .categories()
            .get_by_id(id)
            .await?
            .ok_or_else(|| StockError::not_found("Category", id))
    }

    /// All categories, by name.
    pub async fn list_categories(&self) -> StockResult<Vec<Category>> {
        Ok(self.db.categories().list().await?)
    }

    pub async fn update_category(&self, id: &str, input: &CategoryInput) -> StockResult<Category> {
        validate_category_name(&input.name)?;
        validate_optional_text("description", input.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        Ok(self.db.categories().update(id, input).await?)
    }

    /// Deletes a category that no product references.
    pub async fn delete_category(&self, id: &str) -> StockResult<()> {
        let categories = self.db.categories();

        let in_use = categories.count_products(id).await?;
        if in_use > 0 {
            return Err(StockError::Conflict(format!(
                "category is used by {} product(s)",
                in_use
            )));
        }

        categories.delete(id).await?;
        info!(id = %id, "Category deleted");
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Creates a product, generating a barcode when none is given.
    ///
    /// ## Errors
    /// * `InvalidInput` - bad name, prices, initial quantity, or an opening
    ///   stock without a positive cost
    /// * `NotFound` - unknown category
    /// * `DuplicateIdentifier` - barcode already used
    pub async fn create_product(&self, input: &NewProduct) -> StockResult<Product> {
        validate_product_name(&input.name)?;
        validate_price_cents(input.cost_price_cents)?;
        validate_price_cents(input.selling_price_cents)?;
        validate_optional_text("description", input.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        if !(0..=MAX_MOVEMENT_QUANTITY).contains(&input.initial_quantity) {
            return Err(StockError::InvalidInput(format!(
                "initial quantity must be between 0 and {}",
                MAX_MOVEMENT_QUANTITY
            )));
        }
        // Opening stock is an IN movement, which needs a cost
        if input.initial_quantity > 0 && input.cost_price_cents <= 0 {
            return Err(StockError::InvalidInput(
                "cost price must be positive when adding initial stock".to_string(),
            ));
        }

        self.get_category(&input.category_id).await?;

        let barcode = match input.barcode.as_deref().map(str::trim) {
            Some(barcode) if !barcode.is_empty() => {
                validate_barcode(barcode)?;
                if self.db.products().barcode_exists(barcode).await? {
                    return Err(StockError::duplicate("barcode", barcode));
                }
                barcode.to_string()
            }
            _ => self.generate_barcode().await?,
        };

        let now = Utc::now();
        let mut product = Product {
            id: generate_product_id(),
            name: input.name.trim().to_string(),
            barcode,
            category_id: input.category_id.clone(),
            cost_price_cents: input.cost_price_cents,
            selling_price_cents: input.selling_price_cents,
            stock_quantity: 0,
            stock_status_override: input.stock_status_override,
            description: input.description.clone(),
            image: input.image.clone(),
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.db.pool().begin().await?;
        ProductRepository::insert_in(&mut tx, &product).await?;

        if input.initial_quantity > 0 {
            product = adjust_or_reject(
                &mut tx,
                &product.id,
                input.initial_quantity,
                input.initial_quantity,
            )
            .await?;

            MovementRepository::append_in(
                &mut tx,
                &NewMovement {
                    product_id: &product.id,
                    movement_type: MovementType::In,
                    quantity: input.initial_quantity,
                    cost_price_cents: Some(input.cost_price_cents),
                    selling_price_cents: None,
                    notes: INITIAL_STOCK_NOTE,
                },
            )
            .await?;
        }

        tx.commit().await?;

        info!(
            id = %product.id,
            barcode = %product.barcode,
            stock_quantity = product.stock_quantity,
            "Product created"
        );
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> StockResult<Product> {
        self.db
            .products()
            .get_by_id(id)
            .await?
            .ok_or_else(|| StockError::ProductNotFound(id.to_string()))
    }

    pub async fn get_product_by_barcode(&self, barcode: &str) -> StockResult<Product> {
        self.db
            .products()
            .get_by_barcode(barcode)
            .await?
            .ok_or_else(|| StockError::not_found("Product", barcode))
    }

    /// Products matching `filter`, newest first.
    pub async fn list_products(&self, filter: &ProductFilter) -> StockResult<Vec<Product>> {
        Ok(self.db.products().list(filter).await?)
    }

    /// Edits catalog fields; the stored quantity is kept as is.
    pub async fn update_product(&self, id: &str, update: &ProductUpdate) -> StockResult<Product> {
        validate_product_name(&update.name)?;
        validate_barcode(update.barcode.trim())?;
        validate_price_cents(update.cost_price_cents)?;
        validate_price_cents(update.selling_price_cents)?;
        validate_optional_text("description", update.description.as_deref(), MAX_DESCRIPTION_LEN)?;

        self.get_category(&update.category_id).await?;

        let product = self
            .db
            .products()
            .update(id, update)
            .await
            .map_err(|e| match StockError::from(e) {
                StockError::NotFound { .. } => StockError::ProductNotFound(id.to_string()),
                other => other,
            })?;

        info!(id = %product.id, "Product updated");
        Ok(product)
    }

    /// Deletes a product that has no ledger or sale history.
    pub async fn delete_product(&self, id: &str) -> StockResult<()> {
        self.get_product(id).await?;

        let movements = self.db.movements().count_for_product(id).await?;
        let sold = self.db.sales().count_items_for_product(id).await?;
        if movements > 0 || sold > 0 {
            return Err(StockError::Conflict(format!(
                "product has {} stock movement(s) and {} sale line(s)",
                movements, sold
            )));
        }

        self.db.products().delete(id).await?;
        info!(id = %id, "Product deleted");
        Ok(())
    }

    /// A numeric barcode of `GENERATED_BARCODE_DIGITS` digits not used yet.
    pub async fn generate_barcode(&self) -> StockResult<String> {
        let products = self.db.products();

        for _ in 0..BARCODE_ATTEMPTS {
            let candidate = random_barcode();
            if !products.barcode_exists(&candidate).await? {
                debug!(barcode = %candidate, "Generated barcode");
                return Ok(candidate);
            }
        }

        Err(StockError::Conflict(
            "could not generate a unique barcode".to_string(),
        ))
    }
}

/// Uniform in `[10^(d-1), 10^d)`, so there is never a leading zero.
fn random_barcode() -> String {
    let low = 10u32.pow(GENERATED_BARCODE_DIGITS - 1);
    let high = 10u32.pow(GENERATED_BARCODE_DIGITS);
    rand::rng().random_range(low..high).to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
