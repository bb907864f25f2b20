//! Product catalog service.

use common::{Money, ProductId};
use store::{NewProduct, Product, ProductChanges, ProductFilter, Store};

use crate::error::{DomainError, ValidationError};

/// Service for reading and editing the product catalog.
pub struct CatalogService<S: Store> {
    store: S,
}

impl<S: Store> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Lists products matching the filter, newest first.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self, filter: ProductFilter) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products(filter).await?)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: ProductId) -> Result<Product, DomainError> {
        self.store
            .get_product(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))
    }

    #[tracing::instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: NewProduct) -> Result<Product, DomainError> {
        validate_name(&product.name)?;
        validate_price_and_stock(Some(&product.price), Some(product.stock))?;

        let product = self.store.insert_product(product).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Applies a partial update; fields left `None` keep their value.
    #[tracing::instrument(skip(self, changes))]
    pub async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, DomainError> {
        if let Some(name) = &changes.name {
            validate_name(name)?;
        }
        validate_price_and_stock(changes.price.as_ref(), changes.stock)?;

        let product = self
            .store
            .update_product(id, changes)
            .await?
            .ok_or_else(|| DomainError::not_found("Product", id))?;
        tracing::info!(product_id = %id, "product updated");
        Ok(product)
    }

    /// Deletes a product. Products referenced by any order line are kept.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<(), DomainError> {
        if !self.store.delete_product(id).await? {
            return Err(DomainError::not_found("Product", id));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::new("name", "This field may not be blank."));
    }
    Ok(())
}

/// Largest accepted price: ten digits, two of them after the decimal point.
pub const MAX_PRICE: Money = Money::from_minor(99_999_999_99);

fn validate_price_and_stock(
    price: Option<&Money>,
    stock: Option<i64>,
) -> Result<(), ValidationError> {
    if price.is_some_and(|p| p.is_negative()) {
        return Err(ValidationError::new(
            "price",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    if price.is_some_and(|p| *p > MAX_PRICE) {
        return Err(ValidationError::new(
            "price",
            "Ensure that there are no more than 10 digits in total.",
        ));
    }
    if stock.is_some_and(|s| s < 0) {
        return Err(ValidationError::new(
            "stock",
            "Ensure this value is greater than or equal to 0.",
        ));
    }
    Ok(())
}
