//! Catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use common::{Money, ProductId};
use domain::{DomainError, Operation, ValidationError};
use serde::Deserialize;
use store::{NewProduct, ProductChanges, ProductFilter, Store};

use crate::error::ApiError;
use crate::extract::{ApiJson, Caller};
use crate::media::{MediaStorage, Upload};
use crate::state::AppState;
use crate::views::ProductView;

/// Listing flags. Only the literal value `"true"` enables a filter.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListParams {
    pub is_featured: Option<String>,
    pub is_trending: Option<String>,
    pub is_bestseller: Option<String>,
}

impl ProductListParams {
    fn to_filter(&self) -> ProductFilter {
        let enabled = |flag: &Option<String>| flag.as_deref() == Some("true");
        ProductFilter {
            featured: enabled(&self.is_featured),
            trending: enabled(&self.is_trending),
            bestseller: enabled(&self.is_bestseller),
            stock_below: None,
        }
    }
}

/// Product fields as sent by clients. Which ones are required depends on
/// the method.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPayload {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<i64>,
    pub is_featured: Option<bool>,
    pub is_trending: Option<bool>,
    pub is_bestseller: Option<bool>,
}

impl ProductPayload {
    fn required(&self) -> Result<(String, Money), ValidationError> {
        let name = self
            .name
            .clone()
            .ok_or_else(|| ValidationError::new("name", "This field is required."))?;
        let price = self
            .price
            .ok_or_else(|| ValidationError::new("price", "This field is required."))?;
        Ok((name, price))
    }

    fn into_new_product(self) -> Result<NewProduct, ValidationError> {
        let (name, price) = self.required()?;
        Ok(NewProduct {
            name,
            description: self.description.unwrap_or_default(),
            price,
            stock: self.stock.unwrap_or_default(),
            is_featured: self.is_featured.unwrap_or_default(),
            is_trending: self.is_trending.unwrap_or_default(),
            is_bestseller: self.is_bestseller.unwrap_or_default(),
            image: None,
        })
    }

    /// Full replacement: required fields must be present, omitted optional
    /// fields fall back to their defaults.
    fn into_replacement(self) -> Result<ProductChanges, ValidationError> {
        let product = self.into_new_product()?;
        Ok(ProductChanges {
            name: Some(product.name),
            description: Some(product.description),
            price: Some(product.price),
            stock: Some(product.stock),
            is_featured: Some(product.is_featured),
            is_trending: Some(product.is_trending),
            is_bestseller: Some(product.is_bestseller),
            image: None,
        })
    }

    fn into_changes(self) -> ProductChanges {
        ProductChanges {
            name: self.name,
            description: self.description,
            price: self.price,
            stock: self.stock,
            is_featured: self.is_featured,
            is_trending: self.is_trending,
            is_bestseller: self.is_bestseller,
            image: None,
        }
    }

    /// Sets a field from its form-encoded text. Unknown names are ignored.
    fn set_text(&mut self, name: &str, value: String) -> Result<(), ValidationError> {
        match name {
            "name" => self.name = Some(value),
            "description" => self.description = Some(value),
            "price" => {
                let price = value
                    .trim()
                    .parse()
                    .map_err(|_| ValidationError::new("price", "A valid number is required."))?;
                self.price = Some(price);
            }
            "stock" => {
                let stock = value
                    .trim()
                    .parse()
                    .map_err(|_| ValidationError::new("stock", "A valid integer is required."))?;
                self.stock = Some(stock);
            }
            "is_featured" => self.is_featured = Some(parse_flag("is_featured", &value)?),
            "is_trending" => self.is_trending = Some(parse_flag("is_trending", &value)?),
            "is_bestseller" => self.is_bestseller = Some(parse_flag("is_bestseller", &value)?),
            _ => {}
        }
        Ok(())
    }
}

fn parse_flag(field: &'static str, value: &str) -> Result<bool, ValidationError> {
    match value.trim() {
        "true" | "True" | "1" | "on" | "yes" => Ok(true),
        "false" | "False" | "0" | "off" | "no" | "" => Ok(false),
        _ => Err(ValidationError::new(field, "Must be a valid boolean.")),
    }
}

/// A product body: JSON, or `multipart/form-data` whose text parts carry
/// the same fields plus an optional `image` file part.
pub struct ProductForm {
    pub payload: ProductPayload,
    pub image: Option<Upload>,
}

impl<St> FromRequest<St> for ProductForm
where
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &St) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("multipart/form-data"));
        if !is_multipart {
            let ApiJson(payload) = ApiJson::<ProductPayload>::from_request(req, state).await?;
            return Ok(Self {
                payload,
                image: None,
            });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
        let mut form = Self {
            payload: ProductPayload::default(),
            image: None,
        };

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?
        {
            let Some(name) = field.name().map(str::to_owned) else {
                continue;
            };

            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                // Browsers send an empty, unnamed part when no file was chosen
                if !(file_name.is_empty() && bytes.is_empty()) {
                    form.image = Some(Upload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            form.payload
                .set_text(&name, value)
                .map_err(DomainError::from)?;
        }

        Ok(form)
    }
}

async fn save_image(
    media: &MediaStorage,
    upload: Option<Upload>,
) -> Result<Option<String>, ApiError> {
    match upload {
        Some(upload) => Ok(Some(media.save_product_image(&upload).await?)),
        None => Ok(None),
    }
}

/// Removes a just-saved image when the write it belonged to failed.
async fn discard_on_error<T>(
    media: &MediaStorage,
    image: Option<&str>,
    result: Result<T, DomainError>,
) -> Result<T, ApiError> {
    if let (Err(_), Some(path)) = (&result, image) {
        media.remove(path).await;
    }
    Ok(result?)
}

/// GET /products — newest first.
#[tracing::instrument(skip(state, caller))]
pub async fn list<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Query(params): Query<ProductListParams>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    caller.allow(Operation::ListProducts)?;

    let products = state.catalog.list(params.to_filter()).await?;
    Ok(Json(products.into_iter().map(ProductView::from).collect()))
}

/// GET /products/{id}
#[tracing::instrument(skip(state, caller))]
pub async fn get<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<Json<ProductView>, ApiError> {
    caller.allow(Operation::RetrieveProduct)?;
    Ok(Json(state.catalog.get(ProductId::new(id)).await?.into()))
}

/// POST /products
#[tracing::instrument(skip_all)]
pub async fn create<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    form: ProductForm,
) -> Result<(StatusCode, Json<ProductView>), ApiError> {
    caller.require(Operation::CreateProduct)?;

    let mut product = form.payload.into_new_product().map_err(DomainError::from)?;
    product.image = save_image(&state.media, form.image).await?;

    let image = product.image.clone();
    let result = state.catalog.create(product).await;
    let product = discard_on_error(&state.media, image.as_deref(), result).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// PUT /products/{id}
#[tracing::instrument(skip(state, caller, form))]
pub async fn replace<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
    form: ProductForm,
) -> Result<Json<ProductView>, ApiError> {
    caller.require(Operation::UpdateProduct)?;

    let mut changes = form.payload.into_replacement().map_err(DomainError::from)?;
    changes.image = save_image(&state.media, form.image).await?;
    write_changes(&state, ProductId::new(id), changes).await
}

/// PATCH /products/{id}
#[tracing::instrument(skip(state, caller, form))]
pub async fn update<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
    form: ProductForm,
) -> Result<Json<ProductView>, ApiError> {
    caller.require(Operation::UpdateProduct)?;

    let mut changes = form.payload.into_changes();
    changes.image = save_image(&state.media, form.image).await?;
    write_changes(&state, ProductId::new(id), changes).await
}

async fn write_changes<S: Store + Clone + 'static>(
    state: &AppState<S>,
    id: ProductId,
    changes: ProductChanges,
) -> Result<Json<ProductView>, ApiError> {
    let image = changes.image.clone();
    let result = state.catalog.update(id, changes).await;
    let product = discard_on_error(&state.media, image.as_deref(), result).await?;
    Ok(Json(product.into()))
}

/// DELETE /products/{id}
#[tracing::instrument(skip(state, caller))]
pub async fn delete<S: Store + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    caller.require(Operation::DeleteProduct)?;

    state.catalog.delete(ProductId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
