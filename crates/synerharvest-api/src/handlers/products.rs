//! Product catalog handlers
//!
//! Listing endpoints under /api/products are scoped to the caller's own
//! catalog; the search/type/organic/expiring endpoints query the whole
//! catalog, mirroring the public discovery surface but with stock and
//! pricing visible.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::collections::HashMap;
use std::sync::Arc;
use synerharvest_db::entities::{
    prelude::{Product, ProductCondition, User},
    product, product_condition,
    user::{self, Role},
};
use tracing::{debug, info};
use validator::Validate;

use super::current_user;
use crate::codes;
use crate::error::{ApiError, ErrorBody, ValidationErrorBody};
use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

/// Default expiry window in days
const DEFAULT_EXPIRY_WINDOW_DAYS: i64 = 7;

/// Assemble product DTOs, batch-loading creator usernames and the
/// environmental readings for every listed product.
pub(crate) async fn product_responses<C: sea_orm::ConnectionTrait>(
    conn: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductResponse>, ApiError> {
    if products.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids: Vec<i64> = products.iter().map(|p| p.user_id).collect();
    let usernames: HashMap<i64, String> = User::find()
        .filter(user::Column::Id.is_in(user_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let product_ids: Vec<i64> = products.iter().map(|p| p.id).collect();
    let mut conditions: HashMap<i64, Vec<ConditionResponse>> = HashMap::new();
    for condition in ProductCondition::find()
        .filter(product_condition::Column::ProductId.is_in(product_ids))
        .order_by_desc(product_condition::Column::RecordedAt)
        .all(conn)
        .await?
    {
        conditions
            .entry(condition.product_id)
            .or_default()
            .push(condition.into());
    }

    Ok(products
        .into_iter()
        .map(|p| {
            let environmental_conditions = conditions.remove(&p.id);
            ProductResponse {
                id: p.id,
                batch_code: p.batch_code,
                name: p.name,
                description: p.description,
                price: p.price,
                stock: p.stock,
                created_by_username: usernames.get(&p.user_id).cloned().unwrap_or_default(),
                created_at: p.created_at,
                harvest_date: p.harvest_date,
                expiration_date: p.expiration_date,
                product_type: p.product_type,
                organic: p.organic,
                certification: p.certification,
                cultivation_method: p.cultivation_method,
                qr_code_url: p.qr_code_url,
                image_url: p.image_url,
                environmental_conditions,
            }
        })
        .collect())
}

pub(crate) async fn product_response<C: sea_orm::ConnectionTrait>(
    conn: &C,
    product: product::Model,
) -> Result<ProductResponse, ApiError> {
    let mut responses = product_responses(conn, vec![product]).await?;
    responses
        .pop()
        .ok_or_else(|| ApiError::Internal("product mapper produced no output".to_string()))
}

/// Register a new product
#[utoipa::path(
    post,
    path = "/api/products",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Validation failed", body = ValidationErrorBody),
        (status = 403, description = "Caller is not a farmer", body = ErrorBody),
        (status = 409, description = "Batch code already taken", body = ErrorBody)
    ),
    tag = "products"
)]
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Json(request): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    info!("Creating product {} for user {}", request.name, auth.id);

    let caller = current_user(&state.db, &auth).await?;
    if caller.role != Role::Farmer && caller.role != Role::Admin {
        return Err(ApiError::AccessDenied(
            "Only farmers can create products".to_string(),
        ));
    }

    request.validate()?;

    let now = Utc::now();
    let batch_code = match request.batch_code.filter(|c| !c.is_empty()) {
        Some(code) => {
            let taken = Product::find()
                .filter(product::Column::BatchCode.eq(&code))
                .one(&state.db)
                .await?
                .is_some();
            if taken {
                return Err(ApiError::Duplicate(format!(
                    "Product with batch code {code} already exists"
                )));
            }
            code
        }
        None => codes::product_code(&request.name, now),
    };

    // QR URLs are always derived server-side from the label code.
    let qr_code_url = codes::product_qr_url(&batch_code);

    let created = product::ActiveModel {
        batch_code: Set(batch_code),
        name: Set(request.name),
        description: Set(request.description),
        price: Set(request.price),
        stock: Set(request.stock),
        harvest_date: Set(request.harvest_date),
        expiration_date: Set(request.expiration_date),
        product_type: Set(request.product_type),
        organic: Set(request.organic),
        certification: Set(request.certification),
        cultivation_method: Set(request.cultivation_method),
        image_url: Set(request.image_url),
        qr_code_url: Set(Some(qr_code_url)),
        user_id: Set(auth.id),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Created product {} ({})", created.id, created.batch_code);

    let response = product_response(&state.db, created).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// List the caller's products
#[utoipa::path(
    get,
    path = "/api/products",
    responses(
        (status = 200, description = "Products created by the caller", body = [ProductResponse])
    ),
    tag = "products"
)]
pub async fn list_products(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    debug!("Listing products for user {}", auth.id);

    let products = Product::find()
        .filter(product::Column::UserId.eq(auth.id))
        .order_by_desc(product::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(product_responses(&state.db, products).await?))
}

/// List the caller's products, paged
#[utoipa::path(
    get,
    path = "/api/products/paged",
    params(
        ("page" = Option<u64>, Query, description = "Zero-based page index (default 0)"),
        ("size" = Option<u64>, Query, description = "Page size (default 10)"),
        ("sortBy" = Option<String>, Query, description = "Sort property (default id)"),
        ("sortDir" = Option<String>, Query, description = "asc or desc (default desc)"),
        ("search" = Option<String>, Query, description = "Name/description filter")
    ),
    responses(
        (status = 200, description = "One page of the caller's products", body = ProductPage)
    ),
    tag = "products"
)]
pub async fn list_products_paged(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ProductPageQuery>,
) -> Result<Json<ProductPage>, ApiError> {
    let page = query.page.unwrap_or(0);
    let size = query.size.unwrap_or(10).max(1);
    debug!("Listing products for user {} (page {page}, size {size})", auth.id);

    let mut select = Product::find().filter(product::Column::UserId.eq(auth.id));

    // A blank search term matches everything, same as omitting it.
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if let Some(term) = search {
        select = select.filter(
            Condition::any()
                .add(product::Column::Name.contains(term))
                .add(product::Column::Description.contains(term)),
        );
    }

    let sort_column = match query.sort_by.as_deref() {
        Some("name") => product::Column::Name,
        Some("price") => product::Column::Price,
        Some("stock") => product::Column::Stock,
        Some("createdAt") => product::Column::CreatedAt,
        Some("harvestDate") => product::Column::HarvestDate,
        Some("expirationDate") => product::Column::ExpirationDate,
        _ => product::Column::Id,
    };
    let sort_order = match query.sort_dir.as_deref() {
        Some(dir) if dir.eq_ignore_ascii_case("asc") => Order::Asc,
        _ => Order::Desc,
    };
    let select = select.order_by(sort_column, sort_order);

    let paginator = select.paginate(&state.db, size);
    let totals = paginator.num_items_and_pages().await?;
    let products = paginator.fetch_page(page).await?;

    Ok(Json(ProductPage {
        content: product_responses(&state.db, products).await?,
        page,
        size,
        total_elements: totals.number_of_items,
        total_pages: totals.number_of_pages,
    }))
}

/// Fetch one product by id
#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "The product", body = ProductResponse),
        (status = 404, description = "No such product", body = ErrorBody)
    ),
    tag = "products"
)]
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductResponse>, ApiError> {
    debug!("Fetching product {id}");

    let product = Product::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product_response(&state.db, product).await?))
}

/// Fetch one product by its label code
#[utoipa::path(
    get,
    path = "/api/products/batch/{batchCode}",
    params(
        ("batchCode" = String, Path, description = "Product label code")
    ),
    responses(
        (status = 200, description = "The product", body = ProductResponse),
        (status = 404, description = "No such product", body = ErrorBody)
    ),
    tag = "products"
)]
pub async fn get_product_by_code(
    State(state): State<Arc<AppState>>,
    Path(batch_code): Path<String>,
) -> Result<Json<ProductResponse>, ApiError> {
    debug!("Fetching product by batch code {batch_code}");

    let product = Product::find()
        .filter(product::Column::BatchCode.eq(&batch_code))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Product not found with batch code: {batch_code}"))
        })?;

    Ok(Json(product_response(&state.db, product).await?))
}

/// Update a product
#[utoipa::path(
    put,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product id")
    ),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Updated product", body = ProductResponse),
        (status = 403, description = "Caller did not create the product", body = ErrorBody),
        (status = 404, description = "No such product", body = ErrorBody)
    ),
    tag = "products"
)]
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    info!("Updating product {id} for user {}", auth.id);

    let product = Product::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let caller = current_user(&state.db, &auth).await?;
    if product.user_id != auth.id && caller.role != Role::Admin {
        return Err(ApiError::AccessDenied(
            "You can only update products you created".to_string(),
        ));
    }

    let mut active = product.clone().into_active_model();
    let mut changed = false;
    if let Some(name) = request.name {
        active.name = Set(name);
        changed = true;
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
        changed = true;
    }
    if let Some(price) = request.price {
        active.price = Set(price);
        changed = true;
    }
    if let Some(stock) = request.stock {
        active.stock = Set(stock);
        changed = true;
    }
    if let Some(harvest_date) = request.harvest_date {
        active.harvest_date = Set(Some(harvest_date));
        changed = true;
    }
    if let Some(expiration_date) = request.expiration_date {
        active.expiration_date = Set(Some(expiration_date));
        changed = true;
    }
    if let Some(product_type) = request.product_type {
        active.product_type = Set(Some(product_type));
        changed = true;
    }
    if let Some(organic) = request.organic {
        active.organic = Set(organic);
        changed = true;
    }
    if let Some(certification) = request.certification {
        active.certification = Set(Some(certification));
        changed = true;
    }
    if let Some(cultivation_method) = request.cultivation_method {
        active.cultivation_method = Set(Some(cultivation_method));
        changed = true;
    }
    if let Some(image_url) = request.image_url {
        active.image_url = Set(Some(image_url));
        changed = true;
    }

    let product = if changed {
        active.update(&state.db).await?
    } else {
        product
    };

    Ok(Json(product_response(&state.db, product).await?))
}

/// Delete a product and its batches
#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    params(
        ("id" = i64, Path, description = "Product id")
    ),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 403, description = "Caller did not create the product", body = ErrorBody),
        (status = 404, description = "No such product", body = ErrorBody)
    ),
    tag = "products"
)]
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    info!("Deleting product {id} for user {}", auth.id);

    let product = Product::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let caller = current_user(&state.db, &auth).await?;
    if product.user_id != auth.id && caller.role != Role::Admin {
        return Err(ApiError::AccessDenied(
            "You can only delete products you created".to_string(),
        ));
    }

    // Batches, their events, and condition readings go with it.
    Product::delete_by_id(product.id).exec(&state.db).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Record an environmental reading against a product
#[utoipa::path(
    post,
    path = "/api/products/{id}/environmental-conditions",
    params(
        ("id" = i64, Path, description = "Product id")
    ),
    request_body = ConditionRequest,
    responses(
        (status = 200, description = "Recorded reading", body = ConditionResponse),
        (status = 404, description = "No such product", body = ErrorBody)
    ),
    tag = "products"
)]
pub async fn add_environmental_condition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(request): Json<ConditionRequest>,
) -> Result<Json<ConditionResponse>, ApiError> {
    info!("Recording environmental condition for product {id}");

    let product = Product::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let recorded = product_condition::ActiveModel {
        product_id: Set(product.id),
        temperature: Set(request.temperature),
        humidity: Set(request.humidity),
        light_exposure: Set(request.light_exposure),
        soil_moisture: Set(request.soil_moisture),
        soil_ph: Set(request.soil_ph),
        air_quality: Set(request.air_quality),
        location: Set(request.location),
        notes: Set(request.notes),
        recorded_by: Set(request.recorded_by),
        recorded_at: Set(request.timestamp.unwrap_or_else(Utc::now)),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    Ok(Json(recorded.into()))
}

/// List a product's environmental readings, newest first
#[utoipa::path(
    get,
    path = "/api/products/{id}/environmental-conditions",
    params(
        ("id" = i64, Path, description = "Product id")
    ),
    responses(
        (status = 200, description = "Readings, newest first", body = [ConditionResponse]),
        (status = 404, description = "No such product", body = ErrorBody)
    ),
    tag = "products"
)]
pub async fn list_environmental_conditions(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ConditionResponse>>, ApiError> {
    debug!("Listing environmental conditions for product {id}");

    let product = Product::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    let conditions = ProductCondition::find()
        .filter(product_condition::Column::ProductId.eq(product.id))
        .order_by_desc(product_condition::Column::RecordedAt)
        .all(&state.db)
        .await?;

    Ok(Json(conditions.into_iter().map(Into::into).collect()))
}

/// Search the whole catalog by name or description
#[utoipa::path(
    get,
    path = "/api/products/search",
    params(
        ("keyword" = String, Query, description = "Name/description filter")
    ),
    responses(
        (status = 200, description = "Matching products", body = [ProductResponse])
    ),
    tag = "products"
)]
pub async fn search_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<KeywordQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    debug!("Searching products for {:?}", query.keyword);

    let keyword = query.keyword.trim();
    let products = Product::find()
        .filter(
            Condition::any()
                .add(product::Column::Name.contains(keyword))
                .add(product::Column::Description.contains(keyword)),
        )
        .order_by_desc(product::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(product_responses(&state.db, products).await?))
}

/// List catalog products of one category
#[utoipa::path(
    get,
    path = "/api/products/type/{productType}",
    params(
        ("productType" = String, Path, description = "Category, e.g. VEGETABLE")
    ),
    responses(
        (status = 200, description = "Products in the category", body = [ProductResponse])
    ),
    tag = "products"
)]
pub async fn list_products_by_type(
    State(state): State<Arc<AppState>>,
    Path(product_type): Path<String>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    debug!("Listing products of type {product_type}");

    let products = Product::find()
        .filter(product::Column::ProductType.eq(&product_type))
        .order_by_desc(product::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(product_responses(&state.db, products).await?))
}

/// List organically grown catalog products
#[utoipa::path(
    get,
    path = "/api/products/organic",
    responses(
        (status = 200, description = "Organic products", body = [ProductResponse])
    ),
    tag = "products"
)]
pub async fn list_organic_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    debug!("Listing organic products");

    let products = Product::find()
        .filter(product::Column::Organic.eq(true))
        .order_by_desc(product::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(product_responses(&state.db, products).await?))
}

/// List catalog products expiring within a window
///
/// Only products whose expiration falls between now and the end of the
/// window count; already-expired stock is excluded.
#[utoipa::path(
    get,
    path = "/api/products/expiring",
    params(
        ("days" = Option<i64>, Query, description = "Window length in days (default 7)")
    ),
    responses(
        (status = 200, description = "Products expiring in the window", body = [ProductResponse])
    ),
    tag = "products"
)]
pub async fn list_expiring_products(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DaysQuery>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_EXPIRY_WINDOW_DAYS);
    debug!("Listing products expiring within {days} days");

    let now = Utc::now();
    let cutoff = now + Duration::days(days);
    let products = Product::find()
        .filter(product::Column::ExpirationDate.between(now, cutoff))
        .order_by_asc(product::Column::ExpirationDate)
        .all(&state.db)
        .await?;

    Ok(Json(product_responses(&state.db, products).await?))
}
