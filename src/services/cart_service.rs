use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    entity::{
        carts::{self, ActiveModel as CartActive, CartLines, Column as CartCol, Entity as Carts},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, Product},
    response::{ApiResponse, Meta},
    routes::params::parse_id,
    state::AppState,
};

/// Adds `quantity` of `product` to the lines, merging with an existing line for the same
/// product. The lines are left untouched when the merged quantity exceeds current stock.
pub fn merge_line(items: &mut Vec<CartItem>, product: &Product, quantity: i32) -> AppResult<()> {
    match items.iter_mut().find(|line| line.product_id == product.id) {
        Some(line) => {
            let merged = line.quantity.saturating_add(quantity);
            ensure_stock(product, merged)?;
            line.quantity = merged;
        }
        None => {
            ensure_stock(product, quantity)?;
            items.push(CartItem {
                product_id: product.id,
                quantity,
                name: product.name.clone(),
                price: product.price,
                image_url: product.image_url.clone(),
            });
        }
    }
    Ok(())
}

/// Sets an existing line to `quantity`; zero removes it. `stock` is only consulted for a
/// positive quantity.
pub fn set_line_quantity(
    items: &mut Vec<CartItem>,
    product_id: Uuid,
    quantity: i32,
    stock: Option<i32>,
) -> AppResult<()> {
    let position = items
        .iter()
        .position(|line| line.product_id == product_id)
        .ok_or_else(|| AppError::NotFound("Cart or item not found".into()))?;

    if quantity == 0 {
        items.remove(position);
        return Ok(());
    }

    if stock.is_none_or(|available| available < quantity) {
        return Err(AppError::InsufficientStock(
            "Insufficient stock for updated quantity".into(),
        ));
    }
    items[position].quantity = quantity;
    Ok(())
}

/// Returns `true` when a line was removed.
pub fn remove_line(items: &mut Vec<CartItem>, product_id: Uuid) -> bool {
    let before = items.len();
    items.retain(|line| line.product_id != product_id);
    items.len() != before
}

fn ensure_stock(product: &Product, quantity: i32) -> AppResult<()> {
    if product.stock < quantity {
        return Err(AppError::InsufficientStock(format!(
            "Insufficient stock for {}",
            product.name
        )));
    }
    Ok(())
}

pub async fn find_cart(
    db: &DatabaseConnection,
    user_id: Uuid,
) -> AppResult<Option<carts::Model>> {
    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user_id))
        .one(db)
        .await?;
    Ok(cart)
}

async fn find_product(db: &DatabaseConnection, id: Uuid) -> AppResult<Product> {
    Products::find_by_id(id)
        .one(db)
        .await?
        .map(Product::from)
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

async fn save_lines(
    db: &DatabaseConnection,
    cart: carts::Model,
    items: Vec<CartItem>,
) -> AppResult<Cart> {
    let mut active: CartActive = cart.into();
    active.items = Set(CartLines(items));
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(db).await?;
    Ok(Cart::from(updated))
}

/// A user who has never added anything gets an empty cart that is not persisted.
pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = find_cart(state.db(), user.user_id)
        .await?
        .map(Cart::from)
        .unwrap_or_else(|| Cart::empty(user.user_id));

    Ok(ApiResponse::success("Cart", cart, None))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let product_id = parse_id(&payload.product_id, "Product")?;
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".into(),
        ));
    }

    let product = find_product(state.db(), product_id).await?;
    ensure_stock(&product, payload.quantity)?;

    let existing = match find_cart(state.db(), user.user_id).await? {
        Some(cart) => cart,
        None => {
            let mut items = Vec::new();
            merge_line(&mut items, &product, payload.quantity)?;

            let id = Uuid::new_v4();
            let now = Utc::now();
            let active = CartActive {
                id: Set(id),
                user_id: Set(user.user_id),
                items: Set(CartLines(items.clone())),
                created_at: Set(now.into()),
                updated_at: Set(now.into()),
            };
            let inserted = match Carts::insert(active)
                .on_conflict(OnConflict::column(CartCol::UserId).do_nothing().to_owned())
                .exec_without_returning(state.db())
                .await
            {
                Ok(rows) => rows,
                Err(DbErr::RecordNotInserted) => 0,
                Err(err) => return Err(err.into()),
            };

            if inserted == 1 {
                tracing::debug!(user_id = %user.user_id, cart_id = %id, "cart created");
                let cart = Cart {
                    id: Some(id),
                    user_id: user.user_id,
                    items,
                    created_at: Some(now),
                    updated_at: Some(now),
                };
                return Ok(ApiResponse::success("Item added to cart", cart, Some(Meta::empty())));
            }

            // Another request created the cart first; merge into that one.
            find_cart(state.db(), user.user_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Cart not found".into()))?
        }
    };

    let mut items = existing.items.0.clone();
    merge_line(&mut items, &product, payload.quantity)?;
    let cart = save_lines(state.db(), existing, items).await?;

    Ok(ApiResponse::success("Item added to cart", cart, Some(Meta::empty())))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<Cart>> {
    let product_id = parse_id(&payload.product_id, "Product")?;
    if payload.quantity < 0 {
        return Err(AppError::BadRequest("quantity must not be negative".into()));
    }

    let existing = find_cart(state.db(), user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart or item not found".into()))?;

    let stock = if payload.quantity > 0 {
        Some(find_product(state.db(), product_id).await?.stock)
    } else {
        None
    };

    let mut items = existing.items.0.clone();
    set_line_quantity(&mut items, product_id, payload.quantity, stock)?;
    let cart = save_lines(state.db(), existing, items).await?;

    Ok(ApiResponse::success("Cart updated successfully", cart, Some(Meta::empty())))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<Cart>> {
    let existing = find_cart(state.db(), user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Item not found in cart".into()))?;

    let mut items = existing.items.0.clone();
    if !remove_line(&mut items, product_id) {
        return Err(AppError::NotFound("Item not found in cart".into()));
    }
    let cart = save_lines(state.db(), existing, items).await?;

    Ok(ApiResponse::success("Item removed from cart", cart, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use sea_orm::{DatabaseBackend, MockDatabase};

    use super::*;
    use crate::{config::AppConfig, models::Role, state::transaction_log};

    fn product(stock: i32) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4(),
            name: "Kopi Gayo".into(),
            description: String::new(),
            price: 25_000,
            stock,
            category: "beverages".into(),
            image_url: "https://img.example/kopi.png".into(),
            created_at: now,
            updated_at: now,
        }
    }

    fn state_with(orm: DatabaseConnection) -> AppState {
        let config = AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://mock".into()),
            "JWT_SECRET" => Some("secret".into()),
            _ => None,
        })
        .unwrap();
        AppState::new(orm, config, None)
    }

    #[test]
    fn merge_appends_snapshot_then_accumulates() {
        let p = product(5);
        let mut items = Vec::new();

        merge_line(&mut items, &p, 2).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Kopi Gayo");
        assert_eq!(items[0].price, 25_000);

        merge_line(&mut items, &p, 3).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 5);
    }

    #[test]
    fn merge_beyond_stock_leaves_lines_unchanged() {
        let p = product(5);
        let mut items = Vec::new();
        merge_line(&mut items, &p, 4).unwrap();

        let before = items.clone();
        assert!(matches!(
            merge_line(&mut items, &p, 2),
            Err(AppError::InsufficientStock(_))
        ));
        assert_eq!(items, before);
    }

    #[test]
    fn set_quantity_zero_removes_line() {
        let p = product(5);
        let mut items = Vec::new();
        merge_line(&mut items, &p, 2).unwrap();

        set_line_quantity(&mut items, p.id, 0, None).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn set_quantity_checks_stock_and_presence() {
        let p = product(3);
        let mut items = Vec::new();
        merge_line(&mut items, &p, 1).unwrap();

        assert!(matches!(
            set_line_quantity(&mut items, p.id, 4, Some(3)),
            Err(AppError::InsufficientStock(_))
        ));
        set_line_quantity(&mut items, p.id, 3, Some(3)).unwrap();
        assert_eq!(items[0].quantity, 3);

        assert!(matches!(
            set_line_quantity(&mut items, Uuid::new_v4(), 1, Some(10)),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn remove_reports_whether_anything_was_pulled() {
        let p = product(3);
        let mut items = Vec::new();
        merge_line(&mut items, &p, 1).unwrap();

        assert!(!remove_line(&mut items, Uuid::new_v4()));
        assert!(remove_line(&mut items, p.id));
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn missing_cart_reads_as_empty_without_writing() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<carts::Model>::new()])
            .into_connection();
        let state = state_with(db);
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            role: Role::Customer,
        };

        let response = get_cart(&state, &user).await.unwrap();
        let cart = response.data.unwrap();
        assert_eq!(cart.id, None);
        assert_eq!(cart.user_id, user.user_id);
        assert!(cart.items.is_empty());

        let log = format!("{:?}", transaction_log(state));
        assert!(!log.contains("INSERT"));
    }
}
