use utoipa::{
    Modify, OpenApi,
    openapi::{
        self, OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        cart::{AddToCartRequest, UpdateCartItemRequest},
        chat::{ChatRequest, ChatResponse},
        orders::{OrderList, UpdateOrderStatusRequest},
        products::{ProductList, ProductRequest},
        users::{UpdateProfileRequest, UserList},
    },
    models::{Cart, CartItem, Order, OrderItem, OrderStatus, Product, Role, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, chat, health, orders, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        users::update_profile,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::add_to_cart,
        cart::update_cart_item,
        cart::remove_from_cart,
        orders::checkout,
        orders::list_orders,
        orders::get_order,
        admin::list_users,
        admin::list_orders,
        admin::update_order_status,
        chat::ask
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            User,
            Product,
            Cart,
            CartItem,
            Order,
            OrderItem,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            ProductRequest,
            AddToCartRequest,
            UpdateCartItemRequest,
            UpdateOrderStatusRequest,
            ChatRequest,
            ChatResponse,
            ProductList,
            OrderList,
            UserList,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Cart>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<UserList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration and login"),
        (name = "User", description = "Profile of the signed-in user"),
        (name = "Products", description = "Product catalog"),
        (name = "Cart", description = "Shopping cart of the signed-in customer"),
        (name = "Orders", description = "Checkout and order history"),
        (name = "Admin", description = "Store administration"),
        (name = "Chatbot", description = "Shopping assistant"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
