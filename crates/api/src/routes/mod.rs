//! HTTP route handlers for the Banyan API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                         - Liveness check
//! GET  /health/ready                   - Readiness check (pings the database)
//!
//! # Auth
//! POST /api/auth/register              - Register a customer
//! POST /api/auth/register-admin        - Register an admin (keyed)
//! POST /api/auth/login                 - Login
//! POST /api/auth/admin-login           - Login, admin role required
//! GET  /api/auth/me                    - Current user
//! GET  /api/auth/validate-token        - Token check (public projection)
//! GET  /api/auth/verify-token          - Token check (full user)
//! POST /api/auth/refresh-token         - Re-issue a session token
//! POST /api/auth/forgot-password       - Begin a password reset
//! GET  /api/auth/reset-password/{token}/validate - Check a reset token
//! POST /api/auth/reset-password/{token}          - Complete a reset
//!
//! # Products
//! GET    /api/products                 - List products
//! GET    /api/products/{id}            - Product detail
//! POST   /api/products                 - Create (admin, multipart)
//! PUT    /api/products/{id}            - Update (admin, multipart)
//! DELETE /api/products/{id}            - Delete (admin)
//! POST   /api/products/{id}/rate       - Rate 1-5 (auth)
//! GET    /api/products/{id}/userRating - Caller's rating (auth)
//!
//! # Categories
//! GET    /api/categories               - List categories
//! GET    /api/categories/{id}          - Category detail
//! POST   /api/categories               - Create (admin, multipart)
//! PUT    /api/categories/{id}          - Update (admin, multipart)
//! DELETE /api/categories/{id}          - Delete (admin; blocked with children)
//!
//! # Orders
//! GET  /api/orders                     - Paged listing (admin)
//! GET  /api/orders/my-orders           - Caller's orders
//! GET  /api/orders/{id}                - Order detail (owner or admin)
//! POST /api/orders                     - Create an order
//! PUT  /api/orders/{id}/status         - Set status (admin)
//! PUT  /api/orders/{id}/pay            - Record payment (owner or admin)
//!
//! # Users
//! GET    /api/users/profile            - Caller's profile
//! PUT    /api/users/profile            - Update profile
//! POST   /api/users/change-password    - Change password
//! DELETE /api/users/delete-account     - Delete own account
//! GET    /api/users/wishlist           - Wishlist, populated
//! POST   /api/users/wishlist/{productId}   - Add to wishlist
//! DELETE /api/users/wishlist/{productId}   - Remove from wishlist
//!
//! # Admin
//! GET    /api/admin/stats              - Dashboard numbers
//! GET    /api/admin/users[/{id}]       - Accounts
//! GET    /api/admin/users/{id}/orders  - An account's orders
//! PUT    /api/admin/users/{id}         - Update an account
//! DELETE /api/admin/users/{id}         - Delete an account
//! GET    /api/admin/orders[/{id}]      - Orders with owners populated
//! PUT    /api/admin/orders/{id}        - Set an order's status
//!
//! # Contact
//! POST /api/contact                    - Contact form (mails support + confirmation)
//! ```

pub mod admin;
pub mod auth;
pub mod categories;
pub mod contact;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/register-admin", post(auth::register_admin))
        .route("/login", post(auth::login))
        .route("/admin-login", post(auth::admin_login))
        .route("/me", get(auth::me))
        .route("/validate-token", get(auth::validate_token))
        .route("/verify-token", get(auth::verify_token))
        .route("/refresh-token", post(auth::refresh_token))
        .route("/forgot-password", post(auth::forgot_password))
        .route(
            "/reset-password/{token}/validate",
            get(auth::validate_reset_token),
        )
        .route("/reset-password/{token}", post(auth::reset_password))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::get)
                .put(products::update)
                .delete(products::delete),
        )
        .route("/{id}/rate", post(products::rate))
        .route("/{id}/userRating", get(products::user_rating))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route(
            "/{id}",
            get(categories::get)
                .put(categories::update)
                .delete(categories::delete),
        )
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::create))
        .route("/my-orders", get(orders::my_orders))
        .route("/{id}", get(orders::get))
        .route("/{id}/status", put(orders::update_status))
        .route("/{id}/pay", put(orders::pay))
}

/// Create the user self-service routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(users::get_profile).put(users::update_profile),
        )
        .route("/change-password", post(users::change_password))
        .route("/delete-account", delete(users::delete_account))
        .route("/wishlist", get(users::get_wishlist))
        .route(
            "/wishlist/{productId}",
            post(users::add_to_wishlist).delete(users::remove_from_wishlist),
        )
}

/// Create the admin dashboard routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(admin::stats))
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .put(admin::update_user)
                .delete(admin::delete_user),
        )
        .route("/users/{id}/orders", get(admin::user_orders))
        .route("/orders", get(admin::list_orders))
        .route(
            "/orders/{id}",
            get(admin::get_order).put(admin::update_order),
        )
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/products", product_routes())
        .nest("/api/categories", category_routes())
        .nest("/api/orders", order_routes())
        .nest("/api/users", user_routes())
        .nest("/api/admin", admin_routes())
        .route("/api/contact", post(contact::submit))
}
