pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod store;
pub mod utils;
pub mod views;

use store::Store;
use views::Views;

/// Shared by every handler; built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub views: Views,
}
