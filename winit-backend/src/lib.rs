pub mod config;
pub mod error;
pub mod exposition;
pub mod health;
pub mod presenter;
pub mod relay;
pub mod routes;
pub mod state;
pub mod store;

#[cfg(test)]
mod test_support;
