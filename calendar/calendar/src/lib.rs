pub mod asset;
pub mod generator;
pub mod geometry;
pub mod grid;
pub mod group;
pub mod history;
pub mod ids;
pub mod layout;
pub mod page;
pub mod project;
pub mod reconcile;
pub mod relation;
pub mod selection;
pub mod snapshot;
pub mod store;

#[cfg(test)]
mod tests;
