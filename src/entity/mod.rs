//! SeaORM entity definitions.

pub mod collect;
pub mod model;
pub mod role;
pub mod user;
pub mod user_role;
pub mod visit_log;
