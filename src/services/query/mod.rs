//! 查询构建

pub mod builder;

pub use builder::{BuiltQuery, QueryBuilder};
