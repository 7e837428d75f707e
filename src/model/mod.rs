//! # Property Graph Model
//!
//! Clean DTOs that define the Neo4j-compatible property graph.
//! These types cross every boundary: storage ↔ type collection ↔ export writers.
//!
//! Design rule: this module is pure data with no I/O or async.

pub mod node;
pub mod relationship;
pub mod value;
pub mod property_map;
pub mod entity;

pub use node::{Node, NodeId};
pub use relationship::{Relationship, RelId};
pub use value::{Value, IsoDuration};
pub use property_map::PropertyMap;
pub use entity::Entity;
