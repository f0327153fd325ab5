pub mod geometry;
pub mod rect;
pub mod units;

use ahash::AHashMap;
pub type SmallKeyHashMap<K, V> = AHashMap<K, V>;

// Re-exports.
pub use approx;
pub use glam;
pub use static_assertions;
