//! Engine data structures: values, objects, property descriptors, the heap
//! and global contexts.

pub mod error;
pub mod function_object;
pub mod heap;
pub mod object;
pub mod object_property;
pub mod realm;
pub mod value;
