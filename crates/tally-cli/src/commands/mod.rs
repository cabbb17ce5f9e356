pub mod category;
pub mod list;
pub mod recurring;
pub mod sync;
