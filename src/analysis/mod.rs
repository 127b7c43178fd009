pub mod scope;
pub mod semantic;
