pub mod addresses;
pub mod passwords;
pub mod synthetic;
