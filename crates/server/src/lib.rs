pub mod errors;
pub mod layout;
pub mod routes;
pub mod startup;

pub use startup::run;
