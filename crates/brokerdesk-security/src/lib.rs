pub mod validation;

pub use validation::IdentifierValidator;
