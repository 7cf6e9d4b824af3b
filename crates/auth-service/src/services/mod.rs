pub mod credential_service;
pub mod revocation_service;
pub mod token_service;
