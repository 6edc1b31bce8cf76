//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod aes_credential_cipher;
mod http_payment_provider;
mod in_memory_resource_repository;
mod in_memory_tenant_repository;
mod postgres_resource_repository;
mod postgres_tenant_repository;
mod sandbox_payment_provider;

#[cfg(test)]
mod postgres_test_support;

pub use aes_credential_cipher::AesCredentialCipher;
pub use http_payment_provider::HttpPaymentProvider;
pub use in_memory_resource_repository::InMemoryResourceRepository;
pub use in_memory_tenant_repository::InMemoryTenantRepository;
pub use postgres_resource_repository::PostgresResourceRepository;
pub use postgres_tenant_repository::PostgresTenantRepository;
pub use sandbox_payment_provider::SandboxPaymentProvider;
