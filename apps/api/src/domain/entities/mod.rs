pub mod service_credentials;
