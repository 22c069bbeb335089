//! Infrastructure for MedIntel: the HTTP prescription backend and
//! configuration file loading.

pub mod config_service;
pub mod http_prescription_backend;
pub mod paths;

pub use crate::config_service::ConfigService;
pub use crate::http_prescription_backend::HttpPrescriptionBackend;
pub use crate::paths::MedintelPaths;
