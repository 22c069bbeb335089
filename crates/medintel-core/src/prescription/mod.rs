//! Prescription domain: line items, the editable draft, saved records and the
//! backend seam.

mod backend;
mod draft;
mod model;

pub use backend::PrescriptionBackend;
pub use draft::PrescriptionDraft;
pub use model::{
    HistoryResponse, LineItem, LineItemField, PrescriptionPayload, PrescriptionRecord,
    PrescriptionStatus,
};
