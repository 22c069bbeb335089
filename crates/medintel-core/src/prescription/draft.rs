use serde::{Deserialize, Serialize};

use super::model::{LineItem, LineItemField};
use crate::error::{MedintelError, Result};

/// The editable, unsaved prescription.
///
/// Always holds at least one row. Rows are only removed by [`reset`].
///
/// [`reset`]: PrescriptionDraft::reset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionDraft {
    items: Vec<LineItem>,
}

impl Default for PrescriptionDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl PrescriptionDraft {
    /// A draft with one empty row.
    pub fn new() -> Self {
        Self {
            items: vec![LineItem::default()],
        }
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Never true; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when every cell of every row is empty.
    pub fn is_blank(&self) -> bool {
        self.items.iter().all(LineItem::is_blank)
    }

    /// Writes one cell. Other rows and cells are untouched.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `index` is past the last row; the draft is unchanged.
    pub fn set_field(
        &mut self,
        index: usize,
        field: LineItemField,
        value: impl Into<String>,
    ) -> Result<()> {
        let row_count = self.items.len();
        let item = self.items.get_mut(index).ok_or_else(|| {
            MedintelError::invalid_input(format!(
                "row {} does not exist (draft has {} rows)",
                index, row_count
            ))
        })?;
        *item.field_mut(field) = value.into();
        Ok(())
    }

    /// Appends one empty row and returns its index.
    pub fn add_row(&mut self) -> usize {
        self.items.push(LineItem::default());
        self.items.len() - 1
    }

    /// Back to a single empty row.
    pub fn reset(&mut self) {
        self.items = vec![LineItem::default()];
    }

    /// Snapshot of the rows for a save payload.
    pub fn to_items(&self) -> Vec<LineItem> {
        self.items.clone()
    }
}
