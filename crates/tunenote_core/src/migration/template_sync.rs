//! Managed presentation template placement.
//!
//! # Invariants
//! - A record carries at most one managed template.
//! - Replacing the managed template keeps its ordinal (card order).
//! - Running sync twice yields identical templates.

use crate::migration::error::SyncError;
use crate::model::record::ManagedRecord;
use crate::presentation::PresentationBuilder;
use crate::repo::record_store::RecordStore;
use log::{error, info};

/// What `place` did to the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplatePlacement {
    Replaced { index: usize, ordinal: u32 },
    Appended { ordinal: u32 },
}

pub struct TemplatePresentationSync<'a> {
    presentation: &'a dyn PresentationBuilder,
}

impl<'a> TemplatePresentationSync<'a> {
    pub fn new(presentation: &'a dyn PresentationBuilder) -> Self {
        Self { presentation }
    }

    /// Places a freshly built managed template on `record` and saves it.
    pub fn sync(
        &self,
        store: &mut dyn RecordStore,
        mut record: ManagedRecord,
    ) -> Result<ManagedRecord, SyncError> {
        let placement = match self.place(&mut record) {
            Ok(placement) => placement,
            Err(err) => {
                error!(
                    "event=template_sync module=migration status=error error_code={} error={}",
                    err.code(),
                    err
                );
                return Err(err);
            }
        };

        store.save(&record)?;

        match placement {
            TemplatePlacement::Replaced { ordinal, .. } => info!(
                "event=template_sync module=migration status=ok action=replaced ordinal={ordinal}"
            ),
            TemplatePlacement::Appended { ordinal } => info!(
                "event=template_sync module=migration status=ok action=appended ordinal={ordinal}"
            ),
        }
        Ok(record)
    }

    /// In-memory part of `sync`: replaces or appends the managed template.
    pub fn place(&self, record: &mut ManagedRecord) -> Result<TemplatePlacement, SyncError> {
        let managed = record.managed_template_indices();
        if managed.len() > 1 {
            return Err(SyncError::MultipleManagedTemplates {
                record: record.name.clone(),
                count: managed.len(),
            });
        }

        let mut template = self.presentation.build(record);
        match managed.first() {
            Some(&index) => {
                let ordinal = record.templates[index].ordinal;
                template.ordinal = ordinal;
                record.templates[index] = template;
                Ok(TemplatePlacement::Replaced { index, ordinal })
            }
            None => {
                let ordinal = record.next_template_ordinal();
                template.ordinal = ordinal;
                record.templates.push(template);
                Ok(TemplatePlacement::Appended { ordinal })
            }
        }
    }
}
