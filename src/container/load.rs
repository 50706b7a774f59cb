//! Loading container entries into the template bank and the engine.

use crate::bank::TemplateBank;
use crate::cloud::pcd::read_pcd;
use crate::container::{ContainerEntry, ContainerReader, EntryKind};
use crate::engine::{MatchingEngine, TemplateSignature};
use crate::trace::{trace_debug, trace_event, trace_span, trace_warn};
use crate::util::LinemodError;
use std::io::{Read, Seek};

/// How parsing of a container ended.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum LoadStatus {
    /// All entries up to the end of the archive were consumed.
    #[default]
    Complete,
    /// An entry could not be read or decoded; later entries were not parsed.
    Truncated { entry: String, reason: String },
}

/// Summary of one container load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoadReport {
    /// Geometry entries appended to the bank.
    pub geometries: usize,
    /// Signatures registered with the engine.
    pub signatures: usize,
    /// Entries with an unrecognized suffix.
    pub skipped: usize,
    pub status: LoadStatus,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.status == LoadStatus::Complete
    }

    fn abort(&mut self, entry: &ContainerEntry, err: LinemodError) {
        self.status = LoadStatus::Truncated {
            entry: entry.name.clone(),
            reason: err.to_string(),
        };
    }
}

/// Appends every template in the container to `bank` and `engine`.
///
/// Geometry entries are decoded as PCD; signature entries are decoded by the
/// engine's signature type and tagged with `object_id`. Templates appended
/// before a failing entry are kept; the failure is reported in the returned
/// status. All geometry appended by this call is re-centered at the end.
pub fn load_templates<R, E>(
    reader: R,
    engine: &mut E,
    bank: &mut TemplateBank,
    object_id: usize,
) -> LoadReport
where
    R: Read + Seek,
    E: MatchingEngine,
{
    let _span = trace_span!("load_templates", object_id = object_id).entered();

    let first_new = bank.num_geometries();
    let mut container = ContainerReader::new(reader);
    let mut report = LoadReport::default();

    while let Some(entry) = container.next_entry() {
        match entry.kind {
            EntryKind::Geometry => {
                trace_debug!("geometry_entry", name = entry.name.as_str(), size = entry.size);
                let cloud = container
                    .read_body(&entry)
                    .and_then(|body| read_pcd(&body));
                match cloud {
                    Ok(cloud) => {
                        bank.push_geometry(cloud);
                        report.geometries += 1;
                    }
                    Err(err) => {
                        report.abort(&entry, err);
                        break;
                    }
                }
            }
            EntryKind::Signature => {
                trace_debug!("signature_entry", name = entry.name.as_str(), size = entry.size);
                let signature = container
                    .read_body(&entry)
                    .and_then(|body| E::Signature::deserialize(&body));
                match signature {
                    Ok(signature) => {
                        engine.add_template(signature);
                        bank.push_object_id(object_id);
                        report.signatures += 1;
                    }
                    Err(err) => {
                        report.abort(&entry, err);
                        break;
                    }
                }
            }
            EntryKind::Other => {
                trace_debug!("skipped_entry", name = entry.name.as_str(), size = entry.size);
                report.skipped += 1;
            }
        }
    }
    trace_debug!("container_end", cursor = container.cursor());

    bank.finalize_from(first_new);

    if let LoadStatus::Truncated { entry, reason } = &report.status {
        trace_warn!(
            "container_truncated",
            entry = entry.as_str(),
            reason = reason.as_str()
        );
    }
    if !bank.is_aligned() {
        trace_warn!(
            "template_count_mismatch",
            geometries = bank.num_geometries(),
            templates = bank.num_templates()
        );
    }
    trace_event!(
        "templates_loaded",
        geometries = report.geometries,
        signatures = report.signatures
    );

    report
}
