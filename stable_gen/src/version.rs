/* Versioning subsystem: per-type version history across regenerations.
 *
 * State machine per versioned record type and run:
 *   discover prior manifest -> extract recorded history -> freeze the last
 *   unversioned bodies as `legacy` when no history exists -> resolve the
 *   declared current identifier to an index (appending it if new) -> emit
 *   per-version routines, the dispatchers, and the accessors.
 *
 * Recorded history is append-only. Historical bodies render verbatim from
 * their frozen instruction streams; only the current version is freshly
 * generated.
 */

use crate::codegen::{render_encode_fn, render_size_fn, sanitize_version_id};
use crate::model::bound::BoundType;
use crate::model::passes::escape_keyword;
use stable_loader::manifest::{FrozenBody, TypeManifest, VersionEntry, VersionManifest};
use std::fmt::Write;
use thiserror::Error;

pub const LEGACY_VERSION_ID: &str = "legacy";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
  #[error("type '{type_name}': version id '{id}' is recorded more than once")]
  DuplicateRecorded { type_name: String, id: String },

  #[error(
    "type '{type_name}': declared current version '{id}' is recorded at index {index}, \
     but only the most recent entry can be current"
  )]
  CurrentNotLast {
    type_name: String,
    id: String,
    index: usize,
  },

  #[error("type '{type_name}': recorded version history would be removed or reordered")]
  HistoryRewritten { type_name: String },
}

/* One dispatch slot; `frozen` is None for the slot regenerated this run */
#[derive(Debug, Clone, PartialEq)]
pub struct VersionSlot {
  pub id: String,
  pub frozen: Option<FrozenBody>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VersionPlan {
  pub slots: Vec<VersionSlot>,
  pub current_index: usize,
}

impl VersionPlan {
  pub fn max_index(&self) -> usize {
    self.slots.len() - 1
  }
}

/* Resolve a type's dispatch plan from its prior manifest entry */
pub fn plan_versions(
  type_name: &str,
  current_id: &str,
  prior: Option<&TypeManifest>,
) -> Result<VersionPlan, VersionError> {
  let mut slots: Vec<VersionSlot> = Vec::new();

  if let Some(prior) = prior {
    for entry in &prior.versions {
      if slots.iter().any(|s| s.id == entry.id) {
        return Err(VersionError::DuplicateRecorded {
          type_name: type_name.to_string(),
          id: entry.id.clone(),
        });
      }
      slots.push(VersionSlot {
        id: entry.id.clone(),
        frozen: Some(entry.body.clone()),
      });
    }

    /* No recorded history, but the type was generated unversioned before:
       freeze those bodies as version index 0 */
    if slots.is_empty() {
      if let Some(current) = &prior.current {
        slots.push(VersionSlot {
          id: LEGACY_VERSION_ID.to_string(),
          frozen: Some(current.clone()),
        });
      }
    }
  }

  let current_index = match slots.iter().position(|s| s.id == current_id) {
    Some(index) if index + 1 == slots.len() => {
      /* Declared current is the most recent entry: regenerate it fresh */
      slots[index].frozen = None;
      index
    }
    Some(index) => {
      return Err(VersionError::CurrentNotLast {
        type_name: type_name.to_string(),
        id: current_id.to_string(),
        index,
      });
    }
    None => {
      slots.push(VersionSlot {
        id: current_id.to_string(),
        frozen: None,
      });
      slots.len() - 1
    }
  };

  Ok(VersionPlan {
    slots,
    current_index,
  })
}

/* Render the full impl block of a versioned type: one routine pair per
   slot plus the dispatchers and accessors. `bodies[i]` is slot i's final
   body (frozen, or freshly generated for the current slot). */
pub fn render_versioned_impl(ty: &BoundType, plan: &VersionPlan, bodies: &[FrozenBody]) -> String {
  let directive = ty.versioned.as_ref().expect("versioned type");
  let mut out = String::new();

  let ids: Vec<&str> = plan.slots.iter().map(|s| s.id.as_str()).collect();
  writeln!(out, "/* version history: {} (current: {}) */", ids.join(", "), directive.current)
    .unwrap();
  writeln!(out, "impl {} {{", ty.name).unwrap();

  out.push_str(&render_bytes_dispatcher(plan));
  out.push('\n');
  out.push_str(&render_size_dispatcher(plan));
  out.push('\n');
  out.push_str(&render_accessors(&directive.version_field, plan));

  for (slot, body) in plan.slots.iter().zip(bodies) {
    out.push('\n');
    out.push_str(&render_encode_fn(&slot.id, &body.encode));
    out.push('\n');
    out.push_str(&render_size_fn(&slot.id, &body.size));
  }

  out.push_str("}\n");
  out
}

fn render_bytes_dispatcher(plan: &VersionPlan) -> String {
  let mut out = String::new();
  out.push_str("    pub fn stable_bytes(&self) -> Result<Vec<u8>, stable_wire::WireError> {\n");
  out.push_str("        match self.stable_version() {\n");
  for (index, slot) in plan.slots.iter().enumerate() {
    writeln!(
      out,
      "            {} => self.stable_bytes_{}(),",
      index,
      sanitize_version_id(&slot.id)
    )
    .unwrap();
  }
  out.push_str(
    "            _ => Err(stable_wire::WireError::UnknownVersion(self.stable_version())),\n",
  );
  out.push_str("        }\n");
  out.push_str("    }\n");
  out
}

/* Size cannot fail; an out-of-range stored index falls back to the
   default version's size */
fn render_size_dispatcher(plan: &VersionPlan) -> String {
  let default_sfx = sanitize_version_id(&plan.slots[plan.current_index].id);
  let mut out = String::new();
  out.push_str("    pub fn stable_size(&self) -> usize {\n");
  out.push_str("        match self.stable_version() {\n");
  for (index, slot) in plan.slots.iter().enumerate() {
    writeln!(
      out,
      "            {} => self.stable_size_{}(),",
      index,
      sanitize_version_id(&slot.id)
    )
    .unwrap();
  }
  writeln!(out, "            _ => self.stable_size_{}(),", default_sfx).unwrap();
  out.push_str("        }\n");
  out.push_str("    }\n");
  out
}

fn render_accessors(version_field: &str, plan: &VersionPlan) -> String {
  let mut out = String::new();
  out.push_str("    pub fn stable_version(&self) -> usize {\n");
  writeln!(out, "        self.{} as usize", escape_keyword(version_field)).unwrap();
  out.push_str("    }\n\n");
  out.push_str("    pub fn stable_max_version() -> usize {\n");
  writeln!(out, "        {}", plan.max_index()).unwrap();
  out.push_str("    }\n\n");
  out.push_str("    pub fn stable_default_version() -> usize {\n");
  writeln!(out, "        {}", plan.current_index).unwrap();
  out.push_str("    }\n");
  out
}

/* Manifest entry for a versioned type after this run */
pub fn manifest_entry_versioned(
  type_name: &str,
  plan: &VersionPlan,
  bodies: &[FrozenBody],
) -> TypeManifest {
  TypeManifest {
    name: type_name.to_string(),
    versions: plan
      .slots
      .iter()
      .zip(bodies)
      .map(|(slot, body)| VersionEntry {
        id: slot.id.clone(),
        body: body.clone(),
      })
      .collect(),
    current: None,
  }
}

/* Manifest entry for a printable, unversioned record: its current bodies
   seed a later `legacy` freeze */
pub fn manifest_entry_plain(type_name: &str, body: FrozenBody) -> TypeManifest {
  TypeManifest {
    name: type_name.to_string(),
    versions: Vec::new(),
    current: Some(body),
  }
}

/* Merge this run's entries over the prior manifest. Entries for types no
   longer in the schema are carried forward untouched; recorded version
   ids must survive as a prefix of the new list. */
pub fn merge_manifest(
  old: Option<&VersionManifest>,
  entries: Vec<TypeManifest>,
) -> Result<VersionManifest, VersionError> {
  let mut merged = old.cloned().unwrap_or_default();

  for entry in entries {
    if let Some(prev) = merged.get_type(&entry.name) {
      let prev_ids = prev.version_ids();
      let new_ids = entry.version_ids();
      let preserved =
        new_ids.len() >= prev_ids.len() && new_ids[..prev_ids.len()] == prev_ids[..];
      if !prev_ids.is_empty() && !preserved {
        return Err(VersionError::HistoryRewritten {
          type_name: entry.name.clone(),
        });
      }
    }
    merged.upsert_type(entry);
  }

  Ok(merged)
}
