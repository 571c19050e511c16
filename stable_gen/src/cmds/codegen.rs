/* Codegen command - generate stable codec routines from schema files */

use crate::cmds::common::load_and_resolve;
use crate::codegen::{generate_body, render_encode_fn, render_plain_impl, render_size_fn, render_type_test};
use crate::model::bound::BoundType;
use crate::version::{
  VersionError, manifest_entry_plain, manifest_entry_versioned, merge_manifest, plan_versions,
  render_versioned_impl,
};
use indexmap::IndexMap;
use stable_loader::manifest::{FrozenBody, TypeManifest, VersionManifest};
use std::fmt::Write as _;
use std::path::PathBuf;

const GENERATED_HEADER: &str = "// Code generated by stable-gen. DO NOT EDIT.\n";

/* Execute the codegen command */
pub fn run(
  files: Vec<PathBuf>,
  include_dirs: Vec<PathBuf>,
  output_dir: PathBuf,
  manifest_path: Option<PathBuf>,
  emit_tests: bool,
  verbose: bool,
) -> anyhow::Result<()> {
  if verbose {
    println!("Stable Codec Generator");
    println!("======================\n");
    println!("[~] Configuration:");
    println!("  Output directory: {}", output_dir.display());
    println!("  Input files: {}", files.len());
    for file in &files {
      println!("    - {}", file.display());
    }
    if !include_dirs.is_empty() {
      println!("  Include directories: {}", include_dirs.len());
      for dir in &include_dirs {
        println!("    - {}", dir.display());
      }
    }
    println!();
  }

  let resolved = load_and_resolve(&files, &include_dirs, verbose)?;

  let manifest_path =
    manifest_path.unwrap_or_else(|| output_dir.join("stable_manifest.yaml"));
  let prior = VersionManifest::load(&manifest_path)?;
  if verbose {
    match &prior {
      Some(m) => println!("\n[~] Prior manifest: {} type(s) recorded", m.types.len()),
      None => println!("\n[~] No prior manifest; first generation"),
    }
  }

  let mut failures: Vec<(String, String)> = resolved
    .failures
    .iter()
    .map(|(name, e)| (name.clone(), e.to_string()))
    .collect();

  /* Group printable record types by package, preserving processing order */
  let mut by_package: IndexMap<String, Vec<&BoundType>> = IndexMap::new();
  for name in &resolved.order {
    let Some(ty) = resolved.bound.get(name) else { continue };
    if !ty.generates_impl() {
      continue;
    }
    let package = resolved
      .schemas
      .package_for_type(name)
      .unwrap_or("default")
      .to_string();
    by_package.entry(package).or_default().push(ty);
  }

  std::fs::create_dir_all(&output_dir)?;

  let mut entries: Vec<TypeManifest> = Vec::new();

  for (package, types) in &by_package {
    let package_dir = output_dir.join(package.replace('.', "/"));
    std::fs::create_dir_all(&package_dir)?;

    if verbose {
      println!("\n[~] Generating package '{}' in {}", package, package_dir.display());
    }

    let mut code = String::from(GENERATED_HEADER);
    code.push('\n');
    let mut tests_src = String::from(GENERATED_HEADER);
    tests_src.push_str("\nuse super::*;\n");

    let mut generated = 0usize;
    for ty in types {
      match emit_type(ty, prior.as_ref().and_then(|m| m.get_type(&ty.name))) {
        Ok((impl_text, entry)) => {
          code.push_str(&impl_text);
          code.push('\n');
          entries.push(entry);
          if emit_tests {
            tests_src.push('\n');
            tests_src.push_str(&render_type_test(&ty.name));
          }
          generated += 1;
          if verbose {
            println!("[✓] {}", ty.name);
          }
        }
        Err(e) => {
          println!("[✗] {}: {}", ty.name, e);
          failures.push((ty.name.clone(), e.to_string()));
        }
      }
    }

    if generated == 0 {
      continue;
    }

    std::fs::write(package_dir.join("codec.rs"), &code)?;
    let mut mod_content = String::from("pub mod codec;\n");
    if emit_tests {
      std::fs::write(package_dir.join("codec_tests.rs"), &tests_src)?;
      mod_content.push_str("#[cfg(test)]\nmod codec_tests;\n");
    }
    std::fs::write(package_dir.join("mod.rs"), mod_content)?;

    if verbose {
      println!("[✓] Wrote {}/codec.rs", package_dir.display());
    }
  }

  let merged = merge_manifest(prior.as_ref(), entries)?;
  merged.save(&manifest_path)?;
  if verbose {
    println!("\n[✓] Wrote manifest {}", manifest_path.display());
  }

  if !failures.is_empty() {
    let mut summary = String::new();
    for (name, reason) in &failures {
      write!(summary, "\n  - {}: {}", name, reason).unwrap();
    }
    anyhow::bail!("{} type(s) failed generation:{}", failures.len(), summary);
  }

  println!("[✓] Code generation complete!");
  Ok(())
}

/* Generate one type's impl block and its manifest entry. Failures here are
   fatal to this type only; the run continues for others. */
pub fn emit_type(
  ty: &BoundType,
  prior_entry: Option<&TypeManifest>,
) -> Result<(String, TypeManifest), VersionError> {
  match &ty.versioned {
    Some(directive) => {
      let plan = plan_versions(&ty.name, &directive.current, prior_entry)?;
      let bodies: Vec<FrozenBody> = plan
        .slots
        .iter()
        .map(|slot| slot.frozen.clone().unwrap_or_else(|| generate_body(ty)))
        .collect();
      let text = render_versioned_impl(ty, &plan, &bodies);
      let entry = manifest_entry_versioned(&ty.name, &plan, &bodies);
      Ok((text, entry))
    }
    None => {
      /* Recorded history cannot be dropped by un-declaring versioning */
      if prior_entry.is_some_and(|p| !p.versions.is_empty()) {
        return Err(VersionError::HistoryRewritten {
          type_name: ty.name.clone(),
        });
      }
      let body = generate_body(ty);
      let text = render_plain_impl(
        &ty.name,
        &[
          render_encode_fn("", &body.encode),
          render_size_fn("", &body.size),
        ],
      );
      let entry = manifest_entry_plain(&ty.name, body);
      Ok((text, entry))
    }
  }
}
