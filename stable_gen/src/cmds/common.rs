/* Common utilities shared between the analyze and codegen commands */

use crate::model::bound::BoundType;
use crate::model::passes::{PassContext, PassError, Pipeline, process_order};
use indexmap::IndexMap;
use stable_loader::SchemaSet;
use std::path::PathBuf;

/* Everything a command needs after loading and resolving: the schema set,
   the dependency-safe processing order, the bound types, and the per-type
   failures (which abort only the affected type) */
pub struct ResolvedSet {
  pub schemas: SchemaSet,
  pub order: Vec<String>,
  pub bound: IndexMap<String, BoundType>,
  pub failures: Vec<(String, PassError)>,
}

pub fn load_and_resolve(
  files: &[PathBuf],
  include_dirs: &[PathBuf],
  verbose: bool,
) -> anyhow::Result<ResolvedSet> {
  let mut schemas = SchemaSet::new(include_dirs.to_vec());
  for file in files {
    schemas.load_file_with_imports(file, verbose)?;
  }

  if verbose {
    println!(
      "\n[~] Loaded {} file(s) total (including imports)",
      schemas.loaded_file_count()
    );
    println!("[~] Packages loaded:");
    for package in schemas.packages() {
      println!("    - {}", package);
    }
  }

  let ctx = PassContext::new(schemas.all_types())
    .map_err(|e| anyhow::anyhow!("Schema conflict: {}", e))?;
  let order = process_order(&ctx);
  let pipeline = Pipeline::standard();

  if verbose {
    println!("\n[~] Running passes: {}", pipeline.pass_names().join(" -> "));
  }

  let mut bound = IndexMap::new();
  let mut failures = Vec::new();

  for name in &order {
    let decl = ctx.decl(name).expect("name from processing order");
    match pipeline.run(&ctx, decl) {
      Ok(Some(ty)) => {
        if verbose {
          if ty.printable {
            println!("[✓] {}", name);
          } else {
            let reason = ty.unprintable_reason.as_deref().unwrap_or("not wire-mappable");
            println!("[!] {} skipped: {}", name, reason);
          }
        }
        bound.insert(name.clone(), ty);
      }
      Ok(None) => {
        if verbose {
          println!("[~] {} ignored by directive", name);
        }
      }
      Err(e) => {
        println!("[✗] {}: {}", name, e);
        failures.push((name.clone(), e));
      }
    }
  }

  Ok(ResolvedSet {
    schemas,
    order,
    bound,
    failures,
  })
}
