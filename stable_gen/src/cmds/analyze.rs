/* Analyze command - resolve schemas and report without writing output */

use crate::cmds::common::load_and_resolve;
use crate::codegen::generate_body;
use clap::ValueEnum;
use std::path::PathBuf;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum IrOutputFormat {
  #[default]
  Json,
  Debug,
}

pub fn run(
  files: Vec<PathBuf>,
  include_dirs: Vec<PathBuf>,
  print_encode: Option<String>,
  print_size: Option<String>,
  ir_format: IrOutputFormat,
) -> anyhow::Result<()> {
  let resolved = load_and_resolve(&files, &include_dirs, true)?;

  println!("\n[~] Resolution Results:");
  println!("=======================");
  for name in &resolved.order {
    match resolved.bound.get(name) {
      Some(ty) => {
        let mode = match (&ty.versioned, ty.printable) {
          (_, false) => format!(
            "unprintable ({})",
            ty.unprintable_reason.as_deref().unwrap_or("no wire mapping")
          ),
          (Some(d), true) => format!("versioned, current '{}'", d.current),
          (None, true) => "printable".to_string(),
        };
        println!("  - {}: {}", name, mode);
      }
      None => println!("  - {}: ignored or failed", name),
    }
  }

  if let Some(type_name) = print_encode {
    let ty = resolved
      .bound
      .get(&type_name)
      .ok_or_else(|| anyhow::anyhow!("Type '{}' not found or not bound", type_name))?;
    let body = generate_body(ty);
    println!("\n[~] Encode instructions for '{}':", type_name);
    match ir_format {
      IrOutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body.encode)?),
      IrOutputFormat::Debug => println!("{:#?}", body.encode),
    }
  }

  if let Some(type_name) = print_size {
    let ty = resolved
      .bound
      .get(&type_name)
      .ok_or_else(|| anyhow::anyhow!("Type '{}' not found or not bound", type_name))?;
    let body = generate_body(ty);
    println!("\n[~] Size terms for '{}':", type_name);
    match ir_format {
      IrOutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body.size)?),
      IrOutputFormat::Debug => println!("{:#?}", body.size),
    }
  }

  if !resolved.failures.is_empty() {
    anyhow::bail!("{} type(s) failed resolution", resolved.failures.len());
  }

  Ok(())
}
