//! `lslc`: thin CLI wrapping the transpile facade and bundle pipeline.

use clap::{CommandFactory, Parser, Subcommand};
use lsl_runtime::bundle;
use lsl_runtime::codegen::GenOptions;
use lsl_runtime::facade;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lslc", about = "LSL-to-TSL transpiler", disable_help_subcommand = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Transpile a single LSL source file to TSL.
    Transpile {
        path: PathBuf,
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
        #[arg(short = 'c', long = "class-name")]
        class_name: Option<String>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        source_comments: bool,
        #[arg(short = 'q', long)]
        quiet: bool,
    },
    /// Transpile every script bound in a scene manifest.
    Bundle {
        manifest: PathBuf,
        #[arg(short = 's', long = "source-dir")]
        source_dir: Option<PathBuf>,
        #[arg(short = 'o', long = "out-dir")]
        out_dir: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    simple_logger::init_with_level(log::Level::Warn).ok();
    let cli = Cli::parse();

    match cli.command {
        None => {
            eprintln!("{}", Cli::command().render_help());
            ExitCode::from(0)
        }
        Some(Command::Transpile { path, output, class_name, json, source_comments, quiet }) => {
            run_transpile(path, output, class_name, json, source_comments, quiet)
        }
        Some(Command::Bundle { manifest, source_dir, out_dir, json }) => run_bundle(manifest, source_dir, out_dir, json),
    }
}

fn run_transpile(path: PathBuf, output: Option<PathBuf>, class_name: Option<String>, json: bool, source_comments: bool, quiet: bool) -> ExitCode {
    let source = match fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading {}: {e}", path.display());
            return ExitCode::from(1);
        }
    };

    let options = GenOptions {
        class_name,
        source_comment: source_comments.then(|| path.display().to_string()),
    };
    let result = facade::transpile(&source, &options);

    if json {
        let body = serde_json::json!({
            "code": result.code,
            "success": result.success,
            "className": result.class_name,
            "diagnostics": result.diagnostics.iter().map(|d| serde_json::json!({
                "severity": format!("{:?}", d.severity),
                "message": d.message,
            })).collect::<Vec<_>>(),
        });
        println!("{body}");
    } else if !quiet {
        for d in &result.diagnostics {
            eprintln!("{:?}: {}", d.severity, d.message);
        }
    }

    if let Some(out_path) = &output {
        if let Err(e) = fs::write(out_path, &result.code) {
            eprintln!("error writing {}: {e}", out_path.display());
            return ExitCode::from(1);
        }
    } else if !json && !quiet {
        println!("{}", result.code);
    }

    if result.success {
        ExitCode::from(0)
    } else {
        ExitCode::from(1)
    }
}

fn run_bundle(manifest_path: PathBuf, source_dir: Option<PathBuf>, out_dir: Option<PathBuf>, json: bool) -> ExitCode {
    let manifest_json = match fs::read_to_string(&manifest_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error reading {}: {e}", manifest_path.display());
            return ExitCode::from(2);
        }
    };

    let parsed = match bundle::parse_manifest(&manifest_json) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("invalid manifest JSON: {e}");
            return ExitCode::from(2);
        }
    };

    let base_dir = source_dir.unwrap_or_else(|| manifest_path.parent().map(PathBuf::from).unwrap_or_default());
    let mut sources = std::collections::HashMap::new();
    for script in &parsed.scripts {
        if let Ok(text) = fs::read_to_string(base_dir.join(&script.asset_path)) {
            sources.insert(script.asset_path.clone(), text);
        }
    }

    let transpiled = bundle::transpile_bundle(&parsed, &sources);

    if let Some(out_dir) = &out_dir {
        let _ = fs::create_dir_all(out_dir);
        for script in &transpiled.scripts {
            if script.success {
                let _ = fs::write(out_dir.join(format!("{}.tsl.js", script.class_name)), &script.code);
            }
        }
    }

    if json {
        let body = serde_json::json!({
            "successCount": transpiled.success_count,
            "failureCount": transpiled.failure_count,
            "scripts": transpiled.scripts.iter().map(|s| serde_json::json!({
                "objectId": s.object_id,
                "scriptName": s.script_name,
                "className": s.class_name,
                "success": s.success,
            })).collect::<Vec<_>>(),
        });
        println!("{body}");
    }

    if transpiled.failure_count > 0 {
        ExitCode::from(1)
    } else {
        ExitCode::from(0)
    }
}
