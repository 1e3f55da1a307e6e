//! Magazine CLI - Build, Batch and Variant Commands
//!
//! Commands: build, templates, prepare, build-all
//! Outputs JSON to stdout, logs to stderr
//! Exit codes: 0 success, 1 fatal error or bad arguments, 2 some batch
//! variants failed

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;

use magazine_composer::{
    export::base_name,
    hashing::compute_plan_hash,
    plan::PlanDocument,
    variants::{self, TemplateCatalog, VariantGenerator},
    BuildError, BuildManifest, ExportError, ExportPreset, Exporter, FontSource, FsHost,
    MagazineBuilder, Plan, PlanError, Session, TemplateLibrary,
};

#[derive(Parser)]
#[command(name = "magazine-cli")]
#[command(about = "Magazine Composer - assemble print magazines from content plans")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Base directory for image paths in plans
    #[arg(short, long, default_value = ".", global = true)]
    project_root: PathBuf,

    /// Template library [default: <project-root>/templates]
    #[arg(short, long, global = true)]
    templates_dir: Option<PathBuf>,

    /// TrueType font embedded in exported PDFs [default: Helvetica, or an
    /// installed Unicode font when the text needs one]
    #[arg(long, global = true)]
    font: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and export one plan
    Build {
        /// Plan file
        #[arg(env = "MAGAZINE_PLAN_PATH")]
        plan: PathBuf,
    },

    /// List template files in the library
    Templates,

    /// Generate plan variants from a brief
    Prepare {
        /// Brief (CSV with a header row, or a JSON array of rows)
        #[arg(short, long, default_value = "input/client_brief.csv")]
        brief: PathBuf,

        /// Number of variants
        #[arg(short, long, default_value_t = 5)]
        count: u32,

        /// Template style
        #[arg(short, long, default_value = "fashion")]
        style: String,

        /// Template catalog
        #[arg(long, default_value = "config/templates_config.json")]
        catalog: PathBuf,

        /// Where variant_<n>/ directories are written
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Build every variant_<n>/plan.json under a directory
    BuildAll {
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },
}

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] std::io::Error),

    #[error("Plan hash error: {0}")]
    Hash(#[from] serde_json::Error),
}

fn build_plan(
    session: &Session<'_>,
    preset: &ExportPreset,
    plan_path: &Path,
) -> Result<BuildManifest, RunError> {
    let plan_doc = PlanDocument::load(plan_path)?;
    let plan_hash = compute_plan_hash(&plan_doc)?;
    let plan = Plan::from_document(plan_doc);

    let build = MagazineBuilder::new(session).build(&plan)?;

    let output_dir = match plan_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let project_name = plan.project_name.as_deref();
    let artifacts = Exporter::new(session.host())
        .with_preset(preset.clone())
        .export(&build.document, &output_dir, project_name)?;

    Ok(BuildManifest::new(
        base_name(project_name),
        plan_hash,
        build.document.page_count(),
        build.report,
        &artifacts,
    )?)
}

fn print_json(value: &serde_json::Value, pretty: bool) {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match text {
        Ok(text) => println!("{}", text),
        Err(e) => error!("Cannot serialize output: {}", e),
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => e.exit(),
            _ => {
                let _ = e.print();
                print_json(&serde_json::json!({ "success": false, "error": e.kind().to_string() }), false);
                return ExitCode::FAILURE;
            }
        },
    };

    let host = FsHost::new();
    let templates_dir = cli
        .templates_dir
        .clone()
        .unwrap_or_else(|| cli.project_root.join("templates"));
    let session = Session::new(&host, TemplateLibrary::new(templates_dir), &cli.project_root);
    let preset = match &cli.font {
        Some(font) => ExportPreset::high_quality_print().with_font(FontSource::new(font)),
        None => ExportPreset::high_quality_print(),
    };

    match cli.command {
        Commands::Build { plan } => match build_plan(&session, &preset, &plan) {
            Ok(manifest) => {
                print_json(&serde_json::json!({ "success": true, "manifest": manifest }), true);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("Build failed: {}", e);
                print_json(&serde_json::json!({ "success": false, "error": e.to_string() }), false);
                ExitCode::FAILURE
            }
        },

        Commands::Templates => match session.templates().list() {
            Ok(names) => {
                print_json(&serde_json::json!(names), true);
                ExitCode::SUCCESS
            }
            Err(e) => {
                print_json(
                    &serde_json::json!({ "error": format!("Failed to list templates: {}", e) }),
                    false,
                );
                ExitCode::FAILURE
            }
        },

        Commands::Prepare { brief, count, style, catalog, output } => {
            let result = TemplateCatalog::load_or_default(&catalog).and_then(|catalog| {
                let rows = variants::load_brief(&brief)?;
                info!("Loaded {} brief rows from {}", rows.len(), brief.display());
                VariantGenerator::new(catalog).generate_all(&rows, count, &style, &output)
            });
            match result {
                Ok(written) => {
                    print_json(&serde_json::json!({ "success": true, "variants": written }), true);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    print_json(&serde_json::json!({ "success": false, "error": e.to_string() }), false);
                    ExitCode::FAILURE
                }
            }
        }

        Commands::BuildAll { output } => {
            let found = match variants::discover_variants(&output) {
                Ok(found) => found,
                Err(e) => {
                    print_json(&serde_json::json!({ "success": false, "error": e.to_string() }), false);
                    return ExitCode::FAILURE;
                }
            };
            if found.is_empty() {
                let message = format!("No variant_<n>/plan.json found under {}", output.display());
                error!("{}", message);
                print_json(&serde_json::json!({ "success": false, "error": message }), false);
                return ExitCode::FAILURE;
            }

            let mut results = vec![];
            for variant in &found {
                info!("Building variant {} ({})", variant.number, variant.plan.display());
                let outcome = match build_plan(&session, &preset, &variant.plan) {
                    Ok(manifest) => serde_json::json!({
                        "variant": variant.number,
                        "success": true,
                        "pages": manifest.page_count,
                        "artifacts": manifest.artifacts,
                    }),
                    Err(e) => {
                        error!("Variant {} failed: {}", variant.number, e);
                        serde_json::json!({
                            "variant": variant.number,
                            "success": false,
                            "error": e.to_string(),
                        })
                    }
                };
                results.push(outcome);
            }

            let failed = results.iter().filter(|r| r["success"] == false).count();
            info!("{}/{} variants built", results.len() - failed, results.len());
            print_json(
                &serde_json::json!({
                    "total": results.len(),
                    "failed": failed,
                    "results": results,
                }),
                true,
            );
            if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
    }
}
