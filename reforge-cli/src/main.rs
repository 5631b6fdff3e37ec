//! `reforge`: a local stand-in for the pipeline's HTTP surface. Each subcommand calls exactly the
//! stage function a hosted handler would call.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reforge_common::{JoinDecompileThresholds, JoinDwarfTsThresholds, ReforgeConfig, Sha256Hex};
use reforge_join::{OriginMap, TuInput};

#[derive(Parser)]
#[command(name = "reforge", about = "Reverse-engineering extraction and join pipeline")]
struct Cli {
    #[command(subcommand)]
    command: StageCommand,
}

#[derive(Subcommand)]
enum StageCommand {
    /// Builds the 12-cell compile/link/strip matrix from a source directory.
    Build {
        /// Directory containing the `.c`/`.h` translation units.
        source_dir: PathBuf,
        /// Directory the build receipt and per-cell artifacts are written to.
        output_dir: PathBuf,
    },
    /// Runs the DWARF oracle over one ELF binary.
    DwarfOracle {
        /// Path to the binary with debug info.
        binary_path: PathBuf,
        /// Path the DWARF report JSON is written to.
        output_path: PathBuf,
    },
    /// Runs the tree-sitter oracle over one preprocessed translation unit.
    TsOracle {
        /// Path to the preprocessed `.i` file.
        tu_path: PathBuf,
        /// Path the tree-sitter report JSON is written to.
        output_path: PathBuf,
    },
    /// Joins a DWARF report against one or more tree-sitter reports.
    JoinDwarfTs {
        /// Path to the DWARF oracle's report JSON.
        dwarf_report_path: PathBuf,
        /// Paths to `(preprocessed .i file, ts-oracle report JSON)` pairs, `i_file:report_json`.
        #[arg(value_delimiter = ',')]
        tu_pairs: Vec<String>,
        /// Path the join report JSON is written to.
        output_path: PathBuf,
    },
    /// Joins a DWARF report and a decompiler NDJSON dump by address overlap.
    JoinOraclesDecompile {
        /// Path to the DWARF oracle's report JSON.
        dwarf_report_path: PathBuf,
        /// Path to the decompiler's raw newline-delimited JSON dump.
        decompile_ndjson_path: PathBuf,
        /// Path to the DWARF-to-tree-sitter join report JSON for the same binary.
        dwarf_ts_report_path: PathBuf,
        /// The binary's sha256, cross-checked against all three inputs.
        binary_sha256: String,
        /// Path the join report JSON is written to.
        output_path: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    tracing::info!("starting reforge stage");
    match cli.command {
        StageCommand::Build {
            source_dir,
            output_dir,
        } => run_build(&source_dir, &output_dir),
        StageCommand::DwarfOracle {
            binary_path,
            output_path,
        } => run_dwarf_oracle(&binary_path, &output_path),
        StageCommand::TsOracle {
            tu_path,
            output_path,
        } => run_ts_oracle(&tu_path, &output_path),
        StageCommand::JoinDwarfTs {
            dwarf_report_path,
            tu_pairs,
            output_path,
        } => run_join_dwarf_ts(&dwarf_report_path, &tu_pairs, &output_path),
        StageCommand::JoinOraclesDecompile {
            dwarf_report_path,
            decompile_ndjson_path,
            dwarf_ts_report_path,
            binary_sha256,
            output_path,
        } => run_join_oracles_decompile(
            &dwarf_report_path,
            &decompile_ndjson_path,
            &dwarf_ts_report_path,
            &binary_sha256,
            &output_path,
        ),
    }
}

fn collect_source_files(source_dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    let mut files = Vec::new();
    for entry in walkdir::WalkDir::new(source_dir) {
        let entry = entry.context("failed to walk source directory")?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_source = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == "c" || ext == "h");
        if !is_source {
            continue;
        }
        let relative_path = path
            .strip_prefix(source_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;
        files.push((relative_path, bytes));
    }
    Ok(files)
}

fn run_build(source_dir: &Path, output_dir: &Path) -> Result<()> {
    let files = collect_source_files(source_dir)?;
    let snapshot = reforge_builder::SourceSnapshot::from_files(files)
        .context("failed to build source snapshot")?;
    let profile = reforge_builder::BuildProfile::synthetic_default();
    let config = ReforgeConfig::default();

    let binary_name = output_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "job".to_string());

    let receipt = reforge_builder::run_job(&snapshot, &profile, &config, output_dir, &binary_name)
        .context("build job failed")?;

    let receipt_path = output_dir.join("build_receipt.json");
    reforge_common::write_json_atomic(&receipt_path, &receipt)
        .context("failed to write build receipt")?;

    println!("wrote {}", receipt_path.display());
    Ok(())
}

fn run_dwarf_oracle(binary_path: &Path, output_path: &Path) -> Result<()> {
    let data = std::fs::read(binary_path)
        .with_context(|| format!("failed to read binary at {}", binary_path.display()))?;
    let config = ReforgeConfig::default();

    let report = reforge_dwarf_oracle::run(
        &data,
        &config.profile_id,
        &config.dwarf,
        &config.excluded_prefixes,
    )
    .context("DWARF oracle failed")?;

    reforge_common::write_json_atomic(output_path, &report)
        .context("failed to write DWARF report")?;
    println!("wrote {}", output_path.display());
    Ok(())
}

fn run_ts_oracle(tu_path: &Path, output_path: &Path) -> Result<()> {
    let source = std::fs::read(tu_path)
        .with_context(|| format!("failed to read translation unit {}", tu_path.display()))?;
    let config = ReforgeConfig::default();

    let label = tu_path.to_string_lossy();
    let report = reforge_ts_oracle::run_tu(&label, &source, &config.ts);

    reforge_common::write_json_atomic(output_path, &report)
        .context("failed to write tree-sitter report")?;
    println!("wrote {}", output_path.display());
    Ok(())
}

fn run_join_dwarf_ts(
    dwarf_report_path: &Path,
    tu_pairs: &[String],
    output_path: &Path,
) -> Result<()> {
    let dwarf_report: reforge_dwarf_oracle::DwarfReport = serde_json::from_slice(
        &std::fs::read(dwarf_report_path)
            .with_context(|| format!("failed to read {}", dwarf_report_path.display()))?,
    )
    .context("failed to parse DWARF report")?;

    let config = ReforgeConfig::default();
    let mut origin_maps = Vec::new();
    let mut ts_reports = Vec::new();

    for pair in tu_pairs {
        let (i_path, report_path) = pair
            .split_once(':')
            .with_context(|| format!("malformed tu pair {pair}, expected i_file:report_json"))?;
        let i_text = std::fs::read_to_string(i_path)
            .with_context(|| format!("failed to read preprocessed file {i_path}"))?;
        let origin_map = OriginMap::build(&i_text, &config.excluded_prefixes);
        let ts_report: reforge_ts_oracle::TsTuReport = serde_json::from_slice(
            &std::fs::read(report_path)
                .with_context(|| format!("failed to read {report_path}"))?,
        )
        .context("failed to parse tree-sitter report")?;
        origin_maps.push(origin_map);
        ts_reports.push((i_path.to_string(), ts_report));
    }

    let tu_inputs: Vec<TuInput<'_>> = ts_reports
        .iter()
        .zip(origin_maps.iter())
        .map(|((tu_path, report), origin_map)| TuInput {
            tu_path: tu_path.clone(),
            report,
            origin_map: Some(origin_map),
        })
        .collect();

    let join_report = reforge_join::join_dwarf_to_ts(
        &dwarf_report,
        &config.profile_id,
        &tu_inputs,
        &JoinDwarfTsThresholds::default(),
    );

    reforge_common::write_json_atomic(output_path, &join_report)
        .context("failed to write DWARF-to-tree-sitter join report")?;
    println!("wrote {}", output_path.display());
    Ok(())
}

fn run_join_oracles_decompile(
    dwarf_report_path: &Path,
    decompile_ndjson_path: &Path,
    dwarf_ts_report_path: &Path,
    binary_sha256: &str,
    output_path: &Path,
) -> Result<()> {
    let config = ReforgeConfig::default();

    let dwarf_report: reforge_dwarf_oracle::DwarfReport = serde_json::from_slice(
        &std::fs::read(dwarf_report_path)
            .with_context(|| format!("failed to read {}", dwarf_report_path.display()))?,
    )
    .context("failed to parse DWARF report")?;

    let dwarf_ts_report: reforge_join::DwarfTsJoinReport = serde_json::from_slice(
        &std::fs::read(dwarf_ts_report_path)
            .with_context(|| format!("failed to read {}", dwarf_ts_report_path.display()))?,
    )
    .context("failed to parse DWARF-to-tree-sitter join report")?;

    let ndjson_text = std::fs::read_to_string(decompile_ndjson_path).with_context(|| {
        format!(
            "failed to read decompiler dump {}",
            decompile_ndjson_path.display()
        )
    })?;

    let hash = parse_sha256(binary_sha256)?;
    let decomp_report = reforge_decomp::run(hash, &config.profile_id, &ndjson_text)
        .context("failed to reshape decompiler output")?;

    let join_report = reforge_join::join_oracles_to_decompile(
        hash,
        &config.profile_id,
        &dwarf_report,
        &decomp_report,
        &dwarf_ts_report,
        &JoinDecompileThresholds::default(),
    )
    .context("oracle-to-decompiler join failed")?;

    reforge_common::write_json_atomic(output_path, &join_report)
        .context("failed to write oracle-to-decompiler join report")?;
    println!("wrote {}", output_path.display());
    Ok(())
}

fn parse_sha256(text: &str) -> Result<Sha256Hex> {
    if text.len() != 64 || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        anyhow::bail!("binary_sha256 must be a 64-character hex string, got {text}");
    }
    let mut bytes = [0u8; 32];
    for (i, chunk) in text.as_bytes().chunks(2).enumerate() {
        let hex = std::str::from_utf8(chunk).unwrap();
        bytes[i] = u8::from_str_radix(hex, 16)?;
    }
    Ok(Sha256Hex::from_bytes(bytes))
}
