// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Turntable sheet generator.
// Run with: turntable <command> --help

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about = "Render eight-view turntable sheets of 3D models")]
struct Cli {
    /// Configuration file. Defaults to ./Turntable.toml when present.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one model into a sheet.
    Render {
        /// A .glb, .gltf or .obj file.
        model: PathBuf,
        /// Sheet path. Defaults to {model_dir}/{model}_eight_views.jpg.
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Square size of each view.
        #[arg(short, long)]
        resolution: Option<u32>,
        /// Keep the per-view images.
        #[arg(short, long)]
        keep_temp: bool,
    },
    /// Render every model under a directory.
    Batch {
        /// Directory scanned recursively.
        directory: PathBuf,
        /// Directory for sheets. Defaults to each model's directory.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Square size of each view.
        #[arg(short, long)]
        resolution: Option<u32>,
        /// Keep the per-view images.
        #[arg(short, long)]
        keep_temp: bool,
        /// Models processed concurrently.
        #[arg(short = 'j', long)]
        workers: Option<usize>,
    },
    /// Convert an OBJ model to GLB.
    Convert {
        /// The .obj file.
        obj: PathBuf,
        /// GLB path. Defaults to the input with a .glb extension.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the bounds, cameras and lights derived for a model as JSON.
    Rig {
        /// A .glb, .gltf or .obj file.
        model: PathBuf,
    },
}

fn main() -> ExitCode {
    use env_logger::{Builder, Env};

    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    Builder::from_env(Env::default().default_filter_or(default_level)).init();

    match commands::execute(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_batch_flags() {
        let cli = Cli::try_parse_from([
            "turntable", "batch", "models", "-o", "sheets", "-r", "512", "-k", "-j", "4",
        ])
        .unwrap();
        match cli.command {
            Command::Batch {
                directory,
                output_dir,
                resolution,
                keep_temp,
                workers,
            } => {
                assert_eq!(directory, PathBuf::from("models"));
                assert_eq!(output_dir, Some(PathBuf::from("sheets")));
                assert_eq!(resolution, Some(512));
                assert!(keep_temp);
                assert_eq!(workers, Some(4));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["turntable", "rig", "chair.glb", "--config", "t.toml", "-v"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("t.toml")));
    }
}
