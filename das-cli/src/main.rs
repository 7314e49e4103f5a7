//! `dastool`: converts OBJ/STL/glTF to DAS and inspects existing DAS files.

mod error;

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use das_format::model::{DasModel, Properties};

use crate::error::{CliError, Result};

#[derive(Parser)]
#[command(name = "dastool", author, version, about = "Convert OBJ/STL/glTF to DAS, or inspect a DAS file")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile an OBJ/STL/glTF file into a DAS container.
    Convert {
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        author: Option<String>,

        #[arg(long)]
        copyright: Option<String>,

        #[arg(long)]
        model: Option<String>,

        /// Write the DAS payload Huffman-compressed.
        #[arg(short = 'c', long)]
        compress: bool,

        /// Accepted for interface parity; curve/surface OBJ directives are
        /// never compiled either way.
        #[arg(long = "no-curves")]
        no_curves: bool,
    },
    /// Print a DAS file's properties and, with `-v`, its scene contents.
    List {
        input: PathBuf,

        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        log::error!("{err}");
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert {
            input,
            output,
            author,
            copyright,
            model,
            compress,
            no_curves: _,
        } => convert(&input, output.as_deref(), author, copyright, model, compress),
        Command::List { input, verbose } => list(&input, verbose),
    }
}

fn convert(
    input: &Path,
    output: Option<&Path>,
    author: Option<String>,
    copyright: Option<String>,
    model_name: Option<String>,
    compress: bool,
) -> Result<()> {
    let bytes = std::fs::read(input).map_err(|e| CliError::Io(e.to_string()))?;
    let extension = input.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let root_dir = input.parent().unwrap_or(Path::new("."));
    let path_str = input.display().to_string();

    let mut properties = Properties {
        model_name: model_name.unwrap_or_default(),
        author: author.unwrap_or_default(),
        copyright: copyright.unwrap_or_default(),
        ..Default::default()
    };
    properties.compression_flag = compress;

    let das_model = match extension.as_str() {
        "obj" => {
            let text = String::from_utf8_lossy(&bytes);
            let obj = das_obj::parse(&path_str, &text)?;
            das_obj::compile(&obj, &path_str, properties)?
        }
        "stl" => {
            let stl = das_stl::parse(&path_str, &bytes)?;
            das_stl::compile(&stl, &path_str, properties)?
        }
        "gltf" => {
            let text = String::from_utf8_lossy(&bytes);
            let json = das_gltf::parse_json(&path_str, &text)?;
            let root = das_gltf::lower_root(&path_str, &json)?;
            das_gltf::compile(&path_str, root_dir, &root, properties)?
        }
        other => return Err(CliError::UnsupportedExtension(other.to_string())),
    };

    let out_path = output.map(PathBuf::from).unwrap_or_else(|| input.with_extension("das"));
    let bytes = das_format::write_model(&das_model);
    std::fs::write(&out_path, bytes).map_err(|e| CliError::Io(e.to_string()))?;
    log::info!("wrote {}", out_path.display());
    Ok(())
}

fn list(input: &Path, verbose: bool) -> Result<()> {
    let bytes = std::fs::read(input).map_err(|e| CliError::Io(e.to_string()))?;
    let model = das_format::read_model(&bytes)?;
    print_properties(&model);
    if verbose {
        print_verbose(&model);
    }
    Ok(())
}

fn print_properties(model: &DasModel) {
    println!("model: {}", model.properties.model_name);
    println!("author: {}", model.properties.author);
    println!("copyright: {}", model.properties.copyright);
    println!("modified: {}", model.properties.modification_timestamp);
    println!("default scene: {}", model.properties.default_scene_index);
    println!("compressed: {}", model.properties.compression_flag);
    println!("buffers: {}", model.buffers.len());
    println!("meshes: {}", model.meshes.len());
    println!("scenes: {}", model.scenes.len());
}

fn print_verbose(model: &DasModel) {
    for (i, mesh) in model.meshes.iter().enumerate() {
        println!("mesh[{i}] `{}`: {} primitive(s)", mesh.name, mesh.primitive_ids.len());
    }
    for (i, skeleton) in model.skeletons.iter().enumerate() {
        println!("skeleton[{i}] `{}`: {} joint(s)", skeleton.name, skeleton.joint_ids.len());
    }
    for (i, joint) in model.skeleton_joints.iter().enumerate() {
        println!("joint[{i}] `{}`", joint.name);
    }
    for (i, animation) in model.animations.iter().enumerate() {
        println!("animation[{i}] `{}`: {} channel(s)", animation.name, animation.channel_ids.len());
    }
}
