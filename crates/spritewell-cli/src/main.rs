use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use serde::Deserialize;
use spritewell_core::prelude::*;
use spritewell_core::{inline_reader, to_json_array, to_json_map};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "spritewell",
    about = "Combine images into a sprite sheet",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action=ArgAction::Count, global=true, help_heading = "Logging")]
    verbose: u8,
    /// Quiet mode (overrides verbose)
    #[arg(
        short,
        long,
        default_value_t = false,
        global = true,
        help_heading = "Logging"
    )]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Stack matched images into one sheet and write it to the output directory
    Pack(PackArgs),
    /// Print the name the sheet would be written under, without drawing it
    Name(PackArgs),
    /// Print a file as a CSS data URI
    Inline(InlineArgs),
}

#[derive(Parser, Debug, Clone)]
struct PackArgs {
    // Input/Output
    /// Glob patterns, resolved under --image-dir
    #[arg(required = true, help_heading = "Input/Output")]
    patterns: Vec<String>,
    /// Root the patterns are resolved against
    #[arg(long, default_value = ".", help_heading = "Input/Output")]
    image_dir: PathBuf,
    /// Directory stylesheets are built into (output names are relative to it)
    #[arg(long, default_value = ".", help_heading = "Input/Output")]
    build_dir: PathBuf,
    /// Directory the sheet is written to
    #[arg(short, long, default_value = "image", help_heading = "Input/Output")]
    out_dir: PathBuf,
    /// YAML config file path (fields override the flags above)
    #[arg(long, help_heading = "Input/Output")]
    config: Option<PathBuf>,

    // Layout
    /// Stacking direction: vertical | horizontal
    #[arg(long, default_value = "vertical", help_heading = "Layout")]
    pack: String,
    /// Pixels between consecutive images
    #[arg(long, default_value_t = 0, help_heading = "Layout")]
    padding: u32,

    // Export
    /// Write the sprite map (JSON) to this file
    #[arg(long, help_heading = "Export")]
    json: Option<PathBuf>,
    /// Sprite map layout: hash | array
    #[arg(long, default_value = "hash", value_parser = ["hash", "array"], help_heading = "Export")]
    json_format: String,
    /// Print the merged configuration (after CLI/YAML) and exit
    #[arg(long, default_value_t = false, help_heading = "Export")]
    print_config: bool,
    /// Output format for --print-config: json|yaml
    #[arg(long, default_value = "json", value_parser = ["json", "yaml"], help_heading = "Export")]
    print_config_format: String,
    /// Dry run: decode and lay out, print the map, but do not write files
    #[arg(long, default_value_t = false, help_heading = "Export")]
    dry_run: bool,
}

#[derive(Parser, Debug, Clone)]
struct InlineArgs {
    /// File to inline (PNG, GIF, JPEG or SVG)
    input: PathBuf,
    /// Base64-encode SVG instead of percent-escaping it
    #[arg(long, default_value_t = false)]
    base64: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing_with_level(cli.quiet, cli.verbose);
    match &cli.command {
        Commands::Pack(args) => run_pack(args),
        Commands::Name(args) => run_name(args),
        Commands::Inline(args) => run_inline(args),
    }
}

fn resolve_options(cli: &PackArgs) -> anyhow::Result<SpriteOptions> {
    let pack: PackMode = cli
        .pack
        .parse()
        .map_err(|_| anyhow::anyhow!("unknown pack mode: {}", cli.pack))?;
    let mut opts = SpriteOptions::builder()
        .image_dir(&cli.image_dir)
        .build_dir(&cli.build_dir)
        .gen_img_dir(&cli.out_dir)
        .pack(pack)
        .padding(cli.padding)
        .build();

    if let Some(path) = &cli.config {
        let file =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let y: YamlConfig = serde_yaml::from_str(&file)
            .with_context(|| format!("parse {}", path.display()))?;
        opts = y.into_options(opts)?;
    }
    opts.validate()?;
    Ok(opts)
}

fn decoded_sprite(cli: &PackArgs) -> anyhow::Result<Sprite> {
    let opts = resolve_options(cli)?;
    let sprite = Sprite::new(opts);
    sprite
        .decode(cli.patterns.as_slice())
        .with_context(|| format!("decode {:?}", cli.patterns))?;
    info!(count = sprite.len(), width = sprite.width(), height = sprite.height(), "loaded images");
    Ok(sprite)
}

fn run_pack(cli: &PackArgs) -> anyhow::Result<()> {
    if cli.print_config {
        let opts = resolve_options(cli)?;
        match cli.print_config_format.as_str() {
            "yaml" => println!("{}", serde_yaml::to_string(&opts)?),
            _ => println!("{}", serde_json::to_string_pretty(&opts)?),
        }
        return Ok(());
    }

    let sprite = decoded_sprite(cli)?;
    let map = sprite.sprite_map()?;
    let value = match cli.json_format.as_str() {
        "array" => to_json_array(&map),
        _ => to_json_map(&map),
    };

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let out_dir = &sprite.options().gen_img_dir;
    fs::create_dir_all(out_dir)
        .with_context(|| format!("create out_dir {}", out_dir.display()))?;
    let written = sprite.export()?;
    info!(path = %written.display(), name = %map.image, "sheet ready");

    match &cli.json {
        Some(path) => {
            fs::write(path, serde_json::to_string_pretty(&value)?)
                .with_context(|| format!("write {}", path.display()))?;
            info!(?path, entries = map.entries.len(), "sprite map written");
        }
        None => println!("{}", serde_json::to_string_pretty(&value)?),
    }
    Ok(())
}

fn run_name(cli: &PackArgs) -> anyhow::Result<()> {
    let sprite = decoded_sprite(cli)?;
    println!("{}", sprite.output_path()?);
    Ok(())
}

fn run_inline(args: &InlineArgs) -> anyhow::Result<()> {
    let file = fs::File::open(&args.input)
        .with_context(|| format!("open {}", args.input.display()))?;
    let uri = inline_reader(file, args.base64)
        .with_context(|| format!("inline {}", args.input.display()))?;
    println!("{uri}");
    Ok(())
}

fn init_tracing_with_level(quiet: bool, verbose: u8) {
    let level = if quiet {
        "error".to_string()
    } else {
        match verbose {
            0 => "info".into(),
            1 => "debug".into(),
            _ => "trace".into(),
        }
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Debug, Deserialize, Default)]
struct YamlConfig {
    image_dir: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    gen_img_dir: Option<PathBuf>,
    pack: Option<String>,
    padding: Option<u32>,
}

impl YamlConfig {
    fn into_options(self, mut opts: SpriteOptions) -> anyhow::Result<SpriteOptions> {
        if let Some(v) = self.image_dir {
            opts.image_dir = v;
        }
        if let Some(v) = self.build_dir {
            opts.build_dir = v;
        }
        if let Some(v) = self.gen_img_dir {
            opts.gen_img_dir = v;
        }
        if let Some(v) = self.pack {
            opts.pack = v
                .parse()
                .map_err(|_| anyhow::anyhow!("unknown pack mode in config: {}", v))?;
        }
        if let Some(v) = self.padding {
            opts.padding = v;
        }
        Ok(opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yaml_overrides_only_present_fields() {
        let y: YamlConfig = serde_yaml::from_str("pack: horizontal\npadding: 4\n").expect("yaml");
        let base = SpriteOptions::builder().image_dir("img").padding(1).build();
        let opts = y.into_options(base).expect("options");
        assert_eq!(opts.pack, PackMode::Horizontal);
        assert_eq!(opts.padding, 4);
        assert_eq!(opts.image_dir, PathBuf::from("img"));
    }

    #[test]
    fn yaml_rejects_unknown_pack() {
        let y: YamlConfig = serde_yaml::from_str("pack: diagonal\n").expect("yaml");
        assert!(y.into_options(SpriteOptions::default()).is_err());
    }

    #[test]
    fn cli_parses_pack_subcommand() {
        let cli = Cli::try_parse_from([
            "spritewell",
            "pack",
            "icons/*.png",
            "--padding",
            "2",
            "--pack",
            "h",
        ])
        .expect("parse");
        let Commands::Pack(args) = cli.command else {
            panic!("expected pack");
        };
        let opts = resolve_options(&args).expect("options");
        assert_eq!(opts.pack, PackMode::Horizontal);
        assert_eq!(opts.padding, 2);
        assert_eq!(opts.gen_img_dir, PathBuf::from("image"));
    }
}
