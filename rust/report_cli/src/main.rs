use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use report_editor::{
    html_to_docx, json_to_html, DocxReader, EditorConfig, HtmlSurface, ImportControl, ImportStatus,
    Locale, Toolbar,
};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Editor settings (JSON). Missing fields use their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a JSON report as HTML.
    RenderJson {
        file: PathBuf,

        /// fa, ar or en. Overrides the config file.
        #[arg(long)]
        locale: Option<String>,
    },

    /// Import a .txt, .docx or .json file and print the resulting HTML.
    Import {
        file: PathBuf,

        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Convert an HTML file to .docx.
    Export {
        #[arg(long)]
        html_file: PathBuf,

        #[arg(long)]
        out: PathBuf,
    },

    /// Run a toolbar session: import, add images, set direction, export.
    Compose {
        /// Document to import through the document picker (.txt, .docx).
        #[arg(long)]
        import: Option<PathBuf>,

        /// Report to import through the JSON picker.
        #[arg(long)]
        json: Option<PathBuf>,

        /// Images to insert at the cursor, in order.
        #[arg(long)]
        image: Vec<PathBuf>,

        #[arg(long)]
        rtl: bool,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

fn read_text(path: &Path) -> Result<String> {
    let mut text = String::new();
    File::open(path)
        .with_context(|| format!("open {}", path.display()))?
        .read_to_string(&mut text)
        .with_context(|| format!("read {}", path.display()))?;
    Ok(text)
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    f.write_all(bytes)
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig> {
    match path {
        Some(path) => {
            EditorConfig::load(path).with_context(|| format!("load config {}", path.display()))
        }
        None => Ok(EditorConfig::default()),
    }
}

fn import_into(bar: &mut Toolbar<HtmlSurface>, path: &Path, control: ImportControl) -> Result<()> {
    let status = bar
        .import_file(path, control)
        .with_context(|| format!("import {}", path.display()))?;
    if status == ImportStatus::Ignored {
        return Err(anyhow!("{} is not a supported file for this import", path.display()));
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    match args.command {
        Command::RenderJson { file, locale } => {
            if let Some(name) = locale {
                config.locale =
                    Locale::parse(&name).ok_or_else(|| anyhow!("unknown locale {name:?}"))?;
            }
            let text = read_text(&file)?;
            let html = json_to_html(&text, config.locale)
                .with_context(|| format!("render {}", file.display()))?;
            println!("{html}");
        }
        Command::Import { file, out } => {
            let control = ImportControl::for_path(&file)
                .ok_or_else(|| anyhow!("unsupported file type: {}", file.display()))?;
            let html = report_editor::import::load(&file, control, &config, &DocxReader)
                .with_context(|| format!("import {}", file.display()))?
                .unwrap_or_default();
            match out {
                Some(out) => write_bytes(&out, html.as_bytes())?,
                None => println!("{html}"),
            }
        }
        Command::Export { html_file, out } => {
            let html = read_text(&html_file)?;
            let bytes = html_to_docx(&html)
                .with_context(|| format!("convert {}", html_file.display()))?;
            write_bytes(&out, &bytes)?;
            info!("Wrote {}", out.display());
        }
        Command::Compose {
            import,
            json,
            image,
            rtl,
            out_dir,
        } => {
            let mut bar = Toolbar::new(HtmlSurface::new(), config);
            if let Some(path) = import {
                import_into(&mut bar, &path, ImportControl::Document)?;
            }
            if let Some(path) = json {
                import_into(&mut bar, &path, ImportControl::Json)?;
            }
            for path in &image {
                bar.insert_image_file(path)
                    .with_context(|| format!("insert image {}", path.display()))?;
            }
            if rtl {
                bar.toggle_rtl();
            }
            fs::create_dir_all(&out_dir)
                .with_context(|| format!("create {}", out_dir.display()))?;
            let saved = bar
                .export()
                .context("export document")?
                .save_into(&out_dir)
                .with_context(|| format!("save into {}", out_dir.display()))?;
            println!("{}", saved.display());
        }
    }
    Ok(())
}
