use clap::{Parser, Subcommand};
use log::debug;
use std::error::Error;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process;
use std::time::{Duration, Instant};
use viewkit::config::ComponentDir;
use viewkit::logging::{init_logging, LoggingConfig};
use viewkit::value::context_from_json;
use viewkit::{ComponentTagPreprocessor, Config, TemplateError, TemplateSet};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "viewkit")]
#[command(about = "viewkit - template components with HTML-like tags")]
struct Cli {
    /// Log compilation and rendering steps
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite component tags into template tags
    Preprocess {
        /// Template file or directory
        #[arg(required_unless_present = "stdin")]
        path: Option<PathBuf>,

        /// Read from stdin
        #[arg(long)]
        stdin: bool,

        /// Component tag prefix
        #[arg(long, default_value = viewkit::preprocess::DEFAULT_TAG_PREFIX)]
        prefix: String,

        /// Write results below this directory instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,

        /// Template file extension when walking a directory
        #[arg(long, default_value = "html")]
        ext: String,

        /// Output as JSON with the components used
        #[arg(long)]
        json: bool,
    },

    /// Render a template with its components
    Render {
        /// Template name, relative to the base directory
        name: String,

        /// JSON config file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Template base directory (overrides the config)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Register every template below DIR as a component
        #[arg(long = "components", value_name = "DIR")]
        components: Vec<String>,

        /// Component tag prefix (overrides the config)
        #[arg(long)]
        prefix: Option<String>,

        /// Template data as a JSON object
        #[arg(long)]
        data: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(LoggingConfig::verbose(cli.verbose));

    match cli.command {
        Commands::Preprocess {
            path,
            stdin,
            prefix,
            out,
            ext,
            json,
        } => {
            let preprocessor = ComponentTagPreprocessor::new(prefix);
            if stdin {
                preprocess_stdin(&preprocessor, json);
            } else if let Some(path) = path {
                preprocess_path(&preprocessor, &path, out.as_deref(), &ext, json);
            } else {
                fail("provide a file/directory or use --stdin");
            }
        }
        Commands::Render {
            name,
            config,
            base_dir,
            components,
            prefix,
            data,
        } => render(&name, config, base_dir, components, prefix, data),
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

fn preprocess_stdin(preprocessor: &ComponentTagPreprocessor, json: bool) {
    let mut source = String::new();
    if let Err(e) = io::stdin().read_to_string(&mut source) {
        fail(format!("failed to read stdin: {}", e));
    }
    print_result(preprocessor, &source, json);
}

fn print_result(preprocessor: &ComponentTagPreprocessor, source: &str, json: bool) {
    let result = preprocessor.rewrite(source);
    if json {
        match serde_json::to_string(&result) {
            Ok(text) => println!("{}", text),
            Err(e) => fail(e),
        }
    } else {
        print!("{}", result.code);
    }
}

fn preprocess_path(preprocessor: &ComponentTagPreprocessor, path: &Path, out: Option<&Path>, ext: &str, json: bool) {
    if path.is_file() {
        match out {
            None => {
                let source = read(path);
                print_result(preprocessor, &source, json);
            }
            Some(out) => {
                let start = Instant::now();
                let target = out.join(path.file_name().unwrap_or(path.as_os_str()));
                preprocess_file(preprocessor, path, &target);
                print_summary(1, start.elapsed());
            }
        }
    } else if path.is_dir() {
        let Some(out) = out else {
            fail("--out is required when preprocessing a directory");
        };
        preprocess_directory(preprocessor, path, out, ext);
    } else {
        fail(format!("{} does not exist", path.display()));
    }
}

fn preprocess_directory(preprocessor: &ComponentTagPreprocessor, dir: &Path, out: &Path, ext: &str) {
    let start = Instant::now();
    let mut file_count = 0;

    for entry in WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && e.path().extension().is_some_and(|x| x == ext))
    {
        let relative = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        preprocess_file(preprocessor, entry.path(), &out.join(relative));
        file_count += 1;
    }

    if file_count == 0 {
        fail(format!("no .{} files found in {}", ext, dir.display()));
    }
    print_summary(file_count, start.elapsed());
}

fn preprocess_file(preprocessor: &ComponentTagPreprocessor, path: &Path, target: &Path) {
    let result = preprocessor.rewrite(&read(path));
    debug!("{}: {} tags rewritten", path.display(), result.rewritten);

    if let Some(parent) = target.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            fail(format!("failed to create {}: {}", parent.display(), e));
        }
    }
    if let Err(e) = fs::write(target, &result.code) {
        fail(format!("failed to write {}: {}", target.display(), e));
    }
    print_generated(&target.display().to_string());
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| fail(format!("failed to read {}: {}", path.display(), e)))
}

fn render(
    name: &str,
    config: Option<PathBuf>,
    base_dir: Option<PathBuf>,
    components: Vec<String>,
    prefix: Option<String>,
    data: Option<String>,
) {
    let mut config = match config {
        Some(path) => Config::load(&path).unwrap_or_else(|e| fail(e)),
        None => Config::default(),
    };
    if let Some(base_dir) = base_dir {
        config.base_dir = base_dir;
    }
    if let Some(prefix) = prefix {
        config.tag_prefix = Some(prefix);
    }
    config
        .component_dirs
        .extend(components.into_iter().map(|dir| ComponentDir { dir, prefix: String::new() }));

    let data = match data {
        None => Default::default(),
        Some(text) => {
            let json: serde_json::Value =
                serde_json::from_str(&text).unwrap_or_else(|e| fail(format!("invalid --data: {}", e)));
            context_from_json(json).unwrap_or_else(|| fail("--data must be a JSON object"))
        }
    };

    let set = config.build().unwrap_or_else(|e| fail(e));
    debug!("{} components registered", set.registry().len());

    match set.render(name, data) {
        Ok(html) => print!("{}", html),
        Err(err) => {
            report(&set, &err);
            process::exit(1);
        }
    }
}

fn report(set: &TemplateSet, err: &TemplateError) {
    let color = io::stderr().is_terminal();
    match set.load_source(err.template()) {
        Ok(source) if err.position().is_some() => {
            let source = set.preprocess(&source);
            let rendered = if color { err.render_color(&source) } else { err.render(&source) };
            eprint!("{}", rendered);
        }
        _ => {
            eprintln!("Error: {}", err);
            let mut cause = err.source();
            while let Some(e) = cause {
                eprintln!("  caused by: {}", e);
                cause = e.source();
            }
        }
    }
}

fn print_generated(path: &str) {
    if io::stderr().is_terminal() {
        eprintln!("  \x1b[32m✓\x1b[0m {}", path);
    } else {
        eprintln!("  ✓ {}", path);
    }
}

fn print_summary(count: usize, elapsed: Duration) {
    let time_str = format_duration(elapsed);
    let files_word = if count == 1 { "file" } else { "files" };

    if io::stderr().is_terminal() {
        eprintln!("\n\x1b[1m✨ Preprocessed {} {} in {}\x1b[0m", count, files_word, time_str);
    } else {
        eprintln!("\n✨ Preprocessed {} {} in {}", count, files_word, time_str);
    }
}

fn format_duration(d: Duration) -> String {
    let micros = d.as_micros();
    if micros < 1000 {
        format!("{}μs", micros)
    } else if micros < 1_000_000 {
        format!("{:.1}ms", micros as f64 / 1000.0)
    } else {
        format!("{:.2}s", d.as_secs_f64())
    }
}
