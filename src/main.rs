use abcseq::{
    body_to_notes, scale_events, scan_header, to_floats, AbcError, Metadata, NoteEvent, RenderConfig,
};
use serde::Serialize;
use std::env;
use std::fs;
use std::process;

const USAGE: &str = "Usage: abcseq [--exact] [--config <config.yaml>] <input.abc> [output.yaml]";

#[derive(Serialize)]
struct Output<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    composer: Option<String>,
    notes: Vec<NoteEvent<T>>,
}

fn usage_exit() -> ! {
    eprintln!("{}", USAGE);
    process::exit(1);
}

fn render(source: &str, config: &RenderConfig) -> Result<(Metadata, Vec<NoteEvent>), AbcError> {
    let header = scan_header(source)?;
    let notes = body_to_notes(header.body(), &header.key)?;
    let sheet = config.render(scale_events(notes, header.time_scale()?)?)?;
    Ok((header.metadata, sheet.into_notes()))
}

fn to_yaml(metadata: Metadata, notes: Vec<NoteEvent>, exact: bool) -> serde_yaml::Result<String> {
    let Metadata { title, composer } = metadata;
    if exact {
        serde_yaml::to_string(&Output { title, composer, notes })
    } else {
        let notes = to_floats(&notes);
        serde_yaml::to_string(&Output { title, composer, notes })
    }
}

fn main() {
    env_logger::init();

    let mut exact = false;
    let mut config_path: Option<String> = None;
    let mut positional = Vec::new();

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--exact" => exact = true,
            "--config" => match args.next() {
                Some(path) => config_path = Some(path),
                None => usage_exit(),
            },
            "-h" | "--help" => {
                println!("{}", USAGE);
                return;
            }
            _ => positional.push(arg),
        }
    }

    let (input_path, output_path) = match positional.as_slice() {
        [input] => (input, None),
        [input, output] => (input, Some(output)),
        _ => usage_exit(),
    };

    let mut config = match &config_path {
        Some(path) => {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    eprintln!("Error reading config '{}': {}", path, e);
                    process::exit(1);
                }
            };
            match RenderConfig::from_yaml(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("{}", e);
                    process::exit(1);
                }
            }
        }
        None => RenderConfig::default(),
    };
    config.exact |= exact;

    let source = match fs::read_to_string(input_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", input_path, e);
            process::exit(1);
        }
    };

    let (metadata, notes) = match render(&source, &config) {
        Ok(rendered) => rendered,
        Err(e) => {
            eprintln!("Parse error: {}", e);
            process::exit(1);
        }
    };

    let yaml = match to_yaml(metadata, notes, config.exact) {
        Ok(yaml) => yaml,
        Err(e) => {
            eprintln!("Error serializing note events: {}", e);
            process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(path, &yaml) {
                eprintln!("Error writing to '{}': {}", path, e);
                process::exit(1);
            }
            eprintln!("Wrote note events to {}", path);
        }
        None => print!("{}", yaml),
    }
}
