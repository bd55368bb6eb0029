use jinja_compiler::config::RuntimeConfig;
use jinja_compiler::utils::{SourceMap, Span};
use jinja_compiler::{lexical, logging, pipeline, syntax};
use std::env;
use std::path::{Path, PathBuf};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <template> [options]", args[0]);
        eprintln!("       {} --help", args[0]);
        std::process::exit(1);
    }

    if args[1] == "--help" {
        print_help(&args[0]);
        return Ok(());
    }

    let options = match parse_options(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    };

    let mut config = match &options.config_path {
        Some(path) => RuntimeConfig::from_file(path)?,
        None => RuntimeConfig::default(),
    };
    if options.quiet {
        config.logging.enable_console_logging = false;
    }

    logging::config::init_runtime_preferences(config.logging.clone())?;
    logging::init_global_logging()?;
    lexical::init_lexical_analysis_logging()?;
    syntax::init_syntax_logging()?;

    let source = std::fs::read_to_string(&options.template_path)?;
    let name = options.template_path.display().to_string();

    if options.dump_tokens {
        print_tokens(&source, &name, &config);
    }

    process_template(&source, &name, &config, options.json)
}

/// Parsed command-line options
#[derive(Debug, Default, PartialEq)]
struct CliOptions {
    template_path: PathBuf,
    config_path: Option<PathBuf>,
    json: bool,
    dump_tokens: bool,
    quiet: bool,
}

fn parse_options(args: &[String]) -> Result<CliOptions, String> {
    let mut options = CliOptions::default();
    let mut template = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                let path = args
                    .get(i + 1)
                    .ok_or_else(|| "--config requires a file path".to_string())?;
                options.config_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--json" => options.json = true,
            "--tokens" => options.dump_tokens = true,
            "--quiet" => options.quiet = true,
            flag if flag.starts_with("--") => {
                eprintln!("Warning: Unknown option '{}'", flag);
            }
            path => {
                if template.is_some() {
                    return Err(format!("unexpected extra argument '{}'", path));
                }
                template = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    options.template_path = template.ok_or_else(|| "no template given".to_string())?;
    Ok(options)
}

fn print_help(program_name: &str) {
    println!("Jinja Compiler v{}", env!("CARGO_PKG_VERSION"));
    println!("Lex and parse a template, reporting every syntax error found");
    println!();
    println!("USAGE:");
    println!("    {} <template> [options]", program_name);
    println!();
    println!("OPTIONS:");
    println!("    --help              Show this help message");
    println!("    --config FILE       Load delimiters and preferences from a TOML file");
    println!("    --json              Print the parse result as JSON");
    println!("    --tokens            Print the token stream before parsing");
    println!("    --quiet             Suppress console logging");
    println!();
    println!("EXAMPLES:");
    println!("    {} page.html", program_name);
    println!("    {} page.html --config syntax.toml --json", program_name);
}

fn print_tokens(source: &str, name: &str, config: &RuntimeConfig) {
    let stream = lexical::tokenize_named(source, name, &config.syntax);
    for token in stream.all_tokens() {
        println!(
            "{:>4}:{:<3} {:<16} {:?}",
            token.position.line,
            token.position.column,
            format!("{:?}", token.kind),
            token.text
        );
    }
    println!();
}

fn process_template(
    source: &str,
    name: &str,
    config: &RuntimeConfig,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let source_map = SourceMap::new(source).with_name(name);

    match pipeline::compile_source(source, Some(name), config, None) {
        Ok(result) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&result.to_json())?);
            } else {
                for diagnostic in &result.lexical_diagnostics {
                    let span = Span::point(diagnostic.position());
                    eprintln!("{}", source_map.format_error(&span, &diagnostic.to_string()));
                }
                for error in &result.syntax_errors {
                    eprintln!("{}", source_map.format_error(&error.span(), &error.to_string()));
                }

                println!(
                    "{}: {} statements, {} tokens, {} diagnostics",
                    name,
                    result.template.statement_count(),
                    result.token_count,
                    result.diagnostic_count()
                );
            }

            if !result.syntax_errors.is_empty() {
                std::process::exit(1);
            }
        }
        Err(error) => {
            match error.syntax_error() {
                Some(syntax_error) => eprintln!(
                    "{}",
                    source_map.format_error(&syntax_error.span(), &syntax_error.to_string())
                ),
                None => eprintln!("FAILED: {}", error),
            }
            eprintln!("  [{}] {}", error.error_code().as_str(), display_path(name));
            std::process::exit(1);
        }
    }

    Ok(())
}

fn display_path(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let options =
            parse_options(&args(&["page.html", "--config", "syntax.toml", "--json"])).unwrap();

        assert_eq!(options.template_path, PathBuf::from("page.html"));
        assert_eq!(options.config_path, Some(PathBuf::from("syntax.toml")));
        assert!(options.json);
        assert!(!options.dump_tokens);
    }

    #[test]
    fn test_parse_options_errors() {
        assert!(parse_options(&args(&["--json"])).is_err());
        assert!(parse_options(&args(&["a.html", "--config"])).is_err());
        assert!(parse_options(&args(&["a.html", "b.html"])).is_err());
    }

    #[test]
    fn test_display_path() {
        assert_eq!(display_path("templates/base.html"), "base.html");
    }
}
