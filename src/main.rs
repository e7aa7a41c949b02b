mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use colored::Colorize;
use oxidized_rules::finding::Severity;
use oxidized_rules::{checks, config, lint, output};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Check {
            paths,
            format,
            output: output_path,
            strict,
            config: config_path,
            no_color,
        } => {
            if no_color || output_path.is_some() {
                colored::control::set_override(false);
            }

            let mut config = config::Config::load(config_path.as_deref()).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });

            if strict {
                config.strict.enabled = true;
            }

            let batch = lint::run(&paths, &config).unwrap_or_else(|e| {
                eprintln!("Error: {e}");
                std::process::exit(2);
            });
            let formatted = output::format_report(&batch, &format);

            if let Some(out_path) = output_path {
                std::fs::write(&out_path, &formatted).unwrap_or_else(|e| {
                    eprintln!("Error writing output: {e}");
                    std::process::exit(2);
                });
                eprintln!("Output written to {}", out_path.display());
            } else {
                print!("{formatted}");
            }

            std::process::exit(batch.exit_code());
        }

        Commands::ListRules => {
            let rules = checks::all_rules();
            println!("{}", "Built-in Rules".bold().underline());
            println!();

            let mut current_check = "";
            for rule in &rules {
                if rule.check != current_check {
                    if !current_check.is_empty() {
                        println!();
                    }
                    println!("  {}", rule.check.bold());
                    current_check = rule.check;
                }

                println!(
                    "    [{severity}] {id:<40} {message}",
                    severity = severity_label(rule.severity),
                    id = rule.id,
                    message = rule.message,
                );
            }

            println!();
            println!("  Total: {} rules", rules.len());
        }

        Commands::Explain { rule_id } => match checks::find_rule(&rule_id) {
            Some(rule) => {
                println!("{}", rule.id.bold());
                println!();
                println!("  Check:        {}", rule.check);
                println!("  Severity:     {}", rule.severity);
                println!("  Description:  {}", rule.message);
                println!("  Remediation:  {}", rule.remediation);
            }
            None => {
                eprintln!("Unknown rule: {rule_id}");
                eprintln!("Use 'oxidized-rules list-rules' to see all available rules.");
                std::process::exit(2);
            }
        },
    }
}

/// Logs go to stderr so stdout stays parseable for json/jsonl/sarif.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn severity_label(severity: Severity) -> String {
    match severity {
        Severity::Error => "ERROR".red().bold().to_string(),
        Severity::Warning => " WARN".yellow().bold().to_string(),
        Severity::Info => " INFO".blue().to_string(),
    }
}
