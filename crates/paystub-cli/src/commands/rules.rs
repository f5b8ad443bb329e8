//! Rules command - inspect rule documents.

use clap::{Args, Subcommand};
use console::style;

use paystub_core::extract::RegexExtractor;
use paystub_core::rules::{unresolved_markers, PatternCompiler, RuleDocument};

use super::config::load_config;

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Resolve and compile a rule document, printing every compiled pattern
    Check {
        /// Rules as inline JSON or a path (default: configured or embedded rules)
        #[arg(long)]
        rules: Option<String>,
    },

    /// Print the embedded default rule document
    Default,
}

pub async fn run(args: RulesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    match args.command {
        RulesCommand::Check { rules } => check_rules(rules, config_path),
        RulesCommand::Default => {
            println!("{}", paystub_core::rules::DEFAULT_RULES);
            Ok(())
        }
    }
}

fn check_rules(rules: Option<String>, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let specifier = rules.or(config.extraction.rules);
    let compiler = PatternCompiler::new(&config.text.column_separator);

    let document = RuleDocument::load_or_default(specifier.as_deref())?;
    let resolved = document.resolve(&compiler)?;
    let extractor = RegexExtractor::new(&resolved, &compiler)?;

    for section in extractor.sections() {
        println!("{} {}", style("▸").cyan(), style(section.section).bold());
        println!("  window: {}", section.window.pattern());
        for field in section.fields.iter() {
            println!("  {} [{}]: {}", field.name(), field.rule().group, field.pattern());
        }
        println!();
    }

    let leftover = unresolved_markers(&resolved.rules, &compiler);
    if leftover.is_empty() {
        println!("{} Rules compiled successfully", style("✓").green());
    } else {
        println!(
            "{} Rules compiled with unresolved markers: {}",
            style("!").yellow(),
            leftover.join(", ")
        );
    }
    Ok(())
}
