use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context};
use clap::{Parser, Subcommand};

use composite_authz::cli::Console;
use composite_authz::config::{self, AuthorizationConfig};
use composite_authz::logging;
use composite_authz::path;
use composite_authz::permission::{PermissionProvider, TreePermission};
use composite_authz::restriction::{EntryNode, Restriction, RestrictionProvider};
use composite_authz::tree::{Tree, Value};

#[derive(Parser)]
#[command(
    name = "composite-authz",
    about = "Evaluate composite authorization decisions against a configured content tree"
)]
struct Cli {
    /// Authorization config file (JSON).
    #[arg(long, short)]
    config: PathBuf,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check whether actions are granted at a path.
    Check {
        #[arg(long)]
        path: String,

        /// Comma separated actions, e.g. "read,add_node".
        #[arg(long)]
        actions: String,
    },

    /// Show the privileges effective at a path (repository level if omitted).
    Privileges {
        #[arg(long)]
        path: Option<String>,

        /// Only check whether these privileges are all granted.
        #[arg(long)]
        has: Vec<String>,
    },

    /// Derive tree permissions from the root down to a path.
    Walk {
        #[arg(long)]
        path: String,
    },

    /// Evaluate restrictions of an entry against an item path.
    Match {
        /// Path of the node the entry is bound to.
        #[arg(long)]
        entry_path: String,

        /// Restriction as name=value; multi-valued restrictions take
        /// comma separated values.
        #[arg(long = "restriction")]
        restrictions: Vec<String>,

        /// Item path to evaluate.
        #[arg(long)]
        path: String,

        /// Evaluate the named property of the item instead of the node.
        #[arg(long)]
        property: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let console = Console::new();

    let mut config = AuthorizationConfig::from_file(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    let _guard = logging::init_logging(&config.logging)?;

    tracing::info!("=== composite-authz starting ===");

    let result = match cli.command {
        Command::Check { path, actions } => run_check(&config, &console, &path, &actions),
        Command::Privileges { path, has } => run_privileges(&config, &console, path.as_deref(), &has),
        Command::Walk { path } => run_walk(&config, &console, &path),
        Command::Match {
            entry_path,
            restrictions,
            path,
            property,
        } => run_match(&console, &entry_path, &restrictions, &path, property.as_deref()),
    };

    if let Err(e) = &result {
        console.print_error(e);
    }
    result
}

fn run_check(config: &AuthorizationConfig, console: &Console, path: &str, actions: &str) -> anyhow::Result<()> {
    let provider = config.build()?;
    let granted = provider.is_granted_path(path, actions)?;
    console.print_decision(path, actions, granted);
    Ok(())
}

fn run_privileges(
    config: &AuthorizationConfig,
    console: &Console,
    path: Option<&str>,
    has: &[String],
) -> anyhow::Result<()> {
    let provider = config.build()?;
    let root = Tree::root(config.content_root());
    let tree = path.map(|p| root.descendant(p));
    let label = path.unwrap_or("<repository>");

    if has.is_empty() {
        console.print_privileges(label, &provider.privileges(tree.as_ref()));
    } else {
        let names: Vec<&str> = has.iter().map(String::as_str).collect();
        let granted = provider.has_privileges(tree.as_ref(), &names)?;
        console.print_decision(label, &has.join(","), granted);
    }
    Ok(())
}

fn run_walk(config: &AuthorizationConfig, console: &Console, target: &str) -> anyhow::Result<()> {
    let provider = config.build()?;
    let mut tree = Tree::root(config.content_root());
    let mut permission = provider.tree_permission(&tree, &TreePermission::Empty);
    console.print_walk_step(tree.path(), &permission);

    for name in path::elements(target) {
        tree = tree.child(name);
        if !tree.exists() {
            console.print_system(&format!("{} does not exist", tree.path()));
            break;
        }
        permission = provider.tree_permission(&tree, &permission);
        console.print_walk_step(tree.path(), &permission);
    }
    Ok(())
}

fn run_match(
    console: &Console,
    entry_path: &str,
    raw_restrictions: &[String],
    item_path: &str,
    property: Option<&str>,
) -> anyhow::Result<()> {
    let provider = config::restriction_provider();
    let restrictions = raw_restrictions
        .iter()
        .map(|raw| parse_restriction(provider.as_ref(), entry_path, raw))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut entry = EntryNode::new();
    provider.write_restrictions(Some(entry_path), &mut entry, &restrictions)?;
    provider.validate_restrictions(Some(entry_path), &entry)?;

    let pattern = provider.pattern(Some(entry_path), &entry);
    tracing::debug!("Pattern for {}: {:?}", entry_path, pattern);

    match property {
        Some(name) => console.print_decision(
            &path::concat(item_path, name),
            "matches",
            pattern.matches_property(item_path, name),
        ),
        None => console.print_decision(item_path, "matches", pattern.matches(item_path)),
    }
    Ok(())
}

/// Parse `name=value` using the declared type of the restriction
fn parse_restriction(
    provider: &dyn RestrictionProvider,
    entry_path: &str,
    raw: &str,
) -> anyhow::Result<Restriction> {
    let (name, raw_value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got '{}'", raw))?;

    let supported: BTreeSet<_> = provider.supported_restrictions(Some(entry_path));
    let Some(definition) = supported.iter().find(|d| d.name() == name) else {
        bail!(
            "unsupported restriction '{}', expected one of: {}",
            name,
            supported.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
        );
    };

    let parse = |raw: &str| {
        Value::parse(definition.value_type(), raw)
            .ok_or_else(|| anyhow!("'{}' is not a valid {:?} value", raw, definition.value_type()))
    };

    let restriction = if definition.is_multi_valued() {
        let values = raw_value
            .split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(parse)
            .collect::<anyhow::Result<Vec<_>>>()?;
        provider.create_multi_restriction(Some(entry_path), name, values)?
    } else {
        provider.create_restriction(Some(entry_path), name, parse(raw_value)?)?
    };
    Ok(restriction)
}
