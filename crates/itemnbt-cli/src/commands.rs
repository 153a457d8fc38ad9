use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use colored::Colorize;
use itemnbt::{
    field, CodecRegistry, DataManager, DataShape, HostItem, ItemStack, LinkReport, Linked,
    LinkedData, SyncConfig, TreeNode,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;
    match cli.command {
        Command::New(args) => cmd_new(args),
        Command::Show(args) => cmd_show(args),
        Command::Categories(args) => cmd_categories(args),
        Command::Clear(args) => cmd_clear(args),
        Command::Demo(args) => cmd_demo(args, config),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<SyncConfig> {
    match path {
        Some(path) => SyncConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(SyncConfig::default()),
    }
}

fn load_stack(path: &Path) -> anyhow::Result<ItemStack> {
    ItemStack::load(path).with_context(|| format!("reading {}", path.display()))
}

fn save_stack(stack: &ItemStack, path: &Path) -> anyhow::Result<()> {
    stack
        .save(path)
        .with_context(|| format!("writing {}", path.display()))
}

fn cmd_new(args: NewArgs) -> anyhow::Result<()> {
    if args.item.trim().is_empty() {
        bail!("item id must not be blank");
    }
    if args.file.exists() && !args.force {
        bail!("{} already exists (use --force to replace it)", args.file.display());
    }
    let stack = ItemStack::new(args.item, args.count);
    save_stack(&stack, &args.file)?;
    println!(
        "{} Created {} in {}",
        "✓".green().bold(),
        stack.to_string().bold(),
        args.file.display()
    );
    Ok(())
}

fn cmd_show(args: InspectArgs) -> anyhow::Result<()> {
    let stack = load_stack(&args.file)?;
    match args.format {
        OutputFormat::Json => println!("{}", stack.to_json()?),
        OutputFormat::Text => {
            println!("{} x{}", stack.item.bold(), stack.count);
            match stack.root() {
                Some(root) if !root.is_empty() => println!("  {}", root.to_string().cyan()),
                _ => println!("  {}", "(no data)".dimmed()),
            }
        }
    }
    Ok(())
}

/// Category name and key count for every sub-tree on the stack.
fn category_sizes(stack: &ItemStack) -> BTreeMap<String, usize> {
    stack
        .categories()
        .into_iter()
        .map(|category| {
            let keys = stack.subtree(&category).map_or(0, |tree| tree.len());
            (category, keys)
        })
        .collect()
}

fn cmd_categories(args: InspectArgs) -> anyhow::Result<()> {
    let stack = load_stack(&args.file)?;
    let sizes = category_sizes(&stack);
    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&sizes)?);
        return Ok(());
    }
    if sizes.is_empty() {
        println!("No categories.");
        return Ok(());
    }
    for (category, keys) in sizes {
        println!("  {} ({} keys)", category.yellow(), keys);
    }
    Ok(())
}

fn cmd_clear(args: ClearArgs) -> anyhow::Result<()> {
    let mut stack = load_stack(&args.file)?;
    if stack.remove_subtree(&args.category).is_none() {
        println!("No category {} on {}.", args.category.yellow(), stack.item);
        return Ok(());
    }
    save_stack(&stack, &args.file)?;
    println!("{} Removed {}", "✓".green(), args.category.yellow());
    Ok(())
}

/// The data object the demo walks through.
#[derive(Debug, Default, Clone, PartialEq)]
struct Counter {
    count: i32,
    label: String,
}

impl Linked for Counter {
    fn shape() -> DataShape<Self> {
        DataShape::automatic()
            .with_default_factory()
            .field(field!(Counter, count))
            .field(field!(Counter, label))
    }
}

impl LinkedData for Counter {
    const CATEGORY: &'static str = "counter";
}

fn print_report(step: &str, report: &LinkReport) {
    if report.is_complete() {
        println!("  {step}: {}", report.to_string().dimmed());
        return;
    }
    println!("  {step}: {}", report.to_string().yellow());
    for failure in report.failures() {
        println!("    {} {}", "!".yellow(), failure);
    }
}

/// Fetch the counter, set it, and fetch it again. Returns the value read
/// after synchronization.
fn run_demo(
    stack: &mut ItemStack,
    manager: &DataManager,
    count: i32,
    label: &str,
) -> anyhow::Result<Counter> {
    println!("State: {}", manager.state::<Counter, _>(&*stack)?.to_string().cyan());

    let (mut counter, report) = manager.get_with_report::<Counter, _>(stack)?;
    print_report("get", &report);
    println!("  count={} label={:?}", counter.count, counter.label);

    let report = manager.use_data(stack, &mut counter, |c| {
        c.count = count;
        c.label = label.to_string();
    })?;
    print_report("use", &report);

    let (counter, report) = manager.get_with_report::<Counter, _>(stack)?;
    print_report("get", &report);
    println!("  count={} label={:?}", counter.count, counter.label);
    Ok(counter)
}

fn cmd_demo(args: DemoArgs, config: SyncConfig) -> anyhow::Result<()> {
    let mut stack = load_stack(&args.file)?;
    let manager = DataManager::with_config(Arc::new(CodecRegistry::with_defaults()), config);

    let counter = run_demo(&mut stack, &manager, args.count, &args.label)?;
    save_stack(&stack, &args.file)?;
    println!(
        "{} Stored counter {} / {:?} on {}",
        "✓".green().bold(),
        counter.count,
        counter.label,
        args.file.display()
    );
    Ok(())
}
