//! hcadmin: manage a directory of installed chains
//!
//! Commands:
//!   hcadmin init          create the service root and agent identity
//!   hcadmin list          list installed chains
//!   hcadmin gen dev       generate the built-in development chain
//!   hcadmin gen scaffold  generate a chain from a scaffold template
//!   hcadmin gen chain     start a chain (store + genesis)
//!   hcadmin clone         fork or join an installed chain
//!   hcadmin show          print a chain's DNA and runtime config

use hc_service::layout::DEFAULT_DIRECTORY_NAME;
use hc_service::scaffold::BASIC_TEMPLATE_SCAFFOLD;
use hc_service::{
    is_initialized, ConfigOverrides, DbInitPolicy, EncodingFormat, LineagePolicy, Service, ServiceError,
    ServiceResult,
};
use log::debug;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Overrides the service root, like `--path`
const PATH_ENV: &str = "HOLOPATH";

/// Failure of a CLI command
#[derive(Error, Debug)]
enum CliError {
    /// Missing or malformed arguments; carries the command's usage line
    #[error("{0}")]
    Usage(&'static str),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl CliError {
    fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Service(_) => 1,
        }
    }
}

type CliResult<T> = Result<T, CliError>;

fn print_usage() {
    println!(
        r#"
hcadmin: instance management for agent-centric chains

Usage: hcadmin [--path <dir>] <command> [options]

Commands:
  init       <identity>                                   Initialize the service root
  list                                                    List installed chains
  gen dev    <name> [json|toml] [--no-db]                 Generate the development chain
  gen scaffold <name> [file] [--app <name>] [--format json|toml] [--force]
                                                          Generate a chain from a scaffold
  gen chain  <name>                                       Start a chain
  clone      <source> <name> [--fork|--join] [--no-db]    Clone an installed chain
  show       <name>                                       Show DNA and runtime config

The service root defaults to $HOLOPATH, then ~/{dir}.
Runtime config overrides are read from HOLOCHAINCONFIG_PORT,
HOLOCHAINCONFIG_ENABLEMDNS, HOLOCHAINCONFIG_LOGPREFIX and
HOLOCHAINCONFIG_BOOTSTRAP ("_" disables bootstrap).

Examples:
  hcadmin init "Fred Flintstone <fred@flintstone.com>"
  hcadmin gen dev sample toml
  hcadmin gen chain sample
  hcadmin clone sample my-fork --fork
"#,
        dir = DEFAULT_DIRECTORY_NAME
    );
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let root = take_path_option(&mut args);
    if args.is_empty() {
        print_usage();
        return;
    }

    let rest = &args[1..];
    let result = match args[0].as_str() {
        "init" => cmd_init(&root, rest),
        "list" => cmd_list(&root),
        "gen" => cmd_gen(&root, rest),
        "clone" => cmd_clone(&root, rest),
        "show" => cmd_show(&root, rest),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other);
            print_usage();
            std::process::exit(2);
        }
    };

    match result {
        Ok(()) => {}
        Err(e @ CliError::Usage(_)) => {
            eprintln!("{}", e);
            std::process::exit(e.exit_code());
        }
        Err(e) => {
            eprintln!("  Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

/// Pull `--path <dir>` out of `args`, falling back to the environment
fn take_path_option(args: &mut Vec<String>) -> PathBuf {
    if let Some(pos) = args.iter().position(|a| a == "--path") {
        if pos + 1 < args.len() {
            let path = args.remove(pos + 1);
            args.remove(pos);
            return PathBuf::from(path);
        }
    }
    if let Ok(path) = env::var(PATH_ENV) {
        return PathBuf::from(path);
    }
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(DEFAULT_DIRECTORY_NAME)
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn option_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|pos| args.get(pos + 1))
        .map(String::as_str)
}

/// Positional arguments, skipping flags and the values of `--format`/`--app`
fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--format" | "--app" => {
                iter.next();
            }
            a if a.starts_with("--") => {}
            a => out.push(a),
        }
    }
    out
}

fn db_policy(args: &[String]) -> DbInitPolicy {
    if has_flag(args, "--no-db") {
        DbInitPolicy::SkipInitializeDb
    } else {
        DbInitPolicy::InitializeDb
    }
}

fn load_service(root: &Path) -> ServiceResult<Service> {
    let overrides = ConfigOverrides::from_env();
    if !overrides.is_empty() {
        debug!("Config overrides: {:?}", overrides);
    }
    Ok(Service::load(root)?.with_overrides(overrides))
}

fn cmd_init(root: &Path, args: &[String]) -> CliResult<()> {
    let identity = match args.first() {
        Some(identity) => identity,
        None => {
            return Err(CliError::Usage("Usage: hcadmin init <identity>"));
        }
    };
    if is_initialized(root) {
        return Err(CliError::Service(ServiceError::AlreadyInitialized(root.to_path_buf())));
    }
    let service = Service::init(root, identity)?;
    println!("\n  Service initialized at {}", service.root_path.display());
    println!("  Agent:   {}", service.default_agent.identity());
    println!("  Node ID: {}", service.default_agent.peer_id());
    Ok(())
}

fn cmd_list(root: &Path) -> CliResult<()> {
    let service = load_service(root)?;
    let (_, diagnostics) = service.configured_chains_with_diagnostics()?;
    println!("{}", service.list_chains()?);
    for diagnostic in diagnostics {
        eprintln!("  (skipped {}: {})", diagnostic.name, diagnostic.error);
    }
    Ok(())
}

fn cmd_gen(root: &Path, args: &[String]) -> CliResult<()> {
    let rest = args.get(1..).unwrap_or_default();
    match args.first().map(String::as_str) {
        Some("dev") => cmd_gen_dev(root, rest),
        Some("scaffold") => cmd_gen_scaffold(root, rest),
        Some("chain") => cmd_gen_chain(root, rest),
        _ => {
            Err(CliError::Usage("Usage: hcadmin gen [dev|scaffold|chain] <name> ..."))
        }
    }
}

fn cmd_gen_dev(root: &Path, args: &[String]) -> CliResult<()> {
    let positional = positionals(args);
    let name = match positional.first() {
        Some(name) => *name,
        None => {
            return Err(CliError::Usage("Usage: hcadmin gen dev <name> [json|toml] [--no-db]"));
        }
    };
    let format: EncodingFormat = positional.get(1).copied().unwrap_or("json").parse()?;

    let service = load_service(root)?;
    let chain = service.gen_dev(&service.instance_root(name), format, db_policy(args))?;
    println!("\n  Generated {} at {}", chain.name(), chain.root_path().display());
    println!("  DNA uuid: {}", chain.dna().uuid);
    Ok(())
}

fn cmd_gen_scaffold(root: &Path, args: &[String]) -> CliResult<()> {
    let positional = positionals(args);
    let name = match positional.first() {
        Some(name) => *name,
        None => {
            return Err(CliError::Usage(
                "Usage: hcadmin gen scaffold <name> [file] [--app <name>] [--format json|toml] [--force]",
            ));
        }
    };
    let format: EncodingFormat = option_value(args, "--format").unwrap_or("json").parse()?;
    let app_name = option_value(args, "--app").unwrap_or(name);
    let overwrite = has_flag(args, "--force");

    let service = load_service(root)?;
    let target = service.instance_root(name);
    let scaffold = match positional.get(1) {
        Some(file) => {
            let path = PathBuf::from(*file);
            let reader = std::fs::File::open(&path).map_err(|e| ServiceError::io(&path, e))?;
            service.save_scaffold(std::io::BufReader::new(reader), &target, app_name, format, overwrite)?
        }
        None => service.save_scaffold(BASIC_TEMPLATE_SCAFFOLD.as_bytes(), &target, app_name, format, overwrite)?,
    };
    println!("\n  Scaffold {} written to {}", scaffold.scaffold_version, target.display());
    println!("  Zomes:     {}", scaffold.dna.zomes.len());
    println!("  Scenarios: {}", scaffold.scenarios.len());
    Ok(())
}

fn cmd_gen_chain(root: &Path, args: &[String]) -> CliResult<()> {
    let name = match args.first() {
        Some(name) => name,
        None => {
            return Err(CliError::Usage("Usage: hcadmin gen chain <name>"));
        }
    };
    let service = load_service(root)?;
    let chain = service.gen_chain(name)?;
    println!("\n  Started {}", chain.name());
    println!("  DNA hash: {}", chain.dna_hash().unwrap_or_default());
    println!("  Node ID:  {}", chain.node_id_str());
    Ok(())
}

fn cmd_clone(root: &Path, args: &[String]) -> CliResult<()> {
    let positional = positionals(args);
    if positional.len() < 2 {
        return Err(CliError::Usage("Usage: hcadmin clone <source> <name> [--fork|--join] [--no-db]"));
    }
    let service = load_service(root)?;
    let agent = service.default_agent.clone();
    let policy = if has_flag(args, "--join") {
        LineagePolicy::join()
    } else {
        LineagePolicy::fork(&agent)
    };

    let source = service.instance_root(positional[0]);
    let target = service.instance_root(positional[1]);
    let chain = service.clone_chain(&source, &target, &agent, policy.clone(), db_policy(args))?;
    println!("\n  Cloned ({}) {} -> {}", policy.label(), positional[0], chain.name());
    println!("  DNA uuid:   {}", chain.dna().uuid);
    println!("  Progenitor: {}", chain.dna().progenitor.identity);
    Ok(())
}

fn cmd_show(root: &Path, args: &[String]) -> CliResult<()> {
    let name = match args.first() {
        Some(name) => name,
        None => {
            return Err(CliError::Usage("Usage: hcadmin show <name>"));
        }
    };
    let service = load_service(root)?;
    let chain = service.load_chain(name)?;
    let config = chain.config();

    println!("\n  {} ({})", chain.name(), chain.encoding_format());
    println!("  {}", "-".repeat(60));
    println!("  DNA:        {} v{}", chain.dna().name, chain.dna().version);
    println!("  UUID:       {}", chain.dna().uuid);
    println!("  Progenitor: {}", chain.dna().progenitor.identity);
    if let Some(based_on) = &chain.dna().based_on {
        println!("  Based on:   {}", based_on);
    }
    println!("  Zomes:      {}", chain.dna().zomes.iter().map(|z| z.name.as_str()).collect::<Vec<_>>().join(", "));
    println!("  Agent:      {}", chain.agent().identity());
    println!("  Node ID:    {}", chain.node_id_str());
    println!("  DNA hash:   {}", chain.dna_hash().unwrap_or("<not-started>"));
    println!("  Port:       {}", config.port);
    println!(
        "  Peer modes: author={} dht={}",
        config.peer_mode_author, config.peer_mode_dht_node
    );
    println!(
        "  Bootstrap:  {}",
        if config.bootstrap_server.is_empty() { "<disabled>" } else { config.bootstrap_server.as_str() }
    );
    println!("  mDNS:       {}", config.enable_mdns);
    Ok(())
}
