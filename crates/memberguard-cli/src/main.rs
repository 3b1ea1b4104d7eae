//! memberguard - whitelist member-access policy CLI
//!
//! ## Commands
//!
//! - `check`: build a policy and report enrolled and ignored entries
//! - `query`: ask whether one member is exposed on a type
//! - `fingerprint`: print the content hash of a built policy

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use memberguard_core::{
    MemberKind, MemberSelector, PolicyFingerprint, TypeCatalog, WhitelistPolicy, WhitelistSource,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser)]
#[command(name = "memberguard")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Whitelist-based member access policy checker", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output and JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct PolicyInputs {
    /// Type catalog (JSON)
    #[arg(long)]
    catalog: PathBuf,

    /// Whitelist file, one entry per line
    #[arg(long)]
    whitelist: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the policy and report what was enrolled and what was ignored
    Check {
        #[command(flatten)]
        inputs: PolicyInputs,
    },

    /// Check whether a member is exposed on a concrete type
    Query {
        #[command(flatten)]
        inputs: PolicyInputs,

        /// Concrete type, fully qualified
        #[arg(long = "type")]
        type_name: String,

        /// Member in whitelist syntax, e.g. `render(int)` or `title`
        #[arg(long)]
        member: String,
    },

    /// Print the policy fingerprint
    Fingerprint {
        #[command(flatten)]
        inputs: PolicyInputs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    memberguard_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Check { inputs } => {
            let (_, policy) = load(&inputs)?;
            print_check(&check_summary(&policy), cli.json)
        }
        Commands::Query {
            inputs,
            type_name,
            member,
        } => {
            let (catalog, policy) = load(&inputs)?;
            let answer = query(&catalog, &policy, &type_name, &member)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&answer)?);
            } else {
                let verdict = if answer.exposed { "exposed" } else { "hidden" };
                println!("{} {} on {}: {}", answer.kind, member, type_name, verdict);
            }
            Ok(())
        }
        Commands::Fingerprint { inputs } => {
            let (_, policy) = load(&inputs)?;
            let fingerprint = policy.fingerprint();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&fingerprint)?);
            } else {
                println!("{}", fingerprint);
                println!("Entries: {}", fingerprint.entries);
            }
            Ok(())
        }
    }
}

fn load(inputs: &PolicyInputs) -> Result<(TypeCatalog, WhitelistPolicy)> {
    let catalog = TypeCatalog::from_json_file(&inputs.catalog)
        .with_context(|| format!("Failed to load type catalog {:?}", inputs.catalog))?;
    let policy = build_policy(&catalog, &inputs.whitelist)?;
    Ok((catalog, policy))
}

fn build_policy(catalog: &TypeCatalog, whitelist: &Path) -> Result<WhitelistPolicy> {
    let source = WhitelistSource::from_file(whitelist)
        .with_context(|| format!("Failed to read whitelist {:?}", whitelist))?;
    source
        .build_policy(catalog)
        .with_context(|| format!("Whitelist {:?} rejected", whitelist))
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct IgnoredEntry {
    entry: String,
    cause: String,
}

#[derive(Debug, Serialize)]
struct CheckSummary {
    methods: usize,
    constructors: usize,
    fields: usize,
    ignored: Vec<IgnoredEntry>,
    fingerprint: PolicyFingerprint,
}

fn check_summary(policy: &WhitelistPolicy) -> CheckSummary {
    let report = policy.report();
    CheckSummary {
        methods: report.methods,
        constructors: report.constructors,
        fields: report.fields,
        ignored: report
            .ignored
            .iter()
            .map(|failure| IgnoredEntry {
                entry: failure.entry.clone(),
                cause: failure.cause.to_string(),
            })
            .collect(),
        fingerprint: policy.fingerprint(),
    }
}

fn print_check(summary: &CheckSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("Methods:      {}", summary.methods);
    println!("Constructors: {}", summary.constructors);
    println!("Fields:       {}", summary.fields);
    println!("Ignored:      {}", summary.ignored.len());
    for ignored in &summary.ignored {
        println!("  {}: {}", ignored.entry, ignored.cause);
    }
    println!("Fingerprint:  {}", summary.fingerprint.short());
    Ok(())
}

// ---------------------------------------------------------------------------
// query
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct QueryAnswer {
    #[serde(rename = "type")]
    type_name: String,
    kind: String,
    member: String,
    exposed: bool,
}

fn query(
    catalog: &TypeCatalog,
    policy: &WhitelistPolicy,
    type_name: &str,
    member: &str,
) -> Result<QueryAnswer> {
    let text = format!("{}.{}", type_name, member);
    let selector = memberguard_core::parse(&text, catalog)
        .with_context(|| format!("Invalid member query {:?}", text))?;

    let answer = |kind: MemberKind, member: String, exposed: bool| QueryAnswer {
        type_name: type_name.to_string(),
        kind: kind.to_string(),
        member,
        exposed,
    };

    match selector {
        MemberSelector::Method {
            upper_bound,
            method,
        } => {
            let exposed = policy.for_type(&upper_bound).is_method_exposed(&method);
            Ok(answer(MemberKind::Method, method.signature.to_string(), exposed))
        }
        MemberSelector::Constructor {
            upper_bound,
            constructor,
        } => {
            let exposed = policy
                .for_type(&upper_bound)
                .is_constructor_exposed(&constructor);
            Ok(answer(
                MemberKind::Constructor,
                constructor.signature.to_string(),
                exposed,
            ))
        }
        MemberSelector::Field { upper_bound, field } => {
            let exposed = policy.for_type(&upper_bound).is_field_exposed(&field);
            Ok(answer(MemberKind::Field, field.signature.to_string(), exposed))
        }
        MemberSelector::Failure(failure) => bail!("Cannot resolve {}: {}", text, failure.cause),
    }
}
