//! Chronicle audit engine — Demo CLI
//!
//! Walks a sample `Account` entity through the three lifecycle events and
//! prints the audit records each one produces.  The policy is loaded from
//! an embedded TOML document so the demo doubles as a format reference.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- insert
//!   cargo run -p demo -- update
//!   cargo run -p demo -- delete

use std::collections::BTreeSet;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

use chronicle_contracts::{error::ChronicleResult, record::ValueMap};
use chronicle_core::{
    ActorResolver, ChangeCapture, ChangeHandler, ChangeHandlers, EntityAdapter, RequestContext,
};
use chronicle_policy::AuditPolicy;
use chronicle_sink::MemorySink;

// ── Policy document ───────────────────────────────────────────────────────────

const POLICY_TOML: &str = r#"
[settings]
verbose = true
log_identifiers = true
truncate_length = 120
default_mask = ["password"]
session_attribute_key = "user"
default_actor = "system"

[entities.Account]
exclude = ["version"]
"#;

// ── CLI definition ────────────────────────────────────────────────────────────

/// Chronicle — entity-change auditing demo.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "Chronicle audit engine demo",
    long_about = "Walks a sample Account entity through insert, update, and delete,\n\
                  printing the audit records emitted for each lifecycle event."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the insert, update, and delete walkthroughs in sequence.
    RunAll,
    /// Insert an Account (verbose: one record per property).
    Insert,
    /// Update an Account (one record per changed property; password masked).
    Update,
    /// Delete an Account (collection prior values become "N/A").
    Delete,
}

// ── Sample entity ─────────────────────────────────────────────────────────────

/// The demo entity: a snapshot of an Account's old and new state plus the
/// property names its persistence layer would report dirty.
struct Account {
    old: ValueMap,
    new: ValueMap,
    dirty: Vec<String>,
}

impl Account {
    fn sample() -> Self {
        let old = [
            ("name".to_string(), json!("Ada Lovelace")),
            ("email".to_string(), json!("ada@example.org")),
            ("password".to_string(), json!("correct-horse")),
            ("tags".to_string(), json!([{ "id": 1, "label": "vip" }])),
            ("version".to_string(), json!(3)),
        ]
        .into();

        let new = [
            ("name".to_string(), json!("Ada Lovelace")),
            ("email".to_string(), json!("countess@example.org")),
            ("password".to_string(), json!("battery-staple")),
            (
                "tags".to_string(),
                json!([{ "id": 1, "label": "vip" }, { "id": 7, "label": "founder" }]),
            ),
            ("version".to_string(), json!(4)),
        ]
        .into();

        Self {
            old,
            new,
            dirty: vec!["email".to_string(), "password".to_string(), "version".to_string()],
        }
    }
}

impl EntityAdapter for Account {
    fn entity_class(&self) -> &str {
        "Account"
    }

    fn persistent_properties(&self) -> Vec<String> {
        self.new.keys().cloned().collect()
    }

    fn is_collection(&self, property: &str) -> bool {
        property == "tags"
    }

    fn dirty_properties(&self) -> Vec<String> {
        self.dirty.clone()
    }

    fn dirty_collections(&self) -> Vec<String> {
        vec!["tags".to_string()]
    }

    fn prior_value(&self, property: &str) -> ChronicleResult<Value> {
        Ok(self.old.get(property).cloned().unwrap_or(Value::Null))
    }

    fn current_value(&self, property: &str) -> ChronicleResult<Value> {
        Ok(self.new.get(property).cloned().unwrap_or(Value::Null))
    }

    fn identifier(&self) -> Option<Value> {
        Some(json!("acct-42"))
    }

    fn change_handler(&self) -> Option<ChangeHandlers<'_>> {
        Some(ChangeHandlers::TwoArg(self))
    }
}

impl ChangeHandler for Account {
    fn on_change(&self, old_values: &ValueMap, new_values: &ValueMap) {
        let changed: BTreeSet<&String> = new_values.keys().collect();
        println!("  on_change fired for {} properties: {:?}", old_values.len(), changed);
    }
}

// ── Walkthroughs ──────────────────────────────────────────────────────────────

fn build_capture(sink: MemorySink) -> ChangeCapture {
    let policy = AuditPolicy::from_toml_str(POLICY_TOML).expect("embedded policy must parse");
    // Strategy keys and default actor come from the loaded [settings] table.
    let resolver = ActorResolver::from_config(policy.config());
    ChangeCapture::new(policy, resolver, Box::new(sink))
}

fn request_context() -> RequestContext {
    RequestContext {
        uri: Some("/accounts/acct-42".to_string()),
        remote_user: Some("ada".to_string()),
        ..RequestContext::default()
    }
}

fn print_records(sink: &MemorySink) {
    for record in sink.records() {
        println!(
            "  {} {} id={} property={} old={} new={} actor={}",
            record.event_kind,
            record.entity_type,
            record.entity_id.as_deref().unwrap_or("-"),
            record.property_name.as_deref().unwrap_or("-"),
            record.old_value.as_deref().unwrap_or("-"),
            record.new_value.as_deref().unwrap_or("-"),
            record.actor,
        );
    }
}

fn run_insert() {
    println!("── insert ──");
    let sink = MemorySink::new();
    let capture = build_capture(sink.clone());
    capture.after_insert(&Account::sample(), Some(&request_context()));
    print_records(&sink);
}

fn run_update() {
    println!("── update ──");
    let sink = MemorySink::new();
    let capture = build_capture(sink.clone());
    capture.before_update(&Account::sample(), Some(&request_context()));
    print_records(&sink);
}

fn run_delete() {
    println!("── delete ──");
    let sink = MemorySink::new();
    let capture = build_capture(sink.clone());
    capture.before_delete(&Account::sample(), Some(&request_context()));
    print_records(&sink);
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::RunAll => {
            run_insert();
            run_update();
            run_delete();
        }
        Command::Insert => run_insert(),
        Command::Update => run_update(),
        Command::Delete => run_delete(),
    }
}
