//! CLI binary for driving nodes through the Sentinel readiness gate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use sentinel_gate::GateEngine;
use sentinel_interview::{InterviewOutcome, Language, Question};
use sentinel_kb::KbStore;
use sentinel_types::{Node, NodeSpec, ParamSpec};

#[derive(Parser)]
#[command(name = "sentinel", version, about = "Readiness gate for generated code")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Session file holding the node registry
    #[arg(short, long, global = true, default_value = ".sentinel/session.json")]
    session: PathBuf,

    /// Knowledge base JSONL file for the rule-engine tier
    #[arg(short, long, global = true)]
    kb: Option<PathBuf>,

    /// Interview prompt language (en-US or zh-TW)
    #[arg(short, long, global = true, default_value = "en-US")]
    lang: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a node to the session
    Add {
        /// Node id, e.g. process_order
        id: String,

        /// Free-form requirement description
        description: String,

        /// Declared input, name:type (repeatable)
        #[arg(long = "input")]
        inputs: Vec<String>,

        /// Declared output, name:type (repeatable)
        #[arg(long = "output")]
        outputs: Vec<String>,

        /// Numeric constraint, key=value (repeatable), e.g. max_complexity=5
        #[arg(long = "constraint")]
        constraints: Vec<String>,

        /// Upstream dependency node id (repeatable)
        #[arg(long = "depends-on")]
        depends_on: Vec<String>,
    },

    /// Show node statuses, or one node in detail
    Status {
        node: Option<String>,
    },

    /// Try to unlock a node whose dependencies may have implemented
    Unlock {
        node: String,
    },

    /// Run the readiness interview for a node
    Assess {
        node: String,
    },

    /// Answer an interview question
    Answer {
        node: String,
        question: String,
        value: String,
    },

    /// Request candidate generation through the fallback tiers
    Generate {
        node: String,
    },

    /// Validate candidate code (the last generated candidate, or a file)
    Validate {
        node: String,

        /// Validate this file instead of the pending candidate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Check the session's dependency graph for cycles
    Check,
}

/// On-disk session: the node registry plus candidates awaiting validation.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Session {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    pending_candidates: BTreeMap<String, String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let lang = parse_lang(&cli.lang)?;
    let kb = match &cli.kb {
        Some(path) => KbStore::load(path)?,
        None => KbStore::default(),
    };
    let mut session = load_session(&cli.session)?;
    let engine = build_engine(&session, kb).await?;

    match cli.command {
        Commands::Add {
            id,
            description,
            inputs,
            outputs,
            constraints,
            depends_on,
        } => {
            cmd_add(&engine, id, description, inputs, outputs, constraints, depends_on).await?;
        }
        Commands::Status { node } => {
            cmd_status(&engine, &session, node.as_deref()).await?;
        }
        Commands::Unlock { node } => {
            let status = engine.resolve_dependencies(&node).await?;
            println!("{node}: {status:?} [{:?}]", status.color());
        }
        Commands::Assess { node } => {
            cmd_assess(&engine, &node, lang).await?;
        }
        Commands::Answer { node, question, value } => {
            cmd_answer(&engine, &node, &question, &value, lang).await?;
        }
        Commands::Generate { node } => {
            cmd_generate(&engine, &mut session, &node).await?;
        }
        Commands::Validate { node, file } => {
            cmd_validate(&engine, &mut session, &node, file.as_deref()).await?;
        }
        Commands::Check => {
            engine.check_cycles().await?;
            println!("Dependency graph is acyclic");
        }
    }

    save_session(&cli.session, &engine, &mut session).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn cmd_add(
    engine: &GateEngine,
    id: String,
    description: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    constraints: Vec<String>,
    depends_on: Vec<String>,
) -> anyhow::Result<()> {
    let mut spec = NodeSpec::default();
    for raw in &inputs {
        spec.inputs.push(parse_param(raw)?);
    }
    for raw in &outputs {
        spec.outputs.push(parse_param(raw)?);
    }
    for raw in &constraints {
        let (key, value) = parse_constraint(raw)?;
        spec.constraints.insert(key, value);
    }
    let analysis = sentinel_interview::analyze_description(&description);
    let node = Node::with_dependencies(
        id.clone(),
        description,
        spec,
        depends_on.into_iter().collect(),
    );
    let status = node.status();
    engine.register(node).await?;
    println!("Added {id}: {status:?} [{:?}]", status.color());
    if !analysis.fuzzy_hits.is_empty() {
        println!("  vague wording: {}", analysis.fuzzy_hits.join(", "));
    }
    if !analysis.disaster_hits.is_empty() {
        println!("  high-risk domains: {}", analysis.disaster_hits.join(", "));
    }
    if analysis.needs_interview {
        println!("  an interview will be required before generation");
    }
    Ok(())
}

async fn cmd_status(
    engine: &GateEngine,
    session: &Session,
    node: Option<&str>,
) -> anyhow::Result<()> {
    match node {
        Some(id) => {
            let snapshot = engine.snapshot(id).await?;
            let status = snapshot.status();
            println!("{id}: {status:?} [{:?}]", status.color());
            println!("Description: {}", snapshot.description);
            if !snapshot.upstream_dependencies.is_empty() {
                let deps: Vec<&str> = snapshot
                    .upstream_dependencies
                    .iter()
                    .map(String::as_str)
                    .collect();
                println!("Depends on: {}", deps.join(", "));
            }
            if !snapshot.answers().is_empty() {
                println!("\nAnswers:");
                for (question_id, answer) in snapshot.answers() {
                    println!("  {question_id} = {}", answer.value);
                }
            }
            if let Some(report) = snapshot.last_report() {
                println!(
                    "\nLast validation: {:?} (quality {})",
                    report.overall_verdict, report.quality_score
                );
                for suggestion in &report.suggestions {
                    println!("  {suggestion}");
                }
            }
        }
        None => {
            if session.nodes.is_empty() {
                println!("No nodes in session");
                return Ok(());
            }
            for stored in &session.nodes {
                let status = engine.node_status(&stored.id).await?;
                println!("{} {:?} [{:?}]", stored.id, status, status.color());
            }
        }
    }
    Ok(())
}

async fn cmd_assess(engine: &GateEngine, node: &str, lang: Language) -> anyhow::Result<()> {
    match engine.assess_requirement(node).await? {
        InterviewOutcome::Cleared => {
            println!("{node}: interview cleared, ready for generation");
        }
        InterviewOutcome::NotCleared { next_question } => {
            print_question(node, &next_question, lang);
        }
    }
    Ok(())
}

async fn cmd_answer(
    engine: &GateEngine,
    node: &str,
    question: &str,
    value: &str,
    lang: Language,
) -> anyhow::Result<()> {
    match engine.submit_answer(node, question, value).await? {
        InterviewOutcome::Cleared => {
            println!("{node}: interview cleared, ready for generation");
        }
        InterviewOutcome::NotCleared { next_question } => {
            print_question(node, &next_question, lang);
        }
    }
    Ok(())
}

async fn cmd_generate(
    engine: &GateEngine,
    session: &mut Session,
    node: &str,
) -> anyhow::Result<()> {
    let candidate = engine.request_generation(node).await?;
    println!(
        "Served by {} in {}ms ({} tier misses)",
        candidate.source_tier,
        candidate.latency_ms,
        candidate.fallback_trail.len()
    );
    for miss in &candidate.fallback_trail {
        println!("  {} missed: {}", miss.tier, miss.reason);
    }
    println!("\n{}", candidate.content);
    session
        .pending_candidates
        .insert(node.to_string(), candidate.content);
    Ok(())
}

async fn cmd_validate(
    engine: &GateEngine,
    session: &mut Session,
    node: &str,
    file: Option<&Path>,
) -> anyhow::Result<()> {
    let code = match file {
        Some(path) => std::fs::read_to_string(path)?,
        None => session
            .pending_candidates
            .get(node)
            .cloned()
            .ok_or_else(|| {
                anyhow::anyhow!("no pending candidate for '{node}'; generate first or pass --file")
            })?,
    };

    let report = engine.validate_candidate(node, &code).await?;
    session.pending_candidates.remove(node);

    println!(
        "Verdict: {:?} (quality {})",
        report.overall_verdict, report.quality_score
    );
    for result in &report.layer_results {
        println!(
            "  L{:02} {:24} {:?} — {}",
            result.layer_index, result.layer_name, result.verdict, result.detail
        );
    }
    if !report.suggestions.is_empty() {
        println!("\nSuggestions:");
        for suggestion in &report.suggestions {
            println!("  {suggestion}");
        }
    }
    let status = engine.node_status(node).await?;
    println!("\n{node}: {status:?} [{:?}]", status.color());
    Ok(())
}

fn print_question(node: &str, question: &Question, lang: Language) {
    println!("{node}: interview question {}", question.id);
    println!("  {}", question.prompt.get(lang));
    for option in &question.options {
        println!("    [{}] {}", option.value, option.label.get(lang));
        println!("        risk: {}", option.risk_note.get(lang));
    }
    println!(
        "\nAnswer with: sentinel answer {node} {} <value>",
        question.id
    );
}

// ---------------------------------------------------------------------------
// Session plumbing
// ---------------------------------------------------------------------------

fn load_session(path: &Path) -> anyhow::Result<Session> {
    if !path.exists() {
        return Ok(Session::default());
    }
    let data = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

async fn build_engine(session: &Session, kb: KbStore) -> anyhow::Result<GateEngine> {
    let engine = GateEngine::new(kb);
    for node in &session.nodes {
        engine.register(node.clone()).await?;
    }
    Ok(engine)
}

/// Write the registry back, preserving the session's node order and
/// appending newly added nodes at the end.
async fn save_session(
    path: &Path,
    engine: &GateEngine,
    session: &mut Session,
) -> anyhow::Result<()> {
    let mut ids: Vec<String> = session.nodes.iter().map(|n| n.id.clone()).collect();
    for id in engine.node_ids().await {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    let mut nodes = Vec::with_capacity(ids.len());
    for id in &ids {
        nodes.push(engine.snapshot(id).await?);
    }
    session.nodes = nodes;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(&session)?)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

fn parse_lang(raw: &str) -> anyhow::Result<Language> {
    match raw {
        "en-US" | "en" => Ok(Language::EnUs),
        "zh-TW" | "zh" => Ok(Language::ZhTw),
        other => anyhow::bail!("unsupported language '{other}' (expected en-US or zh-TW)"),
    }
}

fn parse_param(raw: &str) -> anyhow::Result<ParamSpec> {
    let (name, ty) = raw
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("expected name:type, got '{raw}'"))?;
    Ok(ParamSpec {
        name: name.trim().to_string(),
        ty: ty.trim().to_string(),
    })
}

fn parse_constraint(raw: &str) -> anyhow::Result<(String, i64)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected key=value, got '{raw}'"))?;
    let value: i64 = value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("constraint value must be an integer, got '{value}'"))?;
    Ok((key.trim().to_string(), value))
}
