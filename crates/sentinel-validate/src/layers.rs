//! The 17 canonical check layers.
//!
//! Grouping: structure (1-4), signature conformance (5-8), dependency
//! conformance (9-12), logic/security/complexity conformance (13-17). Every
//! layer is a language-light text analysis so the battery works on any
//! candidate the generation tiers may produce.

use std::collections::BTreeSet;

use regex::Regex;

use sentinel_types::{GateError, Node, NodeSpec, Result, Severity, Verdict};

// ---------------------------------------------------------------------------
// Trait and input/output types
// ---------------------------------------------------------------------------

/// Read-only snapshot of everything a layer may look at. Cloned out of the
/// node once per run so independent layers can execute concurrently.
#[derive(Debug, Clone)]
pub struct LayerInput {
    pub node_id: String,
    pub code: String,
    pub spec: NodeSpec,
    pub upstream_dependencies: BTreeSet<String>,
}

impl LayerInput {
    pub fn from_node(code: impl Into<String>, node: &Node) -> Self {
        Self {
            node_id: node.id.clone(),
            code: code.into(),
            spec: node.spec.clone(),
            upstream_dependencies: node.upstream_dependencies.clone(),
        }
    }
}

/// What a layer concluded. The blocking severity is a property of the layer,
/// not of the individual outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerOutcome {
    pub verdict: Verdict,
    pub detail: String,
}

impl LayerOutcome {
    pub fn pass(detail: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Pass,
            detail: detail.into(),
        }
    }

    pub fn warn(detail: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Warn,
            detail: detail.into(),
        }
    }

    pub fn fail(detail: impl Into<String>) -> Self {
        Self {
            verdict: Verdict::Fail,
            detail: detail.into(),
        }
    }
}

/// One check in the battery.
///
/// `prerequisite` declares the layer that must have passed for this one to
/// be meaningful; layers without one are mutually independent and may run
/// concurrently. An `Err` from `check` is recorded by the pipeline as a
/// fatal `Fail` — a layer that cannot evaluate never passes silently.
pub trait CheckLayer: Send + Sync {
    fn index(&self) -> u8;
    fn name(&self) -> &'static str;
    fn severity(&self) -> Severity;
    fn prerequisite(&self) -> Option<u8> {
        None
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome>;
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn layer_regex(layer_index: u8, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| GateError::LayerError {
        layer_index,
        message: e.to_string(),
    })
}

/// Root module names referenced by `use`/`import`/`from` statements.
fn import_roots(layer_index: u8, code: &str) -> Result<Vec<String>> {
    let re = layer_regex(
        layer_index,
        r"(?m)^\s*(?:use\s+([A-Za-z_][A-Za-z0-9_:]*)|import\s+([A-Za-z_][A-Za-z0-9_.]*)|from\s+([A-Za-z_.][A-Za-z0-9_.]*)\s+import)",
    )?;
    let mut roots = Vec::new();
    for caps in re.captures_iter(code) {
        let path = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|m| m.as_str())
            .unwrap_or_default();
        let root = path
            .split("::")
            .next()
            .unwrap_or(path)
            .split('.')
            .next()
            .unwrap_or(path);
        if !root.is_empty() {
            roots.push(root.to_string());
        }
    }
    Ok(roots)
}

/// Parameter names of the first function definition, if any.
fn first_signature_params(layer_index: u8, code: &str) -> Result<Option<Vec<String>>> {
    let re = layer_regex(layer_index, r"(?:fn|def)\s+\w+\s*\(([^)]*)\)")?;
    let Some(caps) = re.captures(code) else {
        return Ok(None);
    };
    let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
    let params = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .filter(|p| !matches!(*p, "self" | "&self" | "&mut self" | "cls"))
        .map(|p| {
            p.split(':')
                .next()
                .unwrap_or(p)
                .trim()
                .trim_start_matches("mut ")
                .trim()
                .to_string()
        })
        .collect();
    Ok(Some(params))
}

/// Module roots that never count against the upstream dependency set.
const STD_ROOTS: &[&str] = &[
    // Rust
    "std", "core", "alloc", "crate", "super",
    // Python
    "os", "sys", "json", "re", "datetime", "typing", "asyncio", "time", "math",
    "hashlib", "collections", "itertools", "functools", "enum", "dataclasses",
    "abc", "logging", "uuid", "__future__",
];

const THIRD_PARTY_ROOTS: &[&str] = &[
    "django", "flask", "fastapi", "requests", "numpy", "pandas", "redis",
    "sqlalchemy", "tokio", "serde", "reqwest", "axum",
];

// ---------------------------------------------------------------------------
// L1-L4: structure
// ---------------------------------------------------------------------------

/// L1: every bracket, brace, and parenthesis closes what it opened.
pub struct BalancedDelimiters;

impl CheckLayer for BalancedDelimiters {
    fn index(&self) -> u8 {
        1
    }
    fn name(&self) -> &'static str {
        "balanced-delimiters"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        if input.code.trim().is_empty() {
            return Ok(LayerOutcome::fail("empty candidate"));
        }
        let mut stack: Vec<char> = Vec::new();
        let mut in_string: Option<char> = None;
        let mut escaped = false;
        for ch in input.code.chars() {
            if let Some(quote) = in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    in_string = None;
                }
                continue;
            }
            match ch {
                '"' | '\'' => in_string = Some(ch),
                '(' | '[' | '{' => stack.push(ch),
                ')' | ']' | '}' => {
                    let expected = match ch {
                        ')' => '(',
                        ']' => '[',
                        _ => '{',
                    };
                    if stack.pop() != Some(expected) {
                        return Ok(LayerOutcome::fail(format!("unmatched '{ch}'")));
                    }
                }
                _ => {}
            }
        }
        if let Some(open) = stack.last() {
            return Ok(LayerOutcome::fail(format!("unclosed '{open}'")));
        }
        Ok(LayerOutcome::pass("delimiters balanced"))
    }
}

/// L2: the candidate defines at least one function or type.
pub struct DefinitionPresent;

impl CheckLayer for DefinitionPresent {
    fn index(&self) -> u8 {
        2
    }
    fn name(&self) -> &'static str {
        "definition-present"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let re = layer_regex(
            self.index(),
            r"(?m)^\s*(?:(?:pub\s+)?(?:async\s+)?fn|def|class|(?:pub\s+)?struct)\s+\w+",
        )?;
        if re.is_match(&input.code) {
            Ok(LayerOutcome::pass("definition found"))
        } else {
            Ok(LayerOutcome::fail("no function or type definition"))
        }
    }
}

/// L3: leading whitespace uses spaces, not tabs.
pub struct Indentation;

impl CheckLayer for Indentation {
    fn index(&self) -> u8 {
        3
    }
    fn name(&self) -> &'static str {
        "indentation"
    }
    fn severity(&self) -> Severity {
        Severity::Advisory
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let offenders: Vec<usize> = input
            .code
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let leading: String = line.chars().take_while(|c| c.is_whitespace()).collect();
                leading.contains('\t')
            })
            .map(|(i, _)| i + 1)
            .collect();
        if offenders.is_empty() {
            Ok(LayerOutcome::pass("indentation consistent"))
        } else {
            Ok(LayerOutcome::warn(format!(
                "{} line(s) indented with tabs, first at line {}",
                offenders.len(),
                offenders[0]
            )))
        }
    }
}

/// L4: snake_case functions, PascalCase types.
pub struct NamingConvention;

impl CheckLayer for NamingConvention {
    fn index(&self) -> u8 {
        4
    }
    fn name(&self) -> &'static str {
        "naming-convention"
    }
    fn severity(&self) -> Severity {
        Severity::Advisory
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let fn_re = layer_regex(self.index(), r"(?:fn|def)\s+(\w+)")?;
        let ty_re = layer_regex(self.index(), r"(?:class|struct)\s+(\w+)")?;
        let snake = layer_regex(self.index(), r"^[a-z_][a-z0-9_]*$")?;
        let pascal = layer_regex(self.index(), r"^[A-Z][A-Za-z0-9]*$")?;

        let mut offenders: Vec<String> = Vec::new();
        for caps in fn_re.captures_iter(&input.code) {
            let name = &caps[1];
            if !snake.is_match(name) {
                offenders.push(format!("function '{name}' is not snake_case"));
            }
        }
        for caps in ty_re.captures_iter(&input.code) {
            let name = &caps[1];
            if !pascal.is_match(name) {
                offenders.push(format!("type '{name}' is not PascalCase"));
            }
        }
        if offenders.is_empty() {
            Ok(LayerOutcome::pass("names conform"))
        } else {
            offenders.truncate(3);
            Ok(LayerOutcome::warn(offenders.join("; ")))
        }
    }
}

// ---------------------------------------------------------------------------
// L5-L8: signature conformance
// ---------------------------------------------------------------------------

/// L5: the first function's parameters match `spec.inputs` by name.
pub struct InputArity;

impl CheckLayer for InputArity {
    fn index(&self) -> u8 {
        5
    }
    fn name(&self) -> &'static str {
        "input-arity"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn prerequisite(&self) -> Option<u8> {
        Some(2)
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        if input.spec.inputs.is_empty() {
            return Ok(LayerOutcome::pass("no declared inputs"));
        }
        let Some(params) = first_signature_params(self.index(), &input.code)? else {
            return Ok(LayerOutcome::fail("no function signature found"));
        };
        let expected: BTreeSet<&str> =
            input.spec.inputs.iter().map(|p| p.name.as_str()).collect();
        let actual: BTreeSet<&str> = params.iter().map(String::as_str).collect();
        if expected == actual {
            Ok(LayerOutcome::pass(format!(
                "{} parameter(s) match the spec",
                expected.len()
            )))
        } else {
            Ok(LayerOutcome::fail(format!(
                "parameter mismatch: expected {expected:?}, found {actual:?}"
            )))
        }
    }
}

/// L6: a declared output implies the code actually returns something.
pub struct OutputPresence;

impl CheckLayer for OutputPresence {
    fn index(&self) -> u8 {
        6
    }
    fn name(&self) -> &'static str {
        "output-presence"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn prerequisite(&self) -> Option<u8> {
        Some(2)
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        if input.spec.outputs.is_empty() {
            return Ok(LayerOutcome::pass("no declared outputs"));
        }
        let re = layer_regex(self.index(), r"\breturn\b|->")?;
        if re.is_match(&input.code) {
            Ok(LayerOutcome::pass("return path present"))
        } else {
            Ok(LayerOutcome::fail(
                "spec declares outputs but the code never returns",
            ))
        }
    }
}

/// L7: type-annotation coverage of the first signature.
pub struct TypeAnnotations;

impl CheckLayer for TypeAnnotations {
    fn index(&self) -> u8 {
        7
    }
    fn name(&self) -> &'static str {
        "type-annotations"
    }
    fn severity(&self) -> Severity {
        Severity::Advisory
    }
    fn prerequisite(&self) -> Option<u8> {
        Some(2)
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let sig_re = layer_regex(self.index(), r"(?:fn|def)\s+\w+\s*\(([^)]*)\)")?;
        let Some(caps) = sig_re.captures(&input.code) else {
            return Ok(LayerOutcome::warn("no function signature found"));
        };
        let raw = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let params: Vec<&str> = raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty() && !matches!(*p, "self" | "&self" | "&mut self"))
            .collect();
        let annotated = params.iter().filter(|p| p.contains(':')).count();
        let has_return_hint = input.code.contains("->");

        let coverage = if params.is_empty() {
            1.0
        } else {
            annotated as f64 / params.len() as f64
        };
        if coverage >= 0.8 && has_return_hint {
            Ok(LayerOutcome::pass(format!(
                "annotation coverage {:.0}%",
                coverage * 100.0
            )))
        } else {
            Ok(LayerOutcome::warn(format!(
                "annotation coverage {:.0}%, return hint: {has_return_hint}",
                coverage * 100.0
            )))
        }
    }
}

/// L8: a documentation comment exists.
pub struct DocComment;

impl CheckLayer for DocComment {
    fn index(&self) -> u8 {
        8
    }
    fn name(&self) -> &'static str {
        "doc-comment"
    }
    fn severity(&self) -> Severity {
        Severity::Advisory
    }
    fn prerequisite(&self) -> Option<u8> {
        Some(2)
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let documented = input.code.contains("///")
            || input.code.contains("/**")
            || input.code.contains("\"\"\"");
        if documented {
            Ok(LayerOutcome::pass("documentation present"))
        } else {
            Ok(LayerOutcome::warn("no documentation comment"))
        }
    }
}

// ---------------------------------------------------------------------------
// L9-L12: dependency conformance
// ---------------------------------------------------------------------------

/// L9: imports are extractable. Feeds layers 10-12.
pub struct ImportScan;

impl CheckLayer for ImportScan {
    fn index(&self) -> u8 {
        9
    }
    fn name(&self) -> &'static str {
        "import-scan"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let roots = import_roots(self.index(), &input.code)?;
        Ok(LayerOutcome::pass(format!(
            "{} import statement(s)",
            roots.len()
        )))
    }
}

/// L10: every referenced module is either standard library or a declared
/// upstream dependency. Anything else is a fatal conformance failure.
pub struct UpstreamConformance;

impl CheckLayer for UpstreamConformance {
    fn index(&self) -> u8 {
        10
    }
    fn name(&self) -> &'static str {
        "upstream-conformance"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn prerequisite(&self) -> Option<u8> {
        Some(9)
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let roots = import_roots(self.index(), &input.code)?;
        let violations: Vec<String> = roots
            .into_iter()
            .filter(|root| {
                !STD_ROOTS.contains(&root.as_str())
                    && !input.upstream_dependencies.contains(root)
            })
            .collect();
        if violations.is_empty() {
            Ok(LayerOutcome::pass("all references within the dependency set"))
        } else {
            Ok(LayerOutcome::fail(format!(
                "references outside upstream dependencies: {violations:?}"
            )))
        }
    }
}

/// L11: recognized third-party frameworks, informational.
pub struct ThirdPartyImports;

impl CheckLayer for ThirdPartyImports {
    fn index(&self) -> u8 {
        11
    }
    fn name(&self) -> &'static str {
        "third-party-imports"
    }
    fn severity(&self) -> Severity {
        Severity::Advisory
    }
    fn prerequisite(&self) -> Option<u8> {
        Some(9)
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let roots = import_roots(self.index(), &input.code)?;
        let used: BTreeSet<String> = roots
            .into_iter()
            .filter(|root| THIRD_PARTY_ROOTS.contains(&root.as_str()))
            .collect();
        if used.is_empty() {
            Ok(LayerOutcome::pass("no third-party frameworks"))
        } else {
            Ok(LayerOutcome::pass(format!(
                "third-party frameworks in use: {used:?}"
            )))
        }
    }
}

/// L12: the candidate must not import itself or use relative imports —
/// both are circular-dependency smells.
pub struct SelfImport;

impl CheckLayer for SelfImport {
    fn index(&self) -> u8 {
        12
    }
    fn name(&self) -> &'static str {
        "self-import"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn prerequisite(&self) -> Option<u8> {
        Some(9)
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let relative = layer_regex(self.index(), r"(?m)^\s*from\s+\.")?;
        if relative.is_match(&input.code) {
            return Ok(LayerOutcome::fail("relative import detected"));
        }
        let roots = import_roots(self.index(), &input.code)?;
        if roots.iter().any(|root| root == &input.node_id) {
            return Ok(LayerOutcome::fail(format!(
                "candidate imports its own node '{}'",
                input.node_id
            )));
        }
        Ok(LayerOutcome::pass("no circular import risk"))
    }
}

// ---------------------------------------------------------------------------
// L13-L17: logic, security, complexity
// ---------------------------------------------------------------------------

/// L13: branch-count complexity against `constraints["max_complexity"]`.
pub struct ComplexityBudget;

impl ComplexityBudget {
    fn measure(&self, code: &str) -> Result<u64> {
        let branches = layer_regex(self.index(), r"\b(?:if|elif|for|while|match|case)\b")?;
        let count = branches.find_iter(code).count()
            + code.matches("&&").count()
            + code.matches("||").count();
        Ok(1 + count as u64)
    }
}

impl CheckLayer for ComplexityBudget {
    fn index(&self) -> u8 {
        13
    }
    fn name(&self) -> &'static str {
        "complexity-budget"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let Some(&budget) = input.spec.constraints.get("max_complexity") else {
            return Ok(LayerOutcome::pass("no complexity budget declared"));
        };
        let complexity = self.measure(&input.code)?;
        if complexity > budget.max(0) as u64 {
            Ok(LayerOutcome::fail(format!(
                "complexity {complexity} exceeds budget {budget}"
            )))
        } else {
            Ok(LayerOutcome::pass(format!(
                "complexity {complexity} within budget {budget}"
            )))
        }
    }
}

/// L14: placeholder bodies betray unfinished logic.
pub struct LogicCompleteness;

impl CheckLayer for LogicCompleteness {
    fn index(&self) -> u8 {
        14
    }
    fn name(&self) -> &'static str {
        "logic-completeness"
    }
    fn severity(&self) -> Severity {
        Severity::Advisory
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let placeholder = layer_regex(
            self.index(),
            r"todo!\s*\(|unimplemented!\s*\(|NotImplementedError",
        )?;
        if placeholder.is_match(&input.code) {
            return Ok(LayerOutcome::warn("placeholder body present"));
        }
        let branching = layer_regex(self.index(), r"\b(?:if|for|while|match)\b")?;
        if branching.is_match(&input.code) {
            Ok(LayerOutcome::pass("branching logic present"))
        } else {
            Ok(LayerOutcome::pass("straight-line logic"))
        }
    }
}

/// L15: error paths are handled, and not with empty handlers.
pub struct ErrorHandling;

impl CheckLayer for ErrorHandling {
    fn index(&self) -> u8 {
        15
    }
    fn name(&self) -> &'static str {
        "error-handling"
    }
    fn severity(&self) -> Severity {
        Severity::Advisory
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let empty_handler = layer_regex(
            self.index(),
            r"except[^\n:]*:\s*\n\s*pass\b|catch\s*\([^)]*\)\s*\{\s*\}",
        )?;
        if empty_handler.is_match(&input.code) {
            return Ok(LayerOutcome::warn("empty error handler"));
        }
        let handling = layer_regex(
            self.index(),
            r"\btry\b|\bexcept\b|\bcatch\b|Result<|\bErr\(|\bOk\(|\.unwrap_or|\?;",
        )?;
        if handling.is_match(&input.code) {
            Ok(LayerOutcome::pass("error handling present"))
        } else {
            Ok(LayerOutcome::fail("no error handling constructs"))
        }
    }
}

/// L16: dangerous calls and hardcoded secrets.
pub struct SecurityScan;

impl CheckLayer for SecurityScan {
    fn index(&self) -> u8 {
        16
    }
    fn name(&self) -> &'static str {
        "security-scan"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let mut issues: Vec<String> = Vec::new();
        let dangerous = layer_regex(
            self.index(),
            r"\b(?:eval|exec)\s*\(|pickle\.loads|os\.system\s*\(|subprocess\.",
        )?;
        if let Some(m) = dangerous.find(&input.code) {
            issues.push(format!("dangerous call: {}", m.as_str().trim_end_matches('(').trim()));
        }
        let secrets = layer_regex(
            self.index(),
            r#"(?i)(?:api_key|apikey|password|secret)\s*=\s*["'][^"']{8,}["']"#,
        )?;
        if secrets.is_match(&input.code) {
            issues.push("possible hardcoded credential".into());
        }
        if issues.is_empty() {
            Ok(LayerOutcome::pass("no obvious security issues"))
        } else {
            Ok(LayerOutcome::fail(issues.join("; ")))
        }
    }
}

/// L17: loop nesting depth against `constraints["max_loop_depth"]`
/// (default 2). Depth is estimated from indentation.
pub struct LoopNesting;

impl LoopNesting {
    fn max_depth(&self, code: &str) -> usize {
        let mut stack: Vec<usize> = Vec::new();
        let mut max_depth = 0;
        for line in code.lines() {
            let trimmed = line.trim_start();
            if trimmed.is_empty() {
                continue;
            }
            let indent = line.len() - trimmed.len();
            while stack.last().is_some_and(|&loop_indent| loop_indent >= indent) {
                stack.pop();
            }
            if trimmed.starts_with("for ") || trimmed.starts_with("while ") {
                stack.push(indent);
                max_depth = max_depth.max(stack.len());
            }
        }
        max_depth
    }
}

impl CheckLayer for LoopNesting {
    fn index(&self) -> u8 {
        17
    }
    fn name(&self) -> &'static str {
        "loop-nesting"
    }
    fn severity(&self) -> Severity {
        Severity::Fatal
    }
    fn check(&self, input: &LayerInput) -> Result<LayerOutcome> {
        let budget = input
            .spec
            .constraints
            .get("max_loop_depth")
            .copied()
            .unwrap_or(2)
            .max(0) as usize;
        let depth = self.max_depth(&input.code);
        if depth > budget {
            Ok(LayerOutcome::fail(format!(
                "loop nesting depth {depth} exceeds budget {budget}"
            )))
        } else {
            Ok(LayerOutcome::pass(format!(
                "max loop nesting depth {depth}"
            )))
        }
    }
}

/// The canonical battery, ordered 1..17.
pub fn standard_layers() -> Vec<std::sync::Arc<dyn CheckLayer>> {
    vec![
        std::sync::Arc::new(BalancedDelimiters),
        std::sync::Arc::new(DefinitionPresent),
        std::sync::Arc::new(Indentation),
        std::sync::Arc::new(NamingConvention),
        std::sync::Arc::new(InputArity),
        std::sync::Arc::new(OutputPresence),
        std::sync::Arc::new(TypeAnnotations),
        std::sync::Arc::new(DocComment),
        std::sync::Arc::new(ImportScan),
        std::sync::Arc::new(UpstreamConformance),
        std::sync::Arc::new(ThirdPartyImports),
        std::sync::Arc::new(SelfImport),
        std::sync::Arc::new(ComplexityBudget),
        std::sync::Arc::new(LogicCompleteness),
        std::sync::Arc::new(ErrorHandling),
        std::sync::Arc::new(SecurityScan),
        std::sync::Arc::new(LoopNesting),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_types::ParamSpec;

    fn input(code: &str) -> LayerInput {
        LayerInput {
            node_id: "n1".into(),
            code: code.into(),
            spec: NodeSpec::default(),
            upstream_dependencies: BTreeSet::new(),
        }
    }

    #[test]
    fn battery_is_complete_and_ordered() {
        let layers = standard_layers();
        assert_eq!(layers.len(), 17);
        for (i, layer) in layers.iter().enumerate() {
            assert_eq!(layer.index() as usize, i + 1);
        }
        // Prerequisites only point backwards.
        for layer in &layers {
            if let Some(pre) = layer.prerequisite() {
                assert!(pre < layer.index());
            }
        }
    }

    #[test]
    fn l1_balanced_and_unbalanced() {
        assert_eq!(
            BalancedDelimiters.check(&input("fn f() { (1 + [2]) }")).unwrap().verdict,
            Verdict::Pass
        );
        assert_eq!(
            BalancedDelimiters.check(&input("fn f() { (1 + 2 }")).unwrap().verdict,
            Verdict::Fail
        );
        assert_eq!(
            BalancedDelimiters.check(&input("   ")).unwrap().verdict,
            Verdict::Fail
        );
    }

    #[test]
    fn l1_ignores_delimiters_inside_strings() {
        let outcome = BalancedDelimiters
            .check(&input(r#"fn f() { let s = "unclosed ( ["; }"#))
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Pass);
    }

    #[test]
    fn l2_definition_detection() {
        assert_eq!(
            DefinitionPresent.check(&input("def handle(x):\n    return x")).unwrap().verdict,
            Verdict::Pass
        );
        assert_eq!(
            DefinitionPresent.check(&input("pub async fn run() {}")).unwrap().verdict,
            Verdict::Pass
        );
        assert_eq!(
            DefinitionPresent.check(&input("x = 1 + 2")).unwrap().verdict,
            Verdict::Fail
        );
    }

    #[test]
    fn l3_tabs_warn() {
        let outcome = Indentation.check(&input("def f():\n\treturn 1")).unwrap();
        assert_eq!(outcome.verdict, Verdict::Warn);
        assert!(outcome.detail.contains("line 2"));
    }

    #[test]
    fn l4_naming() {
        let outcome = NamingConvention
            .check(&input("def BadName():\n    pass\nclass good_name:\n    pass"))
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Warn);
        assert!(outcome.detail.contains("BadName"));
        assert!(outcome.detail.contains("good_name"));

        let ok = NamingConvention
            .check(&input("def fine_name():\n    pass\nclass FineType:\n    pass"))
            .unwrap();
        assert_eq!(ok.verdict, Verdict::Pass);
    }

    #[test]
    fn l5_parameter_conformance() {
        let mut li = input("def charge(order_id: str, amount: int) -> dict:\n    return {}");
        li.spec.inputs = vec![
            ParamSpec { name: "order_id".into(), ty: "string".into() },
            ParamSpec { name: "amount".into(), ty: "int".into() },
        ];
        assert_eq!(InputArity.check(&li).unwrap().verdict, Verdict::Pass);

        li.spec.inputs.push(ParamSpec { name: "currency".into(), ty: "string".into() });
        let outcome = InputArity.check(&li).unwrap();
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.detail.contains("currency"));
    }

    #[test]
    fn l5_rust_signature_with_self() {
        let mut li = input("fn apply(&mut self, amount: u64) -> u64 { amount }");
        li.spec.inputs = vec![ParamSpec { name: "amount".into(), ty: "u64".into() }];
        assert_eq!(InputArity.check(&li).unwrap().verdict, Verdict::Pass);
    }

    #[test]
    fn l6_output_presence() {
        let mut li = input("def f(x):\n    print(x)");
        li.spec.outputs = vec![ParamSpec { name: "result".into(), ty: "dict".into() }];
        assert_eq!(OutputPresence.check(&li).unwrap().verdict, Verdict::Fail);

        let mut li = input("def f(x):\n    return x");
        li.spec.outputs = vec![ParamSpec { name: "result".into(), ty: "dict".into() }];
        assert_eq!(OutputPresence.check(&li).unwrap().verdict, Verdict::Pass);
    }

    #[test]
    fn l7_annotation_coverage() {
        let full = TypeAnnotations
            .check(&input("def f(a: int, b: str) -> bool:\n    return True"))
            .unwrap();
        assert_eq!(full.verdict, Verdict::Pass);

        let none = TypeAnnotations.check(&input("def f(a, b):\n    return a")).unwrap();
        assert_eq!(none.verdict, Verdict::Warn);
    }

    #[test]
    fn l8_doc_comment() {
        assert_eq!(
            DocComment.check(&input("/// does a thing\nfn f() {}")).unwrap().verdict,
            Verdict::Pass
        );
        assert_eq!(
            DocComment.check(&input("fn f() {}")).unwrap().verdict,
            Verdict::Warn
        );
    }

    #[test]
    fn l9_counts_imports() {
        let outcome = ImportScan
            .check(&input("use std::io;\nimport json\nfrom typing import Dict\nfn f() {}"))
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Pass);
        assert!(outcome.detail.contains('3'));
    }

    #[test]
    fn l10_flags_reference_outside_upstream_set() {
        let mut li = input("use cart::Total;\nuse std::io;\nfn f() {}");
        let outcome = UpstreamConformance.check(&li).unwrap();
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.detail.contains("cart"));

        li.upstream_dependencies.insert("cart".into());
        assert_eq!(UpstreamConformance.check(&li).unwrap().verdict, Verdict::Pass);
    }

    #[test]
    fn l10_stdlib_is_always_allowed() {
        let li = input("import json\nimport datetime\nuse std::collections::HashMap;\nfn f() {}");
        assert_eq!(UpstreamConformance.check(&li).unwrap().verdict, Verdict::Pass);
    }

    #[test]
    fn l11_reports_third_party() {
        let mut li = input("import requests\nfn f() {}");
        li.upstream_dependencies.insert("requests".into());
        let outcome = ThirdPartyImports.check(&li).unwrap();
        assert_eq!(outcome.verdict, Verdict::Pass);
        assert!(outcome.detail.contains("requests"));
    }

    #[test]
    fn l12_relative_and_self_imports() {
        assert_eq!(
            SelfImport.check(&input("from . import util\nfn f() {}")).unwrap().verdict,
            Verdict::Fail
        );
        let li = input("import n1\nfn f() {}");
        let outcome = SelfImport.check(&li).unwrap();
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.detail.contains("n1"));
        assert_eq!(
            SelfImport.check(&input("import json\nfn f() {}")).unwrap().verdict,
            Verdict::Pass
        );
    }

    #[test]
    fn l13_complexity_budget() {
        // 1 + seven `if` tokens = 8.
        let code = "def f(x):\n    if a:\n        pass\n    if b:\n        pass\n    if c:\n        pass\n    if d:\n        pass\n    if e:\n        pass\n    if g:\n        pass\n    if h:\n        pass\n    return x";
        let mut li = input(code);
        li.spec.constraints.insert("max_complexity".into(), 5);
        let outcome = ComplexityBudget.check(&li).unwrap();
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.detail.contains("complexity 8 exceeds budget 5"));

        li.spec.constraints.insert("max_complexity".into(), 10);
        assert_eq!(ComplexityBudget.check(&li).unwrap().verdict, Verdict::Pass);
    }

    #[test]
    fn l13_without_budget_passes() {
        let li = input("def f(x):\n    if x:\n        return 1\n    return 0");
        let outcome = ComplexityBudget.check(&li).unwrap();
        assert_eq!(outcome.verdict, Verdict::Pass);
        assert!(outcome.detail.contains("no complexity budget"));
    }

    #[test]
    fn l14_placeholders_warn() {
        assert_eq!(
            LogicCompleteness.check(&input("fn f() { todo!() }")).unwrap().verdict,
            Verdict::Warn
        );
        assert_eq!(
            LogicCompleteness
                .check(&input("def f(x):\n    if x:\n        return 1\n    return 0"))
                .unwrap()
                .verdict,
            Verdict::Pass
        );
    }

    #[test]
    fn l15_error_handling() {
        assert_eq!(
            ErrorHandling
                .check(&input("def f():\n    try:\n        g()\n    except ValueError as e:\n        log(e)"))
                .unwrap()
                .verdict,
            Verdict::Pass
        );
        assert_eq!(
            ErrorHandling
                .check(&input("def f():\n    try:\n        g()\n    except Exception:\n        pass"))
                .unwrap()
                .verdict,
            Verdict::Warn
        );
        assert_eq!(
            ErrorHandling.check(&input("def f():\n    g()")).unwrap().verdict,
            Verdict::Fail
        );
    }

    #[test]
    fn l16_security_findings() {
        let outcome = SecurityScan
            .check(&input("def f(cmd):\n    eval(cmd)\napi_key = \"sk-123456789abc\""))
            .unwrap();
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.detail.contains("dangerous call"));
        assert!(outcome.detail.contains("credential"));

        assert_eq!(
            SecurityScan.check(&input("def f(x):\n    return x")).unwrap().verdict,
            Verdict::Pass
        );
    }

    #[test]
    fn l17_loop_nesting_depth() {
        let nested = "def f(m):\n    for row in m:\n        for cell in row:\n            for bit in cell:\n                use(bit)";
        let outcome = LoopNesting.check(&input(nested)).unwrap();
        assert_eq!(outcome.verdict, Verdict::Fail);
        assert!(outcome.detail.contains("depth 3"));

        let mut li = input(nested);
        li.spec.constraints.insert("max_loop_depth".into(), 3);
        assert_eq!(LoopNesting.check(&li).unwrap().verdict, Verdict::Pass);

        let flat = "def f(xs):\n    for x in xs:\n        use(x)\n    for y in xs:\n        use(y)";
        let outcome = LoopNesting.check(&input(flat)).unwrap();
        assert_eq!(outcome.verdict, Verdict::Pass);
        assert!(outcome.detail.contains("depth 1"));
    }
}
