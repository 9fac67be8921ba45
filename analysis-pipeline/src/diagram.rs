//! Checks that mermaid blocks in an artifact follow the node/label formatting contract.

const FENCE_OPEN: &str = "```mermaid";
const FENCE_CLOSE: &str = "```";

/// Edge operators, longest first so that `-.->` is not read as `-` plus `.->`.
const EDGE_OPERATORS: &[&str] = &[
    "<-->", "-.->", "==>", "-->", "---", "-.-", "===", "--o", "--x",
];

/// Statements that carry no node declarations.
const DIRECTIVES: &[&str] = &[
    "graph",
    "flowchart",
    "subgraph",
    "end",
    "classDef",
    "class",
    "style",
    "linkStyle",
    "click",
    "direction",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramViolation {
    /// 1-based line inside the artifact.
    pub line: usize,
    pub reason: String,
}

/// Every rule violation across all mermaid blocks. An artifact without diagrams is clean.
pub fn lint(artifact: &str) -> Vec<DiagramViolation> {
    let mut violations = Vec::new();
    let mut in_block = false;

    for (index, raw) in artifact.lines().enumerate() {
        let line = raw.trim();
        let line_no = index.saturating_add(1);

        if !in_block {
            in_block = line.starts_with(FENCE_OPEN);
            continue;
        }
        if line.starts_with(FENCE_CLOSE) {
            in_block = false;
            continue;
        }
        let keyword = line.split_whitespace().next().unwrap_or_default();
        if line.is_empty() || line.starts_with("%%") || DIRECTIVES.contains(&keyword) {
            continue;
        }

        for node in node_segments(line) {
            if let Err(reason) = check_node(&node) {
                violations.push(DiagramViolation {
                    line: line_no,
                    reason,
                });
            }
        }
    }

    violations
}

/// Splits a statement into its node references, dropping edge operators and edge labels.
fn node_segments(line: &str) -> Vec<String> {
    let mut statement = strip_edge_labels(line.trim_end_matches(';'));
    for operator in EDGE_OPERATORS {
        statement = statement.replace(operator, "\u{0}");
    }

    statement
        .split('\u{0}')
        .flat_map(|segment| segment.split(" & "))
        .map(|segment| {
            // `A -- text --> B` leaves `A -- text` behind; the node is before the `--`.
            segment
                .split(" -- ")
                .next()
                .unwrap_or(segment)
                .trim()
                .to_string()
        })
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Removes `|label|` edge annotations, which follow their own quoting rules.
fn strip_edge_labels(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut in_label = false;
    let mut in_node_text = 0_usize;

    for c in line.chars() {
        match c {
            '[' | '(' | '{' => {
                in_node_text = in_node_text.saturating_add(1);
                out.push(c);
            }
            ']' | ')' | '}' => {
                in_node_text = in_node_text.saturating_sub(1);
                out.push(c);
            }
            '|' if in_node_text == 0 => in_label = !in_label,
            _ if in_label => {}
            _ => out.push(c),
        }
    }

    out
}

fn check_node(segment: &str) -> Result<(), String> {
    let open = segment.find(['[', '(', '{', '>']);
    let (id, shape) = match open {
        Some(position) => segment.split_at(position),
        None => (segment, ""),
    };

    if id.is_empty() {
        return Err(format!("node `{segment}` has no identifier"));
    }
    if id.chars().any(|c| c.is_whitespace() || c == '"' || c == '\'') {
        return Err(format!("node identifier `{id}` contains whitespace or quotes"));
    }
    if shape.is_empty() {
        return Ok(());
    }

    let label = shape
        .trim_start_matches(['[', '(', '{', '>', '/', '\\'])
        .trim_end_matches([']', ')', '}', '/', '\\']);
    check_label(id, label)
}

fn check_label(id: &str, label: &str) -> Result<(), String> {
    let inner = label
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .ok_or_else(|| format!("label of `{id}` is not wrapped in double quotes"))?;

    let mut escaped = false;
    for c in inner.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => {
                return Err(format!("label of `{id}` contains an unescaped quote"));
            }
            _ => escaped = false,
        }
    }

    Ok(())
}
