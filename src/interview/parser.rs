//! Defensive parser for oracle replies.
//!
//! The oracle is *instructed* to append a score block and a stage marker to
//! every reply, but nothing enforces that contract. This module recovers
//! whatever structure is present and never fails: a malformed block simply
//! yields no signal for that turn.
//!
//! Expected shape (both parts optional, closing tags tolerated missing
//! because the generation stop sequence may cut them):
//!
//! ```text
//! <SCORES>{"stage":2,"resume_fit":80,"hard_skills":55,"soft_skills":0}</SCORES>
//! <STAGE>2</STAGE>
//! ```

use std::sync::LazyLock;

use regex::Regex;

use super::stage::Category;

const SCORES_OPEN: &str = "<SCORES>";
const SCORES_CLOSE: &str = "</SCORES>";
const STAGE_OPEN: &str = "<STAGE>";

static STAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<STAGE>\s*(-?\d+)\s*(?:</STAGE>)?").expect("stage regex"));

/// Numeric fields recovered from a syntactically valid score block.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBlock {
    pub resume_fit: Option<f64>,
    pub hard_skills: Option<f64>,
    pub soft_skills: Option<f64>,
    /// Stage number embedded in the block, used as a fallback marker when no
    /// standalone `<STAGE>` tag is present.
    pub stage: Option<i64>,
}

impl ScoreBlock {
    pub fn get(&self, category: Category) -> Option<f64> {
        match category {
            Category::ResumeFit => self.resume_fit,
            Category::HardSkills => self.hard_skills,
            Category::SoftSkills => self.soft_skills,
        }
    }
}

/// Result of parsing one raw oracle reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReply {
    /// Score signal for this turn, if a valid block was present.
    pub scores: Option<ScoreBlock>,
    /// Explicit stage marker, if present.
    pub stage_marker: Option<i64>,
    /// Reply text with both structured tags stripped, safe to display.
    pub cleaned: String,
}

/// Parse a raw oracle reply. Never fails.
pub fn parse_oracle_reply(raw: &str) -> ParsedReply {
    let (scores, without_scores) = extract_score_block(raw);

    let mut stage_marker = None;
    let cleaned = match STAGE_RE.find(&without_scores) {
        Some(m) => {
            let caps = STAGE_RE.captures(&without_scores).expect("find implies captures");
            stage_marker = caps[1].parse::<i64>().ok();
            let mut text = String::with_capacity(without_scores.len());
            text.push_str(&without_scores[..m.start()]);
            text.push_str(&without_scores[m.end()..]);
            text
        }
        None => without_scores,
    };

    // Fall back to the stage number inside the score block.
    if stage_marker.is_none() {
        stage_marker = scores.as_ref().and_then(|s| s.stage);
    }

    ParsedReply {
        scores,
        stage_marker,
        cleaned: cleaned.trim().to_string(),
    }
}

/// Locate and parse the `<SCORES>` block. Returns the parsed block (if any)
/// and the input with the block's byte range removed.
fn extract_score_block(raw: &str) -> (Option<ScoreBlock>, String) {
    let Some(open) = raw.find(SCORES_OPEN) else {
        return (None, raw.to_string());
    };
    let body_start = open + SCORES_OPEN.len();

    // A missing closing tag means the block runs to the stage tag or the end
    // of the reply.
    let (body_end, block_end) = match raw[body_start..].find(SCORES_CLOSE) {
        Some(rel) => (body_start + rel, body_start + rel + SCORES_CLOSE.len()),
        None => match raw[body_start..].find(STAGE_OPEN) {
            Some(rel) => (body_start + rel, body_start + rel),
            None => (raw.len(), raw.len()),
        },
    };

    let block = parse_score_json(&raw[body_start..body_end]);
    if block.is_none() {
        tracing::debug!(
            body = raw[body_start..body_end].trim(),
            "Malformed score block — no score signal this turn"
        );
    }

    let mut remaining = String::with_capacity(raw.len());
    remaining.push_str(&raw[..open]);
    remaining.push_str(&raw[block_end..]);
    (block, remaining)
}

/// Parse the JSON body of a score block. Out-of-range values are truncated
/// into [0,100]; non-numeric fields are dropped; a non-object body yields
/// nothing.
fn parse_score_json(body: &str) -> Option<ScoreBlock> {
    let value: serde_json::Value = serde_json::from_str(body.trim()).ok()?;
    let obj = value.as_object()?;

    let field = |name: &str| obj.get(name).and_then(|v| v.as_f64()).map(clamp_score);

    Some(ScoreBlock {
        resume_fit: field("resume_fit"),
        hard_skills: field("hard_skills"),
        soft_skills: field("soft_skills"),
        stage: obj.get("stage").and_then(|v| v.as_i64()),
    })
}

fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
