//! Reason-and-act answer loop.
//!
//! Each round asks the model for a step, parses the single action directive out of it, and
//! either stops or runs a knowledge search and feeds the result back as an observation.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::chat::{to_model_turns, ChatEntry};
use crate::knowledge::KnowledgeSearch;
use crate::llm::{ModelAgent, ModelTurn};
use crate::metrics;

pub const MAX_REACT_ROUNDS: usize = 5;
pub const MODEL_FAILURE: &str = "I'm sorry, I encountered an issue.";
pub const BOUND_EXHAUSTED: &str = "I am having trouble finding a definitive answer.";

lazy_static! {
    static ref ACTION_RE: Regex = Regex::new(r"(?s)Action:\s*(search|finish)\((.*)\)").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Search,
    Finish,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub argument: String,
}

/// One model step: what it said and the directive found in it, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactStep {
    pub raw: String,
    pub action: Option<Action>,
}

/// Find the action directive in a model step. The first directive picks the verb; the
/// argument runs to the last `)` and is trimmed.
pub fn parse_action(text: &str) -> Option<Action> {
    let caps = ACTION_RE.captures(text)?;
    let kind = match caps.get(1)?.as_str() {
        "search" => ActionKind::Search,
        _ => ActionKind::Finish,
    };
    let argument = caps.get(2)?.as_str().trim().to_string();
    Some(Action { kind, argument })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopState {
    AwaitingModel,
    ParsingAction,
    ExecutingSearch,
    Done,
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Finished,
    NoAction,
    ModelFailure,
    RoundsExhausted,
}

#[derive(Debug, Clone)]
pub struct ReactOutcome {
    pub response: String,
    pub steps: Vec<ReactStep>,
    pub exit: LoopExit,
}

/// Drive the loop for one question. Never fails: upstream problems end in a fixed reply.
pub async fn run_react_loop(
    agent: &ModelAgent,
    knowledge: &dyn KnowledgeSearch,
    history: &[ChatEntry],
    question: &str,
    top_k: usize,
) -> ReactOutcome {
    let mut conversation = to_model_turns(history);
    conversation.push(ModelTurn::user(format!("User: {}", question)));

    let mut steps: Vec<ReactStep> = Vec::new();
    let mut rounds = 0usize;
    let mut state = LoopState::AwaitingModel;
    let mut exit = LoopExit::RoundsExhausted;
    let mut response = BOUND_EXHAUSTED.to_string();

    while state != LoopState::Done {
        state = match state {
            LoopState::AwaitingModel => {
                if rounds == MAX_REACT_ROUNDS {
                    warn!("ReAct loop hit the {} round limit", MAX_REACT_ROUNDS);
                    LoopState::Done
                } else {
                    rounds += 1;
                    match agent.ask(&conversation).await.filter(|text| !text.is_empty()) {
                        Some(raw) => {
                            debug!("ReAct round {}: {}", rounds, raw);
                            conversation.push(ModelTurn::model(raw.clone()));
                            steps.push(ReactStep { action: parse_action(&raw), raw });
                            LoopState::ParsingAction
                        }
                        None => {
                            exit = LoopExit::ModelFailure;
                            response = MODEL_FAILURE.to_string();
                            LoopState::Done
                        }
                    }
                }
            }
            LoopState::ParsingAction => {
                let step = steps.last();
                match step.and_then(|s| s.action.as_ref()).map(|a| a.kind) {
                    Some(ActionKind::Search) => LoopState::ExecutingSearch,
                    kind => {
                        exit = if kind.is_some() { LoopExit::Finished } else { LoopExit::NoAction };
                        response = step.map(|s| s.raw.clone()).unwrap_or_default();
                        LoopState::Done
                    }
                }
            }
            LoopState::ExecutingSearch => {
                let query = steps
                    .last()
                    .and_then(|s| s.action.as_ref())
                    .map(|a| a.argument.clone())
                    .unwrap_or_default();
                info!("ReAct search: {}", query);
                let observation = knowledge.search(&query, top_k).await;
                conversation.push(ModelTurn::user(format!("Observation: {}", observation)));
                LoopState::AwaitingModel
            }
            LoopState::Done => LoopState::Done,
        };
    }

    metrics::observe_react_rounds(rounds);
    info!("ReAct loop ended after {} round(s): {:?}", rounds, exit);
    ReactOutcome { response, steps, exit }
}
