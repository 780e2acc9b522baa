//! Prompting and reply parsing around the external language model.
//!
//! The model is not guaranteed to emit well-formed JSON, so scoring and quiz
//! replies are parsed defensively: a malformed reply degrades to a neutral
//! result and never surfaces as an error. Only transport-level failures of
//! the underlying [`LanguageModel`] are reported, and only where the caller
//! has to act on them.

use std::sync::Arc;

use domains::{ChatMessage, GatewayError, LanguageModel, QuizQuestion, ReliabilityAssessment};
use serde_json::Value;
use tracing::{debug, warn};

/// Score used when the model's reply cannot be read.
pub const NEUTRAL_SCORE: f64 = 50.0;
/// Number of characters of a raw reply kept as the fallback explanation.
pub const FALLBACK_EXPLANATION_CHARS: usize = 500;
pub const QUIZ_LENGTH: usize = 5;

const NO_EXPLANATION: &str = "No explanation provided";

const SCORING_SYSTEM_PROMPT: &str = "You are a fact-checking AI that analyzes content reliability. \
Always respond with valid JSON containing 'score' (0-100) and 'explanation' fields.";

const CHAT_PERSONA: &str = "You are TruthBot, a friendly and slightly rebellious robot assistant \
for students who want to stand up to Big Tech.

Themes you love:
- Installing Linux (Ubuntu, Mint) to give old computers a second life.
- Open source software (Firefox, LibreOffice, VLC).
- Fighting planned obsolescence.
- Privacy and keeping personal data under the user's control.

Personality:
- Encouraging, funny, revolutionary in a playful way.
- Keep answers concise (under 100 words) and accessible for teenagers.
- Use emojis 🛡️💻🌿.";

const QUIZ_PROMPT: &str = r#"Generate 5 multiple-choice questions about Green IT, Open Source (Linux, Firefox), Digital Privacy, and Fighting Planned Obsolescence.
Target audience: Teenagers/Students.
Tone: Fun, rebellious, educational.
Return ONLY a JSON array with this schema:
[
    {
        "question": "Question text",
        "options": ["Option A", "Option B", "Option C", "Option D"],
        "correctAnswer": 0,
        "explanation": "Brief explanation of why it's correct"
    }
]
correctAnswer is the index (0-3) of the correct option.
Do not include markdown formatting like ```json."#;

fn scoring_prompt(content: &str) -> String {
    format!(
        r#"Analyze the reliability and truthfulness of the following content.

Content: "{content}"

Provide your analysis in JSON format with these exact keys:
- "score": A number between 0-100 representing reliability (0=completely false, 50=uncertain, 100=completely true)
- "explanation": A brief explanation of your assessment

Consider factors like:
- Scientific consensus
- Verifiable facts
- Logical consistency
- Known misinformation patterns

Respond ONLY with valid JSON, no other text."#
    )
}

/// Content scoring, chat and quiz generation on top of a [`LanguageModel`].
#[derive(Clone)]
pub struct Gateway {
    model: Arc<dyn LanguageModel>,
}

impl Gateway {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Asks the model how reliable `content` is.
    ///
    /// Errors only when the request itself fails; an unreadable reply becomes
    /// a neutral assessment.
    pub async fn score_content(&self, content: &str) -> Result<ReliabilityAssessment, GatewayError> {
        let messages = vec![
            ChatMessage::system(SCORING_SYSTEM_PROMPT),
            ChatMessage::user(scoring_prompt(content)),
        ];
        let reply = self.model.complete(messages).await.inspect_err(|e| {
            warn!(error = %e, "scoring request failed");
        })?;
        debug!(reply_len = reply.len(), "scoring reply received");
        Ok(parse_assessment(&reply))
    }

    /// One conversational turn. `history` is replayed in order before `message`.
    pub async fn chat(
        &self,
        history: Vec<ChatMessage>,
        message: &str,
        user_name: Option<&str>,
    ) -> Result<String, GatewayError> {
        let mut persona = CHAT_PERSONA.to_string();
        if let Some(name) = user_name {
            persona.push_str(&format!(
                "\n\nThe user's name is {name}. Address them by name occasionally."
            ));
        }

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(persona));
        messages.extend(history);
        messages.push(ChatMessage::user(message));

        self.model.complete(messages).await.inspect_err(|e| {
            warn!(error = %e, "chat request failed");
        })
    }

    /// Five quiz questions from the model, or [`fallback_quiz`] on any failure.
    pub async fn generate_quiz(&self) -> Vec<QuizQuestion> {
        let reply = match self.model.complete(vec![ChatMessage::user(QUIZ_PROMPT)]).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "quiz request failed; serving fallback questions");
                return fallback_quiz();
            }
        };
        parse_quiz(&reply).unwrap_or_else(|| {
            warn!(reply_len = reply.len(), "quiz reply unusable; serving fallback questions");
            fallback_quiz()
        })
    }
}

/// Returns the body of the first markdown code fence in `raw`, or the
/// trimmed text when there is none.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let body_start = if let Some(start) = trimmed.find("```json") {
        start + "```json".len()
    } else if let Some(start) = trimmed.find("```") {
        start + "```".len()
    } else {
        return trimmed;
    };
    let rest = &trimmed[body_start..];
    let body_end = rest.find("```").unwrap_or(rest.len());
    rest[..body_end].trim()
}

/// Clamps into `[0, 100]` and rounds to two decimals.
pub fn clamp_score(score: f64) -> f64 {
    (score.clamp(0.0, 100.0) * 100.0).round() / 100.0
}

/// Never fails: unreadable replies yield [`NEUTRAL_SCORE`] and the head of
/// the raw reply as explanation.
pub fn parse_assessment(raw: &str) -> ReliabilityAssessment {
    match read_assessment(strip_code_fence(raw)) {
        Some(assessment) => assessment,
        None => {
            warn!("model reply is not a JSON assessment; using neutral score");
            ReliabilityAssessment {
                score: NEUTRAL_SCORE,
                explanation: raw.chars().take(FALLBACK_EXPLANATION_CHARS).collect(),
            }
        }
    }
}

fn read_assessment(body: &str) -> Option<ReliabilityAssessment> {
    let value: Value = serde_json::from_str(body).ok()?;
    let fields = value.as_object()?;

    let score = match fields.get("score")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !score.is_finite() {
        return None;
    }

    let explanation = match fields.get("explanation") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => NO_EXPLANATION.to_string(),
        Some(other) => other.to_string(),
    };

    Some(ReliabilityAssessment { score: clamp_score(score), explanation })
}

fn parse_quiz(raw: &str) -> Option<Vec<QuizQuestion>> {
    let mut questions: Vec<QuizQuestion> = serde_json::from_str(strip_code_fence(raw)).ok()?;
    if questions.is_empty() || !questions.iter().all(QuizQuestion::is_well_formed) {
        return None;
    }
    questions.truncate(QUIZ_LENGTH);
    Some(questions)
}

/// Questions served when the model cannot be used.
pub fn fallback_quiz() -> Vec<QuizQuestion> {
    fn question(question: &str, options: [&str; 4], correct_answer: u8, explanation: &str) -> QuizQuestion {
        QuizQuestion {
            question: question.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_answer,
            explanation: explanation.to_string(),
        }
    }

    vec![
        question(
            "Why is Linux better for old computers?",
            ["It eats less RAM", "It costs $1000", "It's made by aliens", "It slows them down"],
            0,
            "Linux is lightweight and efficient, giving new life to old hardware!",
        ),
        question(
            "What is 'Planned Obsolescence'?",
            ["A surprise party", "Designing things to break early", "A new dance move", "Updating your phone"],
            1,
            "It's when companies build products to fail so you have to buy new ones. Not cool!",
        ),
    ]
}
