//! Appointment booking dialogue.
//!
//! The conversation is driven entirely by the telephony provider: every turn
//! is a fresh webhook request and the accumulated answers travel in the
//! querystring of the callback URL generated by the previous turn. Nothing is
//! stored server-side.
//!
//! ```text
//! Entry ──▶ GotName ──▶ GotDate ──▶ GotTime ──▶ Confirm ──▶ Booked / Declined
//!             ↺           ↺           ↺           ↺
//!        (re-prompt when the expected answer is missing)
//! ```
//!
//! The `step` value is trusted as-is; a forged step simply resumes the
//! dialogue at that point.

use std::collections::HashMap;

use url::form_urlencoded;

use super::twiml::{GatherSpeech, TwimlBuilder};

/// Longest value, in characters, echoed back into a callback URL.
pub const MAX_CARRIED_CHARS: usize = 200;

/// Words that confirm the booking (substring match, case-insensitive).
pub const AFFIRMATIVE_WORDS: &[&str] = &["yes", "yeah", "yep", "correct", "confirm"];

/// Words that decline the booking (substring match, case-insensitive).
pub const NEGATIVE_WORDS: &[&str] = &["no", "nope", "incorrect", "cancel"];

/// Spoken after a `<Gather>` times out without speech, before redirecting.
pub const NO_SPEECH_FALLBACK: &str = "Sorry, I didn't catch that.";

const NAME_REPROMPT: &str = "Sorry, I didn't get your name. Please say your first and last name.";
const DATE_REPROMPT: &str =
    "Sorry, I didn't get the date. Please say the best date for your appointment.";
const DECLINED_MESSAGE: &str =
    "Okay, I won't book that. If you'd like to try again, please call back. Goodbye.";
const ERROR_MESSAGE: &str = "Sorry, something went wrong. Please call again.";

/// Position in the booking dialogue, as carried in the `step` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogueStep {
    /// No `step` yet: the call just connected
    Entry,
    /// The caller was asked for their name
    GotName,
    /// The caller was asked for a date
    GotDate,
    /// The caller was asked for a time
    GotTime,
    /// The caller was read the summary and asked to confirm
    Confirm,
}

impl DialogueStep {
    /// Wire value of the step.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entry => "",
            Self::GotName => "got_name",
            Self::GotDate => "got_date",
            Self::GotTime => "got_time",
            Self::Confirm => "confirm",
        }
    }

    /// Parse a step value, ignoring case. Returns `None` for unknown steps.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "" => Some(Self::Entry),
            "got_name" => Some(Self::GotName),
            "got_date" => Some(Self::GotDate),
            "got_time" => Some(Self::GotTime),
            "confirm" => Some(Self::Confirm),
            _ => None,
        }
    }
}

impl std::fmt::Display for DialogueStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entry => write!(f, "entry"),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Fields of one dialogue webhook request.
///
/// Built from the form body first; querystring values only fill keys the body
/// did not provide. Blank values count as absent and the first occurrence of a
/// repeated key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallInput {
    /// Raw `step` value (lowercased)
    pub step: String,
    /// Trimmed `SpeechResult` transcription
    pub speech: String,
    pub name: String,
    pub date: String,
    pub time: String,
}

impl CallInput {
    /// Parse a form-encoded body and optional querystring.
    pub fn from_request(body: &[u8], query: Option<&str>) -> Self {
        let mut params: HashMap<String, String> = HashMap::new();
        collect_params(&mut params, body);
        if let Some(query) = query {
            collect_params(&mut params, query.as_bytes());
        }

        let field = |key: &str| {
            params
                .get(key)
                .map(|value| limit_carried(value))
                .unwrap_or_default()
        };

        Self {
            step: params
                .get("step")
                .map(|step| step.to_ascii_lowercase())
                .unwrap_or_default(),
            speech: params
                .get("SpeechResult")
                .map(|speech| limit_carried(speech.trim()))
                .unwrap_or_default(),
            name: field("name"),
            date: field("date"),
            time: field("time"),
        }
    }

    /// The transcription if present, otherwise the explicit field.
    fn captured<'a>(&'a self, explicit: &'a str) -> &'a str {
        if self.speech.is_empty() {
            explicit
        } else {
            &self.speech
        }
    }
}

fn collect_params(params: &mut HashMap<String, String>, encoded: &[u8]) {
    for (key, value) in form_urlencoded::parse(encoded) {
        if value.is_empty() {
            continue;
        }
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
}

fn limit_carried(value: &str) -> String {
    value.chars().take(MAX_CARRIED_CHARS).collect()
}

/// State handed to the next turn through the callback URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextState {
    AwaitName,
    AwaitDate {
        name: String,
    },
    AwaitTime {
        name: String,
        date: String,
    },
    AwaitConfirmation {
        name: String,
        date: String,
        time: String,
    },
}

impl NextState {
    pub fn step(&self) -> DialogueStep {
        match self {
            Self::AwaitName => DialogueStep::GotName,
            Self::AwaitDate { .. } => DialogueStep::GotDate,
            Self::AwaitTime { .. } => DialogueStep::GotTime,
            Self::AwaitConfirmation { .. } => DialogueStep::Confirm,
        }
    }

    /// Form-encoded querystring, always ordered `step, name, date, time`.
    pub fn query_string(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        query.append_pair("step", self.step().as_str());
        match self {
            Self::AwaitName => {}
            Self::AwaitDate { name } => {
                query.append_pair("name", name);
            }
            Self::AwaitTime { name, date } => {
                query.append_pair("name", name).append_pair("date", date);
            }
            Self::AwaitConfirmation { name, date, time } => {
                query
                    .append_pair("name", name)
                    .append_pair("date", date)
                    .append_pair("time", time);
            }
        }
        query.finish()
    }

    pub fn action_url(&self, action_path: &str) -> String {
        format!("{action_path}?{}", self.query_string())
    }
}

/// A prompt that captures speech and calls back with `next`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    pub prompt: String,
    pub next: NextState,
}

/// How a call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Booked,
    Declined,
    Failed,
}

impl CallOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Declined => "declined",
            Self::Failed => "failed",
        }
    }
}

/// Result of one dialogue turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Turn {
    /// Expected answer missing; ask again for the same step
    Reprompt(Gather),
    /// Answer captured; ask for the next field
    Advance(Gather),
    /// Speak and end the call
    Hangup { text: String, outcome: CallOutcome },
}

impl Turn {
    fn hangup(text: impl Into<String>, outcome: CallOutcome) -> Self {
        Self::Hangup {
            text: text.into(),
            outcome,
        }
    }

    /// Step the next callback will carry, if the call continues.
    pub fn next_step(&self) -> Option<DialogueStep> {
        match self {
            Self::Reprompt(gather) | Self::Advance(gather) => Some(gather.next.step()),
            Self::Hangup { .. } => None,
        }
    }

    /// Render the turn as a TwiML document.
    ///
    /// A `<Gather>` is followed by a spoken apology and a `<Redirect>` to the
    /// same action, so a capture timeout replays the current step.
    pub fn to_twiml(&self, action_path: &str, language: &str) -> String {
        match self {
            Self::Reprompt(gather) | Self::Advance(gather) => {
                let action = gather.next.action_url(action_path);
                TwimlBuilder::new()
                    .gather_speech(&GatherSpeech {
                        action: &action,
                        language,
                        prompt: &gather.prompt,
                    })
                    .say(NO_SPEECH_FALLBACK)
                    .redirect(&action)
                    .build()
            }
            Self::Hangup { text, .. } => TwimlBuilder::new().say(text).hangup().build(),
        }
    }
}

/// Caller's reply to the confirmation question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Affirmative,
    Negative,
    Unclear,
}

/// Classify a confirmation reply. Affirmative words are checked first.
pub fn classify_answer(speech: &str) -> Answer {
    let answer = speech.to_lowercase();
    if AFFIRMATIVE_WORDS.iter().any(|word| answer.contains(word)) {
        Answer::Affirmative
    } else if NEGATIVE_WORDS.iter().any(|word| answer.contains(word)) {
        Answer::Negative
    } else {
        Answer::Unclear
    }
}

/// The booking dialogue for one business.
#[derive(Debug, Clone)]
pub struct Dialogue {
    business_name: String,
}

impl Dialogue {
    pub fn new(business_name: impl Into<String>) -> Self {
        Self {
            business_name: business_name.into(),
        }
    }

    pub fn business_name(&self) -> &str {
        &self.business_name
    }

    /// Compute the response to one webhook request.
    pub fn respond(&self, input: &CallInput) -> Turn {
        let Some(step) = DialogueStep::parse(&input.step) else {
            return Turn::hangup(ERROR_MESSAGE, CallOutcome::Failed);
        };

        match step {
            DialogueStep::Entry => Turn::Advance(Gather {
                prompt: format!(
                    "Hi! Thanks for calling. I am an AI Voice Agent for {}. What is your name?",
                    self.business_name
                ),
                next: NextState::AwaitName,
            }),
            DialogueStep::GotName => {
                let name = input.captured(&input.name);
                if name.is_empty() {
                    return Turn::Reprompt(Gather {
                        prompt: NAME_REPROMPT.to_string(),
                        next: NextState::AwaitName,
                    });
                }
                Turn::Advance(Gather {
                    prompt: format!(
                        "Nice to meet you, {name}. What date works best for your appointment?"
                    ),
                    next: NextState::AwaitDate {
                        name: name.to_string(),
                    },
                })
            }
            DialogueStep::GotDate => {
                let name = input.name.clone();
                let date = input.captured(&input.date);
                if date.is_empty() {
                    return Turn::Reprompt(Gather {
                        prompt: DATE_REPROMPT.to_string(),
                        next: NextState::AwaitDate { name },
                    });
                }
                Turn::Advance(Gather {
                    prompt: format!("Great. What time on {date} works best?"),
                    next: NextState::AwaitTime {
                        name,
                        date: date.to_string(),
                    },
                })
            }
            DialogueStep::GotTime => {
                let name = input.name.clone();
                let date = input.date.clone();
                let time = input.captured(&input.time);
                if time.is_empty() {
                    return Turn::Reprompt(Gather {
                        prompt: format!(
                            "Sorry, I didn't get the time. What time on {date} works best?"
                        ),
                        next: NextState::AwaitTime { name, date },
                    });
                }
                Turn::Advance(Gather {
                    prompt: format!(
                        "Just to confirm, {name}, you want an appointment on {date} at {time}. \
                         Is that correct? Please say yes or no."
                    ),
                    next: NextState::AwaitConfirmation {
                        name,
                        date,
                        time: time.to_string(),
                    },
                })
            }
            DialogueStep::Confirm => {
                let CallInput {
                    name, date, time, ..
                } = input;
                match classify_answer(&input.speech) {
                    // Bookings are not persisted; the outcome is only logged.
                    Answer::Affirmative => Turn::hangup(
                        format!(
                            "Awesome. {name}, you're booked for {date} at {time}. \
                             See you then. Goodbye."
                        ),
                        CallOutcome::Booked,
                    ),
                    Answer::Negative => Turn::hangup(DECLINED_MESSAGE, CallOutcome::Declined),
                    Answer::Unclear => Turn::Reprompt(Gather {
                        prompt: format!(
                            "Sorry, I didn't get that. Do you confirm the appointment for \
                             {date} at {time}? Please say yes or no."
                        ),
                        next: NextState::AwaitConfirmation {
                            name: name.clone(),
                            date: date.clone(),
                            time: time.clone(),
                        },
                    }),
                }
            }
        }
    }
}

impl Default for Dialogue {
    fn default() -> Self {
        Self::new("Aurora Healthcare")
    }
}
