//! TwiML voice-response markup.
//!
//! [`TwimlBuilder`] writes the handful of verbs this gateway needs
//! (`<Gather>`, `<Say>`, `<Play>`, `<Redirect>`, `<Hangup/>`). All text and
//! attribute values are XML-escaped.

/// XML declaration emitted at the top of every document.
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Content type the telephony provider expects for TwiML responses.
pub const TWIML_CONTENT_TYPE: &str = "application/xml";

/// Speech capture settings for a `<Gather>` verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatherSpeech<'a> {
    /// Callback URL, already carrying its querystring
    pub action: &'a str,
    /// Transcription language, e.g. `en-US`
    pub language: &'a str,
    /// Prompt spoken while listening
    pub prompt: &'a str,
}

/// Incremental TwiML document builder.
#[derive(Debug, Default, Clone)]
pub struct TwimlBuilder {
    verbs: String,
}

impl TwimlBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<Say>` with the provider's built-in voice.
    pub fn say(mut self, text: &str) -> Self {
        self.verbs.push_str("<Say>");
        self.verbs.push_str(&escape_xml(text));
        self.verbs.push_str("</Say>");
        self
    }

    /// `<Play>` a hosted audio file.
    pub fn play(mut self, url: &str) -> Self {
        self.verbs.push_str("<Play>");
        self.verbs.push_str(&escape_xml(url));
        self.verbs.push_str("</Play>");
        self
    }

    /// `<Gather input="speech">` posting the transcription to `action`.
    ///
    /// End-of-speech detection is left to the provider (`speechTimeout="auto"`).
    pub fn gather_speech(mut self, gather: &GatherSpeech<'_>) -> Self {
        self.verbs.push_str(&format!(
            r#"<Gather action="{}" method="POST" input="speech" language="{}" speechTimeout="auto">"#,
            escape_xml(gather.action),
            escape_xml(gather.language),
        ));
        self.verbs.push_str("<Say>");
        self.verbs.push_str(&escape_xml(gather.prompt));
        self.verbs.push_str("</Say></Gather>");
        self
    }

    /// `<Redirect>` the call to another TwiML URL.
    pub fn redirect(mut self, url: &str) -> Self {
        self.verbs.push_str("<Redirect>");
        self.verbs.push_str(&escape_xml(url));
        self.verbs.push_str("</Redirect>");
        self
    }

    /// `<Hangup/>` ends the call.
    pub fn hangup(mut self) -> Self {
        self.verbs.push_str("<Hangup/>");
        self
    }

    pub fn build(self) -> String {
        format!("{XML_DECLARATION}<Response>{}</Response>", self.verbs)
    }
}

/// Escape the five XML special characters.
pub fn escape_xml(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
