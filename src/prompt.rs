use chrono::{DateTime, Datelike, Local};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::wiki::ArticleRecord;

/// Hard output contract: posts are tweet-sized.
pub const MAX_POST_CHARS: usize = 280;

const MAX_COMPLETION_TOKENS: u32 = 150;

/// Closed set of rhetorical templates a post can be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostStyle {
    ViralFact,
    HotTake,
    ThreadStarter,
    MythBuster,
    Comparison,
    Question,
    Quote,
    Timeline,
    TodayILearned,
    Meme,
}

/// Styles drawn for every feed except memes.
pub const GENERAL_STYLES: &[PostStyle] = &[
    PostStyle::ViralFact,
    PostStyle::HotTake,
    PostStyle::ThreadStarter,
    PostStyle::MythBuster,
    PostStyle::Comparison,
    PostStyle::Question,
    PostStyle::Quote,
    PostStyle::Timeline,
    PostStyle::TodayILearned,
];

/// The disjoint subset the memes feed draws from exclusively.
pub const MEME_STYLES: &[PostStyle] = &[PostStyle::Meme];

impl PostStyle {
    /// Uniform draw from the set the active mode allows.
    pub fn draw(meme_mode: bool) -> PostStyle {
        let pool = if meme_mode { MEME_STYLES } else { GENERAL_STYLES };
        pool.choose(&mut rand::rng())
            .copied()
            .unwrap_or(PostStyle::ViralFact)
    }

    pub fn is_meme(self) -> bool {
        matches!(self, PostStyle::Meme)
    }

    /// Badge shown next to the post in the feed.
    pub fn label(self) -> &'static str {
        match self {
            PostStyle::ViralFact => "🔥 FACT",
            PostStyle::HotTake => "🌶️ TAKE",
            PostStyle::ThreadStarter => "🧵 THREAD",
            PostStyle::MythBuster => "🔍 MYTH",
            PostStyle::Comparison => "⚖️ VS",
            PostStyle::Question => "❓ Q&A",
            PostStyle::Quote => "💬 QUOTE",
            PostStyle::Timeline => "📅 TIME",
            PostStyle::TodayILearned => "💡 TIL",
            PostStyle::Meme => "😂 MEME",
        }
    }

    /// The style-specific writing instruction.
    fn instruction(self) -> &'static str {
        match self {
            PostStyle::ViralFact => {
                "Create a viral, mind-blowing fact tweet that will make people go 'Wait, WHAT?!' \
                 Use dramatic language and end with something that makes people want to share."
            }
            PostStyle::HotTake => {
                "Create a spicy, thought-provoking hot take or controversial-sounding (but \
                 factually accurate) opinion that will spark discussion."
            }
            PostStyle::ThreadStarter => {
                "Create the first tweet of what would be a fascinating thread. Start with a hook \
                 like 'A thread 🧵' and make people desperate to read more."
            }
            PostStyle::MythBuster => {
                "Create a myth-busting tweet that corrects a common misconception. Start with \
                 'Actually...' or 'Contrary to popular belief...'"
            }
            PostStyle::Comparison => {
                "Create a tweet that makes a surprising comparison or puts something in \
                 perspective (like 'X is older than Y' or 'X is bigger than Y')."
            }
            PostStyle::Question => {
                "Create a rhetorical question tweet that makes people think, followed by a \
                 mind-blowing answer or fact."
            }
            PostStyle::Quote => {
                "If there's a relevant quote, create a tweet featuring it. Otherwise, create an \
                 insightful observation about the topic."
            }
            PostStyle::Timeline => {
                "Create a tweet that puts historical events in perspective, like 'In the time \
                 since X happened, we've...' or 'X happened closer to Y than to today'"
            }
            PostStyle::TodayILearned => {
                "Create a 'Today I Learned' (TIL) style tweet that shares a genuinely surprising \
                 fact in a conversational way."
            }
            PostStyle::Meme => MEME_INSTRUCTION,
        }
    }
}

const MEME_INSTRUCTION: &str = r#"Create a genuinely funny Twitter/X or Reddit-style shitpost about this topic.

USE THESE AUTHENTIC FORMATS (pick one randomly):
- "me: I should sleep / my brain at 3am: [weird fact about topic]"
- "nobody: / absolutely nobody: / [topic]: [absurd behavior]"
- "[topic] said '🧍' and left" or "[topic] really said '[quote]' and dipped"
- "not [topic] being [absurd observation] 💀"
- "the [topic] is giving ✨[ironic description]✨"
- "pov: you just learned about [topic]"
- "[topic] walked so [other thing] could run"
- "tell me you [x] without telling me you [x]"
- "it's the [specific detail] for me 😭"
- "normalize [absurd thing related to topic]"
- "[topic] really woke up and chose violence"
- "y'all ever just [absurd action related to topic]?"
- "the way [topic] [does something] is sending me 💀"
- "[topic] hits different at 2am"
- "i was today years old when i learned [fact]"
- "no one's gonna talk about how [topic] [observation]?"
- "[topic] is just [absurd simplified description]"
- "scientists: [fact] / me: 👁👄👁"
- "[topic] living rent free in my head"
- "the duality of [topic] 😭"

CRITICAL STYLE RULES:
- Use lowercase for that authentic shitpost energy
- Heavy emoji usage: 💀😭🧍✨👁👄👁😤🗣️📢🤡👀🙃😩🥴
- Include "i-" or "i can't" or "im crying" or "this is sending me"
- Be unhinged but factual
- Sound like a real person losing their mind over a random fact
- Use "ngl", "lowkey", "highkey", "fr fr", "no cap", "deadass"
- Can use "bestie", "babe", "girlie" sarcastically
- Reference "my last brain cell" or "my therapist"
- Sound sleep deprived and slightly unhinged"#;

/// Four independent tone dials, each 0-100. Persisted with the rest of
/// the app state; defaults match a mild, mostly-informative feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    pub sensationalism: u8,
    pub controversy: u8,
    pub surprise_intensity: u8,
    pub emotional_weight: u8,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            sensationalism: 50,
            controversy: 20,
            surprise_intensity: 40,
            emotional_weight: 10,
        }
    }
}

/// Escalation tiers a dial value maps into. The mapping is a pure
/// function of the value; dials never interact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tier {
    Low,
    Mild,
    High,
    Max,
}

fn tier(value: u8) -> Tier {
    match value {
        0..=20 => Tier::Low,
        21..=50 => Tier::Mild,
        51..=80 => Tier::High,
        _ => Tier::Max,
    }
}

fn tier_index(value: u8) -> usize {
    match tier(value) {
        Tier::Low => 0,
        Tier::Mild => 1,
        Tier::High => 2,
        Tier::Max => 3,
    }
}

const SENSATIONALISM_TIERS: [&str; 4] = [
    "Be straightforward and factual. Avoid sensationalism. Use plain, honest language.",
    "Moderately engaging. Use some curiosity gaps but stay mostly informative.",
    "Make it attention-grabbing! Use phrases like \"You won't believe...\", \"This changes \
     everything...\", create urgency and curiosity.",
    "MAXIMUM clickbait energy! Use ALL CAPS for emphasis, cliffhangers, dramatic reveals, \
     \"BREAKING:\", \"NOBODY is talking about this...\", make them NEED to know more!",
];

const CONTROVERSY_TIERS: [&str; 4] = [
    "Keep it neutral and balanced. Avoid controversy. Be diplomatic.",
    "Slightly provocative. Include mild hot takes or contrarian viewpoints that might spark \
     friendly debate.",
    "Be provocative! Challenge popular beliefs, use phrases like \"unpopular opinion\", \"I \
     don't care what anyone says\", pick a side strongly.",
    "MAXIMUM controversy! Take the spiciest possible take. Be deliberately polarizing. Use \
     confrontational language like \"If you disagree you're wrong\", \"This will make people \
     mad but...\", \"Wake up people!\"",
];

const SURPRISE_TIERS: [&str; 4] = [
    "Present information calmly. Understated and matter-of-fact.",
    "Moderately surprising. Highlight the interesting aspects but don't oversell.",
    "Make jaws DROP! Emphasize the most mind-blowing aspects. Use \"Wait, WHAT?!\", \"I'm \
     still processing this...\", \"This broke my brain...\"",
    "ABSOLUTELY UNHINGED shock value! Act like you just discovered the most earth-shattering \
     information ever. \"I can't sleep after learning this\", \"WHY isn't this taught in \
     schools?!\", \"This changes EVERYTHING we thought we knew!\"",
];

const EMOTIONAL_WEIGHT_TIERS: [&str; 4] = [
    "Keep it light and fun! Focus on uplifting, amusing, or wonder-inducing aspects.",
    "Balance light and serious. Include some thought-provoking elements but don't get too \
     heavy.",
    "Go deeper emotionally. Touch on existential themes, mortality, human suffering, or \
     philosophical weight. Make people feel something profound.",
    "MAXIMUM emotional weight. Focus on the darkest, most haunting aspects. Existential \
     dread, tragic ironies, the fleeting nature of existence, things that keep you up at \
     night. Melancholic and profound.",
];

impl ToneConfig {
    pub fn clamped(self) -> Self {
        Self {
            sensationalism: self.sensationalism.min(100),
            controversy: self.controversy.min(100),
            surprise_intensity: self.surprise_intensity.min(100),
            emotional_weight: self.emotional_weight.min(100),
        }
    }

    fn fragments(&self) -> [String; 4] {
        let tone = self.clamped();
        [
            fragment("Sensationalism Level", tone.sensationalism, &SENSATIONALISM_TIERS),
            fragment("Controversy Level", tone.controversy, &CONTROVERSY_TIERS),
            fragment("Surprise Factor", tone.surprise_intensity, &SURPRISE_TIERS),
            fragment("Emotional Depth", tone.emotional_weight, &EMOTIONAL_WEIGHT_TIERS),
        ]
    }

    /// The tone block of the prompt: one instruction line per dial.
    pub fn instructions(&self) -> String {
        self.fragments().join("\n")
    }
}

fn fragment(label: &str, value: u8, tiers: &[&str; 4]) -> String {
    format!("- {label}: {value}% - {}", tiers[tier_index(value)])
}

/// Everything the generation client needs for one post.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub style: PostStyle,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Construct the generation request for one article/style/tone triple.
///
/// The current date is pinned into the system message so elapsed-time
/// arithmetic ("X years ago today") comes out right, and the accuracy
/// constraints forbid inventing anything not in the extract.
pub fn build(
    article: &ArticleRecord,
    style: PostStyle,
    tone: &ToneConfig,
    now: DateTime<Local>,
) -> GenerationRequest {
    let date_string = now.format("%A, %B %-d, %Y").to_string();
    let weekday = now.format("%A").to_string();
    let year = now.year();

    let system = format!(
        "You are a viral social media content creator who makes educational content engaging \
         and shareable.\n\n\
         CRITICAL: You must be factually accurate. Today's date is {date_string}. The current \
         year is {year}.\n\n\
         When creating content:\n\
         - Only state facts that are explicitly mentioned in the source material provided\n\
         - Calculate time differences correctly (e.g., \"X years ago\" must be mathematically \
         accurate)\n\
         - Do not embellish or exaggerate beyond what the source states\n\
         - Do not invent statistics, rankings, or superlatives not in the source\n\
         - If someone's birth/death year is given, calculate their age correctly\n\
         - Do not assume current status of people, places, or things without source confirmation"
    );

    let on_this_day = match (article.is_historical_event, article.year) {
        (true, Some(event_year)) => format!(
            "\nHISTORICAL EVENT: This event happened ON THIS DAY ({weekday}, specifically in \
             the year {event_year}). You may reference this as \"On this day in \
             {event_year}...\" or \"X years ago today...\". Calculate the years correctly \
             based on today being {year}.\n"
        ),
        _ => String::new(),
    };

    let user = format!(
        "You are a social media expert creating viral, educational content.\n\n\
         IMPORTANT: Today's date is {date_string}. If referencing \"today\", \"this day in \
         history\", or any current events, use this exact date.\n\n\
         Based on this Wikipedia content about \"{title}\":\n\n\
         \"{extract}\"\n\
         {on_this_day}\n\
         {style_instruction}\n\n\
         TONE SETTINGS (adjust your writing style based on these levels from 0-100):\n\
         {tone_instructions}\n\n\
         CRITICAL RULES - FOLLOW EXACTLY:\n\
         - Maximum {max_chars} characters (like Twitter/X)\n\
         - Use 1-3 relevant emojis strategically\n\
         - Include 1-2 relevant hashtags\n\
         - Be ACCURATE to the source material - do not invent facts, statistics, or claims \
         not in the source\n\
         - Make it shareable and engaging\n\
         - Don't mention Wikipedia or that this is AI-generated\n\
         - Sound like a real person, not a textbook\n\
         - Adjust your tone based on the settings above\n\n\
         ACCURACY REQUIREMENTS:\n\
         - If the source mentions specific numbers, dates, or statistics, use them EXACTLY \
         as stated\n\
         - Do NOT make up percentages, rankings, or comparisons not explicitly in the source\n\
         - Do NOT claim something is \"the largest\", \"the first\", \"the only\", etc. \
         unless the source says so\n\
         - If referring to time periods, calculate years correctly from today's date \
         ({date_string})\n\
         - Do NOT assume facts about living/dead status of people unless stated\n\
         - When the source is vague, keep your tweet appropriately vague rather than \
         inventing specifics\n\
         - If making comparisons (X is older than Y), only use verifiable information from \
         the source\n\n\
         Respond with ONLY the tweet text, nothing else.",
        title = article.title,
        extract = article.extract,
        style_instruction = style.instruction(),
        tone_instructions = tone.instructions(),
        max_chars = MAX_POST_CHARS,
    );

    GenerationRequest {
        system,
        user,
        style,
        max_tokens: MAX_COMPLETION_TOKENS,
        // Memes read better when the model is less literal.
        temperature: if style.is_meme() { 1.3 } else { 0.8 },
    }
}
