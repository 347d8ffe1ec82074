//! When the persona may send a picture, and what the picture shows.
//!
//! Everything here is a pure function of the reply text or the day's
//! count. The bridge decides what to do with the answers.

/// Phrases in a reply that mean the persona offered a picture.
pub const IMAGE_TRIGGERS: [&str; 9] = [
    "selfie",
    "picture",
    "photo",
    "show you",
    "look like",
    "see me",
    "what i look like",
    "send you a pic",
    "send a pic",
];

/// Default number of images per local calendar day.
pub const DEFAULT_DAILY_LIMIT: usize = 5;

const PROMPT_BASE: &str = "A whimsical, magical tooth fairy character, ";
const PROMPT_STYLE: &str =
    "children's book illustration style, warm and friendly, magical atmosphere, soft lighting";

/// Whether the reply offers an image. Case-insensitive substring match.
pub fn should_offer(reply: &str) -> bool {
    let lower = reply.to_lowercase();
    IMAGE_TRIGGERS.iter().any(|t| lower.contains(t))
}

/// The scene an image should depict, chosen from the reply text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scene {
    Flight,
    Collection,
    Palace,
    Portrait,
}

impl Scene {
    /// First match wins, in declaration order.
    pub fn detect(reply: &str) -> Self {
        let lower = reply.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));

        if has(&["flying", "fly"]) {
            Scene::Flight
        } else if has(&["collecting", "teeth"]) {
            Scene::Collection
        } else if has(&["palace", "home"]) {
            Scene::Palace
        } else {
            Scene::Portrait
        }
    }

    pub fn clause(&self) -> &'static str {
        match self {
            Scene::Flight => {
                "flying through a starlit night sky with magical sparkles trailing behind, "
            }
            Scene::Collection => "collecting shiny teeth with a small magical bag, ",
            Scene::Palace => "in a beautiful crystal palace made of teeth and stars, ",
            Scene::Portrait => {
                "with delicate wings and a warm smile, surrounded by fairy dust and sparkles, "
            }
        }
    }
}

/// Image prompt for a reply: base, scene clause, style.
pub fn build_prompt(reply: &str) -> String {
    let scene = Scene::detect(reply);
    format!("{PROMPT_BASE}{}{PROMPT_STYLE}", scene.clause())
}

/// Result of the daily quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Allowed { remaining: usize },
    Exhausted,
}

/// The daily image quota.
#[derive(Debug, Clone, Copy)]
pub struct ImagePolicy {
    daily_limit: usize,
}

impl ImagePolicy {
    pub fn new(daily_limit: usize) -> Self {
        Self { daily_limit }
    }

    pub fn daily_limit(&self) -> usize {
        self.daily_limit
    }

    /// Allowed iff fewer than `daily_limit` images were sent today.
    pub fn check_quota(&self, count_today: usize) -> Quota {
        if count_today < self.daily_limit {
            Quota::Allowed {
                remaining: self.daily_limit - count_today,
            }
        } else {
            Quota::Exhausted
        }
    }
}

impl Default for ImagePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_LIMIT)
    }
}

/// Sent instead of an image once the quota is used up.
pub fn battery_message(primary_display_name: &str) -> String {
    format!(
        "Whoopsie {primary_display_name}, my camera ran out of battery! 📸✨ I'll recharge it and send you pictures tomorrow!"
    )
}
