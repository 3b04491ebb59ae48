use rand::rngs::SmallRng;
use rand::Rng;

/// Suffix of every simulated reply; the UI's settings hint points here.
pub const SIMULATED_DISCLAIMER: &str =
    "\n\nThis is a simulated response. Add an API key in Settings to enable real AI answers.";

pub(crate) const FILLER_REPLIES: [&str; 5] = [
    "That's a great question! Let me think about that for a moment. Based on what you've shared, I think there are several interesting aspects to consider...",
    "I understand what you're asking about. This is actually a fascinating topic that touches on several important concepts. Let me break this down for you...",
    "Thanks for sharing that with me! I can definitely help you with this. Here's what I would suggest based on current best practices...",
    "That's an excellent point you've raised. I've been thinking about similar questions lately, and I believe the key factors to consider are...",
    "I appreciate you bringing this up! This reminds me of a related concept that might be helpful to explore together...",
];

/// Pick a filler sentence and attach the disclaimer.
pub(crate) fn simulated_reply(rng: &mut SmallRng) -> String {
    let pick = FILLER_REPLIES[rng.gen_range(0..FILLER_REPLIES.len())];
    format!("{}{}", pick, SIMULATED_DISCLAIMER)
}
