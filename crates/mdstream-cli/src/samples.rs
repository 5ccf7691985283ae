use rand::Rng;

/// Suggested prompts as (opening, endings). A suggestion is one opening
/// followed by one of its endings.
pub const SAMPLE_QUESTIONS: &[(&str, &[&str])] = &[
    ("Tell me a one liner joke about ", TOPICS),
    ("Tell me a joke about ", TOPICS),
];

const TOPICS: &[&str] = &[
    "dogs",
    "cats",
    "dinosaurs",
    "aliens",
    "artificial intelligence",
];

pub fn sample_question<R: Rng + ?Sized>(rng: &mut R) -> String {
    let (start, endings) = SAMPLE_QUESTIONS[rng.gen_range(0..SAMPLE_QUESTIONS.len())];
    let end = endings[rng.gen_range(0..endings.len())];
    format!("{}{}", start, end)
}
