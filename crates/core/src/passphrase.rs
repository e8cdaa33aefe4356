//! Word-based edit secrets.

use rand::seq::IndexedRandom;

/// Default number of words in a generated pass-phrase.
pub const DEFAULT_WORD_COUNT: usize = 3;

/// Largest accepted `secret.words` setting.
pub const MAX_WORD_COUNT: usize = 8;

/// Word list pass-phrases are drawn from. Short, lower-case, unambiguous.
pub const WORDS: &[&str] = &[
    "acorn", "amber", "anchor", "apple", "arrow", "aspen", "badge", "bagel", "basil", "beacon",
    "berry", "birch", "bison", "blaze", "bloom", "boulder", "breeze", "brook", "cabin", "cactus",
    "camel", "candle", "canyon", "carrot", "cedar", "chalk", "cherry", "cider", "clover", "cobalt",
    "comet", "coral", "cotton", "crane", "cricket", "daisy", "delta", "denim", "dune", "eagle",
    "ember", "fable", "falcon", "fern", "fiddle", "fjord", "flint", "forest", "fossil", "garnet",
    "ginger", "glacier", "granite", "gravel", "harbor", "hazel", "heron", "hollow", "honey",
    "island", "ivory", "jasper", "juniper", "kettle", "kiwi", "lagoon", "lantern", "lemon",
    "lilac", "linen", "lotus", "maple", "marble", "meadow", "melon", "mint", "mosaic", "nectar",
    "nutmeg", "oasis", "olive", "onyx", "orchid", "otter", "paddle", "pebble", "pepper", "pine",
    "plume", "prairie", "quartz", "quill", "raven", "reef", "ripple", "river", "robin", "saffron",
    "sage", "salmon", "sequoia", "shadow", "sierra", "slate", "sparrow", "spruce", "summit",
    "tango", "thistle", "thunder", "timber", "topaz", "tulip", "tundra", "velvet", "violet",
    "walnut", "willow", "winter", "yarrow", "zephyr",
];

/// Generate a pass-phrase of `word_count` random words joined by `-`.
///
/// A count of zero is treated as one.
pub fn generate_passphrase(word_count: usize) -> String {
    let mut rng = rand::rng();
    let count = word_count.max(1);
    let mut words = Vec::with_capacity(count);
    for _ in 0..count {
        if let Some(word) = WORDS.choose(&mut rng) {
            words.push(*word);
        }
    }
    words.join("-")
}
