use crate::error::DictionaryError;
use fst::Set;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Frequency given to every word of a plain word-list dictionary.
const UNIFORM_FREQUENCY: u64 = 1;
/// Frequency given to the domain terms merged into every dictionary.
const DOMAIN_FREQUENCY: u64 = 10;
/// Floor frequency of the core words merged into every loaded dictionary.
const CORE_FREQUENCY: u64 = 1000;

/// Function words, single letters and contractions. Plain word lists often
/// lack them, and without a frequency they lose ranking ties to rare words.
const CORE_WORDS: &[&str] = &[
    "a", "i", "the", "and", "to", "of", "in", "is", "it", "you", "that", "he", "she", "was",
    "for", "on", "are", "with", "as", "his", "her", "they", "be", "at", "one", "have", "this",
    "from", "or", "had", "by", "but", "not", "what", "all", "were", "we", "when", "your", "can",
    "said", "there", "an", "which", "do", "their", "if", "will", "how", "about", "then", "them",
    "these", "so", "would", "my", "me", "no", "i'm", "i've", "i'd", "i'll", "don't", "doesn't",
    "didn't", "isn't", "aren't", "wasn't", "weren't", "can't", "couldn't", "won't", "wouldn't",
    "shouldn't", "haven't", "hasn't", "hadn't", "it's", "that's", "there's", "what's", "let's",
    "you're", "we're", "they're", "you've", "we've", "they've", "he's", "she's",
];

/// Academic, health and technology compounds that general word lists tend to miss.
const DOMAIN_TERMS: &[&str] = &[
    "long-term",
    "short-term",
    "face-to-face",
    "well-being",
    "wellbeing",
    "wellness",
    "burnout",
    "burn-out",
    "overdependence",
    "over-dependence",
    "e-learning",
    "self-esteem",
    "prefrontal",
    "prefrontal-cortex",
    "executive-function",
    "attention-span",
    "sleep-deprived",
    "sleep-deprivation",
    "hyperactivity",
    "adhd",
    "anxiety",
    "depression",
    "cognition",
    "cognitive",
    "neural",
    "neuroscience",
    "dopamine",
    "serotonin",
    "oxytocin",
    "hippocampus",
    "neurotransmitter",
    "neurotransmitters",
    "evidence-based",
    "peer-reviewed",
    "meta-analysis",
    "randomized",
    "randomised",
    "placebo",
    "placebo-controlled",
    "double-blind",
    "socioeconomic",
    "real-time",
    "part-time",
    "full-time",
    "longstanding",
    "self-regulation",
    "self-control",
    "self-report",
    "self-reported",
    "co-occurring",
    "coexisting",
    "baseline",
    "posttest",
    "post-test",
    "pretest",
    "pre-test",
    "ecommerce",
    "e-commerce",
    "cybersecurity",
    "cyber-security",
    "multitask",
    "multitasking",
    "multitasker",
    "internet-based",
    "online",
    "offline",
];

/// Where the words of a [`Lexicon`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictionarySource {
    /// A JSON dictionary file named in the configuration.
    File(PathBuf),
    /// A word list installed into the data directory with `docchk dict download`.
    Installed(PathBuf),
    /// The small list compiled into the binary.
    Builtin,
}

impl fmt::Display for DictionarySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DictionarySource::File(path) => write!(f, "file {}", path.display()),
            DictionarySource::Installed(path) => write!(f, "installed {}", path.display()),
            DictionarySource::Builtin => write!(f, "built-in word list"),
        }
    }
}

/// Lowercased vocabulary with per-word frequencies and an FST membership set.
pub struct Lexicon {
    words: Vec<String>,
    frequencies: HashMap<String, u64>,
    set: Set<Vec<u8>>,
    source: DictionarySource,
}

impl Lexicon {
    /// Resolve a dictionary through the fallback chain: the configured file,
    /// then the installed word list for `language`, then the built-in list.
    /// The core words are merged into whichever source wins.
    ///
    /// A missing file falls through to the next source; a file that exists but
    /// cannot be read or parsed is an error.
    pub fn load(path: Option<&Path>, language: &str) -> Result<Self, DictionaryError> {
        let mut strategies = Vec::new();
        if let Some(path) = path {
            strategies.push(DictionarySource::File(path.to_path_buf()));
        }
        if let Some(installed) = installed_path(language) {
            strategies.push(DictionarySource::Installed(installed));
        }
        strategies.push(DictionarySource::Builtin);

        for source in strategies {
            match source.entries()? {
                Some(entries) => {
                    let lexicon = Self::from_entries(with_core_words(entries), source)?;
                    info!(
                        source = %lexicon.source,
                        words = lexicon.len(),
                        "Loaded dictionary"
                    );
                    return Ok(lexicon);
                }
                None => {
                    if let DictionarySource::File(path) = &source {
                        warn!(path = %path.display(), "Dictionary file not found, falling back");
                    }
                }
            }
        }

        // The built-in source always yields entries.
        Self::from_entries(with_core_words(builtin_entries()), DictionarySource::Builtin)
    }

    /// Build from `(word, frequency)` pairs; the domain terms are merged in.
    pub fn from_entries<I>(entries: I, source: DictionarySource) -> Result<Self, DictionaryError>
    where
        I: IntoIterator<Item = (String, u64)>,
    {
        let mut frequencies: HashMap<String, u64> = HashMap::new();
        for (word, frequency) in entries {
            let word = word.trim().to_lowercase();
            if word.is_empty() {
                continue;
            }
            let slot = frequencies.entry(word).or_insert(0);
            *slot = (*slot).max(frequency);
        }
        for term in DOMAIN_TERMS {
            frequencies
                .entry(term.to_string())
                .or_insert(DOMAIN_FREQUENCY);
        }

        let mut words: Vec<String> = frequencies.keys().cloned().collect();
        words.sort();
        let set = Set::from_iter(words.iter())?;

        Ok(Self {
            words,
            frequencies,
            set,
            source,
        })
    }

    /// Exact lookup of the lowercased word.
    pub fn contains(&self, word: &str) -> bool {
        self.set.contains(word.to_lowercase())
    }

    pub fn frequency(&self, word: &str) -> u64 {
        self.frequencies.get(word).copied().unwrap_or(0)
    }

    /// Words in lexicographic order.
    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn source(&self) -> &DictionarySource {
        &self.source
    }
}

impl DictionarySource {
    /// `Ok(None)` means this source is absent and the next one should be tried.
    fn entries(&self) -> Result<Option<Vec<(String, u64)>>, DictionaryError> {
        match self {
            DictionarySource::File(path) | DictionarySource::Installed(path) => {
                if !path.exists() {
                    return Ok(None);
                }
                read_json_dictionary(path).map(Some)
            }
            DictionarySource::Builtin => Ok(Some(builtin_entries())),
        }
    }
}

/// Parse a JSON dictionary: an object maps words to frequencies, an array
/// lists words with uniform frequency.
pub fn read_json_dictionary(path: &Path) -> Result<Vec<(String, u64)>, DictionaryError> {
    let contents = fs::read_to_string(path).map_err(|source| DictionaryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&contents).map_err(|source| DictionaryError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let unsupported = || DictionaryError::UnsupportedShape(path.to_path_buf());
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(word, freq)| {
                let freq = freq
                    .as_u64()
                    .or_else(|| freq.as_f64().map(|f| f.max(0.0) as u64))
                    .ok_or_else(unsupported)?;
                Ok((word, freq))
            })
            .collect(),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(word) => Ok((word, UNIFORM_FREQUENCY)),
                _ => Err(unsupported()),
            })
            .collect(),
        _ => Err(unsupported()),
    }
}

/// Write `(word, frequency)` pairs as a JSON object dictionary. Repeated
/// words keep their highest frequency.
pub fn write_json_dictionary(entries: &[(String, u64)], output_path: &Path) -> anyhow::Result<()> {
    use anyhow::Context;

    let mut words: BTreeMap<&str, u64> = BTreeMap::new();
    for (word, frequency) in entries {
        let slot = words.entry(word.as_str()).or_insert(0);
        *slot = (*slot).max(*frequency);
    }

    let json = serde_json::to_string(&words).context("Failed to encode dictionary")?;
    fs::write(output_path, json)
        .with_context(|| format!("Failed to write dictionary: {}", output_path.display()))?;

    Ok(())
}

/// Location of the installed word list for `language`, if a data directory exists.
pub fn installed_path(language: &str) -> Option<PathBuf> {
    crate::config::Config::data_dir().map(|dir| dir.join(format!("{}.json", language)))
}

fn with_core_words(mut entries: Vec<(String, u64)>) -> Vec<(String, u64)> {
    entries.extend(CORE_WORDS.iter().map(|w| (w.to_string(), CORE_FREQUENCY)));
    entries
}

fn builtin_entries() -> Vec<(String, u64)> {
    BUILTIN_WORDS
        .iter()
        .map(|w| (w.to_string(), DOMAIN_FREQUENCY))
        .collect()
}

// Last resort so the analyzer never runs with an empty vocabulary.
const BUILTIN_WORDS: &[&str] = &[
    "a", "about", "after", "all", "also", "an", "and", "another", "any", "as", "at", "back",
    "be", "because", "but", "by", "can", "come", "contain", "content", "could", "day", "do",
    "document", "errors", "even", "example", "first", "for", "from", "get", "give", "go", "goes",
    "good", "grammar", "have", "he", "her", "here", "him", "his", "how", "i", "identifies", "if",
    "in", "intentional", "into", "is", "it", "its", "just", "know", "like", "look", "make", "me",
    "mistakes", "most", "my", "new", "no", "not", "now", "of", "on", "one", "only", "or",
    "other", "our", "out", "over", "paragraph", "people", "purposes", "say", "see", "sentences",
    "several", "she", "so", "some", "spelling", "take", "testing", "text", "than", "that",
    "the", "their", "them", "then", "there", "these", "they", "think", "this", "time", "to",
    "two", "up", "us", "use", "want", "way", "we", "well", "what", "when", "which", "who",
    "will", "with", "work", "works", "would", "wrong", "year", "you", "your",
];
