use crate::checker::dictionary::{read_json_dictionary, write_json_dictionary};
use crate::config::Config;
use anyhow::{bail, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// OpenSubtitles frequency list, one `word count` pair per line
const WORDLIST_BASE_URL: &str =
    "https://raw.githubusercontent.com/hermitdave/FrequencyWords/master/content/2018";
const WORDLIST_VERSION: &str = "2018";
// Frequency for lines of a plain list that carry no count.
const UNCOUNTED_FREQUENCY: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryInfo {
    pub language: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

fn data_dir() -> Result<PathBuf> {
    Config::data_dir().context("Failed to get data directory")
}

/// Installed `<language>.json` dictionaries in `dir`, sorted by language.
pub fn installed_dictionaries(dir: &Path) -> Result<Vec<DictionaryInfo>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }
        let Some(language) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        found.push(DictionaryInfo {
            language: language.to_string(),
            size_bytes: fs::metadata(&path)?.len(),
            path,
        });
    }
    found.sort_by(|a, b| a.language.cmp(&b.language));
    Ok(found)
}

pub fn list_dictionaries() -> Result<()> {
    let data_dir = data_dir()?;
    let installed = installed_dictionaries(&data_dir)?;

    if installed.is_empty() {
        println!("{}", "No dictionaries installed.".yellow());
        println!(
            "Run {} to download a dictionary.",
            "docchk dict download en-US".cyan()
        );
        return Ok(());
    }

    println!("{}", "Installed dictionaries:".bold());
    println!();
    for dict in &installed {
        println!(
            "  {} {} ({})",
            "✓".green(),
            dict.language.cyan().bold(),
            format!("{}KB", dict.size_bytes / 1024).dimmed()
        );
    }
    println!();
    println!(
        "Data directory: {}",
        data_dir.display().to_string().dimmed()
    );

    Ok(())
}

fn wordlist_url(language: &str) -> Result<String> {
    match language {
        "en-US" | "en-GB" | "en" => Ok(format!("{}/en/en_50k.txt", WORDLIST_BASE_URL)),
        other => bail!(
            "Language '{}' is not supported. Only 'en-US' and 'en-GB' are currently available.",
            other
        ),
    }
}

/// Parse a newline-separated list of `word [count]` lines into lowercased
/// `(word, frequency)` pairs. Lines without a count get a frequency of 1.
fn parse_wordlist(content: &str) -> Vec<(String, u64)> {
    content
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let word = fields.next()?.to_lowercase();
            let frequency = fields
                .next()
                .and_then(|count| count.parse().ok())
                .unwrap_or(UNCOUNTED_FREQUENCY);
            Some((word, frequency))
        })
        .collect()
}

pub fn download_dictionary(language: &str) -> Result<()> {
    let wordlist_url = wordlist_url(language)?;
    println!(
        "{} dictionary for {} (version: {})...",
        "Downloading".cyan().bold(),
        language.yellow(),
        WORDLIST_VERSION.dimmed()
    );
    println!("Source: {}", wordlist_url.dimmed());

    let data_dir = data_dir()?;
    fs::create_dir_all(&data_dir).context("Failed to create data directory")?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Downloading...");

    let response =
        reqwest::blocking::get(&wordlist_url).context("Failed to download dictionary")?;
    if !response.status().is_success() {
        pb.finish_and_clear();
        bail!("Failed to download dictionary: HTTP {}", response.status());
    }
    let content = response.text()?;
    pb.finish_with_message("Download complete");

    let entries = parse_wordlist(&content);
    println!("Found {} words", entries.len().to_string().yellow());

    let dict_path = data_dir.join(format!("{}.json", language));
    write_json_dictionary(&entries, &dict_path)?;
    info!(path = %dict_path.display(), words = entries.len(), "Installed dictionary");

    println!(
        "{} Dictionary installed: {}",
        "✓".green().bold(),
        dict_path.display().to_string().cyan()
    );

    Ok(())
}

pub fn show_info(language: &str) -> Result<()> {
    let dict_path = data_dir()?.join(format!("{}.json", language));

    if !dict_path.exists() {
        println!(
            "{} Dictionary for {} not found.",
            "✗".red().bold(),
            language.yellow()
        );
        println!(
            "Run {} to download it.",
            format!("docchk dict download {}", language).cyan()
        );
        return Ok(());
    }

    let metadata = fs::metadata(&dict_path)?;
    println!("{}", format!("Dictionary: {}", language).bold());
    println!("  Path: {}", dict_path.display());
    println!("  Size: {} KB", metadata.len() / 1024);
    println!("  Version: {}", WORDLIST_VERSION);
    println!("  Format: JSON word frequencies");

    match read_json_dictionary(&dict_path) {
        Ok(entries) => println!("  Words: {}", entries.len().to_string().yellow()),
        Err(e) => println!("  {}: {}", "Error loading dictionary".red(), e),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::dictionary::Lexicon;
    use crate::checker::suggestions::SpellIndex;

    #[test]
    fn test_installed_dictionaries_only_json() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("en-US.json"), r#"["hello"]"#).unwrap();
        fs::write(dir.path().join("en-GB.json"), r#"["colour"]"#).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let found = installed_dictionaries(dir.path()).unwrap();
        let languages: Vec<_> = found.iter().map(|d| d.language.as_str()).collect();
        assert_eq!(languages, vec!["en-GB", "en-US"]);
    }

    #[test]
    fn test_missing_data_dir_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let found = installed_dictionaries(&dir.path().join("absent")).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_parse_wordlist() {
        let entries = parse_wordlist("The 5000\r\na\n\n  cherry  12 \nodd x\n");
        assert_eq!(
            entries,
            vec![
                ("the".to_string(), 5000),
                ("a".to_string(), 1),
                ("cherry".to_string(), 12),
                ("odd".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_installed_list_keeps_short_words_and_ranks_common_ones() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("en-US.json");
        let entries = parse_wordlist("a\ni\nthe\ntee\nten\neh\ncat\nsaw\ndont\n");
        write_json_dictionary(&entries, &path).unwrap();

        let lexicon = Lexicon::load(Some(&path), "en-US").unwrap();
        let index = SpellIndex::build(lexicon, 2);

        assert_eq!(index.suggest("teh", 5).first().map(String::as_str), Some("the"));
        for word in ["I", "saw", "a", "cat", "don't", "it's"] {
            assert!(index.is_correct(word), "{word} flagged");
        }
    }

    #[test]
    fn test_unsupported_language() {
        assert!(wordlist_url("de-DE").is_err());
        assert!(wordlist_url("en-US").unwrap().ends_with("en_50k.txt"));
    }
}
