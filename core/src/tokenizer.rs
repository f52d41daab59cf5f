use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)[\p{L}\p{N}][\p{L}\p{N}_']*").expect("valid regex");
    static ref ENGLISH_STEMMER: Stemmer = Stemmer::create(Algorithm::English);
    static ref RUSSIAN_STEMMER: Stemmer = Stemmer::create(Algorithm::Russian);
    static ref ENGLISH_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "a","about","above","after","again","against","all","am","an","and","any","are","aren't","as","at",
            "be","because","been","before","being","below","between","both","but","by",
            "can","can't","cannot","could","couldn't",
            "did","didn't","do","does","doesn't","doing","don't","down","during",
            "each","few","for","from","further",
            "had","hadn't","has","hasn't","have","haven't","having","he","he'd","he'll","he's","her","here","here's","hers","herself","him","himself","his","how","how's",
            "i","i'd","i'll","i'm","i've","if","in","into","is","isn't","it","it's","its","itself",
            "let's","me","more","most","mustn't","my","myself",
            "no","nor","not","of","off","on","once","only","or","other","ought","our","ours","ourselves","out","over","own",
            "same","she","she'd","she'll","she's","should","shouldn't","so","some","such",
            "than","that","that's","the","their","theirs","them","themselves","then","there","there's","these","they","they'd","they'll","they're","they've","this","those","through","to","too",
            "under","until","up","very",
            "was","wasn't","we","we'd","we'll","we're","we've","were","weren't","what","what's","when","when's","where","where's","which","while","who","who's","whom","why","why's","with","won't","would","wouldn't",
            "you","you'd","you'll","you're","you've","your","yours","yourself","yourselves"
        ];
        words.iter().copied().collect()
    };
    static ref RUSSIAN_STOPWORDS: HashSet<&'static str> = {
        let words: &[&str] = &[
            "а","без","более","бы","был","была","были","было","быть","в","вам","вас","весь","во","вот","все","всего","всех","вы",
            "где","да","даже","для","до","его","ее","её","если","есть","еще","ещё","же","за","здесь",
            "и","из","или","им","их","к","как","когда","кто","ли","либо","мне","может","мы",
            "на","над","надо","наш","не","него","нее","неё","нет","ни","них","но","ну",
            "о","об","однако","он","она","они","оно","от","очень","по","под","при","про",
            "с","со","так","также","такой","там","те","тем","то","того","тоже","той","только","том","ты",
            "у","уже","хотя","чего","чей","чем","что","чтобы","эта","эти","это","этот","я"
        ];
        words.iter().copied().collect()
    };
}

/// Language used for stopword filtering and stemming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Russian,
}

impl Language {
    fn stemmer(self) -> &'static Stemmer {
        match self {
            Language::English => &ENGLISH_STEMMER,
            Language::Russian => &RUSSIAN_STEMMER,
        }
    }

    fn is_stopword(self, token: &str) -> bool {
        match self {
            Language::English => ENGLISH_STOPWORDS.contains(token),
            Language::Russian => RUSSIAN_STOPWORDS.contains(token),
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "ru" | "russian" => Ok(Language::Russian),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => f.write_str("english"),
            Language::Russian => f.write_str("russian"),
        }
    }
}

/// Settings frozen into an index so queries are tokenized exactly like the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    pub language: Language,
    pub remove_stopwords: bool,
    pub stem: bool,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self { language: Language::English, remove_stopwords: true, stem: true }
    }
}

impl TokenizerConfig {
    /// Tokenize text into (term, position) using NFKC normalization, lowercase, stopword removal, and stemming.
    pub fn tokenize(&self, text: &str) -> Vec<(String, usize)> {
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        let mut tokens = Vec::new();
        for (pos, mat) in RE.find_iter(&normalized).enumerate() {
            let token = mat.as_str();
            if self.remove_stopwords && self.language.is_stopword(token) { continue; }
            let term = if self.stem {
                self.language.stemmer().stem(token).into_owned()
            } else {
                token.to_string()
            };
            tokens.push((term, pos));
        }
        tokens
    }
}

/// Tokenize with the default English configuration.
pub fn tokenize(text: &str) -> Vec<(String, usize)> {
    TokenizerConfig::default().tokenize(text)
}
