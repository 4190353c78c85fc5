//! Ordered routing rules. Earlier rules shadow later ones.

use super::Ability;

/// A named keyword predicate paired with the ability it selects
pub struct Rule {
    pub name: &'static str,
    pub ability: Ability,
    predicate: fn(&str) -> bool,
}

impl Rule {
    /// `task` must already be trimmed and lowercased
    pub fn matches(&self, task: &str) -> bool {
        (self.predicate)(task)
    }
}

const INTERNSHIP_WORDS: &[&str] = &["internship", "intern", "internshala"];
const JOB_WORDS: &[&str] = &["job", "career", "naukri", "indeed", "linkedin jobs"];
const EXTRACTION_WORDS: &[&str] = &[
    "extract",
    "summarize",
    "summary",
    "get info",
    "get information",
    "find info",
];
const SOURCE_WORDS: &[&str] = &["from", "on", "at"];
const URL_MARKERS: &[&str] = &["http", "www", ".com", ".in"];
const SHOPPING_ACTIONS: &[&str] = &[
    "find",
    "buy",
    "order",
    "purchase",
    "get",
    "shop",
    "looking for",
    "search for",
    "want",
];
const NOT_SHOPPING_WORK: &[&str] = &["job", "career", "position", "employment", "internship", "intern"];
const NOT_SHOPPING_RESEARCH: &[&str] = &[
    "research about",
    "information about",
    "tell me about",
    "extract",
    "from bbc",
    "from techcrunch",
];
const RESEARCH_WORDS: &[&str] = &["research", "find information", "tell me about"];
const HEADLINE_WORDS: &[&str] = &["headline", "title"];
const BROWSE_WORDS: &[&str] = &["open", "browse", "scroll", "go to", "navigate"];
const CLICK_TYPE_WORDS: &[&str] = &["google", "news"];

fn contains_any(task: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| task.contains(n))
}

/// Whole-word match, for short words that hide inside longer ones ("on" in "iphone")
fn has_word(task: &str, words: &[&str]) -> bool {
    task.split(|c: char| !c.is_alphanumeric())
        .any(|token| words.contains(&token))
}

fn internship(task: &str) -> bool {
    contains_any(task, INTERNSHIP_WORDS)
}

fn job_search(task: &str) -> bool {
    contains_any(task, JOB_WORDS) && !contains_any(task, INTERNSHIP_WORDS)
}

fn extraction_with_source(task: &str) -> bool {
    contains_any(task, EXTRACTION_WORDS) && has_word(task, SOURCE_WORDS)
}

fn extraction_with_url(task: &str) -> bool {
    contains_any(task, EXTRACTION_WORDS) && contains_any(task, URL_MARKERS)
}

fn shopping(task: &str) -> bool {
    contains_any(task, SHOPPING_ACTIONS)
        && !contains_any(task, NOT_SHOPPING_WORK)
        && !contains_any(task, NOT_SHOPPING_RESEARCH)
}

fn form_fill(task: &str) -> bool {
    task.contains("fill") && task.contains("form")
}

fn universal_form(task: &str) -> bool {
    task.contains("form") && (task.contains("http") || task.contains("www"))
}

fn research(task: &str) -> bool {
    contains_any(task, RESEARCH_WORDS)
}

fn headlines(task: &str) -> bool {
    contains_any(task, HEADLINE_WORDS)
}

fn browse(task: &str) -> bool {
    contains_any(task, BROWSE_WORDS)
}

fn click_type(task: &str) -> bool {
    contains_any(task, CLICK_TYPE_WORDS)
}

static RULES: [Rule; 11] = [
    Rule { name: "internship", ability: Ability::Internship, predicate: internship },
    Rule { name: "job-search", ability: Ability::JobSearch, predicate: job_search },
    Rule { name: "extract-from-source", ability: Ability::TextExtract, predicate: extraction_with_source },
    Rule { name: "extract-from-url", ability: Ability::TextExtract, predicate: extraction_with_url },
    Rule { name: "shopping", ability: Ability::Shopping, predicate: shopping },
    Rule { name: "form-fill", ability: Ability::FormFill, predicate: form_fill },
    Rule { name: "universal-form", ability: Ability::UniversalForm, predicate: universal_form },
    Rule { name: "research", ability: Ability::Research, predicate: research },
    Rule { name: "headlines", ability: Ability::Headlines, predicate: headlines },
    Rule { name: "browse", ability: Ability::Browse, predicate: browse },
    Rule { name: "click-type", ability: Ability::ClickType, predicate: click_type },
];

/// The routing table, in precedence order
pub fn rules() -> &'static [Rule] {
    &RULES
}
