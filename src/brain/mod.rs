//! Intent Router ("brain")
//!
//! Maps a raw task string to one [`Ability`] by walking an ordered list of
//! keyword rules and returning the first match. There is no scoring: rule
//! order is the whole policy, so "find a marketing internship" is claimed by
//! the internship rule before the job and shopping rules ever see it.

pub mod rules;

pub use rules::{rules, Rule};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One dispatchable task handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Shopping,
    JobSearch,
    Internship,
    TextExtract,
    FormFill,
    UniversalForm,
    Research,
    Headlines,
    Browse,
    ClickType,
}

/// Ability used when no rule matches
pub const DEFAULT_ABILITY: Ability = Ability::ClickType;

impl Ability {
    pub const ALL: [Ability; 10] = [
        Ability::Shopping,
        Ability::JobSearch,
        Ability::Internship,
        Ability::TextExtract,
        Ability::FormFill,
        Ability::UniversalForm,
        Ability::Research,
        Ability::Headlines,
        Ability::Browse,
        Ability::ClickType,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Ability::Shopping => "shopping",
            Ability::JobSearch => "jobsearch",
            Ability::Internship => "internship",
            Ability::TextExtract => "textextract",
            Ability::FormFill => "formfill",
            Ability::UniversalForm => "universalform",
            Ability::Research => "research",
            Ability::Headlines => "headlines",
            Ability::Browse => "browse",
            Ability::ClickType => "clicktype",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Shopping => "AI Shopping Assistant",
            Ability::JobSearch => "AI Job Finder",
            Ability::Internship => "AI Career Agent",
            Ability::TextExtract => "Text Extraction & Summary",
            Ability::FormFill => "Form Filler",
            Ability::UniversalForm => "Universal Smart Form Filler",
            Ability::Research => "Web Research",
            Ability::Headlines => "News Headlines",
            Ability::Browse => "Smart Browser",
            Ability::ClickType => "Click & Type Search",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Ability::Shopping => "Find the best deals across Google Shopping, Amazon and Flipkart",
            Ability::JobSearch => "Search Indeed, Naukri and LinkedIn and rank the top 3 jobs",
            Ability::Internship => "Find internships on Internshala, preferring paid ones",
            Ability::TextExtract => "Summarize what a site says about a topic",
            Ability::FormFill => "Fill every text field on a form with placeholder data",
            Ability::UniversalForm => "Fill a form by matching fields to your profile",
            Ability::Research => "Collect search-result snippets about a topic",
            Ability::Headlines => "Read the top Google News headlines",
            Ability::Browse => "Open a search in the browser and scroll the results",
            Ability::ClickType => "Type the task into Google search",
        }
    }

    /// Progress line announced when the ability starts
    pub fn start_message(&self) -> &'static str {
        match self {
            Ability::Shopping => "Starting AI Shopping Assistant...",
            Ability::JobSearch => "Searching for jobs...",
            Ability::Internship => "Finding internships...",
            Ability::TextExtract => "Extracting & summarizing...",
            Ability::FormFill => "Filling form...",
            Ability::UniversalForm => "Universal form fill...",
            Ability::Research => "Researching...",
            Ability::Headlines => "Extracting headlines...",
            Ability::Browse => "Opening browser...",
            Ability::ClickType => "Running click & type...",
        }
    }

    pub fn uses_browser(&self) -> bool {
        matches!(
            self,
            Ability::FormFill | Ability::UniversalForm | Ability::Browse | Ability::ClickType
        )
    }
}

impl std::fmt::Display for Ability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Ability {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ability::ALL
            .iter()
            .copied()
            .find(|a| a.id() == s)
            .ok_or_else(|| format!("unknown ability '{}'", s))
    }
}

/// Pick the ability for a task. Returns `None` only for blank input.
pub fn plan(task: &str) -> Option<Ability> {
    let normalized = task.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    let chosen = rules()
        .iter()
        .find(|rule| rule.matches(&normalized))
        .map(|rule| {
            debug!(rule = rule.name, ability = %rule.ability, "Routing rule matched");
            rule.ability
        })
        .unwrap_or(DEFAULT_ABILITY);

    Some(chosen)
}

/// Like [`plan`], but never fails: blank input or a panic inside a rule
/// yields [`DEFAULT_ABILITY`].
pub fn plan_or_default(task: &str) -> Ability {
    match std::panic::catch_unwind(|| plan(task)) {
        Ok(Some(ability)) => ability,
        Ok(None) => DEFAULT_ABILITY,
        Err(_) => {
            warn!("Intent router panicked, falling back to default ability");
            DEFAULT_ABILITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_search_routing() {
        assert_eq!(
            plan("find python developer jobs in bangalore"),
            Some(Ability::JobSearch)
        );
        assert_eq!(plan("Search Naukri for data analyst"), Some(Ability::JobSearch));
        assert_eq!(plan("career options in design"), Some(Ability::JobSearch));
    }

    #[test]
    fn test_internship_beats_job_and_shopping() {
        assert_eq!(plan("find a marketing internship"), Some(Ability::Internship));
        assert_eq!(plan("find intern jobs in pune"), Some(Ability::Internship));
        assert_eq!(plan("search internshala for design"), Some(Ability::Internship));
    }

    #[test]
    fn test_extraction_routing() {
        assert_eq!(plan("extract text about AI from BBC"), Some(Ability::TextExtract));
        assert_eq!(
            plan("get info about climate change from TechCrunch"),
            Some(Ability::TextExtract)
        );
        assert_eq!(plan("summarize https://example.com/post"), Some(Ability::TextExtract));
    }

    #[test]
    fn test_shopping_routing() {
        assert_eq!(plan("buy wireless earbuds under 2000"), Some(Ability::Shopping));
        assert_eq!(plan("find cheapest iphone 15"), Some(Ability::Shopping));
        assert_eq!(plan("I want a gaming laptop"), Some(Ability::Shopping));
    }

    #[test]
    fn test_form_routing() {
        assert_eq!(
            plan("fill the form at https://example.com/signup"),
            Some(Ability::FormFill)
        );
        assert_eq!(
            plan("complete form https://example.com/checkout"),
            Some(Ability::UniversalForm)
        );
    }

    #[test]
    fn test_remaining_routes() {
        assert_eq!(plan("research about quantum computing"), Some(Ability::Research));
        assert_eq!(plan("tell me about rust lifetimes"), Some(Ability::Research));
        assert_eq!(plan("show me today's headlines"), Some(Ability::Headlines));
        assert_eq!(plan("open youtube and scroll"), Some(Ability::Browse));
        assert_eq!(plan("google weather tomorrow"), Some(Ability::ClickType));
    }

    #[test]
    fn test_default_and_blank() {
        assert_eq!(plan("hello there"), Some(DEFAULT_ABILITY));
        assert_eq!(plan("   "), None);
        assert_eq!(plan_or_default(""), DEFAULT_ABILITY);
        assert_eq!(plan_or_default("find a marketing internship"), Ability::Internship);
    }

    #[test]
    fn test_ability_ids_round_trip() {
        for ability in Ability::ALL {
            assert_eq!(ability.id().parse::<Ability>(), Ok(ability));
            let json = serde_json::to_string(&ability).unwrap();
            assert_eq!(json, format!("\"{}\"", ability.id()));
        }
        assert!("ability99".parse::<Ability>().is_err());
    }
}
