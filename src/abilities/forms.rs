//! Form-fill agents
//!
//! Both agents open the first URL in the task, fill the page's text-like
//! inputs and then pass through the submission gate. Blind fill types
//! "Test Data" everywhere; smart fill matches each field's placeholder and
//! name against a dictionary of demo values, preferring the user's profile.
//!
//! Nothing is submitted unless the gate approves. When the gate asks, the
//! question is put to the user as a `confirm()` dialog on the page itself
//! and an unanswered dialog counts as a no.

use serde::Serialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{find_url, AbilityContext, AbilityOutput, AbilityResult};
use crate::browser::{BrowserSession, InputField};
use crate::models::UserProfile;
use crate::types::AppResult;

pub const BLIND_VALUE: &str = "Test Data";

const CONFIRM_PROMPT: &str = "Do you want to submit this form?";
const CONFIRM_WAIT: Duration = Duration::from_secs(20);

/// Matched in order against a field's placeholder and name
const DEMO_VALUES: &[(&str, &str)] = &[
    ("name", "Rahul Verma"),
    ("email", "rahul@gmail.com"),
    ("address", "MG Road, Mumbai"),
    ("city", "Mumbai"),
    ("state", "Maharashtra"),
    ("zip", "400001"),
    ("phone", "9876543210"),
    ("password", "Secret@123"),
    ("card", "5555 4444 3333 1111"),
    ("cvv", "777"),
    ("expiry", "11/30"),
];

const SUBMIT_SELECTORS: &[&str] = &["button[type=submit]", "input[type=submit]"];
const SUBMIT_WORDS: &[&str] = &["submit", "pay", "register", "place order"];

/// Whether a filled form may be submitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitGate {
    /// Ask on the page
    #[default]
    Ask,
    Approved,
    Declined,
}

impl SubmitGate {
    /// From a request's `confirm_submit` answer; no answer means ask
    pub fn from_answer(answer: Option<bool>) -> Self {
        match answer {
            Some(true) => SubmitGate::Approved,
            Some(false) => SubmitGate::Declined,
            None => SubmitGate::Ask,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FillMode {
    Blind,
    Smart,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormReport {
    pub url: String,
    pub mode: FillMode,
    pub filled: usize,
    pub skipped: usize,
    pub submitted: bool,
}

fn profile_value(key: &str, profile: &UserProfile) -> Option<String> {
    let value = match key {
        "name" => profile.full_name.as_ref(),
        "email" => profile.email.as_ref(),
        "address" => profile.address.as_ref(),
        "city" => profile.city.as_ref(),
        "state" => profile.state.as_ref(),
        "zip" => profile.pincode.as_ref(),
        "phone" => profile.phone.as_ref(),
        _ => None,
    };
    value.filter(|v| !v.trim().is_empty()).cloned()
}

/// Value for `field` in smart mode, `None` when no dictionary key matches
pub fn smart_value(field: &InputField, profile: Option<&UserProfile>) -> Option<String> {
    let label = field.label();
    let (key, demo) = DEMO_VALUES.iter().find(|(key, _)| label.contains(key))?;
    Some(
        profile
            .and_then(|p| profile_value(key, p))
            .unwrap_or_else(|| demo.to_string()),
    )
}

/// Click the first submit control found: a submit button, a submit input,
/// then any button labelled like a submit action
pub async fn safe_submit(session: &dyn BrowserSession) -> AppResult<bool> {
    for selector in SUBMIT_SELECTORS {
        if session.click_first(selector).await? {
            debug!(selector, "Clicked submit control");
            return Ok(true);
        }
    }
    session.click_button_with_text(SUBMIT_WORDS).await
}

pub async fn run(task: &str, mode: FillMode, ctx: &AbilityContext) -> AppResult<AbilityResult> {
    let Some(url) = find_url(task) else {
        return Ok(AbilityResult::error(
            "No form URL found in the task. Example: 'fill the form at https://example.com/signup'",
        ));
    };
    info!(url = %url, mode = ?mode, "Form fill");

    let mut session = ctx.services.launcher.launch().await?;
    let outcome = fill_and_submit(session.as_ref(), url, mode, ctx).await;
    if let Err(e) = session.close().await {
        debug!(error = %e, "Browser close failed after form fill");
    }
    outcome
}

async fn fill_and_submit(
    session: &dyn BrowserSession,
    url: &str,
    mode: FillMode,
    ctx: &AbilityContext,
) -> AppResult<AbilityResult> {
    session.goto(url).await?;
    sleep(ctx.config().browser.settle()).await;

    let fields = session.input_fields().await?;
    let mut report = FormReport {
        url: url.to_string(),
        mode,
        filled: 0,
        skipped: 0,
        submitted: false,
    };

    for field in fields.iter().filter(|f| f.is_fillable()) {
        let value = match mode {
            FillMode::Blind => Some(BLIND_VALUE.to_string()),
            FillMode::Smart => smart_value(field, ctx.profile.as_ref()),
        };
        let Some(value) = value else {
            continue;
        };
        match session.fill_field(field.index, &value).await {
            Ok(()) => report.filled += 1,
            Err(e) => {
                debug!(index = field.index, name = %field.name, error = %e, "Could not fill field");
                report.skipped += 1;
            }
        }
    }
    ctx.progress.update(format!("Filled {} fields", report.filled));

    let approved = match ctx.submit_gate {
        SubmitGate::Approved => true,
        SubmitGate::Declined => false,
        SubmitGate::Ask => session.confirm(CONFIRM_PROMPT, CONFIRM_WAIT).await.unwrap_or_else(|e| {
            warn!(error = %e, "Confirmation dialog failed, treating as declined");
            false
        }),
    };

    if !approved {
        info!(filled = report.filled, "Submission declined");
        return Ok(AbilityResult::cancelled(format!(
            "Filled {} fields. Submission declined, the form was not submitted.",
            report.filled
        ))
        .with_output(AbilityOutput::Form(report)));
    }

    if !safe_submit(session).await? {
        return Ok(AbilityResult::error(format!(
            "Filled {} fields but could not find a submit/pay/register button on the page.",
            report.filled
        ))
        .with_output(AbilityOutput::Form(report)));
    }

    report.submitted = true;
    Ok(AbilityResult::success(format!("Filled {} fields and submitted the form", report.filled))
        .with_output(AbilityOutput::Form(report)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abilities::testing::Harness;
    use crate::abilities::Outcome;
    use crate::browser::fake::FakePage;
    use crate::scrapers::fetch::fake::FakeFetcher;
    use crate::types::AppError;

    const SIGNUP: &str = "fill the form at https://example.com/signup";

    fn form_report(result: &AbilityResult) -> &FormReport {
        match &result.output {
            Some(AbilityOutput::Form(report)) => report,
            other => panic!("expected form report, got {:?}", other),
        }
    }

    #[test]
    fn test_smart_value_prefers_profile() {
        let field = |name: &str, placeholder: &str| InputField {
            index: 0,
            input_type: "text".to_string(),
            name: name.to_string(),
            placeholder: placeholder.to_string(),
        };
        let profile = UserProfile {
            full_name: Some("Asha Rao".to_string()),
            city: Some("  ".to_string()),
            ..Default::default()
        };

        assert_eq!(smart_value(&field("full_name", ""), Some(&profile)).as_deref(), Some("Asha Rao"));
        assert_eq!(smart_value(&field("full_name", ""), None).as_deref(), Some("Rahul Verma"));
        // Blank profile values fall back to the demo value
        assert_eq!(smart_value(&field("", "Your City"), Some(&profile)).as_deref(), Some("Mumbai"));
        assert_eq!(smart_value(&field("cc", "Card number"), None).as_deref(), Some("5555 4444 3333 1111"));
        assert_eq!(smart_value(&field("coupon", "Promo code"), None), None);
    }

    #[test]
    fn test_gate_from_answer() {
        assert_eq!(SubmitGate::from_answer(Some(true)), SubmitGate::Approved);
        assert_eq!(SubmitGate::from_answer(Some(false)), SubmitGate::Declined);
        assert_eq!(SubmitGate::from_answer(None), SubmitGate::Ask);
    }

    #[tokio::test]
    async fn test_blind_fill_declined_is_cancelled() {
        let page = FakePage::with_fields(&[
            ("text", "q", ""),
            ("email", "mail", ""),
            ("checkbox", "agree", ""),
            ("", "nickname", ""),
            ("hidden", "csrf", ""),
        ]);
        let harness = Harness::with_page(FakeFetcher::new(), page);
        let ctx = harness.context().with_submit_gate(SubmitGate::Declined);

        let result = run(SIGNUP, FillMode::Blind, &ctx).await.unwrap();
        assert_eq!(result.status, Outcome::Cancelled);
        assert_eq!(form_report(&result).filled, 3);
        assert!(!form_report(&result).submitted);

        let log = harness.launcher.log();
        assert_eq!(log.visited, vec!["https://example.com/signup"]);
        assert!(log.filled.iter().all(|(_, value)| value == BLIND_VALUE));
        assert_eq!(log.filled.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 3]);
        assert!(log.clicked.is_empty());
        assert!(log.prompts.is_empty());
        assert_eq!(log.closes, 1);
    }

    #[tokio::test]
    async fn test_smart_fill_approved_submits() {
        let page = FakePage {
            clickable: vec!["button[type=submit]".to_string()],
            ..FakePage::with_fields(&[
                ("text", "full_name", "Your name"),
                ("email", "email", ""),
                ("tel", "phone", ""),
                ("text", "coupon", "Promo code"),
            ])
        };
        let harness = Harness::with_page(FakeFetcher::new(), page);
        let profile = UserProfile {
            full_name: Some("Asha Rao".to_string()),
            ..Default::default()
        };
        let ctx = harness
            .context()
            .with_profile(Some(profile))
            .with_submit_gate(SubmitGate::Approved);

        let result = run("complete form https://example.com/checkout", FillMode::Smart, &ctx)
            .await
            .unwrap();
        assert_eq!(result.status, Outcome::Success);
        assert!(form_report(&result).submitted);

        let log = harness.launcher.log();
        assert_eq!(
            log.filled,
            vec![
                (0, "Asha Rao".to_string()),
                (1, "rahul@gmail.com".to_string()),
                (2, "9876543210".to_string()),
            ]
        );
        assert_eq!(log.clicked, vec!["button[type=submit]"]);
        assert_eq!(log.closes, 1);
    }

    #[tokio::test]
    async fn test_ask_gate_uses_page_dialog_and_text_buttons() {
        let page = FakePage {
            confirm_answer: true,
            buttons: vec!["Cancel".to_string(), "Place Order".to_string()],
            broken_fields: vec![1],
            ..FakePage::with_fields(&[("text", "name", ""), ("text", "address", "")])
        };
        let harness = Harness::with_page(FakeFetcher::new(), page);

        let result = run(SIGNUP, FillMode::Blind, &harness.context()).await.unwrap();
        assert_eq!(result.status, Outcome::Success);
        let report = form_report(&result);
        assert_eq!((report.filled, report.skipped), (1, 1));

        let log = harness.launcher.log();
        assert_eq!(log.prompts, vec![CONFIRM_PROMPT]);
        assert_eq!(log.clicked, vec!["button:Place Order"]);
    }

    #[tokio::test]
    async fn test_no_submit_button_is_an_error() {
        let page = FakePage::with_fields(&[("text", "name", "")]);
        let harness = Harness::with_page(FakeFetcher::new(), page);
        let ctx = harness.context().with_submit_gate(SubmitGate::Approved);

        let result = run(SIGNUP, FillMode::Blind, &ctx).await.unwrap();
        assert_eq!(result.status, Outcome::Error);
        assert!(result.message.contains("could not find a submit"));
        assert_eq!(harness.launcher.log().closes, 1);
    }

    #[tokio::test]
    async fn test_missing_url_and_launch_failure() {
        let harness = Harness::new(FakeFetcher::new());
        let result = run("fill the signup form", FillMode::Blind, &harness.context()).await.unwrap();
        assert_eq!(result.status, Outcome::Error);
        assert_eq!(harness.launcher.log().launches, 0);

        let broken = Harness::with_page(
            FakeFetcher::new(),
            FakePage {
                fail_launch: true,
                ..Default::default()
            },
        );
        assert!(matches!(
            run(SIGNUP, FillMode::Smart, &broken.context()).await,
            Err(AppError::Browser(_))
        ));
    }
}
