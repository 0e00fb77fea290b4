//! The founder's structured idea submission and its validation rules.
//!
//! Length limits depend on the submission language. Lengths are counted in
//! Unicode scalar values.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::ops::RangeInclusive;

use crate::error::{FieldViolation, IdeaValidationError};

/// Language the idea was written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Zh,
}

/// A validated founder submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredIdea {
    #[serde(default)]
    pub language: Language,
    /// One-sentence pitch.
    pub high_concept: String,
    pub value_proposition: String,
    /// How the founder will know the idea works.
    pub success_metric: String,
    pub assumptions: Assumptions,
    pub assets: Assets,
    pub environment: Environment,
}

/// Beliefs the idea depends on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assumptions {
    pub market: Vec<String>,
    pub technical: Vec<String>,
    pub business_model: Vec<String>,
}

/// What the founder brings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assets {
    pub key_assets: Vec<String>,
    #[serde(default)]
    pub brand_narrative: Vec<String>,
}

/// Where the idea has to survive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub user_persona: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub competitive_landscape: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulatory_context: Option<String>,
}

/// Character-count bounds for one language
#[derive(Debug, Clone)]
pub struct FieldLimits {
    pub high_concept: RangeInclusive<usize>,
    pub value_proposition: RangeInclusive<usize>,
    pub success_metric: RangeInclusive<usize>,
    pub assumption_item: RangeInclusive<usize>,
    pub key_asset_item: RangeInclusive<usize>,
    pub brand_narrative_item: RangeInclusive<usize>,
    pub user_persona: RangeInclusive<usize>,
    pub environment_note: RangeInclusive<usize>,
}

/// Items per assumption list
pub const ASSUMPTION_ITEMS: RangeInclusive<usize> = 1..=5;
/// Items in the key asset list
pub const KEY_ASSET_ITEMS: RangeInclusive<usize> = 1..=5;
/// Items in the brand narrative list
pub const BRAND_NARRATIVE_ITEMS: RangeInclusive<usize> = 0..=3;

impl Language {
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Zh => "zh",
        }
    }

    /// Limits that apply to text in this language
    pub fn limits(self) -> FieldLimits {
        match self {
            Language::En => FieldLimits {
                high_concept: 10..=150,
                value_proposition: 20..=500,
                success_metric: 10..=300,
                assumption_item: 5..=300,
                key_asset_item: 3..=200,
                brand_narrative_item: 3..=300,
                user_persona: 20..=500,
                environment_note: 0..=1000,
            },
            Language::Zh => FieldLimits {
                high_concept: 5..=60,
                value_proposition: 10..=200,
                success_metric: 5..=120,
                assumption_item: 3..=120,
                key_asset_item: 2..=80,
                brand_narrative_item: 2..=120,
                user_persona: 10..=200,
                environment_note: 0..=400,
            },
        }
    }
}

struct Violations(Vec<FieldViolation>);

impl Violations {
    /// Blank padding does not count toward the minimum but does toward the maximum.
    fn text(&mut self, field: &str, value: &str, bounds: &RangeInclusive<usize>) {
        let content = value.trim().chars().count();
        let stored = value.chars().count();
        if content < *bounds.start() {
            self.push(
                field,
                format!("must be at least {} characters (got {})", bounds.start(), content),
            );
        } else if stored > *bounds.end() {
            self.push(
                field,
                format!("must be at most {} characters (got {})", bounds.end(), stored),
            );
        }
    }

    fn list(
        &mut self,
        field: &str,
        items: &[String],
        count: &RangeInclusive<usize>,
        item_bounds: &RangeInclusive<usize>,
    ) {
        if !count.contains(&items.len()) {
            self.push(
                field,
                format!(
                    "must contain {} to {} items (got {})",
                    count.start(),
                    count.end(),
                    items.len()
                ),
            );
        }
        for (i, item) in items.iter().enumerate() {
            self.text(&format!("{}[{}]", field, i), item, item_bounds);
        }
    }

    fn push(&mut self, field: &str, message: String) {
        self.0.push(FieldViolation {
            field: field.to_string(),
            message,
        });
    }
}

impl StructuredIdea {
    /// Check every field against the limits for the idea's language.
    ///
    /// All violations are collected; the idea itself is never modified.
    pub fn validate(&self) -> Result<(), IdeaValidationError> {
        let limits = self.language.limits();
        let mut v = Violations(Vec::new());

        v.text("high_concept", &self.high_concept, &limits.high_concept);
        v.text(
            "value_proposition",
            &self.value_proposition,
            &limits.value_proposition,
        );
        v.text("success_metric", &self.success_metric, &limits.success_metric);

        v.list(
            "assumptions.market",
            &self.assumptions.market,
            &ASSUMPTION_ITEMS,
            &limits.assumption_item,
        );
        v.list(
            "assumptions.technical",
            &self.assumptions.technical,
            &ASSUMPTION_ITEMS,
            &limits.assumption_item,
        );
        v.list(
            "assumptions.business_model",
            &self.assumptions.business_model,
            &ASSUMPTION_ITEMS,
            &limits.assumption_item,
        );

        v.list(
            "assets.key_assets",
            &self.assets.key_assets,
            &KEY_ASSET_ITEMS,
            &limits.key_asset_item,
        );
        v.list(
            "assets.brand_narrative",
            &self.assets.brand_narrative,
            &BRAND_NARRATIVE_ITEMS,
            &limits.brand_narrative_item,
        );

        v.text(
            "environment.user_persona",
            &self.environment.user_persona,
            &limits.user_persona,
        );
        if let Some(note) = &self.environment.competitive_landscape {
            v.text(
                "environment.competitive_landscape",
                note,
                &limits.environment_note,
            );
        }
        if let Some(note) = &self.environment.regulatory_context {
            v.text(
                "environment.regulatory_context",
                note,
                &limits.environment_note,
            );
        }

        if v.0.is_empty() {
            Ok(())
        } else {
            Err(IdeaValidationError::Invalid { violations: v.0 })
        }
    }

    /// Render the idea as plain text for inclusion in a prompt
    pub fn render_for_prompt(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "High concept: {}", self.high_concept);
        let _ = writeln!(out, "Value proposition: {}", self.value_proposition);
        let _ = writeln!(out, "Success metric: {}", self.success_metric);

        push_list(&mut out, "Market assumptions", &self.assumptions.market);
        push_list(&mut out, "Technical assumptions", &self.assumptions.technical);
        push_list(
            &mut out,
            "Business model assumptions",
            &self.assumptions.business_model,
        );
        push_list(&mut out, "Key assets", &self.assets.key_assets);
        push_list(&mut out, "Brand narrative", &self.assets.brand_narrative);

        let _ = writeln!(out, "Target user persona: {}", self.environment.user_persona);
        if let Some(note) = &self.environment.competitive_landscape {
            let _ = writeln!(out, "Known competitive landscape: {}", note);
        }
        if let Some(note) = &self.environment.regulatory_context {
            let _ = writeln!(out, "Regulatory context: {}", note);
        }
        out
    }
}

fn push_list(out: &mut String, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let _ = writeln!(out, "{}:", heading);
    for item in items {
        let _ = writeln!(out, "- {}", item);
    }
}
