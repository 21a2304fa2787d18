use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Group label for clauses without a recognisable article heading.
pub const UNGROUPED_ARTICLE: &str = "기타 조항";

static ARTICLE_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^제\d+조\([^)]+\)").expect("valid article regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseAnalysis {
    pub clause_text: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionItem {
    pub task: String,
    pub basis_clause: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecommendedActions {
    #[serde(default)]
    pub office_tasks: Vec<ActionItem>,
    #[serde(default)]
    pub field_tasks: Vec<ActionItem>,
    #[serde(default)]
    pub technical_measures: Vec<ActionItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredForm {
    pub form_name: String,
    #[serde(default)]
    pub form_number: String,
    #[serde(default)]
    pub form_text: String,
    pub reason: String,
    #[serde(default)]
    pub submission_deadline: String,
    pub related_law: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalForm {
    #[serde(flatten)]
    pub form: RequiredForm,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedForm {
    pub form_name: String,
    pub reason: String,
    pub related_law: String,
}

/// Structured compliance analysis returned by the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub accident_summary: String,
    pub is_serious_accident: bool,
    pub serious_accident_reason: String,
    #[serde(default)]
    pub core_regulations: Vec<ClauseAnalysis>,
    #[serde(default)]
    pub related_regulations: Vec<ClauseAnalysis>,
    #[serde(default)]
    pub reference_regulations: Vec<ClauseAnalysis>,
    #[serde(default)]
    pub recommended_actions: RecommendedActions,
    #[serde(default)]
    pub mandatory_forms: Vec<RequiredForm>,
    #[serde(default)]
    pub conditional_forms: Vec<ConditionalForm>,
    #[serde(default)]
    pub recommended_forms: Vec<RecommendedForm>,
}

/// Clauses that share an article heading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClauseGroup {
    pub article: String,
    pub items: Vec<ClauseAnalysis>,
}

/// Group clauses by their leading article heading (e.g. `제5조(사업주의 의무)`),
/// keeping groups in first-seen order.
pub fn group_by_article(clauses: &[ClauseAnalysis]) -> Vec<ClauseGroup> {
    let mut groups: Vec<ClauseGroup> = Vec::new();

    for clause in clauses {
        let article = ARTICLE_HEADING
            .find(clause.clause_text.trim_start())
            .map(|m| m.as_str())
            .unwrap_or(UNGROUPED_ARTICLE);

        match groups.iter_mut().find(|g| g.article == article) {
            Some(group) => group.items.push(clause.clone()),
            None => groups.push(ClauseGroup {
                article: article.to_string(),
                items: vec![clause.clone()],
            }),
        }
    }

    groups
}

fn string_field(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn array_of(description: &str, items: Value) -> Value {
    json!({ "type": "ARRAY", "description": description, "items": items })
}

/// Gemini `responseSchema` matching [`AnalysisResult`].
pub fn response_schema() -> Value {
    let clause = json!({
        "type": "OBJECT",
        "properties": {
            "clause_text": string_field("Full text of the regulation clause"),
            "explanation": string_field("Why the clause applies to the incident"),
        },
        "required": ["clause_text", "explanation"],
    });

    let action = json!({
        "type": "OBJECT",
        "properties": {
            "task": string_field("Concrete action to take"),
            "basis_clause": string_field("Statute name and article the action is based on"),
        },
        "required": ["task", "basis_clause"],
    });

    let form_properties = json!({
        "form_name": string_field("Exact name of the form to submit"),
        "form_number": string_field("Statutory form number"),
        "form_text": string_field("Regulation text the form is based on"),
        "reason": string_field("Why the form must be submitted"),
        "submission_deadline": string_field("Statutory submission deadline"),
        "related_law": string_field("Statute name and article"),
    });
    let form_required = json!([
        "form_name", "form_number", "form_text", "reason", "submission_deadline", "related_law"
    ]);

    let required_form = json!({
        "type": "OBJECT",
        "properties": form_properties.clone(),
        "required": form_required.clone(),
    });

    let mut conditional_properties = form_properties;
    conditional_properties["condition"] =
        string_field("Condition under which the form must be submitted");
    let mut conditional_required = form_required;
    if let Some(list) = conditional_required.as_array_mut() {
        list.push(json!("condition"));
    }
    let conditional_form = json!({
        "type": "OBJECT",
        "properties": conditional_properties,
        "required": conditional_required,
    });

    let recommended_form = json!({
        "type": "OBJECT",
        "properties": {
            "form_name": string_field("Name of the recommended form"),
            "reason": string_field("Why the form is recommended"),
            "related_law": string_field("Statute name and article"),
        },
        "required": ["form_name", "reason", "related_law"],
    });

    json!({
        "type": "OBJECT",
        "properties": {
            "accident_summary": string_field("Short summary of the incident"),
            "is_serious_accident": {
                "type": "BOOLEAN",
                "description": "Whether the incident is a serious accident under the Serious Accidents Punishment Act",
            },
            "serious_accident_reason": string_field("Legal reasoning for the serious-accident decision"),
            "core_regulations": array_of("Clauses most directly related to the incident", clause.clone()),
            "related_regulations": array_of("Indirectly related clauses", clause.clone()),
            "reference_regulations": array_of("Additional clauses worth consulting", clause),
            "recommended_actions": {
                "type": "OBJECT",
                "description": "Actions recommended after the incident",
                "properties": {
                    "office_tasks": array_of("Administrative actions such as reports and records", action.clone()),
                    "field_tasks": array_of("Immediate on-site actions such as rescue and scene preservation", action.clone()),
                    "technical_measures": array_of("Engineering measures that prevent recurrence", action),
                },
                "required": ["office_tasks", "field_tasks", "technical_measures"],
            },
            "mandatory_forms": array_of("Forms that must be submitted", required_form),
            "conditional_forms": array_of("Forms required only under specific conditions", conditional_form),
            "recommended_forms": array_of("Forms that are recommended but not mandatory", recommended_form),
        },
        "required": [
            "accident_summary", "is_serious_accident", "serious_accident_reason",
            "core_regulations", "related_regulations", "reference_regulations",
            "recommended_actions", "mandatory_forms", "conditional_forms", "recommended_forms",
        ],
    })
}

#[cfg(test)]
pub(crate) fn sample_result() -> AnalysisResult {
    AnalysisResult {
        accident_summary: "A worker fell from a scaffold".to_string(),
        is_serious_accident: true,
        serious_accident_reason: "One fatality".to_string(),
        core_regulations: vec![ClauseAnalysis {
            clause_text: "제42조(추락의 방지) 사업주는 ...".to_string(),
            explanation: "Fall protection".to_string(),
        }],
        related_regulations: vec![],
        reference_regulations: vec![],
        recommended_actions: RecommendedActions::default(),
        mandatory_forms: vec![],
        conditional_forms: vec![],
        recommended_forms: vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clause(text: &str) -> ClauseAnalysis {
        ClauseAnalysis {
            clause_text: text.to_string(),
            explanation: String::new(),
        }
    }

    #[test]
    fn test_group_by_article_keeps_first_seen_order() {
        let clauses = vec![
            clause("제42조(추락의 방지) ① 사업주는"),
            clause("별표 1 관련"),
            clause("제13조(안전난간의 구조) 안전난간은"),
            clause("제42조(추락의 방지) ② 사업주는"),
        ];
        let groups = group_by_article(&clauses);

        let articles: Vec<_> = groups.iter().map(|g| g.article.as_str()).collect();
        assert_eq!(
            articles,
            vec!["제42조(추락의 방지)", UNGROUPED_ARTICLE, "제13조(안전난간의 구조)"]
        );
        assert_eq!(groups[0].items.len(), 2);
    }

    #[test]
    fn test_parses_model_output_with_conditional_form() {
        let raw = json!({
            "accident_summary": "summary",
            "is_serious_accident": false,
            "serious_accident_reason": "no fatality",
            "core_regulations": [{"clause_text": "제3조(적용) text", "explanation": "why"}],
            "related_regulations": [],
            "reference_regulations": [],
            "recommended_actions": {
                "office_tasks": [{"task": "report", "basis_clause": "시행규칙 제73조"}],
                "field_tasks": [],
                "technical_measures": []
            },
            "mandatory_forms": [],
            "conditional_forms": [{
                "form_name": "산업재해조사표",
                "form_number": "별지 제30호서식",
                "form_text": "text",
                "reason": "injury",
                "submission_deadline": "1 month",
                "related_law": "시행규칙 제73조",
                "condition": "3+ days of absence"
            }],
            "recommended_forms": []
        });

        let result: AnalysisResult = serde_json::from_value(raw).unwrap();
        assert_eq!(result.conditional_forms[0].form.form_number, "별지 제30호서식");
        assert_eq!(result.conditional_forms[0].condition, "3+ days of absence");
        assert_eq!(result.recommended_actions.office_tasks.len(), 1);
    }

    #[test]
    fn test_schema_requires_every_top_level_field() {
        let schema = response_schema();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 10);
        assert_eq!(
            schema["properties"]["conditional_forms"]["items"]["required"]
                .as_array()
                .unwrap()
                .len(),
            7
        );
    }
}
