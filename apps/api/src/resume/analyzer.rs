//! Resume analysis: an overall score plus per-section feedback.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::llm_client::prompts::system_with_json_rule;
use crate::llm_client::structured::{check_non_empty, check_score, generate_validated, Validate};
use crate::llm_client::LlmBackend;
use crate::resume::prompts::{RESUME_ANALYSIS_INSTRUCTION, RESUME_ANALYSIS_PROMPT};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionFeedback {
    pub score: u32,
    pub comment: String,
    #[serde(default)]
    pub whats_good: Vec<String>,
    #[serde(default)]
    pub needs_improvement: Vec<String>,
    #[serde(default)]
    pub tips_for_improvement: Vec<String>,
}

/// Exactly these four sections; anything else fails decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResumeSections {
    pub contact_info: SectionFeedback,
    pub experience: SectionFeedback,
    pub education: SectionFeedback,
    pub skills: SectionFeedback,
}

impl ResumeSections {
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&'static str, &mut SectionFeedback)> {
        [
            ("contact_info", &mut self.contact_info),
            ("experience", &mut self.experience),
            ("education", &mut self.education),
            ("skills", &mut self.skills),
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    pub overall_score: u32,
    pub overall_feedback: String,
    pub summary_comment: String,
    pub sections: ResumeSections,
    #[serde(default)]
    pub whats_good: Vec<String>,
    #[serde(default)]
    pub needs_improvement: Vec<String>,
    #[serde(default)]
    pub tips_for_improvement: Vec<String>,
}

impl Validate for ResumeAnalysis {
    fn validate(&mut self) -> Result<(), String> {
        check_score("overall_score", self.overall_score)?;
        check_non_empty("overall_feedback", &mut self.overall_feedback)?;
        check_non_empty("summary_comment", &mut self.summary_comment)?;
        for (name, section) in self.sections.iter_mut() {
            check_score(&format!("sections.{name}.score"), section.score)?;
            check_non_empty(&format!("sections.{name}.comment"), &mut section.comment)?;
        }
        Ok(())
    }
}

pub async fn analyze_resume(
    llm: &dyn LlmBackend,
    resume_text: &str,
) -> Result<ResumeAnalysis, AppError> {
    let system = system_with_json_rule(RESUME_ANALYSIS_INSTRUCTION);
    let prompt = RESUME_ANALYSIS_PROMPT.replace("{resume_text}", resume_text);
    Ok(generate_validated(llm, &system, &prompt).await?)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::testing::ScriptedLlm;

    pub(crate) fn analysis_json(experience_score: u32) -> String {
        let section = |score: u32| {
            serde_json::json!({
                "score": score,
                "comment": "Clear and complete.",
                "whats_good": ["Readable"],
                "needs_improvement": [],
                "tips_for_improvement": ["Add links"]
            })
        };
        serde_json::json!({
            "overall_score": 81,
            "overall_feedback": "A solid backend resume.",
            "summary_comment": "Strong fundamentals, light on metrics.",
            "sections": {
                "contact_info": section(95),
                "experience": section(experience_score),
                "education": section(70),
                "skills": section(88)
            },
            "whats_good": ["Relevant stack"],
            "needs_improvement": ["Few numbers"],
            "tips_for_improvement": ["Quantify impact"]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_analysis_has_four_scored_sections() {
        let llm = ScriptedLlm::new([analysis_json(77)]);
        let mut analysis = analyze_resume(&llm, "Jane Doe\nRust engineer").await.unwrap();
        let names: Vec<_> = analysis
            .sections
            .iter_mut()
            .map(|(name, section)| {
                assert!(section.score <= 100);
                name
            })
            .collect();
        assert_eq!(names, ["contact_info", "experience", "education", "skills"]);
        assert_eq!(analysis.sections.experience.score, 77);
    }

    #[tokio::test]
    async fn test_out_of_range_section_score_is_reprompted() {
        let llm = ScriptedLlm::new([analysis_json(140), analysis_json(60)]);
        let analysis = analyze_resume(&llm, "resume").await.unwrap();
        assert_eq!(analysis.sections.experience.score, 60);
        assert_eq!(llm.calls(), 2);
    }

    #[test]
    fn test_extra_section_fails_decoding() {
        let mut value: serde_json::Value = serde_json::from_str(&analysis_json(50)).unwrap();
        value["sections"]["projects"] = value["sections"]["skills"].clone();
        assert!(serde_json::from_value::<ResumeAnalysis>(value).is_err());
    }

    #[test]
    fn test_missing_section_fails_decoding() {
        let mut value: serde_json::Value = serde_json::from_str(&analysis_json(50)).unwrap();
        value["sections"]
            .as_object_mut()
            .unwrap()
            .remove("education");
        assert!(serde_json::from_value::<ResumeAnalysis>(value).is_err());
    }

    #[test]
    fn test_prompt_embeds_resume_text() {
        let prompt = RESUME_ANALYSIS_PROMPT.replace("{resume_text}", "Jane Doe");
        assert!(prompt.ends_with("Jane Doe"));
        assert!(!prompt.contains("{resume_text}"));
    }
}
